//! Advisory replication for the pemilu election store.
//!
//! A kiosk periodically pushes its complete state to a stateless echo
//! endpoint so an observer dashboard can follow the tally. The collaborator
//! is strictly best-effort: the endpoint keeps nothing authoritative, every
//! failure is logged and swallowed, and the store never waits on it. With no
//! endpoint configured the whole module is inert.

pub mod echo;
pub mod envelope;
pub mod error;
pub mod manager;

pub use echo::EchoClient;
pub use envelope::{new_device_id, EchoAck, SyncEnvelope};
pub use error::SyncError;
pub use manager::{cast_listener, SnapshotSource, SyncConfig, SyncManager};
