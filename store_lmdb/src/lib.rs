//! LMDB storage backend for the pemilu election store.
//!
//! Implements all storage traits from `pemilu-store` using the `heed` LMDB
//! bindings. Each collection maps to one primary database plus, where a
//! uniqueness constraint demands it, a secondary index database, all inside
//! a single environment so multi-collection writes share one transaction.

pub mod admin;
pub mod audit;
pub mod candidate;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;
pub mod migration;
pub mod vote;
pub mod voter;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use write_batch::WriteBatch;
