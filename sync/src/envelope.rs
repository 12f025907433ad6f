//! Wire shapes exchanged with the echo endpoint.

use serde::{Deserialize, Serialize};

use pemilu_election::ExportSnapshot;

/// One push of a kiosk's complete state.
///
/// The header fields duplicate counts from the snapshot so a dashboard can
/// render headline numbers without deserializing the full payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncEnvelope {
    /// Stable per-process identity, so the dashboard can tell kiosks apart.
    pub device_id: String,
    /// RFC 3339 send time.
    pub sent_at: String,
    pub total_voters: u64,
    pub total_votes: u64,
    pub snapshot: ExportSnapshot,
}

/// The echo endpoint's acknowledgement.
///
/// Error responses carry `success: false` and often omit the other fields,
/// so everything but the flag is defaulted.
#[derive(Clone, Debug, Deserialize)]
pub struct EchoAck {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

/// A fresh device identity: `device_` followed by a random UUID.
pub fn new_device_id() -> String {
    format!("device_{}", uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_ids_are_prefixed_and_unique() {
        let a = new_device_id();
        let b = new_device_id();
        assert!(a.starts_with("device_"));
        assert_ne!(a, b);
    }

    #[test]
    fn ack_parses_success_shape() {
        let raw = r#"{"success":true,"message":"Vote synced successfully","timestamp":"2026-08-25T07:00:00.000Z"}"#;
        let ack: EchoAck = serde_json::from_str(raw).expect("parse");
        assert!(ack.success);
        assert_eq!(ack.message, "Vote synced successfully");
    }

    #[test]
    fn ack_parses_error_shape_with_missing_fields() {
        let raw = r#"{"success":false,"error":"Failed to sync vote"}"#;
        let ack: EchoAck = serde_json::from_str(raw).expect("parse");
        assert!(!ack.success);
        assert!(ack.message.is_empty());
    }
}
