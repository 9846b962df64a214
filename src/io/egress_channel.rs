//! Typed channel for MQTT egress messages
//!
//! Provides a non-blocking way to hand alert labels to the MQTT publisher.
//! Uses a bounded mpsc channel so a stalled broker can never back up the
//! poll loop; when the channel is full the message is rejected immediately.

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Messages that can be sent to the MQTT publisher
#[derive(Debug)]
pub enum EgressMessage {
    /// One alerted location
    Label(LabelPayload),
}

/// Payload for a single alerted location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelPayload {
    /// Feed alarm id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<String>,
    /// Localized area name
    pub area: String,
    /// Localized location label
    pub label: String,
    /// Raw feed location code
    pub code: String,
    /// Matched the configured highlight filter
    pub highlighted: bool,
    /// Event time (RFC 3339)
    pub ts: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EgressError {
    #[error("MQTT egress queue is full")]
    Full,
    #[error("MQTT publisher has stopped")]
    Closed,
}

/// Sender handle for egress messages
///
/// Clone this to share across multiple producers. Never blocks.
#[derive(Clone)]
pub struct EgressSender {
    tx: mpsc::Sender<EgressMessage>,
}

impl EgressSender {
    pub fn new(tx: mpsc::Sender<EgressMessage>) -> Self {
        Self { tx }
    }

    /// Queue one label for publishing
    pub fn send_label(&self, payload: LabelPayload) -> Result<(), EgressError> {
        self.tx.try_send(EgressMessage::Label(payload)).map_err(|e| match e {
            TrySendError::Full(_) => EgressError::Full,
            TrySendError::Closed(_) => EgressError::Closed,
        })
    }
}

/// Create a new egress channel pair
///
/// Returns (sender, receiver) where sender can be cloned and shared.
/// Buffer size determines how many messages can be queued.
pub fn create_egress_channel(buffer_size: usize) -> (EgressSender, mpsc::Receiver<EgressMessage>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EgressSender::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(label: &str) -> LabelPayload {
        LabelPayload {
            alarm_id: None,
            area: "North".to_string(),
            label: label.to_string(),
            code: label.to_string(),
            highlighted: false,
            ts: "2024-04-14T01:30:05+03:00".to_string(),
        }
    }

    #[test]
    fn test_full_channel_rejects_without_blocking() {
        let (sender, _rx) = create_egress_channel(1);
        assert_eq!(sender.send_label(payload("a")), Ok(()));
        assert_eq!(sender.send_label(payload("b")), Err(EgressError::Full));
    }

    #[test]
    fn test_closed_channel() {
        let (sender, rx) = create_egress_channel(4);
        drop(rx);
        assert_eq!(sender.send_label(payload("a")), Err(EgressError::Closed));
    }

    #[test]
    fn test_payload_json_omits_missing_alarm_id() {
        let json = serde_json::to_string(&payload("Alpha")).unwrap();
        assert!(!json.contains("alarm_id"));
        assert!(json.contains(r#""label":"Alpha""#));
    }
}
