use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::UploadEvent;

/// Envelope wrapping an event with its emission time
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: UploadEvent,
}

/// Handle for emitting pipeline events.
///
/// Cheaply cloneable; fans out over a broadcast channel to any number of
/// subscribers (toast UI, WebSocket bridge, tests). Emission never blocks
/// and never fails the pipeline: with no subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Notifier {
    /// Create a notifier with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: UploadEvent) {
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        // Send errors just mean no one is listening
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        notifier.emit(UploadEvent::FilesCleared { count: 3 });

        let envelope = rx.recv().await.expect("Should receive event");
        assert!(matches!(envelope.event, UploadEvent::FilesCleared { count: 3 }));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_does_not_panic() {
        let notifier = Notifier::default();
        notifier.emit(UploadEvent::FilesCleared { count: 0 });
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_every_event() {
        let notifier = Notifier::default();
        let mut rx1 = notifier.subscribe();
        let mut rx2 = notifier.subscribe();

        notifier.emit(UploadEvent::TransferProgress {
            entry_id: "e1".to_string(),
            percent: 42,
        });

        for rx in [&mut rx1, &mut rx2] {
            let envelope = rx.recv().await.unwrap();
            assert_eq!(envelope.event.event_type(), "transfer_progress");
        }
    }

    #[test]
    fn test_envelope_has_timestamp() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        let before = Utc::now();
        notifier.emit(UploadEvent::FilesCleared { count: 1 });
        let after = Utc::now();

        let envelope = rx.try_recv().expect("Should receive event");
        assert!(envelope.timestamp >= before);
        assert!(envelope.timestamp <= after);
    }
}
