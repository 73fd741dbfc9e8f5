use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use lumiere_core::config::Config;
use lumiere_core::events::UploadEvent;
use lumiere_core::upload::{UploadSession, UploadStats};

use crate::api::WsBroadcaster;
use crate::metrics::{
    FILES_ACCEPTED_TOTAL, FILES_REJECTED_TOTAL, SESSIONS_CREATED_TOTAL, SUBMISSIONS_TOTAL,
    TRANSFERS_TOTAL,
};

struct SessionSlot {
    session: Arc<UploadSession>,
    forwarder: JoinHandle<()>,
}

/// Shared application state: configuration plus the live session registry.
pub struct AppState {
    config: Config,
    sessions: RwLock<HashMap<String, SessionSlot>>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(config: Config, ws_broadcaster: WsBroadcaster) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }

    /// Create a session and bridge its event stream onto the WebSocket
    /// broadcaster.
    pub async fn create_session(&self) -> Arc<UploadSession> {
        let session = Arc::new(UploadSession::new(self.config.clone()));
        let forwarder = spawn_forwarder(&session, self.ws_broadcaster.clone());

        SESSIONS_CREATED_TOTAL.inc();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session.id().to_string(),
            SessionSlot {
                session: Arc::clone(&session),
                forwarder,
            },
        );
        session
    }

    pub async fn session(&self, id: &str) -> Option<Arc<UploadSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|slot| Arc::clone(&slot.session))
    }

    /// Tear down a session. Dropping it releases its preview resources.
    pub async fn remove_session(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.remove(id) {
            Some(slot) => {
                slot.forwarder.abort();
                true
            }
            None => false,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Entry stats summed over every live session, for the metrics endpoint.
    pub async fn aggregate_stats(&self) -> UploadStats {
        let sessions = self.sessions.read().await;
        let mut total = UploadStats::default();
        for slot in sessions.values() {
            let stats = slot.session.stats();
            total.total += stats.total;
            total.pending += stats.pending;
            total.uploading += stats.uploading;
            total.succeeded += stats.succeeded;
            total.failed += stats.failed;
        }
        total
    }
}

/// Forward one session's events to the WebSocket broadcaster, counting them
/// along the way. Ends when the session (and with it the event channel) is
/// dropped.
fn spawn_forwarder(session: &Arc<UploadSession>, broadcaster: WsBroadcaster) -> JoinHandle<()> {
    let session_id = session.id().to_string();
    let mut rx = session.notifier().subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    count_event(&envelope.event);
                    broadcaster.session_event(&session_id, envelope);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Event forwarder for session {} lagged by {}", session_id, n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Event forwarder for session {} stopped", session_id);
    })
}

fn count_event(event: &UploadEvent) {
    match event {
        UploadEvent::FilesAccepted { count, .. } => {
            FILES_ACCEPTED_TOTAL.inc_by(*count as u64);
        }
        UploadEvent::FileRejected { reason, .. } => {
            FILES_REJECTED_TOTAL.with_label_values(&[reason]).inc();
        }
        UploadEvent::TransferCompleted { .. } => {
            TRANSFERS_TOTAL.with_label_values(&["success"]).inc();
        }
        UploadEvent::TransferFailed { .. } => {
            TRANSFERS_TOTAL.with_label_values(&["error"]).inc();
        }
        UploadEvent::SubmissionFinished { .. } => {
            SUBMISSIONS_TOTAL.inc();
        }
        _ => {}
    }
}
