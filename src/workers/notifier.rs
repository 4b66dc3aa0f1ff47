use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Payload handed to the push collaborator when a reel is published.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessPayload {
    pub job_id: String,
    pub hls_url: String,
    pub thumbnail_url: String,
    pub caption: Option<String>,
}

/// Boundary to the external push-notification collaborator. Dispatch here is
/// best-effort: whatever goes wrong is logged and swallowed, so a broken
/// notification can never mask the job's own outcome.
#[derive(Clone, Default)]
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub async fn notify_success(&self, owner_id: &str, payload: SuccessPayload) {
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("⚠️ Dropping success notification for {}: {}", owner_id, e);
                return;
            }
        };

        if let Err(e) = self.dispatch(owner_id, "reel_ready", body).await {
            warn!("⚠️ Failed to notify {} of success: {}", owner_id, e);
        }
    }

    pub async fn notify_failure(&self, owner_id: &str, job_id: &str, error: &str) {
        let body = json!({ "job_id": job_id, "error": error });
        if let Err(e) = self.dispatch(owner_id, "reel_failed", body).await {
            warn!("⚠️ Failed to notify {} of failure: {}", owner_id, e);
        }
    }

    // Delivery transport lives outside this service; the dispatch contract is
    // (owner, kind, payload).
    async fn dispatch(
        &self,
        owner_id: &str,
        kind: &str,
        payload: serde_json::Value,
    ) -> anyhow::Result<()> {
        info!("🔔 Dispatching {} notification to {}: {}", kind, owner_id, payload);
        Ok(())
    }
}
