//! Best-effort customer notifications sent after an order change has committed.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OrderConfirmation,
    OrderCancellation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient: Uuid,
    pub kind: NotificationKind,
    pub context: Value,
}

/// Delivery channel for notifications. Implementations must not block the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Emits every notification as a tracing event; mail delivery is handled elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        tracing::info!(
            recipient = %notification.recipient,
            kind = ?notification.kind,
            context = %notification.context,
            "notification queued"
        );
        Ok(())
    }
}

/// Hands the notification to the configured notifier on a background task.
pub fn dispatch(state: &AppState, notification: Notification) {
    if !state.config.app_env.sends_notifications() {
        tracing::debug!(kind = ?notification.kind, "notifications disabled, skipping");
        return;
    }

    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        let kind = notification.kind;
        if let Err(err) = notifier.send(notification).await {
            tracing::warn!(error = %err, kind = ?kind, "notification failed");
        }
    });
}
