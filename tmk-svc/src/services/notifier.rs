//! Notification collaborator
//!
//! Fire-and-forget from the caller's perspective: delivery failure is
//! logged and never affects the triggering operation's outcome.

use async_trait::async_trait;

use tmk_common::Result;

/// One outbound notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to_address: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Default notifier: writes the notification to the log instead of
/// dispatching email. Stands in until an SMTP backend is wired up.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            to = %notification.to_address,
            subject = %notification.subject,
            "Notification dispatched (log only)"
        );
        Ok(())
    }
}
