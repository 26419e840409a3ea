//! Delivery of outbox notifications.
//!
//! Notifications are written to the outbox in the same transaction as
//! the change that caused them. Delivery happens after commit; a failed
//! delivery is logged and left undelivered in the outbox.

use thiserror::Error;

use crate::model::Notification;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Outbound message transport.
pub trait Mailer: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), MailError>;
}

/// Writes each notification to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, notification: &Notification) -> Result<(), MailError> {
        tracing::info!(
            kind = notification.kind.as_str(),
            recipient = %notification.recipient_id,
            investigation = %notification.investigation_id,
            requester = %notification.requester_id,
            "notification"
        );
        Ok(())
    }
}
