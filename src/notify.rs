//! Registration confirmation notifications

use crate::events::Event;
use crate::users::User;
use async_trait::async_trait;

/// An outgoing mail message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Confirmation sent after a user joins an event
    pub fn registration_confirmed(user: &User, event: &Event) -> Self {
        Self {
            to: user.email.clone(),
            subject: "Event Registration Confirmation".to_string(),
            body: format!(
                "Hi {},\n\nYou have successfully registered for the event: {}.\n\n\
                 Event Details:\nDate: {}\nLocation: {}\n\nSee you there!\nEvent Management Team",
                user.name,
                event.title,
                event.date_of_conduct.format("%a %b %d %Y"),
                event.location
            ),
        }
    }
}

/// Delivers notifications; failures are the notifier's concern and never
/// reach the registration that triggered them
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification);
}

/// Writes notifications to the log instead of sending mail
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            body = %notification.body,
            "Mock email sent"
        );
    }
}
