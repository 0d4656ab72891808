use std::sync::Arc;

use mockable::Clock;
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{Notification, NotificationId, UserId};
use super::error::HiringError;
use super::store::{NotificationRepository, StoreError};

/// A notification could not be recorded. Never fails the operation that triggered it.
#[derive(Debug, thiserror::Error)]
#[error("notification for '{recipient}' was not recorded: {source}")]
pub struct NotificationFailure {
    pub recipient: UserId,
    #[source]
    pub source: StoreError,
}

/// Best-effort writer of in-app notifications plus the recipient's inbox operations.
pub struct NotificationDispatcher<N> {
    repository: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<N> NotificationDispatcher<N>
where
    N: NotificationRepository,
{
    pub fn new(repository: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn try_notify(
        &self,
        user_id: &UserId,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Result<Notification, NotificationFailure> {
        let notification = Notification {
            id: NotificationId::generate(),
            user_id: user_id.clone(),
            message: message.into(),
            link,
            read: false,
            created_at: self.clock.utc(),
        };

        self.repository
            .insert_notification(notification)
            .map_err(|source| NotificationFailure {
                recipient: user_id.clone(),
                source,
            })
    }

    /// Records one notification. Failures are logged and swallowed.
    pub fn notify(
        &self,
        user_id: &UserId,
        message: impl Into<String>,
        link: Option<String>,
    ) -> Option<Notification> {
        match self.try_notify(user_id, message, link) {
            Ok(notification) => {
                debug!(recipient = %user_id, notification_id = %notification.id, "notification recorded");
                Some(notification)
            }
            Err(failure) => {
                warn!(recipient = %failure.recipient, error = %failure.source, "notification dropped");
                None
            }
        }
    }

    /// Sends the same message to every recipient. No deduplication is applied.
    pub fn fan_out<'a, I>(&self, recipients: I, message: &str, link: Option<&str>) -> usize
    where
        I: IntoIterator<Item = &'a UserId>,
    {
        recipients
            .into_iter()
            .filter_map(|recipient| self.notify(recipient, message, link.map(str::to_string)))
            .count()
    }

    /// The recipient's notifications, newest first, with the unread count.
    pub fn inbox(&self, user_id: &UserId) -> Result<Inbox, HiringError> {
        let mut notifications = self.repository.notifications_for_user(user_id)?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let unread_count = notifications.iter().filter(|n| !n.read).count();

        Ok(Inbox {
            notifications,
            unread_count,
        })
    }

    pub fn mark_read(&self, user_id: &UserId, id: &NotificationId) -> Result<(), HiringError> {
        self.owned(user_id, id)?;
        if !self.repository.mark_notification_read(id)? {
            return Err(HiringError::not_found("notification", id));
        }
        Ok(())
    }

    pub fn delete(&self, user_id: &UserId, id: &NotificationId) -> Result<(), HiringError> {
        self.owned(user_id, id)?;
        if !self.repository.delete_notification(id)? {
            return Err(HiringError::not_found("notification", id));
        }
        Ok(())
    }

    fn owned(&self, user_id: &UserId, id: &NotificationId) -> Result<Notification, HiringError> {
        let notification = self
            .repository
            .notification(id)?
            .ok_or_else(|| HiringError::not_found("notification", id))?;

        if &notification.user_id != user_id {
            return Err(HiringError::Forbidden(format!(
                "notification '{id}' belongs to another user"
            )));
        }

        Ok(notification)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}
