use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// User-facing outcome of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl Notifier for UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        // A closed receiver means nobody is showing notifications anymore
        let _ = self.send(notification);
    }
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(target: "notes::notify", "{}", notification.message),
            NotificationKind::Error => error!(target: "notes::notify", "{}", notification.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_channel_notifier_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.notify(Notification::error("boom"));

        let received = rx.try_recv().unwrap();
        assert!(received.is_error());
        assert_eq!(received.message, "boom");
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<Notification>();
        drop(rx);
        tx.notify(Notification::success("nobody listening"));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(Notification::success("Note deleted")).unwrap();
        assert_eq!(json["type"], "success");
        assert_eq!(json["message"], "Note deleted");
    }
}
