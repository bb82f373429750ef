use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Transient feedback for the view, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

/// Sending half of the notification channel. A notifier without a
/// receiver drops everything.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<UnboundedSender<Notification>>,
}

impl Notifier {
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, level: NotificationLevel, title: &str, description: impl Into<String>) {
        if let Some(tx) = &self.tx {
            // The view may already be gone.
            let _ = tx.send(Notification {
                level,
                title: title.to_string(),
                description: description.into(),
            });
        }
    }

    pub fn info(&self, title: &str, description: impl Into<String>) {
        self.emit(NotificationLevel::Info, title, description);
    }

    pub fn success(&self, description: impl Into<String>) {
        self.emit(NotificationLevel::Success, "Success", description);
    }

    pub fn error(&self, description: impl Into<String>) {
        self.emit(NotificationLevel::Error, "Error", description);
    }
}
