//! Transient user-visible notices.
//!
//! Services publish here; whatever renders the UI subscribes and shows each
//! notice briefly. Delivery is best-effort: with no subscriber attached the
//! notice is still logged and then dropped.

use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Cloneable handle to the notice channel.
#[derive(Clone)]
pub struct Notices {
    tx: broadcast::Sender<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "notice");
        let _ = self.tx.send(Notice {
            kind: NoticeKind::Warning,
            message,
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "notice");
        let _ = self.tx.send(Notice {
            kind: NoticeKind::Success,
            message,
        });
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}
