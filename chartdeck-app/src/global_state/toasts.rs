use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub level: ToastLevel,
    expires_at: Instant,
}

/// Shared toast queue. Expiry is deadline-based rather than timer-based
/// so a paused test clock drives it deterministically; hosts call
/// [`Toasts::sweep`] from their render loop.
#[derive(Clone, Debug, Default)]
pub struct Toasts(Arc<Mutex<Vec<Toast>>>);

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, message: impl Into<String>, level: ToastLevel, duration: Duration) {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            level,
            expires_at: Instant::now() + duration,
        };
        self.0.lock().expect("toast lock").push(toast);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.add(message, ToastLevel::Info, Duration::from_secs(3));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.add(message, ToastLevel::Success, Duration::from_secs(3));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.add(message, ToastLevel::Warning, Duration::from_secs(5));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.add(message, ToastLevel::Error, Duration::from_secs(5));
    }

    pub fn remove(&self, id: Uuid) {
        let mut toasts = self.0.lock().expect("toast lock");
        if let Some(index) = toasts.iter().position(|t| t.id == id) {
            toasts.remove(index);
        }
    }

    /// Drops expired toasts and returns the ones still showing.
    pub fn sweep(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut toasts = self.0.lock().expect("toast lock");
        toasts.retain(|t| t.expires_at > now);
        toasts.clone()
    }

    pub fn active(&self) -> Vec<Toast> {
        let now = Instant::now();
        self.0
            .lock()
            .expect("toast lock")
            .iter()
            .filter(|t| t.expires_at > now)
            .cloned()
            .collect()
    }
}
