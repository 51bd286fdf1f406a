//! User-facing notifications.
//!
//! Views report outcomes through a [`Notifier`]; each front end plugs in its
//! own backend (terminal output, a dialog).

use std::sync::Mutex;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Keeps every notification in memory, for embedding and tests
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((title.to_string(), message.to_string()));
        }
    }
}
