//! Toast notifications raised by the structure editor

use parking_lot::Mutex;

/// Toast lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub phase: ToastPhase,
    pub message: String,
}

impl Toast {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            phase: ToastPhase::Loading,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            phase: ToastPhase::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: ToastPhase::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// Writes toasts to the tracing log (headless front-ends)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.phase {
            ToastPhase::Loading => tracing::debug!(target: "toast", "{}", toast.message),
            ToastPhase::Success => tracing::info!(target: "toast", "{}", toast.message),
            ToastPhase::Error => tracing::warn!(target: "toast", "{}", toast.message),
        }
    }
}

/// Collects toasts in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All toasts so far, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts.lock().last().cloned()
    }

    pub fn errors(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .iter()
            .filter(|t| t.phase == ToastPhase::Error)
            .cloned()
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}
