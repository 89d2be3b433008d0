use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Info,
    Success,
    Warning,
    Error,
}

impl AlertKind {
    pub fn lifetime(self) -> Duration {
        match self {
            AlertKind::Info | AlertKind::Success => Duration::from_millis(3000),
            AlertKind::Warning => Duration::from_millis(4000),
            AlertKind::Error => Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: AlertKind,
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Default)]
pub struct Alerts {
    toasts: Vec<Toast>,
    modal: VecDeque<String>,
}

impl Alerts {
    pub fn push(&mut self, kind: AlertKind, message: impl Into<String>, now: Instant) {
        self.toasts.push(Toast { kind, message: message.into(), expires_at: now + kind.lifetime() });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(AlertKind::Info, message, Instant::now());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(AlertKind::Success, message, Instant::now());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(AlertKind::Warning, message, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(AlertKind::Error, message, Instant::now());
    }

    /// Drop expired toasts and return the ones still showing.
    pub fn active(&mut self, now: Instant) -> &[Toast] {
        self.toasts.retain(|t| t.expires_at > now);
        &self.toasts
    }

    /// Queue a message for the blocking dialog.
    pub fn modal(&mut self, message: impl Into<String>) {
        self.modal.push_back(message.into());
    }

    pub fn current_modal(&self) -> Option<&str> {
        self.modal.front().map(String::as_str)
    }

    pub fn dismiss_modal(&mut self) {
        self.modal.pop_front();
    }
}

/// Reports keyboard focus changes once per transition.
#[derive(Default)]
pub struct FocusTracker {
    focused: bool,
}

impl FocusTracker {
    /// Returns the new state when it differs from the last reported one.
    pub fn update(&mut self, focused: bool) -> Option<bool> {
        if focused == self.focused {
            return None;
        }
        self.focused = focused;
        Some(focused)
    }
}
