//! Transient, auto-dismissing status messages.
//!
//! At most one notification is visible; showing a new one replaces the
//! current one immediately instead of queueing behind it.

use log::debug;
use ratatui::style::Color;
use std::time::{Duration, Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl NotificationKind {
    pub fn accent(self) -> Color {
        match self {
            Self::Success => Color::Green,
            Self::Error => Color::Red,
            Self::Info => Color::Blue,
            Self::Warning => Color::Yellow,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

#[derive(Debug)]
pub struct Notifier {
    current: Option<Notification>,
    default_duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl Notifier {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            current: None,
            default_duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.show_for(message, kind, self.default_duration);
    }

    pub fn show_for(&mut self, message: impl Into<String>, kind: NotificationKind, duration: Duration) {
        self.show_at(message, kind, duration, Instant::now());
    }

    pub fn show_at(
        &mut self,
        message: impl Into<String>,
        kind: NotificationKind,
        duration: Duration,
        now: Instant,
    ) {
        let message = message.into();
        debug!(
            "event=notify module=notifier kind={} message=\"{}\"",
            kind.label(),
            message
        );
        self.current = Some(Notification {
            message,
            kind,
            expires_at: now + duration,
        });
    }

    /// Drops the current notification once its deadline has passed.
    pub fn prune(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
