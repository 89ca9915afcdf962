use colored::*;
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = format!("[{}]", self.summary);
        let tag = match self.severity {
            Severity::Success => tag.green(),
            Severity::Info => tag.cyan(),
            Severity::Warn => tag.yellow(),
            Severity::Error => tag.red(),
        }
        .bold();
        write!(f, "{} {}", tag, self.detail)
    }
}

/// Sending half of the notification channel. Cloned into every view and form.
/// Sends never block and never fail the caller.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

pub struct NotificationFeed {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Notifier {
    pub fn channel() -> (Notifier, NotificationFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx }, NotificationFeed { rx })
    }

    pub fn push(&self, severity: Severity, summary: &str, detail: impl Into<String>) {
        let detail = detail.into();
        match severity {
            Severity::Error => tracing::warn!(summary, %detail, "notification"),
            _ => tracing::debug!(summary, %detail, "notification"),
        }
        let _ = self.tx.send(Notification { severity, summary: summary.to_string(), detail });
    }

    pub fn success(&self, detail: impl Into<String>) {
        self.push(Severity::Success, "Success", detail);
    }

    pub fn info(&self, summary: &str, detail: impl Into<String>) {
        self.push(Severity::Info, summary, detail);
    }

    pub fn warn(&self, summary: &str, detail: impl Into<String>) {
        self.push(Severity::Warn, summary, detail);
    }

    pub fn error(&self, detail: impl Into<String>) {
        self.push(Severity::Error, "Error", detail);
    }
}

impl NotificationFeed {
    /// Everything queued so far, without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.rx.try_recv() {
            out.push(n);
        }
        out
    }
}
