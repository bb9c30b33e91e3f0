//! Notification and confirmation surfaces the session reports through.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient messages shown to the user (toasts in the browser).
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity, duration: Duration);
}

/// Asked before destructive operations.
pub trait Confirmer {
    fn confirm(&self, request: &ConfirmRequest) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    pub destructive: bool,
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity, _duration: Duration) {
        match severity {
            Severity::Success | Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

/// A confirmation the user already gave (or refused) before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Answered(pub bool);

impl Confirmer for Answered {
    fn confirm(&self, _request: &ConfirmRequest) -> bool {
        self.0
    }
}
