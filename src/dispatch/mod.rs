use crate::api::Transport;
use crate::commands::{Command, Severity};
use crate::config::ImageWireNaming;
use crate::error::ApiResult;
use crate::models::EntityRecord;
use std::sync::{Arc, Mutex};

/// Surfaces failures the user has to see.
pub trait Reporter: Send + Sync {
    fn alert(&self, message: &str);
}

/// Blocking `window.alert`. Outside a browser the message is only logged.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowReporter;

impl Reporter for WindowReporter {
    fn alert(&self, message: &str) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(win) = web_sys::window() {
                let _ = win.alert_with_message(message);
                return;
            }
        }

        tracing::warn!(%message, "alert without a window");
    }
}

/// Keeps alerts in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    alerts: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl Reporter for RecordingReporter {
    fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Single entry point for every mutation.
///
/// Routes a [`Command`], sends it, logs the outcome, and raises an alert for
/// user-visible commands that fail. The error is still returned so callers
/// can inspect it, but it has already been surfaced.
pub struct Dispatcher<T> {
    transport: Arc<T>,
    reporter: Arc<dyn Reporter>,
    naming: ImageWireNaming,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            reporter: Arc::clone(&self.reporter),
            naming: self.naming,
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: Arc<T>, reporter: Arc<dyn Reporter>, naming: ImageWireNaming) -> Self {
        Self {
            transport,
            reporter,
            naming,
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn naming(&self) -> ImageWireNaming {
        self.naming
    }

    pub async fn dispatch(&self, command: Command) -> ApiResult<serde_json::Value> {
        let name = command.name();
        let table = command.table().to_string();
        let severity = command.severity();

        let result = match command.into_request(self.naming) {
            Ok(request) => {
                tracing::debug!(
                    command = name,
                    method = %request.method,
                    path = %request.path,
                    "sending"
                );
                self.transport.send(request).await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => {
                let id = serde_json::from_value::<EntityRecord>(response.clone())
                    .ok()
                    .and_then(|r| r.id);
                tracing::info!(command = name, %table, ?id, %response, "succeeded");
                Ok(response)
            }
            Err(e) => {
                tracing::error!(command = name, %table, error = %e, "failed");
                if let Severity::UserVisible(prefix) = severity {
                    self.reporter.alert(&format!("{prefix}{e}"));
                }
                Err(e)
            }
        }
    }

    /// Alerts about a failure that happened before a command could be built,
    /// such as an unreadable upload form.
    pub fn report(&self, severity: Severity, error: &dyn std::fmt::Display) {
        tracing::error!(error = %error, "could not prepare request");
        if let Severity::UserVisible(prefix) = severity {
            self.reporter.alert(&format!("{prefix}{error}"));
        }
    }
}
