//! Page console forwarding.
//!
//! The host injects [`CONSOLE_CAPTURE_SCRIPT`] at document start. It wraps the
//! page's `console` methods and posts every line to the [`CONSOLE_HANDLER_NAME`]
//! message handler as JSON text `{ level, message, timestamp }`. Native code
//! passes that text to [`forward_console`], which re-emits them through `tracing`
//! under the [`CONSOLE_TARGET`] target.

use bridge_traits::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::envelope::EnvelopeError;

/// Message handler receiving bridge envelopes.
pub const BRIDGE_HANDLER_NAME: &str = "nativeBridge";

/// Message handler receiving console lines.
pub const CONSOLE_HANDLER_NAME: &str = "consoleLog";

/// `tracing` target used for forwarded page console lines.
pub const CONSOLE_TARGET: &str = "core_auth::console";

/// User script wrapping `console.{log,error,warn,info,debug}`.
///
/// The original method still runs; posting failures are swallowed so a
/// missing handler never breaks the page.
pub const CONSOLE_CAPTURE_SCRIPT: &str = r#"(function() {
    var handler = window.webkit && window.webkit.messageHandlers && window.webkit.messageHandlers.consoleLog;
    function format(args) {
        return Array.from(args).map(function(arg) {
            if (typeof arg === 'object') {
                try { return JSON.stringify(arg); } catch (e) { return String(arg); }
            }
            return String(arg);
        }).join(' ');
    }
    ['log', 'error', 'warn', 'info', 'debug'].forEach(function(level) {
        var original = console[level];
        console[level] = function() {
            original.apply(console, arguments);
            try {
                if (handler) {
                    handler.postMessage(JSON.stringify({ level: level, message: format(arguments), timestamp: new Date().toISOString() }));
                }
            } catch (e) {}
        };
    });
})();"#;

/// One console line posted by the capture script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ConsoleMessage {
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        serde_json::from_str(raw).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_console_method(&self.level)
    }

    /// Page-side time of the call; `None` if absent or not RFC 3339.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Emits the line through `tracing` at its mapped level.
    pub fn emit(&self) {
        let page_time = self.timestamp().map(|ts| ts.to_rfc3339());
        let message = self.message.as_str();
        match self.log_level() {
            LogLevel::Error => error!(target: "core_auth::console", page_time = ?page_time, "{}", message),
            LogLevel::Warn => warn!(target: "core_auth::console", page_time = ?page_time, "{}", message),
            LogLevel::Info => info!(target: "core_auth::console", page_time = ?page_time, "{}", message),
            LogLevel::Debug => debug!(target: "core_auth::console", page_time = ?page_time, "{}", message),
            LogLevel::Trace => trace!(target: "core_auth::console", page_time = ?page_time, "{}", message),
        }
    }
}

/// Parses a console payload and logs it. Malformed payloads are dropped.
pub fn forward_console(raw: &str) -> Option<ConsoleMessage> {
    match ConsoleMessage::parse(raw) {
        Ok(line) => {
            line.emit();
            Some(line)
        }
        Err(e) => {
            debug!(error = %e, "Dropping malformed console message");
            None
        }
    }
}
