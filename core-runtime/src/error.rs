//! Errors raised while assembling the bridge runtime.

use thiserror::Error;

/// Startup failures. Nothing here is raised once a flow is running.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid settings, or a logging subscriber that could not be installed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The host did not inject a bridge it has to provide.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

impl Error {
    pub fn capability_missing(capability: &str, message: impl Into<String>) -> Self {
        Error::CapabilityMissing {
            capability: capability.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
