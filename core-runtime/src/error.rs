use thiserror::Error;

/// Runtime errors raised while configuring or starting the core.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing setting.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required bridge was not injected and no platform default exists.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
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
