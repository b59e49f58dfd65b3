/// Errors surfaced by the browser capability layer
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host reported a failure for the last operation (`runtime.lastError`).
    Host(String),
    /// A value could not be converted to or from its stored JSON shape.
    Serialization(String),
    /// A setting was rejected before being written.
    InvalidSetting(String),
}

impl HostError {
    pub fn host(message: impl Into<String>) -> Self {
        HostError::Host(message.into())
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Host(msg) => write!(f, "Browser API error: {}", msg),
            HostError::Serialization(msg) => write!(f, "Serialization failed: {}", msg),
            HostError::InvalidSetting(msg) => write!(f, "Invalid setting: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::Serialization(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for HostError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        HostError::Serialization(err.to_string())
    }
}
