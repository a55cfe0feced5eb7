use thiserror::Error;

use crate::events::SessionToken;

/// Failure reported by a transport call (`get` / `post`).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Failure reported by the rendering engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Failed to open document: {0}")]
    Open(String),

    #[error("Failed to create viewer: {0}")]
    Viewer(String),

    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Page {page} is out of range (1-{total})")]
    Range { page: u32, total: u32 },

    #[error("Viewer is not ready: {0}")]
    NotReady(&'static str),

    #[error("Load for session {0} was superseded by a newer source")]
    Superseded(SessionToken),

    #[error("Rendering engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ViewerError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, ViewerError::NotReady(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
