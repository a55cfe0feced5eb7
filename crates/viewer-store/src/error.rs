use thiserror::Error;
use viewer_core::{ConfigError, TransportError, ViewerError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Store is not configured: {0} is missing")]
    NotConfigured(&'static str),
}

impl StoreError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, StoreError::Viewer(e) if e.is_not_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_errors_pass_through() {
        let err: StoreError = ViewerError::Range { page: 4, total: 3 }.into();
        assert_eq!(err.to_string(), "Page 4 is out of range (1-3)");
        assert!(!err.is_not_ready());
        assert!(StoreError::from(ViewerError::NotReady("no document")).is_not_ready());
    }
}
