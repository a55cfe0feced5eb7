//! Generic request/response transport used by the store actions

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::TransportError;

pub type Headers = BTreeMap<String, String>;

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content: Vec<u8>,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content: value.into().into_bytes(),
        }
    }

    pub fn file(name: impl Into<String>, filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
    Multipart(Vec<FormPart>),
}

/// Bytes sent so far out of the request total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub loaded: u64,
    pub total: u64,
}

impl TransferProgress {
    /// Rounded percentage; 0 while the total is unknown
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.loaded as f64 * 100.0 / self.total as f64).round();
        percent.clamp(0.0, 100.0) as u8
    }
}

/// Asynchronous transport; non-success statuses surface as `TransportError::Status`
#[async_trait(?Send)]
pub trait Transport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<Value, TransportError>;

    async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
    ) -> Result<Value, TransportError>;

    /// `post` that reports upload progress; transports without progress events
    /// fall back to a plain `post`
    async fn post_with_progress(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
        on_progress: &dyn Fn(TransferProgress),
    ) -> Result<Value, TransportError> {
        let _ = on_progress;
        self.post(url, body, headers).await
    }
}
