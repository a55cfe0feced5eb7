//! Export filename resolution
//!
//! Prefers the filename the transport reported while fetching the document
//! and falls back to a configured default (`download.pdf`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::config::DEFAULT_FILENAME;
use crate::engine::{AuthHeaders, DocumentSource};
use crate::error::ViewerError;

/// Immutable export request handed to the download action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub src: String,
    pub http_header: AuthHeaders,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResolver {
    default_filename: String,
}

impl Default for DownloadResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FILENAME)
    }
}

impl DownloadResolver {
    pub fn new(default_filename: impl Into<String>) -> Self {
        Self {
            default_filename: default_filename.into(),
        }
    }

    pub fn resolve(
        &self,
        source: &DocumentSource,
        transport_filename: Option<&str>,
    ) -> DownloadRequest {
        let filename = transport_filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.default_filename)
            .to_string();

        DownloadRequest {
            src: source.uri.clone(),
            http_header: source.auth_headers.clone(),
            filename,
        }
    }
}

/// External download action that performs the export
#[async_trait(?Send)]
pub trait DocumentExporter {
    async fn export(&self, request: &DownloadRequest) -> Result<(), ViewerError>;
}

/// A resolved export waiting to be handed to the download action
pub struct DownloadTicket {
    exporter: Rc<dyn DocumentExporter>,
    request: DownloadRequest,
}

impl DownloadTicket {
    pub fn new(exporter: Rc<dyn DocumentExporter>, request: DownloadRequest) -> Self {
        Self { exporter, request }
    }

    pub fn request(&self) -> &DownloadRequest {
        &self.request
    }

    pub async fn run(self) -> Result<DownloadRequest, ViewerError> {
        self.exporter.export(&self.request).await?;
        tracing::info!("Exported {} as {}", self.request.src, self.request.filename);
        Ok(self.request)
    }
}
