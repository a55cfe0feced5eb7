//! Browser collaborators: the download action and the viewport inspector

use async_trait::async_trait;
use viewer_core::{DocumentExporter, DownloadRequest, TransportError, ViewerError, ViewportInspector};
use wasm_bindgen::prelude::*;

use crate::pdfjs::js_error;

#[wasm_bindgen(module = "/www/js/viewer-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = downloadDocument, catch)]
    async fn download_document_internal(request: JsValue) -> Result<JsValue, JsValue>;
}

/// Fetches the document with its auth headers and saves it under the
/// resolved filename
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserExporter;

#[async_trait(?Send)]
impl DocumentExporter for BrowserExporter {
    async fn export(&self, request: &DownloadRequest) -> Result<(), ViewerError> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let request = serde::Serialize::serialize(request, &serializer)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        download_document_internal(request)
            .await
            .map_err(|e| TransportError::Network(js_error(e)))?;
        Ok(())
    }
}

/// Small screen when `window.innerWidth` is below the breakpoint
#[derive(Debug, Clone, Copy)]
pub struct WindowViewport {
    breakpoint_px: f64,
}

impl WindowViewport {
    pub fn new(breakpoint_px: f64) -> Self {
        Self { breakpoint_px }
    }

    fn width() -> Option<f64> {
        web_sys::window()?.inner_width().ok()?.as_f64()
    }
}

pub fn is_below(width: Option<f64>, breakpoint_px: f64) -> bool {
    width.is_some_and(|width| width < breakpoint_px)
}

impl ViewportInspector for WindowViewport {
    fn is_small_screen(&self) -> bool {
        is_below(Self::width(), self.breakpoint_px)
    }
}
