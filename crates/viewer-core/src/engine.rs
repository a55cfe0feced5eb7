//! Contracts for the external rendering engine
//!
//! The engine decodes and paints pages; this crate only drives it. All
//! futures are `?Send`: the engine lives on a single cooperative event loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::PageGeometry;
use crate::error::EngineError;
use crate::events::EventBus;
use crate::scale::ScaleValue;

/// Header name to value, sent with every document request
pub type AuthHeaders = BTreeMap<String, String>;

/// Where a document comes from; replaced wholesale on every change
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentSource {
    pub uri: String,
    #[serde(default, rename = "httpHeader")]
    pub auth_headers: AuthHeaders,
}

impl DocumentSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            auth_headers: AuthHeaders::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: AuthHeaders) -> Self {
        self.auth_headers = headers;
        self
    }
}

/// An opened document
#[async_trait(?Send)]
pub trait DocumentHandle {
    /// Output surface pages are painted onto (e.g. a canvas context)
    type Surface;

    fn page_count(&self) -> u32;

    /// Unscaled size of a 1-based page
    fn page_geometry(&self, page: u32) -> Option<PageGeometry>;

    /// Filename reported by the transport that fetched the document, if any
    fn transport_filename(&self) -> Option<String>;

    /// Paint `page` at `scale`; resolves once the engine has finished painting
    async fn render_page(
        &self,
        page: u32,
        scale: f64,
        surface: &Self::Surface,
    ) -> Result<(), EngineError>;

    /// Geometry of every page, in order
    fn pages(&self) -> Vec<PageGeometry> {
        (1..=self.page_count())
            .filter_map(|page| self.page_geometry(page))
            .collect()
    }
}

/// A live engine instance bound to an output container and one event bus
pub trait EngineViewer {
    fn set_scale_value(&self, value: ScaleValue);

    fn current_scale(&self) -> f64;

    fn set_current_page(&self, page: u32);

    /// Release the instance; the engine must stop dispatching on its bus
    fn close(&self);
}

#[async_trait(?Send)]
pub trait RenderEngine {
    type Document: DocumentHandle;
    type Viewer: EngineViewer;

    async fn open(&self, source: &DocumentSource) -> Result<Self::Document, EngineError>;

    /// Build an engine instance showing `document` that reports through `bus`
    fn create_viewer(
        &self,
        document: &Self::Document,
        bus: EventBus,
    ) -> Result<Self::Viewer, EngineError>;
}

/// Surface type used by an engine's documents
pub type SurfaceOf<E> = <<E as RenderEngine>::Document as DocumentHandle>::Surface;

/// Tells whether the current viewport counts as a small screen
pub trait ViewportInspector {
    fn is_small_screen(&self) -> bool;
}

/// Fixed answer, for hosts without a viewport
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedViewport(pub bool);

impl ViewportInspector for FixedViewport {
    fn is_small_screen(&self) -> bool {
        self.0
    }
}
