//! Scripted engine, transport and exporter doubles
//!
//! Every double is a cheap `Rc` handle: keep a clone in the test, move the
//! other into the code under test, and inspect what happened afterwards.

use async_trait::async_trait;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::context::PageGeometry;
use crate::download::{DocumentExporter, DownloadRequest};
use crate::engine::{DocumentHandle, DocumentSource, EngineViewer, RenderEngine};
use crate::error::{EngineError, TransportError, ViewerError};
use crate::events::{EngineEvent, EventBus};
use crate::scale::ScaleValue;
use crate::transport::{Headers, RequestBody, TransferProgress, Transport};

pub const LETTER: PageGeometry = PageGeometry {
    width: 612.0,
    height: 792.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeDocumentSpec {
    pub page_count: u32,
    pub page_size: PageGeometry,
    pub filename: Option<String>,
    pub failing_pages: Vec<u32>,
}

impl FakeDocumentSpec {
    pub fn pages(page_count: u32) -> Self {
        Self {
            page_count,
            page_size: LETTER,
            filename: None,
            failing_pages: Vec::new(),
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_size = PageGeometry::new(width, height);
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.push(page);
        self
    }
}

/// Output surface that records every paint
#[derive(Debug, Default)]
pub struct FakeSurface {
    painted: RefCell<Vec<(u32, f64)>>,
}

impl FakeSurface {
    pub fn painted(&self) -> Vec<(u32, f64)> {
        self.painted.borrow().clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakeDocument {
    uri: String,
    spec: FakeDocumentSpec,
}

impl FakeDocument {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait(?Send)]
impl DocumentHandle for FakeDocument {
    type Surface = FakeSurface;

    fn page_count(&self) -> u32 {
        self.spec.page_count
    }

    fn page_geometry(&self, page: u32) -> Option<PageGeometry> {
        (1..=self.spec.page_count)
            .contains(&page)
            .then_some(self.spec.page_size)
    }

    fn transport_filename(&self) -> Option<String> {
        self.spec.filename.clone()
    }

    async fn render_page(
        &self,
        page: u32,
        scale: f64,
        surface: &FakeSurface,
    ) -> Result<(), EngineError> {
        if self.spec.failing_pages.contains(&page) {
            return Err(EngineError::Render {
                page,
                reason: "scripted failure".to_string(),
            });
        }
        surface.painted.borrow_mut().push((page, scale));
        Ok(())
    }
}

#[derive(Debug)]
struct ViewerProbe {
    bus: EventBus,
    scale_values: RefCell<Vec<ScaleValue>>,
    current_scale: Cell<f64>,
    current_page: Cell<Option<u32>>,
    closed: Cell<bool>,
}

/// Engine instance double; clones share state
#[derive(Debug, Clone)]
pub struct FakeViewer {
    probe: Rc<ViewerProbe>,
}

impl FakeViewer {
    fn new(bus: EventBus) -> Self {
        Self {
            probe: Rc::new(ViewerProbe {
                bus,
                scale_values: RefCell::new(Vec::new()),
                current_scale: Cell::new(1.0),
                current_page: Cell::new(None),
                closed: Cell::new(false),
            }),
        }
    }

    /// Publish on this instance's bus, as the engine would
    pub fn emit(&self, event: EngineEvent) -> bool {
        !self.probe.closed.get() && self.probe.bus.dispatch(event)
    }

    pub fn scale_values(&self) -> Vec<ScaleValue> {
        self.probe.scale_values.borrow().clone()
    }

    pub fn last_scale_value(&self) -> Option<ScaleValue> {
        self.probe.scale_values.borrow().last().copied()
    }

    pub fn current_page(&self) -> Option<u32> {
        self.probe.current_page.get()
    }

    pub fn is_closed(&self) -> bool {
        self.probe.closed.get()
    }

    pub fn bus_open(&self) -> bool {
        !self.probe.bus.is_closed()
    }
}

impl EngineViewer for FakeViewer {
    fn set_scale_value(&self, value: ScaleValue) {
        if let ScaleValue::Factor(scale) = value {
            self.probe.current_scale.set(scale);
        }
        self.probe.scale_values.borrow_mut().push(value);
    }

    fn current_scale(&self) -> f64 {
        self.probe.current_scale.get()
    }

    fn set_current_page(&self, page: u32) {
        self.probe.current_page.set(Some(page));
    }

    fn close(&self) {
        self.probe.closed.set(true);
    }
}

#[derive(Debug, Default)]
struct EngineState {
    documents: HashMap<String, Result<FakeDocumentSpec, String>>,
    opened: Vec<DocumentSource>,
    viewers: Vec<FakeViewer>,
    pages_init: Option<(u32, f64)>,
}

/// Rendering engine double serving scripted documents
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    state: Rc<RefCell<EngineState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, uri: &str, spec: FakeDocumentSpec) -> Self {
        self.state
            .borrow_mut()
            .documents
            .insert(uri.to_string(), Ok(spec));
        self
    }

    pub fn with_failure(self, uri: &str, reason: &str) -> Self {
        self.state
            .borrow_mut()
            .documents
            .insert(uri.to_string(), Err(reason.to_string()));
        self
    }

    /// Emit `pagesinit` as soon as a viewer is created
    pub fn with_pages_init(self, start_page: u32, initial_scale: f64) -> Self {
        self.state.borrow_mut().pages_init = Some((start_page, initial_scale));
        self
    }

    pub fn open_count(&self) -> usize {
        self.state.borrow().opened.len()
    }

    pub fn opened(&self) -> Vec<DocumentSource> {
        self.state.borrow().opened.clone()
    }

    pub fn viewer_count(&self) -> usize {
        self.state.borrow().viewers.len()
    }

    pub fn viewer(&self, index: usize) -> Option<FakeViewer> {
        self.state.borrow().viewers.get(index).cloned()
    }

    pub fn last_viewer(&self) -> Option<FakeViewer> {
        self.state.borrow().viewers.last().cloned()
    }

    /// Emit on the most recently created viewer's bus
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.last_viewer()
            .map(|viewer| viewer.emit(event))
            .unwrap_or(false)
    }
}

#[async_trait(?Send)]
impl RenderEngine for FakeEngine {
    type Document = FakeDocument;
    type Viewer = FakeViewer;

    async fn open(&self, source: &DocumentSource) -> Result<FakeDocument, EngineError> {
        let mut state = self.state.borrow_mut();
        state.opened.push(source.clone());
        match state.documents.get(&source.uri) {
            Some(Ok(spec)) => Ok(FakeDocument {
                uri: source.uri.clone(),
                spec: spec.clone(),
            }),
            Some(Err(reason)) => Err(EngineError::Open(reason.clone())),
            None => Err(EngineError::Open(format!("{} not found", source.uri))),
        }
    }

    fn create_viewer(
        &self,
        document: &FakeDocument,
        bus: EventBus,
    ) -> Result<FakeViewer, EngineError> {
        let viewer = FakeViewer::new(bus);
        let mut state = self.state.borrow_mut();
        if let Some((start_page, initial_scale)) = state.pages_init {
            viewer.emit(EngineEvent::PagesInit {
                current_page_number: start_page,
                current_scale: initial_scale,
                pages_count: document.spec.page_count,
            });
        }
        state.viewers.push(viewer.clone());
        Ok(viewer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub headers: Headers,
}

#[derive(Debug, Default)]
struct TransportState {
    responses: HashMap<(&'static str, String), Result<Value, TransportError>>,
    requests: Vec<RecordedRequest>,
    progress: Vec<TransferProgress>,
}

/// Transport double answering from a fixed table; unknown routes get a 404
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Rc<RefCell<TransportState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(self, url: &str, response: Value) -> Self {
        self.respond("GET", url, Ok(response))
    }

    pub fn with_post(self, url: &str, response: Value) -> Self {
        self.respond("POST", url, Ok(response))
    }

    pub fn with_post_failure(self, url: &str, status: u16) -> Self {
        let error = TransportError::Status {
            url: url.to_string(),
            status,
        };
        self.respond("POST", url, Err(error))
    }

    /// Progress events reported before every `post_with_progress` response
    pub fn with_progress(self, steps: &[(u64, u64)]) -> Self {
        self.state.borrow_mut().progress = steps
            .iter()
            .map(|&(loaded, total)| TransferProgress { loaded, total })
            .collect();
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.borrow().requests.clone()
    }

    fn respond(self, method: &'static str, url: &str, response: Result<Value, TransportError>) -> Self {
        self.state
            .borrow_mut()
            .responses
            .insert((method, url.to_string()), response);
        self
    }

    fn answer(&self, request: RecordedRequest) -> Result<Value, TransportError> {
        let mut state = self.state.borrow_mut();
        let key = (request.method, request.url.clone());
        let url = request.url.clone();
        state.requests.push(request);
        state
            .responses
            .get(&key)
            .cloned()
            .unwrap_or(Err(TransportError::Status { url, status: 404 }))
    }
}

#[async_trait(?Send)]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<Value, TransportError> {
        self.answer(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            params: params.to_vec(),
            body: None,
            headers: Headers::new(),
        })
    }

    async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        self.answer(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            params: Vec::new(),
            body: Some(body),
            headers: headers.clone(),
        })
    }

    async fn post_with_progress(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
        on_progress: &dyn Fn(TransferProgress),
    ) -> Result<Value, TransportError> {
        let steps = self.state.borrow().progress.clone();
        for step in steps {
            on_progress(step);
        }
        self.post(url, body, headers).await
    }
}

/// Download action double recording each export request
#[derive(Debug, Clone, Default)]
pub struct RecordingExporter {
    requests: Rc<RefCell<Vec<DownloadRequest>>>,
    failure: Option<TransportError>,
}

impl RecordingExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            requests: Rc::default(),
            failure: Some(error),
        }
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl DocumentExporter for RecordingExporter {
    async fn export(&self, request: &DownloadRequest) -> Result<(), ViewerError> {
        self.requests.borrow_mut().push(request.clone());
        match &self.failure {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }
}
