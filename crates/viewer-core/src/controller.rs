//! Viewer controller
//!
//! Owns one `DocumentSession` and one `RenderingBridge`. Source changes go
//! through a full reload; engine events are pumped from the bridge and folded
//! into the render context; UI commands are checked against `pagesinit`
//! before they touch scale or pagination.

use serde::Serialize;
use std::rc::Rc;

use crate::bridge::{RenderCompletion, RenderTicket, RenderingBridge};
use crate::config::ViewerConfig;
use crate::context::{PageContainer, RenderContext, RenderedPages};
use crate::download::{DocumentExporter, DownloadRequest, DownloadResolver, DownloadTicket};
use crate::engine::{DocumentHandle, DocumentSource, RenderEngine, SurfaceOf, ViewportInspector};
use crate::error::{EngineError, ViewerError};
use crate::events::{EngineEvent, SessionToken};
use crate::pagination::Pagination;
use crate::scale::{FitMode, Scale, ScalePolicy};
use crate::session::{DocumentSession, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerCommand {
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Download,
    GoToPage(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Scaled(f64),
    Navigated(u32),
    Downloaded(DownloadRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Painted,
    /// The result belonged to an earlier session and was dropped
    Stale,
}

/// Serializable snapshot for the UI layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
    pub status: SessionStatus,
    pub token: SessionToken,
    pub source: Option<DocumentSource>,
    pub pagination: Pagination,
    pub scale: Scale,
    pub fit_mode: Option<FitMode>,
    pub page_container: PageContainer,
    pub rendered_pages: RenderedPages,
}

/// An open request issued by `begin_source_change`
///
/// Runs without borrowing the controller; hand the completion back through
/// `finish_source_change`.
pub struct LoadTicket<E: RenderEngine> {
    engine: E,
    source: DocumentSource,
    token: SessionToken,
}

impl<E: RenderEngine> LoadTicket<E> {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub async fn run(self) -> LoadCompletion<E::Document> {
        let result = self.engine.open(&self.source).await;
        LoadCompletion {
            token: self.token,
            result,
        }
    }
}

pub struct LoadCompletion<D> {
    pub token: SessionToken,
    pub result: Result<D, EngineError>,
}

pub struct ViewerController<E: RenderEngine> {
    engine: E,
    config: ViewerConfig,
    policy: ScalePolicy,
    resolver: DownloadResolver,
    viewport: Box<dyn ViewportInspector>,
    exporter: Rc<dyn DocumentExporter>,
    session: DocumentSession<E::Document>,
    bridge: RenderingBridge<E>,
    small_screen: bool,
}

impl<E: RenderEngine> ViewerController<E> {
    pub fn new(
        engine: E,
        config: ViewerConfig,
        viewport: Box<dyn ViewportInspector>,
        exporter: Box<dyn DocumentExporter>,
    ) -> Self {
        let policy = ScalePolicy::from_config(&config);
        let resolver = DownloadResolver::new(config.default_filename.clone());
        Self {
            engine,
            config,
            policy,
            resolver,
            viewport,
            exporter: Rc::from(exporter),
            session: DocumentSession::new(),
            bridge: RenderingBridge::new(),
            small_screen: false,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn token(&self) -> SessionToken {
        self.session.token()
    }

    pub fn context(&self) -> &RenderContext {
        self.session.context()
    }

    pub fn is_small_screen(&self) -> bool {
        self.small_screen
    }

    /// Reload for a new (or changed) source and attach a fresh viewer
    ///
    /// Any change, including headers only, reopens the document.
    pub async fn on_source_change(
        &mut self,
        source: DocumentSource,
    ) -> Result<SessionToken, ViewerError>
    where
        E: Clone,
    {
        let completion = self.begin_source_change(source).run().await;
        self.finish_source_change(completion)
    }

    /// Detach the current viewer and start a new session for `source`
    ///
    /// Every later `begin_source_change` supersedes this one: only the
    /// completion carrying the newest token is attached.
    pub fn begin_source_change(&mut self, source: DocumentSource) -> LoadTicket<E>
    where
        E: Clone,
    {
        self.small_screen = self.viewport.is_small_screen();
        let token = self.session.begin_reload(&mut self.bridge, source.clone());
        LoadTicket {
            engine: self.engine.clone(),
            source,
            token,
        }
    }

    pub fn finish_source_change(
        &mut self,
        completion: LoadCompletion<E::Document>,
    ) -> Result<SessionToken, ViewerError> {
        let token = self
            .session
            .complete_load(completion.token, completion.result)?;
        let document = self
            .session
            .document()
            .cloned()
            .ok_or(ViewerError::NotReady("document not loaded"))?;

        if let Err(e) = self.bridge.attach(&self.engine, document, token) {
            tracing::warn!("Session {} could not attach a viewer: {}", token, e);
            self.session.close();
            return Err(e);
        }

        self.pump_events();
        Ok(token)
    }

    /// Apply every queued engine event for the current session
    ///
    /// Returns the number of events handled.
    pub fn pump_events(&mut self) -> usize {
        let token = self.session.token();
        if let Some(attached) = self.bridge.token() {
            if attached != token {
                tracing::debug!("Viewer for {} outlived its session {}", attached, token);
                self.bridge.detach();
                return 0;
            }
        }

        let events = self.bridge.drain_events();
        let handled = events.len();
        for event in events {
            self.handle_event(event);
        }
        handled
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::PagesInit {
                current_page_number,
                current_scale,
                pages_count,
            } => self.on_pages_init(pages_count, current_page_number, current_scale),
            EngineEvent::ScaleChanging { scale } => {
                let context = self.session.context_mut();
                if !context.is_ready() || !(scale > 0.0) {
                    tracing::debug!("Ignoring scalechanging({}) before pagesinit", scale);
                    return;
                }
                context.scale.current = scale;
            }
            EngineEvent::PageChanging { page_number } => {
                if !self.session.context_mut().pagination.on_page_change(page_number) {
                    tracing::debug!("Ignoring pagechanging({})", page_number);
                }
            }
        }
    }

    fn on_pages_init(&mut self, pages_count: u32, start_page: u32, initial_scale: f64) {
        let initial_scale = if initial_scale > 0.0 { initial_scale } else { 1.0 };
        let fit_mode = ScalePolicy::initial_fit_mode(self.small_screen);
        let first_page = self.session.first_page();

        let context = self.session.context_mut();
        context.pagination.on_pages_init(pages_count, start_page);
        context.scale = Scale::opened(initial_scale);
        context.fit_mode = Some(fit_mode);
        context.rendered_pages.clear();
        context.update_page_container(first_page);

        if let Err(e) = self.bridge.set_fit_mode(fit_mode) {
            tracing::warn!("Could not apply fit mode {}: {}", fit_mode, e);
        }
        tracing::info!(
            "Session {} initialized: {} pages, scale {}, {}",
            self.session.token(),
            pages_count,
            initial_scale,
            fit_mode
        );
    }

    fn ensure_ready(&self) -> Result<(), ViewerError> {
        if self.session.context().is_ready() && self.bridge.is_attached() {
            Ok(())
        } else {
            Err(ViewerError::NotReady("waiting for pagesinit"))
        }
    }

    fn apply_scale(&mut self, next: f64) -> Result<f64, ViewerError> {
        let first_page = self.session.first_page();
        let context = self.session.context_mut();
        context.scale.current = next;
        context.fit_mode = None;
        context.update_page_container(first_page);
        self.bridge.set_scale(next)?;
        Ok(next)
    }

    pub fn zoom_in(&mut self) -> Result<f64, ViewerError> {
        self.ensure_ready()?;
        let next = self.policy.zoom_in(&self.session.context().scale);
        self.apply_scale(next)
    }

    pub fn zoom_out(&mut self) -> Result<f64, ViewerError> {
        self.ensure_ready()?;
        let scale = self.session.context().scale;
        let next = self.policy.zoom_out(&scale);
        if next == scale.current {
            tracing::debug!("Zoom out refused at scale {}", scale.current);
        }
        self.apply_scale(next)
    }

    pub fn reset_zoom(&mut self) -> Result<f64, ViewerError> {
        self.ensure_ready()?;
        let next = self.policy.reset_zoom(&self.session.context().scale);
        self.apply_scale(next)
    }

    pub fn go_to_page(&mut self, page_number: u32) -> Result<u32, ViewerError> {
        self.ensure_ready()?;
        self.session.context_mut().pagination.go_to(page_number)?;
        self.bridge.set_current_page(page_number)?;
        Ok(page_number)
    }

    /// Resolve the export request and hand it to the download action
    pub async fn download(&self) -> Result<DownloadRequest, ViewerError> {
        self.begin_download()?.run().await
    }

    /// Resolve the export request; the ticket runs the export without
    /// borrowing the controller
    pub fn begin_download(&self) -> Result<DownloadTicket, ViewerError> {
        self.ensure_ready()?;
        let source = self
            .session
            .source()
            .ok_or(ViewerError::NotReady("no document source"))?;
        let reported = self
            .session
            .document()
            .and_then(|document| document.transport_filename());
        let request = self.resolver.resolve(source, reported.as_deref());
        Ok(DownloadTicket::new(Rc::clone(&self.exporter), request))
    }

    pub async fn dispatch(&mut self, command: ViewerCommand) -> Result<CommandOutcome, ViewerError> {
        match command {
            ViewerCommand::ZoomIn => self.zoom_in().map(CommandOutcome::Scaled),
            ViewerCommand::ZoomOut => self.zoom_out().map(CommandOutcome::Scaled),
            ViewerCommand::ResetZoom => self.reset_zoom().map(CommandOutcome::Scaled),
            ViewerCommand::GoToPage(page) => self.go_to_page(page).map(CommandOutcome::Navigated),
            ViewerCommand::Download => self.download().await.map(CommandOutcome::Downloaded),
        }
    }

    /// Issue a render for `page` at the current scale
    ///
    /// The ticket does not borrow the controller; feed its completion back
    /// through `finish_render`.
    pub fn begin_render(&self, page: u32) -> Result<RenderTicket<E>, ViewerError> {
        self.ensure_ready()?;
        let context = self.session.context();
        self.bridge
            .begin_render(page, context.scale.current, context.pagination.total())
    }

    pub fn finish_render(&mut self, completion: RenderCompletion) -> Result<RenderOutcome, ViewerError> {
        if completion.token != self.session.token() {
            tracing::debug!(
                "Discarding render of page {} from session {}",
                completion.page,
                completion.token
            );
            return Ok(RenderOutcome::Stale);
        }
        completion.result?;
        self.session
            .context_mut()
            .rendered_pages
            .insert(completion.page);
        Ok(RenderOutcome::Painted)
    }

    pub async fn render_page(
        &mut self,
        page: u32,
        surface: &SurfaceOf<E>,
    ) -> Result<RenderOutcome, ViewerError> {
        let completion = self.begin_render(page)?.run(surface).await;
        self.finish_render(completion)
    }

    /// Reset pagination, scale, page container and rendered pages while
    /// keeping the document and viewer attached
    pub fn clear_render_context(&mut self) {
        self.session.clear_render_context();
    }

    pub fn clear_rendered_pages(&mut self) {
        self.session.context_mut().rendered_pages.clear();
    }

    pub fn update_page_container(&mut self) -> PageContainer {
        let first_page = self.session.first_page();
        let context = self.session.context_mut();
        context.update_page_container(first_page);
        context.page_container
    }

    pub fn close(&mut self) {
        self.bridge.detach();
        self.session.close();
    }

    pub fn state(&self) -> ViewerState {
        let context = self.session.context();
        ViewerState {
            status: self.session.status(),
            token: self.session.token(),
            source: self.session.source().cloned(),
            pagination: context.pagination,
            scale: context.scale,
            fit_mode: context.fit_mode,
            page_container: context.page_container,
            rendered_pages: context.rendered_pages.clone(),
        }
    }
}
