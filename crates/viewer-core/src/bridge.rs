//! Rendering bridge
//!
//! Owns at most one `ViewerHandle`: an engine instance plus the event
//! subscription it reports through. Scale values only take visual effect
//! through `set_scale` / `set_fit_mode`.

use std::rc::Rc;

use crate::engine::{DocumentHandle, EngineViewer, RenderEngine, SurfaceOf};
use crate::error::ViewerError;
use crate::events::{self, EngineEvent, EventSubscription, SessionToken};
use crate::scale::{FitMode, ScaleValue};

struct ViewerHandle<E: RenderEngine> {
    viewer: E::Viewer,
    document: Rc<E::Document>,
    subscription: EventSubscription,
    token: SessionToken,
}

pub struct RenderingBridge<E: RenderEngine> {
    handle: Option<ViewerHandle<E>>,
}

impl<E: RenderEngine> Default for RenderingBridge<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: RenderEngine> RenderingBridge<E> {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Create the engine instance and event bus for `document`
    ///
    /// Any previous handle is fully detached first.
    pub fn attach(
        &mut self,
        engine: &E,
        document: Rc<E::Document>,
        token: SessionToken,
    ) -> Result<(), ViewerError> {
        self.detach();

        let (bus, subscription) = events::channel(token);
        let viewer = engine.create_viewer(&document, bus)?;
        tracing::debug!("Attached viewer for session {}", token);

        self.handle = Some(ViewerHandle {
            viewer,
            document,
            subscription,
            token,
        });
        Ok(())
    }

    /// Unregister the event bus and release the engine instance; idempotent
    pub fn detach(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.subscription.close();
            handle.viewer.close();
            tracing::debug!("Detached viewer for session {}", handle.token);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.handle.as_ref().map(|handle| handle.token)
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        match self.handle.as_mut() {
            Some(handle) => handle.subscription.drain(),
            None => Vec::new(),
        }
    }

    pub fn set_scale(&self, value: f64) -> Result<(), ViewerError> {
        self.viewer()?.set_scale_value(ScaleValue::Factor(value));
        Ok(())
    }

    pub fn set_fit_mode(&self, mode: FitMode) -> Result<(), ViewerError> {
        self.viewer()?.set_scale_value(ScaleValue::Fit(mode));
        Ok(())
    }

    pub fn set_current_page(&self, page: u32) -> Result<(), ViewerError> {
        self.viewer()?.set_current_page(page);
        Ok(())
    }

    pub fn current_scale(&self) -> Option<f64> {
        self.handle
            .as_ref()
            .map(|handle| handle.viewer.current_scale())
    }

    /// Validate a render request and capture what it needs to run detached
    /// from the bridge
    pub fn begin_render(
        &self,
        page: u32,
        scale: f64,
        total: Option<u32>,
    ) -> Result<RenderTicket<E>, ViewerError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(ViewerError::NotReady("no viewer attached"))?;
        let total = total.ok_or(ViewerError::NotReady("page count not yet reported"))?;
        if page < 1 || page > total {
            return Err(ViewerError::Range { page, total });
        }

        Ok(RenderTicket {
            document: Rc::clone(&handle.document),
            token: handle.token,
            page,
            scale,
        })
    }

    pub async fn render_page(
        &self,
        page: u32,
        scale: f64,
        total: Option<u32>,
        surface: &SurfaceOf<E>,
    ) -> Result<(), ViewerError> {
        self.begin_render(page, scale, total)?
            .run(surface)
            .await
            .result
    }

    fn viewer(&self) -> Result<&E::Viewer, ViewerError> {
        self.handle
            .as_ref()
            .map(|handle| &handle.viewer)
            .ok_or(ViewerError::NotReady("no viewer attached"))
    }
}

impl<E: RenderEngine> Drop for RenderingBridge<E> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// A validated render request, tagged with the session it was issued for
pub struct RenderTicket<E: RenderEngine> {
    document: Rc<E::Document>,
    token: SessionToken,
    page: u32,
    scale: f64,
}

impl<E: RenderEngine> RenderTicket<E> {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub async fn run(self, surface: &SurfaceOf<E>) -> RenderCompletion {
        let result = self
            .document
            .render_page(self.page, self.scale, surface)
            .await
            .map_err(ViewerError::from);
        RenderCompletion {
            token: self.token,
            page: self.page,
            result,
        }
    }
}

#[derive(Debug)]
pub struct RenderCompletion {
    pub token: SessionToken,
    pub page: u32,
    pub result: Result<(), ViewerError>,
}
