//! Document load lifecycle: `Idle -> Loading -> Ready -> (Loading | Idle)`

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::bridge::RenderingBridge;
use crate::context::{PageGeometry, RenderContext};
use crate::engine::{DocumentHandle, DocumentSource, RenderEngine};
use crate::error::{EngineError, ViewerError};
use crate::events::SessionToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Loading,
    Ready,
}

struct LoadedDocument<D> {
    handle: Rc<D>,
    pages: Vec<PageGeometry>,
    page_count: u32,
}

enum SessionState<D> {
    Idle,
    Loading,
    Ready(LoadedDocument<D>),
}

pub struct DocumentSession<D: DocumentHandle> {
    state: SessionState<D>,
    token: SessionToken,
    source: Option<DocumentSource>,
    context: RenderContext,
}

impl<D: DocumentHandle> Default for DocumentSession<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DocumentHandle> DocumentSession<D> {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            token: SessionToken::default(),
            source: None,
            context: RenderContext::default(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Ready(_) => SessionStatus::Ready,
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn source(&self) -> Option<&DocumentSource> {
        self.source.as_ref()
    }

    pub fn document(&self) -> Option<&Rc<D>> {
        match &self.state {
            SessionState::Ready(loaded) => Some(&loaded.handle),
            _ => None,
        }
    }

    pub fn pages(&self) -> &[PageGeometry] {
        match &self.state {
            SessionState::Ready(loaded) => &loaded.pages,
            _ => &[],
        }
    }

    pub fn page_count(&self) -> Option<u32> {
        match &self.state {
            SessionState::Ready(loaded) => Some(loaded.page_count),
            _ => None,
        }
    }

    pub fn first_page(&self) -> Option<PageGeometry> {
        self.pages().first().copied()
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// Move to `Loading` under a fresh session token
    ///
    /// The render context is emptied right away, so commands issued while the
    /// engine opens the document see `NotReady`.
    pub fn begin_load(&mut self, source: DocumentSource) -> SessionToken {
        self.token = self.token.next();
        self.state = SessionState::Loading;
        self.context = RenderContext::default();
        tracing::debug!("Session {} loading {}", self.token, source.uri);
        self.source = Some(source);
        self.token
    }

    /// Publish the outcome of the open started under `token`
    ///
    /// A result for any token but the newest is dropped with
    /// `ViewerError::Superseded`. On failure the session is back in `Idle`
    /// with an empty render context.
    pub fn complete_load(
        &mut self,
        token: SessionToken,
        opened: Result<D, EngineError>,
    ) -> Result<SessionToken, ViewerError> {
        if token != self.token {
            tracing::debug!("Dropping load for session {} (current {})", token, self.token);
            return Err(ViewerError::Superseded(token));
        }

        match opened {
            Ok(handle) => {
                let page_count = handle.page_count();
                let pages = handle.pages();
                tracing::info!("Session {} ready with {} pages", token, page_count);
                self.state = SessionState::Ready(LoadedDocument {
                    handle: Rc::new(handle),
                    pages,
                    page_count,
                });
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("Session {} failed to load: {}", token, e);
                self.state = SessionState::Idle;
                Err(ViewerError::Load(e.to_string()))
            }
        }
    }

    /// Open `source` under a fresh session token
    pub async fn start<E>(
        &mut self,
        engine: &E,
        source: DocumentSource,
    ) -> Result<SessionToken, ViewerError>
    where
        E: RenderEngine<Document = D>,
    {
        let token = self.begin_load(source.clone());
        let opened = engine.open(&source).await;
        self.complete_load(token, opened)
    }

    /// Tear down the current viewer handle and begin loading `source`
    ///
    /// The bridge is detached before the new token is issued, so no handler
    /// from the previous handle can fire into the new session.
    pub fn begin_reload<E>(
        &mut self,
        bridge: &mut RenderingBridge<E>,
        source: DocumentSource,
    ) -> SessionToken
    where
        E: RenderEngine<Document = D>,
    {
        bridge.detach();
        self.begin_load(source)
    }

    /// Reset pagination, scale, page container and rendered pages; the
    /// document handle stays open
    pub fn clear_render_context(&mut self) {
        self.context.clear();
    }

    pub fn close(&mut self) {
        self.state = SessionState::Idle;
        self.context = RenderContext::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, FakeDocumentSpec, FakeEngine};

    #[tokio::test]
    async fn test_start_success() {
        let engine = FakeEngine::new().with_document("doc.pdf", FakeDocumentSpec::pages(4));
        let mut session: DocumentSession<FakeDocument> = DocumentSession::new();
        assert_eq!(session.status(), SessionStatus::Idle);

        let token = session
            .start(&engine, DocumentSource::new("doc.pdf"))
            .await
            .unwrap();

        assert_eq!(token, session.token());
        assert_eq!(session.status(), SessionStatus::Ready);
        assert_eq!(session.page_count(), Some(4));
        assert_eq!(session.pages().len(), 4);
        assert!(session.document().is_some());
    }

    #[tokio::test]
    async fn test_start_failure_returns_to_idle() {
        let engine = FakeEngine::new().with_failure("broken.pdf", "malformed xref");
        let mut session: DocumentSession<FakeDocument> = DocumentSession::new();

        let err = session
            .start(&engine, DocumentSource::new("broken.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ViewerError::Load(ref msg) if msg.contains("malformed xref")));
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.document().is_none());
        assert!(session.pages().is_empty());
        assert!(!session.context().is_ready());
    }

    #[tokio::test]
    async fn test_every_start_advances_token() {
        let engine = FakeEngine::new().with_document("doc.pdf", FakeDocumentSpec::pages(1));
        let mut session: DocumentSession<FakeDocument> = DocumentSession::new();

        let first = session.start(&engine, DocumentSource::new("doc.pdf")).await.unwrap();
        let _ = session.start(&engine, DocumentSource::new("missing.pdf")).await;
        let third = session.start(&engine, DocumentSource::new("doc.pdf")).await.unwrap();

        assert_eq!(third.value(), first.value() + 2);
    }

    #[tokio::test]
    async fn test_older_load_is_superseded() {
        let engine = FakeEngine::new()
            .with_document("a.pdf", FakeDocumentSpec::pages(10))
            .with_document("b.pdf", FakeDocumentSpec::pages(3));
        let mut session: DocumentSession<FakeDocument> = DocumentSession::new();

        let first = session.begin_load(DocumentSource::new("a.pdf"));
        let second = session.begin_load(DocumentSource::new("b.pdf"));
        let opened_b = engine.open(&DocumentSource::new("b.pdf")).await;
        let opened_a = engine.open(&DocumentSource::new("a.pdf")).await;

        assert_eq!(session.complete_load(second, opened_b).unwrap(), second);
        assert_eq!(
            session.complete_load(first, opened_a).unwrap_err(),
            ViewerError::Superseded(first)
        );
        assert_eq!(session.page_count(), Some(3));
        assert_eq!(session.source().map(|s| s.uri.as_str()), Some("b.pdf"));
    }

    #[test]
    fn test_loading_clears_context() {
        let mut session: DocumentSession<FakeDocument> = DocumentSession::new();
        session.context_mut().pagination.on_pages_init(4, 2);

        session.begin_load(DocumentSource::new("doc.pdf"));

        assert_eq!(session.status(), SessionStatus::Loading);
        assert!(!session.context().is_ready());
    }

    #[tokio::test]
    async fn test_clear_render_context_keeps_document() {
        let engine = FakeEngine::new().with_document("doc.pdf", FakeDocumentSpec::pages(10));
        let mut session: DocumentSession<FakeDocument> = DocumentSession::new();
        session.start(&engine, DocumentSource::new("doc.pdf")).await.unwrap();
        session.context_mut().pagination.on_pages_init(10, 1);

        session.clear_render_context();

        assert!(!session.context().is_ready());
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.document().is_some());
        assert_eq!(engine.open_count(), 1);
    }
}
