//! Document viewing and rendering state machine
//!
//! This crate drives an external rendering engine without depending on one.
//! The engine, transport and download action are traits; everything else
//! (pagination, zoom policy, the load lifecycle, the event bus and stale
//! result handling) lives here and runs on a single cooperative event loop.
//!
//! - `ViewerController`: orchestrates source changes, engine events and UI commands
//! - `DocumentSession` / `RenderingBridge`: load lifecycle and the live viewer handle
//! - `ScalePolicy` / `Pagination`: pure zoom and page-tracking rules

pub mod bridge;
pub mod config;
pub mod context;
pub mod controller;
pub mod download;
pub mod engine;
pub mod error;
pub mod events;
pub mod pagination;
pub mod scale;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use bridge::{RenderCompletion, RenderTicket, RenderingBridge};
pub use config::ViewerConfig;
pub use context::{PageContainer, PageGeometry, RenderContext, RenderedPages, RenderedPagesUpdate};
pub use controller::{
    CommandOutcome, LoadCompletion, LoadTicket, RenderOutcome, ViewerCommand, ViewerController,
    ViewerState,
};
pub use download::{DocumentExporter, DownloadRequest, DownloadResolver, DownloadTicket};
pub use engine::{
    AuthHeaders, DocumentHandle, DocumentSource, EngineViewer, FixedViewport, RenderEngine,
    SurfaceOf, ViewportInspector,
};
pub use error::{ConfigError, EngineError, TransportError, ViewerError};
pub use events::{EngineEvent, EventBus, EventSubscription, SessionToken};
pub use pagination::{PageField, Pagination, PAGE_SENTINEL};
pub use scale::{FitMode, Scale, ScalePolicy, ScaleValue};
pub use session::{DocumentSession, SessionStatus};
pub use transport::{FormPart, Headers, RequestBody, TransferProgress, Transport};
