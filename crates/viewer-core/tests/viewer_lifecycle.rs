//! End-to-end viewer behavior against the scripted engine

use pretty_assertions::assert_eq;
use viewer_core::testing::{FakeDocumentSpec, FakeEngine, FakeSurface, RecordingExporter};
use viewer_core::{
    CommandOutcome, DocumentSource, EngineEvent, FitMode, FixedViewport, PageContainer,
    PageField, RenderOutcome, SessionStatus, ViewerCommand, ViewerConfig, ViewerController,
    ViewerError,
};

fn viewer(engine: &FakeEngine, small_screen: bool) -> ViewerController<FakeEngine> {
    viewer_with_exporter(engine, small_screen, RecordingExporter::new())
}

fn viewer_with_exporter(
    engine: &FakeEngine,
    small_screen: bool,
    exporter: RecordingExporter,
) -> ViewerController<FakeEngine> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
    ViewerController::new(
        engine.clone(),
        ViewerConfig::default(),
        Box::new(FixedViewport(small_screen)),
        Box::new(exporter),
    )
}

fn source() -> DocumentSource {
    DocumentSource::new("document/url").with_header("token", "123abcd456")
}

fn ten_pages() -> FakeEngine {
    FakeEngine::new()
        .with_document("document/url", FakeDocumentSpec::pages(10))
        .with_pages_init(1, 1.0)
}

// ============================================================
// Pagination
// ============================================================

#[tokio::test]
async fn go_to_page_is_range_checked() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    assert_eq!(
        viewer.go_to_page(11).unwrap_err(),
        ViewerError::Range { page: 11, total: 10 }
    );
    assert_eq!(viewer.context().pagination.current(), Some(1));

    viewer.go_to_page(10).unwrap();
    assert_eq!(viewer.context().pagination.current(), Some(10));
}

#[tokio::test]
async fn clear_render_context_keeps_document_open() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();
    viewer.zoom_in().unwrap();
    viewer.render_page(1, &FakeSurface::default()).await.unwrap();

    viewer.clear_render_context();

    let context = viewer.context();
    assert_eq!(context.pagination.current, PageField::Unset);
    assert_eq!(context.pagination.total, PageField::Unset);
    assert_eq!(context.scale.current, context.scale.default);
    assert_eq!(context.page_container, PageContainer { width: 0.0, height: 0.0 });
    assert!(context.rendered_pages.is_empty());
    assert!(viewer.go_to_page(1).unwrap_err().is_not_ready());

    engine.emit(EngineEvent::PagesInit {
        current_page_number: 1,
        current_scale: 1.0,
        pages_count: 10,
    });
    viewer.pump_events();

    viewer.go_to_page(4).unwrap();
    assert_eq!(viewer.context().pagination.current(), Some(4));
    assert_eq!(engine.open_count(), 1);
}

#[tokio::test]
async fn page_changes_outside_document_are_ignored() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    engine.emit(EngineEvent::PageChanging { page_number: 100 });
    engine.emit(EngineEvent::PageChanging { page_number: 3 });
    viewer.pump_events();

    assert_eq!(viewer.context().pagination.current(), Some(3));
}

// ============================================================
// Fit mode and zoom
// ============================================================

#[tokio::test]
async fn small_screen_opens_width_fitted() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, true);
    viewer.on_source_change(source()).await.unwrap();

    let context = viewer.context();
    assert_eq!(context.fit_mode, Some(FitMode::PageWidth));
    assert_eq!(context.scale.current, context.scale.default);
}

#[tokio::test]
async fn large_screen_opens_page_fitted() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    let context = viewer.context();
    assert_eq!(context.fit_mode, Some(FitMode::PageFit));
    assert_eq!(context.scale.current, context.scale.default);
}

#[tokio::test]
async fn zoom_commands_drive_engine_scale() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    assert_eq!(
        viewer.dispatch(ViewerCommand::ZoomIn).await.unwrap(),
        CommandOutcome::Scaled(1.1)
    );
    viewer.dispatch(ViewerCommand::ResetZoom).await.unwrap();
    viewer.dispatch(ViewerCommand::ZoomOut).await.unwrap();

    assert_eq!(viewer.context().scale.current, 1.0 / 1.1);
    assert_eq!(
        engine.last_viewer().unwrap().scale_values().last().copied(),
        Some(viewer_core::ScaleValue::Factor(1.0 / 1.1))
    );
}

#[tokio::test]
async fn reset_zoom_restores_opening_scale() {
    let engine = FakeEngine::new()
        .with_document("document/url", FakeDocumentSpec::pages(3))
        .with_pages_init(1, 1.0);
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    engine.emit(EngineEvent::ScaleChanging { scale: 3.0 });
    viewer.pump_events();
    assert_eq!(viewer.reset_zoom().unwrap(), 1.0);
}

#[tokio::test]
async fn zoom_out_floor_comes_from_config() {
    let engine = ten_pages();
    let config = ViewerConfig::from_toml_str("zoom_out_floor = 0.95").unwrap();
    let mut viewer = ViewerController::new(
        engine.clone(),
        config,
        Box::new(FixedViewport(false)),
        Box::new(RecordingExporter::new()),
    );
    viewer.on_source_change(source()).await.unwrap();

    assert_eq!(viewer.zoom_out().unwrap(), 1.0);
}

// ============================================================
// Download
// ============================================================

#[tokio::test]
async fn download_defaults_filename() {
    let engine = ten_pages();
    let exporter = RecordingExporter::new();
    let mut viewer = viewer_with_exporter(&engine, false, exporter.clone());
    viewer.on_source_change(source()).await.unwrap();

    let request = viewer.download().await.unwrap();

    assert_eq!(request.filename, "download.pdf");
    assert_eq!(request.src, "document/url");
    assert_eq!(request.http_header.get("token").map(String::as_str), Some("123abcd456"));
    assert_eq!(exporter.requests(), vec![request]);
}

#[tokio::test]
async fn download_uses_reported_filename() {
    let engine = FakeEngine::new()
        .with_document(
            "document/url",
            FakeDocumentSpec::pages(2).with_filename("report.pdf"),
        )
        .with_pages_init(1, 1.0);
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    match viewer.dispatch(ViewerCommand::Download).await.unwrap() {
        CommandOutcome::Downloaded(request) => assert_eq!(request.filename, "report.pdf"),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn download_failure_propagates() {
    let engine = ten_pages();
    let exporter = RecordingExporter::failing(viewer_core::TransportError::Network(
        "offline".to_string(),
    ));
    let mut viewer = viewer_with_exporter(&engine, false, exporter);
    viewer.on_source_change(source()).await.unwrap();

    let err = viewer.download().await.unwrap_err();
    assert!(matches!(err, ViewerError::Transport(_)));
}

// ============================================================
// Session lifecycle and stale guards
// ============================================================

#[tokio::test]
async fn load_failure_publishes_nothing() {
    let engine = FakeEngine::new().with_failure("document/url", "401 Unauthorized");
    let mut viewer = viewer(&engine, false);

    let err = viewer.on_source_change(source()).await.unwrap_err();

    assert!(matches!(err, ViewerError::Load(_)));
    assert_eq!(viewer.status(), SessionStatus::Idle);
    assert_eq!(viewer.context().pagination.total, PageField::Unset);
    assert_eq!(engine.viewer_count(), 0);
}

#[tokio::test]
async fn header_change_reloads_document() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();
    viewer
        .on_source_change(source().with_header("token", "rotated"))
        .await
        .unwrap();

    assert_eq!(engine.open_count(), 2);
    assert_eq!(engine.viewer_count(), 2);
    assert!(engine.viewer(0).unwrap().is_closed());
    assert_eq!(engine.opened()[1].auth_headers["token"], "rotated");
}

#[tokio::test]
async fn events_from_torn_down_viewer_never_land() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();
    let old = engine.last_viewer().unwrap();

    viewer.on_source_change(source()).await.unwrap();

    assert!(!old.emit(EngineEvent::PageChanging { page_number: 9 }));
    viewer.pump_events();
    assert_eq!(viewer.context().pagination.current(), Some(1));
}

#[tokio::test]
async fn render_result_after_reload_is_discarded() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();
    let surface = FakeSurface::default();

    let ticket = viewer.begin_render(2).unwrap();
    viewer.on_source_change(source()).await.unwrap();
    let completion = ticket.run(&surface).await;

    assert_eq!(viewer.finish_render(completion).unwrap(), RenderOutcome::Stale);
    assert!(viewer.context().rendered_pages.is_empty());
}

#[tokio::test]
async fn render_failure_is_reported() {
    let engine = FakeEngine::new()
        .with_document("document/url", FakeDocumentSpec::pages(3).failing_page(2))
        .with_pages_init(1, 1.0);
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();

    let err = viewer
        .render_page(2, &FakeSurface::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ViewerError::Engine(_)));
    assert!(!viewer.context().rendered_pages.contains(2));
}

#[tokio::test]
async fn render_out_of_range_has_no_side_effects() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();
    let surface = FakeSurface::default();

    let err = viewer.render_page(11, &surface).await.unwrap_err();

    assert_eq!(err, ViewerError::Range { page: 11, total: 10 });
    assert!(surface.painted().is_empty());
}

#[tokio::test]
async fn newest_source_wins_when_loads_overlap() {
    let engine = FakeEngine::new()
        .with_document("a.pdf", FakeDocumentSpec::pages(10))
        .with_document("b.pdf", FakeDocumentSpec::pages(3))
        .with_pages_init(1, 1.0);
    let mut viewer = viewer(&engine, false);

    let first = viewer.begin_source_change(DocumentSource::new("a.pdf"));
    let second = viewer.begin_source_change(DocumentSource::new("b.pdf"));
    let first_token = first.token();

    // The older open finishes last
    let second_done = second.run().await;
    let first_done = first.run().await;
    let token = viewer.finish_source_change(second_done).unwrap();

    assert_eq!(
        viewer.finish_source_change(first_done).unwrap_err(),
        ViewerError::Superseded(first_token)
    );
    assert_eq!(viewer.token(), token);
    assert_eq!(viewer.state().source.map(|source| source.uri), Some("b.pdf".to_string()));
    assert_eq!(viewer.context().pagination.total(), Some(3));
    assert_eq!(engine.viewer_count(), 1);
}

#[tokio::test]
async fn older_load_finishing_first_is_still_dropped() {
    let engine = FakeEngine::new()
        .with_document("a.pdf", FakeDocumentSpec::pages(10))
        .with_document("b.pdf", FakeDocumentSpec::pages(3))
        .with_pages_init(1, 1.0);
    let mut viewer = viewer(&engine, false);

    let first = viewer.begin_source_change(DocumentSource::new("a.pdf"));
    let second = viewer.begin_source_change(DocumentSource::new("b.pdf"));

    let first_done = first.run().await;
    assert!(matches!(
        viewer.finish_source_change(first_done),
        Err(ViewerError::Superseded(_))
    ));
    assert_eq!(viewer.status(), SessionStatus::Loading);

    let second_done = second.run().await;
    viewer.finish_source_change(second_done).unwrap();
    assert_eq!(viewer.context().pagination.total(), Some(3));
}

#[tokio::test]
async fn commands_during_load_are_not_ready() {
    let engine = ten_pages();
    let mut viewer = viewer(&engine, false);
    viewer.on_source_change(source()).await.unwrap();
    let ticket = viewer.begin_render(2).unwrap();

    let pending = viewer.begin_source_change(source());

    assert!(viewer.zoom_in().unwrap_err().is_not_ready());
    assert!(viewer.go_to_page(2).unwrap_err().is_not_ready());
    assert!(viewer.begin_download().is_err());
    let completion = ticket.run(&FakeSurface::default()).await;
    assert_eq!(viewer.finish_render(completion).unwrap(), RenderOutcome::Stale);

    let done = pending.run().await;
    viewer.finish_source_change(done).unwrap();
    assert_eq!(viewer.go_to_page(2).unwrap(), 2);
}
