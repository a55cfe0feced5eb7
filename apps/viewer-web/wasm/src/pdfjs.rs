//! pdf.js integration: the browser implementation of the rendering engine
//!
//! `viewer-bridge.js` owns every pdf.js object. Rust holds them as opaque
//! `JsValue`s and receives viewer events through one callback per viewer,
//! which forwards them onto that viewer's event bus.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use viewer_core::{
    DocumentHandle, DocumentSource, EngineError, EngineEvent, EngineViewer, EventBus,
    PageGeometry, RenderEngine, ScaleValue,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlElement};

// External JavaScript functions from viewer-bridge.js
#[wasm_bindgen(module = "/www/js/viewer-bridge.js")]
extern "C" {
    #[wasm_bindgen(js_name = openDocument, catch)]
    async fn open_document_internal(uri: &str, headers: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = renderPage, catch)]
    async fn render_page_internal(
        proxy: &JsValue,
        page_num: u32,
        scale: f64,
        context: &CanvasRenderingContext2d,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = createViewer, catch)]
    fn create_viewer_internal(
        proxy: &JsValue,
        container: &HtmlElement,
        on_event: &js_sys::Function,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = setScaleValue)]
    fn set_scale_value_internal(viewer: &JsValue, value: &JsValue);

    #[wasm_bindgen(js_name = getCurrentScale)]
    fn get_current_scale_internal(viewer: &JsValue) -> f64;

    #[wasm_bindgen(js_name = setCurrentPage)]
    fn set_current_page_internal(viewer: &JsValue, page_num: u32);

    #[wasm_bindgen(js_name = closeViewer)]
    fn close_viewer_internal(viewer: &JsValue);
}

/// Called after every event a viewer forwards onto its bus
pub type EventHook = Rc<dyn Fn()>;

pub(crate) fn js_error(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Page metadata gathered by `openDocument`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub page_count: u32,
    pub pages: Vec<PageGeometry>,
    /// `Content-Disposition` filename reported while fetching, if any
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagesInitSource {
    current_page_number: u32,
    current_scale: f64,
    pages_count: u32,
}

#[derive(Debug, Deserialize)]
struct PagesInitPayload {
    source: PagesInitSource,
}

#[derive(Debug, Deserialize)]
struct ScalePayload {
    scale: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagePayload {
    page_number: u32,
}

/// Translate a pdf.js event-bus callback into an `EngineEvent`
pub fn parse_event(name: &str, payload: Value) -> Option<EngineEvent> {
    match name {
        "pagesinit" => {
            let PagesInitPayload { source } = serde_json::from_value(payload).ok()?;
            Some(EngineEvent::PagesInit {
                current_page_number: source.current_page_number,
                current_scale: source.current_scale,
                pages_count: source.pages_count,
            })
        }
        "scalechanging" => {
            let ScalePayload { scale } = serde_json::from_value(payload).ok()?;
            Some(EngineEvent::ScaleChanging { scale })
        }
        "pagechanging" => {
            let PagePayload { page_number } = serde_json::from_value(payload).ok()?;
            Some(EngineEvent::PageChanging { page_number })
        }
        _ => None,
    }
}

pub struct PdfJsDocument {
    proxy: JsValue,
    info: DocumentInfo,
}

#[async_trait(?Send)]
impl DocumentHandle for PdfJsDocument {
    type Surface = CanvasRenderingContext2d;

    fn page_count(&self) -> u32 {
        self.info.page_count
    }

    fn page_geometry(&self, page: u32) -> Option<PageGeometry> {
        let index = page.checked_sub(1)? as usize;
        self.info.pages.get(index).copied()
    }

    fn transport_filename(&self) -> Option<String> {
        self.info.filename.clone()
    }

    async fn render_page(
        &self,
        page: u32,
        scale: f64,
        surface: &CanvasRenderingContext2d,
    ) -> Result<(), EngineError> {
        render_page_internal(&self.proxy, page, scale, surface)
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Render {
                page,
                reason: js_error(e),
            })
    }
}

pub struct PdfJsViewer {
    viewer: JsValue,
    // Kept alive until the viewer is dropped; JS drops its reference in `closeViewer`
    _on_event: Closure<dyn FnMut(String, JsValue)>,
}

impl EngineViewer for PdfJsViewer {
    fn set_scale_value(&self, value: ScaleValue) {
        let value = match value {
            ScaleValue::Fit(mode) => JsValue::from_str(mode.as_str()),
            ScaleValue::Factor(scale) => JsValue::from_f64(scale),
        };
        set_scale_value_internal(&self.viewer, &value);
    }

    fn current_scale(&self) -> f64 {
        get_current_scale_internal(&self.viewer)
    }

    fn set_current_page(&self, page: u32) {
        set_current_page_internal(&self.viewer, page);
    }

    fn close(&self) {
        close_viewer_internal(&self.viewer);
    }
}

/// Rendering engine backed by pdf.js
#[derive(Clone)]
pub struct PdfJsEngine {
    container: Option<HtmlElement>,
    after_event: Rc<RefCell<Option<EventHook>>>,
}

impl PdfJsEngine {
    /// Engine whose viewers render into `container`
    pub fn new(container: HtmlElement) -> Self {
        Self {
            container: Some(container),
            after_event: Rc::default(),
        }
    }

    /// Engine that only opens and renders documents; `create_viewer` fails
    pub fn headless() -> Self {
        Self {
            container: None,
            after_event: Rc::default(),
        }
    }

    pub fn set_event_hook(&self, hook: EventHook) {
        *self.after_event.borrow_mut() = Some(hook);
    }
}

#[async_trait(?Send)]
impl RenderEngine for PdfJsEngine {
    type Document = PdfJsDocument;
    type Viewer = PdfJsViewer;

    async fn open(&self, source: &DocumentSource) -> Result<PdfJsDocument, EngineError> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let headers = source
            .auth_headers
            .serialize(&serializer)
            .map_err(|e| EngineError::Open(e.to_string()))?;

        let opened = open_document_internal(&source.uri, headers)
            .await
            .map_err(|e| EngineError::Open(js_error(e)))?;

        let proxy = js_sys::Reflect::get(&opened, &JsValue::from_str("proxy"))
            .map_err(|e| EngineError::Open(js_error(e)))?;
        let info: DocumentInfo = serde_wasm_bindgen::from_value(opened)
            .map_err(|e| EngineError::Open(e.to_string()))?;

        Ok(PdfJsDocument { proxy, info })
    }

    fn create_viewer(
        &self,
        document: &PdfJsDocument,
        bus: EventBus,
    ) -> Result<PdfJsViewer, EngineError> {
        let container = self
            .container
            .as_ref()
            .ok_or_else(|| EngineError::Viewer("engine has no container".to_string()))?;

        let hook = Rc::clone(&self.after_event);
        let on_event = Closure::<dyn FnMut(String, JsValue)>::new(
            move |name: String, payload: JsValue| {
                let payload: Value = serde_wasm_bindgen::from_value(payload).unwrap_or(Value::Null);
                let Some(event) = parse_event(&name, payload) else {
                    return;
                };
                if bus.dispatch(event) {
                    let hook = hook.borrow().clone();
                    if let Some(hook) = hook {
                        hook();
                    }
                }
            },
        );

        let viewer =
            create_viewer_internal(&document.proxy, container, on_event.as_ref().unchecked_ref())
                .map_err(|e| EngineError::Viewer(js_error(e)))?;

        Ok(PdfJsViewer {
            viewer,
            _on_event: on_event,
        })
    }
}
