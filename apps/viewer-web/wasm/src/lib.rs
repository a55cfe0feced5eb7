//! Document viewer for the browser
//!
//! Wires `viewer-core` and `viewer-store` to pdf.js, `fetch` and the DOM.
//! JavaScript talks to `DocumentViewer` and `DocumentStore`; all state stays
//! in Rust.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use viewer_core::{
    AuthHeaders, DocumentSource, RenderOutcome, ViewerConfig, ViewerController, ViewerError,
};
use viewer_store::{DigitalSignatureFinish, DigitalSignatureStart, Store, StoreConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{CanvasRenderingContext2d, HtmlElement};

pub mod browser;
pub mod fetch;
pub mod pdfjs;

pub use browser::{BrowserExporter, WindowViewport};
pub use fetch::FetchTransport;
pub use pdfjs::{PdfJsDocument, PdfJsEngine, PdfJsViewer};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn from_js_or_default<T: serde::de::DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

type Controller = ViewerController<PdfJsEngine>;

const BUSY: &str = "Viewer is busy with another operation";

/// Run a synchronous command, then apply whatever events it raised
fn command<T>(
    controller: &RefCell<Controller>,
    run: impl FnOnce(&mut Controller) -> Result<T, ViewerError>,
) -> Result<T, JsValue> {
    let mut controller = controller
        .try_borrow_mut()
        .map_err(|_| JsValue::from_str(BUSY))?;
    let result = run(&mut controller);
    controller.pump_events();
    result.map_err(to_js_error)
}

/// Document viewer bound to one container element
#[wasm_bindgen]
pub struct DocumentViewer {
    controller: Rc<RefCell<Controller>>,
}

#[wasm_bindgen]
impl DocumentViewer {
    /// Create a viewer rendering into `container`
    ///
    /// `config` is an optional object with `ViewerConfig` fields
    /// (`zoom_factor`, `zoom_out_floor`, `default_filename`,
    /// `small_screen_breakpoint_px`).
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, config: JsValue) -> Result<DocumentViewer, JsValue> {
        let config: ViewerConfig = from_js_or_default(config)?;
        config.validate().map_err(to_js_error)?;

        let engine = PdfJsEngine::new(container);
        let viewport = WindowViewport::new(config.small_screen_breakpoint_px);
        let controller = Rc::new(RefCell::new(ViewerController::new(
            engine.clone(),
            config,
            Box::new(viewport),
            Box::new(BrowserExporter),
        )));

        // Engine events arriving outside a command are applied right away;
        // events raised during a command are pumped when the command returns
        let weak: Weak<RefCell<Controller>> = Rc::downgrade(&controller);
        engine.set_event_hook(Rc::new(move || {
            if let Some(controller) = weak.upgrade() {
                if let Ok(mut controller) = controller.try_borrow_mut() {
                    controller.pump_events();
                }
            }
        }));

        Ok(Self { controller })
    }

    /// Load `src` with optional auth headers; any change reloads the document
    ///
    /// Resolves to the viewer state once the document is open.
    #[wasm_bindgen(js_name = setSource)]
    pub fn set_source(&self, src: String, headers: JsValue) -> Result<js_sys::Promise, JsValue> {
        let headers: AuthHeaders = from_js_or_default(headers)?;
        let source = DocumentSource::new(src).with_headers(headers);
        let ticket = self
            .controller
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str(BUSY))?
            .begin_source_change(source);
        let controller = Rc::clone(&self.controller);

        // No borrow is held while pdf.js opens the document; a newer
        // setSource supersedes this one
        Ok(future_to_promise(async move {
            let completion = ticket.run().await;
            let mut controller = controller
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str(BUSY))?;
            match controller.finish_source_change(completion) {
                Ok(token) => {
                    log(&format!("Document session {} ready", token));
                    to_js(&controller.state())
                }
                Err(e) => {
                    log(&format!("Document load failed: {}", e));
                    Err(to_js_error(e))
                }
            }
        }))
    }

    fn command<T>(
        &self,
        run: impl FnOnce(&mut Controller) -> Result<T, ViewerError>,
    ) -> Result<T, JsValue> {
        command(&self.controller, run)
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) -> Result<f64, JsValue> {
        self.command(Controller::zoom_in)
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) -> Result<f64, JsValue> {
        self.command(Controller::zoom_out)
    }

    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&self) -> Result<f64, JsValue> {
        self.command(Controller::reset_zoom)
    }

    #[wasm_bindgen(js_name = goToPage)]
    pub fn go_to_page(&self, page_num: u32) -> Result<u32, JsValue> {
        self.command(|controller| controller.go_to_page(page_num))
    }

    /// Paint one page; resolves to `false` when a newer document replaced
    /// the one this render started on
    #[wasm_bindgen(js_name = renderPage)]
    pub fn render_page(
        &self,
        page_num: u32,
        context: CanvasRenderingContext2d,
    ) -> Result<js_sys::Promise, JsValue> {
        let ticket = self
            .controller
            .try_borrow()
            .map_err(|_| JsValue::from_str(BUSY))?
            .begin_render(page_num)
            .map_err(to_js_error)?;
        let controller = Rc::clone(&self.controller);

        Ok(future_to_promise(async move {
            let completion = ticket.run(&context).await;
            let outcome = command(&controller, |controller| controller.finish_render(completion))?;
            Ok(JsValue::from_bool(outcome == RenderOutcome::Painted))
        }))
    }

    /// Export the current document; resolves to the `{src, httpHeader, filename}` used
    pub fn download(&self) -> Result<js_sys::Promise, JsValue> {
        let ticket = self
            .controller
            .try_borrow()
            .map_err(|_| JsValue::from_str(BUSY))?
            .begin_download()
            .map_err(to_js_error)?;
        Ok(future_to_promise(async move {
            let request = ticket.run().await.map_err(to_js_error)?;
            to_js(&request)
        }))
    }

    #[wasm_bindgen(js_name = clearRenderContext)]
    pub fn clear_render_context(&self) -> Result<(), JsValue> {
        self.command(|controller| {
            controller.clear_render_context();
            Ok(())
        })
    }

    #[wasm_bindgen(js_name = pumpEvents)]
    pub fn pump_events(&self) -> Result<u32, JsValue> {
        self.command(|controller| Ok(controller.pump_events() as u32))
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        let controller = self
            .controller
            .try_borrow()
            .map_err(|_| JsValue::from_str(BUSY))?;
        to_js(&controller.state())
    }

    pub fn close(&self) -> Result<(), JsValue> {
        self.command(|controller| {
            controller.close();
            Ok(())
        })
    }
}

/// Store facade: document fetching, uploads, product data and signatures
#[wasm_bindgen]
pub struct DocumentStore {
    store: Rc<Store<PdfJsEngine, FetchTransport>>,
}

#[wasm_bindgen]
impl DocumentStore {
    /// `config` is an optional object with `StoreConfig` fields
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: String, config: JsValue) -> Result<DocumentStore, JsValue> {
        let config: StoreConfig = from_js_or_default(config)?;
        config.validate().map_err(to_js_error)?;
        let store = Store::new(PdfJsEngine::headless(), FetchTransport::new(base_url), config);
        Ok(Self {
            store: Rc::new(store),
        })
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.snapshot())
    }

    /// Resolves to the page count
    #[wasm_bindgen(js_name = fetchDocument)]
    pub fn fetch_document(&self, src: String, headers: JsValue) -> Result<js_sys::Promise, JsValue> {
        let headers: AuthHeaders = from_js_or_default(headers)?;
        let store = Rc::clone(&self.store);
        Ok(future_to_promise(async move {
            let total = store.fetch_document(&src, headers).await.map_err(to_js_error)?;
            Ok(JsValue::from(total))
        }))
    }

    #[wasm_bindgen(js_name = updateCurrentPageNum)]
    pub fn update_current_page_num(&self, page_num: u32) -> Result<(), JsValue> {
        self.store.update_current_page_num(page_num).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = updatePageContainer)]
    pub fn update_page_container(&self) -> Result<JsValue, JsValue> {
        to_js(&self.store.update_page_container())
    }

    #[wasm_bindgen(js_name = calculateScale)]
    pub fn calculate_scale(&self, container_width: Option<f64>) -> Result<f64, JsValue> {
        self.store.calculate_scale(container_width).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = increaseScale)]
    pub fn increase_scale(&self) -> f64 {
        self.store.increase_scale()
    }

    #[wasm_bindgen(js_name = decreaseScale)]
    pub fn decrease_scale(&self) -> f64 {
        self.store.decrease_scale()
    }

    #[wasm_bindgen(js_name = renderPage)]
    pub fn render_page(&self, page_num: u32, context: CanvasRenderingContext2d) -> js_sys::Promise {
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            store.render_page(page_num, &context).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = updateRenderedPages)]
    pub fn update_rendered_pages(&self, page_num: u32) {
        self.store.update_rendered_pages(page_num);
    }

    #[wasm_bindgen(js_name = clearRenderContext)]
    pub fn clear_render_context(&self) {
        self.store.clear_render_context();
    }

    #[wasm_bindgen(js_name = clearRenderedPages)]
    pub fn clear_rendered_pages(&self) {
        self.store.clear_rendered_pages();
    }

    /// Upload one file; failures are recorded in `uploadProgress`, never thrown
    #[wasm_bindgen(js_name = uploadFile)]
    pub fn upload_file(&self, filename: String, bytes: Vec<u8>) -> js_sys::Promise {
        let form = vec![viewer_core::FormPart::file("file", filename.clone(), bytes)];
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            match store.upload_file(&filename, form).await.map_err(to_js_error)? {
                viewer_store::UploadOutcome::Uploaded(data) => to_js(&data),
                viewer_store::UploadOutcome::Failed { hash, error } => {
                    log(&format!("Upload {} failed: {}", hash, error));
                    Ok(JsValue::UNDEFINED)
                }
            }
        })
    }

    #[wasm_bindgen(js_name = getProduct)]
    pub fn get_product(&self) -> js_sys::Promise {
        let store = Rc::clone(&self.store);
        future_to_promise(async move {
            let attrs = store.get_product().await.map_err(to_js_error)?;
            to_js(&attrs)
        })
    }

    #[wasm_bindgen(js_name = setAccessToken)]
    pub fn set_access_token(&self, token: JsValue) -> Result<(), JsValue> {
        let token = if token.is_undefined() || token.is_null() {
            None
        } else {
            Some(serde_wasm_bindgen::from_value(token).map_err(to_js_error)?)
        };
        self.store.set_access_token(token);
        Ok(())
    }

    #[wasm_bindgen(js_name = startDigitalSignature)]
    pub fn start_digital_signature(&self, request: JsValue) -> Result<js_sys::Promise, JsValue> {
        let request: DigitalSignatureStart =
            serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
        let store = Rc::clone(&self.store);
        Ok(future_to_promise(async move {
            let data = store
                .start_digital_signature(&request)
                .await
                .map_err(to_js_error)?;
            to_js(&data)
        }))
    }

    #[wasm_bindgen(js_name = finishDigitalSignature)]
    pub fn finish_digital_signature(&self, request: JsValue) -> Result<js_sys::Promise, JsValue> {
        let request: DigitalSignatureFinish =
            serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
        let store = Rc::clone(&self.store);
        Ok(future_to_promise(async move {
            let data = store
                .finish_digital_signature(&request)
                .await
                .map_err(to_js_error)?;
            to_js(&data)
        }))
    }
}
