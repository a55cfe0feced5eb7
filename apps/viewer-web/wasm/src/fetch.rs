//! `fetch`-backed transport for the store actions

use async_trait::async_trait;
use js_sys::Uint8Array;
use serde_json::Value;
use viewer_core::{FormPart, Headers, RequestBody, TransferProgress, Transport, TransportError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, FormData, Request, RequestInit, RequestMode, Response};

use crate::pdfjs::js_error;

fn network(e: JsValue) -> TransportError {
    TransportError::Network(js_error(e))
}

/// Append `params` to `url` as an encoded query string
pub fn with_query(url: &str, params: &[(String, String)], encode: impl Fn(&str) -> String) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query)
}

/// Decode a response body: JSON when it parses, otherwise the raw text
pub fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn form_data(parts: &[FormPart]) -> Result<FormData, TransportError> {
    let form = FormData::new().map_err(network)?;
    for part in parts {
        match &part.filename {
            Some(filename) => {
                let bytes = Uint8Array::from(part.content.as_slice());
                let blob = Blob::new_with_u8_array_sequence(&js_sys::Array::of1(&bytes))
                    .map_err(network)?;
                form.append_with_blob_and_filename(&part.name, &blob, filename)
                    .map_err(network)?;
            }
            None => {
                let value = String::from_utf8_lossy(&part.content);
                form.append_with_str(&part.name, &value).map_err(network)?;
            }
        }
    }
    Ok(form)
}

/// Transport over `window.fetch`, resolving relative URLs against `base_url`
#[derive(Debug, Clone, Default)]
pub struct FetchTransport {
    base_url: String,
}

impl FetchTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, url: &str) -> String {
        if self.base_url.is_empty() || url.starts_with("http") || url.starts_with('/') {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url.trim_end_matches('/'), url)
        }
    }

    async fn send(
        &self,
        method: &str,
        url: String,
        body: Option<JsValue>,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        let window = web_sys::window().ok_or_else(|| TransportError::Network("No window".into()))?;

        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = &body {
            opts.set_body(body);
        }

        let request = Request::new_with_str_and_init(&url, &opts).map_err(network)?;
        for (name, value) in headers {
            request.headers().set(name, value).map_err(network)?;
        }

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network)?;
        let response: Response = response.dyn_into().map_err(network)?;
        if !response.ok() {
            return Err(TransportError::Status {
                url,
                status: response.status(),
            });
        }

        let text = JsFuture::from(response.text().map_err(network)?)
            .await
            .map_err(|e| TransportError::Decode(js_error(e)))?;
        Ok(decode_body(&text.as_string().unwrap_or_default()))
    }
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<Value, TransportError> {
        let url = with_query(&self.resolve(url), params, |s| {
            String::from(js_sys::encode_uri_component(s))
        });
        self.send("GET", url, None, &Headers::new()).await
    }

    async fn post(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
    ) -> Result<Value, TransportError> {
        let mut headers = headers.clone();
        let body = match body {
            RequestBody::Json(value) => {
                headers
                    .entry("Content-Type".to_string())
                    .or_insert_with(|| "application/json".to_string());
                let text = serde_json::to_string(&value)
                    .map_err(|e| TransportError::Decode(e.to_string()))?;
                JsValue::from_str(&text)
            }
            RequestBody::Text(text) => JsValue::from_str(&text),
            RequestBody::Multipart(parts) => {
                // The browser sets the multipart boundary itself
                headers.remove("Content-Type");
                form_data(&parts)?.into()
            }
        };
        self.send("POST", self.resolve(url), Some(body), &headers).await
    }

    /// `fetch` has no upload progress; completion is reported as 100%
    async fn post_with_progress(
        &self,
        url: &str,
        body: RequestBody,
        headers: &Headers,
        on_progress: &dyn Fn(TransferProgress),
    ) -> Result<Value, TransportError> {
        let data = self.post(url, body, headers).await?;
        on_progress(TransferProgress { loaded: 1, total: 1 });
        Ok(data)
    }
}
