//! Store state
//!
//! Plain data, serializable for the UI. Nothing here mutates itself; see
//! `Mutation::apply`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use viewer_core::{Headers, PageContainer, PageField, PageGeometry, RenderedPages, Scale};

use crate::config::StoreConfig;

/// Progress entry for one in-flight (or failed) upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub filename: String,
    pub progress: u8,
    pub error: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileState {
    pub api: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowbeeState {
    /// Headers granting public (token) access to the signature API
    pub access_token: Option<Headers>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub pages: Vec<PageGeometry>,
    pub total: PageField,
    pub current: PageField,
    pub scale: Scale,
    pub page_container: PageContainer,
    pub rendered_pages: RenderedPages,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::with_scale(Scale::default())
    }
}

impl DocumentState {
    pub fn with_scale(scale: Scale) -> Self {
        Self {
            pages: Vec::new(),
            total: PageField::Unset,
            current: PageField::Unset,
            scale,
            page_container: PageContainer::default(),
            rendered_pages: RenderedPages::default(),
        }
    }

    pub fn first_page(&self) -> Option<PageGeometry> {
        self.pages.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub product_name: Option<String>,
    pub product_extended_attrs: Value,
    pub file: FileState,
    /// Keyed by upload hash (filename + epoch millis)
    pub upload_progress: BTreeMap<String, UploadProgress>,
    pub uploaded_files: Vec<Value>,
    pub flowbee: FlowbeeState,
    pub document: DocumentState,
}

impl StoreState {
    pub fn from_config(config: &StoreConfig) -> Self {
        let scale = Scale::default().with_bounds(Some(config.min_scale), Some(config.max_scale));
        Self {
            product_name: config.product_name.clone(),
            file: FileState {
                api: config.file_api.clone(),
            },
            document: DocumentState::with_scale(scale),
            ..Self::default()
        }
    }
}
