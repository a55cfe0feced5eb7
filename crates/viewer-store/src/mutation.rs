//! The closed set of state mutations
//!
//! `Store::commit` is the only caller of `Mutation::apply`.

use serde_json::Value;
use viewer_core::{Headers, PageContainer, PageField, PageGeometry, RenderedPagesUpdate};

use crate::state::{StoreState, UploadProgress};

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    SetProductExtendedAttrs(Value),
    SetUploadFileProgress {
        hash: String,
        filename: String,
        progress: u8,
    },
    RemoveUploadFileProgress(String),
    AddUploadedFile(Value),
    SetUploadFileProgressError(String),
    SetAccessToken(Option<Headers>),
    SetTotalPageNum(PageField),
    SetPages(Vec<PageGeometry>),
    SetCurrentPageNum(PageField),
    SetPageContainer(PageContainer),
    SetCurrentScale(f64),
    SetRenderedPages(RenderedPagesUpdate),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetProductExtendedAttrs(_) => "SET_PRODUCT_EXTENDED_ATTRS",
            Mutation::SetUploadFileProgress { .. } => "SET_UPLOAD_FILE_PROGRESS",
            Mutation::RemoveUploadFileProgress(_) => "REMOVE_UPLOAD_FILE_PROGRESS",
            Mutation::AddUploadedFile(_) => "ADD_UPLOADED_FILE",
            Mutation::SetUploadFileProgressError(_) => "SET_UPLOAD_FILE_PROGRESS_ERROR",
            Mutation::SetAccessToken(_) => "SET_ACCESS_TOKEN",
            Mutation::SetTotalPageNum(_) => "DOCUMENT/SET_TOTAL_PAGE_NUM",
            Mutation::SetPages(_) => "DOCUMENT/SET_PAGES",
            Mutation::SetCurrentPageNum(_) => "DOCUMENT/SET_CURRENT_PAGE_NUM",
            Mutation::SetPageContainer(_) => "DOCUMENT/SET_PAGE_CONTAINER",
            Mutation::SetCurrentScale(_) => "DOCUMENT/SET_CURRENT_SCALE",
            Mutation::SetRenderedPages(_) => "DOCUMENT/SET_RENDERED_PAGES",
        }
    }

    pub(crate) fn apply(self, state: &mut StoreState) {
        match self {
            Mutation::SetProductExtendedAttrs(attrs) => state.product_extended_attrs = attrs,
            Mutation::SetUploadFileProgress {
                hash,
                filename,
                progress,
            } => {
                state.upload_progress.insert(
                    hash,
                    UploadProgress {
                        filename,
                        progress,
                        error: false,
                    },
                );
            }
            Mutation::RemoveUploadFileProgress(hash) => {
                state.upload_progress.remove(&hash);
            }
            Mutation::AddUploadedFile(file) => state.uploaded_files.push(file),
            Mutation::SetUploadFileProgressError(hash) => {
                if let Some(entry) = state.upload_progress.get_mut(&hash) {
                    entry.error = true;
                }
            }
            Mutation::SetAccessToken(token) => state.flowbee.access_token = token,
            Mutation::SetTotalPageNum(total) => state.document.total = total,
            Mutation::SetPages(pages) => state.document.pages = pages,
            Mutation::SetCurrentPageNum(current) => state.document.current = current,
            Mutation::SetPageContainer(container) => state.document.page_container = container,
            Mutation::SetCurrentScale(scale) => state.document.scale.current = scale,
            Mutation::SetRenderedPages(update) => state.document.rendered_pages.apply(update),
        }
    }
}
