//! Document actions: loading, page tracking, scaling and rendering

use std::rc::Rc;
use viewer_core::{
    AuthHeaders, DocumentHandle, DocumentSource, PageContainer, PageField, Pagination,
    RenderEngine, RenderedPagesUpdate, SurfaceOf, Transport, ViewerError,
};

use crate::error::StoreError;
use crate::mutation::Mutation;
use crate::store::Store;

impl<E: RenderEngine, T: Transport> Store<E, T> {
    /// Open `src` and publish its page count and page list
    ///
    /// The new document starts on page 1 with no rendered pages. Returns the
    /// page count. A failed open leaves the previous document state untouched.
    pub async fn fetch_document(
        &self,
        src: &str,
        http_header: AuthHeaders,
    ) -> Result<u32, StoreError> {
        let source = DocumentSource::new(src).with_headers(http_header);
        let document = self
            .engine
            .open(&source)
            .await
            .map_err(|e| ViewerError::Load(e.to_string()))?;

        let page_count = document.page_count();
        let pages = document.pages();
        *self.document.borrow_mut() = Some(Rc::new(document));

        let first = if page_count > 0 {
            PageField::Page(1)
        } else {
            PageField::Unset
        };
        self.commit(Mutation::SetTotalPageNum(PageField::Page(page_count)));
        self.commit(Mutation::SetCurrentPageNum(first));
        self.commit(Mutation::SetPages(pages));
        self.commit(Mutation::SetRenderedPages(RenderedPagesUpdate::Clear));
        tracing::info!("Fetched {} ({} pages)", src, page_count);
        Ok(page_count)
    }

    pub fn update_current_page_num(&self, page_num: u32) -> Result<(), StoreError> {
        let pagination = {
            let state = self.state();
            let document = &state.document;
            Pagination {
                current: document.current,
                total: document.total,
            }
        };
        pagination.check_page(page_num)?;
        self.commit(Mutation::SetCurrentPageNum(PageField::Page(page_num)));
        Ok(())
    }

    /// First page geometry at the current scale; `{0, 0}` without pages
    pub fn update_page_container(&self) -> PageContainer {
        let container = {
            let state = self.state();
            let document = &state.document;
            document
                .first_page()
                .map(|page| page.scaled(document.scale.current))
                .unwrap_or_default()
        };
        self.commit(Mutation::SetPageContainer(container));
        container
    }

    /// Fit the first page to `container_width`, or fall back to the default scale
    pub fn calculate_scale(&self, container_width: Option<f64>) -> Result<f64, StoreError> {
        let scale = {
            let state = self.state();
            let document = &state.document;
            match container_width.filter(|width| *width > 0.0) {
                Some(width) => {
                    let first = document
                        .first_page()
                        .ok_or(ViewerError::NotReady("no pages loaded"))?;
                    let page_width = first.scaled(document.scale.default).width;
                    if page_width > 0.0 {
                        width / page_width
                    } else {
                        tracing::warn!("First page has no width, keeping the default scale");
                        document.scale.default
                    }
                }
                None => document.scale.default,
            }
        };
        self.commit(Mutation::SetCurrentScale(scale));
        Ok(scale)
    }

    /// Step the scale up while below the maximum, stopping at the maximum
    pub fn increase_scale(&self) -> f64 {
        let scale = self.state().document.scale;
        if scale.max.map_or(true, |max| scale.current < max) {
            let next = scale.current + self.config.scale_step;
            let next = scale.max.map_or(next, |max| next.min(max));
            self.commit(Mutation::SetCurrentScale(next));
            self.update_page_container();
        }
        self.state().document.scale.current
    }

    /// Step the scale down while above the minimum, stopping at the minimum
    ///
    /// Without a minimum, a step that would reach zero is refused.
    pub fn decrease_scale(&self) -> f64 {
        let scale = self.state().document.scale;
        let next = scale.current - self.config.scale_step;
        let next = match scale.min {
            Some(min) if scale.current > min => Some(next.max(min)),
            Some(_) => None,
            None => Some(next).filter(|next| *next > 0.0),
        };
        if let Some(next) = next {
            self.commit(Mutation::SetCurrentScale(next));
            self.update_page_container();
        }
        self.state().document.scale.current
    }

    /// Paint `page_num` onto `surface` at the current scale
    pub async fn render_page(
        &self,
        page_num: u32,
        surface: &SurfaceOf<E>,
    ) -> Result<(), StoreError> {
        let document = self
            .document
            .borrow()
            .clone()
            .ok_or(ViewerError::NotReady("no document fetched"))?;
        let (total, scale) = {
            let state = self.state();
            (state.document.pages.len() as u32, state.document.scale.current)
        };
        if total == 0 {
            return Err(ViewerError::NotReady("page list not loaded").into());
        }
        if page_num < 1 || page_num > total {
            return Err(ViewerError::Range {
                page: page_num,
                total,
            }
            .into());
        }

        document
            .render_page(page_num, scale, surface)
            .await
            .map_err(ViewerError::from)?;
        Ok(())
    }

    pub fn update_rendered_pages(&self, page_num: u32) {
        self.commit(Mutation::SetRenderedPages(RenderedPagesUpdate::Add(page_num)));
    }

    /// Back to an empty render context; the fetched document stays open
    pub fn clear_render_context(&self) {
        let default = self.state().document.scale.default;
        self.commit(Mutation::SetPages(Vec::new()));
        self.commit(Mutation::SetRenderedPages(RenderedPagesUpdate::Clear));
        self.commit(Mutation::SetTotalPageNum(PageField::Unset));
        self.commit(Mutation::SetCurrentPageNum(PageField::Unset));
        self.commit(Mutation::SetCurrentScale(default));
        self.commit(Mutation::SetPageContainer(PageContainer::default()));
    }

    pub fn clear_rendered_pages(&self) {
        self.commit(Mutation::SetRenderedPages(RenderedPagesUpdate::Clear));
    }
}
