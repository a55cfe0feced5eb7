//! Per-document render context
//!
//! Pagination, scale, page container and the set of painted pages, all reset
//! together by `RenderContext::clear`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pagination::Pagination;
use crate::scale::{FitMode, Scale};

/// Unscaled page size as reported by the engine (scale 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, scale: f64) -> PageContainer {
        PageContainer {
            width: (self.width * scale).max(0.0),
            height: (self.height * scale).max(0.0),
        }
    }
}

/// Pixel box holding one rendered page
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageContainer {
    pub width: f64,
    pub height: f64,
}

impl PageContainer {
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Update applied to the rendered-pages set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderedPagesUpdate {
    Add(u32),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderedPages(BTreeSet<u32>);

impl RenderedPages {
    pub fn apply(&mut self, update: RenderedPagesUpdate) {
        match update {
            RenderedPagesUpdate::Add(page) => {
                self.0.insert(page);
            }
            RenderedPagesUpdate::Clear => self.0.clear(),
        }
    }

    pub fn insert(&mut self, page: u32) -> bool {
        self.0.insert(page)
    }

    pub fn contains(&self, page: u32) -> bool {
        self.0.contains(&page)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderContext {
    pub pagination: Pagination,
    pub scale: Scale,
    pub fit_mode: Option<FitMode>,
    pub page_container: PageContainer,
    pub rendered_pages: RenderedPages,
}

impl RenderContext {
    /// Back to the empty form; `scale.current` returns to `scale.default`
    pub fn clear(&mut self) {
        self.pagination.clear();
        self.scale.reset();
        self.fit_mode = None;
        self.page_container = PageContainer::default();
        self.rendered_pages.clear();
    }

    /// True once the engine has reported the page count
    pub fn is_ready(&self) -> bool {
        self.pagination.is_initialized()
    }

    pub fn update_page_container(&mut self, first_page: Option<PageGeometry>) {
        self.page_container = first_page
            .map(|geometry| geometry.scaled(self.scale.current))
            .unwrap_or_default();
    }
}
