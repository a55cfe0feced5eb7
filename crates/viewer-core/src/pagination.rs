//! Current/total page tracking
//!
//! Both fields start as the sentinel `PageField::Unset` (serialized as `"-"`),
//! so "no document loaded" is never confused with page 1.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ViewerError;

pub const PAGE_SENTINEL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageField {
    #[default]
    Unset,
    Page(u32),
}

impl PageField {
    pub fn get(self) -> Option<u32> {
        match self {
            PageField::Unset => None,
            PageField::Page(n) => Some(n),
        }
    }

    pub fn is_unset(self) -> bool {
        matches!(self, PageField::Unset)
    }
}

impl From<u32> for PageField {
    fn from(n: u32) -> Self {
        PageField::Page(n)
    }
}

impl fmt::Display for PageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageField::Unset => f.write_str(PAGE_SENTINEL),
            PageField::Page(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for PageField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageField::Unset => serializer.serialize_str(PAGE_SENTINEL),
            PageField::Page(n) => serializer.serialize_u32(*n),
        }
    }
}

impl<'de> Deserialize<'de> for PageField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PageFieldVisitor;

        impl<'de> Visitor<'de> for PageFieldVisitor {
            type Value = PageField;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a page number or \"{}\"", PAGE_SENTINEL)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PageField, E> {
                u32::try_from(v)
                    .map(PageField::Page)
                    .map_err(|_| E::custom(format!("page number {} too large", v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PageField, E> {
                u32::try_from(v)
                    .map(PageField::Page)
                    .map_err(|_| E::custom(format!("invalid page number {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PageField, E> {
                if v == PAGE_SENTINEL {
                    Ok(PageField::Unset)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(PageFieldVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub current: PageField,
    pub total: PageField,
}

impl Pagination {
    /// Apply the engine's page-count discovery
    ///
    /// `start_page` is clamped into `1..=page_count`. A document without pages
    /// keeps `current` unset.
    pub fn on_pages_init(&mut self, page_count: u32, start_page: u32) {
        self.total = PageField::Page(page_count);
        self.current = if page_count == 0 {
            PageField::Unset
        } else {
            PageField::Page(start_page.clamp(1, page_count))
        };
    }

    /// Apply a visible-page change reported by the engine
    ///
    /// Returns `false` when the page is ignored (no page count yet, or outside it).
    pub fn on_page_change(&mut self, page_number: u32) -> bool {
        match self.total.get() {
            Some(total) if (1..=total).contains(&page_number) => {
                self.current = PageField::Page(page_number);
                true
            }
            _ => false,
        }
    }

    /// Explicit navigation request
    pub fn go_to(&mut self, page_number: u32) -> Result<(), ViewerError> {
        let total = self.check_page(page_number)?;
        debug_assert!(page_number <= total);
        self.current = PageField::Page(page_number);
        Ok(())
    }

    /// Validate `page_number` against the page count, returning the count
    pub fn check_page(&self, page_number: u32) -> Result<u32, ViewerError> {
        let total = self
            .total
            .get()
            .ok_or(ViewerError::NotReady("page count not yet reported"))?;
        if page_number < 1 || page_number > total {
            return Err(ViewerError::Range {
                page: page_number,
                total,
            });
        }
        Ok(total)
    }

    pub fn clear(&mut self) {
        self.current = PageField::Unset;
        self.total = PageField::Unset;
    }

    pub fn is_initialized(&self) -> bool {
        !self.total.is_unset()
    }

    pub fn current(&self) -> Option<u32> {
        self.current.get()
    }

    pub fn total(&self) -> Option<u32> {
        self.total.get()
    }
}
