use crate::error::{PageError, Result};
use crate::types::PageInfo;
use serde::Serialize;
use serde_json::Value;

/// Contract every page-result type must satisfy.
///
/// A paginator is generic over its page type; any implementation of this
/// trait can be swapped in with [`Paginator::with_page_type`]. A type that
/// does not implement the contract is rejected by the compiler before any
/// query runs.
///
/// [`Paginator::with_page_type`]: crate::paginator::Paginator::with_page_type
pub trait PageCollection: Sized + Send {
    /// Construct a page from the fetched rows and the pagination facts
    fn from_parts(rows: Vec<Value>, current_page: u64, per_page: u64, total: u64) -> Self;

    /// The materialized rows of this page
    fn rows(&self) -> &[Value];

    /// Total row count across all pages
    fn total(&self) -> u64;

    /// Page size
    fn per_page(&self) -> u64;

    /// Current page number, 1-based
    fn current_page(&self) -> u64;

    /// Number of pages the full result set spans.
    ///
    /// A total of zero yields zero pages regardless of the page size.
    fn total_pages(&self) -> u64 {
        if self.per_page() == 0 {
            return 0;
        }

        self.total().div_ceil(self.per_page())
    }

    /// The four pagination facts as a serializable mapping
    fn page_info(&self) -> PageInfo {
        PageInfo {
            total: self.total(),
            per_page: self.per_page(),
            current_page: self.current_page(),
            total_pages: self.total_pages(),
        }
    }

    /// Convert the rows into caller-defined domain objects.
    ///
    /// The generic layer cannot know what the rows represent, so the default
    /// fails loudly instead of guessing a structure. Implement your own page
    /// type and override this to get typed conversion.
    fn to_objects(&self) -> Result<Vec<Value>> {
        Err(PageError::conversion_unsupported(
            "row type is unknown, provide your own conversion by overriding to_objects",
        ))
    }
}

/// Default page-result type.
///
/// Owns a private copy of the fetched rows (no live cursor is retained) and
/// is immutable after construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    rows: Vec<Value>,
    total: u64,
    per_page: u64,
    current_page: u64,
}

impl Page {
    /// Number of rows on this page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether this page carries no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over the rows of this page
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.rows.iter()
    }
}

impl PageCollection for Page {
    fn from_parts(rows: Vec<Value>, current_page: u64, per_page: u64, total: u64) -> Self {
        Self {
            rows,
            total,
            per_page,
            current_page,
        }
    }

    fn rows(&self) -> &[Value] {
        &self.rows
    }

    fn total(&self) -> u64 {
        self.total
    }

    fn per_page(&self) -> u64 {
        self.per_page
    }

    fn current_page(&self) -> u64 {
        self.current_page
    }
}

impl IntoIterator for Page {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
