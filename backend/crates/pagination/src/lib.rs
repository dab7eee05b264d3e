//! Page-number pagination primitives shared by backend list endpoints.
//!
//! The crate owns three concerns:
//!
//! - [`PageRequest`] parses and validates a one-based page number together
//!   with a fixed page size, and derives the SQL `LIMIT`/`OFFSET` window.
//! - [`Page`] is the transport-neutral envelope returned by repositories and
//!   services: the items of one window plus the total row count.
//! - [`PageLinks`] renders `self`, `next`, and `prev` URLs for a page so
//!   clients never need to assemble query strings themselves.
//!
//! # Examples
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::from_query(Some("2"), 8)?;
//! assert_eq!(request.offset(), 8);
//!
//! let page = Page::new(vec!["a", "b"], request, 10);
//! assert!(!page.has_more());
//! # Ok::<(), pagination::PageError>(())
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Name of the query parameter carrying the page number.
pub const PAGE_QUERY_PARAM: &str = "page";

/// Errors raised while constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    /// Page numbers are one-based.
    #[error("page number must be at least 1")]
    ZeroPage,
    /// A page must hold at least one item.
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// A validated request for one page of results.
///
/// ## Invariants
/// - `page >= 1`
/// - `per_page >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    /// Build a request for `page` with `per_page` items per page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::ZeroPage`] or [`PageError::ZeroPageSize`] when
    /// either value is zero.
    pub const fn new(page: u32, per_page: u32) -> Result<Self, PageError> {
        if per_page == 0 {
            return Err(PageError::ZeroPageSize);
        }
        if page == 0 {
            return Err(PageError::ZeroPage);
        }
        Ok(Self { page, per_page })
    }

    /// Build a request for the first page.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::ZeroPageSize`] when `per_page` is zero.
    pub const fn first(per_page: u32) -> Result<Self, PageError> {
        Self::new(1, per_page)
    }

    /// Parse a raw `page` query value leniently.
    ///
    /// Missing, non-numeric, zero, or negative values select the first page;
    /// list endpoints never reject a request because of its page number.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::ZeroPageSize`] when `per_page` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::PageRequest;
    ///
    /// assert_eq!(PageRequest::from_query(Some("-3"), 8)?.page(), 1);
    /// assert_eq!(PageRequest::from_query(Some("abc"), 8)?.page(), 1);
    /// assert_eq!(PageRequest::from_query(Some("4"), 8)?.page(), 4);
    /// # Ok::<(), pagination::PageError>(())
    /// ```
    pub fn from_query(raw: Option<&str>, per_page: u32) -> Result<Self, PageError> {
        let page = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|value| *value >= 1)
            .and_then(|value| u32::try_from(value).ok())
            .unwrap_or(1);
        Self::new(page, per_page)
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of rows to skip: `(page - 1) * per_page`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Maximum number of rows in the window.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page as u64
    }

    /// Whether rows remain after this window given the `total` row count.
    #[must_use]
    pub const fn has_more(&self, total: u64) -> bool {
        self.offset() + self.limit() < total
    }

    /// Request for the following page, saturating at `u32::MAX`.
    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            per_page: self.per_page,
        }
    }

    /// Request for the preceding page, if any.
    #[must_use]
    pub const fn prev(&self) -> Option<Self> {
        if self.page > 1 {
            Some(Self {
                page: self.page - 1,
                per_page: self.per_page,
            })
        } else {
            None
        }
    }
}

/// One window of results together with the total row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    items: Vec<T>,
    request: PageRequest,
    total: u64,
}

impl<T> Page<T> {
    /// Wrap the items fetched for `request`.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            request,
            total,
        }
    }

    /// Items in this window, in repository order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page and return its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// The request that produced this page.
    #[must_use]
    pub const fn request(&self) -> PageRequest {
        self.request
    }

    /// Total rows across all pages.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.request.has_more(self.total)
    }

    /// Transform every item while keeping the window metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            request: self.request,
            total: self.total,
        }
    }
}

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    /// Link to the current page.
    #[serde(rename = "self")]
    pub self_: String,
    /// Link to the following page when more rows remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Link to the preceding page unless this is the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl PageLinks {
    /// Build links for `page` relative to `base`.
    ///
    /// Existing `page` parameters on `base` are replaced; other query
    /// parameters are preserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use pagination::{Page, PageLinks, PageRequest};
    /// use url::Url;
    ///
    /// let base = Url::parse("https://emoji.example/api/emojis").expect("url");
    /// let page = Page::new(vec![1, 2], PageRequest::new(2, 2)?, 5);
    /// let links = PageLinks::for_page(&base, &page);
    /// assert_eq!(links.self_, "https://emoji.example/api/emojis?page=2");
    /// assert_eq!(links.next.as_deref(), Some("https://emoji.example/api/emojis?page=3"));
    /// assert_eq!(links.prev.as_deref(), Some("https://emoji.example/api/emojis?page=1"));
    /// # Ok::<(), pagination::PageError>(())
    /// ```
    #[must_use]
    pub fn for_page<T>(base: &Url, page: &Page<T>) -> Self {
        let request = page.request();
        Self {
            self_: page_url(base, request.page()),
            next: page
                .has_more()
                .then(|| page_url(base, request.next().page())),
            prev: request.prev().map(|prev| page_url(base, prev.page())),
        }
    }
}

fn page_url(base: &Url, page: u32) -> String {
    let mut url = base.clone();
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_QUERY_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(PAGE_QUERY_PARAM, &page.to_string());
    }
    url.into()
}
