use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{client::OmopHub, request::ApiRequest, Result};

/// Page size used when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size the API accepts; bigger values are clamped.
pub const MAX_PAGE_SIZE: u32 = 1_000;

/// Pagination metadata reported by the server alongside a page of results.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct PageMeta {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Whether another page exists. This flag is the only continuation
    /// signal; item counts are meaningless when the server post-filters.
    #[serde(default)]
    pub has_next: bool,
}

/// One decoded page of results.
#[derive(Clone, Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
}

/// Pull-based position in a paginated listing.
///
/// Owned by exactly one pager; advanced only by [`PageCursor::advance`]
/// after a fetched page, never shared between calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PageCursor {
    next_page: u32,
    page_size: u32,
    exhausted: bool,
}

impl PageCursor {
    pub(crate) fn new(page_size: u32) -> Self {
        Self {
            next_page: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            exhausted: false,
        }
    }

    /// The `(page, page_size)` to request next, or `None` at the end.
    pub(crate) fn next_request(&self) -> Option<(u32, u32)> {
        if self.exhausted {
            None
        } else {
            Some((self.next_page, self.page_size))
        }
    }

    /// Moves past a fetched page. Continuation is decided solely by the
    /// server-reported `has_next` flag; a missing pagination block means
    /// the listing was a single page.
    pub(crate) fn advance(&mut self, meta: Option<&PageMeta>) {
        match meta {
            Some(meta) if meta.has_next => self.next_page += 1,
            _ => self.exhausted = true,
        }
    }

    /// Ends iteration early, e.g. after a failed fetch.
    pub(crate) fn finish(&mut self) {
        self.exhausted = true;
    }
}

/// Lazily walks every item of a paginated endpoint.
///
/// Each pager owns its own cursor, so constructing a new pager restarts
/// from the first page. Dropping a pager mid-iteration needs no cleanup.
pub struct Pager<'a, T> {
    client: &'a OmopHub,
    template: ApiRequest,
    cursor: PageCursor,
    buffer: VecDeque<T>,
}

impl<'a, T: DeserializeOwned> Pager<'a, T> {
    pub(crate) fn new(client: &'a OmopHub, template: ApiRequest, page_size: u32) -> Self {
        Self {
            client,
            template,
            cursor: PageCursor::new(page_size),
            buffer: VecDeque::new(),
        }
    }

    /// Fetches the next page, or `None` once the server reports the end.
    ///
    /// A failed fetch yields its error once and ends the sequence.
    pub async fn next_page(&mut self) -> Option<Result<Paged<T>>> {
        let (page, page_size) = self.cursor.next_request()?;
        let request = self.template.clone().paged(page, page_size);
        match self.client.fetch_page(&request).await {
            Ok((items, meta)) => {
                self.cursor.advance(meta.as_ref());
                Some(Ok(Paged { items, meta }))
            }
            Err(err) => {
                self.cursor.finish();
                Some(Err(err))
            }
        }
    }

    /// Yields the next item, fetching pages as needed.
    ///
    /// A page with zero items but `has_next = true` is legal (server-side
    /// filtering); the pager keeps fetching until the server reports the
    /// end.
    pub async fn next_item(&mut self) -> Option<Result<T>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            match self.next_page().await? {
                Ok(page) => self.buffer.extend(page.items),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// Drains all remaining items into a vector, stopping at the first
    /// error.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(next) = self.next_item().await {
            items.push(next?);
        }
        Ok(items)
    }
}
