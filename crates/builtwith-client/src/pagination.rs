//! Pull-based pagination over the lists endpoint.
//!
//! A [`TechListPages`] issues one request per pull and hands each page back
//! as soon as it arrives. Nothing is prefetched or buffered, so dropping the
//! paginator between pulls cancels the walk cleanly.

use crate::executor::BuiltWithClient;
use crate::page::{ContinuationToken, Page, ResultRecord};
use crate::query::{Endpoint, QueryParameters};
use builtwith_core::{BuiltWithError, Result};
use futures::stream::{self, Stream};

/// Why a walk ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The service reported no further pages
    Exhausted,
    /// The page limit was reached while more pages were available
    PageLimit,
}

#[derive(Debug, Clone)]
enum State {
    /// Next pull fetches the page at this offset
    Ready(Option<ContinuationToken>),
    /// Page limit reached; the offset is where a later walk would resume
    Limited(Option<ContinuationToken>),
    /// Last page seen
    Exhausted,
    /// A request failed at this offset
    Failed(Option<ContinuationToken>),
}

/// Lazy sequence of lists pages.
///
/// Created by [`BuiltWithClient::iterate`].
pub struct TechListPages {
    client: BuiltWithClient,
    query: QueryParameters,
    max_pages: Option<usize>,
    pages_fetched: usize,
    state: State,
}

impl TechListPages {
    fn new(client: BuiltWithClient, query: QueryParameters, max_pages: Option<usize>) -> Self {
        let offset = query.offset.clone();
        let state = if max_pages == Some(0) {
            State::Limited(offset)
        } else {
            State::Ready(offset)
        };
        Self {
            client,
            query,
            max_pages,
            pages_fetched: 0,
            state,
        }
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the walk is over. An error is yielded exactly once;
    /// every later pull returns `None`.
    pub async fn next_page(&mut self) -> Option<Result<Page>> {
        let offset = match &self.state {
            State::Ready(offset) => offset.clone(),
            State::Limited(_) | State::Exhausted | State::Failed(_) => return None,
        };

        let mut query = self.query.clone();
        query.offset.clone_from(&offset);
        self.pages_fetched += 1;

        match self.client.execute(&query).await {
            Ok(page) => {
                let limit_reached = self
                    .max_pages
                    .is_some_and(|max| self.pages_fetched >= max);
                self.state = match (&page.next_offset, limit_reached) {
                    (None, _) => State::Exhausted,
                    (Some(next), true) => State::Limited(Some(next.clone())),
                    (Some(next), false) => State::Ready(Some(next.clone())),
                };
                tracing::debug!(
                    page = self.pages_fetched,
                    results = page.results.len(),
                    has_more = page.has_more(),
                    "fetched lists page"
                );
                Some(Ok(page))
            }
            Err(e) => {
                tracing::warn!(
                    page = self.pages_fetched,
                    kind = ?e.kind(),
                    "pagination aborted: {e}"
                );
                self.state = State::Failed(offset);
                Some(Err(e))
            }
        }
    }

    /// Why the walk stopped, once it has stopped without an error.
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.state {
            State::Exhausted => Some(StopReason::Exhausted),
            State::Limited(_) => Some(StopReason::PageLimit),
            State::Ready(_) | State::Failed(_) => None,
        }
    }

    /// Offset a fresh walk would resume from.
    ///
    /// After a page limit this is the service's next token; after a failure it
    /// is the offset of the failed request. `None` once the results are
    /// exhausted or when the pending request starts from the beginning.
    #[must_use]
    pub fn pending_offset(&self) -> Option<&ContinuationToken> {
        match &self.state {
            State::Ready(offset) | State::Limited(offset) | State::Failed(offset) => {
                offset.as_ref()
            }
            State::Exhausted => None,
        }
    }

    /// Number of requests issued so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Adapt into a [`Stream`] with the same termination rules.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> {
        stream::unfold(self, |mut pages| async move {
            pages.next_page().await.map(|item| (item, pages))
        })
    }
}

impl std::fmt::Debug for TechListPages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechListPages")
            .field("query", &self.query)
            .field("max_pages", &self.max_pages)
            .field("pages_fetched", &self.pages_fetched)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl BuiltWithClient {
    /// Walk the pages of a technology query.
    ///
    /// `max_pages = Some(n)` caps the walk at `n` requests; `None` follows the
    /// continuation token until the service reports the end.
    ///
    /// # Errors
    /// Returns a validation error up front if the query is invalid, is not a
    /// technology query, or asks for an encoding without continuation tokens.
    pub fn iterate(
        &self,
        query: QueryParameters,
        max_pages: Option<usize>,
    ) -> Result<TechListPages> {
        if query.endpoint()? != Endpoint::Lists {
            return Err(BuiltWithError::validation(
                "only technology queries can be paginated",
            ));
        }
        if !query.format.carries_continuation() {
            return Err(BuiltWithError::Validation(format!(
                "format '{}' carries no continuation token and cannot be paginated",
                query.format
            )));
        }
        query.plan()?;

        Ok(TechListPages::new(self.clone(), query, max_pages))
    }

    /// Collect every result record across pages, in page order.
    ///
    /// # Errors
    /// Returns the first error any request produced; records from earlier
    /// pages are discarded.
    pub async fn collect_all(
        &self,
        query: &QueryParameters,
        max_pages: Option<usize>,
    ) -> Result<Vec<ResultRecord>> {
        let mut pages = self.iterate(query.clone(), max_pages)?;
        let mut records = Vec::new();
        while let Some(page) = pages.next_page().await {
            records.extend(page?.results);
        }

        tracing::debug!(
            records = records.len(),
            pages = pages.pages_fetched(),
            stop = ?pages.stop_reason(),
            "collected lists results"
        );
        Ok(records)
    }
}
