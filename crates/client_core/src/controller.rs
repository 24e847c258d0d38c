//! Search/pagination state machine.
//!
//! [`SearchController`] owns the gallery state and decides when a fetch is
//! needed. It performs no I/O: every fetch it wants is returned as a
//! [`FetchTicket`], and the caller reports the outcome back through
//! [`SearchController::on_fetch_settled`]. Tickets carry a monotonically
//! increasing sequence number and only the newest one may change state, so a
//! slow response for a superseded query is dropped instead of overwriting
//! newer results.

use shared::{
    domain::{Image, Page, SearchQuery, SearchResult},
    error::SearchError,
};
use tracing::{debug, warn};

/// One fetch the controller wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: SearchQuery,
    pub page: Page,
}

/// One-shot request to scroll the gallery to freshly appended images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCue {
    pub first_new_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Replaced { count: usize },
    Appended { count: usize },
    Failed,
    Stale,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    query: Option<SearchQuery>,
    page: Page,
    images: Vec<Image>,
    loading: bool,
    error: Option<SearchError>,
    has_more: bool,
    total: Option<u64>,
    total_pages: Option<u32>,
}

impl SearchState {
    pub fn query(&self) -> Option<&SearchQuery> {
        self.query.as_ref()
    }

    /// Highest page that is loaded or currently being fetched.
    pub fn page(&self) -> Page {
        self.page
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn show_load_more(&self) -> bool {
        show_load_more(self.images.len(), self.has_more, self.loading)
    }
}

pub fn show_load_more(image_count: usize, has_more: bool, loading: bool) -> bool {
    image_count > 0 && has_more && !loading
}

#[derive(Debug, Default)]
pub struct SearchController {
    state: SearchState,
    next_seq: u64,
    in_flight: Option<FetchTicket>,
    failed_page: Option<Page>,
    scroll_cue: Option<ScrollCue>,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    pub fn show_load_more(&self) -> bool {
        self.state.show_load_more()
    }

    /// Starts a new search at page 1, superseding any fetch in flight.
    ///
    /// Blank input clears the gallery and issues no fetch.
    pub fn submit_query(&mut self, raw: &str) -> Option<FetchTicket> {
        match SearchQuery::parse(raw) {
            Some(query) => Some(self.start_first_page(query)),
            None => {
                self.clear();
                None
            }
        }
    }

    /// Requests the next page for the current query. Returns `None` without
    /// touching state when there is nothing more to load or a fetch is
    /// already running.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if !self.state.has_more || self.state.loading {
            return None;
        }
        let query = self.state.query.clone()?;
        let page = self.state.page.next();
        self.state.page = page;
        self.state.loading = true;
        Some(self.issue(query, page))
    }

    /// Re-issues the request that failed last, if any.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        let failed = self.failed_page?;
        if self.state.loading {
            return None;
        }
        let query = self.state.query.clone()?;
        if failed.is_first() {
            Some(self.start_first_page(query))
        } else {
            self.load_more()
        }
    }

    /// Forgets the in-flight fetch, e.g. when it could not be dispatched.
    ///
    /// A cancelled first page leaves the previous query's images under the
    /// new query, so paging stops until the search is retried or replaced.
    pub fn cancel_in_flight(&mut self) -> bool {
        let Some(ticket) = self.in_flight.take() else {
            return false;
        };
        debug!(seq = ticket.seq, page = ticket.page.get(), "cancelled search ticket");
        self.state.loading = false;
        if ticket.page.is_first() {
            self.state.has_more = false;
        } else {
            self.state.page = ticket.page.previous();
        }
        self.failed_page = Some(ticket.page);
        true
    }

    /// Applies the response for ticket `seq`; any other sequence is stale.
    ///
    /// `has_more` follows the last successful page, with one exception: a
    /// failed first page sets it to false. The images on screen then belong
    /// to the superseded query, and paging the new query onto them would mix
    /// two result sets. `retry` or a new submit restores paging.
    pub fn on_fetch_settled(
        &mut self,
        seq: u64,
        outcome: Result<SearchResult, SearchError>,
    ) -> SettleOutcome {
        let ticket = match self.in_flight.take() {
            Some(ticket) if ticket.seq == seq => ticket,
            other => {
                self.in_flight = other;
                debug!(seq, "discarding stale search response");
                return SettleOutcome::Stale;
            }
        };

        self.state.loading = false;
        match outcome {
            Ok(result) => {
                let count = result.images.len();
                self.state.has_more = count > 0;
                self.state.error = None;
                self.state.total = result.total;
                self.state.total_pages = result.total_pages;
                self.failed_page = None;

                if ticket.page.is_first() {
                    self.state.images = result.images;
                    SettleOutcome::Replaced { count }
                } else {
                    let first_new_index = self.state.images.len();
                    self.state.images.extend(result.images);
                    if count > 0 {
                        self.scroll_cue = Some(ScrollCue { first_new_index });
                    }
                    SettleOutcome::Appended { count }
                }
            }
            Err(err) => {
                warn!(
                    query = %ticket.query,
                    page = ticket.page.get(),
                    "search failed: {err}"
                );
                if ticket.page.is_first() {
                    self.state.has_more = false;
                } else {
                    self.state.page = ticket.page.previous();
                }
                self.failed_page = Some(ticket.page);
                self.state.error = Some(err);
                SettleOutcome::Failed
            }
        }
    }

    pub fn take_scroll_cue(&mut self) -> Option<ScrollCue> {
        self.scroll_cue.take()
    }

    fn start_first_page(&mut self, query: SearchQuery) -> FetchTicket {
        self.state.query = Some(query.clone());
        self.state.page = Page::FIRST;
        self.state.error = None;
        self.state.loading = true;
        self.failed_page = None;
        self.scroll_cue = None;
        self.issue(query, Page::FIRST)
    }

    fn clear(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            debug!(seq = ticket.seq, "search cleared; dropping in-flight ticket");
        }
        self.state = SearchState::default();
        self.failed_page = None;
        self.scroll_cue = None;
    }

    fn issue(&mut self, query: SearchQuery, page: Page) -> FetchTicket {
        self.next_seq += 1;
        let ticket = FetchTicket {
            seq: self.next_seq,
            query,
            page,
        };
        if let Some(previous) = self.in_flight.replace(ticket.clone()) {
            debug!(
                superseded = previous.seq,
                seq = ticket.seq,
                "search ticket superseded"
            );
        }
        debug!(seq = ticket.seq, query = %ticket.query, page = ticket.page.get(), "issued search ticket");
        ticket
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
