//! Characters list controller: filter state, pagination and list fetches.
//!
//! # Design
//! Every action *issues* its fetch synchronously when called (sequence
//! number, filters and `Loading` are recorded under the lock) and returns a
//! future that drives the round trip. A completion is applied only if its
//! sequence number is still the latest issued, so the most recently issued
//! action always determines the final state regardless of completion order.
//! The state lock is never held across an `.await`.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::filters::{FilterState, FilterUpdate, Pagination};
use crate::transport::{ApiClient, Transport};
use crate::types::Character;

/// Lifecycle of the most recently issued fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// User-facing failure of a list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// The remote answered 404: nothing matches the filters.
    #[error("No characters found matching your criteria.")]
    NoResults,

    #[error("{0}")]
    Failed(String),
}

impl ListError {
    /// `NoResults` is recovered by changing filters, not by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ListError::Failed(_))
    }
}

/// Snapshot of the list controller.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub status: LoadStatus,
    pub error: Option<ListError>,
    pub characters: Vec<Character>,
    pub pagination: Pagination,
    pub filters: FilterState,
}

impl ListState {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }
}

#[derive(Debug)]
struct Ticket {
    seq: u64,
    page: u32,
    filters: FilterState,
}

#[derive(Debug, Default)]
struct Inner {
    state: ListState,
    seq: u64,
    last_attempt: Option<(u32, FilterState)>,
}

impl Inner {
    fn issue(&mut self, page: u32, filters: FilterState) -> Ticket {
        self.seq += 1;
        self.state.status = LoadStatus::Loading;
        self.state.error = None;
        self.state.filters = filters.clone();
        self.last_attempt = Some((page, filters.clone()));
        Ticket {
            seq: self.seq,
            page,
            filters,
        }
    }

    fn issue_in_range(&mut self, page: u32) -> Option<Ticket> {
        if !self.state.pagination.contains(page) {
            debug!(page, pages = self.state.pagination.pages, "page out of range, ignoring");
            return None;
        }
        let filters = self.state.filters.clone();
        Some(self.issue(page, filters))
    }
}

pub struct CharactersController<T> {
    api: ApiClient<T>,
    inner: Mutex<Inner>,
}

impl<T: Transport> CharactersController<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn state(&self) -> ListState {
        self.lock().state.clone()
    }

    /// Fetch `page` with `filters`, which become the current filters.
    pub fn fetch_page(&self, page: u32, filters: FilterState) -> impl Future<Output = ()> + '_ {
        let ticket = self.lock().issue(page, filters);
        self.run(Some(ticket))
    }

    /// Merge `update` into the current filters and fetch page 1.
    pub fn update_filters(&self, update: FilterUpdate) -> impl Future<Output = ()> + '_ {
        let ticket = {
            let mut inner = self.lock();
            let merged = inner.state.filters.merged(update);
            inner.issue(1, merged)
        };
        self.run(Some(ticket))
    }

    pub fn clear_filters(&self) -> impl Future<Output = ()> + '_ {
        let ticket = self.lock().issue(1, FilterState::default());
        self.run(Some(ticket))
    }

    /// No-op unless `page` lies within `[1, pages]`.
    pub fn go_to_page(&self, page: u32) -> impl Future<Output = ()> + '_ {
        let ticket = self.lock().issue_in_range(page);
        self.run(ticket)
    }

    pub fn next_page(&self) -> impl Future<Output = ()> + '_ {
        let ticket = {
            let mut inner = self.lock();
            if inner.state.pagination.has_next() {
                let page = inner.state.pagination.page.saturating_add(1);
                inner.issue_in_range(page)
            } else {
                None
            }
        };
        self.run(ticket)
    }

    pub fn previous_page(&self) -> impl Future<Output = ()> + '_ {
        let ticket = {
            let mut inner = self.lock();
            if inner.state.pagination.has_previous() {
                let page = inner.state.pagination.page.saturating_sub(1);
                inner.issue_in_range(page)
            } else {
                None
            }
        };
        self.run(ticket)
    }

    /// Re-issue the last attempted fetch. Only acts from the error state.
    pub fn retry(&self) -> impl Future<Output = ()> + '_ {
        let ticket = {
            let mut inner = self.lock();
            let last_attempt = inner.last_attempt.clone();
            match last_attempt {
                Some((page, filters)) if inner.state.status == LoadStatus::Error => {
                    Some(inner.issue(page, filters))
                }
                _ => None,
            }
        };
        self.run(ticket)
    }

    /// Reload the current page with the current filters, whatever the state.
    pub fn refetch(&self) -> impl Future<Output = ()> + '_ {
        let ticket = {
            let mut inner = self.lock();
            let page = inner.state.pagination.page;
            let filters = inner.state.filters.clone();
            inner.issue(page, filters)
        };
        self.run(Some(ticket))
    }

    async fn run(&self, ticket: Option<Ticket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let result = self.api.list_characters(ticket.page, &ticket.filters).await;

        let mut inner = self.lock();
        if inner.seq != ticket.seq {
            debug!(
                seq = ticket.seq,
                latest = inner.seq,
                page = ticket.page,
                "discarding superseded characters response"
            );
            return;
        }

        let state = &mut inner.state;
        match result {
            Ok(page) => {
                let pages = page.info.pages;
                state.characters = page.results;
                state.pagination = Pagination {
                    page: if pages > 0 { ticket.page.clamp(1, pages) } else { 1 },
                    pages,
                    count: page.info.count,
                    next: page.info.next,
                    prev: page.info.prev,
                };
                state.status = LoadStatus::Loaded;
                state.error = None;
            }
            Err(err) if err.is_not_found() => {
                info!(filters = ?ticket.filters, "no characters match the current filters");
                state.characters.clear();
                state.pagination = Pagination::default();
                state.status = LoadStatus::Error;
                state.error = Some(ListError::NoResults);
            }
            Err(err) => {
                error!(page = ticket.page, path = err.path(), error = %err, "failed to fetch characters");
                state.status = LoadStatus::Error;
                state.error = Some(ListError::Failed(err.to_string()));
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
