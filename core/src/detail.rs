//! Character detail controller: one character plus its episodes and location.
//!
//! The character is the primary fetch and its failure is user-visible. The
//! episodes and the location are fetched concurrently once the character is
//! known, and each of them degrades to an empty value on failure.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::client::{extract_episode_ids, extract_location_id};
use crate::error::ApiError;
use crate::list::LoadStatus;
use crate::transport::{ApiClient, Transport};
use crate::types::{Character, Episode, Location};

/// User-facing failure of a detail load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetailError {
    #[error("Character ID is required")]
    MissingId,

    #[error("Character not found. The character may not exist or the ID is invalid.")]
    NotFound,

    #[error("{0}")]
    Failed(String),
}

impl DetailError {
    /// `MissingId` and `NotFound` are recovered by going back.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DetailError::Failed(_))
    }
}

/// Snapshot of the detail controller.
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub status: LoadStatus,
    pub error: Option<DetailError>,
    pub character_id: Option<u32>,
    pub character: Option<Character>,
    pub episodes: Vec<Episode>,
    pub location: Option<Location>,
}

impl DetailState {
    fn reset_data(&mut self) {
        self.character = None;
        self.episodes.clear();
        self.location = None;
    }
}

/// Navigation hook invoked by `go_back`.
pub type Navigate = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy)]
struct Ticket {
    seq: u64,
    id: u32,
}

#[derive(Debug, Default)]
struct Inner {
    state: DetailState,
    seq: u64,
    last_id: Option<u32>,
}

pub struct CharacterDetailController<T> {
    api: ApiClient<T>,
    inner: Mutex<Inner>,
    navigate: Mutex<Option<Navigate>>,
}

impl<T: Transport> CharacterDetailController<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner::default()),
            navigate: Mutex::new(None),
        }
    }

    pub fn with_navigation(self, navigate: impl FnOnce() + Send + 'static) -> Self {
        *self.navigate.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(navigate));
        self
    }

    pub fn state(&self) -> DetailState {
        self.lock().state.clone()
    }

    /// Load character `id`; `0` stands for "no id" and fails without a request.
    pub fn load(&self, id: u32) -> impl Future<Output = ()> + '_ {
        let ticket = self.issue(id);
        self.run(ticket)
    }

    /// Load the last requested id again. No-op before the first `load` or
    /// when that id was missing.
    pub fn retry(&self) -> impl Future<Output = ()> + '_ {
        let last_id = self.lock().last_id.filter(|&id| id != 0);
        let ticket = last_id.and_then(|id| self.issue(id));
        self.run(ticket)
    }

    /// Reload the last requested id in any state. A missing id fails again
    /// with `MissingId`. No-op before the first `load`.
    pub fn refetch(&self) -> impl Future<Output = ()> + '_ {
        let last_id = self.lock().last_id;
        let ticket = last_id.and_then(|id| self.issue(id));
        self.run(ticket)
    }

    /// Hand control back to the navigation hook, once.
    pub fn go_back(&self) {
        let navigate = self
            .navigate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match navigate {
            Some(navigate) => navigate(),
            None => debug!("go_back without navigation context"),
        }
    }

    fn issue(&self, id: u32) -> Option<Ticket> {
        let mut inner = self.lock();
        inner.seq += 1;
        inner.last_id = Some(id);
        let state = &mut inner.state;
        if id == 0 {
            state.reset_data();
            state.character_id = None;
            state.status = LoadStatus::Error;
            state.error = Some(DetailError::MissingId);
            return None;
        }
        state.character_id = Some(id);
        state.status = LoadStatus::Loading;
        state.error = None;
        Some(Ticket { seq: inner.seq, id })
    }

    async fn run(&self, ticket: Option<Ticket>) {
        let Some(ticket) = ticket else {
            return;
        };

        let character = match self.api.get_character(ticket.id).await {
            Ok(character) => character,
            Err(err) => {
                self.fail(ticket, &err);
                return;
            }
        };

        let episode_ids = extract_episode_ids(&character.episode);
        let location_id = extract_location_id(&character.location.url);
        {
            let mut inner = self.lock();
            if inner.seq != ticket.seq {
                debug!(id = ticket.id, "discarding superseded character response");
                return;
            }
            inner.state.character = Some(character);
            inner.state.episodes.clear();
            inner.state.location = None;
        }

        let (episodes, location) = tokio::join!(
            self.api.get_episodes(&episode_ids),
            self.fetch_location(location_id),
        );
        let episodes = episodes.unwrap_or_else(|err| {
            warn!(id = ticket.id, error = %err, "failed to fetch episodes");
            Vec::new()
        });
        let location = location.unwrap_or_else(|err| {
            warn!(id = ticket.id, error = %err, "failed to fetch location");
            None
        });

        let mut inner = self.lock();
        if inner.seq != ticket.seq {
            debug!(id = ticket.id, "discarding superseded related data");
            return;
        }
        inner.state.episodes = episodes;
        inner.state.location = location;
        inner.state.status = LoadStatus::Loaded;
    }

    async fn fetch_location(&self, id: Option<u32>) -> Result<Option<Location>, ApiError> {
        match id {
            Some(id) => self.api.get_location(id).await.map(Some),
            None => Ok(None),
        }
    }

    fn fail(&self, ticket: Ticket, err: &ApiError) {
        let mut inner = self.lock();
        if inner.seq != ticket.seq {
            return;
        }
        error!(id = ticket.id, status = err.status(), error = %err, "failed to fetch character detail");
        let state = &mut inner.state;
        state.reset_data();
        state.status = LoadStatus::Error;
        state.error = Some(if err.is_not_found() {
            DetailError::NotFound
        } else {
            DetailError::Failed(err.to_string())
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
