//! Filter and pagination bookkeeping for the characters list.

use serde::{Deserialize, Serialize};

/// Active query constraints. An empty (or whitespace-only) value is unset
/// and never reaches the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub name: String,
    pub status: String,
    pub species: String,
}

impl FilterState {
    /// Recognized keys with their trimmed values, unset keys omitted, in
    /// `name`, `status`, `species` order.
    pub fn active(&self) -> Vec<(&'static str, &str)> {
        [
            ("name", self.name.as_str()),
            ("status", self.status.as_str()),
            ("species", self.species.as_str()),
        ]
        .into_iter()
        .map(|(key, value)| (key, value.trim()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active().is_empty()
    }

    /// Overwrite only the keys present in `update`.
    pub fn merge(&mut self, update: FilterUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(species) = update.species {
            self.species = species;
        }
    }

    pub fn merged(&self, update: FilterUpdate) -> Self {
        let mut next = self.clone();
        next.merge(update);
        next
    }
}

/// Partial filter update; `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
}

impl FilterUpdate {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            name: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn status(value: impl Into<String>) -> Self {
        Self {
            status: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn species(value: impl Into<String>) -> Self {
        Self {
            species: Some(value.into()),
            ..Self::default()
        }
    }
}

/// Page bookkeeping of the list view.
///
/// `page` stays within `[1, pages]` whenever `pages > 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub count: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            pages: 0,
            count: 0,
            next: None,
            prev: None,
        }
    }
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.prev.is_some()
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.pages
    }
}
