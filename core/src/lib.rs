//! API client core and view controllers for the characters service.
//!
//! # Overview
//! `CharacterClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). A `Transport`
//! executes the round trip; `ApiClient` glues the two together. On top sit
//! the two controllers the views drive:
//!
//! - `CharactersController`: filters, pagination and list fetches, guarded
//!   by request sequence numbers so a superseded response never wins.
//! - `CharacterDetailController`: one character plus its episodes and
//!   location, with the related fetches isolated from each other.
//!
//! # Design
//! - `CharacterClient` is stateless; it holds only the base URL and default
//!   headers.
//! - Controllers own their state exclusively and expose it as snapshots.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod detail;
pub mod error;
pub mod filters;
pub mod http;
pub mod list;
pub mod transport;
pub mod types;

pub use client::{extract_episode_ids, extract_location_id, CharacterClient, DEFAULT_BASE_URL};
pub use detail::{CharacterDetailController, DetailError, DetailState};
pub use error::ApiError;
pub use filters::{FilterState, FilterUpdate, Pagination};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use list::{CharactersController, ListError, ListState, LoadStatus};
pub use transport::{ApiClient, ReqwestTransport, Transport};
pub use types::{Character, CharacterStatus, Episode, Location, OneOrMany, Page, PageInfo, ResourceRef};
