//! Stateless HTTP request builder and response parser for the characters API.
//!
//! # Design
//! `CharacterClient` holds only a base URL and its default headers and carries
//! no mutable state between calls. Each endpoint is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. Executing the round trip is someone else's job (see
//! `transport`), so everything here is deterministic.

use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::filters::FilterState;
use crate::http::{HttpRequest, HttpResponse, RequestOptions};
use crate::types::{Character, Episode, Location, OneOrMany, Page};

pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// Synchronous, stateless client for the characters API.
#[derive(Debug, Clone)]
pub struct CharacterClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl Default for CharacterClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl CharacterClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: vec![("content-type".to_string(), "application/json".to_string())],
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for an API-relative `path` that may already carry a
    /// query string.
    pub fn build_request(&self, path: &str, options: RequestOptions) -> HttpRequest {
        let mut headers = self.default_headers.clone();
        headers.extend(options.headers);
        HttpRequest {
            method: options.method,
            url: format!("{}{path}", self.base_url),
            path: path.to_string(),
            headers,
            body: options.body,
        }
    }

    fn get(&self, path: &str) -> HttpRequest {
        self.build_request(path, RequestOptions::default())
    }

    /// `GET /character?page=N` plus every set filter.
    pub fn build_list_characters(&self, page: u32, filters: &FilterState) -> HttpRequest {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &page.to_string());
        for (key, value) in filters.active() {
            query.append_pair(key, value);
        }
        self.get(&format!("/character?{}", query.finish()))
    }

    pub fn build_get_character(&self, id: u32) -> Result<HttpRequest, ApiError> {
        if id == 0 {
            return Err(ApiError::MissingId {
                what: "Character ID",
                path: "/character/:id".to_string(),
            });
        }
        Ok(self.get(&format!("/character/{id}")))
    }

    pub fn build_get_characters(&self, ids: &[u32]) -> Result<HttpRequest, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::MissingId {
                what: "Character IDs",
                path: "/character/:ids".to_string(),
            });
        }
        Ok(self.get(&format!("/character/{}", join_ids(ids))))
    }

    /// One request for all `ids`; `None` when there is nothing to fetch.
    pub fn build_get_episodes(&self, ids: &[u32]) -> Option<HttpRequest> {
        if ids.is_empty() {
            return None;
        }
        Some(self.get(&format!("/episode/{}", join_ids(ids))))
    }

    pub fn build_get_location(&self, id: u32) -> HttpRequest {
        self.get(&format!("/location/{id}"))
    }

    pub fn parse_list_characters(
        &self,
        path: &str,
        response: HttpResponse,
    ) -> Result<Page<Character>, ApiError> {
        self.parse_json(path, response)
    }

    pub fn parse_get_character(&self, path: &str, response: HttpResponse) -> Result<Character, ApiError> {
        self.parse_json(path, response)
    }

    pub fn parse_get_characters(
        &self,
        path: &str,
        response: HttpResponse,
    ) -> Result<Vec<Character>, ApiError> {
        self.parse_json::<OneOrMany<Character>>(path, response)
            .map(OneOrMany::into_vec)
    }

    pub fn parse_get_episodes(&self, path: &str, response: HttpResponse) -> Result<Vec<Episode>, ApiError> {
        self.parse_json::<OneOrMany<Episode>>(path, response)
            .map(OneOrMany::into_vec)
    }

    pub fn parse_get_location(&self, path: &str, response: HttpResponse) -> Result<Location, ApiError> {
        self.parse_json(path, response)
    }

    /// Check the status and deserialize the body into `T`.
    pub fn parse_json<T: DeserializeOwned>(&self, path: &str, response: HttpResponse) -> Result<T, ApiError> {
        check_status(path, &response)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization {
            status: response.status,
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(path: &str, response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound {
            path: path.to_string(),
        });
    }
    Err(ApiError::Http {
        status: response.status,
        status_text: status_text(response.status).to_string(),
        path: path.to_string(),
    })
}

fn status_text(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown Status")
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

/// Episode ids referenced by `urls` (`.../episode/<id>`), in input order with
/// duplicates kept. References that don't end in a numeric id are dropped.
pub fn extract_episode_ids<S: AsRef<str>>(urls: &[S]) -> Vec<u32> {
    urls.iter()
        .filter_map(|url| trailing_id(url.as_ref(), "/episode/"))
        .collect()
}

/// Location id referenced by `url`, or `None` for an empty, `unknown` or
/// malformed reference.
pub fn extract_location_id(url: &str) -> Option<u32> {
    let url = url.trim();
    if url.is_empty() || url == "unknown" {
        return None;
    }
    trailing_id(url, "/location/")
}

fn trailing_id(url: &str, segment: &str) -> Option<u32> {
    let (_, tail) = url.rsplit_once(segment)?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}
