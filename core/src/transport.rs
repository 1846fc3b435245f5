//! Executing requests built by `CharacterClient`.
//!
//! `Transport` is the seam between the deterministic core and the network.
//! `ReqwestTransport` is the production implementation; tests plug in
//! in-memory ones. `ApiClient` pairs a transport with a `CharacterClient`
//! and is what the controllers talk to.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::CharacterClient;
use crate::error::ApiError;
use crate::filters::FilterState;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
use crate::types::{Character, Episode, Location, Page};

/// Performs one HTTP round trip.
///
/// Implementations return every received response as data, whatever its
/// status; only a request that never completed is an error
/// (`ApiError::Transport`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request).await
    }
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::transport(&request.path, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (key.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(&request.path, e))?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Async client for the characters API: builds with `CharacterClient`,
/// executes with `T`, parses the result.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    client: CharacterClient,
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(client: CharacterClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &CharacterClient {
        &self.client
    }

    /// Fetch `path` and hand back the JSON body as-is.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let request = self.client.build_request(path, options);
        let response = self.send(request).await?;
        self.client.parse_json(path, response)
    }

    pub async fn list_characters(&self, page: u32, filters: &FilterState) -> Result<Page<Character>, ApiError> {
        let request = self.client.build_list_characters(page, filters);
        let path = request.path.clone();
        let response = self.send(request).await?;
        let page_data = self.client.parse_list_characters(&path, response)?;
        info!(
            count = page_data.results.len(),
            total_pages = page_data.info.pages,
            "characters fetched"
        );
        Ok(page_data)
    }

    pub async fn get_character(&self, id: u32) -> Result<Character, ApiError> {
        let request = self.client.build_get_character(id)?;
        let path = request.path.clone();
        let response = self.send(request).await?;
        let character = self.client.parse_get_character(&path, response)?;
        info!(id, name = %character.name, episodes = character.episode.len(), "character fetched");
        Ok(character)
    }

    pub async fn get_characters(&self, ids: &[u32]) -> Result<Vec<Character>, ApiError> {
        let request = self.client.build_get_characters(ids)?;
        let path = request.path.clone();
        let response = self.send(request).await?;
        self.client.parse_get_characters(&path, response)
    }

    /// Episodes for `ids` in one request; an empty id list yields an empty
    /// result without touching the network.
    pub async fn get_episodes(&self, ids: &[u32]) -> Result<Vec<Episode>, ApiError> {
        let Some(request) = self.client.build_get_episodes(ids) else {
            return Ok(Vec::new());
        };
        let path = request.path.clone();
        let response = self.send(request).await?;
        let episodes = self.client.parse_get_episodes(&path, response)?;
        debug!(requested = ids.len(), fetched = episodes.len(), "episodes fetched");
        Ok(episodes)
    }

    pub async fn get_location(&self, id: u32) -> Result<Location, ApiError> {
        let request = self.client.build_get_location(id);
        let path = request.path.clone();
        let response = self.send(request).await?;
        self.client.parse_get_location(&path, response)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method.as_str();
        let path = request.path.clone();
        let started = Instant::now();
        debug!(method, path = %path, "sending API request");

        match self.transport.execute(request).await {
            Ok(response) => {
                debug!(
                    path = %path,
                    status = response.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "API request completed"
                );
                Ok(response)
            }
            Err(err) => {
                warn!(
                    path = %path,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "API request failed"
                );
                Err(err)
            }
        }
    }
}
