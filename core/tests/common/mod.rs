//! In-memory transports and JSON fixtures shared by the controller tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use characters_core::{ApiClient, ApiError, CharacterClient, HttpRequest, HttpResponse, Transport};
use serde_json::{json, Value};
use tokio::sync::oneshot;

pub const BASE_URL: &str = "http://localhost:3000/api";
pub const ROOT: &str = "https://rickandmortyapi.com/api";

pub fn api<T: Transport>(transport: T) -> ApiClient<T> {
    ApiClient::new(CharacterClient::new(BASE_URL), transport)
}

pub fn ok(body: &Value) -> HttpResponse {
    with_status(200, body)
}

pub fn with_status(status: u16, body: &Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

/// Answers each path with a fixed, replaceable result and records every
/// requested path. Unscripted paths fail as transport errors.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, ApiError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: Value) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(with_status(status, &body)));
    }

    pub fn fail(&self, path: &str, message: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(ApiError::transport(path, message)));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<String> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.path.clone());
        self.routes
            .lock()
            .unwrap()
            .get(&request.path)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::transport(&request.path, "unscripted request")))
    }
}

/// Holds every request until the test releases it, so completion order is
/// under the test's control.
#[derive(Default)]
pub struct GatedTransport {
    pending: Mutex<Vec<(String, oneshot::Sender<Result<HttpResponse, ApiError>>)>>,
}

impl GatedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pending_paths(&self) -> Vec<String> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub async fn wait_for_pending(&self, count: usize) {
        while self.pending.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }

    /// Complete the pending request for `path`. Returns false if none is waiting.
    pub fn release(&self, path: &str, result: Result<HttpResponse, ApiError>) -> bool {
        let mut pending = self.pending.lock().unwrap();
        let Some(index) = pending.iter().position(|(p, _)| p == path) else {
            return false;
        };
        let (_, sender) = pending.remove(index);
        sender.send(result).is_ok()
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let (sender, receiver) = oneshot::channel();
        self.pending
            .lock()
            .unwrap()
            .push((request.path.clone(), sender));
        receiver
            .await
            .unwrap_or_else(|_| Err(ApiError::transport(&request.path, "gate dropped")))
    }
}

pub fn character(id: u32, name: &str, episodes: &[u32], location_url: &str) -> Value {
    let episode_urls: Vec<String> = episodes.iter().map(|e| format!("{ROOT}/episode/{e}")).collect();
    json!({
        "id": id,
        "name": name,
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "unknown", "url": ""},
        "location": {"name": "Citadel of Ricks", "url": location_url},
        "image": format!("{ROOT}/character/avatar/{id}.jpeg"),
        "episode": episode_urls,
        "url": format!("{ROOT}/character/{id}"),
        "created": "2017-11-04T18:48:46.250Z"
    })
}

pub fn episode(id: u32) -> Value {
    json!({
        "id": id,
        "name": format!("Episode {id}"),
        "air_date": "December 2, 2013",
        "episode": format!("S01E{id:02}"),
        "characters": [],
        "url": format!("{ROOT}/episode/{id}"),
        "created": "2017-11-10T12:56:33.798Z"
    })
}

pub fn location(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": "Space station",
        "dimension": "unknown",
        "residents": [],
        "url": format!("{ROOT}/location/{id}"),
        "created": "2017-11-10T13:08:13.191Z"
    })
}

pub fn page(results: Vec<Value>, pages: u32, count: u32, next: Option<&str>, prev: Option<&str>) -> Value {
    json!({
        "info": {"count": count, "pages": pages, "next": next, "prev": prev},
        "results": results
    })
}

pub fn named(ids_and_names: &[(u32, &str)]) -> Vec<Value> {
    ids_and_names
        .iter()
        .map(|(id, name)| character(*id, name, &[1], &format!("{ROOT}/location/3")))
        .collect()
}
