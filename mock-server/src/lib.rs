use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;
use url::form_urlencoded;

/// Root used in the resource URLs the server hands out.
pub const RESOURCE_ROOT: &str = "https://rickandmortyapi.com/api";
pub const PAGE_SIZE: usize = 20;

const CREATED: &str = "2017-11-04T18:48:46.250Z";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceRef {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub status: String,
    pub species: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub gender: String,
    pub origin: ResourceRef,
    pub location: ResourceRef,
    pub image: String,
    pub episode: Vec<String>,
    pub url: String,
    pub created: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Episode {
    pub id: u32,
    pub name: String,
    pub air_date: String,
    pub episode: String,
    pub characters: Vec<String>,
    pub url: String,
    pub created: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub dimension: String,
    pub residents: Vec<String>,
    pub url: String,
    pub created: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: usize,
    pub pages: usize,
    pub next: Option<String>,
    pub prev: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub info: PageInfo,
    pub results: Vec<T>,
}

/// In-memory data served by the mock. Read-only once the router is built.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub characters: BTreeMap<u32, Character>,
    pub episodes: BTreeMap<u32, Episode>,
    pub locations: BTreeMap<u32, Location>,
}

impl Dataset {
    /// 26 characters (two pages), 10 episodes, 4 locations.
    ///
    /// Character 7 lives in location 21 and character 8 appears in episode
    /// 28; neither exists, so their related lookups come back 404.
    pub fn sample() -> Self {
        let mut data = Dataset::default();

        for (id, name, kind, dimension) in [
            (1, "Earth (C-137)", "Planet", "Dimension C-137"),
            (2, "Abadango", "Cluster", "unknown"),
            (3, "Citadel of Ricks", "Space station", "unknown"),
            (20, "Earth (Replacement Dimension)", "Planet", "Replacement Dimension"),
        ] {
            data.add_location(id, name, kind, dimension);
        }

        for (id, name, air_date, code) in [
            (1, "Pilot", "December 2, 2013", "S01E01"),
            (2, "Lawnmower Dog", "December 9, 2013", "S01E02"),
            (3, "Anatomy Park", "December 16, 2013", "S01E03"),
            (4, "M. Night Shaym-Aliens!", "January 13, 2014", "S01E04"),
            (5, "Meeseeks and Destroy", "January 20, 2014", "S01E05"),
            (6, "Rick Potion #9", "January 27, 2014", "S01E06"),
            (7, "Raising Gazorpazorp", "March 10, 2014", "S01E07"),
            (8, "Rixty Minutes", "March 17, 2014", "S01E08"),
            (9, "Something Ricked This Way Comes", "March 24, 2014", "S01E09"),
            (10, "Close Rick-counters of the Rick Kind", "April 7, 2014", "S01E10"),
        ] {
            data.add_episode(id, name, air_date, code);
        }

        let all: Vec<u32> = (1..=10).collect();
        data.add_character(1, "Rick Sanchez", "Alive", "Human", "Male", Some(1), Some(3), &all);
        data.add_character(2, "Morty Smith", "Alive", "Human", "Male", None, Some(3), &all);
        data.add_character(3, "Summer Smith", "Alive", "Human", "Female", Some(20), Some(20), &[6, 7, 8, 9, 10]);
        data.add_character(4, "Beth Smith", "Alive", "Human", "Female", Some(20), Some(20), &[6, 7]);
        data.add_character(5, "Jerry Smith", "Alive", "Human", "Male", Some(20), Some(20), &[6]);
        data.add_character(6, "Abadango Cluster Princess", "Alive", "Alien", "Female", Some(2), Some(2), &[10]);
        data.add_character(7, "Abradolf Lincler", "unknown", "Human", "Male", Some(20), Some(21), &[10]);
        data.add_character(8, "Adjudicator Rick", "Dead", "Human", "Male", None, Some(3), &[28]);
        for id in 9..=26u32 {
            let status = ["Alive", "Dead", "unknown"][(id % 3) as usize];
            let name = format!("Citadel Rick {id}");
            data.add_character(id, &name, status, "Human", "Male", None, Some(3), &[id % 10 + 1]);
        }

        data
    }

    pub fn add_location(&mut self, id: u32, name: &str, kind: &str, dimension: &str) {
        self.locations.insert(
            id,
            Location {
                id,
                name: name.to_string(),
                kind: kind.to_string(),
                dimension: dimension.to_string(),
                residents: Vec::new(),
                url: resource_url("location", id),
                created: CREATED.to_string(),
            },
        );
    }

    pub fn add_episode(&mut self, id: u32, name: &str, air_date: &str, code: &str) {
        self.episodes.insert(
            id,
            Episode {
                id,
                name: name.to_string(),
                air_date: air_date.to_string(),
                episode: code.to_string(),
                characters: Vec::new(),
                url: resource_url("episode", id),
                created: CREATED.to_string(),
            },
        );
    }

    /// Insert a character and link it from the episodes and location that
    /// exist. `None` for origin or location means "unknown".
    #[allow(clippy::too_many_arguments)]
    pub fn add_character(
        &mut self,
        id: u32,
        name: &str,
        status: &str,
        species: &str,
        gender: &str,
        origin: Option<u32>,
        location: Option<u32>,
        episodes: &[u32],
    ) {
        let url = resource_url("character", id);
        for episode_id in episodes {
            if let Some(episode) = self.episodes.get_mut(episode_id) {
                episode.characters.push(url.clone());
            }
        }
        if let Some(place) = location.and_then(|loc| self.locations.get_mut(&loc)) {
            place.residents.push(url.clone());
        }

        let character = Character {
            id,
            name: name.to_string(),
            status: status.to_string(),
            species: species.to_string(),
            kind: String::new(),
            gender: gender.to_string(),
            origin: self.location_ref(origin),
            location: self.location_ref(location),
            image: format!("{RESOURCE_ROOT}/character/avatar/{id}.jpeg"),
            episode: episodes.iter().map(|e| resource_url("episode", *e)).collect(),
            url,
            created: CREATED.to_string(),
        };
        self.characters.insert(id, character);
    }

    fn location_ref(&self, id: Option<u32>) -> ResourceRef {
        match id {
            None => ResourceRef {
                name: "unknown".to_string(),
                url: String::new(),
            },
            Some(id) => ResourceRef {
                name: self
                    .locations
                    .get(&id)
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| format!("Location {id}")),
                url: resource_url("location", id),
            },
        }
    }
}

fn resource_url(kind: &str, id: u32) -> String {
    format!("{RESOURCE_ROOT}/{kind}/{id}")
}

/// Query parameters of `GET /character`.
#[derive(Debug, Default, Deserialize)]
pub struct CharacterQuery {
    pub page: Option<u32>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub species: Option<String>,
}

impl CharacterQuery {
    fn filters(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name", self.name.as_deref()),
            ("status", self.status.as_deref()),
            ("species", self.species.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.trim();
            (!value.is_empty()).then_some((key, value))
        })
    }

    pub fn matches(&self, character: &Character) -> bool {
        self.filters().all(|(key, value)| match key {
            "name" => contains_ignore_case(&character.name, value),
            "species" => contains_ignore_case(&character.species, value),
            _ => character.status.eq_ignore_ascii_case(value),
        })
    }

    /// Absolute URL of `page` under the same filters.
    pub fn page_url(&self, page: usize) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &page.to_string());
        for (key, value) in self.filters() {
            query.append_pair(key, value);
        }
        format!("{RESOURCE_ROOT}/character/?{}", query.finish())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub type Db = Arc<Dataset>;

pub fn app() -> Router {
    app_with(Dataset::sample())
}

pub fn app_with(dataset: Dataset) -> Router {
    let db: Db = Arc::new(dataset);
    Router::new()
        .route("/character", get(list_characters))
        .route("/character/{ids}", get(get_characters))
        .route("/episode/{ids}", get(get_episodes))
        .route("/location/{ids}", get(get_locations))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn list_characters(State(db): State<Db>, Query(query): Query<CharacterQuery>) -> Response {
    let matching: Vec<&Character> = db.characters.values().filter(|c| query.matches(c)).collect();
    let count = matching.len();
    let pages = count.div_ceil(PAGE_SIZE);
    let page = query.page.unwrap_or(1) as usize;
    debug!(?query, count, page, "listing characters");

    if count == 0 || page == 0 || page > pages {
        return error_response(StatusCode::NOT_FOUND, "There is nothing here");
    }

    let results: Vec<Character> = matching
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();
    let info = PageInfo {
        count,
        pages,
        next: (page < pages).then(|| query.page_url(page + 1)),
        prev: (page > 1).then(|| query.page_url(page - 1)),
    };
    Json(Page { info, results }).into_response()
}

async fn get_characters(State(db): State<Db>, Path(ids): Path<String>) -> Response {
    lookup(&db.characters, &ids, "Character not found")
}

async fn get_episodes(State(db): State<Db>, Path(ids): Path<String>) -> Response {
    lookup(&db.episodes, &ids, "Episode not found")
}

async fn get_locations(State(db): State<Db>, Path(ids): Path<String>) -> Response {
    lookup(&db.locations, &ids, "Location not found")
}

/// A single id answers with the object (or 404); a comma list answers with
/// an array of whatever exists.
fn lookup<T: Serialize + Clone>(items: &BTreeMap<u32, T>, ids: &str, missing: &str) -> Response {
    if ids.contains(',') {
        let found: Vec<T> = ids
            .split(',')
            .filter_map(|id| id.trim().parse::<u32>().ok())
            .filter_map(|id| items.get(&id).cloned())
            .collect();
        return Json(found).into_response();
    }

    let Ok(id) = ids.trim().parse::<u32>() else {
        return error_response(StatusCode::BAD_REQUEST, "Hey! you must provide an id");
    };
    match items.get(&id) {
        Some(item) => Json(item.clone()).into_response(),
        None => error_response(StatusCode::NOT_FOUND, missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(name: Option<&str>, status: Option<&str>, species: Option<&str>) -> CharacterQuery {
        CharacterQuery {
            page: None,
            name: name.map(str::to_string),
            status: status.map(str::to_string),
            species: species.map(str::to_string),
        }
    }

    #[test]
    fn sample_dataset_spans_two_pages() {
        let data = Dataset::sample();
        assert_eq!(data.characters.len(), 26);
        assert_eq!(data.characters.len().div_ceil(PAGE_SIZE), 2);
        assert_eq!(data.episodes.len(), 10);
    }

    #[test]
    fn add_character_links_episodes_and_residents() {
        let data = Dataset::sample();
        let pilot = &data.episodes[&1];
        assert!(pilot.characters.contains(&resource_url("character", 1)));
        let citadel = &data.locations[&3];
        assert!(citadel.residents.contains(&resource_url("character", 2)));

        let morty = &data.characters[&2];
        assert_eq!(morty.origin.name, "unknown");
        assert!(morty.origin.url.is_empty());
        assert_eq!(morty.location.url, "https://rickandmortyapi.com/api/location/3");
    }

    #[test]
    fn query_matches_case_insensitively() {
        let data = Dataset::sample();
        let rick = &data.characters[&1];
        assert!(query(Some("RICK"), None, None).matches(rick));
        assert!(query(None, Some("alive"), Some("hum")).matches(rick));
        assert!(!query(None, Some("dead"), None).matches(rick));
        assert!(query(Some("  "), None, None).matches(rick));
    }

    #[test]
    fn page_url_carries_filters() {
        let q = query(Some("rick sanchez"), None, Some("Human"));
        assert_eq!(
            q.page_url(2),
            "https://rickandmortyapi.com/api/character/?page=2&name=rick+sanchez&species=Human"
        );
    }

    #[test]
    fn character_serializes_type_field() {
        let data = Dataset::sample();
        let json = serde_json::to_value(&data.characters[&1]).unwrap();
        assert_eq!(json["type"], "");
        assert_eq!(json["status"], "Alive");
        assert_eq!(json["episode"].as_array().unwrap().len(), 10);
    }
}
