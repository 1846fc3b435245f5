//! Domain DTOs for the characters API.
//!
//! # Design
//! These types mirror the remote schema but are defined independently of the
//! mock-server crate. Integration tests catch any schema drift between the two.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Life status of a character. Unrecognized wire values map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterStatus {
    Alive,
    Dead,
    Unknown,
}

impl CharacterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CharacterStatus::Alive => "Alive",
            CharacterStatus::Dead => "Dead",
            CharacterStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alive" => Ok(CharacterStatus::Alive),
            "dead" => Ok(CharacterStatus::Dead),
            "unknown" => Ok(CharacterStatus::Unknown),
            other => Err(format!("unrecognized character status: {other}")),
        }
    }
}

impl Serialize for CharacterStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CharacterStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(CharacterStatus::Unknown))
    }
}

/// Reference to a related resource. `url` is empty when the resource is unknown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// A single character returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub id: u32,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub gender: String,
    pub origin: ResourceRef,
    pub location: ResourceRef,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub episode: Vec<String>,
    #[serde(default)]
    pub url: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    pub id: u32,
    pub name: String,
    pub air_date: String,
    /// Season/episode code, e.g. `S01E01`.
    pub episode: String,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub url: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub dimension: String,
    #[serde(default)]
    pub residents: Vec<String>,
    #[serde(default)]
    pub url: String,
    pub created: DateTime<Utc>,
}

/// Pagination envelope metadata of a list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageInfo {
    pub count: u32,
    pub pages: u32,
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// A page of results from a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    #[serde(default)]
    pub info: PageInfo,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// The batch endpoints answer with a bare object for one id and an array for
/// several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RICK: &str = r#"{
        "id": 1,
        "name": "Rick Sanchez",
        "status": "Alive",
        "species": "Human",
        "type": "",
        "gender": "Male",
        "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
        "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
        "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
        "episode": ["https://rickandmortyapi.com/api/episode/1", "https://rickandmortyapi.com/api/episode/2"],
        "url": "https://rickandmortyapi.com/api/character/1",
        "created": "2017-11-04T18:48:46.250Z"
    }"#;

    #[test]
    fn character_deserializes_from_api_shape() {
        let rick: Character = serde_json::from_str(RICK).unwrap();
        assert_eq!(rick.id, 1);
        assert_eq!(rick.status, CharacterStatus::Alive);
        assert_eq!(rick.location.name, "Citadel of Ricks");
        assert_eq!(rick.episode.len(), 2);
        assert_eq!(rick.created.timestamp(), 1_509_821_326);
    }

    #[test]
    fn status_parses_case_insensitively_and_defaults_to_unknown() {
        assert_eq!("alive".parse::<CharacterStatus>().unwrap(), CharacterStatus::Alive);
        assert_eq!(" DEAD ".parse::<CharacterStatus>().unwrap(), CharacterStatus::Dead);
        assert!("zombie".parse::<CharacterStatus>().is_err());

        let status: CharacterStatus = serde_json::from_str(r#""zombie""#).unwrap();
        assert_eq!(status, CharacterStatus::Unknown);
        assert_eq!(serde_json::to_string(&CharacterStatus::Unknown).unwrap(), r#""unknown""#);
    }

    #[test]
    fn one_or_many_normalizes_both_shapes() {
        let one: OneOrMany<PageInfo> =
            serde_json::from_str(r#"{"count":1,"pages":1,"next":null,"prev":null}"#).unwrap();
        assert_eq!(one.into_vec().len(), 1);

        let many: OneOrMany<PageInfo> = serde_json::from_str(
            r#"[{"count":1,"pages":1,"next":null,"prev":null},{"count":2,"pages":1,"next":null,"prev":null}]"#,
        )
        .unwrap();
        let items = many.into_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].count, 2);
    }

    #[test]
    fn page_tolerates_missing_envelope_fields() {
        let page: Page<Character> = serde_json::from_str("{}").unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.info.pages, 0);
    }
}
