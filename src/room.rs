// room.rs — room records as served by the listings backend, and the panoramas they carry

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RoomError;
use crate::panorama::PanoramaEntry;

/// The backend refuses to store more than this many panoramas per room.
pub const MAX_PANORAMAS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoramaRecord {
    pub url: String,
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: String,
    pub building_id: String,
    pub name: String,
    pub number: String,
    /// Stored as a number server-side, sent as text by some clients.
    #[serde(deserialize_with = "number_or_string")]
    pub size: String,
    pub price: f64,
    pub floor: i32,
    pub description: String,
    pub image_url: String,
    pub panoramas: Vec<PanoramaRecord>,
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Nothing(()),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Nothing(()) => String::new(),
    })
}

impl Room {
    pub fn from_json_str(json: &str) -> Result<Self, RoomError> {
        let room: Room = serde_json::from_str(json)?;
        room.check_panorama_count();
        Ok(room)
    }

    pub fn load(path: &Path) -> Result<Self, RoomError> {
        let text = std::fs::read_to_string(path).map_err(|source| RoomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// GET a single room record.
    pub fn fetch(url: &str, timeout: Duration) -> Result<Self, RoomError> {
        let http = |source| RoomError::Http {
            url: url.to_string(),
            source,
        };
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        let agent = ureq::Agent::new_with_config(config);
        let text = agent
            .get(url)
            .call()
            .map_err(http)?
            .body_mut()
            .read_to_string()
            .map_err(http)?;
        Self::from_json_str(&text)
    }

    fn check_panorama_count(&self) {
        if self.panoramas.len() > MAX_PANORAMAS {
            log::warn!(
                "{}",
                crate::i18n::tr_with(
                    "room.too_many_panoramas",
                    &[
                        ("max", MAX_PANORAMAS.to_string()),
                        ("count", self.panoramas.len().to_string())
                    ]
                )
            );
        }
    }

    /// The room's panoramas in stored order. Oversized lists are shown in full.
    pub fn panorama_entries(&self) -> Vec<PanoramaEntry> {
        self.panoramas
            .iter()
            .map(|p| PanoramaEntry::new(p.url.clone(), p.tag.clone()))
            .collect()
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.number
        } else {
            &self.name
        }
    }
}
