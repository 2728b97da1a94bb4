use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::places::models::AddressComponent;

/// Opaque key of a place document
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PlaceId(Uuid);

impl PlaceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Resolve a textual key. This is the only fallible way to obtain a
    /// `PlaceId`; `Uuid` and `&Place` convert infallibly.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid place id '{}': {}", raw, e)))
    }
}

impl Default for PlaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PlaceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<&Place> for PlaceId {
    fn from(place: &Place) -> Self {
        place.id
    }
}

impl FromStr for PlaceId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored place
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: PlaceId,
    pub formatted_address: String,
    pub location: Coordinate,
    pub address_components: Vec<AddressComponent>,
}

impl Place {
    pub fn has_component(&self, predicate: impl Fn(&AddressComponent) -> bool) -> bool {
        self.address_components.iter().any(predicate)
    }
}

/// Nested geolocation holder of an import record (`geometry.geolocation`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Geometry {
    pub geolocation: Coordinate,
}

/// A place record as found in the bulk import file.
///
/// Deserialization fails when `geometry.geolocation` is missing or is not
/// a valid coordinate, so a `NewPlace` always carries a location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlace {
    #[serde(default, alias = "formatted_address")]
    pub formatted_address: String,
    pub geometry: Geometry,
    #[serde(default, alias = "address_components")]
    pub address_components: Vec<AddressComponent>,
}

impl NewPlace {
    pub fn new(
        formatted_address: impl Into<String>,
        location: Coordinate,
        address_components: Vec<AddressComponent>,
    ) -> Self {
        Self {
            formatted_address: formatted_address.into(),
            geometry: Geometry {
                geolocation: location,
            },
            address_components,
        }
    }

    pub fn from_value(raw: &Value) -> Result<Self> {
        NewPlace::deserialize(raw)
            .map_err(|e| AppError::Validation(format!("Invalid place record: {}", e)))
    }

    pub fn location(&self) -> Coordinate {
        self.geometry.geolocation
    }

    pub fn into_place(self, id: PlaceId) -> Place {
        Place {
            id,
            location: self.geometry.geolocation,
            formatted_address: self.formatted_address,
            address_components: self.address_components,
        }
    }
}
