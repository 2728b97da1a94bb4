use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{AppError, Result};
use crate::shared::geo::haversine_distance;

/// Immutable WGS84 position. Replaced wholesale, never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateInput", into = "GeoPoint")]
pub struct Coordinate {
    longitude: f64,
    latitude: f64,
}

/// GeoJSON geometry type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoPointType {
    Point,
}

/// Structured point form: `{"type": "Point", "coordinates": [lng, lat]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: GeoPointType,
    pub coordinates: [f64; 2],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateInput {
    LatLng { lat: f64, lng: f64 },
    // Trailing members (altitude) are ignored
    Point {
        #[serde(default, rename = "type")]
        kind: Option<String>,
        coordinates: Vec<f64>,
    },
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::MalformedCoordinate(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::MalformedCoordinate(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }

        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Parse either accepted wire shape
    pub fn parse(raw: &Value) -> Result<Self> {
        Coordinate::deserialize(raw).map_err(|e| AppError::MalformedCoordinate(e.to_string()))
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Great-circle distance in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl TryFrom<CoordinateInput> for Coordinate {
    type Error = AppError;

    fn try_from(input: CoordinateInput) -> Result<Self> {
        match input {
            CoordinateInput::LatLng { lat, lng } => Coordinate::new(lng, lat),
            CoordinateInput::Point {
                kind: Some(kind), ..
            } if kind != "Point" => Err(AppError::MalformedCoordinate(format!(
                "expected a Point geometry, got {}",
                kind
            ))),
            CoordinateInput::Point { coordinates, .. } => match coordinates.as_slice() {
                [lng, lat, ..] => Coordinate::new(*lng, *lat),
                _ => Err(AppError::MalformedCoordinate(format!(
                    "expected [longitude, latitude], got {} value(s)",
                    coordinates.len()
                ))),
            },
        }
    }
}

impl From<Coordinate> for GeoPoint {
    fn from(c: Coordinate) -> Self {
        GeoPoint {
            kind: GeoPointType::Point,
            coordinates: [c.longitude, c.latitude],
        }
    }
}

impl TryFrom<GeoPoint> for Coordinate {
    type Error = AppError;

    fn try_from(point: GeoPoint) -> Result<Self> {
        let [lng, lat] = point.coordinates;
        Coordinate::new(lng, lat)
    }
}
