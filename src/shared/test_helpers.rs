#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::core::error::{AppError, Result};
#[cfg(test)]
use crate::features::coordinates::Coordinate;
#[cfg(test)]
use crate::features::photos::{InMemoryContentStore, PhotoService};
#[cfg(test)]
use crate::features::places::PlaceIndex;
#[cfg(test)]
use crate::modules::image_metadata::{ExtractedLocation, LocationExtractor};

/// Meters per degree of latitude on the haversine sphere
#[cfg(test)]
pub const METERS_PER_DEGREE: f64 = 111_194.926_644_558_7;

/// A point `meters` due north of (-122.4, 37.8)
#[cfg(test)]
pub fn north_of_origin(meters: f64) -> Coordinate {
    Coordinate::new(-122.4, 37.8 + meters / METERS_PER_DEGREE).unwrap()
}

/// Reads "lng,lat" from the image bytes; anything else has no location
#[cfg(test)]
pub struct TextLocationExtractor;

#[cfg(test)]
impl LocationExtractor for TextLocationExtractor {
    fn extract(&self, contents: &[u8]) -> Result<ExtractedLocation> {
        let text = std::str::from_utf8(contents)
            .map_err(|_| AppError::Extraction("not text".to_string()))?;
        let (lng, lat) = text
            .split_once(',')
            .ok_or_else(|| AppError::Extraction("no location".to_string()))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| AppError::Extraction(format!("bad number {}", v)))
        };
        Ok(ExtractedLocation {
            longitude: parse(lng)?,
            latitude: parse(lat)?,
        })
    }
}

/// Photo service over an in-memory store and the text extractor
#[cfg(test)]
pub fn photo_service(places: Arc<dyn PlaceIndex>) -> PhotoService {
    PhotoService::new(
        Arc::new(InMemoryContentStore::new()),
        Arc::new(TextLocationExtractor),
        places,
    )
}
