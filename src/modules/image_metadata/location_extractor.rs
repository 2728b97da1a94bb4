use std::io::Cursor;

use exif::{Exif, In, Reader, Tag, Value};
use tracing::debug;

use crate::core::error::{AppError, Result};

/// Raw geolocation read from image metadata, not yet range checked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractedLocation {
    pub longitude: f64,
    pub latitude: f64,
}

/// Yields the geolocation embedded in image bytes
pub trait LocationExtractor: Send + Sync {
    /// Fails with `AppError::Extraction` when no usable geolocation is present
    fn extract(&self, contents: &[u8]) -> Result<ExtractedLocation>;
}

/// Reads the GPS IFD of JPEG/TIFF images
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifLocationExtractor;

impl ExifLocationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LocationExtractor for ExifLocationExtractor {
    fn extract(&self, contents: &[u8]) -> Result<ExtractedLocation> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(contents))
            .map_err(|e| AppError::Extraction(format!("Unreadable image metadata: {}", e)))?;

        let latitude = signed_degrees(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
        let longitude = signed_degrees(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;

        debug!("Extracted GPS location: lng={}, lat={}", longitude, latitude);
        Ok(ExtractedLocation {
            longitude,
            latitude,
        })
    }
}

/// Degrees from a (degrees, minutes, seconds) triple, negated when the
/// reference tag equals `negative_ref`
fn signed_degrees(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Result<f64> {
    let field = exif
        .get_field(tag, In::PRIMARY)
        .ok_or_else(|| AppError::Extraction(format!("Missing {}", tag)))?;

    let parts: Vec<f64> = match &field.value {
        Value::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
        Value::SRational(values) => values.iter().map(|r| r.to_f64()).collect(),
        _ => {
            return Err(AppError::Extraction(format!(
                "{} is not a rational value",
                tag
            )))
        }
    };
    let degrees = dms_to_degrees(&parts)
        .ok_or_else(|| AppError::Extraction(format!("Invalid {} value", tag)))?;

    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .ok_or_else(|| AppError::Extraction(format!("Missing {}", ref_tag)))?;
    let reference = match &reference.value {
        Value::Ascii(strings) => strings.first().and_then(|s| s.first().copied()),
        _ => None,
    }
    .ok_or_else(|| AppError::Extraction(format!("Invalid {} value", ref_tag)))?;

    if reference.eq_ignore_ascii_case(&negative_ref) {
        Ok(-degrees)
    } else {
        Ok(degrees)
    }
}

/// Missing minutes/seconds count as zero; non-finite parts are rejected
fn dms_to_degrees(parts: &[f64]) -> Option<f64> {
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let degrees = parts[0];
    let minutes = parts.get(1).copied().unwrap_or(0.0);
    let seconds = parts.get(2).copied().unwrap_or(0.0);
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}
