//! Embedded image metadata (EXIF) reading
//!
//! The photo service only depends on [`LocationExtractor`]; the kamadak-exif
//! backed implementation lives here so it can be swapped out in tests.

mod location_extractor;

pub use location_extractor::{ExifLocationExtractor, ExtractedLocation, LocationExtractor};
