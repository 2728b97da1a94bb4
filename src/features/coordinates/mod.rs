//! Longitude/latitude pairs and their two wire shapes.
//!
//! Accepted input:
//!
//! - `{"lat": 37.8, "lng": -122.4}`
//! - `{"type": "Point", "coordinates": [-122.4, 37.8]}` (`type` optional)
//!
//! Output is always the GeoJSON point form.

mod coordinate;

pub use coordinate::{Coordinate, GeoPoint, GeoPointType};
