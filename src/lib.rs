//! Geotagged photos linked to the nearest known place.
//!
//! Photo binaries and their metadata live in a content store, places in a
//! sphere-aware spatial index; the association service connects the two.

pub mod core;
pub mod features;
pub mod modules;
pub mod shared;
