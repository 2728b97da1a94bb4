//! Place records with a sphere-aware spatial index.
//!
//! Places are bulk-imported from a JSON array and queried read-only
//! afterwards (nearest-neighbour, address component reporting), except for
//! deletion.

pub mod models;
pub mod services;
pub mod stores;

pub use models::{
    AddressComponent, AddressComponentRow, ComponentQuery, ComponentSort, NewPlace, Place,
    PlaceId, SortOrder,
};
pub use services::PlaceService;
pub use stores::{InMemoryPlaceIndex, PgPlaceIndex, PlaceIndex};
