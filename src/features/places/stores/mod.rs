mod memory;
mod place_index;
mod postgres;

pub use memory::InMemoryPlaceIndex;
pub use place_index::{validate_max_meters, PlaceIndex};
pub use postgres::PgPlaceIndex;
