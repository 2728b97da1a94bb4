mod address_component;
mod place;

pub use address_component::{
    AddressComponent, AddressComponentRow, ComponentQuery, ComponentSort, SortOrder,
};
pub use place::{Geometry, NewPlace, Place, PlaceId};
