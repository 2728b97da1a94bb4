use serde::{Deserialize, Serialize};

use crate::features::coordinates::Coordinate;
use crate::features::places::models::PlaceId;

/// One entry of a place's structured address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponent {
    #[serde(default, alias = "long_name")]
    pub long_name: String,
    #[serde(default, alias = "short_name")]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(
        long_name: impl Into<String>,
        short_name: impl Into<String>,
        types: &[&str],
    ) -> Self {
        Self {
            long_name: long_name.into(),
            short_name: short_name.into(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// One address component paired with its parent place
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponentRow {
    pub place_id: PlaceId,
    pub formatted_address: String,
    pub location: Coordinate,
    pub address_component: AddressComponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentSort {
    LongName(SortOrder),
    ShortName(SortOrder),
    FormattedAddress(SortOrder),
}

impl ComponentSort {
    pub fn order(&self) -> SortOrder {
        match self {
            ComponentSort::LongName(o)
            | ComponentSort::ShortName(o)
            | ComponentSort::FormattedAddress(o) => *o,
        }
    }
}

/// Sort/window options for the flattened address component listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentQuery {
    pub sort: Option<ComponentSort>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}
