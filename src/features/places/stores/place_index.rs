use async_trait::async_trait;

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::places::models::{AddressComponentRow, ComponentQuery, NewPlace, Place, PlaceId};
use crate::shared::types::Page;

/// Storage port for place documents and their spatial index
#[async_trait]
pub trait PlaceIndex: Send + Sync {
    /// Bulk insert. Not atomic across the batch: a failure part-way leaves
    /// the records inserted so far in place. No duplicate detection.
    async fn create(&self, batch: Vec<NewPlace>) -> Result<Vec<PlaceId>>;

    async fn find(&self, id: PlaceId) -> Result<Place>;

    /// Places in storage order
    async fn list(&self, page: Page) -> Result<Vec<Place>>;

    /// Number of documents removed (0 when the id does not exist)
    async fn delete(&self, id: PlaceId) -> Result<u64>;

    async fn count(&self) -> Result<i64>;

    /// Places ordered by increasing great-circle distance from `point`,
    /// restricted to `max_meters` when given
    async fn nearest(&self, point: Coordinate, max_meters: Option<f64>) -> Result<Vec<Place>>;

    /// The single closest place qualifying for [`PlaceIndex::nearest`]
    async fn nearest_one(
        &self,
        point: Coordinate,
        max_meters: Option<f64>,
    ) -> Result<Option<Place>> {
        Ok(self.nearest(point, max_meters).await?.into_iter().next())
    }

    /// Idempotent
    async fn create_spatial_index(&self) -> Result<()>;

    /// Idempotent
    async fn drop_spatial_index(&self) -> Result<()>;

    async fn spatial_index_exists(&self) -> Result<bool>;

    /// Places having any address component with this short name
    async fn find_by_short_name(&self, name: &str) -> Result<Vec<Place>>;

    /// One row per address component, with its parent place's id, address
    /// and location
    async fn address_components(&self, query: ComponentQuery) -> Result<Vec<AddressComponentRow>>;

    /// Distinct long names of components typed "country"
    async fn country_names(&self) -> Result<Vec<String>>;

    /// Ids of places with a "country" component whose short name is `code`
    async fn find_ids_by_country_code(&self, code: &str) -> Result<Vec<PlaceId>>;
}

pub fn validate_max_meters(max_meters: Option<f64>) -> Result<()> {
    match max_meters {
        Some(m) if !m.is_finite() || m < 0.0 => Err(AppError::Validation(format!(
            "max distance must be a non-negative number of meters, got {}",
            m
        ))),
        _ => Ok(()),
    }
}
