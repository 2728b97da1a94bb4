use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::places::models::{
    AddressComponentRow, ComponentQuery, ComponentSort, NewPlace, Place, PlaceId, SortOrder,
};
use crate::features::places::stores::place_index::{validate_max_meters, PlaceIndex};
use crate::shared::constants::COUNTRY_COMPONENT_TYPE;
use crate::shared::types::Page;

#[derive(Default)]
struct PlaceState {
    places: Vec<Place>,
    spatial_index: bool,
}

/// Process-local place index; distances use the haversine formula
#[derive(Default)]
pub struct InMemoryPlaceIndex {
    state: RwLock<PlaceState>,
}

impl InMemoryPlaceIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlaceIndex for InMemoryPlaceIndex {
    async fn create(&self, batch: Vec<NewPlace>) -> Result<Vec<PlaceId>> {
        let mut state = self.state.write().await;
        let ids: Vec<PlaceId> = batch
            .into_iter()
            .map(|record| {
                let id = PlaceId::new();
                state.places.push(record.into_place(id));
                id
            })
            .collect();

        info!("Inserted {} places", ids.len());
        Ok(ids)
    }

    async fn find(&self, id: PlaceId) -> Result<Place> {
        let state = self.state.read().await;
        state
            .places
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Place {} not found", id)))
    }

    async fn list(&self, page: Page) -> Result<Vec<Place>> {
        let state = self.state.read().await;
        Ok(page.apply(state.places.iter().cloned()))
    }

    async fn delete(&self, id: PlaceId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.places.len();
        state.places.retain(|p| p.id != id);
        let removed = (before - state.places.len()) as u64;

        debug!("Deleted place {}: {} removed", id, removed);
        Ok(removed)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state.read().await.places.len() as i64)
    }

    async fn nearest(&self, point: Coordinate, max_meters: Option<f64>) -> Result<Vec<Place>> {
        validate_max_meters(max_meters)?;

        let state = self.state.read().await;
        let mut ranked: Vec<(f64, &Place)> = state
            .places
            .iter()
            .map(|p| (point.distance_to(&p.location), p))
            .filter(|(distance, _)| max_meters.map_or(true, |max| *distance <= max))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked.into_iter().map(|(_, p)| p.clone()).collect())
    }

    async fn create_spatial_index(&self) -> Result<()> {
        self.state.write().await.spatial_index = true;
        Ok(())
    }

    async fn drop_spatial_index(&self) -> Result<()> {
        self.state.write().await.spatial_index = false;
        Ok(())
    }

    async fn spatial_index_exists(&self) -> Result<bool> {
        Ok(self.state.read().await.spatial_index)
    }

    async fn find_by_short_name(&self, name: &str) -> Result<Vec<Place>> {
        let state = self.state.read().await;
        Ok(state
            .places
            .iter()
            .filter(|p| p.has_component(|c| c.short_name == name))
            .cloned()
            .collect())
    }

    async fn address_components(&self, query: ComponentQuery) -> Result<Vec<AddressComponentRow>> {
        let state = self.state.read().await;
        let mut rows: Vec<AddressComponentRow> = state
            .places
            .iter()
            .flat_map(|p| {
                p.address_components
                    .iter()
                    .map(move |c| AddressComponentRow {
                        place_id: p.id,
                        formatted_address: p.formatted_address.clone(),
                        location: p.location,
                        address_component: c.clone(),
                    })
            })
            .collect();

        if let Some(sort) = query.sort {
            rows.sort_by(|a, b| {
                let ordering = sort_key(a, sort).cmp(sort_key(b, sort));
                match sort.order() {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let page = Page::new(query.offset.unwrap_or(0), query.limit);
        Ok(page.apply(rows))
    }

    async fn country_names(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let names: BTreeSet<String> = state
            .places
            .iter()
            .flat_map(|p| p.address_components.iter())
            .filter(|c| c.has_type(COUNTRY_COMPONENT_TYPE))
            .map(|c| c.long_name.clone())
            .collect();

        Ok(names.into_iter().collect())
    }

    async fn find_ids_by_country_code(&self, code: &str) -> Result<Vec<PlaceId>> {
        let state = self.state.read().await;
        Ok(state
            .places
            .iter()
            .filter(|p| {
                p.has_component(|c| c.has_type(COUNTRY_COMPONENT_TYPE) && c.short_name == code)
            })
            .map(|p| p.id)
            .collect())
    }
}

fn sort_key(row: &AddressComponentRow, sort: ComponentSort) -> &str {
    match sort {
        ComponentSort::LongName(_) => &row.address_component.long_name,
        ComponentSort::ShortName(_) => &row.address_component.short_name,
        ComponentSort::FormattedAddress(_) => &row.formatted_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::places::models::AddressComponent;
    use crate::shared::test_helpers::north_of_origin;

    fn origin() -> Coordinate {
        north_of_origin(0.0)
    }

    fn place(address: &str, location: Coordinate, components: Vec<AddressComponent>) -> NewPlace {
        NewPlace::new(address, location, components)
    }

    fn country(name: &str, code: &str) -> AddressComponent {
        AddressComponent::new(name, code, &["country", "political"])
    }

    async fn seeded_by_distance() -> InMemoryPlaceIndex {
        let index = InMemoryPlaceIndex::new();
        // Inserted out of distance order on purpose
        index
            .create(vec![
                place("far", north_of_origin(2000.0), vec![]),
                place("near", north_of_origin(100.0), vec![]),
                place("middle", north_of_origin(500.0), vec![]),
            ])
            .await
            .unwrap();
        index
    }

    fn addresses(places: &[Place]) -> Vec<&str> {
        places.iter().map(|p| p.formatted_address.as_str()).collect()
    }

    #[tokio::test]
    async fn test_nearest_within_radius() {
        let index = seeded_by_distance().await;

        let found = index.nearest(origin(), Some(1000.0)).await.unwrap();

        assert_eq!(addresses(&found), vec!["near", "middle"]);
    }

    #[tokio::test]
    async fn test_nearest_without_radius_returns_all_in_order() {
        let index = seeded_by_distance().await;

        let found = index.nearest(origin(), None).await.unwrap();

        assert_eq!(addresses(&found), vec!["near", "middle", "far"]);
    }

    #[tokio::test]
    async fn test_nearest_one() {
        let index = seeded_by_distance().await;

        let closest = index.nearest_one(origin(), Some(1000.0)).await.unwrap();
        assert_eq!(closest.unwrap().formatted_address, "near");

        let none = index.nearest_one(origin(), Some(50.0)).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_nearest_rejects_negative_radius() {
        let index = seeded_by_distance().await;

        let result = index.nearest(origin(), Some(-5.0)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_find_list_delete() {
        let index = seeded_by_distance().await;
        let all = index.list(Page::all()).await.unwrap();
        assert_eq!(addresses(&all), vec!["far", "near", "middle"]);

        let window = index.list(Page::new(1, Some(1))).await.unwrap();
        assert_eq!(addresses(&window), vec!["near"]);

        let target = all[0].id;
        assert_eq!(index.find(target).await.unwrap().formatted_address, "far");

        assert_eq!(index.delete(target).await.unwrap(), 1);
        assert_eq!(index.delete(target).await.unwrap(), 0);
        assert_eq!(index.count().await.unwrap(), 2);

        let result = index.find(target).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_spatial_index_lifecycle_is_idempotent() {
        let index = InMemoryPlaceIndex::new();
        assert!(!index.spatial_index_exists().await.unwrap());

        index.create_spatial_index().await.unwrap();
        index.create_spatial_index().await.unwrap();
        assert!(index.spatial_index_exists().await.unwrap());

        index.drop_spatial_index().await.unwrap();
        index.drop_spatial_index().await.unwrap();
        assert!(!index.spatial_index_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_country_names_are_distinct() {
        let index = InMemoryPlaceIndex::new();
        index
            .create(vec![
                place("Paris", north_of_origin(0.0), vec![country("France", "FR")]),
                place(
                    "Lyon",
                    north_of_origin(10.0),
                    vec![
                        AddressComponent::new("Lyon", "Lyon", &["locality"]),
                        country("France", "FR"),
                    ],
                ),
            ])
            .await
            .unwrap();

        assert_eq!(index.country_names().await.unwrap(), vec!["France"]);
    }

    #[tokio::test]
    async fn test_find_ids_by_country_code() {
        let index = InMemoryPlaceIndex::new();
        let ids = index
            .create(vec![
                place("Paris", north_of_origin(0.0), vec![country("France", "FR")]),
                place("Berlin", north_of_origin(10.0), vec![country("Germany", "DE")]),
                // "FR" as a non-country short name must not match
                place(
                    "Fake",
                    north_of_origin(20.0),
                    vec![
                        AddressComponent::new("Frisco", "FR", &["locality"]),
                        country("United States", "US"),
                    ],
                ),
            ])
            .await
            .unwrap();

        let found = index.find_ids_by_country_code("FR").await.unwrap();

        assert_eq!(found, vec![ids[0]]);
    }

    #[tokio::test]
    async fn test_find_by_short_name() {
        let index = InMemoryPlaceIndex::new();
        index
            .create(vec![
                place(
                    "Baltimore",
                    north_of_origin(0.0),
                    vec![AddressComponent::new("Maryland", "MD", &["administrative_area_level_1"])],
                ),
                place("Paris", north_of_origin(10.0), vec![country("France", "FR")]),
            ])
            .await
            .unwrap();

        let found = index.find_by_short_name("MD").await.unwrap();

        assert_eq!(addresses(&found), vec!["Baltimore"]);
    }

    #[tokio::test]
    async fn test_address_components_unwinds_sorts_and_pages() {
        let index = InMemoryPlaceIndex::new();
        index
            .create(vec![
                place(
                    "Paris, France",
                    north_of_origin(0.0),
                    vec![
                        AddressComponent::new("Paris", "Paris", &["locality"]),
                        country("France", "FR"),
                    ],
                ),
                place("Berlin, Germany", north_of_origin(10.0), vec![country("Germany", "DE")]),
            ])
            .await
            .unwrap();

        let all = index.address_components(ComponentQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].formatted_address, "Paris, France");

        let sorted = index
            .address_components(ComponentQuery {
                sort: Some(ComponentSort::LongName(SortOrder::Desc)),
                offset: Some(1),
                limit: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].address_component.long_name, "Germany");
        assert_eq!(sorted[0].formatted_address, "Berlin, Germany");
    }
}
