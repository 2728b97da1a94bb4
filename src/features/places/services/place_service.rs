use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::photos::{ContentStore, Photo};
use crate::features::places::models::{NewPlace, Place, PlaceId};
use crate::features::places::stores::PlaceIndex;
use crate::shared::types::Page;

/// Place import and the place-side view of the photo association
pub struct PlaceService {
    index: Arc<dyn PlaceIndex>,
    photos: Arc<dyn ContentStore>,
}

impl PlaceService {
    pub fn new(index: Arc<dyn PlaceIndex>, photos: Arc<dyn ContentStore>) -> Self {
        Self { index, photos }
    }

    pub fn index(&self) -> &Arc<dyn PlaceIndex> {
        &self.index
    }

    /// Parse a JSON array of place records
    pub fn parse_records(json: &str) -> Result<Vec<NewPlace>> {
        serde_json::from_str::<Vec<NewPlace>>(json)
            .map_err(|e| AppError::Import(format!("Invalid places document: {}", e)))
    }

    /// Bulk load a JSON file of place records.
    ///
    /// Re-running against a non-empty index inserts duplicates. A failure
    /// part-way through leaves the earlier records stored; compare
    /// [`PlaceIndex::count`] with the expected total to detect it.
    pub async fn load_all(&self, path: impl AsRef<Path>) -> Result<Vec<PlaceId>> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            tracing::error!("Failed to read places file {}: {:?}", path.display(), e);
            AppError::Import(format!("Cannot read {}: {}", path.display(), e))
        })?;

        let records = Self::parse_records(&json)?;
        info!(
            "Loading {} place records from {}",
            records.len(),
            path.display()
        );

        self.index.create(records).await
    }

    /// Photos referencing `place`; the store applies the window before any
    /// document is materialized into a `Photo`
    pub async fn photos(&self, place: PlaceId, page: Page) -> Result<Vec<Photo>> {
        let documents = self.photos.find_by_place(place, page).await?;
        debug!("Place {} photo window {:?}: {}", place, page, documents.len());

        Ok(documents.into_iter().map(Photo::from).collect())
    }

    /// Places nearest to an existing place (the place itself included)
    pub async fn near(&self, place: &Place, max_meters: Option<f64>) -> Result<Vec<Place>> {
        self.index.nearest(place.location, max_meters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::coordinates::Coordinate;
    use crate::features::photos::InMemoryContentStore;
    use crate::features::places::stores::InMemoryPlaceIndex;
    use std::io::Write;

    const PLACES_JSON: &str = r#"[
        {
            "formatted_address": "Baltimore, MD, USA",
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.6122, 39.2904]}},
            "address_components": [
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
            ]
        },
        {
            "formatted_address": "Towson, MD, USA",
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.6019, 39.4015]}},
            "address_components": []
        }
    ]"#;

    fn service() -> PlaceService {
        PlaceService::new(
            Arc::new(InMemoryPlaceIndex::new()),
            Arc::new(InMemoryContentStore::new()),
        )
    }

    #[tokio::test]
    async fn test_load_all_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLACES_JSON.as_bytes()).unwrap();
        let service = service();

        let ids = service.load_all(file.path()).await.unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(service.index().count().await.unwrap(), 2);
        let first = service.index().find(ids[0]).await.unwrap();
        assert_eq!(first.formatted_address, "Baltimore, MD, USA");
    }

    #[tokio::test]
    async fn test_load_all_twice_duplicates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLACES_JSON.as_bytes()).unwrap();
        let service = service();

        service.load_all(file.path()).await.unwrap();
        service.load_all(file.path()).await.unwrap();

        assert_eq!(service.index().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_load_all_missing_file() {
        let result = service().load_all("/definitely/not/here.json").await;

        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[test]
    fn test_parse_records_rejects_place_without_location() {
        let result = PlaceService::parse_records(r#"[{"formatted_address": "Nowhere"}]"#);

        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[tokio::test]
    async fn test_photos_for_place_are_paged() {
        let index: Arc<dyn PlaceIndex> = Arc::new(InMemoryPlaceIndex::new());
        let store: Arc<dyn ContentStore> = Arc::new(InMemoryContentStore::new());
        let service = PlaceService::new(Arc::clone(&index), Arc::clone(&store));
        let location = Coordinate::new(-76.6122, 39.2904).unwrap();
        let ids = index
            .create(vec![NewPlace::new("Baltimore", location, vec![])])
            .await
            .unwrap();
        let place = ids[0];

        for i in 0..3u8 {
            store.create(vec![i], location, Some(place)).await.unwrap();
        }
        store.create(vec![9], location, None).await.unwrap();

        let all = service.photos(place, Page::all()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|p| p.place == Some(place)));

        let window = service.photos(place, Page::new(1, Some(1))).await.unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, all[1].id);
    }

    #[tokio::test]
    async fn test_near_includes_the_place_itself_first() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLACES_JSON.as_bytes()).unwrap();
        let service = service();
        let ids = service.load_all(file.path()).await.unwrap();
        let baltimore = service.index().find(ids[0]).await.unwrap();

        let near = service.near(&baltimore, Some(1000.0)).await.unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, baltimore.id);

        let all = service.near(&baltimore, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
