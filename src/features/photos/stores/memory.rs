use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::photos::models::{Photo, PhotoDocument, PhotoId, PhotoMetadata};
use crate::features::photos::stores::content_store::{
    chunk_size_column, content_digest, ContentStore,
};
use crate::features::places::PlaceId;
use crate::shared::constants::PHOTO_CONTENT_TYPE;
use crate::shared::types::Page;

struct StoredPhoto {
    document: PhotoDocument,
    chunks: Vec<Vec<u8>>,
}

/// Process-local content store keeping chunks in memory
pub struct InMemoryContentStore {
    chunk_size: usize,
    photos: RwLock<Vec<StoredPhoto>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::with_config(&StorageConfig::default())
    }

    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            chunk_size: config.chunk_size_bytes.max(1),
            photos: RwLock::new(Vec::new()),
        }
    }

    /// Number of chunks stored for a photo
    pub async fn chunk_count(&self, id: PhotoId) -> Option<usize> {
        let photos = self.photos.read().await;
        photos
            .iter()
            .find(|p| p.document.id == id)
            .map(|p| p.chunks.len())
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: PhotoId) -> AppError {
    AppError::NotFound(format!("Photo {} not found", id))
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn create(
        &self,
        contents: Vec<u8>,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<PhotoId> {
        let chunk_size = chunk_size_column(self.chunk_size)?;
        let document = PhotoDocument {
            id: PhotoId::new(),
            content_type: PHOTO_CONTENT_TYPE.to_string(),
            length: contents.len() as i64,
            chunk_size,
            upload_date: Utc::now(),
            sha256: content_digest(&contents),
            metadata: PhotoMetadata { location, place },
        };
        let id = document.id;
        let chunks: Vec<Vec<u8>> = contents
            .chunks(self.chunk_size)
            .map(<[u8]>::to_vec)
            .collect();

        info!(
            "Photo stored: id={}, size={}, chunks={}",
            id,
            document.length,
            chunks.len()
        );
        self.photos.write().await.push(StoredPhoto { document, chunks });

        Ok(id)
    }

    async fn find(&self, id: PhotoId) -> Result<PhotoDocument> {
        let photos = self.photos.read().await;
        photos
            .iter()
            .find(|p| p.document.id == id)
            .map(|p| p.document.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn update_metadata(
        &self,
        id: PhotoId,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<()> {
        let mut photos = self.photos.write().await;
        let stored = photos
            .iter_mut()
            .find(|p| p.document.id == id)
            .ok_or_else(|| not_found(id))?;
        stored.document.metadata = PhotoMetadata { location, place };

        debug!("Photo metadata updated: id={}, place={:?}", id, place);
        Ok(())
    }

    async fn fetch_contents(&self, id: PhotoId) -> Result<Vec<u8>> {
        let photos = self.photos.read().await;
        photos
            .iter()
            .find(|p| p.document.id == id)
            .map(|p| p.chunks.concat())
            .ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: PhotoId) -> Result<u64> {
        let mut photos = self.photos.write().await;
        let before = photos.len();
        photos.retain(|p| p.document.id != id);
        let removed = (before - photos.len()) as u64;

        debug!("Photo deleted: id={}, removed={}", id, removed);
        Ok(removed)
    }

    async fn list(&self, page: Page) -> Result<Vec<Photo>> {
        let photos = self.photos.read().await;
        Ok(page.apply(photos.iter().map(|p| Photo::from(p.document.clone()))))
    }

    async fn find_by_place(&self, place: PlaceId, page: Page) -> Result<Vec<PhotoDocument>> {
        let photos = self.photos.read().await;
        let matching = photos
            .iter()
            .filter(|p| p.document.metadata.place == Some(place))
            .map(|p| p.document.clone());

        Ok(page.apply(matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_gate() -> Coordinate {
        Coordinate::new(-122.4, 37.8).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = InMemoryContentStore::new();

        let id = store.create(vec![1, 2, 3], golden_gate(), None).await.unwrap();
        let doc = store.find(id).await.unwrap();

        assert_eq!(doc.id, id);
        assert_eq!(doc.content_type, "image/jpeg");
        assert_eq!(doc.length, 3);
        assert_eq!(doc.metadata.location, golden_gate());
        assert_eq!(doc.metadata.place, None);
        assert_eq!(doc.sha256, content_digest(&[1, 2, 3]));
    }

    #[tokio::test]
    async fn test_contents_are_chunked_and_reassembled() {
        let store = InMemoryContentStore::with_config(&StorageConfig {
            chunk_size_bytes: 4,
        });
        let contents: Vec<u8> = (0..10).collect();

        let id = store.create(contents.clone(), golden_gate(), None).await.unwrap();

        assert_eq!(store.chunk_count(id).await, Some(3));
        assert_eq!(store.fetch_contents(id).await.unwrap(), contents);
    }

    #[tokio::test]
    async fn test_update_metadata_keeps_binary() {
        let store = InMemoryContentStore::new();
        let contents = b"jpeg bytes".to_vec();
        let id = store.create(contents.clone(), golden_gate(), None).await.unwrap();
        let place = PlaceId::new();
        let moved = Coordinate::new(-76.6, 39.3).unwrap();

        store.update_metadata(id, moved, Some(place)).await.unwrap();

        let doc = store.find(id).await.unwrap();
        assert_eq!(doc.metadata.location, moved);
        assert_eq!(doc.metadata.place, Some(place));
        assert_eq!(store.fetch_contents(id).await.unwrap(), contents);
    }

    #[tokio::test]
    async fn test_update_metadata_unknown_id() {
        let store = InMemoryContentStore::new();

        let result = store
            .update_metadata(PhotoId::new(), golden_gate(), None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_fetch_is_not_found() {
        let store = InMemoryContentStore::new();
        let id = store.create(vec![7; 16], golden_gate(), None).await.unwrap();

        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);

        let result = store.fetch_contents(id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let store = InMemoryContentStore::new();
        let mut ids = Vec::new();
        for i in 0..4u8 {
            ids.push(store.create(vec![i], golden_gate(), None).await.unwrap());
        }

        let all: Vec<_> = store
            .list(Page::all())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.unwrap())
            .collect();
        assert_eq!(all, ids);

        let window: Vec<_> = store
            .list(Page::new(1, Some(2)))
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.unwrap())
            .collect();
        assert_eq!(window, ids[1..3].to_vec());
    }

    #[tokio::test]
    async fn test_find_by_place_matches_exactly() {
        let store = InMemoryContentStore::new();
        let place = PlaceId::new();
        let other = PlaceId::new();

        let a = store.create(vec![1], golden_gate(), Some(place)).await.unwrap();
        store.create(vec![2], golden_gate(), Some(other)).await.unwrap();
        store.create(vec![3], golden_gate(), None).await.unwrap();
        let b = store.create(vec![4], golden_gate(), None).await.unwrap();
        store
            .update_metadata(b, golden_gate(), Some(place))
            .await
            .unwrap();

        let mut found: Vec<PhotoId> = store
            .find_by_place(place, Page::all())
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        found.sort();
        let mut expected = vec![a, b];
        expected.sort();

        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn test_find_by_place_applies_window() {
        let store = InMemoryContentStore::new();
        let place = PlaceId::new();
        let mut ids = Vec::new();
        for i in 0..5u8 {
            store.create(vec![i], golden_gate(), None).await.unwrap();
            ids.push(store.create(vec![i], golden_gate(), Some(place)).await.unwrap());
        }

        let window: Vec<PhotoId> = store
            .find_by_place(place, Page::new(1, Some(2)))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(window, ids[1..3].to_vec());

        let first = store.find_by_place(place, Page::new(0, Some(1))).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_oversized_chunk_size_is_rejected() {
        let store = InMemoryContentStore::with_config(&StorageConfig {
            chunk_size_bytes: 3_000_000_000,
        });

        let result = store.create(vec![1, 2, 3], golden_gate(), None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.list(Page::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_contents_round_trip() {
        let store = InMemoryContentStore::new();

        let id = store.create(Vec::new(), golden_gate(), None).await.unwrap();

        assert_eq!(store.chunk_count(id).await, Some(0));
        assert!(store.fetch_contents(id).await.unwrap().is_empty());
    }
}
