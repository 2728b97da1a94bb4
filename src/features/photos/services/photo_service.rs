use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::photos::models::{Photo, PhotoDocument, PhotoId};
use crate::features::photos::stores::ContentStore;
use crate::features::places::{Place, PlaceId, PlaceIndex};
use crate::modules::image_metadata::LocationExtractor;
use crate::shared::locks::KeyedLocks;
use crate::shared::types::Page;

/// Photo lifecycle on top of the content store.
///
/// Metadata writes to the same photo id are serialized through a per-id lock
/// held for the whole read-modify-write sequence.
pub struct PhotoService {
    store: Arc<dyn ContentStore>,
    extractor: Arc<dyn LocationExtractor>,
    places: Arc<dyn PlaceIndex>,
    locks: KeyedLocks<PhotoId>,
}

impl PhotoService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        extractor: Arc<dyn LocationExtractor>,
        places: Arc<dyn PlaceIndex>,
    ) -> Self {
        Self {
            store,
            extractor,
            places,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Exclusive access to one photo's metadata within this process
    pub async fn lock(&self, id: PhotoId) -> OwnedMutexGuard<()> {
        self.locks.acquire(&id).await
    }

    /// Persist a photo.
    ///
    /// The first save extracts the location from the pending contents and
    /// stores binary and metadata; the photo then receives its id and its
    /// contents are released. Later saves only rewrite location and place.
    pub async fn save(&self, photo: &mut Photo) -> Result<PhotoId> {
        match photo.id {
            None => self.create(photo).await,
            Some(id) => {
                let metadata = photo.metadata().ok_or_else(|| {
                    AppError::Validation(format!("Photo {} has no location", id))
                })?;
                if photo.has_contents() {
                    warn!("Photo {} already stored; ignoring new contents", id);
                }

                let _guard = self.lock(id).await;
                self.persist_metadata(id, metadata.location, metadata.place).await?;
                Ok(id)
            }
        }
    }

    async fn create(&self, photo: &mut Photo) -> Result<PhotoId> {
        let contents = photo
            .pending_contents()
            .ok_or_else(|| AppError::Validation("Photo has no contents to store".to_string()))?;

        let extracted = self.extractor.extract(contents)?;
        let location = Coordinate::new(extracted.longitude, extracted.latitude)?;

        let contents = photo.take_contents().unwrap_or_default();
        let id = self.store.create(contents, location, photo.place).await?;

        photo.id = Some(id);
        photo.location = Some(location);

        info!(
            "Photo {} saved at ({}, {})",
            id,
            location.longitude(),
            location.latitude()
        );
        Ok(id)
    }

    /// Metadata write without taking the lock; the caller must hold it
    pub(crate) async fn persist_metadata(
        &self,
        id: PhotoId,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<()> {
        self.store.update_metadata(id, location, place).await
    }

    pub async fn find(&self, id: PhotoId) -> Result<Option<Photo>> {
        match self.store.find(id).await {
            Ok(doc) => Ok(Some(Photo::from(doc))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Full stored document, including length, chunk size and digest
    pub async fn document(&self, id: PhotoId) -> Result<PhotoDocument> {
        self.store.find(id).await
    }

    pub async fn all(&self, page: Page) -> Result<Vec<Photo>> {
        self.store.list(page).await
    }

    pub async fn contents(&self, id: PhotoId) -> Result<Vec<u8>> {
        self.store.fetch_contents(id).await
    }

    /// Remove binary and metadata. Unsaved photos and unknown ids yield 0.
    pub async fn destroy(&self, photo: &Photo) -> Result<u64> {
        let Some(id) = photo.id else {
            return Ok(0);
        };

        let _guard = self.lock(id).await;
        let removed = self.store.delete(id).await?;
        info!("Photo {} destroyed ({} removed)", id, removed);
        Ok(removed)
    }

    /// The referenced place, if any.
    ///
    /// A reference to a place that no longer exists reads as `None`.
    pub async fn place(&self, photo: &Photo) -> Result<Option<Place>> {
        let Some(place_id) = photo.place else {
            return Ok(None);
        };

        match self.places.find(place_id).await {
            Ok(place) => Ok(Some(place)),
            Err(e) if e.is_not_found() => {
                debug!("Photo {:?} references missing place {}", photo.id, place_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
