use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{AppError, Result};
use crate::features::photos::{Photo, PhotoId, PhotoService};
use crate::features::places::{PlaceId, PlaceIndex};
use crate::features::places::stores::validate_max_meters;

pub struct AssociationService {
    places: Arc<dyn PlaceIndex>,
    photos: Arc<PhotoService>,
}

impl AssociationService {
    pub fn new(places: Arc<dyn PlaceIndex>, photos: Arc<PhotoService>) -> Self {
        Self { places, photos }
    }

    /// Id of the closest place within `max_meters` of where the photo was
    /// taken. No match is `Ok(None)`. Performs no writes.
    pub async fn resolve_nearest_place(
        &self,
        photo: &Photo,
        max_meters: Option<f64>,
    ) -> Result<Option<PlaceId>> {
        let location = photo
            .location
            .ok_or_else(|| AppError::Validation("Photo has no location".to_string()))?;
        validate_max_meters(max_meters)?;

        let nearest = self.places.nearest_one(location, max_meters).await?;
        debug!(
            "Nearest place to photo {:?} within {:?}m: {:?}",
            photo.id,
            max_meters,
            nearest.as_ref().map(|p| p.id)
        );

        Ok(nearest.map(|p| p.id))
    }

    /// Resolve and write back as one unit under the photo's lock.
    ///
    /// With no match the existing reference is left unchanged. Returns the
    /// place written, if any.
    pub async fn associate(&self, id: PhotoId, max_meters: Option<f64>) -> Result<Option<PlaceId>> {
        let _guard = self.photos.lock(id).await;

        let mut photo = self
            .photos
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", id)))?;

        let Some(place) = self.resolve_nearest_place(&photo, max_meters).await? else {
            debug!("No place within {:?}m of photo {}", max_meters, id);
            return Ok(None);
        };

        photo.place = Some(place);
        if let Some(location) = photo.location {
            self.photos.persist_metadata(id, location, photo.place).await?;
        }

        info!("Photo {} associated with place {}", id, place);
        Ok(Some(place))
    }

    /// Clear the place reference of a stored photo
    pub async fn disassociate(&self, id: PhotoId) -> Result<()> {
        let _guard = self.photos.lock(id).await;

        let photo = self
            .photos
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Photo {} not found", id)))?;
        let location = photo
            .location
            .ok_or_else(|| AppError::Validation(format!("Photo {} has no location", id)))?;

        self.photos.persist_metadata(id, location, None).await?;
        info!("Photo {} disassociated", id);
        Ok(())
    }
}
