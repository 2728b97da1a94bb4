use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::config::SeedConfig;
use crate::core::error::{AppError, Result};
use crate::features::association::AssociationService;
use crate::features::photos::{Photo, PhotoService};
use crate::features::places::PlaceService;
use crate::shared::types::Page;

/// Outcome of one seed run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedReport {
    pub photos_removed: u64,
    pub places_removed: u64,
    pub places_loaded: usize,
    pub photos_stored: usize,
    pub photos_skipped: usize,
    pub photos_associated: usize,
    /// Sorted formatted addresses of places with at least one photo
    pub addresses_with_photos: Vec<String>,
}

pub struct SeedService {
    places: Arc<PlaceService>,
    photos: Arc<PhotoService>,
    association: Arc<AssociationService>,
}

impl SeedService {
    pub fn new(
        places: Arc<PlaceService>,
        photos: Arc<PhotoService>,
        association: Arc<AssociationService>,
    ) -> Self {
        Self {
            places,
            photos,
            association,
        }
    }

    /// Replace every photo and place with the configured fixtures.
    ///
    /// Images without a usable geolocation are skipped with a warning.
    pub async fn run(&self, config: &SeedConfig) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for photo in self.photos.all(Page::all()).await? {
            report.photos_removed += self.photos.destroy(&photo).await?;
        }

        let index = self.places.index();
        for place in index.list(Page::all()).await? {
            report.places_removed += index.delete(place.id).await?;
        }
        info!(
            "Cleared {} photos and {} places",
            report.photos_removed, report.places_removed
        );

        index.create_spatial_index().await?;

        report.places_loaded = self.places.load_all(&config.places_file).await?.len();

        for path in image_paths(&config.images_glob)? {
            let contents = tokio::fs::read(&path).await.map_err(|e| {
                tracing::error!("Failed to read image {}: {:?}", path.display(), e);
                AppError::Import(format!("Cannot read {}: {}", path.display(), e))
            })?;

            let mut photo = Photo::new(contents);
            match self.photos.save(&mut photo).await {
                Ok(_) => report.photos_stored += 1,
                Err(e @ (AppError::Extraction(_) | AppError::MalformedCoordinate(_))) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.photos_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        for photo in self.photos.all(Page::all()).await? {
            let Some(id) = photo.id else { continue };
            let place = self
                .association
                .associate(id, Some(config.max_distance_meters))
                .await?;
            if place.is_some() {
                report.photos_associated += 1;
            }
        }

        let mut addresses = Vec::new();
        for place in index.list(Page::all()).await? {
            if !self.places.photos(place.id, Page::new(0, Some(1))).await?.is_empty() {
                addresses.push(place.formatted_address);
            }
        }
        addresses.sort();
        report.addresses_with_photos = addresses;

        info!(
            "Seed complete: {} places, {} photos stored, {} skipped, {} associated",
            report.places_loaded,
            report.photos_stored,
            report.photos_skipped,
            report.photos_associated
        );
        Ok(report)
    }
}

/// Files matching `pattern`, in sorted order
fn image_paths(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|e| AppError::Import(format!("Invalid image pattern '{}': {}", pattern, e)))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable image entry: {}", e);
                None
            }
        })
        .collect();
    paths.sort();

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::places::InMemoryPlaceIndex;
    use crate::shared::test_helpers::photo_service;
    use std::fs;

    const PLACES_JSON: &str = r#"[
        {
            "formatted_address": "Baltimore, MD, USA",
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.6122, 39.2904]}},
            "address_components": []
        },
        {
            "formatted_address": "Annapolis, MD, USA",
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.4922, 38.9784]}},
            "address_components": []
        },
        {
            "formatted_address": "Towson, MD, USA",
            "geometry": {"geolocation": {"type": "Point", "coordinates": [-76.6019, 39.4015]}},
            "address_components": []
        }
    ]"#;

    fn seed_service() -> SeedService {
        let index = Arc::new(InMemoryPlaceIndex::new());
        let photos = Arc::new(photo_service(index.clone()));
        let places = Arc::new(PlaceService::new(index.clone(), photos.store().clone()));
        let association = Arc::new(AssociationService::new(index, photos.clone()));

        SeedService::new(places, photos, association)
    }

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("places.json"), PLACES_JSON).unwrap();
        // Near Baltimore, near Towson, far from everything, and no location
        fs::write(dir.path().join("image1.jpg"), "-76.6130,39.2910").unwrap();
        fs::write(dir.path().join("image2.jpg"), "-76.6020,39.4010").unwrap();
        fs::write(dir.path().join("image3.jpg"), "-122.4,37.8").unwrap();
        fs::write(dir.path().join("image4.jpg"), "no gps").unwrap();
        fs::write(dir.path().join("other.jpg"), "-76.4922,38.9784").unwrap();
        dir
    }

    fn config(dir: &tempfile::TempDir) -> SeedConfig {
        SeedConfig {
            places_file: dir.path().join("places.json").to_string_lossy().into_owned(),
            images_glob: dir.path().join("image*.jpg").to_string_lossy().into_owned(),
            max_distance_meters: 1609.34,
        }
    }

    #[tokio::test]
    async fn test_seed_run() {
        let dir = fixture_dir();
        let service = seed_service();

        let report = service.run(&config(&dir)).await.unwrap();

        assert_eq!(report.places_loaded, 3);
        assert_eq!(report.photos_stored, 3);
        assert_eq!(report.photos_skipped, 1);
        assert_eq!(report.photos_associated, 2);
        assert_eq!(
            report.addresses_with_photos,
            vec!["Baltimore, MD, USA", "Towson, MD, USA"]
        );
        assert!(service.places.index().spatial_index_exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_rerun_replaces_previous_data() {
        let dir = fixture_dir();
        let service = seed_service();
        service.run(&config(&dir)).await.unwrap();

        let report = service.run(&config(&dir)).await.unwrap();

        assert_eq!(report.photos_removed, 3);
        assert_eq!(report.places_removed, 3);
        assert_eq!(service.places.index().count().await.unwrap(), 3);
        assert_eq!(service.photos.all(Page::all()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_seed_missing_places_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = seed_service();

        let result = service.run(&config(&dir)).await;

        assert!(matches!(result, Err(AppError::Import(_))));
    }

    #[test]
    fn test_image_paths_are_sorted() {
        let dir = fixture_dir();
        let pattern = dir.path().join("image*.jpg").to_string_lossy().into_owned();

        let names: Vec<String> = image_paths(&pattern)
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();

        assert_eq!(names, vec!["image1.jpg", "image2.jpg", "image3.jpg", "image4.jpg"]);
    }
}
