use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::photos::models::{Photo, PhotoDocument, PhotoId};
use crate::features::places::PlaceId;
use crate::shared::types::Page;

/// Storage port for photo binaries and their metadata.
///
/// Each method is a single atomic operation on one document; callers that
/// need a read-then-write sequence on the same id serialize it themselves
/// (see `PhotoService::lock`).
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a new photo with content type `image/jpeg` and return its new id.
    /// Binary and metadata are written together or not at all.
    async fn create(
        &self,
        contents: Vec<u8>,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<PhotoId>;

    /// Metadata of one photo; `NotFound` when absent
    async fn find(&self, id: PhotoId) -> Result<PhotoDocument>;

    /// Replace location and place reference, leaving the binary untouched.
    /// `NotFound` when absent.
    async fn update_metadata(
        &self,
        id: PhotoId,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<()>;

    /// All chunks concatenated in stored order; `NotFound` when absent
    async fn fetch_contents(&self, id: PhotoId) -> Result<Vec<u8>>;

    /// Remove binary and metadata. Returns the number of photos removed, so
    /// deleting an unknown id yields `Ok(0)` rather than an error.
    async fn delete(&self, id: PhotoId) -> Result<u64>;

    /// Sequential scan in implementation-defined (insertion) order
    async fn list(&self, page: Page) -> Result<Vec<Photo>>;

    /// Raw documents whose place reference equals `place`, windowed by the
    /// store itself so callers only load the page they asked for
    async fn find_by_place(&self, place: PlaceId, page: Page) -> Result<Vec<PhotoDocument>>;
}

/// Chunk size as stored with each photo; sizes beyond `i32::MAX` are rejected
pub(crate) fn chunk_size_column(chunk_size: usize) -> Result<i32> {
    i32::try_from(chunk_size).map_err(|_| {
        AppError::Validation(format!(
            "Chunk size {} exceeds the storable maximum of {}",
            chunk_size,
            i32::MAX
        ))
    })
}

/// Hex SHA-256 of a photo binary
pub fn content_digest(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_digest(b"a"), content_digest(b"b"));
    }

    #[test]
    fn test_chunk_size_column_rejects_overflow() {
        assert_eq!(chunk_size_column(261_120).unwrap(), 261_120);

        let result = chunk_size_column(3_000_000_000);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
