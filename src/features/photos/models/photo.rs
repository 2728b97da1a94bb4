use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::places::PlaceId;

/// Opaque key of a stored photo
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct PhotoId(Uuid);

impl PhotoId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|e| AppError::Validation(format!("Invalid photo id '{}': {}", raw, e)))
    }
}

impl Default for PhotoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PhotoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mutable part of a stored photo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub location: Coordinate,
    pub place: Option<PlaceId>,
}

/// A stored photo as the content store returns it, without its binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoDocument {
    pub id: PhotoId,
    pub content_type: String,
    pub length: i64,
    pub chunk_size: i32,
    pub upload_date: DateTime<Utc>,
    pub sha256: String,
    pub metadata: PhotoMetadata,
}

/// Working copy of a photo.
///
/// Created unpersisted with its contents; the contents are write-only and are
/// handed to the store on the first save. Reading the binary back goes through
/// the content store.
#[derive(Clone, Default, PartialEq)]
pub struct Photo {
    pub id: Option<PhotoId>,
    pub location: Option<Coordinate>,
    pub place: Option<PlaceId>,
    contents: Option<Vec<u8>>,
}

impl Photo {
    pub fn new(contents: Vec<u8>) -> Self {
        Self {
            contents: Some(contents),
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn set_contents(&mut self, contents: Vec<u8>) {
        self.contents = Some(contents);
    }

    pub fn has_contents(&self) -> bool {
        self.contents.is_some()
    }

    pub(crate) fn pending_contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    pub(crate) fn take_contents(&mut self) -> Option<Vec<u8>> {
        self.contents.take()
    }

    pub fn metadata(&self) -> Option<PhotoMetadata> {
        self.location.map(|location| PhotoMetadata {
            location,
            place: self.place,
        })
    }
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("id", &self.id)
            .field("location", &self.location)
            .field("place", &self.place)
            .field("pending_bytes", &self.contents.as_ref().map(Vec::len))
            .finish()
    }
}

impl From<PhotoDocument> for Photo {
    fn from(doc: PhotoDocument) -> Self {
        Self {
            id: Some(doc.id),
            location: Some(doc.metadata.location),
            place: doc.metadata.place,
            contents: None,
        }
    }
}
