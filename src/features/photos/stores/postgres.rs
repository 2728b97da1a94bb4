use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

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

const PHOTO_COLUMNS: &str = r#"
    id,
    content_type,
    length,
    chunk_size,
    upload_date,
    sha256,
    location_lng,
    location_lat,
    place_id
"#;

#[derive(Debug, FromRow)]
struct PhotoRow {
    id: Uuid,
    content_type: String,
    length: i64,
    chunk_size: i32,
    upload_date: DateTime<Utc>,
    sha256: String,
    location_lng: f64,
    location_lat: f64,
    place_id: Option<Uuid>,
}

impl TryFrom<PhotoRow> for PhotoDocument {
    type Error = AppError;

    fn try_from(row: PhotoRow) -> Result<Self> {
        Ok(PhotoDocument {
            id: PhotoId::from(row.id),
            content_type: row.content_type,
            length: row.length,
            chunk_size: row.chunk_size,
            upload_date: row.upload_date,
            sha256: row.sha256,
            metadata: PhotoMetadata {
                location: Coordinate::new(row.location_lng, row.location_lat)?,
                place: row.place_id.map(PlaceId::from),
            },
        })
    }
}

fn into_documents(rows: Vec<PhotoRow>) -> Result<Vec<PhotoDocument>> {
    rows.into_iter().map(PhotoDocument::try_from).collect()
}

fn not_found(id: PhotoId) -> AppError {
    AppError::NotFound(format!("Photo {} not found", id))
}

/// Content store keeping photo binaries as ordered `bytea` chunks next to
/// their metadata row
pub struct PgContentStore {
    pool: PgPool,
    chunk_size: usize,
}

impl PgContentStore {
    pub fn new(pool: PgPool, config: &StorageConfig) -> Self {
        Self {
            pool,
            chunk_size: config.chunk_size_bytes.max(1),
        }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn create(
        &self,
        contents: Vec<u8>,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<PhotoId> {
        let id = PhotoId::new();
        let chunk_size = chunk_size_column(self.chunk_size)?;
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin photo transaction: {:?}", e);
            AppError::StoreUnavailable(e)
        })?;

        sqlx::query(
            r#"
            INSERT INTO photos (
                id, content_type, length, chunk_size, sha256,
                location_lng, location_lat, place_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(PHOTO_CONTENT_TYPE)
        .bind(contents.len() as i64)
        .bind(chunk_size)
        .bind(content_digest(&contents))
        .bind(location.longitude())
        .bind(location.latitude())
        .bind(place)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert photo {}: {:?}", id, e);
            AppError::StoreUnavailable(e)
        })?;

        let mut chunks = 0;
        for (n, chunk) in contents.chunks(self.chunk_size).enumerate() {
            let n = i32::try_from(n).map_err(|_| {
                AppError::Validation(format!("Photo {} has too many chunks", id))
            })?;
            sqlx::query("INSERT INTO photo_chunks (photo_id, n, data) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(n)
                .bind(chunk)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to insert chunk {} of photo {}: {:?}", n, id, e);
                    AppError::StoreUnavailable(e)
                })?;
            chunks += 1;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit photo {}: {:?}", id, e);
            AppError::StoreUnavailable(e)
        })?;

        info!(
            "Photo stored: id={}, size={}, chunks={}",
            id,
            contents.len(),
            chunks
        );
        Ok(id)
    }

    async fn find(&self, id: PhotoId) -> Result<PhotoDocument> {
        let sql = format!("SELECT {} FROM photos WHERE id = $1", PHOTO_COLUMNS);

        let row = sqlx::query_as::<_, PhotoRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch photo {}: {:?}", id, e);
                AppError::StoreUnavailable(e)
            })?
            .ok_or_else(|| not_found(id))?;

        PhotoDocument::try_from(row)
    }

    async fn update_metadata(
        &self,
        id: PhotoId,
        location: Coordinate,
        place: Option<PlaceId>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE photos
            SET location_lng = $2, location_lat = $3, place_id = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(location.longitude())
        .bind(location.latitude())
        .bind(place)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update metadata of photo {}: {:?}", id, e);
            AppError::StoreUnavailable(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        debug!("Photo metadata updated: id={}, place={:?}", id, place);
        Ok(())
    }

    async fn fetch_contents(&self, id: PhotoId) -> Result<Vec<u8>> {
        // The LEFT JOIN yields one NULL-data row for a photo without chunks
        let chunks = sqlx::query_scalar::<_, Option<Vec<u8>>>(
            r#"
            SELECT c.data
            FROM photos p
            LEFT JOIN photo_chunks c ON c.photo_id = p.id
            WHERE p.id = $1
            ORDER BY c.n
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch contents of photo {}: {:?}", id, e);
            AppError::StoreUnavailable(e)
        })?;

        if chunks.is_empty() {
            return Err(not_found(id));
        }

        Ok(chunks.into_iter().flatten().flatten().collect())
    }

    async fn delete(&self, id: PhotoId) -> Result<u64> {
        // Chunks follow through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete photo {}: {:?}", id, e);
                AppError::StoreUnavailable(e)
            })?;

        debug!("Photo deleted: id={}, removed={}", id, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn list(&self, page: Page) -> Result<Vec<Photo>> {
        let sql = format!(
            "SELECT {} FROM photos ORDER BY upload_date, id OFFSET $1 LIMIT $2",
            PHOTO_COLUMNS
        );

        let rows = sqlx::query_as::<_, PhotoRow>(&sql)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list photos: {:?}", e);
                AppError::StoreUnavailable(e)
            })?;

        Ok(into_documents(rows)?.into_iter().map(Photo::from).collect())
    }

    async fn find_by_place(&self, place: PlaceId, page: Page) -> Result<Vec<PhotoDocument>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM photos
            WHERE place_id = $1
            ORDER BY upload_date, id
            OFFSET $2 LIMIT $3
            "#,
            PHOTO_COLUMNS
        );

        let rows = sqlx::query_as::<_, PhotoRow>(&sql)
            .bind(place)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch photos of place {}: {:?}", place, e);
                AppError::StoreUnavailable(e)
            })?;

        into_documents(rows)
    }
}
