use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::coordinates::Coordinate;
use crate::features::places::models::{
    AddressComponent, AddressComponentRow, ComponentQuery, ComponentSort, NewPlace, Place,
    PlaceId, SortOrder,
};
use crate::features::places::stores::place_index::{validate_max_meters, PlaceIndex};
use crate::shared::constants::{COUNTRY_COMPONENT_TYPE, PLACES_SPATIAL_INDEX};
use crate::shared::types::Page;

const PLACE_COLUMNS: &str = r#"
    id,
    formatted_address,
    ST_X(location::geometry) AS lng,
    ST_Y(location::geometry) AS lat,
    address_components
"#;

/// Database row for places; location is projected out of the geography column
#[derive(Debug, FromRow)]
struct PlaceRow {
    id: Uuid,
    formatted_address: String,
    lng: f64,
    lat: f64,
    address_components: Json<Vec<AddressComponent>>,
}

impl TryFrom<PlaceRow> for Place {
    type Error = AppError;

    fn try_from(row: PlaceRow) -> Result<Self> {
        Ok(Place {
            id: PlaceId::from(row.id),
            formatted_address: row.formatted_address,
            location: Coordinate::new(row.lng, row.lat)?,
            address_components: row.address_components.0,
        })
    }
}

#[derive(Debug, FromRow)]
struct ComponentRow {
    id: Uuid,
    formatted_address: String,
    lng: f64,
    lat: f64,
    component: Json<AddressComponent>,
}

impl TryFrom<ComponentRow> for AddressComponentRow {
    type Error = AppError;

    fn try_from(row: ComponentRow) -> Result<Self> {
        Ok(AddressComponentRow {
            place_id: PlaceId::from(row.id),
            formatted_address: row.formatted_address,
            location: Coordinate::new(row.lng, row.lat)?,
            address_component: row.component.0,
        })
    }
}

fn into_places(rows: Vec<PlaceRow>) -> Result<Vec<Place>> {
    rows.into_iter().map(Place::try_from).collect()
}

fn component_order_by(sort: Option<ComponentSort>) -> String {
    let Some(sort) = sort else {
        return "p.created_at, p.id, c.ordinality".to_string();
    };

    let column = match sort {
        ComponentSort::LongName(_) => "c.component->>'longName'",
        ComponentSort::ShortName(_) => "c.component->>'shortName'",
        ComponentSort::FormattedAddress(_) => "p.formatted_address",
    };
    let direction = match sort.order() {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    format!("{} {}, p.id, c.ordinality", column, direction)
}

/// PostGIS-backed place index.
///
/// Locations live in a `geography(Point, 4326)` column so every distance is
/// measured on the sphere in meters.
pub struct PgPlaceIndex {
    pool: PgPool,
}

impl PgPlaceIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn query_nearest(
        &self,
        point: Coordinate,
        max_meters: Option<f64>,
        limit: Option<i64>,
    ) -> Result<Vec<Place>> {
        validate_max_meters(max_meters)?;

        let sql = format!(
            r#"
            SELECT {}
            FROM places
            WHERE $3::float8 IS NULL
               OR ST_DWithin(
                    location,
                    ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                    $3,
                    false
               )
            ORDER BY location <-> ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, id
            LIMIT $4
            "#,
            PLACE_COLUMNS
        );

        let rows = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(point.longitude())
            .bind(point.latitude())
            .bind(max_meters)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to query nearest places: {:?}", e);
                AppError::StoreUnavailable(e)
            })?;

        debug!(
            "Nearest places to ({}, {}) within {:?}m: {}",
            point.longitude(),
            point.latitude(),
            max_meters,
            rows.len()
        );

        into_places(rows)
    }
}

#[async_trait]
impl PlaceIndex for PgPlaceIndex {
    async fn create(&self, batch: Vec<NewPlace>) -> Result<Vec<PlaceId>> {
        let mut ids = Vec::with_capacity(batch.len());

        // One statement per record, no surrounding transaction
        for record in batch {
            let id = PlaceId::new();
            let location = record.location();

            sqlx::query(
                r#"
                INSERT INTO places (id, formatted_address, location, address_components)
                VALUES ($1, $2, ST_SetSRID(ST_MakePoint($3, $4), 4326)::geography, $5)
                "#,
            )
            .bind(id)
            .bind(&record.formatted_address)
            .bind(location.longitude())
            .bind(location.latitude())
            .bind(Json(&record.address_components))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to insert place '{}' after {} inserted: {:?}",
                    record.formatted_address,
                    ids.len(),
                    e
                );
                AppError::StoreUnavailable(e)
            })?;

            ids.push(id);
        }

        info!("Inserted {} places", ids.len());
        Ok(ids)
    }

    async fn find(&self, id: PlaceId) -> Result<Place> {
        let sql = format!("SELECT {} FROM places WHERE id = $1", PLACE_COLUMNS);

        let row = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch place {}: {:?}", id, e);
                AppError::StoreUnavailable(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Place {} not found", id)))?;

        Place::try_from(row)
    }

    async fn list(&self, page: Page) -> Result<Vec<Place>> {
        let sql = format!(
            "SELECT {} FROM places ORDER BY created_at, id OFFSET $1 LIMIT $2",
            PLACE_COLUMNS
        );

        let rows = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list places: {:?}", e);
                AppError::StoreUnavailable(e)
            })?;

        into_places(rows)
    }

    async fn delete(&self, id: PlaceId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM places WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete place {}: {:?}", id, e);
                AppError::StoreUnavailable(e)
            })?;

        debug!("Deleted place {}: {} removed", id, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM places")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count places: {:?}", e);
                AppError::StoreUnavailable(e)
            })
    }

    async fn nearest(&self, point: Coordinate, max_meters: Option<f64>) -> Result<Vec<Place>> {
        self.query_nearest(point, max_meters, None).await
    }

    async fn nearest_one(
        &self,
        point: Coordinate,
        max_meters: Option<f64>,
    ) -> Result<Option<Place>> {
        Ok(self
            .query_nearest(point, max_meters, Some(1))
            .await?
            .into_iter()
            .next())
    }

    async fn create_spatial_index(&self) -> Result<()> {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON places USING GIST (location)",
            PLACES_SPATIAL_INDEX
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create spatial index: {:?}", e);
                AppError::StoreUnavailable(e)
            })?;

        info!("Spatial index {} ensured", PLACES_SPATIAL_INDEX);
        Ok(())
    }

    async fn drop_spatial_index(&self) -> Result<()> {
        let sql = format!("DROP INDEX IF EXISTS {}", PLACES_SPATIAL_INDEX);

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to drop spatial index: {:?}", e);
                AppError::StoreUnavailable(e)
            })?;

        info!("Spatial index {} dropped", PLACES_SPATIAL_INDEX);
        Ok(())
    }

    async fn spatial_index_exists(&self) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pg_indexes
                WHERE tablename = 'places' AND indexname = $1
            )
            "#,
        )
        .bind(PLACES_SPATIAL_INDEX)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to inspect spatial index: {:?}", e);
            AppError::StoreUnavailable(e)
        })
    }

    async fn find_by_short_name(&self, name: &str) -> Result<Vec<Place>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM places
            WHERE address_components @> jsonb_build_array(jsonb_build_object('shortName', $1::text))
            ORDER BY created_at, id
            "#,
            PLACE_COLUMNS
        );

        let rows = sqlx::query_as::<_, PlaceRow>(&sql)
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find places by short name {}: {:?}", name, e);
                AppError::StoreUnavailable(e)
            })?;

        into_places(rows)
    }

    async fn address_components(&self, query: ComponentQuery) -> Result<Vec<AddressComponentRow>> {
        let sql = format!(
            r#"
            SELECT
                p.id,
                p.formatted_address,
                ST_X(p.location::geometry) AS lng,
                ST_Y(p.location::geometry) AS lat,
                c.component
            FROM places p
            CROSS JOIN LATERAL jsonb_array_elements(p.address_components)
                WITH ORDINALITY AS c(component, ordinality)
            ORDER BY {}
            OFFSET $1
            LIMIT $2
            "#,
            component_order_by(query.sort)
        );

        let rows = sqlx::query_as::<_, ComponentRow>(&sql)
            .bind(query.offset.unwrap_or(0).max(0))
            .bind(query.limit.map(|l| l.max(0)))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list address components: {:?}", e);
                AppError::StoreUnavailable(e)
            })?;

        rows.into_iter().map(AddressComponentRow::try_from).collect()
    }

    async fn country_names(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT c.component->>'longName' AS long_name
            FROM places p
            CROSS JOIN LATERAL jsonb_array_elements(p.address_components) AS c(component)
            WHERE c.component->'types' @> jsonb_build_array($1::text)
              AND c.component->>'longName' IS NOT NULL
            ORDER BY long_name
            "#,
        )
        .bind(COUNTRY_COMPONENT_TYPE)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list country names: {:?}", e);
            AppError::StoreUnavailable(e)
        })
    }

    async fn find_ids_by_country_code(&self, code: &str) -> Result<Vec<PlaceId>> {
        sqlx::query_scalar::<_, PlaceId>(
            r#"
            SELECT p.id
            FROM places p
            WHERE EXISTS (
                SELECT 1
                FROM jsonb_array_elements(p.address_components) AS c(component)
                WHERE c.component->'types' @> jsonb_build_array($1::text)
                  AND c.component->>'shortName' = $2
            )
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(COUNTRY_COMPONENT_TYPE)
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to find places by country code {}: {:?}", code, e);
            AppError::StoreUnavailable(e)
        })
    }
}
