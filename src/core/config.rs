use std::env;

use crate::shared::constants::{DEFAULT_CHUNK_SIZE_BYTES, METERS_PER_MILE};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Photo content storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Size of each stored binary chunk in bytes
    pub chunk_size_bytes: usize,
}

/// Configuration for the seed runner
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// JSON array of place records to import
    pub places_file: String,
    /// Glob matching the images to store
    pub images_glob: String,
    /// Association radius in meters
    pub max_distance_meters: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            seed: SeedConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let chunk_size_bytes = env::var("PHOTO_CHUNK_SIZE_BYTES")
            .unwrap_or_else(|_| DEFAULT_CHUNK_SIZE_BYTES.to_string())
            .parse::<usize>()
            .map_err(|_| "PHOTO_CHUNK_SIZE_BYTES must be a valid number".to_string())?;

        Self::new(chunk_size_bytes)
    }

    /// Chunk sizes are stored as a 32-bit integer alongside each photo
    pub fn new(chunk_size_bytes: usize) -> Result<Self, String> {
        if chunk_size_bytes == 0 {
            return Err("PHOTO_CHUNK_SIZE_BYTES must be greater than zero".to_string());
        }
        if i32::try_from(chunk_size_bytes).is_err() {
            return Err(format!(
                "PHOTO_CHUNK_SIZE_BYTES must not exceed {}",
                i32::MAX
            ));
        }

        Ok(Self { chunk_size_bytes })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
        }
    }
}

impl SeedConfig {
    pub fn from_env() -> Result<Self, String> {
        let places_file =
            env::var("SEED_PLACES_FILE").unwrap_or_else(|_| "./db/places.json".to_string());

        let images_glob =
            env::var("SEED_IMAGES_GLOB").unwrap_or_else(|_| "./db/image*.jpg".to_string());

        let max_distance_meters = env::var("SEED_MAX_DISTANCE_METERS")
            .unwrap_or_else(|_| METERS_PER_MILE.to_string())
            .parse::<f64>()
            .map_err(|_| "SEED_MAX_DISTANCE_METERS must be a valid number".to_string())?;

        if !max_distance_meters.is_finite() || max_distance_meters < 0.0 {
            return Err("SEED_MAX_DISTANCE_METERS must be a non-negative number".to_string());
        }

        Ok(Self {
            places_file,
            images_glob,
            max_distance_meters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_bounds() {
        assert!(StorageConfig::new(0).is_err());
        assert!(StorageConfig::new(3_000_000_000).is_err());
        assert!(StorageConfig::new(i32::MAX as usize).is_ok());

        let config = StorageConfig::new(DEFAULT_CHUNK_SIZE_BYTES).unwrap();
        assert_eq!(config.chunk_size_bytes, 261_120);
    }
}
