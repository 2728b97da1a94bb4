/// Content type recorded for every stored photo
pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Default size of a stored binary chunk (255 KiB)
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 255 * 1024;

/// Earth's mean radius in meters (for Haversine formula)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// One statute mile in meters
pub const METERS_PER_MILE: f64 = 1609.34;

/// Name of the spatial index over `places.location`
pub const PLACES_SPATIAL_INDEX: &str = "places_location_gist";

/// Address component type marking a country
pub const COUNTRY_COMPONENT_TYPE: &str = "country";
