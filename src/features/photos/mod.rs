//! Photo binaries with attached metadata (location, weak place reference).
//!
//! The binary is written once, split into ordered chunks, and never rewritten;
//! later saves only touch the metadata.

pub mod models;
pub mod services;
pub mod stores;

pub use models::{Photo, PhotoDocument, PhotoId, PhotoMetadata};
pub use services::PhotoService;
pub use stores::{ContentStore, InMemoryContentStore, PgContentStore};
