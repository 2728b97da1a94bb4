mod content_store;
mod memory;
mod postgres;

pub use content_store::{content_digest, ContentStore};
pub use memory::InMemoryContentStore;
pub use postgres::PgContentStore;
