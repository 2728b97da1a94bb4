mod photo;

pub use photo::{Photo, PhotoDocument, PhotoId, PhotoMetadata};
