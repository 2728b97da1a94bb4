//! Database bootstrap: wipe, index, import places, store images, associate.

pub mod services;

pub use services::{SeedReport, SeedService};
