//! Resolves a stored photo to the nearest known place and records the link.

pub mod services;

pub use services::AssociationService;
