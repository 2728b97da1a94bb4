//! Modules layer - adapters for collaborators outside the domain
//!
//! Contains the image metadata reader used when photos are first stored.

pub mod image_metadata;
