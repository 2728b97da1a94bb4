pub mod constants;
pub mod geo;
pub mod locks;
pub mod test_helpers;
pub mod types;
