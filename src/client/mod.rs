//! Licensing client layer.

pub mod http;

pub use http::{KeygenClient, LicensingApi};
