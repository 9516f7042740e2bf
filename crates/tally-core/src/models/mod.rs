//! Data models: application configuration, descriptors and metadata values.

pub mod config;
pub mod descriptor;
pub mod value;
