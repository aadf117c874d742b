//! Configuration for the catalog: thumbnail store location, thumbnail
//! dimensions and encoding, and fan-out limits. Stored as TOML.

pub mod settings;
