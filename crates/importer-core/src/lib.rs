pub mod classify;
pub mod config;
pub mod importer;
pub mod router;
pub mod server;
pub mod service;

pub use importer::FileImporter;

/// Returns the crate version baked in at compile time.
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
