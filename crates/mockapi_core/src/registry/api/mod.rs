//! External-facing API of the registry.
//!
//! - **Registry API**: create, dispatch and inspect requests served by the endpoint store
//! - **Mock API**: generation, data and info requests served to clients through the
//!   transport layer

pub mod mock;
pub mod types;

// Re-export all types for convenience
pub use types::*;

/// Route creating endpoints.
pub const GENERATE_PATH: &str = "/api/generate";
/// Route prefix under which endpoints are served.
pub const DATA_PATH: &str = "/api/data";
/// Route prefix under which endpoint metadata is served.
pub const INFO_PATH: &str = "/api/info";
