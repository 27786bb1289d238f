//! Endpoint registry module.
//!
//! This module owns every piece of server-held state: the mapping from endpoint identifiers
//! to JSON documents, the generation of those identifiers, and the per-method semantics that
//! let a stored document behave like a REST resource.
//!
//! ## Endpoint lifecycle
//!
//! An endpoint is created by a generation request, is then read, replaced (POST, PUT) or
//! shallow-merged (PATCH) through data requests, and is removed by DELETE. A removed
//! identifier is never served again. There is no expiry: records live as long as the
//! registry, optionally bounded in number by [`config::RegistryConfig::max_endpoints`].
//!
//! ## Service Components
//!
//! - **Endpoint registry**: concurrent store built on a sharded map, one exclusive guard per
//!   operation on an identifier
//! - **Identifier generator**: short URL-safe identifiers, checked against live keys on insert
//! - **Mock API**: the caller-facing contract, turning registry results into response bodies
//!
//! ## Initialization Helpers
//!
//! [`init_registry()`] builds the default stack from a [`config::RegistryConfig`].
pub mod api;
pub mod config;
pub mod error;
pub mod services;

/// Standard mock API service stack backed by the in-memory endpoint registry.
pub type MockApiDefaultStack = api::mock::MockApiService<services::endpoints::EndpointRegistry>;

/// Initialize a registry and the mock API service serving it.
///
/// The registry handle is returned alongside the service for callers that need direct
/// access to it, such as startup logging or tests.
pub fn init_registry(
    config: config::RegistryConfig,
) -> (services::endpoints::EndpointRegistry, MockApiDefaultStack) {
    let registry = services::endpoints::EndpointRegistry::new(config);
    let api_service = api::mock::MockApiService::new(registry.clone());
    (registry, api_service)
}
