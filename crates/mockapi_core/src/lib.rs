//! A dynamic mock-API host.
//!
//! A client submits an arbitrary JSON document and receives a unique endpoint URL. That URL
//! then behaves like a small REST resource: it can be read, replaced, patched and deleted,
//! and its state is held in memory by the server, keyed by a generated identifier.
//!
//! The crate is organized in two layers:
//! - [`registry`]: the endpoint registry, the identifier generator and the request-dispatch
//!   contract, exposed as [`tower::Service`] implementations.
//! - [`transport`]: an HTTP front end built with [`axum`] that drives the registry.
//!
//! [`axum`]: https://docs.rs/axum

#[cfg(test)]
mod tests;

pub mod registry;
pub mod transport;

#[cfg(any(test, feature = "mockapi_tracing"))]
pub mod mockapi_tracing {
    use std::sync::Once;

    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize tracing for tests.
    ///
    /// Logs are captured by the test harness and filtered with `RUST_LOG` (off by default).
    pub fn init() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("off"))
                .unwrap_or_default();

            fmt().with_target(false).with_test_writer().with_env_filter(filter).init();
        });
    }
}
