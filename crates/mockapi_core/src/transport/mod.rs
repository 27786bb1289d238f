//! Transports driving the mock API service.

pub mod http;
