//! Core services of the registry.
//!
//! - **Identifier**: generation of short, URL-safe endpoint identifiers
//! - **Endpoints**: the concurrent identifier to record store and its dispatch semantics

pub mod endpoints;
pub mod identifier;
