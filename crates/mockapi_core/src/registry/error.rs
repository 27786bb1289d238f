use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry error, no data provided")]
    MissingData,

    #[error("Registry error, endpoint not found (id: {0})")]
    NotFound(String),

    #[error("Registry error, request body could not be parsed")]
    InvalidBody,

    #[error("Registry error, method not allowed (method: {0})")]
    MethodNotAllowed(String),

    #[error("Registry error, PATCH requires object-shaped data and body")]
    InvalidMergeTarget,

    #[error("Registry error, endpoint capacity exhausted (limit: {0})")]
    CapacityExhausted(usize),

    #[error("Registry error, internal failure ({0})")]
    Internal(String),
}
