//! Registry API type definitions.
//!
//! Two request/response pairs are defined here:
//!
//! ## Registry API
//! The internal contract of the endpoint store: create a record, dispatch a method against a
//! record, inspect a record. Responses carry raw registry results.
//!
//! ## Mock API
//! The caller-facing contract driven by the transport layer. Responses are the JSON bodies
//! returned to clients: the generated endpoint URL, confirmation messages and endpoint info.

use std::{fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::registry::{error::RegistryError, services::identifier::EndpointId};

/// Methods an endpoint responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// Fixed method list advertised for every endpoint.
pub const METHODS: [Method; 5] = [Method::Get, Method::Post, Method::Put, Method::Patch, Method::Delete];

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the method carries a request body.
    pub fn takes_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method tokens are case-sensitive, as on the wire.
impl FromStr for Method {
    type Err = RegistryError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(RegistryError::MethodNotAllowed(other.to_owned())),
        }
    }
}

/// Read-only snapshot of an endpoint record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointView {
    pub id: EndpointId,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub access_count: u64,
    pub methods: [Method; 5],
    pub data: Value,
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Body of a dispatched request, as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// No body was sent.
    #[default]
    Empty,
    /// A parsed JSON document.
    Json(Value),
    /// A body that could not be parsed, rejected once the endpoint is known to exist.
    Malformed,
}

impl From<Option<Value>> for Payload {
    fn from(body: Option<Value>) -> Self {
        body.map_or(Payload::Empty, Payload::Json)
    }
}

/// Registry request types.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryRequest {
    /// Store a new document under a fresh identifier.
    ///
    /// `None` and JSON `null` are both rejected as missing data.
    Create(Option<Value>),
    /// Apply a method to an existing endpoint.
    Dispatch {
        /// Identifier taken from the request path
        id: String,
        /// Method token as received, validated by the registry
        method: String,
        /// Request body, only relevant for POST, PUT and PATCH
        body: Payload,
    },
    /// Read an endpoint's metadata and data.
    Inspect(String),
}

/// Registry response types.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryResponse {
    /// A record was created.
    Created { id: EndpointId, created_at: DateTime<Utc> },
    /// Current data, returned by GET.
    Data(Value),
    /// Data replaced by POST.
    Updated(Value),
    /// Data replaced by PUT.
    Replaced(Value),
    /// Data merged by PATCH.
    Patched(Value),
    /// Record removed by DELETE.
    Deleted,
    /// Endpoint snapshot returned by Inspect.
    Info(EndpointView),
}

/// Mock API request types.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    /// Create an endpoint and return its URL.
    Generate {
        /// `jsonData` member of the request body
        json_data: Option<Value>,
        /// Scheme and authority the endpoint URL is built on, e.g. `http://localhost:5000`
        base_url: String,
    },
    /// Drive an endpoint with an HTTP method.
    Data { id: String, method: String, body: Payload },
    /// Describe an endpoint.
    Info(String),
}

/// Body returned by a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generated {
    pub url: String,
    pub methods: [Method; 5],
    pub id: EndpointId,
}

/// Confirmation of a mutating request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Confirmation {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Confirmation {
    pub fn new(message: &str, data: Option<Value>) -> Self {
        Self { message: message.to_owned(), data }
    }
}

/// Mock API response types, serialized as the client-visible JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Generated(Generated),
    /// Raw stored document
    Document(Value),
    Confirmation(Confirmation),
    Info(EndpointView),
}
