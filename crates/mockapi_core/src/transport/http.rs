//! HTTP transport built with axum.
//!
//! Routes:
//! - `POST /api/generate` → create an endpoint from the `jsonData` member of the body
//! - `ANY  /api/data/{id}` → dispatch the request method against the endpoint
//! - `GET  /api/info/{id}` → endpoint metadata and data
//!
//! Bodies are parsed as JSON, or as flat form fields when sent as
//! `application/x-www-form-urlencoded`. Registry failures map to status codes with a fixed
//! `{"error": ...}` body.

use std::future::Future;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, Method as HttpMethod, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower::{Service, ServiceExt};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::registry::{
    api::{ApiRequest, ApiResponse, DATA_PATH, GENERATE_PATH, INFO_PATH, Method, Payload},
    error::RegistryError,
};

pub const DEFAULT_HTTP_PORT: u16 = 5000;
/// 50 MiB
pub const DEFAULT_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Settings of the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Maximum accepted request body size in bytes
    pub body_limit: usize,
    /// Base URL used for generated endpoint URLs instead of the request's `Host` header
    pub public_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { body_limit: DEFAULT_BODY_LIMIT, public_url: None }
    }
}

impl HttpConfig {
    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url = public_url;
        self
    }
}

/// Services the router can drive.
pub trait ApiService:
    Service<ApiRequest, Response = ApiResponse, Error = RegistryError, Future: Send>
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ApiService for T
where
    T: Service<ApiRequest, Response = ApiResponse, Error = RegistryError> + Clone + Send + Sync + 'static,
    T::Future: Send,
{
}

#[derive(Clone)]
struct HttpState<S> {
    api: S,
    public_url: Option<String>,
}

/// Route a failure was raised on, selects the client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Generate,
    Data,
    Info,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// Client-facing failure: a status code and a fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpError {
    status: StatusCode,
    message: &'static str,
}

impl HttpError {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }

    fn from_registry(err: &RegistryError, route: Route) -> Self {
        match err {
            RegistryError::MissingData if route == Route::Generate => {
                Self::new(StatusCode::BAD_REQUEST, "No JSON data provided")
            }
            RegistryError::MissingData => Self::new(StatusCode::BAD_REQUEST, "No request body provided"),
            RegistryError::InvalidBody => Self::invalid_body(),
            RegistryError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Endpoint not found"),
            RegistryError::MethodNotAllowed(_) => {
                Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            RegistryError::InvalidMergeTarget => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "PATCH requires JSON objects on both sides",
            ),
            RegistryError::CapacityExhausted(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Endpoint capacity exhausted")
            }
            RegistryError::Internal(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }

    fn invalid_body() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body")
    }

    fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Route not found")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// Parse a request body, `None` when empty.
fn parse_body(headers: &HeaderMap, body: &Bytes) -> Result<Option<Value>, HttpError> {
    if body.is_empty() {
        return Ok(None);
    }
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let fields: Vec<(String, String)> =
            serde_urlencoded::from_bytes(body).map_err(|_| HttpError::invalid_body())?;
        Ok(Some(Value::Object(
            fields.into_iter().map(|(key, value)| (key, Value::String(value))).collect::<Map<_, _>>(),
        )))
    } else {
        serde_json::from_slice(body).map(Some).map_err(|_| HttpError::invalid_body())
    }
}

/// Scheme and authority generated URLs are built on.
fn base_url(public_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(public_url) = public_url {
        return public_url.trim_end_matches('/').to_owned();
    }
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|scheme| !scheme.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

async fn respond<S: ApiService>(api: S, request: ApiRequest, route: Route) -> Response {
    match api.oneshot(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            if let RegistryError::Internal(_) = err {
                error!("[http] {:?} request failed: {}", route, err);
            }
            HttpError::from_registry(&err, route).into_response()
        }
    }
}

async fn generate<S: ApiService>(
    State(state): State<HttpState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body = match parse_body(&headers, &body) {
        Ok(body) => body,
        Err(err) => {
            warn!("[http] Generate: unparseable body");
            return err.into_response();
        }
    };
    let json_data = match body {
        Some(Value::Object(mut fields)) => fields.remove("jsonData"),
        _ => None,
    };
    let base_url = base_url(state.public_url.as_deref(), &headers);
    respond(state.api, ApiRequest::Generate { json_data, base_url }, Route::Generate).await
}

async fn data<S: ApiService>(
    State(state): State<HttpState<S>>,
    Path(id): Path<String>,
    method: HttpMethod,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Bodies of GET, DELETE and unsupported methods are ignored, a malformed body is only
    // reported by the registry once the endpoint is known to exist
    let takes_body = method.as_str().parse::<Method>().is_ok_and(|method| method.takes_body());
    let body = if takes_body {
        parse_body(&headers, &body).map(Payload::from).unwrap_or_else(|_| {
            warn!("[http] Data: unparseable body for {} {}", method, id);
            Payload::Malformed
        })
    } else {
        Payload::Empty
    };
    respond(state.api, ApiRequest::Data { id, method: method.to_string(), body }, Route::Data).await
}

async fn info<S: ApiService>(State(state): State<HttpState<S>>, Path(id): Path<String>) -> Response {
    respond(state.api, ApiRequest::Info(id), Route::Info).await
}

async fn fallback() -> Response {
    HttpError::route_not_found().into_response()
}

/// CORS policy: any origin (mirrored), the endpoint methods plus preflight, JSON bodies.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            HttpMethod::GET,
            HttpMethod::POST,
            HttpMethod::PUT,
            HttpMethod::PATCH,
            HttpMethod::DELETE,
            HttpMethod::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build the application router around a mock API service.
pub fn router<S: ApiService>(api: S, config: &HttpConfig) -> Router {
    let state = HttpState { api, public_url: config.public_url.clone() };
    Router::new()
        .route(GENERATE_PATH, post(generate::<S>))
        .route(&format!("{DATA_PATH}/{{id}}"), any(data::<S>))
        .route(&format!("{INFO_PATH}/{{id}}"), get(info::<S>))
        .fallback(fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<S: ApiService>(
    listener: TcpListener,
    api: S,
    config: HttpConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = router(api, &config);
    info!("[http] Serving on {}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    #[test]
    fn unit_parse_body_variants() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_body(&headers, &Bytes::new()).unwrap(), None);
        assert_eq!(
            parse_body(&headers, &Bytes::from_static(br#"{"a":[1,2]}"#)).unwrap(),
            Some(json!({"a": [1, 2]}))
        );
        assert_eq!(parse_body(&headers, &Bytes::from_static(b"{oops")).unwrap_err(), HttpError::invalid_body());

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        assert_eq!(
            parse_body(&headers, &Bytes::from_static(b"name=widget&size=2")).unwrap(),
            Some(json!({"name": "widget", "size": "2"}))
        );
    }

    #[test]
    fn unit_base_url_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(base_url(None, &headers), "http://localhost");

        headers.insert(header::HOST, HeaderValue::from_static("mock.local:5000"));
        assert_eq!(base_url(None, &headers), "http://mock.local:5000");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert_eq!(base_url(None, &headers), "https://mock.local:5000");

        assert_eq!(base_url(Some("https://api.example.com/"), &headers), "https://api.example.com");
    }

    #[test]
    fn unit_error_status_mapping() {
        let cases = [
            (RegistryError::MissingData, Route::Generate, StatusCode::BAD_REQUEST, "No JSON data provided"),
            (RegistryError::MissingData, Route::Data, StatusCode::BAD_REQUEST, "No request body provided"),
            (RegistryError::InvalidBody, Route::Data, StatusCode::BAD_REQUEST, "Invalid request body"),
            (RegistryError::NotFound("x".into()), Route::Info, StatusCode::NOT_FOUND, "Endpoint not found"),
            (
                RegistryError::MethodNotAllowed("TRACE".into()),
                Route::Data,
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
            ),
            (
                RegistryError::InvalidMergeTarget,
                Route::Data,
                StatusCode::UNPROCESSABLE_ENTITY,
                "PATCH requires JSON objects on both sides",
            ),
            (
                RegistryError::CapacityExhausted(1),
                Route::Generate,
                StatusCode::SERVICE_UNAVAILABLE,
                "Endpoint capacity exhausted",
            ),
            (
                RegistryError::Internal("boom".into()),
                Route::Generate,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        ];
        for (err, route, status, message) in cases {
            let http_error = HttpError::from_registry(&err, route);
            assert_eq!(http_error.status(), status);
            assert_eq!(http_error.message(), message);
        }
    }
}
