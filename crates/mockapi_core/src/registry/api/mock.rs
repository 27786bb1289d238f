//! Mock API service implementation.
//!
//! Translates caller-facing requests into registry requests and shapes the registry results
//! into the JSON bodies returned to clients: the endpoint URL and advertised methods on
//! generation, the raw document on GET, confirmation messages on writes and deletions, and
//! the endpoint snapshot on info requests.
//!
//! The registry is a type parameter so alternative stores, or a registry wrapped in tower
//! layers, can sit behind the same contract.

use std::{future::Future, pin::Pin, task::Poll};

use tower::Service;
use tracing::{info, warn};

use crate::registry::{
    api::{
        DATA_PATH,
        types::{
            ApiRequest, ApiResponse, Confirmation, Generated, METHODS, RegistryRequest,
            RegistryResponse,
        },
    },
    error::RegistryError,
};

/// Builds the public URL of an endpoint from a base URL such as `http://localhost:5000`.
pub fn endpoint_url(base_url: &str, id: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), DATA_PATH, id)
}

/// Mock API Service
///
/// Serves generation, data and info requests on top of a registry service.
#[derive(Debug, Clone)]
pub struct MockApiService<R> {
    /// Service owning the endpoint records
    registry: R,
}

impl<R> MockApiService<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }
}

impl<R> Service<ApiRequest> for MockApiService<R>
where
    R: Service<RegistryRequest, Response = RegistryResponse, Error = RegistryError>
        + Clone
        + Send
        + 'static,
    R::Future: Send,
{
    type Response = ApiResponse;
    type Error = RegistryError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ApiRequest) -> Self::Future {
        let mut registry = self.registry.clone();
        Box::pin(async move {
            match request {
                ApiRequest::Generate { json_data, base_url } => {
                    info!("[api] Generate: base_url: {}", base_url);
                    match registry.call(RegistryRequest::Create(json_data)).await? {
                        RegistryResponse::Created { id, .. } => {
                            let url = endpoint_url(&base_url, id.as_str());
                            info!("[api] Generate: endpoint available at {}", url);
                            Ok(ApiResponse::Generated(Generated { url, methods: METHODS, id }))
                        }
                        _ => Err(RegistryError::Internal("unexpected registry response".to_string())),
                    }
                }
                ApiRequest::Data { id, method, body } => {
                    info!("[api] Data: {} {}", method, id);
                    let response = registry
                        .call(RegistryRequest::Dispatch { id: id.clone(), method, body })
                        .await
                        .inspect_err(|err| warn!("[api] Data: {} rejected: {}", id, err))?;
                    match response {
                        RegistryResponse::Data(data) => Ok(ApiResponse::Document(data)),
                        RegistryResponse::Updated(data) => Ok(ApiResponse::Confirmation(
                            Confirmation::new("Data updated successfully", Some(data)),
                        )),
                        RegistryResponse::Replaced(data) => Ok(ApiResponse::Confirmation(
                            Confirmation::new("Data replaced successfully", Some(data)),
                        )),
                        RegistryResponse::Patched(data) => Ok(ApiResponse::Confirmation(
                            Confirmation::new("Data patched successfully", Some(data)),
                        )),
                        RegistryResponse::Deleted => Ok(ApiResponse::Confirmation(
                            Confirmation::new("Data deleted successfully", None),
                        )),
                        _ => Err(RegistryError::Internal("unexpected registry response".to_string())),
                    }
                }
                ApiRequest::Info(id) => {
                    info!("[api] Info: {}", id);
                    match registry.call(RegistryRequest::Inspect(id)).await? {
                        RegistryResponse::Info(view) => Ok(ApiResponse::Info(view)),
                        _ => Err(RegistryError::Internal("unexpected registry response".to_string())),
                    }
                }
            }
        })
    }
}
