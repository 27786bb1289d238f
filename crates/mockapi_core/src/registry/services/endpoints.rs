//! Endpoint registry service.
//!
//! Maps endpoint identifiers to mutable JSON documents and applies the per-method semantics
//! that make a document behave like a REST resource. Every operation on an identifier runs
//! under the map entry's exclusive guard: the existence check, the access counter increment
//! and the data mutation are applied together or not at all.
use std::{
    fmt,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    task::Poll,
};

use chrono::{DateTime, Utc};
use dashmap::{DashMap, Entry};
use serde_json::Value;
use tower::Service;
use tracing::{debug, info, warn};

use crate::registry::{
    api::types::{EndpointView, METHODS, Method, Payload, RegistryRequest, RegistryResponse},
    config::RegistryConfig,
    error::RegistryError,
    services::identifier::{EndpointId, IdGenerator, ShortIdGenerator},
};

/// Stored state of an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRecord {
    data: Value,
    created_at: DateTime<Utc>,
    access_count: u64,
}

impl EndpointRecord {
    fn new(data: Value) -> Self {
        Self { data, created_at: Utc::now(), access_count: 0 }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    fn view(&self, id: &EndpointId) -> EndpointView {
        EndpointView {
            id: id.clone(),
            created_at: self.created_at,
            access_count: self.access_count,
            methods: METHODS,
            data: self.data.clone(),
        }
    }
}

/// Shallow merge of `patch` into `data`, both must be JSON objects.
///
/// Builds a new value so a rejected merge leaves the stored document untouched.
fn merge_top_level(data: &Value, patch: Value) -> Result<Value, RegistryError> {
    match (data, patch) {
        (Value::Object(current), Value::Object(patch)) => {
            let mut merged = current.clone();
            merged.extend(patch);
            Ok(Value::Object(merged))
        }
        _ => Err(RegistryError::InvalidMergeTarget),
    }
}

/// Endpoint registry, cheap to clone and shared by all request handlers.
#[derive(Clone)]
pub struct EndpointRegistry {
    config: RegistryConfig,
    generator: Arc<dyn IdGenerator>,
    endpoints: Arc<DashMap<EndpointId, EndpointRecord>>,
    /// Live endpoints plus in-flight creations, enforces `max_endpoints`
    reserved: Arc<AtomicUsize>,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointRegistry")
            .field("config", &self.config)
            .field("endpoints", &self.endpoints.len())
            .finish()
    }
}

impl EndpointRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_generator(config, ShortIdGenerator::new())
    }

    pub fn with_generator(config: RegistryConfig, generator: impl IdGenerator + 'static) -> Self {
        Self {
            config,
            generator: Arc::new(generator),
            endpoints: Arc::new(DashMap::new()),
            reserved: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of live endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    fn reserve_slot(&self) -> Result<(), RegistryError> {
        match self.config.max_endpoints {
            Some(limit) => self
                .reserved
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |reserved| {
                    (reserved < limit).then_some(reserved + 1)
                })
                .map(|_| ())
                .map_err(|_| RegistryError::CapacityExhausted(limit)),
            None => {
                self.reserved.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
        }
    }

    fn release_slot(&self) {
        self.reserved.fetch_sub(1, Ordering::AcqRel);
    }

    /// Store `data` under a fresh identifier.
    ///
    /// Generated identifiers are inserted through the vacant entry of the map, a collision
    /// with a live key triggers a new draw and never overwrites the existing record.
    pub fn create(&self, data: Option<Value>) -> Result<(EndpointId, EndpointRecord), RegistryError> {
        let data = match data {
            None | Some(Value::Null) => return Err(RegistryError::MissingData),
            Some(data) => data,
        };
        self.reserve_slot()?;

        for attempt in 1..=self.config.max_id_attempts {
            match self.endpoints.entry(self.generator.generate()) {
                Entry::Occupied(entry) => {
                    warn!("[registry] Create: identifier collision on {} (attempt {attempt})", entry.key());
                }
                Entry::Vacant(entry) => {
                    let id = entry.key().clone();
                    let record = EndpointRecord::new(data);
                    entry.insert(record.clone());
                    debug!("[registry] Create: {} stored, {} live endpoints", id, self.endpoints.len());
                    return Ok((id, record));
                }
            }
        }

        self.release_slot();
        Err(RegistryError::Internal(format!(
            "no free identifier after {} attempts",
            self.config.max_id_attempts
        )))
    }

    /// Apply `method` to the endpoint `id` with an already parsed body.
    pub fn dispatch(
        &self,
        id: &str,
        method: &str,
        body: Option<Value>,
    ) -> Result<RegistryResponse, RegistryError> {
        self.dispatch_payload(id, method, Payload::from(body))
    }

    /// Apply `method` to the endpoint `id`.
    ///
    /// Unknown identifiers are reported before the method or the body is validated. A
    /// successful call increments the access counter exactly once, a failed call changes
    /// nothing.
    pub fn dispatch_payload(
        &self,
        id: &str,
        method: &str,
        payload: Payload,
    ) -> Result<RegistryResponse, RegistryError> {
        let Entry::Occupied(mut entry) = self.endpoints.entry(EndpointId::from(id)) else {
            return Err(RegistryError::NotFound(id.to_owned()));
        };
        let method = method.parse::<Method>()?;
        let body = match payload {
            Payload::Malformed if method.takes_body() => return Err(RegistryError::InvalidBody),
            Payload::Json(body) => Some(body),
            Payload::Empty | Payload::Malformed => None,
        };

        let response = match method {
            Method::Get => RegistryResponse::Data(entry.get().data.clone()),
            Method::Post | Method::Put => {
                let body = body.ok_or(RegistryError::MissingData)?;
                entry.get_mut().data = body.clone();
                if method == Method::Post {
                    RegistryResponse::Updated(body)
                } else {
                    RegistryResponse::Replaced(body)
                }
            }
            Method::Patch => {
                let patch = body.ok_or(RegistryError::MissingData)?;
                let merged = merge_top_level(&entry.get().data, patch)?;
                entry.get_mut().data = merged.clone();
                RegistryResponse::Patched(merged)
            }
            Method::Delete => {
                let record = entry.remove();
                self.release_slot();
                debug!("[registry] Dispatch: {} removed after {} accesses", id, record.access_count + 1);
                return Ok(RegistryResponse::Deleted);
            }
        };

        let record = entry.get_mut();
        record.access_count += 1;
        debug!("[registry] Dispatch: {} {} (access #{})", method, id, record.access_count);
        Ok(response)
    }

    /// Snapshot of the endpoint `id`, counted as an access when configured so.
    pub fn inspect(&self, id: &str) -> Result<EndpointView, RegistryError> {
        if self.config.count_inspections {
            let mut record =
                self.endpoints.get_mut(id).ok_or_else(|| RegistryError::NotFound(id.to_owned()))?;
            record.access_count += 1;
            Ok(record.value().view(record.key()))
        } else {
            let record =
                self.endpoints.get(id).ok_or_else(|| RegistryError::NotFound(id.to_owned()))?;
            Ok(record.value().view(record.key()))
        }
    }
}

impl Service<RegistryRequest> for EndpointRegistry {
    type Response = RegistryResponse;
    type Error = RegistryError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: RegistryRequest) -> Self::Future {
        let this = self.clone();
        Box::pin(async move {
            match request {
                RegistryRequest::Create(data) => {
                    info!("[registry] Create");
                    this.create(data)
                        .map(|(id, record)| RegistryResponse::Created { id, created_at: record.created_at })
                }
                RegistryRequest::Dispatch { id, method, body } => {
                    info!("[registry] Dispatch: {} {}", method, id);
                    this.dispatch_payload(&id, &method, body)
                }
                RegistryRequest::Inspect(id) => {
                    info!("[registry] Inspect: {}", id);
                    this.inspect(&id).map(RegistryResponse::Info)
                }
            }
        })
    }
}
