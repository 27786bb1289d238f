

use serde_json::{Value, json};
use tower::Service;

use crate::registry::{
    api::{ApiRequest, ApiResponse, Confirmation},
    config::RegistryConfig,
    error::RegistryError,
    init_registry,
};

#[tokio::test]
async fn integration_round_trip() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default());

    let documents = [
        json!({"users": [{"id": 1, "name": "Ada"}, {"id": 2, "name": "Grace"}]}),
        json!([1, "two", 3.5, null, {"five": [5]}]),
        json!("plain string"),
        json!(42),
        json!(true),
    ];
    for document in documents {
        let id = generate!(api, document.clone());
        assert_document!(api, id, document);
    }
}

#[tokio::test]
async fn integration_same_data_yields_independent_endpoints() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default());

    let first = generate!(api, json!({"a": 1}));
    let second = generate!(api, json!({"a": 1}));
    assert_ne!(first, second);

    dispatch!(api, first, "PATCH", Some(json!({"b": 2}))).unwrap();
    assert_document!(api, first, json!({"a": 1, "b": 2}));
    assert_document!(api, second, json!({"a": 1}));

    dispatch!(api, second, "DELETE").unwrap();
    assert_document!(api, first, json!({"a": 1, "b": 2}));
}

#[tokio::test]
async fn integration_delete_finality() {
    crate::mockapi_tracing::init();
    let (registry, mut api) = init_registry(RegistryConfig::default());

    let id = generate!(api, json!({"a": 1}));
    assert_eq!(
        dispatch!(api, id, "DELETE").unwrap(),
        ApiResponse::Confirmation(Confirmation::new("Data deleted successfully", None))
    );
    assert!(registry.is_empty());

    for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
        assert_not_found!(api, id, method);
    }
    assert_eq!(
        api.call(ApiRequest::Info(id.clone())).await.unwrap_err(),
        RegistryError::NotFound(id.clone())
    );
}

#[tokio::test]
async fn integration_patch_merge_law() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default());

    let id = generate!(api, json!({"a": 0, "c": 3}));
    dispatch!(api, id, "PATCH", Some(json!({"a": 1}))).unwrap();
    assert_eq!(
        dispatch!(api, id, "PATCH", Some(json!({"b": 2}))).unwrap(),
        ApiResponse::Confirmation(Confirmation::new(
            "Data patched successfully",
            Some(json!({"a": 1, "b": 2, "c": 3}))
        ))
    );

    // Nested values are replaced, not merged
    dispatch!(api, id, "PATCH", Some(json!({"c": {"x": 1}}))).unwrap();
    dispatch!(api, id, "PATCH", Some(json!({"c": {"y": 2}}))).unwrap();
    assert_document!(api, id, json!({"a": 1, "b": 2, "c": {"y": 2}}));
}

#[tokio::test]
async fn integration_access_accounting() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default());

    let id = generate!(api, json!({"a": 1}));
    assert_access_count!(api, id, 0);

    dispatch!(api, id, "GET").unwrap();
    dispatch!(api, id, "POST", Some(json!({"a": 2}))).unwrap();
    dispatch!(api, id, "PUT", Some(json!({"a": 3}))).unwrap();
    dispatch!(api, id, "PATCH", Some(json!({"b": 4}))).unwrap();
    assert_access_count!(api, id, 4);

    // Rejected requests are not accesses
    dispatch!(api, id, "TRACE").unwrap_err();
    dispatch!(api, id, "PUT").unwrap_err();
    assert_access_count!(api, id, 4);
}

#[tokio::test]
async fn integration_counted_inspections() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default().with_count_inspections(true));

    let id = generate!(api, json!({"a": 1}));
    assert_access_count!(api, id, 1);
    dispatch!(api, id, "GET").unwrap();
    assert_access_count!(api, id, 3);
}

#[tokio::test]
async fn integration_missing_data_rejected() {
    crate::mockapi_tracing::init();
    let (registry, mut api) = init_registry(RegistryConfig::default());

    for json_data in [None, Some(Value::Null)] {
        assert_eq!(
            api.call(ApiRequest::Generate { json_data, base_url: "http://localhost".to_string() })
                .await
                .unwrap_err(),
            RegistryError::MissingData
        );
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn integration_unknown_id_rejected() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default());
    generate!(api, json!({"a": 1}));

    for method in ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
        assert_not_found!(api, "never-issued", method);
    }
}

#[tokio::test]
async fn integration_method_exhaustiveness() {
    crate::mockapi_tracing::init();
    let (_, mut api) = init_registry(RegistryConfig::default());
    let id = generate!(api, json!({"a": 1}));

    for method in ["HEAD", "OPTIONS", "TRACE", "CONNECT", "get", "PURGE"] {
        assert_eq!(
            dispatch!(api, id, method, Some(json!({"b": 2}))).unwrap_err(),
            RegistryError::MethodNotAllowed(method.to_string())
        );
    }
    assert_access_count!(api, id, 0);
    assert_document!(api, id, json!({"a": 1}));
}
