mod support;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use vitrine::cache::{CacheBackend, DisabledCache};
use vitrine::infra::http::{ApiState, REQUEST_ID_HEADER, build_router};
use vitrine_api_types::{ApiErrorBody, HealthResponse, ProductResponse};

use support::{FailingCache, InMemoryProducts, memory_cache, service};

fn router_with(store: &Arc<InMemoryProducts>, cache: Arc<dyn CacheBackend>) -> Router {
    let (products, _) = service(store, cache);
    build_router(ApiState::new(products))
}

fn router() -> (Router, Arc<InMemoryProducts>) {
    let store = InMemoryProducts::new();
    (router_with(&store, memory_cache()), store)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn create_pen(app: &Router) -> ProductResponse {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/products",
            json!({"name": "Pen", "description": "Blue ink", "price": 1.5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn product_crud_round_trip() {
    let (app, _) = router();

    let created = create_pen(&app).await;
    assert!(created.id > 0);
    assert_eq!(created.price, 1.5);
    assert_eq!(created.created_at, created.updated_at);

    let uri = format!("/api/v1/products/{}", created.id);
    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: ProductResponse = body_json(response).await;
    assert_eq!(fetched, created);

    let response = app
        .clone()
        .oneshot(json_request(Method::PUT, &uri, json!({"price": 2.0})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: ProductResponse = body_json(response).await;
    assert_eq!(updated.name, "Pen");
    assert_eq!(updated.price, 2.0);
    assert!(updated.updated_at > updated.created_at);

    let response = app
        .clone()
        .oneshot(json_request(Method::PATCH, &uri, json!({"name": "Marker"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let patched: ProductResponse = body_json(response).await;
    assert_eq!(patched.name, "Marker");
    assert_eq!(patched.price, 2.0);

    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ApiErrorBody = body_json(response).await;
    assert_eq!(body.error.code, "not_found");

    let response = app
        .oneshot(empty_request(Method::DELETE, &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn list_returns_products_in_id_order() {
    let (app, _) = router();
    for _ in 0..3 {
        create_pen(&app).await;
    }

    let response = app
        .oneshot(empty_request(Method::GET, "/api/v1/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<ProductResponse> = body_json(response).await;
    let ids: Vec<i64> = listed.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn empty_list_is_an_empty_array() {
    let (app, _) = router();
    let response = app
        .oneshot(empty_request(Method::GET, "/api/v1/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

#[tokio::test]
async fn non_integer_ids_are_bad_requests() {
    let (app, store) = router();

    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = if method == Method::PUT {
            json_request(method, "/api/v1/products/abc", json!({"name": "X"}))
        } else {
            empty_request(method, "/api/v1/products/abc")
        };
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ApiErrorBody = body_json(response).await;
        assert_eq!(body.error.code, "bad_request");
        assert_eq!(body.error.message, "Invalid product ID");
    }
    assert_eq!(store.find_calls(), 0);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let (app, store) = router();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/products",
            json!({"name": "", "description": "Blue ink", "price": 1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorBody = body_json(response).await;
    assert_eq!(body.error.code, "invalid_input");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/products",
            json!({"name": "Pen", "description": "Blue ink", "price": -3}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/products")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\":"))
        .unwrap();
    let response = app.oneshot(malformed).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorBody = body_json(response).await;
    assert_eq!(body.error.code, "bad_request");

    assert_eq!(store.row_count().await, 0);
}

#[tokio::test]
async fn store_outage_maps_to_server_error() {
    let (app, store) = router();
    store.set_failing(true);

    let response = app
        .oneshot(empty_request(Method::GET, "/api/v1/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiErrorBody = body_json(response).await;
    assert_eq!(body.error.code, "repo_error");
}

#[tokio::test]
async fn cache_outage_does_not_change_responses() {
    let store = InMemoryProducts::new();
    let app = router_with(&store, Arc::new(FailingCache::default()));

    let created = create_pen(&app).await;
    let response = app
        .clone()
        .oneshot(empty_request(
            Method::GET,
            &format!("/api/v1/products/{}", created.id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(empty_request(Method::GET, "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.status, "OK");
    assert_eq!(health.cache, "degraded");
}

#[tokio::test]
async fn health_reports_store_and_cache_state() {
    let store = InMemoryProducts::new();
    let app = router_with(&store, memory_cache());

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = body_json(response).await;
    assert_eq!(
        health,
        HealthResponse {
            status: "OK".to_string(),
            database: "up".to_string(),
            cache: "up".to_string(),
        }
    );

    store.set_failing(true);
    let response = app
        .oneshot(empty_request(Method::GET, "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.status, "DEGRADED");
    assert_eq!(health.database, "down");

    let disabled = router_with(&InMemoryProducts::new(), Arc::new(DisabledCache));
    let response = disabled
        .oneshot(empty_request(Method::GET, "/health"))
        .await
        .unwrap();
    let health: HealthResponse = body_json(response).await;
    assert_eq!(health.cache, "disabled");
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let (app, _) = router();

    let request = Request::builder()
        .uri("/health")
        .header(&REQUEST_ID_HEADER, "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(&REQUEST_ID_HEADER).unwrap(),
        "req-123"
    );

    let response = app
        .oneshot(empty_request(Method::GET, "/health"))
        .await
        .unwrap();
    let generated = response
        .headers()
        .get(&REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn preflight_requests_are_answered_by_cors_layer() {
    let (app, store) = router();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/products")
        .header(header::ORIGIN, "https://shop.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    let headers = response.headers();
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_uppercase();
    assert!(methods.contains("PATCH"), "{methods}");
    let allowed_headers = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed_headers.contains("content-type"), "{allowed_headers}");
    assert!(headers.contains_key(header::VARY));
    assert_eq!(store.list_calls(), 0);
}

#[tokio::test]
async fn cross_origin_reads_carry_allow_origin() {
    let (app, store) = router();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/products")
        .header(header::ORIGIN, "https://shop.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
    assert_eq!(store.list_calls(), 1);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let (app, _) = router();
    let response = app
        .oneshot(empty_request(Method::GET, "/api/v2/products"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
