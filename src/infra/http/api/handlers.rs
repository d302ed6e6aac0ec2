//! Product and health handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use vitrine_api_types::{
    CreateProductRequest, HealthResponse, ProductResponse, UpdateProductRequest,
};

use crate::application::error::ErrorReport;
use crate::application::products::ProductError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};
use super::models::product_to_api;
use super::state::ApiState;

pub async fn health(State(state): State<ApiState>) -> Response {
    let database = state.products.store_health().await;
    let cache = state.products.cache_status().await;

    let (status, overall, database_label) = match &database {
        Ok(()) => (StatusCode::OK, "OK", "up"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "DEGRADED", "down"),
    };
    let body = HealthResponse {
        status: overall.to_string(),
        database: database_label.to_string(),
        cache: cache.as_str().to_string(),
    };

    let mut response = (status, Json(body)).into_response();
    if let Err(err) = database {
        ErrorReport::from_error("infra::http::health", status, &err).attach(&mut response);
    }
    response
}

pub async fn create_product(
    State(state): State<ApiState>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;

    let product = state
        .products
        .create(payload.into())
        .await
        .map_err(product_error_to_api)?;

    Ok((StatusCode::CREATED, Json(product_to_api(product))))
}

pub async fn list_products(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .products
        .get_all()
        .await
        .map_err(product_error_to_api)?;

    Ok(Json(products.into_iter().map(product_to_api).collect()))
}

pub async fn get_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_product_id(&id)?;

    let product = state
        .products
        .get_by_id(id)
        .await
        .map_err(product_error_to_api)?;

    Ok(Json(product_to_api(product)))
}

pub async fn update_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let id = parse_product_id(&id)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;

    let product = state
        .products
        .update(id, payload.into())
        .await
        .map_err(product_error_to_api)?;

    Ok(Json(product_to_api(product)))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_product_id(&id)?;

    state
        .products
        .delete(id)
        .await
        .map_err(product_error_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_product_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse::<i64>().map_err(|_| {
        ApiError::bad_request(
            "Invalid product ID",
            Some(format!("`{raw}` is not an integer")),
        )
    })
}

fn json_rejection_to_api(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("Invalid request body", Some(rejection.body_text()))
}

pub(crate) fn product_error_to_api(err: ProductError) -> ApiError {
    match err {
        ProductError::NotFound { .. } => ApiError::not_found("Product not found"),
        ProductError::Validation(DomainError::Validation { message }) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid product",
            Some(message),
        ),
        ProductError::Validation(err @ DomainError::Invariant { .. }) => {
            ApiError::internal(Some(err.to_string()))
        }
        ProductError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}
