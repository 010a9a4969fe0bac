use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::PassResponse;
use crate::services::passes::NewPass;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/{event_id}/passes", get(list_passes))
        .route("/passes", post(create_pass))
        .route("/passes/{id}", delete(delete_pass))
        .route("/passes/{id}/stock", post(set_stock))
        .route("/passes/{id}/active", post(set_active))
        .route("/passes/{id}/payment-methods", put(set_payment_methods))
}

/* ---------- LISTING ---------- */

#[derive(Debug, Deserialize)]
struct ListPassesQuery {
    #[serde(default)]
    include_inactive: bool,
}

// GET /api/events/{event_id}/passes
async fn list_passes(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
    Query(params): Query<ListPassesQuery>,
) -> Result<Response, AppError> {
    if let Some(cached) = state
        .cache
        .get_pass_list(event_id, params.include_inactive)
        .await
    {
        return Ok(Response::builder()
            .header("Content-Type", "application/json")
            .header("X-Cache", "HIT")
            .body(Body::from(cached))
            .unwrap());
    }

    let passes = state
        .passes
        .list_for_event(event_id, params.include_inactive)
        .await?;
    let payload: Vec<PassResponse> = passes.into_iter().map(PassResponse::from).collect();

    if let Ok(json) = serde_json::to_string(&payload) {
        state
            .cache
            .cache_pass_list(event_id, params.include_inactive, &json)
            .await;
        return Ok(Response::builder()
            .header("Content-Type", "application/json")
            .header("X-Cache", "MISS")
            .body(Body::from(json))
            .unwrap());
    }

    Ok(Json(payload).into_response())
}

/* ---------- CREATION ---------- */

#[derive(Debug, Deserialize)]
struct CreatePassRequest {
    event_id: i64,
    name: String,
    description: Option<String>,
    price: f64,
    max_quantity: Option<i64>,
    #[serde(default)]
    allowed_payment_methods: Vec<String>,
    is_active: Option<bool>,
}

// POST /api/passes
async fn create_pass(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(req): Json<CreatePassRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.event_id <= 0 {
        return Err(AppError::Validation {
            field: "event_id",
            reason: "must be > 0".to_string(),
        });
    }

    let pass = state
        .passes
        .create(NewPass {
            event_id: req.event_id,
            name: req.name,
            description: req.description,
            price: req.price,
            max_quantity: req.max_quantity,
            allowed_payment_methods: req.allowed_payment_methods,
            is_active: req.is_active,
        })
        .await?;

    tracing::info!(admin = %admin.email, pass_id = pass.id, "admin created pass");
    state.cache.invalidate_passes(pass.event_id).await;

    Ok((StatusCode::CREATED, Json(PassResponse::from(pass))))
}

/* ---------- STOCK ---------- */

#[derive(Debug, Deserialize)]
struct StockUpdateRequest {
    // absent or null both mean "unlimited"
    max_quantity: Option<i64>,
}

// POST /api/passes/{id}/stock
async fn set_stock(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(pass_id): Path<i64>,
    Json(req): Json<StockUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pass = state.passes.set_max_quantity(pass_id, req.max_quantity).await?;

    tracing::info!(
        admin = %admin.email,
        pass_id,
        max_quantity = ?pass.max_quantity,
        "admin updated stock limit"
    );
    state.cache.invalidate_passes(pass.event_id).await;

    Ok((StatusCode::OK, Json(PassResponse::from(pass))))
}

#[derive(Debug, Deserialize)]
struct ActiveUpdateRequest {
    is_active: bool,
}

// POST /api/passes/{id}/active
async fn set_active(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(pass_id): Path<i64>,
    Json(req): Json<ActiveUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pass = state.passes.set_active(pass_id, req.is_active).await?;

    tracing::info!(admin = %admin.email, pass_id, is_active = req.is_active, "admin toggled pass");
    state.cache.invalidate_passes(pass.event_id).await;

    Ok((StatusCode::OK, Json(PassResponse::from(pass))))
}

/* ---------- PAYMENT METHODS ---------- */

#[derive(Debug, Deserialize)]
struct PaymentMethodsRequest {
    // whole-list replacement; empty means "all methods allowed"
    #[serde(default)]
    allowed_payment_methods: Vec<String>,
}

// PUT /api/passes/{id}/payment-methods
async fn set_payment_methods(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(pass_id): Path<i64>,
    Json(req): Json<PaymentMethodsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let pass = state
        .passes
        .set_allowed_payment_methods(pass_id, req.allowed_payment_methods)
        .await?;

    tracing::info!(admin = %admin.email, pass_id, "admin updated payment methods");
    state.cache.invalidate_passes(pass.event_id).await;

    Ok((StatusCode::OK, Json(PassResponse::from(pass))))
}

/* ---------- DELETION ---------- */

// DELETE /api/passes/{id}
async fn delete_pass(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(pass_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // remember the event before the row disappears
    let pass = state.passes.get(pass_id).await?;
    state.passes.delete(pass_id).await?;

    tracing::info!(admin = %admin.email, pass_id, "admin deleted pass");
    state.cache.invalidate_passes(pass.event_id).await;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "pass deleted" })),
    ))
}
