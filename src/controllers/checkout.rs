use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::{PassResponse, PaymentMethod};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/checkout/sales", post(record_sale))
}

#[derive(Debug, Deserialize)]
struct RecordSaleRequest {
    pass_id: i64,
    payment_method: String,
}

// POST /api/checkout/sales — called by the order subsystem on a confirmed
// sale; this is the only path that increments sold_quantity.
async fn record_sale(
    State(state): State<Arc<AppState>>,
    _caller: AdminUser,
    Json(req): Json<RecordSaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.pass_id <= 0 {
        return Err(AppError::Validation {
            field: "pass_id",
            reason: "must be > 0".to_string(),
        });
    }

    let method = PaymentMethod::parse(&req.payment_method).ok_or_else(|| AppError::Validation {
        field: "payment_method",
        reason: format!(
            "unknown payment method '{}', expected one of: online, external_app, ambassador_cash",
            req.payment_method
        ),
    })?;

    let pass = state.passes.record_sale(req.pass_id, method).await?;
    state.cache.invalidate_passes(pass.event_id).await;

    Ok((StatusCode::CREATED, Json(PassResponse::from(pass))))
}
