use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

/// Authenticated administrator, resolved from Basic auth on every request.
/// All mutating pass routes and the checkout surface require this.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub admin_id: i64,
    pub email: String,
    pub display_name: String,
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AdminUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let credentials = String::from_utf8(decoded)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let mut parts_iter = credentials.splitn(2, ':');
        let email = parts_iter.next().ok_or(StatusCode::UNAUTHORIZED)?;
        let password = parts_iter.next().ok_or(StatusCode::UNAUTHORIZED)?;

        let row: Option<crate::models::Admin> = sqlx::query_as(
            "SELECT * FROM admins WHERE email = $1 AND is_active = true",
        )
        .bind(email)
        .fetch_optional(&state.db.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let admin = row.ok_or(StatusCode::UNAUTHORIZED)?;

        // plain passwords only; this service sits behind the platform gateway
        if admin.password_plain.as_deref() != Some(password) {
            return Err(StatusCode::UNAUTHORIZED);
        }

        sqlx::query("UPDATE admins SET last_logged_in = NOW() WHERE admin_id = $1")
            .bind(admin.admin_id)
            .execute(&state.db.pool)
            .await
            .ok(); // login-time bookkeeping only

        Ok(AdminUser {
            admin_id: admin.admin_id,
            email: admin.email,
            display_name: admin.display_name,
        })
    }
}
