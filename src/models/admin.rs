use serde::Serialize;
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Admin {
    pub admin_id: i64,
    pub email: String,
    pub password_plain: Option<String>, // For testing only
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_logged_in: DateTime<Utc>,
}
