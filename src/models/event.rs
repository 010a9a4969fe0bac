use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

// Events are owned by the wider platform; this service only reads them
// to anchor passes and drive admin navigation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub datetime_start: DateTime<Utc>,
}
