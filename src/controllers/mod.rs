pub mod events;
pub mod passes;
pub mod checkout;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(passes::routes())
        .merge(checkout::routes())
}
