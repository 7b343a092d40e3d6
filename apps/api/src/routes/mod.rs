pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stateless turn API
        .route("/interview/turn", post(handlers::handle_turn))
        // Session API
        .route("/interview/state", get(handlers::handle_state))
        .route(
            "/interview/sessions",
            get(handlers::handle_history).post(handlers::handle_start),
        )
        .route(
            "/interview/sessions/:id",
            get(handlers::handle_get_session),
        )
        .route(
            "/interview/sessions/:id/select",
            post(handlers::handle_select),
        )
        .route("/interview/messages", post(handlers::handle_answer))
        .route("/interview/reset", post(handlers::handle_reset))
        .with_state(state)
}
