pub mod reset;

use axum::routing::post;
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/v1/auth/forgot-password",
            post(reset::forgot_password),
        )
        .route("/api/v1/auth/reset-password", post(reset::reset_password))
}
