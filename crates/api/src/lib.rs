pub mod error;
pub mod prober;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{Router, routing::get};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let debug_routes = Router::new()
        .route("/calls", get(routes::debug::list_calls))
        .route("/call/{call_id}", get(routes::debug::get_call));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/debug", debug_routes)
        .route("/ws", get(ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
