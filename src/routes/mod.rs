pub mod admin;
pub mod assets;
pub mod auth;
pub mod home;
pub mod upload;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::extractors::resolve_session;
use crate::state::AppState;

/// Page routes run behind session resolution; static assets skip it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(home::router())
        .merge(auth::router())
        .merge(upload::router())
        .merge(admin::router())
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .route("/assets/{*path}", get(assets::serve))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
