use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/session", get(handlers::get_session))
        .route("/cookies/convert", post(handlers::convert_cookies))
        .route("/cookies/load", post(handlers::load_cookies))
        .route("/cookies/save", post(handlers::save_cookies))
        .route("/query", post(handlers::query))
        .route("/refresh", post(handlers::refresh))
        .route("/reload", post(handlers::reload))
        .route("/panels/:panel_id/toggle", post(handlers::toggle_panel))
        .route("/tabs/:tour_id/:tab", post(handlers::select_tab))
        .route("/export", post(handlers::export))
        .route("/history/save", post(handlers::save_history))
        .route("/history/download", get(handlers::download_history))
        .with_state(state)
}
