use crate::controller::{self, Download};
use crate::errors::AppError;
use crate::session::{ResultsTab, SessionSummary};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use std::time::Instant;

const SPREADSHEET_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
pub struct CookiesForm {
    #[serde(default)]
    pub cookies: String,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render_index(&session, Instant::now(), state.config.banner_ttl))
}

pub async fn get_session(State(state): State<AppState>) -> Json<SessionSummary> {
    let session = state.session.lock().await;
    Json(session.summary(Instant::now(), state.config.banner_ttl))
}

pub async fn convert_cookies(
    State(state): State<AppState>,
    Form(form): Form<CookiesForm>,
) -> Redirect {
    controller::convert_cookies(&state, &form.cookies).await;
    Redirect::to("/")
}

pub async fn load_cookies(State(state): State<AppState>) -> Redirect {
    controller::load_cookie_file(&state).await;
    Redirect::to("/")
}

pub async fn save_cookies(
    State(state): State<AppState>,
    Form(form): Form<CookiesForm>,
) -> Redirect {
    controller::save_cookies(&state, &form.cookies).await;
    Redirect::to("/")
}

pub async fn query(State(state): State<AppState>, Form(form): Form<CookiesForm>) -> Redirect {
    controller::set_cookies_text(&state, &form.cookies).await;
    controller::run_query(&state).await;
    Redirect::to("/")
}

pub async fn refresh(State(state): State<AppState>) -> Redirect {
    controller::trigger_refresh(&state).await;
    Redirect::to("/")
}

pub async fn reload(State(state): State<AppState>) -> Redirect {
    controller::reload_from_cache(&state).await;
    Redirect::to("/")
}

pub async fn toggle_panel(
    State(state): State<AppState>,
    Path(panel_id): Path<String>,
) -> Result<Redirect, AppError> {
    let panel_id = checked_id(&panel_id)?;
    controller::toggle_panel(&state, panel_id).await;
    Ok(Redirect::to(&format!("/#timeslots_{panel_id}")))
}

pub async fn select_tab(
    State(state): State<AppState>,
    Path((tour_id, tab)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let tour_id = checked_id(&tour_id)?;
    let tab = ResultsTab::parse(&tab)
        .ok_or_else(|| AppError::bad_request("tab must be 'dates' or 'stats'"))?;
    controller::select_tab(&state, tour_id, tab).await;
    Ok(Redirect::to(&format!("/#{tour_id}")))
}

pub async fn export(State(state): State<AppState>) -> Result<Response, AppError> {
    match controller::export_spreadsheet(&state).await {
        Some(download) => attachment(download),
        None => Ok(Redirect::to("/").into_response()),
    }
}

pub async fn save_history(State(state): State<AppState>) -> Redirect {
    controller::save_history(&state).await;
    Redirect::to("/")
}

pub async fn download_history(State(state): State<AppState>) -> Result<Response, AppError> {
    match controller::download_history(&state).await {
        Some(download) => attachment(download),
        None => Ok(Redirect::to("/").into_response()),
    }
}

/// Panel and tour ids only ever contain `[A-Za-z0-9_]`.
fn checked_id(raw: &str) -> Result<&str, AppError> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(raw)
    } else {
        Err(AppError::bad_request("invalid panel or tour id"))
    }
}

fn attachment(download: Download) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        download.filename
    ))
    .map_err(AppError::internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(SPREADSHEET_MIME)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}
