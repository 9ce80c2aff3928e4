//! Dashboard operations. Each one updates the shared session, calls the
//! backend without holding the session lock, and ends with a banner.

use crate::availability::{from_cached_shape, from_live_shape};
use crate::config::{QUERY_MONTHS, TOUR_KEYS};
use crate::cookies::{is_structured, normalize_cookie_text, CookieConversion};
use crate::session::{BannerKind, Control, Phase, ResultsTab};
use crate::state::AppState;
use chrono::{DateTime, Local, NaiveDate};
use tokio::time::sleep;
use tracing::{info, warn};

/// A spreadsheet ready to hand to the browser.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// First load: cached availability if there is any, otherwise stored
/// cookies and a live query.
pub async fn initial_load(state: &AppState) {
    state.session.lock().await.begin_loading();

    match state.backend.cached_availability().await {
        Ok(cached) if !cached.parsed.resultados.is_empty() => {
            let snapshot = from_cached_shape(cached.parsed);
            info!(tours = snapshot.tours.len(), "loaded cached availability");
            let message = format!("Loaded cached availability ({})", snapshot.timestamp);
            let mut session = state.session.lock().await;
            session.finish_with_results(snapshot, cached.raw_results, message);
            return;
        }
        Ok(_) => info!("cached availability is empty, falling back to a live query"),
        Err(err) => warn!("cached availability unavailable: {err}"),
    }

    match state.backend.stored_cookies().await {
        Ok(cookies) if cookies.trim().is_empty() => {
            warn!("stored cookies are empty");
            let mut session = state.session.lock().await;
            session.finish_with_error("No cached data and the stored cookies are empty");
        }
        Ok(cookies) => {
            state.session.lock().await.cookies_text = cookies;
            run_query(state).await;
        }
        Err(err) => {
            warn!("stored cookies unavailable: {err}");
            let mut session = state.session.lock().await;
            session.finish_with_error(format!("No cached data and no stored cookies: {err}"));
        }
    }
}

/// Live query for the fixed tour pair over [`QUERY_MONTHS`] months.
pub async fn run_query(state: &AppState) {
    let cookies = {
        let mut session = state.session.lock().await;
        let cookies = session.cookies_text.trim().to_string();
        if cookies.is_empty() {
            const MESSAGE: &str = "Please enter the cookies first";
            if session.phase == Phase::Loading {
                session.finish_with_error(MESSAGE);
            } else {
                session.show_banner(BannerKind::Error, MESSAGE);
            }
            return;
        }
        // The query already in flight settles the phase.
        if !session.try_acquire(Control::Query) {
            return;
        }
        session.begin_loading();
        cookies
    };

    let outcome = state
        .backend
        .query_availability(&cookies, &TOUR_KEYS, QUERY_MONTHS)
        .await;

    let mut session = state.session.lock().await;
    session.release(Control::Query);
    match outcome {
        Ok(result) => {
            let snapshot = from_live_shape(result.parsed);
            info!(tours = snapshot.tours.len(), "live query completed");
            let raw_results = result.raw_results;
            session.finish_with_results(snapshot, raw_results.clone(), "Query completed");
            drop(session);

            let state = state.clone();
            tokio::spawn(async move { save_history_snapshot(&state, &raw_results, true).await });
        }
        Err(err) => {
            warn!("live query failed: {err}");
            session.finish_with_error(err.to_string());
        }
    }
}

/// Triggers the remote refresh job. On success the cache is reloaded after
/// the configured delay; on failure it is reloaded right away. The refresh
/// control stays disabled until that reload finishes.
pub async fn trigger_refresh(state: &AppState) {
    {
        let mut session = state.session.lock().await;
        if !session.try_acquire(Control::Refresh) {
            return;
        }
        session.begin_loading();
    }

    match state.backend.trigger_refresh().await {
        Ok(_) => {
            let delay = state.config.refresh_reload_delay;
            info!(delay_secs = delay.as_secs(), "refresh job triggered");
            state.session.lock().await.show_banner(
                BannerKind::Success,
                format!("Refresh started; reloading in {} seconds", delay.as_secs()),
            );

            let state = state.clone();
            tokio::spawn(async move {
                sleep(delay).await;
                reload_from_cache(&state).await;
                state.session.lock().await.release(Control::Refresh);
            });
        }
        Err(err) => {
            warn!("refresh trigger failed, reloading cache: {err}");
            reload_from_cache(state).await;
            state.session.lock().await.release(Control::Refresh);
        }
    }
}

pub async fn reload_from_cache(state: &AppState) {
    state.session.lock().await.begin_loading();
    let outcome = state.backend.cached_availability().await;

    let mut session = state.session.lock().await;
    match outcome {
        Ok(cached) if !cached.parsed.resultados.is_empty() => {
            let snapshot = from_cached_shape(cached.parsed);
            let message = format!("Availability reloaded ({})", snapshot.timestamp);
            session.finish_with_results(snapshot, cached.raw_results, message);
        }
        Ok(_) => session.finish_with_error("No cached availability yet"),
        Err(err) => {
            warn!("cache reload failed: {err}");
            session.finish_with_error(format!("Could not load cached availability: {err}"));
        }
    }
}

/// Normalizes the pasted cookie text in place.
pub async fn convert_cookies(state: &AppState, text: &str) {
    let mut session = state.session.lock().await;
    session.cookies_text = text.trim().to_string();
    match normalize_cookie_text(text) {
        Ok(CookieConversion::AlreadyStructured) => {
            session.show_banner(BannerKind::Success, "Cookies are already valid JSON");
        }
        Ok(CookieConversion::Converted { cookies, json }) => {
            session.cookies_text = json;
            session.show_banner(
                BannerKind::Success,
                format!("Converted {} cookies to JSON", cookies.len()),
            );
        }
        Err(err) => session.show_banner(BannerKind::Error, err.to_string()),
    }
}

pub async fn load_cookie_file(state: &AppState) {
    let outcome = state.backend.load_cookie_file().await;
    let mut session = state.session.lock().await;
    match outcome {
        Ok(cookies) => {
            session.cookies_text = cookies;
            session.show_banner(BannerKind::Success, "Cookies loaded from file");
        }
        Err(err) => session.show_banner(BannerKind::Error, format!("Could not load cookies: {err}")),
    }
}

pub async fn save_cookies(state: &AppState, text: &str) {
    let cookies = text.trim().to_string();
    {
        let mut session = state.session.lock().await;
        session.cookies_text = cookies.clone();
        if cookies.is_empty() {
            session.show_banner(BannerKind::Error, "Please paste the cookies first");
            return;
        }
        if !is_structured(&cookies) {
            session.show_banner(
                BannerKind::Error,
                "Cookies must be JSON; use \"Convert format\" first",
            );
            return;
        }
    }

    let outcome = state.backend.save_cookies(&cookies).await;
    let mut session = state.session.lock().await;
    match outcome {
        Ok(ack) => session.show_banner(
            BannerKind::Success,
            ack.message.unwrap_or_else(|| "Cookies saved".to_string()),
        ),
        Err(err) => session.show_banner(BannerKind::Error, format!("Could not save cookies: {err}")),
    }
}

/// Stores the cookie text submitted alongside a query.
pub async fn set_cookies_text(state: &AppState, text: &str) {
    state.session.lock().await.cookies_text = text.trim().to_string();
}

pub async fn export_spreadsheet(state: &AppState) -> Option<Download> {
    let results = {
        let mut session = state.session.lock().await;
        let Some(results) = session.raw_results.clone() else {
            session.show_banner(BannerKind::Error, "No data to export");
            return None;
        };
        if !session.try_acquire(Control::Export) {
            return None;
        }
        results
    };

    let outcome = state.backend.export_spreadsheet(&results).await;
    let mut session = state.session.lock().await;
    session.release(Control::Export);
    match outcome {
        Ok(bytes) => {
            session.show_banner(BannerKind::Success, "Spreadsheet downloaded");
            Some(Download {
                filename: export_filename(Local::now()),
                bytes,
            })
        }
        Err(err) => {
            warn!("export failed: {err}");
            session.show_banner(BannerKind::Error, format!("Export failed: {err}"));
            None
        }
    }
}

/// Saves the current results as a history snapshot.
pub async fn save_history(state: &AppState) {
    let results = {
        let mut session = state.session.lock().await;
        let Some(results) = session.raw_results.clone() else {
            session.show_banner(BannerKind::Error, "No data to save");
            return;
        };
        results
    };
    save_history_snapshot(state, &results, false).await;
}

/// `background` saves report failures only to the log.
async fn save_history_snapshot(state: &AppState, results: &serde_json::Value, background: bool) {
    if !state.session.lock().await.try_acquire(Control::History) {
        return;
    }
    let outcome = state.backend.save_history(results).await;
    let mut session = state.session.lock().await;
    session.release(Control::History);
    match outcome {
        Ok(ack) => {
            let message = ack.message.unwrap_or_else(|| "History saved".to_string());
            info!(filename = ?ack.filename, "{message}");
            let text = match ack.filename {
                Some(filename) => format!("{message} in {filename}"),
                None => message,
            };
            session.show_banner(BannerKind::Success, text);
        }
        Err(err) => {
            warn!("saving history failed: {err}");
            if !background {
                session.show_banner(BannerKind::Error, format!("Could not save history: {err}"));
            }
        }
    }
}

pub async fn download_history(state: &AppState) -> Option<Download> {
    let outcome = state.backend.download_history().await;
    let mut session = state.session.lock().await;
    match outcome {
        Ok(bytes) => {
            session.show_banner(BannerKind::Success, "History downloaded");
            Some(Download {
                filename: history_filename(Local::now().date_naive()),
                bytes,
            })
        }
        Err(err) => {
            session.show_banner(BannerKind::Error, format!("History download failed: {err}"));
            None
        }
    }
}

pub async fn toggle_panel(state: &AppState, panel_id: &str) -> bool {
    state.session.lock().await.toggle_panel(panel_id)
}

pub async fn select_tab(state: &AppState, tour_id: &str, tab: ResultsTab) {
    state.session.lock().await.select_tab(tour_id, tab);
}

pub fn export_filename(now: DateTime<Local>) -> String {
    format!("colosseo_disponibilidad_{}.xlsx", now.timestamp_millis())
}

pub fn history_filename(today: NaiveDate) -> String {
    format!("historico_disponibilidad_{today}.xlsx")
}
