//! Controller flows against a `wiremock` stand-in for the availability backend.

use availability_dashboard::availability::DataSource;
use availability_dashboard::controller;
use availability_dashboard::session::{BannerKind, Control, Phase};
use availability_dashboard::{AppState, DashboardConfig};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_state(server: &MockServer) -> AppState {
    let config = DashboardConfig {
        backend_url: server.uri(),
        refresh_reload_delay: Duration::from_millis(50),
        ..DashboardConfig::default()
    };
    AppState::new(config).expect("failed to build test state")
}

fn cached_payload() -> serde_json::Value {
    json!({
        "timestamp": "2026-10-15T06:00:00Z",
        "source": "railway",
        "resultados": {
            "arena": {
                "nombre": "Arena",
                "guid": "8d1c991c-a15f-42bc-8cb5-bd738aa19c70",
                "fechas": [
                    {"fecha": "2026-11-02", "plazas_disponibles": 8, "plazas_totales": 80}
                ],
                "timeslots_por_fecha": {
                    "2026-11-02": [
                        {"hora": "09:00", "capacidad": 0, "capacidad_original": 40},
                        {"hora": "11:00", "capacidad": 8, "capacidad_original": 40}
                    ]
                }
            }
        }
    })
}

fn live_payload() -> serde_json::Value {
    json!({
        "success": true,
        "meses_consultados": ["2026-10", "2026-11"],
        "timestamp": "2026-10-15 10:00:00",
        "resultados": {
            "24h-grupos": {
                "nombre": "24h Groups",
                "guid": "a9a4b0f8-bf3c-4f22-afcd-196a27be04b9",
                "total_fechas": 1,
                "total_plazas": 500,
                "fechas": [{
                    "fecha": "2026-10-20", "dia_semana": "Mar",
                    "plazas_disponibles": 500, "plazas_totales": 1000,
                    "porcentaje_ocupado": 50.0, "estado": "DISPONIBILIDAD MODERADA", "nivel": "media"
                }],
                "timeslots_por_fecha": {},
                "estadisticas": {"por_hora": [], "dias_agotamiento": []}
            }
        }
    })
}

async fn mount_cache(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/availability/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn banner_of(state: &AppState) -> Option<(BannerKind, String)> {
    let session = state.session.lock().await;
    session
        .visible_banner(Instant::now(), Duration::from_secs(5))
        .map(|b| (b.kind, b.message.clone()))
}

// ---------------------------------------------------------------------------
// Initial load
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initial_load_prefers_cached_availability() {
    let server = MockServer::start().await;
    mount_cache(&server, cached_payload()).await;
    Mock::given(method("POST"))
        .and(path("/api/consultar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::initial_load(&state).await;

    let session = state.session.lock().await;
    assert_eq!(session.phase, Phase::Results);
    assert_eq!(session.source(), Some(DataSource::Cache));
    let snapshot = session.snapshot.as_ref().unwrap();
    assert_eq!(snapshot.tours.len(), 1);
    assert_eq!(snapshot.tours[0].dates[0].occupancy_percent, 90.0);
}

#[tokio::test]
async fn initial_load_falls_back_to_stored_cookies_and_live_query() {
    let server = MockServer::start().await;
    mount_cache(&server, json!({"resultados": {}, "timestamp": ""})).await;
    Mock::given(method("GET"))
        .and(path("/api/cookies/auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "cookies": [{"name": "PHPSESSID", "value": "abc", "domain": "ticketing.colosseo.it"}],
            "count": 1,
            "timestamp": "2026-10-15T05:00:00Z",
            "source": "railway"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/consultar"))
        .and(body_partial_json(json!({"tours": ["24h-grupos", "arena"], "meses": 6})))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_payload()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-historico"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "message": "History updated", "filename": "historico.xlsx"
        })))
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::initial_load(&state).await;

    let session = state.session.lock().await;
    assert_eq!(session.phase, Phase::Results);
    assert_eq!(session.source(), Some(DataSource::Live));
    assert!(session.cookies_text.contains("PHPSESSID"));
    let date = &session.snapshot.as_ref().unwrap().tours[0].dates[0];
    assert_eq!(date.status_label, "DISPONIBILIDAD MODERADA");
}

#[tokio::test]
async fn initial_load_without_cache_or_cookies_ends_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/availability/cached"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cookies/auto"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false, "error": "Cookies not found"
        })))
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::initial_load(&state).await;

    assert_eq!(state.session.lock().await.phase, Phase::Error);
    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert!(message.contains("Cookies not found"), "{message}");
}

// ---------------------------------------------------------------------------
// Live query
// ---------------------------------------------------------------------------

#[tokio::test]
async fn query_without_cookies_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consultar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_payload()))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::run_query(&state).await;

    assert_eq!(state.session.lock().await.phase, Phase::Idle);
    let (kind, _) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
}

#[tokio::test]
async fn query_error_message_reaches_the_banner() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consultar"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid cookies"})),
        )
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::set_cookies_text(&state, "[]").await;
    controller::run_query(&state).await;

    let session = state.session.lock().await;
    assert_eq!(session.phase, Phase::Error);
    assert!(!session.is_busy(Control::Query));
    drop(session);
    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert_eq!(message, "Invalid cookies");
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_refresh_reloads_cache_after_delay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/railway/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;
    mount_cache(&server, cached_payload()).await;

    let state = test_state(&server);
    controller::trigger_refresh(&state).await;

    {
        let session = state.session.lock().await;
        assert_eq!(session.phase, Phase::Loading);
        assert!(session.is_busy(Control::Refresh));
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    let session = state.session.lock().await;
    assert_eq!(session.phase, Phase::Results);
    assert_eq!(session.source(), Some(DataSource::Cache));
    assert!(!session.is_busy(Control::Refresh));
}

#[tokio::test]
async fn failed_refresh_reloads_cache_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/railway/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false, "error": "job busy"
        })))
        .mount(&server)
        .await;
    mount_cache(&server, cached_payload()).await;

    let state = test_state(&server);
    controller::trigger_refresh(&state).await;

    let session = state.session.lock().await;
    assert_eq!(session.phase, Phase::Results);
    assert!(!session.is_busy(Control::Refresh));
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn saving_tabular_cookies_is_refused_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-cookies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::save_cookies(&state, "_ga\tabc\tcolosseo.example").await;

    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert!(message.contains("Convert format"));
}

#[tokio::test]
async fn converted_cookies_can_be_saved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-cookies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "message": "Cookies saved (1 cookies)"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::convert_cookies(&state, "_ga\tabc\tcolosseo.example\nother\tx\tads.example").await;
    let converted = state.session.lock().await.cookies_text.clone();
    assert!(converted.starts_with('['));

    controller::save_cookies(&state, &converted).await;
    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Success);
    assert_eq!(message, "Cookies saved (1 cookies)");
}

#[tokio::test]
async fn cookie_file_text_lands_in_the_cookie_box() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cargar-cookies-archivo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "cookies": "[{\"name\": \"PHPSESSID\"}]"
        })))
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::load_cookie_file(&state).await;

    assert_eq!(
        state.session.lock().await.cookies_text,
        "[{\"name\": \"PHPSESSID\"}]"
    );
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn export_without_results_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/exportar-excel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_state(&server);
    assert!(controller::export_spreadsheet(&state).await.is_none());
    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert_eq!(message, "No data to export");
}

#[tokio::test]
async fn export_forwards_raw_results() {
    let server = MockServer::start().await;
    mount_cache(&server, cached_payload()).await;
    Mock::given(method("POST"))
        .and(path("/api/exportar-excel"))
        .and(body_partial_json(json!({"resultados": {"arena": {"nombre": "Arena"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04sheet".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::reload_from_cache(&state).await;
    let download = controller::export_spreadsheet(&state).await.unwrap();

    assert!(download.filename.starts_with("colosseo_disponibilidad_"));
    assert!(download.filename.ends_with(".xlsx"));
    assert_eq!(download.bytes, b"PK\x03\x04sheet".to_vec());
    assert!(!state.session.lock().await.is_busy(Control::Export));
}

#[tokio::test]
async fn initial_load_with_empty_stored_cookies_settles_in_error() {
    let server = MockServer::start().await;
    mount_cache(&server, json!({"resultados": {}, "timestamp": ""})).await;
    Mock::given(method("GET"))
        .and(path("/api/cookies/auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "cookies": ""
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/consultar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_payload()))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::initial_load(&state).await;

    assert_eq!(state.session.lock().await.phase, Phase::Error);
    let (kind, _) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
}

#[tokio::test]
async fn query_without_cookies_while_loading_settles_in_error() {
    let server = MockServer::start().await;
    let state = test_state(&server);
    state.session.lock().await.begin_loading();

    controller::run_query(&state).await;

    assert_eq!(state.session.lock().await.phase, Phase::Error);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manual_history_save_announces_the_file() {
    let server = MockServer::start().await;
    mount_cache(&server, cached_payload()).await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-historico"))
        .and(body_partial_json(json!({"resultados": {"arena": {"nombre": "Arena"}}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "message": "History updated", "filename": "historico.xlsx"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::reload_from_cache(&state).await;
    controller::save_history(&state).await;

    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Success);
    assert_eq!(message, "History updated in historico.xlsx");
    assert!(!state.session.lock().await.is_busy(Control::History));
}

#[tokio::test]
async fn manual_history_save_failure_raises_error_banner() {
    let server = MockServer::start().await;
    mount_cache(&server, cached_payload()).await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-historico"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "disk full"})))
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::reload_from_cache(&state).await;
    controller::save_history(&state).await;

    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert!(message.contains("disk full"), "{message}");
}

#[tokio::test]
async fn manual_history_save_without_results_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-historico"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::save_history(&state).await;

    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert_eq!(message, "No data to save");
}

#[tokio::test]
async fn background_history_failure_keeps_query_banner() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/consultar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(live_payload()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/guardar-historico"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "disk full"})))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server);
    controller::set_cookies_text(&state, "[{\"name\": \"PHPSESSID\"}]").await;
    controller::run_query(&state).await;

    // Give the spawned save time to hit the backend and fail.
    let deadline = Instant::now() + Duration::from_secs(2);
    while server.received_requests().await.unwrap_or_default().len() < 2 {
        assert!(Instant::now() < deadline, "history save never ran");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let session = state.session.lock().await;
    assert_eq!(session.phase, Phase::Results);
    assert!(!session.is_busy(Control::History));
    drop(session);
    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Success);
    assert_eq!(message, "Query completed");
}

#[tokio::test]
async fn history_download_is_named_by_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/descargar-historico"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04history".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server);
    let download = controller::download_history(&state).await.unwrap();

    let today = chrono::Local::now().date_naive();
    assert_eq!(download.filename, controller::history_filename(today));
    assert!(download.filename.starts_with("historico_disponibilidad_"));
    assert_eq!(download.bytes, b"PK\x03\x04history".to_vec());
}

#[tokio::test]
async fn failed_history_download_reports_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/descargar-historico"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "No history file yet"})),
        )
        .mount(&server)
        .await;

    let state = test_state(&server);
    assert!(controller::download_history(&state).await.is_none());
    let (kind, message) = banner_of(&state).await.unwrap();
    assert_eq!(kind, BannerKind::Error);
    assert!(message.contains("No history file yet"), "{message}");
}
