use crate::cookies::cookie_payload_text;
use crate::errors::BackendError;
use crate::models::{
    Acknowledgement, CachedAvailability, CookieFileResponse, ErrorBody, QueryRequest, QueryResult,
    ResultsRequest, SaveCookiesRequest, StoredCookiesResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

const USER_AGENT: &str = concat!("availability-dashboard/", env!("CARGO_PKG_VERSION"));

/// A parsed response together with its raw `resultados` map, which exports
/// and history snapshots forward back to the backend untouched.
#[derive(Debug, Clone)]
pub struct WithRawResults<T> {
    pub parsed: T,
    pub raw_results: serde_json::Value,
}

/// HTTP client for the availability backend.
///
/// Non-2xx responses carrying an `error` field become [`BackendError::Api`];
/// acknowledgements with `success: false` become [`BackendError::Rejected`].
/// Nothing is retried and no timeout is applied.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns [`BackendError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Loads the cookie file kept by the backend, as text for the cookie box.
    pub async fn load_cookie_file(&self) -> Result<String, BackendError> {
        const ENDPOINT: &str = "/api/cargar-cookies-archivo";
        let response: CookieFileResponse = self.post_json(ENDPOINT, None::<&()>).await?;
        if !response.success {
            return Err(rejected(ENDPOINT, response.error));
        }
        let payload = response.cookies.unwrap_or(serde_json::Value::Null);
        cookie_payload_text(&payload).map_err(|source| BackendError::Deserialize {
            endpoint: ENDPOINT,
            source,
        })
    }

    pub async fn save_cookies(&self, cookies: &str) -> Result<Acknowledgement, BackendError> {
        const ENDPOINT: &str = "/api/guardar-cookies";
        let ack: Acknowledgement = self
            .post_json(ENDPOINT, Some(&SaveCookiesRequest { cookies }))
            .await?;
        ensure_success(ENDPOINT, ack)
    }

    pub async fn query_availability(
        &self,
        cookies: &str,
        tours: &[&str],
        months: u32,
    ) -> Result<WithRawResults<QueryResult>, BackendError> {
        const ENDPOINT: &str = "/api/consultar";
        let request = QueryRequest {
            cookies,
            tours,
            meses: months,
        };
        let value: serde_json::Value = self.post_json(ENDPOINT, Some(&request)).await?;
        with_raw_results(ENDPOINT, value)
    }

    /// Cookies refreshed automatically by the backend's scheduled job.
    pub async fn stored_cookies(&self) -> Result<String, BackendError> {
        const ENDPOINT: &str = "/api/cookies/auto";
        let response: StoredCookiesResponse = self.get_json(ENDPOINT).await?;
        if !response.success {
            return Err(rejected(ENDPOINT, response.error));
        }
        debug!(
            count = ?response.count,
            source = ?response.source,
            timestamp = ?response.timestamp,
            "stored cookies fetched"
        );
        match response.cookies {
            Some(payload) if !payload.is_null() => {
                cookie_payload_text(&payload).map_err(|source| BackendError::Deserialize {
                    endpoint: ENDPOINT,
                    source,
                })
            }
            _ => Err(rejected(ENDPOINT, Some("no stored cookies".to_string()))),
        }
    }

    pub async fn cached_availability(
        &self,
    ) -> Result<WithRawResults<CachedAvailability>, BackendError> {
        const ENDPOINT: &str = "/api/availability/cached";
        let value: serde_json::Value = self.get_json(ENDPOINT).await?;
        let cached = with_raw_results::<CachedAvailability>(ENDPOINT, value)?;
        if let Some(error) = cached.parsed.error.clone() {
            if cached.parsed.resultados.is_empty() {
                return Err(rejected(ENDPOINT, Some(error)));
            }
        }
        Ok(cached)
    }

    /// Starts the remote job that re-scrapes availability into the cache.
    pub async fn trigger_refresh(&self) -> Result<Acknowledgement, BackendError> {
        const ENDPOINT: &str = "/api/railway/trigger";
        let ack: Acknowledgement = self.post_json(ENDPOINT, None::<&()>).await?;
        ensure_success(ENDPOINT, ack)
    }

    pub async fn save_history(
        &self,
        resultados: &serde_json::Value,
    ) -> Result<Acknowledgement, BackendError> {
        const ENDPOINT: &str = "/api/guardar-historico";
        let ack: Acknowledgement = self
            .post_json(ENDPOINT, Some(&ResultsRequest { resultados }))
            .await?;
        ensure_success(ENDPOINT, ack)
    }

    pub async fn download_history(&self) -> Result<Vec<u8>, BackendError> {
        const ENDPOINT: &str = "/api/descargar-historico";
        let response = self.client.get(self.url(ENDPOINT)).send().await?;
        read_binary(ENDPOINT, response).await
    }

    pub async fn export_spreadsheet(
        &self,
        resultados: &serde_json::Value,
    ) -> Result<Vec<u8>, BackendError> {
        const ENDPOINT: &str = "/api/exportar-excel";
        let response = self
            .client
            .post(self.url(ENDPOINT))
            .json(&ResultsRequest { resultados })
            .send()
            .await?;
        read_binary(ENDPOINT, response).await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> Result<T, BackendError> {
        let response = self.client.get(self.url(endpoint)).send().await?;
        read_json(endpoint, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: Option<&B>,
    ) -> Result<T, BackendError> {
        let mut request = self.client.post(self.url(endpoint));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        read_json(endpoint, response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(status_error(endpoint, status.as_u16(), &body));
    }
    serde_json::from_slice(&body).map_err(|source| BackendError::Deserialize { endpoint, source })
}

async fn read_binary(endpoint: &'static str, response: Response) -> Result<Vec<u8>, BackendError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(status_error(endpoint, status.as_u16(), &body));
    }
    Ok(body.to_vec())
}

fn status_error(endpoint: &'static str, status: u16, body: &[u8]) -> BackendError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(message),
        }) => BackendError::Api {
            endpoint,
            status,
            message,
        },
        _ => BackendError::UnexpectedStatus { endpoint, status },
    }
}

fn with_raw_results<T: DeserializeOwned>(
    endpoint: &'static str,
    value: serde_json::Value,
) -> Result<WithRawResults<T>, BackendError> {
    let raw_results = value
        .get("resultados")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    let parsed = serde_json::from_value(value)
        .map_err(|source| BackendError::Deserialize { endpoint, source })?;
    Ok(WithRawResults {
        parsed,
        raw_results,
    })
}

fn ensure_success(
    endpoint: &'static str,
    ack: Acknowledgement,
) -> Result<Acknowledgement, BackendError> {
    if ack.success {
        Ok(ack)
    } else {
        Err(rejected(endpoint, ack.error))
    }
}

fn rejected(endpoint: &'static str, error: Option<String>) -> BackendError {
    BackendError::Rejected {
        endpoint,
        message: error.unwrap_or_else(|| "no details given".to_string()),
    }
}
