use crate::backend::BackendClient;
use crate::config::DashboardConfig;
use crate::errors::BackendError;
use crate::session::DashboardSession;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub backend: BackendClient,
    pub session: Arc<Mutex<DashboardSession>>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend_url)?;
        Ok(Self {
            config: Arc::new(config),
            backend,
            session: Arc::new(Mutex::new(DashboardSession::new())),
        })
    }
}
