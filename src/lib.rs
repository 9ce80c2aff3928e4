pub mod app;
pub mod availability;
pub mod backend;
pub mod config;
pub mod controller;
pub mod cookies;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod session;
pub mod state;
pub mod stats;
pub mod status;
pub mod table;
pub mod timeslots;
pub mod ui;

pub use app::router;
pub use config::DashboardConfig;
pub use state::AppState;
