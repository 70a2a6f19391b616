pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod dates;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;
pub mod views;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::load_data;
