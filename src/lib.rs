pub mod aggregator;
pub mod app;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod github;
pub mod handlers;
pub mod inactivity;
pub mod loads;
pub mod models;
pub mod notifications;
pub mod repo_status;
pub mod stats;
pub mod state;
pub mod storage;
pub mod todos;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{LocalStore, load_data};
