//! HTTP boundary for the activity tracker store.
//!
//! Translates JSON requests into repository calls from `activity_core` and
//! repository errors into status codes.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::{build_app, serve};
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;
