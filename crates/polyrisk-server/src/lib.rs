//! polyrisk-server - HTTP transport for the polyrisk pipeline
//!
//! Two axum servers share one process image:
//! - the pipeline server (`POST /run`, `GET /health`)
//! - the biomedical summary server (`POST /summarize`)

/// Server configuration from the environment
pub mod config;

/// API error types
pub mod error;

/// HTTP handlers and routers
pub mod handlers;

/// Server startup
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use handlers::{biomed_router, pipeline_router, AppState, BiomedState};
pub use server::{build_controller, serve_biomed, serve_pipeline};
