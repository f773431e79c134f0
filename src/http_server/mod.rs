//! # HTTP Facade
//!
//! Maps HTTP requests onto record store calls.
//!
//! # Endpoints
//!
//! - `POST /students`, `GET /students?limit&skip`
//! - `GET|PATCH|DELETE /students/:student_id`
//! - `GET /mcp` - capability discovery
//! - `GET /health`, `GET /metrics`

pub mod capability_routes;
pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;
pub mod student_routes;

pub use capability_routes::{capability_document, Capability, CAPABILITIES};
pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult, ErrorResponse};
pub use server::HttpServer;
