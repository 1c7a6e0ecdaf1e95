//! HTTP surface of filedrop.
//!
//! Upload, metadata, download and owner endpoints under `/api`, short-link
//! redirects under `/s`, signed blob retrieval under `/blobs`, plus account
//! endpoints, a health probe and the OpenAPI document.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
