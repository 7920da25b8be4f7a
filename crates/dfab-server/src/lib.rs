//! HTTP server for DocFabric.
//!
//! Exposes the document lifecycle over REST under `/api/documents` and the
//! read-only agent tools under `/tools`. Every route goes through a shared
//! [`DocumentService`](dfab_service::DocumentService); see [`build_service`]
//! for how storage and conversion are wired from a [`ServerConfig`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod tools;

pub use config::{ConverterConfig, MetadataBackend, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorResponse, ServerError, ServerResult};
pub use router::build_router;
pub use server::DocFabricServer;
pub use state::{build_service, AppState};
pub use tools::{ToolDescriptor, TOOLS};
