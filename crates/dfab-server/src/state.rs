use std::sync::Arc;

use dfab_blob::FsBlobStore;
use dfab_convert::{CommandConverter, Converter, RoutingConverter};
use dfab_meta::{InMemoryMetadataStore, MetadataStore, SqliteMetadataStore};
use dfab_service::DocumentService;

use crate::config::{MetadataBackend, ServerConfig};
use crate::error::ServerResult;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub service: DocumentService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(service: DocumentService, config: ServerConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }

    /// Open the stores named by `config` and wire up the service.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let service = build_service(&config)?;
        Ok(Self::new(service, config))
    }
}

/// Build the document service described by `config`.
pub fn build_service(config: &ServerConfig) -> ServerResult<DocumentService> {
    config.validate()?;

    let blobs = Arc::new(FsBlobStore::open(&config.storage_root)?);
    let meta: Arc<dyn MetadataStore> = match config.metadata_backend {
        MetadataBackend::Sqlite => Arc::new(SqliteMetadataStore::open(config.database_path())?),
        MetadataBackend::Memory => Arc::new(InMemoryMetadataStore::new()),
    };
    let converter: Arc<dyn Converter> = match &config.converter.command {
        Some(argv) => Arc::new(RoutingConverter::with_command(CommandConverter::new(
            argv.clone(),
        )?)),
        None => Arc::new(RoutingConverter::text_only()),
    };

    tracing::debug!(
        storage_root = %config.storage_root.display(),
        backend = ?config.metadata_backend,
        converter = converter.name(),
        "document service ready"
    );
    Ok(DocumentService::new(meta, blobs, converter))
}
