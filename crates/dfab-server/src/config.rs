use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use dfab_types::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Where document records are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// SQLite database at `{storage_root}/docfabric.db`.
    #[default]
    Sqlite,
    /// Process memory; lost on exit.
    Memory,
}

/// External converter settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Program and arguments; `{input}` is replaced by the original's path.
    /// Without a command only text inputs can be ingested.
    pub command: Option<Vec<String>>,
}

/// Server and storage configuration, loaded from TOML.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Root directory for originals, derived text and the record database.
    pub storage_root: PathBuf,
    pub metadata_backend: MetadataBackend,
    /// Cap on request bodies, uploads included.
    pub max_upload_bytes: usize,
    /// Page size used when a listing does not specify one.
    pub default_page_size: usize,
    pub converter: ConverterConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            storage_root: PathBuf::from("storage"),
            metadata_backend: MetadataBackend::Sqlite,
            max_upload_bytes: 100 * 1024 * 1024,
            default_page_size: dfab_types::DEFAULT_PAGE_SIZE,
            converter: ConverterConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(text: &str) -> ServerResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> ServerResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max_upload_bytes must be positive".into()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.default_page_size) {
            return Err(ServerError::Config(format!(
                "default_page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if let Some(command) = &self.converter.command {
            if command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(ServerError::Config("converter.command must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Database file of the SQLite metadata store.
    pub fn database_path(&self) -> PathBuf {
        self.storage_root.join("docfabric.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.storage_root, PathBuf::from("storage"));
        assert_eq!(c.metadata_backend, MetadataBackend::Sqlite);
        assert_eq!(c.max_upload_bytes, 104_857_600);
        assert_eq!(c.default_page_size, 20);
        assert!(c.converter.command.is_none());
        c.validate().unwrap();
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(ServerConfig::from_toml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn parses_full_file() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:9000"
            storage_root = "/var/lib/docfabric"
            metadata_backend = "memory"
            max_upload_bytes = 1024
            default_page_size = 50

            [converter]
            command = ["docling", "--to", "md", "{input}"]
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.metadata_backend, MetadataBackend::Memory);
        assert_eq!(c.max_upload_bytes, 1024);
        assert_eq!(c.default_page_size, 50);
        assert_eq!(c.converter.command.unwrap()[0], "docling");
        assert_eq!(
            ServerConfig::from_toml("storage_root = \"x\"").unwrap().database_path(),
            PathBuf::from("x").join("docfabric.db")
        );
    }

    #[test]
    fn rejects_bad_values() {
        for text in [
            "max_upload_bytes = 0",
            "default_page_size = 0",
            "default_page_size = 101",
            "[converter]\ncommand = []",
            "metadata_backend = \"file\"",
            "bind_addr = \"nowhere\"",
        ] {
            let err = ServerConfig::from_toml(text).unwrap_err();
            assert!(matches!(err, ServerError::Config(_)), "{text}");
        }
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docfabric.toml");
        std::fs::write(&path, "default_page_size = 5").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().default_page_size, 5);

        let missing = ServerConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(missing.to_string().contains("missing.toml"));
    }

    #[test]
    fn toml_round_trip() {
        let mut c = ServerConfig::default();
        c.converter.command = Some(vec!["pandoc".into(), "{input}".into()]);
        let text = c.to_toml().unwrap();
        assert_eq!(ServerConfig::from_toml(&text).unwrap(), c);
    }
}
