//! Startup configuration from flags and environment variables.

use crate::credentials::{load_credentials, CredentialError, CredentialSource};
use birdbook_core::sheet::{GoogleSheetsBackend, MemoryBackend, SheetStore, StoreError};
use birdbook_core::{Bird, Chick, Pair, Record};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// A Google Sheets spreadsheet.
    Sheets,
    /// An in-process workbook that is lost on exit.
    Memory,
}

#[derive(Parser, Debug)]
#[command(name = "birdbook-server")]
#[command(author, version, about = "HTTP API for bird, pair and chick records")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Storage backend
    #[arg(long, value_enum, env = "BIRDBOOK_BACKEND", default_value = "sheets")]
    pub backend: BackendKind,

    /// Spreadsheet holding the Birds, Pairs and Chicks sheets
    #[arg(long = "sheets-id", env = "GOOGLE_SHEETS_ID")]
    pub spreadsheet_id: Option<String>,

    /// Service-account key JSON
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_JSON", hide_env_values = true)]
    pub service_account_json: Option<String>,

    /// Service-account key file, used when no inline key is set
    #[arg(
        long,
        env = "GOOGLE_SERVICE_ACCOUNT_FILE",
        default_value = "service-account.json"
    )]
    pub service_account_file: PathBuf,
}

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("GOOGLE_SHEETS_ID is not set")]
    MissingSpreadsheetId,

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("cannot create sheets backend: {0}")]
    Backend(#[from] StoreError),
}

impl ServerConfig {
    /// Credential sources in lookup order.
    pub fn credential_sources(&self) -> Vec<CredentialSource> {
        vec![
            CredentialSource::Inline {
                variable: "GOOGLE_SERVICE_ACCOUNT_JSON",
                value: self.service_account_json.clone(),
            },
            CredentialSource::File(self.service_account_file.clone()),
        ]
    }

    /// Socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the table store for the selected backend.
    pub fn build_store(&self) -> Result<SheetStore, StartupError> {
        match self.backend {
            BackendKind::Memory => {
                tracing::warn!("using in-memory backend; records are lost on exit");
                Ok(SheetStore::new(Arc::new(seeded_memory_backend())))
            }
            BackendKind::Sheets => {
                let spreadsheet_id = self
                    .spreadsheet_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or(StartupError::MissingSpreadsheetId)?;
                let key = load_credentials(&self.credential_sources())?;
                let backend = GoogleSheetsBackend::from_service_account(spreadsheet_id, key)?;
                tracing::info!(spreadsheet_id, "using Google Sheets backend");
                Ok(SheetStore::new(Arc::new(backend)))
            }
        }
    }
}

/// A memory workbook with the three record sheets and their headers.
pub fn seeded_memory_backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_sheet(Bird::TABLE.sheet, Bird::HEADER)
        .with_sheet(Pair::TABLE.sheet, Pair::HEADER)
        .with_sheet(Chick::TABLE.sheet, Chick::HEADER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["birdbook-server"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--backend",
            "memory",
            "--service-account-file",
            "/etc/birdbook/key.json",
        ]);

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(
            config.credential_sources()[1],
            CredentialSource::File(PathBuf::from("/etc/birdbook/key.json"))
        );
    }

    #[test]
    fn test_memory_backend_has_all_sheets() {
        let config = parse(&["--backend", "memory"]);
        assert!(config.build_store().is_ok());
    }

    #[tokio::test]
    async fn test_seeded_headers() {
        let backend = seeded_memory_backend();
        let birds = backend.snapshot("Birds").await.unwrap();
        assert_eq!(birds[0][0], "BirdID");
        assert!(backend.snapshot("Pairs").await.is_some());
        assert!(backend.snapshot("Chicks").await.is_some());
    }

    #[test]
    fn test_sheets_backend_requires_id() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 4000,
            backend: BackendKind::Sheets,
            spreadsheet_id: Some("  ".to_string()),
            service_account_json: None,
            service_account_file: PathBuf::from("service-account.json"),
        };

        let err = config.build_store().unwrap_err();
        assert!(matches!(err, StartupError::MissingSpreadsheetId));
    }

    #[test]
    fn test_sheets_backend_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 4000,
            backend: BackendKind::Sheets,
            spreadsheet_id: Some("sheet-123".to_string()),
            service_account_json: None,
            service_account_file: dir.path().join("missing.json"),
        };

        let err = config.build_store().unwrap_err();
        assert!(matches!(
            err,
            StartupError::Credentials(CredentialError::Missing { .. })
        ));
    }
}
