//! Service-account credential discovery.
//!
//! Sources are tried in order. A source that is simply absent is skipped;
//! a source that is present but unreadable or malformed stops startup.

use birdbook_core::sheet::{ServiceAccountKey, StoreError};
use std::path::PathBuf;
use thiserror::Error;

/// Where a service-account key may come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Key JSON carried in an environment variable.
    Inline {
        variable: &'static str,
        value: Option<String>,
    },
    /// Key JSON stored in a file.
    File(PathBuf),
}

impl CredentialSource {
    fn describe(&self) -> String {
        match self {
            Self::Inline { variable, .. } => format!("environment variable {variable}"),
            Self::File(path) => format!("file {}", path.display()),
        }
    }

    /// Load the key, or `Ok(None)` when this source is not configured.
    fn load(&self) -> Result<Option<ServiceAccountKey>, CredentialError> {
        let json = match self {
            Self::Inline { value: None, .. } => return Ok(None),
            Self::Inline { value: Some(v), .. } if v.trim().is_empty() => return Ok(None),
            Self::Inline { value: Some(v), .. } => v.clone(),
            Self::File(path) => match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(CredentialError::Unreadable {
                        source_name: self.describe(),
                        reason: e.to_string(),
                    })
                }
            },
        };

        ServiceAccountKey::from_json(&json)
            .map(Some)
            .map_err(|e| CredentialError::Invalid {
                source_name: self.describe(),
                reason: e,
            })
    }
}

/// Errors while locating service-account credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no service-account credentials found (tried {})", tried.join(", "))]
    Missing { tried: Vec<String> },

    #[error("cannot read credentials from {source_name}: {reason}")]
    Unreadable { source_name: String, reason: String },

    #[error("invalid credentials in {source_name}: {reason}")]
    Invalid {
        source_name: String,
        reason: StoreError,
    },
}

/// Return the key from the first configured source.
pub fn load_credentials(
    sources: &[CredentialSource],
) -> Result<ServiceAccountKey, CredentialError> {
    for source in sources {
        if let Some(key) = source.load()? {
            tracing::info!(
                client_email = %key.client_email,
                "using credentials from {}",
                source.describe()
            );
            return Ok(key);
        }
        tracing::debug!("no credentials in {}", source.describe());
    }
    Err(CredentialError::Missing {
        tried: sources.iter().map(CredentialSource::describe).collect(),
    })
}
