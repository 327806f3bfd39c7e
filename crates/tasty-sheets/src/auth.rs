use std::path::PathBuf;

use google_sheets4::oauth2::{self, authenticator::Authenticator};
use google_sheets4::{hyper, hyper_rustls};

use tasty_core::{Error, Result};

pub type Connector = hyper_rustls::HttpsConnector<hyper::client::HttpConnector>;

/// Where the service-account key comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
    /// The key JSON itself was put in the environment.
    Inline(String),
    /// Path to a key file on disk.
    File(PathBuf),
}

impl CredentialSource {
    pub fn from_env_value(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') {
            Self::Inline(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    async fn read_key(&self) -> Result<oauth2::ServiceAccountKey> {
        match self {
            Self::Inline(json) => oauth2::parse_service_account_key(json).map_err(|e| {
                Error::Config(format!(
                    "GOOGLE_SHEET_CREDENTIALS is not a valid service account key: {e}"
                ))
            }),
            Self::File(path) => oauth2::read_service_account_key(path).await.map_err(|e| {
                Error::Config(format!(
                    "could not read service account key at '{}': {e}",
                    path.display()
                ))
            }),
        }
    }
}

pub fn http_client() -> hyper::Client<Connector> {
    hyper::Client::builder().build(
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build(),
    )
}

pub async fn authenticator(
    source: &CredentialSource,
    client: hyper::Client<Connector>,
) -> Result<Authenticator<Connector>> {
    let secret = source.read_key().await?;

    oauth2::ServiceAccountAuthenticator::with_client(secret, client)
        .build()
        .await
        .map_err(|e| Error::External(format!("could not create an authenticator: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_blob_is_inline_and_anything_else_is_a_path() {
        assert_eq!(
            CredentialSource::from_env_value("  {\"type\": \"service_account\"} "),
            CredentialSource::Inline("{\"type\": \"service_account\"}".to_string())
        );
        assert_eq!(
            CredentialSource::from_env_value("tasty-service-acct-creds.json"),
            CredentialSource::File(PathBuf::from("tasty-service-acct-creds.json"))
        );
    }

    #[tokio::test]
    async fn malformed_inline_key_is_a_config_error() {
        let src = CredentialSource::from_env_value("{not json");
        assert!(matches!(src.read_key().await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn missing_key_file_is_a_config_error() {
        let src = CredentialSource::File(PathBuf::from("/nonexistent/tasty-creds.json"));
        let err = src.read_key().await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tasty-creds.json"));
    }
}
