//! Credentials collaborator
//!
//! The provider never runs an authentication flow itself. It asks a
//! [`CredentialsSource`] for whatever the account manager holds for an
//! account and service, and treats the answer as an opaque capability.

use std::fmt;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

const REDACTED: &str = "<redacted>";

/// Credentials payload for one account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credentials {
    None,
    #[serde(rename = "oauth1")]
    OAuth1 {
        consumer_key: String,
        consumer_secret: String,
        token: String,
        token_secret: String,
        signature_method: String,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        access_token: String,
        /// Unix timestamp in seconds
        #[serde(default)]
        expiry: Option<i64>,
        #[serde(default)]
        granted_scopes: Vec<String>,
    },
    Password {
        username: String,
        password: String,
    },
}

impl Credentials {
    /// Variant name, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OAuth1 { .. } => "oauth1",
            Self::OAuth2 { .. } => "oauth2",
            Self::Password { .. } => "password",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::OAuth1 {
                consumer_key,
                signature_method,
                ..
            } => f
                .debug_struct("OAuth1")
                .field("consumer_key", consumer_key)
                .field("consumer_secret", &REDACTED)
                .field("token", &REDACTED)
                .field("token_secret", &REDACTED)
                .field("signature_method", signature_method)
                .finish(),
            Self::OAuth2 {
                expiry,
                granted_scopes,
                ..
            } => f
                .debug_struct("OAuth2")
                .field("access_token", &REDACTED)
                .field("expiry", expiry)
                .field("granted_scopes", granted_scopes)
                .finish(),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
        }
    }
}

/// Lookup of credentials by account and service
#[async_trait]
pub trait CredentialsSource: Send + Sync {
    async fn get_credentials(&self, account_id: u32, service_id: &str)
    -> ProviderResult<Credentials>;
}

/// Serves one fixed set of credentials for a single account and service
#[derive(Debug, Clone)]
pub struct FixedCredentials {
    account_id: u32,
    service_id: String,
    credentials: Credentials,
}

impl FixedCredentials {
    pub fn new(account_id: u32, service_id: &str, credentials: Credentials) -> Self {
        Self {
            account_id,
            service_id: service_id.to_string(),
            credentials,
        }
    }

    /// Load credentials from a JSON file such as `{"kind": "password", ...}`
    pub fn from_file(path: &Path, account_id: u32, service_id: &str) -> ProviderResult<Self> {
        let text = fs::read_to_string(path)?;
        let credentials = serde_json::from_str(&text).map_err(|e| {
            ProviderError::InvalidArgument(format!(
                "invalid credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(account_id, service_id, credentials))
    }
}

#[async_trait]
impl CredentialsSource for FixedCredentials {
    async fn get_credentials(
        &self,
        account_id: u32,
        service_id: &str,
    ) -> ProviderResult<Credentials> {
        if account_id != self.account_id || service_id != self.service_id {
            return Err(ProviderError::NotFound(format!(
                "no credentials for account {account_id} and service '{service_id}'"
            )));
        }
        Ok(self.credentials.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use storage_common::ErrorKind;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_oauth2() {
        let file = write_temp(
            r#"{"kind": "oauth2", "access_token": "abc", "expiry": 1700000000, "granted_scopes": ["files"]}"#,
        );
        let source = FixedCredentials::from_file(file.path(), 7, "storage").unwrap();

        let creds = source.get_credentials(7, "storage").await.unwrap();
        assert_eq!(
            creds,
            Credentials::OAuth2 {
                access_token: "abc".to_string(),
                expiry: Some(1_700_000_000),
                granted_scopes: vec!["files".to_string()],
            }
        );
        assert_eq!(creds.kind(), "oauth2");
    }

    #[tokio::test]
    async fn test_oauth2_optional_fields_default() {
        let file = write_temp(r#"{"kind": "oauth2", "access_token": "abc"}"#);
        let source = FixedCredentials::from_file(file.path(), 0, "storage").unwrap();
        let creds = source.get_credentials(0, "storage").await.unwrap();
        assert!(matches!(
            creds,
            Credentials::OAuth2 { expiry: None, ref granted_scopes, .. } if granted_scopes.is_empty()
        ));
    }

    #[tokio::test]
    async fn test_other_account_not_found() {
        let source = FixedCredentials::new(1, "storage", Credentials::None);
        let err = source.get_credentials(2, "storage").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = source.get_credentials(1, "mail").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_bad_file() {
        let file = write_temp(r#"{"kind": "kerberos"}"#);
        let err = FixedCredentials::from_file(file.path(), 0, "storage").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let missing = FixedCredentials::from_file(Path::new("/nonexistent/creds.json"), 0, "s")
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::Password {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let shown = format!("{creds:?}");
        assert!(shown.contains("alice"));
        assert!(!shown.contains("hunter2"));

        let creds = Credentials::OAuth1 {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs-secret".to_string(),
            token: "tok-secret".to_string(),
            token_secret: "ts-secret".to_string(),
            signature_method: "HMAC-SHA1".to_string(),
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("cs-secret"));
        assert!(!shown.contains("tok-secret"));
        assert!(shown.contains("HMAC-SHA1"));
    }

    #[test]
    fn test_serialize_tag() {
        let json = serde_json::to_string(&Credentials::None).unwrap();
        assert_eq!(json, r#"{"kind":"none"}"#);
    }
}
