//! Login/register collaborator client
//!
//! The WebSocket endpoint is templated with an opaque bearer token obtained
//! out-of-band from the HTTP login/register collaborator. This module holds
//! the client side of that exchange plus on-disk persistence of the issued
//! credentials, read at startup to decide whether a connection can be
//! established.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};

/// Token pair issued by `POST /api/user/login` and `POST /api/user/register`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub auth_token: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Load credentials from `path`
    ///
    /// Returns `None` if the file does not exist (not logged in).
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        let credentials =
            serde_json::from_str(&data).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(Some(credentials))
    }

    /// Persist credentials to `path`, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> ClientResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| ClientError::Serialization(e.to_string()))?;
        std::fs::write(path, data)?;
        debug!(?path, "credentials saved");
        Ok(())
    }

    /// Remove persisted credentials, if any (logout)
    ///
    /// Returns `true` if a file was deleted.
    pub fn delete(path: impl AsRef<Path>) -> ClientResult<bool> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// JSON body for `POST /api/user/login`
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// JSON body for `POST /api/user/register`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    first_name: &'a str,
    last_name: &'a str,
}

/// HTTP client for the login/register endpoints
pub struct AuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl AuthClient {
    /// Client for the collaborator at `base_url` (scheme + host)
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// `POST /api/user/login`
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Credentials> {
        info!(%email, "logging in");
        self.post("/api/user/login", &LoginRequest { email, password })
            .await
    }

    /// `POST /api/user/register`
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> ClientResult<Credentials> {
        info!(%email, "registering");
        self.post(
            "/api/user/register",
            &RegisterRequest {
                email,
                password,
                first_name,
                last_name,
            },
        )
        .await
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<Credentials> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Credentials {
        Credentials {
            auth_token: "auth-abc".to_string(),
            refresh_token: "refresh-xyz".to_string(),
        }
    }

    #[test]
    fn test_credentials_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");

        sample().save(&path).unwrap();
        let loaded = Credentials::load(&path).unwrap().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_credentials_save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/credentials.json");

        sample().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = Credentials::load(dir.path().join("missing.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_delete_reports_whether_file_existed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");

        assert!(!Credentials::delete(&path).unwrap());
        sample().save(&path).unwrap();
        assert!(Credentials::delete(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_credentials_wire_field_names() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"authToken\""));
        assert!(json.contains("\"refreshToken\""));
    }
}
