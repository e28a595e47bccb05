//! REST clients for the backend's `/api/files`, `/api/user` and login endpoints.

use super::{classify_status, FileContent, FileEntry, FileStore, Provider, SessionClient, UserInfo};
use crate::config::ClientConfig;
use crate::error::RemoteError;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Shared plumbing: one cookie-carrying client and the API base address.
#[derive(Debug, Clone)]
struct Api {
    client: Client,
    base: Url,
}

impl Api {
    fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| RemoteError::Unavailable(format!("invalid base URL '{}': {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Unavailable(format!(
                "invalid base URL '{}'",
                config.base_url
            )));
        }
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, base })
    }

    /// `{base}/api/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    /// Passes successful responses through and maps the rest to errors.
    async fn check(response: Response, name: &str) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!("Request for '{name}' failed with {status}: {body}");
        Err(classify_status(status.as_u16(), name, &body))
    }
}

/// [`FileStore`] backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpFileStore {
    api: Api,
}

impl HttpFileStore {
    /// Creates a client for the backend described by `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            api: Api::new(config)?,
        })
    }

    /// A session client sharing this store's cookies, so both see the same user.
    pub fn session_client(&self) -> HttpSessionClient {
        HttpSessionClient {
            api: self.api.clone(),
        }
    }
}

#[derive(Deserialize)]
struct Created {
    filename: String,
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn list_files(&self) -> Result<Vec<FileEntry>, RemoteError> {
        let url = self.api.endpoint(&["files"]);
        let response = self.api.client.get(url).send().await?;
        let response = Api::check(response, "files").await?;
        Ok(response.json().await?)
    }

    async fn read_file(&self, name: &str) -> Result<FileContent, RemoteError> {
        let url = self.api.endpoint(&["files", name]);
        let response = self.api.client.get(url).send().await?;
        let response = Api::check(response, name).await?;
        Ok(response.json().await?)
    }

    async fn update_file(&self, name: &str, payload: &Value) -> Result<(), RemoteError> {
        let url = self.api.endpoint(&["files", name]);
        // The backend stores whatever arrives under `content`.
        let body = json!({ "content": payload });
        let response = self.api.client.put(url).json(&body).send().await?;
        Api::check(response, name).await?;
        info!("Saved '{name}'");
        Ok(())
    }

    async fn create_file(&self, name: &str) -> Result<String, RemoteError> {
        let url = self.api.endpoint(&["files"]);
        let part = Part::bytes(Vec::new())
            .file_name(name.to_string())
            .mime_str("text/plain")?;
        let form = Form::new().part("file", part);
        let response = self.api.client.post(url).multipart(form).send().await?;
        let response = Api::check(response, name).await?;
        let created: Created = response.json().await?;
        info!("Created '{}'", created.filename);
        Ok(created.filename)
    }

    async fn delete_file(&self, name: &str) -> Result<(), RemoteError> {
        let url = self.api.endpoint(&["files", name]);
        let response = self.api.client.delete(url).send().await?;
        Api::check(response, name).await?;
        info!("Deleted '{name}'");
        Ok(())
    }
}

/// [`SessionClient`] backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    api: Api,
}

impl HttpSessionClient {
    /// Creates a client for the backend described by `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, RemoteError> {
        Ok(Self {
            api: Api::new(config)?,
        })
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn user_info(&self) -> Result<UserInfo, RemoteError> {
        let url = self.api.endpoint(&["user", "info"]);
        let response = self.api.client.get(url).send().await?;
        let response = Api::check(response, "user").await?;
        Ok(response.json().await?)
    }

    fn login_url(&self, provider: Provider) -> String {
        let provider = provider.to_string();
        self.api.endpoint(&["login", &provider]).to_string()
    }

    async fn logout(&self) -> Result<(), RemoteError> {
        let url = self.api.endpoint(&["logout"]);
        let response = self.api.client.post(url).send().await?;
        Api::check(response, "session").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_endpoints_are_encoded() {
        let store = HttpFileStore::new(&config("http://localhost:5000")).unwrap();

        assert_eq!(
            store.api.endpoint(&["files", "my flow"]).as_str(),
            "http://localhost:5000/api/files/my%20flow"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let store = HttpFileStore::new(&config("http://example.com/editor/")).unwrap();

        assert_eq!(
            store.api.endpoint(&["files"]).as_str(),
            "http://example.com/editor/api/files"
        );
    }

    #[test]
    fn test_login_url() {
        let session = HttpSessionClient::new(&config("http://localhost:5000")).unwrap();

        assert_eq!(
            session.login_url(Provider::Github),
            "http://localhost:5000/api/login/github"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpFileStore::new(&config("not a url")),
            Err(RemoteError::Unavailable(_))
        ));
    }
}
