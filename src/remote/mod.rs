//! Clients for the backend collaborators: file storage and the user session.
//!
//! [`FileStore`] and [`SessionClient`] are the seams the rest of the crate
//! depends on. [`HttpFileStore`]/[`HttpSessionClient`] talk to the REST backend;
//! [`MemoryFileStore`] keeps files in process with the same semantics.

mod http;
mod memory;

pub use http::{HttpFileStore, HttpSessionClient};
pub use memory::{Fault, MemoryFileStore};

use crate::constants::FLOW_FILE_EXTENSION;
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One entry of the file listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name without the storage suffix
    pub name: String,
    /// Last time the file was read or written; `None` if never recorded
    #[serde(with = "last_edit")]
    pub last_edit: Option<NaiveDateTime>,
}

/// A file's stored content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    /// Name the file was requested under
    pub filename: String,
    /// Stored content: normally a document object, possibly raw text
    #[serde(default)]
    pub content: Value,
}

/// File storage operations the editor depends on.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Lists the current user's files.
    async fn list_files(&self) -> Result<Vec<FileEntry>, RemoteError>;

    /// Reads one file.
    async fn read_file(&self, name: &str) -> Result<FileContent, RemoteError>;

    /// Overwrites a file's content with `payload`. Last writer wins.
    async fn update_file(&self, name: &str, payload: &Value) -> Result<(), RemoteError>;

    /// Creates an empty file and returns its stored name.
    async fn create_file(&self, name: &str) -> Result<String, RemoteError>;

    /// Deletes a file.
    async fn delete_file(&self, name: &str) -> Result<(), RemoteError>;
}

/// OAuth providers the backend can sign users in with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    /// GitHub OAuth
    Github,
    /// Google OpenID Connect
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Github => "github",
            Provider::Google => "google",
        })
    }
}

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable user id (`guest`, `github_<id>`, `google_<sub>`)
    pub user_id: String,
    /// Display name
    pub user_name: String,
    /// `guest`, or the provider the user signed in with
    pub user_type: String,
    /// Avatar image, if the provider supplied one
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserInfo {
    /// Whether this is the anonymous guest session.
    pub fn is_guest(&self) -> bool {
        self.user_type == "guest"
    }
}

/// Session operations the editor depends on.
#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Current session user.
    async fn user_info(&self) -> Result<UserInfo, RemoteError>;

    /// Address to send the browser to for signing in with `provider`.
    fn login_url(&self, provider: Provider) -> String;

    /// Ends the session. Guests cannot log out.
    async fn logout(&self) -> Result<(), RemoteError>;
}

/// Appends the storage suffix unless `name` already carries it.
pub fn stored_name(name: &str) -> String {
    if name.ends_with(FLOW_FILE_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{FLOW_FILE_EXTENSION}")
    }
}

/// Strips the storage suffix, as the listing does.
pub fn display_name(stored: &str) -> &str {
    stored.split('.').next().unwrap_or(stored)
}

/// Maps a non-success status and its body to an error.
pub(crate) fn classify_status(status: u16, name: &str, body: &str) -> RemoteError {
    if status == 404 {
        return RemoteError::NotFound(name.to_string());
    }
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            }
        });
    RemoteError::Rejected { status, message }
}

/// Serde helpers for the listing's timestamp, which the backend writes as a naive
/// ISO-8601 string or the literal `"Never"`.
mod last_edit {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const NEVER: &str = "Never";

    pub fn serialize<S: Serializer>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            None => serializer.serialize_str(NEVER),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some(NEVER) | Some("") => Ok(None),
            Some(text) => text
                .parse::<NaiveDateTime>()
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_entry_timestamps() {
        let entries: Vec<FileEntry> = serde_json::from_value(json!([
            {"name": "alpha", "last_edit": "2024-05-01T12:30:00.123456"},
            {"name": "beta", "last_edit": "Never"}
        ]))
        .unwrap();

        assert_eq!(entries[0].name, "alpha");
        assert!(entries[0].last_edit.is_some());
        assert_eq!(entries[1].last_edit, None);
        assert_eq!(serde_json::to_value(&entries[1]).unwrap()["last_edit"], "Never");
    }

    #[test]
    fn test_stored_names() {
        assert_eq!(stored_name("flow"), "flow.flow.json");
        assert_eq!(stored_name("flow.flow.json"), "flow.flow.json");
        assert_eq!(display_name("flow.flow.json"), "flow");
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(404, "a", ""), RemoteError::NotFound(name) if name == "a"));

        match classify_status(409, "a", r#"{"error": "File a.flow.json already exists"}"#) {
            RemoteError::Rejected { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "File a.flow.json already exists");
            }
            other => panic!("unexpected {other:?}"),
        }

        match classify_status(500, "a", "") {
            RemoteError::Rejected { message, .. } => assert_eq!(message, "HTTP 500"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_guest_user() {
        let user: UserInfo = serde_json::from_value(json!({
            "user_id": "guest", "user_name": "Guest", "user_type": "guest", "avatar_url": null
        }))
        .unwrap();

        assert!(user.is_guest());
        assert_eq!(Provider::Google.to_string(), "google");
    }
}
