//! In-process [`FileStore`] with the backend's file semantics.
//!
//! Used for offline editing and in tests. Faults can be injected to exercise the
//! remote error paths without a server.

use super::{display_name, stored_name, FileContent, FileEntry, FileStore};
use crate::constants::MEMORY_WRITE_LOG_LIMIT;
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use tokio::sync::Mutex;

/// A failure every subsequent call reports until cleared.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Behave as if the server cannot be reached
    Offline,
    /// Answer every request with this status
    Reject {
        /// HTTP status to report
        status: u16,
        /// Error text to report
        message: String,
    },
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: Value,
    last_edit: NaiveDateTime,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, StoredFile>,
    fault: Option<Fault>,
    writes: VecDeque<(String, Value)>,
}

impl Inner {
    fn check_fault(&self) -> Result<(), RemoteError> {
        match &self.fault {
            None => Ok(()),
            Some(Fault::Offline) => Err(RemoteError::Unavailable("memory store is offline".to_string())),
            Some(Fault::Reject { status, message }) => Err(RemoteError::Rejected {
                status: *status,
                message: message.clone(),
            }),
        }
    }

    fn file_mut(&mut self, name: &str) -> Result<&mut StoredFile, RemoteError> {
        self.files
            .get_mut(&stored_name(name))
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))
    }
}

/// A file store that lives in memory.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    inner: Mutex<Inner>,
}

impl MemoryFileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `fault`, or clears it with `None`.
    pub async fn set_fault(&self, fault: Option<Fault>) {
        self.inner.lock().await.fault = fault;
    }

    /// The most recent successful `update_file` calls, oldest first. Only the last
    /// [`MEMORY_WRITE_LOG_LIMIT`] are kept.
    pub async fn writes(&self) -> Vec<(String, Value)> {
        self.inner.lock().await.writes.iter().cloned().collect()
    }

    /// Current content of a file, without touching its timestamp.
    pub async fn content(&self, name: &str) -> Option<Value> {
        self.inner
            .lock()
            .await
            .files
            .get(&stored_name(name))
            .map(|file| file.content.clone())
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn list_files(&self) -> Result<Vec<FileEntry>, RemoteError> {
        let inner = self.inner.lock().await;
        inner.check_fault()?;
        Ok(inner
            .files
            .iter()
            .map(|(stored, file)| FileEntry {
                name: display_name(stored).to_string(),
                last_edit: Some(file.last_edit),
            })
            .collect())
    }

    async fn read_file(&self, name: &str) -> Result<FileContent, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault()?;
        let file = inner.file_mut(name)?;
        file.last_edit = Self::now();
        Ok(FileContent {
            filename: name.to_string(),
            content: file.content.clone(),
        })
    }

    async fn update_file(&self, name: &str, payload: &Value) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault()?;
        let file = inner.file_mut(name)?;
        file.content = payload.clone();
        file.last_edit = Self::now();
        if inner.writes.len() == MEMORY_WRITE_LOG_LIMIT {
            inner.writes.pop_front();
        }
        inner.writes.push_back((name.to_string(), payload.clone()));
        Ok(())
    }

    async fn create_file(&self, name: &str) -> Result<String, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault()?;
        if name.trim().is_empty() {
            return Err(RemoteError::Rejected {
                status: 400,
                message: "No selected file".to_string(),
            });
        }
        let stored = stored_name(name);
        if inner.files.contains_key(&stored) {
            return Err(RemoteError::Rejected {
                status: 409,
                message: format!("File {stored} already exists"),
            });
        }
        inner.files.insert(
            stored.clone(),
            StoredFile {
                content: json!({"nodes": [], "edges": []}),
                last_edit: Self::now(),
            },
        );
        Ok(stored)
    }

    async fn delete_file(&self, name: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().await;
        inner.check_fault()?;
        inner
            .files
            .remove(&stored_name(name))
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_list_read_delete() {
        let store = MemoryFileStore::new();

        assert_eq!(store.create_file("alpha").await.unwrap(), "alpha.flow.json");
        let files = store.list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "alpha");

        let content = store.read_file("alpha").await.unwrap();
        assert_eq!(content.content, json!({"nodes": [], "edges": []}));

        store.delete_file("alpha").await.unwrap();
        assert!(store.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = MemoryFileStore::new();
        store.create_file("alpha").await.unwrap();

        let err = store.create_file("alpha").await.unwrap_err();

        assert!(matches!(err, RemoteError::Rejected { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_missing_files() {
        let store = MemoryFileStore::new();

        assert!(matches!(store.read_file("x").await, Err(RemoteError::NotFound(_))));
        assert!(matches!(
            store.update_file("x", &json!({})).await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(store.delete_file("x").await, Err(RemoteError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_write_log_is_bounded() {
        let store = MemoryFileStore::new();
        store.create_file("alpha").await.unwrap();

        for i in 0..MEMORY_WRITE_LOG_LIMIT + 5 {
            store.update_file("alpha", &json!({ "n": i })).await.unwrap();
        }

        let writes = store.writes().await;
        assert_eq!(writes.len(), MEMORY_WRITE_LOG_LIMIT);
        assert_eq!(writes[0].1, json!({ "n": 5 }));
        assert_eq!(store.content("alpha").await.unwrap(), json!({ "n": MEMORY_WRITE_LOG_LIMIT + 4 }));
    }

    #[tokio::test]
    async fn test_faults() {
        let store = MemoryFileStore::new();
        store.create_file("alpha").await.unwrap();

        store.set_fault(Some(Fault::Offline)).await;
        assert!(matches!(store.list_files().await, Err(RemoteError::Unavailable(_))));

        store
            .set_fault(Some(Fault::Reject {
                status: 400,
                message: "Invalid content".into(),
            }))
            .await;
        assert!(matches!(
            store.update_file("alpha", &json!({})).await,
            Err(RemoteError::Rejected { status: 400, .. })
        ));

        store.set_fault(None).await;
        assert!(store.update_file("alpha", &json!({"nodes": []})).await.is_ok());
        assert_eq!(store.writes().await.len(), 1);
    }
}
