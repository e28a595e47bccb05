//! Project session: which named file is open, for which user.
//!
//! The identity and the file store are handed in by the caller. Opening a
//! project loads it into an [`EditorSession`]; saving snapshots the editor and
//! writes the snapshot in the background.

use crate::editor::EditorSession;
use crate::error::{ProjectError, RemoteError};
use crate::persistence;
use crate::remote::{FileEntry, FileStore, UserInfo};
use crate::types::Document;
use log::{info, warn};
use std::future::Future;
use std::sync::Arc;

/// Message shown after a successful save.
pub const SAVE_SUCCESS_MESSAGE: &str = "Flow saved successfully";
/// Message shown once when an empty project was replaced by the seeded document.
pub const SEEDED_NOTICE: &str = "Project is empty. Creating example project.";

/// A project that is open for editing.
#[derive(Debug, Clone)]
pub struct OpenProject {
    /// File name the project was opened under
    pub name: String,
    /// Editing state
    pub editor: EditorSession,
    /// True if the stored content was empty and the seeded document was substituted
    pub seeded: bool,
}

impl OpenProject {
    /// One-time notice to show after opening, if any.
    pub fn notice(&self) -> Option<&'static str> {
        self.seeded.then_some(SEEDED_NOTICE)
    }
}

/// Outcome of one save.
#[derive(Debug)]
pub struct SaveReport {
    /// Project the save was issued for
    pub project: String,
    /// The document exactly as it was sent
    pub snapshot: Document,
    /// What storage answered
    pub result: Result<(), RemoteError>,
}

impl SaveReport {
    /// Text for the user.
    pub fn message(&self) -> String {
        match &self.result {
            Ok(()) => SAVE_SUCCESS_MESSAGE.to_string(),
            Err(err) => err.save_message(),
        }
    }
}

/// Open/close/save of named projects on behalf of one user.
pub struct ProjectSession {
    files: Arc<dyn FileStore>,
    user: Option<UserInfo>,
    current: Option<OpenProject>,
}

impl ProjectSession {
    /// Creates a session with no project open.
    pub fn new(files: Arc<dyn FileStore>, user: Option<UserInfo>) -> Self {
        Self {
            files,
            user,
            current: None,
        }
    }

    /// The signed-in user.
    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    /// Updates the signed-in user. Signing out closes the open project.
    pub fn set_user(&mut self, user: Option<UserInfo>) {
        if user.is_none() {
            self.close();
        }
        self.user = user;
    }

    /// The open project.
    pub fn current(&self) -> Option<&OpenProject> {
        self.current.as_ref()
    }

    /// The open project's editor.
    pub fn editor_mut(&mut self) -> Option<&mut EditorSession> {
        self.current.as_mut().map(|project| &mut project.editor)
    }

    /// Lists the user's projects.
    pub async fn list(&self) -> Result<Vec<FileEntry>, ProjectError> {
        self.require_user("list projects")?;
        Ok(self.files.list_files().await?)
    }

    /// Creates an empty project and returns its stored name.
    pub async fn create(&self, name: &str) -> Result<String, ProjectError> {
        self.require_user("create a project")?;
        Ok(self.files.create_file(name).await?)
    }

    /// Deletes a project, closing it first if it is open.
    pub async fn delete(&mut self, name: &str) -> Result<(), ProjectError> {
        self.require_user("delete a project")?;
        self.files.delete_file(name).await?;
        if self.current.as_ref().is_some_and(|p| p.name == name) {
            self.close();
        }
        Ok(())
    }

    /// Opens `name`, replacing any open project. On failure the previously open
    /// project stays open.
    pub async fn open(&mut self, name: &str) -> Result<&mut OpenProject, ProjectError> {
        self.require_user("open a project")?;
        let file = self.files.read_file(name).await?;
        let loaded = persistence::load(Some(&file.content))?;
        if !loaded.dropped_edges.is_empty() {
            warn!(
                "Opened '{name}' without {} dangling edges",
                loaded.dropped_edges.len()
            );
        }
        info!("Opened '{name}'");
        let seeded = loaded.seeded;
        Ok(self.current.insert(OpenProject {
            name: name.to_string(),
            editor: EditorSession::from_loaded(loaded),
            seeded,
        }))
    }

    /// Closes the open project, discarding unsaved edits.
    pub fn close(&mut self) {
        if let Some(project) = self.current.take() {
            info!("Closed '{}'", project.name);
        }
    }

    /// Snapshots the open project and returns a future that writes the snapshot.
    ///
    /// Edits made after this call are not part of the write. Several saves may be
    /// in flight at once; each writes its own snapshot and nothing is merged or
    /// deduplicated, so whichever finishes last wins.
    pub fn begin_save(&self) -> Result<impl Future<Output = SaveReport> + Send + 'static, ProjectError> {
        self.require_user("save a project")?;
        let project = self.current.as_ref().ok_or(ProjectError::NoProjectOpen)?;
        let snapshot = project.editor.snapshot();
        let payload = persistence::save(&snapshot)?;
        let files = Arc::clone(&self.files);
        let name = project.name.clone();

        Ok(async move {
            let result = files.update_file(&name, &payload).await;
            match &result {
                Ok(()) => info!("Saved '{name}'"),
                Err(err) => warn!("Saving '{name}' failed: {err}"),
            }
            SaveReport {
                project: name,
                snapshot,
                result,
            }
        })
    }

    /// Applies a finished save: a successful save of the open project clears its
    /// dirty flag if nothing changed since the snapshot.
    pub fn finish_save(&mut self, report: &SaveReport) {
        if report.result.is_err() {
            return;
        }
        if let Some(project) = self.current.as_mut().filter(|p| p.name == report.project) {
            project.editor.mark_saved(&report.snapshot);
        }
    }

    /// Saves the open project and waits for the outcome.
    pub async fn save(&mut self) -> Result<SaveReport, ProjectError> {
        let report = self.begin_save()?.await;
        self.finish_save(&report);
        Ok(report)
    }

    fn require_user(&self, action: &'static str) -> Result<&UserInfo, ProjectError> {
        self.user.as_ref().ok_or(ProjectError::Unauthenticated(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::ConnectGesture;
    use crate::error::ErrorKind;
    use crate::remote::{Fault, MemoryFileStore};
    use crate::store::NodePatch;
    use crate::types::{NodeKind, Position};
    use serde_json::json;

    fn guest() -> UserInfo {
        UserInfo {
            user_id: "guest".into(),
            user_name: "Guest".into(),
            user_type: "guest".into(),
            avatar_url: None,
        }
    }

    async fn session_with_file(name: &str) -> (ProjectSession, Arc<MemoryFileStore>) {
        let files = Arc::new(MemoryFileStore::new());
        files.create_file(name).await.unwrap();
        let session = ProjectSession::new(files.clone(), Some(guest()));
        (session, files)
    }

    #[tokio::test]
    async fn test_open_requires_user() {
        let files = Arc::new(MemoryFileStore::new());
        let mut session = ProjectSession::new(files, None);

        let err = session.open("alpha").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_open_empty_project_is_seeded() {
        let (mut session, _) = session_with_file("alpha").await;

        let project = session.open("alpha").await.unwrap();

        assert!(project.seeded);
        assert_eq!(project.notice(), Some(SEEDED_NOTICE));
        assert_eq!(project.editor.document(), &Document::seeded());
        assert!(!project.editor.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_open_invalid_content_keeps_previous_project() {
        let (mut session, files) = session_with_file("good").await;
        files.create_file("bad").await.unwrap();
        files.update_file("bad", &json!({"nodes": 3})).await.unwrap();
        session.open("good").await.unwrap();

        let err = session.open("bad").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidDocument);
        assert_eq!(session.current().unwrap().name, "good");
    }

    #[tokio::test]
    async fn test_save_writes_payload_and_clears_dirty() {
        let (mut session, files) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();
        let editor = session.editor_mut().unwrap();
        editor.connect(&ConnectGesture::new("home", "end")).unwrap();
        assert!(editor.has_unsaved_changes());

        let report = session.save().await.unwrap();

        assert!(report.result.is_ok());
        assert_eq!(report.message(), SAVE_SUCCESS_MESSAGE);
        let stored = files.content("alpha").await.unwrap();
        assert_eq!(stored["edges"].as_array().unwrap().len(), 1);
        assert!(!session.current().unwrap().editor.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_document() {
        let (mut session, files) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();
        session
            .editor_mut()
            .unwrap()
            .update_node("home", NodePatch::name("Entry"))
            .unwrap();
        let before = session.current().unwrap().editor.snapshot();

        files.set_fault(Some(Fault::Offline)).await;
        let report = session.save().await.unwrap();

        assert_eq!(report.result.as_ref().unwrap_err().kind(), ErrorKind::RemoteUnavailable);
        assert_eq!(report.message(), "Failed to save flow: No response from server");
        let editor = &session.current().unwrap().editor;
        assert_eq!(editor.snapshot(), before);
        assert!(editor.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_save_of_deleted_file_reports_not_found() {
        let (mut session, files) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();
        files.delete_file("alpha").await.unwrap();

        let report = session.save().await.unwrap();

        assert_eq!(report.message(), "Failed to save flow: File not found");
    }

    #[tokio::test]
    async fn test_concurrent_saves_capture_own_snapshots() {
        let (mut session, files) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();

        let first = session.begin_save().unwrap();
        let added = session
            .editor_mut()
            .unwrap()
            .add_node(NodeKind::Generic, Position::new(10.0, 10.0));
        let second = session.begin_save().unwrap();

        // complete in reverse order of invocation
        let second_report = second.await;
        let first_report = first.await;

        assert!(!first_report.snapshot.contains_node(&added));
        assert!(second_report.snapshot.contains_node(&added));

        let writes = files.writes().await;
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].1["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(writes[1].1["nodes"].as_array().unwrap().len(), 2);
        // last writer wins
        assert_eq!(files.content("alpha").await.unwrap(), writes[1].1);

        session.finish_save(&first_report);
        assert!(session.current().unwrap().editor.has_unsaved_changes());
        session.finish_save(&second_report);
        assert!(!session.current().unwrap().editor.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_many_saves_in_flight_all_write() {
        let (mut session, files) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();

        let mut pending = Vec::new();
        for i in 0..3 {
            session
                .editor_mut()
                .unwrap()
                .add_node(NodeKind::Generic, Position::new(f64::from(i), 0.0));
            pending.push(session.begin_save().unwrap());
        }
        let reports = futures::future::join_all(pending).await;

        let sizes: Vec<_> = reports.iter().map(|r| r.snapshot.nodes.len()).collect();
        assert_eq!(sizes, vec![3, 4, 5]);
        assert_eq!(files.writes().await.len(), 3);
        assert!(reports.iter().all(|r| r.result.is_ok()));
    }

    #[tokio::test]
    async fn test_spawned_save_does_not_block_edits() {
        let (mut session, files) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();

        let handle = tokio::spawn(session.begin_save().unwrap());
        session
            .editor_mut()
            .unwrap()
            .add_node(NodeKind::Interactive, Position::default());
        let report = handle.await.unwrap();

        assert!(report.result.is_ok());
        assert_eq!(report.snapshot.nodes.len(), 2);
        assert_eq!(session.current().unwrap().editor.document().nodes.len(), 3);
        assert_eq!(files.writes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_signing_out_closes_project() {
        let (mut session, _) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();

        session.set_user(None);

        assert!(session.current().is_none());
        assert!(matches!(session.begin_save(), Err(ProjectError::Unauthenticated(_))));
    }

    #[tokio::test]
    async fn test_delete_open_project_closes_it() {
        let (mut session, _) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();

        session.delete("alpha").await.unwrap();

        assert!(session.current().is_none());
        assert!(session.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_loads_saved_content() {
        let (mut session, _) = session_with_file("alpha").await;
        session.open("alpha").await.unwrap();
        let id = session
            .editor_mut()
            .unwrap()
            .add_node(NodeKind::Interactive, Position::new(1.0, 2.0));
        session.save().await.unwrap();

        session.close();
        let project = session.open("alpha").await.unwrap();

        assert!(!project.seeded);
        assert!(project.editor.document().contains_node(&id));
    }
}
