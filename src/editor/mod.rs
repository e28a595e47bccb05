//! The editing session a front-end drives.
//!
//! [`EditorSession`] composes the graph store, the inspector selection and the
//! undo history. Every command issued through it is recorded for undo and marks
//! the session dirty; reads go through [`EditorSession::document`] or a snapshot.
//!
//! # Module Organization
//!
//! - `selection` - Which node is open in the inspector and its draft
//! - `panel` - Hover-driven sidebar collapse timer
//! - `undo` - Undo/redo history over store commands

mod panel;
mod selection;
mod undo;


pub use panel::{PanelState, SidePanel};
pub use selection::{ClickTarget, Draft, Selection};
pub use undo::{UndoAction, UndoHistory, UndoableStore};

use crate::connect::{ConnectGesture, ConnectionRules};
use crate::error::GraphError;
use crate::persistence::Loaded;
use crate::store::{GraphStore, NodePatch};
use crate::types::*;
use log::{debug, info};

/// One open flow document and the interaction state around it.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    store: GraphStore,
    rules: ConnectionRules,
    selection: Selection,
    undo_history: UndoHistory,
    has_unsaved_changes: bool,
}

impl EditorSession {
    /// Creates a session over an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session over a freshly loaded document.
    pub fn from_loaded(loaded: Loaded) -> Self {
        let mut session = Self::new();
        session.load(loaded);
        session
    }

    /// Replaces the document with a loaded one, resetting selection and history.
    pub fn load(&mut self, loaded: Loaded) {
        if loaded.seeded {
            info!("Project is empty. Creating example project.");
        }
        self.store.replace_document(loaded.document);
        self.selection.close();
        self.undo_history.clear();
        self.has_unsaved_changes = false;
    }

    /// The live document.
    pub fn document(&self) -> &Document {
        self.store.document()
    }

    /// An owned copy of the document.
    pub fn snapshot(&self) -> Document {
        self.store.snapshot()
    }

    /// The underlying store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The inspector state.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether the document changed since it was loaded or last saved.
    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Records that the given snapshot reached storage.
    ///
    /// The session only becomes clean if nothing changed since `saved` was taken.
    pub fn mark_saved(&mut self, saved: &Document) {
        if self.store.document() == saved {
            self.has_unsaved_changes = false;
        }
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = self.store.add_node(kind, position);
        if let Some(node) = self.store.node(&id) {
            let node = node.clone();
            self.record(UndoAction::NodeCreated { node });
        }
        id
    }

    /// Merges `patch` into a node.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        self.change_node(id, |store| store.update_node(id, patch))
    }

    /// Moves a node, e.g. at the end of a drag.
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        self.change_node(id, |store| store.move_node(id, position))
    }

    /// Replaces an interactive node's fields.
    pub fn set_fields(&mut self, id: &str, fields: Vec<Field>) -> Result<(), GraphError> {
        self.change_node(id, |store| store.set_fields(id, fields))
    }

    /// Replaces an interactive node's connectors.
    pub fn set_handlers(&mut self, id: &str, handlers: Vec<Handler>) -> Result<(), GraphError> {
        self.change_node(id, |store| store.set_handlers(id, handlers))
    }

    /// Appends an empty field to an interactive node.
    pub fn add_field(&mut self, id: &str) -> Result<usize, GraphError> {
        self.change_node(id, |store| store.add_field(id))
    }

    /// Appends a connector to an interactive node.
    pub fn add_handler(&mut self, id: &str) -> Result<String, GraphError> {
        self.change_node(id, |store| store.add_handler(id))
    }

    /// Removes a node and its edges. Closes the inspector if it was showing that node.
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphError> {
        let (index, node, edges) = self
            .store
            .take_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        self.record(UndoAction::NodeDeleted { index, node, edges });
        self.selection.sync(self.store.document());
        Ok(())
    }

    /// Applies a connect gesture. Returns the new edge id, or `None` if an endpoint
    /// does not resolve.
    pub fn connect(&mut self, gesture: &ConnectGesture) -> Option<EdgeId> {
        let source_before = self.store.node(&gesture.source).cloned();
        let id = self.rules.connect(&mut self.store, gesture)?;

        let mut actions = Vec::new();
        if let (Some(before), Some(after)) = (source_before, self.store.node(&gesture.source)) {
            if before != *after {
                actions.push(UndoAction::NodeChanged {
                    before,
                    after: after.clone(),
                });
            }
        }
        if let Some(edge) = self.store.document().edge(&id) {
            actions.push(UndoAction::EdgeCreated { edge: edge.clone() });
        }
        self.record(UndoAction::Batch(actions));
        Some(id)
    }

    /// Removes an edge.
    pub fn remove_edge(&mut self, id: &str) -> Result<(), GraphError> {
        let (index, edge) = self
            .store
            .take_edge(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_string()))?;
        self.record(UndoAction::EdgeDeleted { edge, index });
        Ok(())
    }

    /// Stores the canvas view. Not recorded for undo.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.store.document().viewport != viewport {
            self.store.set_viewport(viewport);
            self.has_unsaved_changes = true;
        }
    }

    /// Routes a click to the inspector.
    pub fn click(&mut self, target: &ClickTarget) -> Result<(), GraphError> {
        self.selection.click(self.store.document(), target)
    }

    /// Opens a node in the inspector.
    pub fn open_node(&mut self, id: &str) -> Result<(), GraphError> {
        self.selection.open(self.store.document(), id)
    }

    /// The inspector draft, for editing.
    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.selection.draft_mut()
    }

    /// Closes the inspector without saving the draft.
    pub fn close_inspector(&mut self) {
        self.selection.close();
    }

    /// Pushes the inspector draft to the store; the inspector stays open.
    /// Returns `Ok(false)` when nothing is open.
    pub fn commit(&mut self) -> Result<bool, GraphError> {
        let Some(id) = self.selection.selected().map(str::to_string) else {
            return Ok(false);
        };
        let selection = self.selection.clone();
        self.change_node(&id, |store| selection.commit(store))
    }

    /// Commits the draft and closes the inspector, like submitting the edit form.
    pub fn commit_and_close(&mut self) -> Result<bool, GraphError> {
        let committed = self.commit()?;
        self.selection.close();
        Ok(committed)
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        self.undo_history.can_undo()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        self.undo_history.can_redo()
    }

    /// Reverses the most recent command. Returns false if there was nothing to undo
    /// or the action no longer applied.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_history.pop_undo() else {
            return false;
        };
        match self.store.apply_undo(&action) {
            Some(inverse) => {
                self.after_history_step(&action);
                self.undo_history.push_redo(inverse);
                true
            }
            None => {
                debug!("Dropping stale undo action");
                false
            }
        }
    }

    /// Re-applies the most recently undone command.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.undo_history.pop_redo() else {
            return false;
        };
        match self.store.apply_redo(&action) {
            Some(inverse) => {
                self.after_history_step(&action);
                self.undo_history.push_undo(inverse);
                true
            }
            None => {
                debug!("Dropping stale redo action");
                false
            }
        }
    }

    /// Keeps the inspector in step with a node that `action` just changed, so a
    /// later commit cannot write the undone values back.
    fn after_history_step(&mut self, action: &UndoAction) {
        let touched = self
            .selection
            .selected()
            .is_some_and(|id| action.touches_node(id));
        if touched {
            self.selection.refresh(self.store.document());
        } else {
            self.selection.sync(self.store.document());
        }
        self.has_unsaved_changes = true;
    }

    fn record(&mut self, action: UndoAction) {
        self.undo_history.push_action(action);
        self.has_unsaved_changes = true;
    }

    /// Runs a command that only touches node `id` and records the before/after pair.
    fn change_node<R>(
        &mut self,
        id: &str,
        command: impl FnOnce(&mut GraphStore) -> Result<R, GraphError>,
    ) -> Result<R, GraphError> {
        let before = self
            .store
            .node(id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let result = command(&mut self.store)?;
        if let Some(after) = self.store.node(id) {
            if *after != before {
                let after = after.clone();
                self.record(UndoAction::NodeChanged { before, after });
            }
        }
        Ok(result)
    }
}
