//! Inspector binding: which node is open for editing, and its unsaved draft.
//!
//! At most one node is open at a time. Opening another node throws away the
//! current draft; nothing reaches the store until [`Selection::commit`].

use crate::error::GraphError;
use crate::store::{GraphStore, NodePatch};
use crate::types::*;

/// Editable copy of a node's attributes held by the inspector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Draft {
    /// Display name being edited
    pub name: String,
    /// Role label being edited
    pub job: String,
    /// Field values being edited; `None` for nodes without fields
    pub fields: Option<Vec<Field>>,
}

impl Draft {
    fn from_node(node: &Node) -> Self {
        Self {
            name: node.data.name.clone(),
            job: node.data.job().to_string(),
            fields: node.data.fields().map(<[Field]>::to_vec),
        }
    }
}

/// Where a click landed, as far as the inspector is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// A node on the canvas
    Node(NodeId),
    /// Empty canvas surface
    Canvas,
    /// The inspector panel itself
    Inspector,
    /// Anywhere else on the page
    Outside,
}

/// Inspector state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selection {
    /// No node is open
    #[default]
    Idle,
    /// `node_id` is open with an editable draft
    Editing {
        /// The open node
        node_id: NodeId,
        /// Uncommitted edits
        draft: Draft,
    },
}

impl Selection {
    /// Opens `id` for editing, replacing any current draft.
    pub fn open(&mut self, document: &Document, id: &str) -> Result<(), GraphError> {
        let node = document
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        *self = Selection::Editing {
            node_id: node.id.clone(),
            draft: Draft::from_node(node),
        };
        Ok(())
    }

    /// Routes a click. Node clicks open that node, clicks outside both the canvas
    /// and the inspector close it, and the rest leave the state alone.
    pub fn click(&mut self, document: &Document, target: &ClickTarget) -> Result<(), GraphError> {
        match target {
            ClickTarget::Node(id) => self.open(document, id),
            ClickTarget::Outside => {
                self.close();
                Ok(())
            }
            ClickTarget::Canvas | ClickTarget::Inspector => Ok(()),
        }
    }

    /// Returns to `Idle`, discarding the draft.
    pub fn close(&mut self) {
        *self = Selection::Idle;
    }

    /// Id of the open node.
    pub fn selected(&self) -> Option<&str> {
        match self {
            Selection::Idle => None,
            Selection::Editing { node_id, .. } => Some(node_id),
        }
    }

    /// The current draft.
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            Selection::Idle => None,
            Selection::Editing { draft, .. } => Some(draft),
        }
    }

    /// The current draft, for editing.
    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match self {
            Selection::Idle => None,
            Selection::Editing { draft, .. } => Some(draft),
        }
    }

    /// Pushes the draft into the store. The node stays open.
    ///
    /// Returns `Ok(false)` when nothing is open.
    pub fn commit(&self, store: &mut GraphStore) -> Result<bool, GraphError> {
        let Selection::Editing { node_id, draft } = self else {
            return Ok(false);
        };
        let node = store
            .node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.clone()))?;
        let interactive = node.kind.is_interactive();

        store.update_node(
            node_id,
            NodePatch::name(draft.name.clone()).with_job(draft.job.clone()),
        )?;
        if let (true, Some(fields)) = (interactive, draft.fields.clone()) {
            store.set_fields(node_id, fields)?;
        }
        Ok(true)
    }

    /// Reloads the draft from the open node, dropping uncommitted edits. Drops back
    /// to `Idle` if the node no longer exists.
    pub fn refresh(&mut self, document: &Document) {
        let Some(node) = self.selected().and_then(|id| document.node(id)) else {
            self.close();
            return;
        };
        *self = Selection::Editing {
            node_id: node.id.clone(),
            draft: Draft::from_node(node),
        };
    }

    /// Drops back to `Idle` if the open node no longer exists in `document`.
    pub fn sync(&mut self, document: &Document) {
        let dangling = self.selected().is_some_and(|id| !document.contains_node(id));
        if dangling {
            self.close();
        }
    }
}
