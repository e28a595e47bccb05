//! Undo/redo functionality for tracking and reversing editor commands.
//!
//! Each recorded action holds enough of the document to be reversed. Applying an
//! action returns its inverse, which is what goes onto the opposite stack.

use crate::constants::MAX_UNDO_HISTORY;
use crate::store::GraphStore;
use crate::types::*;

/// Represents different types of actions that can be undone.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    /// A node's attributes changed (rename, move, fields, handlers)
    NodeChanged {
        /// Node as it was
        before: Node,
        /// Node as it became
        after: Node,
    },
    /// A node was created
    NodeCreated {
        /// The new node
        node: Node,
    },
    /// A node was deleted along with its edges and their former indices
    NodeDeleted {
        /// Its former position in the node list
        index: usize,
        /// The removed node
        node: Node,
        /// Removed incident edges with their former indices
        edges: Vec<(usize, Edge)>,
    },
    /// An edge was created
    EdgeCreated {
        /// The new edge
        edge: Edge,
    },
    /// An edge was deleted from `index`
    EdgeDeleted {
        /// The removed edge
        edge: Edge,
        /// Its former position in the edge list
        index: usize,
    },
    /// Several actions recorded as one step, in the order they happened
    Batch(Vec<UndoAction>),
}

impl UndoAction {
    /// Whether applying this action changes node `id` itself.
    pub fn touches_node(&self, id: &str) -> bool {
        match self {
            UndoAction::NodeChanged { before, .. } => before.id == id,
            UndoAction::NodeCreated { node } | UndoAction::NodeDeleted { node, .. } => node.id == id,
            UndoAction::EdgeCreated { .. } | UndoAction::EdgeDeleted { .. } => false,
            UndoAction::Batch(actions) => actions.iter().any(|action| action.touches_node(id)),
        }
    }
}

/// Manages undo/redo history for an editor session.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    /// Stack of actions that can be undone
    undo_stack: Vec<UndoAction>,
    /// Stack of actions that can be redone
    redo_stack: Vec<UndoAction>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an action to the undo history.
    ///
    /// This clears the redo stack since a new action invalidates any previously undone actions.
    pub fn push_action(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Returns true if there are actions that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are actions that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent action from the undo stack.
    pub fn pop_undo(&mut self) -> Option<UndoAction> {
        self.undo_stack.pop()
    }

    /// Pops the most recent action from the redo stack.
    pub fn pop_redo(&mut self) -> Option<UndoAction> {
        self.redo_stack.pop()
    }

    /// Pushes an action onto the redo stack.
    pub fn push_redo(&mut self, action: UndoAction) {
        self.redo_stack.push(action);
    }

    /// Pushes an inverse produced by a redo back onto the undo stack,
    /// leaving the redo stack intact.
    pub fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
    }

    /// Number of undoable actions.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Returns true if nothing can be undone.
    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Clears all undo and redo history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Extension methods for applying undo/redo actions to a graph store.
pub trait UndoableStore {
    /// Reverses `action`, returning the action that would reverse it again.
    /// Returns `None` if the document no longer matches what the action expects.
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction>;

    /// Re-applies an action previously produced by [`UndoableStore::apply_undo`].
    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction>;
}

impl UndoableStore for GraphStore {
    fn apply_undo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        match action {
            UndoAction::NodeChanged { before, after } => {
                if !self.replace_node(before.clone()) {
                    return None;
                }
                Some(UndoAction::NodeChanged {
                    before: after.clone(),
                    after: before.clone(),
                })
            }
            UndoAction::NodeCreated { node } => {
                let (index, node, edges) = self.take_node(&node.id)?;
                Some(UndoAction::NodeDeleted { index, node, edges })
            }
            UndoAction::NodeDeleted { index, node, edges } => {
                if !self.insert_node(*index, node.clone()) {
                    return None;
                }
                for (index, edge) in edges {
                    self.put_edge(*index, edge.clone());
                }
                Some(UndoAction::NodeCreated { node: node.clone() })
            }
            UndoAction::EdgeCreated { edge } => {
                let (index, edge) = self.take_edge(&edge.id)?;
                Some(UndoAction::EdgeDeleted { edge, index })
            }
            UndoAction::EdgeDeleted { edge, index } => {
                if self.put_edge(*index, edge.clone()) {
                    Some(UndoAction::EdgeCreated { edge: edge.clone() })
                } else {
                    None
                }
            }
            UndoAction::Batch(actions) => {
                let mut inverse = Vec::with_capacity(actions.len());
                for action in actions.iter().rev() {
                    inverse.push(self.apply_undo(action)?);
                }
                Some(UndoAction::Batch(inverse))
            }
        }
    }

    fn apply_redo(&mut self, action: &UndoAction) -> Option<UndoAction> {
        // Redo is just applying the reverse of an undo
        self.apply_undo(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped() {
        let mut history = UndoHistory::new();
        let node = Node::new("n", NodeKind::Generic, Position::default());

        for _ in 0..MAX_UNDO_HISTORY + 10 {
            history.push_action(UndoAction::NodeCreated { node: node.clone() });
        }

        assert_eq!(history.len(), MAX_UNDO_HISTORY);
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut history = UndoHistory::new();
        let node = Node::new("n", NodeKind::Generic, Position::default());
        history.push_redo(UndoAction::NodeCreated { node: node.clone() });
        assert!(history.can_redo());

        history.push_action(UndoAction::NodeCreated { node });

        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_node_deletion_restores_edges_in_place() {
        let mut store = GraphStore::with_document(Document::seeded());
        let mid = store.add_node(NodeKind::Generic, Position::default());
        store.add_edge("home", None, "end", None).unwrap();
        store.add_edge("home", None, &mid, None).unwrap();
        store.add_edge(&mid, None, "end", None).unwrap();
        let original = store.snapshot();

        let (index, node, edges) = store.take_node(&mid).unwrap();
        let inverse = store
            .apply_undo(&UndoAction::NodeDeleted { index, node, edges })
            .unwrap();

        assert_eq!(store.snapshot(), original);
        assert!(matches!(inverse, UndoAction::NodeCreated { .. }));
    }

    #[test]
    fn test_undo_deletion_of_first_node_keeps_order() {
        let mut store = GraphStore::with_document(Document::seeded());
        store.add_node(NodeKind::Generic, Position::default());
        store.add_edge("home", None, "end", None).unwrap();
        let original = store.snapshot();

        let (index, node, edges) = store.take_node("home").unwrap();
        assert_eq!(index, 0);
        let inverse = store
            .apply_undo(&UndoAction::NodeDeleted { index, node, edges })
            .unwrap();
        assert_eq!(store.snapshot(), original);

        // redo removes it again, and a second undo puts it back at the front
        let again = store.apply_redo(&inverse).unwrap();
        store.apply_undo(&again).unwrap();
        assert_eq!(store.snapshot(), original);
    }

    #[test]
    fn test_touches_node() {
        let home = Node::new("home", NodeKind::Start, Position::default());
        let edge = Edge::new("e", "home", None, "end", None);
        let batch = UndoAction::Batch(vec![
            UndoAction::EdgeCreated { edge: edge.clone() },
            UndoAction::NodeCreated { node: home },
        ]);

        assert!(batch.touches_node("home"));
        assert!(!batch.touches_node("end"));
        assert!(!UndoAction::EdgeCreated { edge }.touches_node("home"));
    }

    #[test]
    fn test_batch_undo_and_redo() {
        let mut store = GraphStore::with_document(Document::seeded());
        let before = store.node("home").unwrap().clone();
        store
            .update_node("home", crate::store::NodePatch::name("Entry"))
            .unwrap();
        let after = store.node("home").unwrap().clone();
        let id = store.add_edge("home", None, "end", None).unwrap();
        let edge = store.document().edge(&id).unwrap().clone();
        let edited = store.snapshot();

        let batch = UndoAction::Batch(vec![
            UndoAction::NodeChanged { before, after },
            UndoAction::EdgeCreated { edge },
        ]);
        let inverse = store.apply_undo(&batch).unwrap();
        assert_eq!(store.snapshot(), Document::seeded());

        store.apply_redo(&inverse).unwrap();
        assert_eq!(store.snapshot(), edited);
    }

    #[test]
    fn test_undo_fails_on_stale_action() {
        let mut store = GraphStore::new();
        let node = Node::new("gone", NodeKind::Generic, Position::default());

        assert!(store.apply_undo(&UndoAction::NodeCreated { node }).is_none());
    }
}
