//! Connect gestures: dragging from one connector to another.
//!
//! The policy is permissive. A gesture becomes an edge whenever both node ids
//! resolve in the current document; cycles, self-loops and parallel edges are
//! all accepted and node types are never compared.

use crate::error::GraphError;
use crate::store::GraphStore;
use crate::types::{Document, EdgeId, NodeId};
use log::debug;

/// A user's drag from a source connector to a target connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectGesture {
    /// Node the drag started on
    pub source: NodeId,
    /// Connector the drag started on; the default output when `None`
    pub source_handle: Option<String>,
    /// Node the drag ended on
    pub target: NodeId,
    /// Connector the drag ended on; the default input when `None`
    pub target_handle: Option<String>,
}

impl ConnectGesture {
    /// Gesture between the default connectors of two nodes.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            source_handle: None,
            target: target.into(),
            target_handle: None,
        }
    }

    /// Starts the gesture from a named output connector.
    pub fn from_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Ends the gesture on a named input connector.
    pub fn to_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}

/// Decides whether connect gestures yield edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionRules;

impl ConnectionRules {
    /// Checks a gesture against `document` without mutating anything.
    pub fn check(&self, document: &Document, gesture: &ConnectGesture) -> Result<(), GraphError> {
        for endpoint in [&gesture.source, &gesture.target] {
            if !document.contains_node(endpoint) {
                return Err(GraphError::InvalidEndpoint(endpoint.clone()));
            }
        }
        Ok(())
    }

    /// Applies a gesture. Returns the new edge id, or `None` when an endpoint
    /// does not resolve, in which case the store is untouched.
    pub fn connect(&self, store: &mut GraphStore, gesture: &ConnectGesture) -> Option<EdgeId> {
        if let Err(err) = self.check(store.document(), gesture) {
            debug!("Ignoring connect gesture: {err}");
            return None;
        }
        store
            .add_edge(
                &gesture.source,
                gesture.source_handle.as_deref(),
                &gesture.target,
                gesture.target_handle.as_deref(),
            )
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeKind, Position};

    #[test]
    fn test_connect_accepts_any_existing_pair() {
        let mut store = GraphStore::new();
        let end = store.add_node(NodeKind::End, Position::default());
        let start = store.add_node(NodeKind::Start, Position::default());
        let rules = ConnectionRules;

        // end -> start, a self-loop and a back edge are all accepted
        assert!(rules.connect(&mut store, &ConnectGesture::new(&end, &start)).is_some());
        assert!(rules.connect(&mut store, &ConnectGesture::new(&start, &start)).is_some());
        assert!(rules.connect(&mut store, &ConnectGesture::new(&start, &end)).is_some());

        assert_eq!(store.document().edges.len(), 3);
    }

    #[test]
    fn test_unresolved_gesture_is_noop() {
        let mut store = GraphStore::new();
        let a = store.add_node(NodeKind::Generic, Position::default());
        let before = store.snapshot();

        let result = ConnectionRules.connect(&mut store, &ConnectGesture::new(&a, "ghost"));

        assert!(result.is_none());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_check_reports_missing_endpoint() {
        let store = GraphStore::new();

        let result = ConnectionRules.check(store.document(), &ConnectGesture::new("x", "y"));

        assert_eq!(result, Err(GraphError::InvalidEndpoint("x".into())));
    }

    #[test]
    fn test_gesture_handles_are_kept() {
        let mut store = GraphStore::new();
        let a = store.add_node(NodeKind::Interactive, Position::default());
        let b = store.add_node(NodeKind::Generic, Position::default());
        let gesture = ConnectGesture::new(&a, &b).from_handle("handler-0").to_handle("in");

        let id = ConnectionRules.connect(&mut store, &gesture).unwrap();

        let edge = store.document().edge(&id).unwrap();
        assert_eq!(edge.source_handle(), Some("handler-0"));
        assert_eq!(edge.target_handle(), Some("in"));
    }
}
