//! # flowdoc
//!
//! The document model behind a node-and-edge flow editor whose projects live in a
//! remote file store. Four node types make up a flow:
//! - **Start** and **End**: the entry and exit of a flow
//! - **Generic**: a named step with a job label
//! - **Interactive**: a step with editable fields and extra output connectors
//!
//! ## Features
//! - Graph store with named, validated mutation commands and detached snapshots
//! - Permissive connect gestures (any node to any node, cycles allowed)
//! - Single-node inspector with a discardable draft
//! - Undo/redo over every editor command
//! - Loading with a seeded two-node default for empty projects, and saving to the
//!   `{nodes, edges, viewport}` payload
//! - REST and in-memory file stores, plus the session/login client

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connect;
pub mod constants;
pub mod editor;
pub mod error;
pub mod persistence;
pub mod project;
pub mod remote;
pub mod store;
mod types;

// Re-export public types and functions
pub use config::ClientConfig;
pub use connect::{ConnectGesture, ConnectionRules};
pub use editor::{ClickTarget, Draft, EditorSession, Selection, SidePanel};
pub use error::{DocumentError, ErrorKind, GraphError, ProjectError, RemoteError};
pub use persistence::Loaded;
pub use project::{OpenProject, ProjectSession, SaveReport};
pub use store::{GraphStore, NodePatch};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_editor_flow() {
        let mut editor = EditorSession::from_loaded(persistence::load(None).unwrap());
        let step = editor.add_node(NodeKind::Generic, Position::new(250.0, 130.0));

        assert!(editor.connect(&ConnectGesture::new("home", &step)).is_some());
        assert!(editor.connect(&ConnectGesture::new(&step, "end")).is_some());

        let payload = persistence::save(editor.document()).unwrap();
        assert_eq!(payload["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(payload["edges"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_document_default() {
        let document = Document::default();
        assert!(document.is_empty());
        assert_eq!(document.viewport, Viewport::default());
    }
}
