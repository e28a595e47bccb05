//! Error types for the store, loading, remote storage and project sessions.

use crate::types::{EdgeId, NodeId};
use thiserror::Error;

/// Broad category of a failure, used by callers to pick user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An operation referenced a node, edge or file that does not exist
    NotFound,
    /// An edge referenced a node that does not exist
    InvalidEndpoint,
    /// Loaded content was unparseable or had the wrong shape
    InvalidDocument,
    /// The backend could not be reached
    RemoteUnavailable,
    /// The backend answered with an error status
    RemoteRejected,
    /// No user session is present
    Unauthenticated,
}

/// Errors raised synchronously by graph store commands. The document is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// No node has this id
    #[error("Node '{0}' not found")]
    NodeNotFound(NodeId),

    /// Fields and handlers only exist on interactive nodes
    #[error("Node '{0}' is not an interactive node")]
    NotInteractive(NodeId),

    /// No edge has this id
    #[error("Edge '{0}' not found")]
    EdgeNotFound(EdgeId),

    /// An edge endpoint names a missing node
    #[error("Edge endpoint '{0}' does not reference an existing node")]
    InvalidEndpoint(NodeId),

    /// A handler list update would orphan an outgoing edge
    #[error("Connector '{connector}' on node '{node_id}' is still used by edge '{edge_id}'")]
    ConnectorInUse {
        /// The interactive node
        node_id: NodeId,
        /// The connector the new list drops
        connector: String,
        /// An edge still leaving through it
        edge_id: EdgeId,
    },
}

impl GraphError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::NodeNotFound(_) | GraphError::NotInteractive(_) | GraphError::EdgeNotFound(_) => {
                ErrorKind::NotFound
            }
            GraphError::InvalidEndpoint(_) | GraphError::ConnectorInUse { .. } => ErrorKind::InvalidEndpoint,
        }
    }
}

/// Errors raised while turning stored content into a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Content parsed but is not a `{nodes, edges}` object
    #[error("Invalid project structure: {0}")]
    InvalidDocument(String),

    /// Content is not valid JSON or an entry has the wrong shape
    #[error("Failed to parse project JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidDocument
    }
}

/// Errors reported by the file storage and session backends.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The file does not exist
    #[error("File '{0}' not found")]
    NotFound(String),

    /// The backend answered with an error status
    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error text from the response body
        message: String,
    },

    /// The request never got an answer
    #[error("No response from server: {0}")]
    Unavailable(String),

    /// The answer could not be decoded
    #[error("Malformed response from server: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemoteError::NotFound(_) => ErrorKind::NotFound,
            RemoteError::Rejected { .. } | RemoteError::Decode(_) => ErrorKind::RemoteRejected,
            RemoteError::Unavailable(_) => ErrorKind::RemoteUnavailable,
        }
    }

    /// Message shown to the user when a save fails with this error.
    pub fn save_message(&self) -> String {
        match self {
            RemoteError::NotFound(_) => "Failed to save flow: File not found".to_string(),
            RemoteError::Rejected { status: 400, .. } => "Failed to save flow: Invalid content".to_string(),
            RemoteError::Rejected { message, .. } => format!("Failed to save flow: {message}"),
            RemoteError::Unavailable(_) => "Failed to save flow: No response from server".to_string(),
            RemoteError::Decode(detail) => format!("Failed to save flow: {detail}"),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Unavailable(err.to_string())
        }
    }
}

/// Errors raised by a project session.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// No user is signed in
    #[error("User must be logged in to {0}")]
    Unauthenticated(&'static str),

    /// Saving needs an open project
    #[error("No project is currently open")]
    NoProjectOpen,

    /// Stored content could not be loaded
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// The file store failed
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ProjectError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProjectError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            ProjectError::NoProjectOpen => ErrorKind::NotFound,
            ProjectError::Document(err) => err.kind(),
            ProjectError::Remote(err) => err.kind(),
        }
    }
}
