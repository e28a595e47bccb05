//! Conversion between stored project content and [`Document`]s.
//!
//! Loading substitutes the seeded two-node document for empty content. Saving
//! produces the `{nodes, edges, viewport}` payload sent to file storage; the
//! network call itself belongs to [`crate::remote`].

use crate::error::DocumentError;
use crate::types::*;
use log::warn;
use serde_json::Value;

/// Result of loading stored content.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    /// The document to edit
    pub document: Document,
    /// True if the content was empty and the seeded default was substituted,
    /// so the caller can tell the user once
    pub seeded: bool,
    /// Ids of edges dropped because an endpoint did not exist
    pub dropped_edges: Vec<EdgeId>,
}

impl Loaded {
    fn seeded() -> Self {
        Self {
            document: Document::seeded(),
            seeded: true,
            dropped_edges: Vec::new(),
        }
    }
}

/// Turns stored content into a document.
///
/// Absent content, `null`, an empty string, or an object whose `nodes` and `edges`
/// arrays are both empty yield the seeded default. A string is parsed as JSON
/// first. Any other object must carry `nodes` and `edges` arrays; `viewport` is
/// optional.
pub fn load(raw: Option<&Value>) -> Result<Loaded, DocumentError> {
    match raw {
        None | Some(Value::Null) => Ok(Loaded::seeded()),
        Some(Value::String(text)) => load_str(text),
        Some(value) => load_value(value),
    }
}

/// Same as [`load`] for content held as text.
pub fn load_str(text: &str) -> Result<Loaded, DocumentError> {
    if text.trim().is_empty() {
        return Ok(Loaded::seeded());
    }
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Null => Ok(Loaded::seeded()),
        Value::String(_) => Err(DocumentError::InvalidDocument(
            "content is a JSON string, expected an object".to_string(),
        )),
        other => load_value(&other),
    }
}

fn load_value(value: &Value) -> Result<Loaded, DocumentError> {
    let object = value.as_object().ok_or_else(|| {
        DocumentError::InvalidDocument("expected an object with nodes and edges".to_string())
    })?;
    let nodes = array_member(object, "nodes")?;
    let edges = array_member(object, "edges")?;

    if nodes.is_empty() && edges.is_empty() {
        return Ok(Loaded::seeded());
    }

    let nodes: Vec<Node> = serde_json::from_value(Value::Array(nodes.clone()))?;
    let edges: Vec<Edge> = serde_json::from_value(Value::Array(edges.clone()))?;
    let viewport = match object.get("viewport") {
        None | Some(Value::Null) => Viewport::default(),
        Some(viewport) => serde_json::from_value(viewport.clone())?,
    };

    let mut document = Document {
        nodes,
        edges: Vec::with_capacity(edges.len()),
        viewport,
    };
    let mut dropped_edges = Vec::new();
    for edge in edges {
        if document.contains_node(&edge.source) && document.contains_node(&edge.target) {
            document.edges.push(edge);
        } else {
            warn!(
                "Dropping edge {} ({} -> {}): endpoint does not exist",
                edge.id, edge.source, edge.target
            );
            dropped_edges.push(edge.id);
        }
    }

    Ok(Loaded {
        document,
        seeded: false,
        dropped_edges,
    })
}

fn array_member<'a>(
    object: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Result<&'a Vec<Value>, DocumentError> {
    object
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| DocumentError::InvalidDocument(format!("missing '{key}' array")))
}

/// Produces the transport payload `{nodes, edges, viewport}` for `document`.
pub fn save(document: &Document) -> Result<Value, DocumentError> {
    Ok(serde_json::to_value(document)?)
}
