//! Core data types for the flow document.
//!
//! This module defines the nodes, edges and viewport that make up a [`Document`],
//! along with the seeded two-node default used when a project has no content yet.
//! The serialized shape matches what the flow canvas produces. Keys the crate does
//! not model are carried through untouched, optional members remember whether they
//! were absent or written as `null`, and whole coordinates are written without a
//! fractional part, so stored content survives a load and save unchanged.

use crate::constants::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// Largest integer a JavaScript number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Deserializes a member whose key is present. Paired with `#[serde(default)]`, a
/// missing key stays `None` while an explicit `null` becomes `Some(null)`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Writes whole numbers as JSON integers, the way the canvas writes them.
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Unique identifier for document nodes.
pub type NodeId = String;

/// Unique identifier for document edges.
pub type EdgeId = String;

/// The closed set of node types a document may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Entry point of a flow
    #[serde(rename = "homeNode")]
    Start,
    /// Terminal node of a flow
    #[serde(rename = "endNode")]
    End,
    /// A plain step with a name and a job label
    #[serde(rename = "customNode")]
    Generic,
    /// A step carrying editable fields and extra output connectors
    #[serde(rename = "interactiveNode")]
    Interactive,
}

impl NodeKind {
    /// Short lowercase tag, also used as the default display name of new nodes.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Generic => "generic",
            NodeKind::Interactive => "interactive",
        }
    }

    /// Whether nodes of this kind carry fields and handlers.
    pub fn is_interactive(&self) -> bool {
        matches!(self, NodeKind::Interactive)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    #[serde(serialize_with = "whole_as_integer")]
    pub x: f64,
    /// Vertical coordinate
    #[serde(serialize_with = "whole_as_integer")]
    pub y: f64,
}

impl Position {
    /// Creates a position from its coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A name/value pair edited on an interactive node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    #[serde(default)]
    pub name: String,
    /// Field value
    #[serde(default)]
    pub value: String,
}

impl Field {
    /// Creates a field from a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An extra named output connector on an interactive node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handler {
    /// Connector id referenced by `sourceHandle` on outgoing edges
    pub id: String,
}

impl Handler {
    /// Creates a handler with the given connector id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Editable attributes of a node.
///
/// For the optional members, `None` means the key is absent and `Some(None)` (or
/// `Some(Value::Null)` for the icon) means it was stored as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeData {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Role label shown under the name
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub job: Option<Option<String>>,
    /// Opaque icon reference owned by the renderer
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub icon: Option<Value>,
    /// Custom fields, present on interactive nodes only
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub fields: Option<Option<Vec<Field>>>,
    /// Extra output connectors, present on interactive nodes only
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Option<Vec<Handler>>>,
    /// Keys not modeled by this crate
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeData {
    /// Role label, empty when unset.
    pub fn job(&self) -> &str {
        self.job.as_ref().and_then(Option::as_deref).unwrap_or("")
    }

    /// Sets the role label.
    pub fn set_job(&mut self, job: impl Into<String>) {
        self.job = Some(Some(job.into()));
    }

    /// Custom fields, if the node carries a list.
    pub fn fields(&self) -> Option<&[Field]> {
        self.fields.as_ref().and_then(Option::as_deref)
    }

    /// The field list, created empty if missing.
    pub fn fields_mut(&mut self) -> &mut Vec<Field> {
        self.fields.get_or_insert(None).get_or_insert_with(Vec::new)
    }

    /// Extra output connectors, if the node carries a list.
    pub fn handlers(&self) -> Option<&[Handler]> {
        self.handlers.as_ref().and_then(Option::as_deref)
    }

    /// The connector list, created empty if missing.
    pub fn handlers_mut(&mut self) -> &mut Vec<Handler> {
        self.handlers.get_or_insert(None).get_or_insert_with(Vec::new)
    }
}

/// A typed, positioned vertex of the flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, immutable once assigned
    pub id: NodeId,
    /// Node type
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Editable attributes
    #[serde(default)]
    pub data: NodeData,
    /// Canvas position
    #[serde(default)]
    pub position: Position,
    /// Keys not modeled by this crate (size, selection flags, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Creates a node of the given kind with default attributes.
    ///
    /// Interactive nodes start with empty field and handler lists; every other
    /// kind carries neither.
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Position) -> Self {
        let (fields, handlers) = if kind.is_interactive() {
            (Some(Some(Vec::new())), Some(Some(Vec::new())))
        } else {
            (None, None)
        };
        Self {
            id: id.into(),
            kind,
            data: NodeData {
                name: kind.tag().to_string(),
                job: Some(Some(DEFAULT_JOB.to_string())),
                icon: Some(Value::String(DEFAULT_ICON.to_string())),
                fields,
                handlers,
                extra: Map::new(),
            },
            position,
            extra: Map::new(),
        }
    }

    /// Returns true if `connector` is one of this node's extra handlers.
    pub fn has_handler(&self, connector: &str) -> bool {
        self.data
            .handlers()
            .is_some_and(|handlers| handlers.iter().any(|h| h.id == connector))
    }
}

/// A directed connection between two node connectors.
///
/// The presentation hints (`animated`, `style`, `marker_end`) are cosmetic only and
/// kept exactly as stored. Handles follow the same absent/`null` convention as
/// [`NodeData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier, immutable once assigned
    pub id: EdgeId,
    /// Source node id
    pub source: NodeId,
    /// Source connector; the default connector when absent or `null`
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<Option<String>>,
    /// Target node id
    pub target: NodeId,
    /// Target connector; the default connector when absent or `null`
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<Option<String>>,
    /// Whether the edge is drawn animated
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub animated: Option<Value>,
    /// Stroke settings
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    /// Arrowhead at the target end
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<Value>,
    /// Keys not modeled by this crate
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Creates an edge with the default presentation of a connect gesture. Both
    /// handles are written, as `null` for a default connector.
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        source_handle: Option<String>,
        target: impl Into<NodeId>,
        target_handle: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_handle: Some(source_handle),
            target: target.into(),
            target_handle: Some(target_handle),
            animated: Some(Value::Bool(true)),
            style: Some(json!({ "stroke": EDGE_STROKE })),
            marker_end: Some(json!({ "type": EDGE_MARKER, "color": EDGE_STROKE })),
            extra: Map::new(),
        }
    }

    /// Source connector, `None` for the default one.
    pub fn source_handle(&self) -> Option<&str> {
        self.source_handle.as_ref().and_then(Option::as_deref)
    }

    /// Target connector, `None` for the default one.
    pub fn target_handle(&self) -> Option<&str> {
        self.target_handle.as_ref().and_then(Option::as_deref)
    }

    /// Returns true if either endpoint is `node_id`.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

/// Pan offset and zoom of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal pan offset
    #[serde(default, serialize_with = "whole_as_integer")]
    pub x: f64,
    /// Vertical pan offset
    #[serde(default, serialize_with = "whole_as_integer")]
    pub y: f64,
    /// Zoom scale
    #[serde(default = "default_zoom", serialize_with = "whole_as_integer")]
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// One project's flow graph: nodes, edges and the saved view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// All nodes, in insertion order
    pub nodes: Vec<Node>,
    /// All edges, in insertion order
    pub edges: Vec<Edge>,
    /// Saved canvas view
    #[serde(default)]
    pub viewport: Viewport,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in document substituted for empty project content:
    /// a start node and an end node with no edges.
    pub fn seeded() -> Self {
        let mut start = Node::new(SEED_START_ID, NodeKind::Start, SEED_START_POSITION.into());
        start.data.name = "Home".to_string();
        start.data.set_job("Start");
        start.data.icon = Some(Value::String("home".to_string()));

        let mut end = Node::new(SEED_END_ID, NodeKind::End, SEED_END_POSITION.into());
        end.data.name = "End".to_string();
        end.data.set_job("Finish");
        end.data.icon = Some(Value::String("stop".to_string()));

        Self {
            nodes: vec![start, end],
            edges: Vec::new(),
            viewport: Viewport::default(),
        }
    }

    /// Serialize the document to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node by id for mutation.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Returns true if a node with this id exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Looks up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Returns true if the document has neither nodes nor edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Edges whose source is `node_id`.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }
}
