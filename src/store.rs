//! The graph store: single owner of the active document.
//!
//! Every mutation goes through a named command on [`GraphStore`]. Commands either
//! apply completely or fail with a [`GraphError`] and leave the document untouched.
//! Readers take a [`GraphStore::snapshot`], which is an owned copy and never observes
//! later edits.

use crate::constants::*;
use crate::error::GraphError;
use crate::types::*;
use log::debug;
use serde_json::Value;

/// A partial update to a node's attributes. `None` leaves the attribute as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New display name
    pub name: Option<String>,
    /// New role label
    pub job: Option<String>,
    /// New icon reference
    pub icon: Option<Value>,
    /// New canvas position
    pub position: Option<Position>,
}

impl NodePatch {
    /// Patch that only renames the node.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Adds a job label to the patch.
    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Adds a position to the patch.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Adds an icon reference to the patch.
    pub fn with_icon(mut self, icon: Value) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.job.is_none() && self.icon.is_none() && self.position.is_none()
    }

    fn apply(self, node: &mut Node) {
        if let Some(name) = self.name {
            node.data.name = name;
        }
        if let Some(job) = self.job {
            if node.data.job() != job {
                node.data.set_job(job);
            }
        }
        if let Some(icon) = self.icon {
            node.data.icon = Some(icon);
        }
        if let Some(position) = self.position {
            node.position = position;
        }
    }
}

/// Owns the canonical document and applies mutation commands to it.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    document: Document,
    node_counter: u64,
    edge_counter: u64,
}

impl GraphStore {
    /// Creates a store holding an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `document`.
    pub fn with_document(document: Document) -> Self {
        let mut store = Self::new();
        store.replace_document(document);
        store
    }

    /// Read access to the live document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// An owned copy of the current document for rendering or serialization.
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    /// Swaps in a whole document, e.g. after a load. Id generation continues past
    /// the highest generated id in the new document, so deleting a node and adding
    /// another never brings an old id back.
    pub fn replace_document(&mut self, document: Document) {
        debug!(
            "Replacing document ({} nodes, {} edges)",
            document.nodes.len(),
            document.edges.len()
        );
        self.node_counter = document
            .nodes
            .iter()
            .filter_map(|node| node.id.strip_prefix(NODE_ID_PREFIX)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.edge_counter = document
            .edges
            .iter()
            .filter_map(|edge| {
                let rest = edge.id.strip_prefix(EDGE_ID_PREFIX)?;
                rest.rsplit('-').next()?.parse::<u64>().ok()
            })
            .max()
            .unwrap_or(0);
        self.document = document;
    }

    /// Looks up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.document.node(id)
    }

    /// Adds a node of `kind` at `position` and returns its fresh id.
    pub fn add_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = self.next_node_id();
        debug!("Adding {kind} node {id}");
        self.document.nodes.push(Node::new(id.clone(), kind, position));
        id
    }

    /// Merges `patch` into the node's attributes.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<(), GraphError> {
        let node = self
            .document
            .node_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        patch.apply(node);
        Ok(())
    }

    /// Moves a node to `position`.
    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), GraphError> {
        self.update_node(id, NodePatch::default().with_position(position))
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<(Node, Vec<Edge>), GraphError> {
        let (_, node, edges) = self
            .take_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        debug!("Removed node {id} and {} edges", edges.len());
        Ok((node, edges.into_iter().map(|(_, edge)| edge).collect()))
    }

    /// Connects two nodes and returns the new edge id.
    ///
    /// Any pair of existing nodes may be connected, including a node with itself,
    /// and parallel edges are allowed. When the source is an interactive node and
    /// `source_handle` names a connector it does not have yet, that connector is
    /// added to the node's handlers.
    pub fn add_edge(
        &mut self,
        source: &str,
        source_handle: Option<&str>,
        target: &str,
        target_handle: Option<&str>,
    ) -> Result<EdgeId, GraphError> {
        if !self.document.contains_node(source) {
            return Err(GraphError::InvalidEndpoint(source.to_string()));
        }
        if !self.document.contains_node(target) {
            return Err(GraphError::InvalidEndpoint(target.to_string()));
        }

        if let (Some(connector), Some(node)) = (source_handle, self.document.node_mut(source)) {
            if node.kind.is_interactive() && !node.has_handler(connector) {
                node.data.handlers_mut().push(Handler::new(connector));
            }
        }

        let id = self.next_edge_id(source, target);
        debug!("Adding edge {id}");
        self.document.edges.push(Edge::new(
            id.clone(),
            source,
            source_handle.map(str::to_string),
            target,
            target_handle.map(str::to_string),
        ));
        Ok(id)
    }

    /// Removes an edge.
    pub fn remove_edge(&mut self, id: &str) -> Result<Edge, GraphError> {
        self.take_edge(id)
            .map(|(_, edge)| edge)
            .ok_or_else(|| GraphError::EdgeNotFound(id.to_string()))
    }

    /// Replaces an interactive node's field list.
    pub fn set_fields(&mut self, id: &str, fields: Vec<Field>) -> Result<(), GraphError> {
        let node = self.interactive_node_mut(id)?;
        node.data.fields = Some(Some(fields));
        Ok(())
    }

    /// Replaces an interactive node's connector list.
    ///
    /// Fails with [`GraphError::ConnectorInUse`] if the new list drops a connector
    /// that an outgoing edge still references.
    pub fn set_handlers(&mut self, id: &str, handlers: Vec<Handler>) -> Result<(), GraphError> {
        self.interactive_node_mut(id)?;
        if let Some(edge) = self.document.outgoing(id).find(|edge| {
            edge.source_handle()
                .is_some_and(|connector| !handlers.iter().any(|h| h.id == connector))
        }) {
            return Err(GraphError::ConnectorInUse {
                node_id: id.to_string(),
                connector: edge.source_handle().unwrap_or_default().to_string(),
                edge_id: edge.id.clone(),
            });
        }
        let node = self.interactive_node_mut(id)?;
        node.data.handlers = Some(Some(handlers));
        Ok(())
    }

    /// Appends an empty field to an interactive node and returns its index.
    pub fn add_field(&mut self, id: &str) -> Result<usize, GraphError> {
        let node = self.interactive_node_mut(id)?;
        let fields = node.data.fields_mut();
        fields.push(Field::default());
        Ok(fields.len() - 1)
    }

    /// Appends a new connector to an interactive node and returns its id.
    pub fn add_handler(&mut self, id: &str) -> Result<String, GraphError> {
        let node = self.interactive_node_mut(id)?;
        let handlers = node.data.handlers_mut();
        let mut n = handlers.len();
        let connector = loop {
            let candidate = format!("{HANDLER_ID_PREFIX}{n}");
            if !handlers.iter().any(|h| h.id == candidate) {
                break candidate;
            }
            n += 1;
        };
        handlers.push(Handler::new(connector.clone()));
        Ok(connector)
    }

    /// Sets the saved canvas view.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.document.viewport = viewport;
    }

    /// Replaces the node with the same id in place. Returns false if there is none.
    pub(crate) fn replace_node(&mut self, node: Node) -> bool {
        match self.document.node_mut(&node.id) {
            Some(existing) => {
                *existing = node;
                true
            }
            None => false,
        }
    }

    /// Inserts `node` at `index` (clamped) unless its id is taken.
    pub(crate) fn insert_node(&mut self, index: usize, node: Node) -> bool {
        if self.document.contains_node(&node.id) {
            return false;
        }
        let index = index.min(self.document.nodes.len());
        self.document.nodes.insert(index, node);
        true
    }

    /// Removes a node and its incident edges, returning the node's former index and
    /// the edges with theirs.
    pub(crate) fn take_node(&mut self, id: &str) -> Option<(usize, Node, Vec<(usize, Edge)>)> {
        let position = self.document.nodes.iter().position(|n| n.id == id)?;
        let node = self.document.nodes.remove(position);

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.document.edges.len());
        for (index, edge) in self.document.edges.drain(..).enumerate() {
            if edge.touches(id) {
                removed.push((index, edge));
            } else {
                kept.push(edge);
            }
        }
        self.document.edges = kept;
        Some((position, node, removed))
    }

    /// Inserts `edge` at `index` (clamped) if both endpoints exist and the id is free.
    pub(crate) fn put_edge(&mut self, index: usize, edge: Edge) -> bool {
        if !self.document.contains_node(&edge.source)
            || !self.document.contains_node(&edge.target)
            || self.document.edge(&edge.id).is_some()
        {
            return false;
        }
        let index = index.min(self.document.edges.len());
        self.document.edges.insert(index, edge);
        true
    }

    /// Removes an edge, returning it with its former index.
    pub(crate) fn take_edge(&mut self, id: &str) -> Option<(usize, Edge)> {
        let index = self.document.edges.iter().position(|e| e.id == id)?;
        Some((index, self.document.edges.remove(index)))
    }

    fn interactive_node_mut(&mut self, id: &str) -> Result<&mut Node, GraphError> {
        let node = self
            .document
            .node_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        if !node.kind.is_interactive() {
            return Err(GraphError::NotInteractive(id.to_string()));
        }
        Ok(node)
    }

    fn next_node_id(&mut self) -> NodeId {
        loop {
            self.node_counter += 1;
            let candidate = format!("{NODE_ID_PREFIX}{}", self.node_counter);
            if !self.document.contains_node(&candidate) {
                return candidate;
            }
        }
    }

    fn next_edge_id(&mut self, source: &str, target: &str) -> EdgeId {
        loop {
            self.edge_counter += 1;
            let candidate = format!("{EDGE_ID_PREFIX}{source}-{target}-{}", self.edge_counter);
            if self.document.edge(&candidate).is_none() {
                return candidate;
            }
        }
    }
}
