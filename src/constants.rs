//! Shared crate-wide constants.
//! Centralizes tweakable values used by the store, the editor session and the remote clients.

// Seeded document
/// Id of the start node in the seeded two-node document.
pub const SEED_START_ID: &str = "home";
/// Id of the end node in the seeded two-node document.
pub const SEED_END_ID: &str = "end";
/// Canvas position of the seeded start node.
pub const SEED_START_POSITION: (f64, f64) = (250.0, 25.0);
/// Canvas position of the seeded end node.
pub const SEED_END_POSITION: (f64, f64) = (250.0, 250.0);

// Node defaults
/// Prefix for generated node ids (`node-1`, `node-2`, ...).
pub const NODE_ID_PREFIX: &str = "node-";
/// Prefix for generated edge ids (`edge-{source}-{target}-{seq}`).
pub const EDGE_ID_PREFIX: &str = "edge-";
/// Prefix for generated interactive connector ids (`handler-0`, ...).
pub const HANDLER_ID_PREFIX: &str = "handler-";
/// Role label given to freshly added nodes.
pub const DEFAULT_JOB: &str = "New Node";
/// Icon reference given to freshly added nodes.
pub const DEFAULT_ICON: &str = "user";

// Edge presentation
/// Stroke color applied to edges drawn by a connect gesture.
pub const EDGE_STROKE: &str = "#1890ff";
/// Marker type applied to the end of new edges.
pub const EDGE_MARKER: &str = "arrowclosed";

// Viewport
/// Zoom used when a stored viewport omits it.
pub const DEFAULT_ZOOM: f64 = 1.0;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;

// Sidebar
/// Delay between the pointer leaving the sidebar and the sidebar collapsing, in milliseconds.
pub const COLLAPSE_TIMEOUT_MS: u64 = 500;

// Remote storage
/// Backend address used when no configuration overrides it.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// Request timeout for backend calls, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Number of recent writes the in-memory file store remembers.
pub const MEMORY_WRITE_LOG_LIMIT: usize = 32;
/// Suffix the backend appends to every stored flow file.
pub const FLOW_FILE_EXTENSION: &str = ".flow.json";
