//! Graph query operations
//!
//! Filtering, shortest-path, and visual-encoding derivation over an
//! assembled graph. Filtering produces a derived subset copy; the other
//! operations read or touch presentation state only.

mod filter;
mod path;
mod visual;

pub use filter::{filter_graph, FilterOperator, FilterPredicate};
pub use path::{shortest_path, PathEdge, PathResult};
pub use visual::{apply_visual_encoding, VisualEncoding, COLOR_PALETTE, SHAPE_SET};
