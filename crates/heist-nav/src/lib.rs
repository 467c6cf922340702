// heist-nav: the walkability graph AI characters plan over.
//
// Nodes are sampled just above upward-facing edges of wall and platform
// outlines; directed edges connect nodes within step, climb and drop limits
// that no outline blocks. During a stage rotation the graph is rigidly
// transformed with the same math as the bodies, then rebuilt on completion.

pub mod debug;
pub mod geometry;
pub mod graph;
pub mod snapshot;
pub mod surfaces;

pub use debug::{DebugCanvas, DebugStyle, draw_debug};
pub use graph::{NavEdge, NavGraph, NavNode, Surface};
pub use snapshot::{EdgeSnapshot, NavSnapshot, NodeSnapshot};
pub use surfaces::collect_surfaces;
