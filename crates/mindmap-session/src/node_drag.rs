//! Dragging a node onto a new father.

use mindmap_core::NodeId;
use mindmap_geometry::Point;

/// State for an in-progress node drag
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDragState {
    pub node: NodeId,
    /// Client position of the press
    pub start: Point,
    /// Pointer position minus node origin, in world space
    pub grab_offset: Point,
    /// Set once the pointer travelled past the drag threshold
    pub committed: bool,
    /// Node currently highlighted as the drop target
    pub target: Option<NodeId>,
}

impl NodeDragState {
    pub fn new(node: NodeId, start: Point, grab_offset: Point) -> Self {
        Self { node, start, grab_offset, committed: false, target: None }
    }

    /// Whether a pointer at `client` is far enough from the press to drag
    pub fn exceeds(&self, client: Point, threshold: f64) -> bool {
        (client.x - self.start.x).abs() > threshold || (client.y - self.start.y).abs() > threshold
    }

    /// Where the node box should sit for a pointer at `world`
    pub fn box_origin(&self, world: Point) -> Point {
        Point::new(world.x - self.grab_offset.x, world.y - self.grab_offset.y)
    }
}

/// How a node drag ended
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Released before the threshold; treated as a click
    Cancelled,
    /// Released away from any valid target; the node went back to its slot
    Settled,
    /// Re-parented under the target
    Moved { node: NodeId, father: NodeId },
}
