//! Render surface abstraction.
//!
//! The reconciler and layout engine never draw. They talk to a
//! [`RenderSurface`], which owns the actual primitives and reports their
//! geometry back. Shape descriptions here are plain data so any backend
//! (SVG, canvas, a headless test double) can implement the trait.

use std::sync::mpsc;

use mindmap_geometry::{BBox, Point, Size};

use crate::config::ExpanderMetrics;
use crate::record::{DepthTier, Direction, ImageData, NodeId, Toward};

/// Opaque handle to a primitive owned by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeHandle(pub u64);

impl std::fmt::Display for ShapeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// What a shape belongs to, from the node tree's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRole {
    Node,
    Edge,
    Expander,
    Collaborator,
}

/// Spacing added between an image and the label when the image sets none
pub const DEFAULT_IMAGE_GAP: f64 = 8.0;

/// Per-tier node box metrics and palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierMetrics {
    pub font_size: f64,
    /// Horizontal padding added to the label width
    pub padding: f64,
    /// Box height for a single line label
    pub rect_height: f64,
    pub fill: &'static str,
    pub label_color: &'static str,
    /// Stroke width of the edge leading into a node of this tier
    pub edge_stroke_width: f64,
}

impl TierMetrics {
    pub fn for_tier(tier: DepthTier) -> Self {
        match tier {
            DepthTier::Root => Self {
                font_size: 25.0,
                padding: 42.0,
                rect_height: 52.0,
                fill: "#3F89DE",
                label_color: "#fff",
                edge_stroke_width: 0.0,
            },
            DepthTier::FirstLevel => Self {
                font_size: 16.0,
                padding: 40.0,
                rect_height: 37.0,
                fill: "#eee",
                label_color: "#000",
                edge_stroke_width: 2.0,
            },
            DepthTier::Grandchild => Self {
                font_size: 13.0,
                padding: 20.0,
                rect_height: 21.0,
                fill: "none",
                label_color: "#000",
                edge_stroke_width: 1.5,
            },
        }
    }

    /// Approximate rendered label size
    pub fn label_size(&self, label: &str) -> Size {
        let chars = label.chars().count() as f64;
        Size::new(chars * self.font_size * 0.6, self.font_size * 1.2)
    }

    /// Outer box size of a node with this label and optional image
    pub fn measure(&self, label: &str, image: Option<&ImageData>) -> Size {
        let text = self.label_size(label);
        match image {
            Some(img) => {
                let gap = img.gap.unwrap_or(DEFAULT_IMAGE_GAP);
                Size::new(
                    text.width + img.width + self.padding + gap,
                    self.rect_height + (img.height - text.height).max(0.0),
                )
            }
            None => Size::new(text.width + self.padding, self.rect_height),
        }
    }

    /// Label and image origins inside a box at `origin`
    pub fn content_origins(&self, origin: Point, label: &str, image: Option<&ImageData>) -> (Point, Option<Point>) {
        let size = self.measure(label, image);
        let text = self.label_size(label);
        let cy = origin.y + size.height / 2.0;
        let left = origin.x + self.padding / 2.0;
        match image {
            Some(img) => {
                let gap = img.gap.unwrap_or(DEFAULT_IMAGE_GAP);
                let image_y = cy - img.height / 2.0;
                match img.toward {
                    Toward::Left => (
                        Point::new(left + img.width + gap, cy - text.height / 2.0),
                        Some(Point::new(left, image_y)),
                    ),
                    Toward::Right => (
                        Point::new(left, cy - text.height / 2.0),
                        Some(Point::new(left + text.width + gap, image_y)),
                    ),
                }
            }
            None => (Point::new(left, cy - text.height / 2.0), None),
        }
    }
}

/// Everything a surface needs to draw a node box
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShapeSpec {
    pub id: NodeId,
    pub tier: DepthTier,
    pub label: String,
    pub tooltip: String,
    /// Top-left corner; `None` creates the shape hidden until placed
    pub position: Option<Point>,
    pub image: Option<ImageData>,
    pub link: Option<String>,
}

impl NodeShapeSpec {
    pub fn metrics(&self) -> TierMetrics {
        TierMetrics::for_tier(self.tier)
    }

    pub fn size(&self) -> Size {
        self.metrics().measure(&self.label, self.image.as_ref())
    }
}

/// Connector from a father to one child, as a cubic curve
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeShapeSpec {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
    /// Line drawn under the child's label
    pub underline: Option<(Point, Point)>,
    pub stroke_width: f64,
}

impl EdgeShapeSpec {
    /// Edge geometry between two placed boxes.
    ///
    /// Edges out of the root leave its center. Deeper edges leave the
    /// father's outer side (its underline when the father is itself deep) and
    /// end under the child.
    pub fn between(father: &BBox, father_tier: DepthTier, child: &BBox, direction: Direction) -> Self {
        let child_tier = match father_tier {
            DepthTier::Root => DepthTier::FirstLevel,
            _ => DepthTier::Grandchild,
        };
        let stroke_width = TierMetrics::for_tier(child_tier).edge_stroke_width;
        let (near_x, far_x, other_x) = match direction {
            Direction::Right => (child.x, father.x2(), child.x2()),
            Direction::Left => (child.x2(), father.x, child.x),
        };

        if father_tier == DepthTier::Root {
            let start = father.center();
            let end = Point::new(near_x, child.cy());
            let mid_x = (start.x + end.x) / 2.0;
            return Self {
                start,
                control1: Point::new(start.x, end.y),
                control2: Point::new(mid_x, end.y),
                end,
                underline: None,
                stroke_width,
            };
        }

        let start_y = match father_tier {
            DepthTier::FirstLevel => father.cy(),
            _ => father.y2(),
        };
        let start = Point::new(far_x, start_y);
        let end = Point::new(near_x, child.y2());
        let mid_x = (start.x + end.x) / 2.0;
        Self {
            start,
            control1: Point::new(mid_x, start.y),
            control2: Point::new(mid_x, end.y),
            end,
            underline: Some((end, Point::new(other_x, end.y))),
            stroke_width,
        }
    }

    pub fn bounds(&self) -> BBox {
        let mut xs = vec![self.start.x, self.control1.x, self.control2.x, self.end.x];
        let mut ys = vec![self.start.y, self.control1.y, self.control2.y, self.end.y];
        if let Some((a, b)) = self.underline {
            xs.extend([a.x, b.x]);
            ys.extend([a.y, b.y]);
        }
        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        BBox::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Expand/collapse affordance next to a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpanderShapeSpec {
    pub center: Point,
    pub radius: f64,
    pub expanded: bool,
}

impl ExpanderShapeSpec {
    /// Circle just beyond the node's outer side, vertically centered
    pub fn beside(node: &BBox, direction: Direction, metrics: ExpanderMetrics, expanded: bool) -> Self {
        let ExpanderMetrics { radius, offset } = metrics;
        let x = match direction {
            Direction::Right => node.x2() + radius + offset,
            Direction::Left => node.x - radius - offset,
        };
        Self { center: Point::new(x, node.cy()), radius, expanded }
    }

    pub fn bounds(&self) -> BBox {
        BBox::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.radius * 2.0,
            self.radius * 2.0,
        )
    }
}

/// Remote collaborator working on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborator {
    pub name: String,
    /// Badge and frame color, e.g. `#E74C3C`
    pub color: String,
}

/// Horizontal and vertical padding around the badge label
const BADGE_PADDING: (f64, f64) = (20.0, 12.0);
/// Space between the node box and the collaborator frame, both sides together
const FRAME_PADDING: f64 = 6.0;
pub const BADGE_FONT_SIZE: f64 = 12.0;
pub const FRAME_STROKE_WIDTH: f64 = 2.0;

/// Collaborator frame around a node plus the name badge on top of it
#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorShapeSpec {
    pub node_box: BBox,
    pub collaborator: Collaborator,
}

impl CollaboratorShapeSpec {
    pub fn new(node_box: BBox, collaborator: Collaborator) -> Self {
        Self { node_box, collaborator }
    }

    pub fn label_size(&self) -> Size {
        let chars = self.collaborator.name.chars().count() as f64;
        Size::new(chars * BADGE_FONT_SIZE * 0.6, BADGE_FONT_SIZE * 1.2)
    }

    pub fn frame(&self) -> BBox {
        let n = &self.node_box;
        let half = FRAME_PADDING / 2.0;
        BBox::new(n.x - half, n.y - half, n.width + FRAME_PADDING, n.height + FRAME_PADDING)
    }

    /// Name badge resting on the frame's top-left corner
    pub fn badge(&self) -> BBox {
        let label = self.label_size();
        let (width, height) = (label.width + BADGE_PADDING.0, label.height + BADGE_PADDING.1);
        let frame = self.frame();
        BBox::new(frame.x, frame.y - height, width, height)
    }

    pub fn label_origin(&self) -> Point {
        let badge = self.badge();
        let label = self.label_size();
        Point::new(
            badge.x + (badge.width - label.width) / 2.0,
            badge.y + (badge.height - label.height) / 2.0,
        )
    }
}

/// Decoration drawn on top of the tree rather than as part of a node
#[derive(Debug, Clone, PartialEq)]
pub enum OverlaySpec {
    Collaborator(CollaboratorShapeSpec),
    /// Rubber-band rectangle of a multi-select drag, in world space
    SelectionBox(BBox),
}

impl OverlaySpec {
    pub fn bounds(&self) -> BBox {
        match self {
            OverlaySpec::Collaborator(spec) => spec.frame().union(&spec.badge()),
            OverlaySpec::SelectionBox(bbox) => *bbox,
        }
    }
}

/// Visual state a node can be put in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StyleKind {
    #[default]
    Base,
    Hover,
    Select,
    /// Drop target highlight while dragging
    Overlay,
    Disable,
}

/// Attribute set behind one [`StyleKind`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleAttrs {
    pub border_stroke: &'static str,
    pub border_opacity: f64,
    pub opacity: f64,
}

const STYLE_TABLE: [(StyleKind, StyleAttrs); 5] = [
    (StyleKind::Base, StyleAttrs { border_stroke: "#fff", border_opacity: 0.0, opacity: 1.0 }),
    (StyleKind::Hover, StyleAttrs { border_stroke: "#3498DB", border_opacity: 0.5, opacity: 1.0 }),
    (StyleKind::Select, StyleAttrs { border_stroke: "#3498DB", border_opacity: 1.0, opacity: 1.0 }),
    (StyleKind::Overlay, StyleAttrs { border_stroke: "#E74C3C", border_opacity: 0.8, opacity: 1.0 }),
    (StyleKind::Disable, StyleAttrs { border_stroke: "#fff", border_opacity: 0.0, opacity: 0.4 }),
];

pub fn style_attrs(kind: StyleKind) -> StyleAttrs {
    STYLE_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, attrs)| *attrs)
        .unwrap_or(STYLE_TABLE[0].1)
}

/// Pointer events a shape can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeEventKind {
    PointerDown,
    Click,
    DoubleClick,
    DragStart,
    DragMove,
    DragEnd,
    HoverIn,
    HoverOut,
}

/// Pointer payload: client position plus the delta since drag start
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    pub client_x: f64,
    pub client_y: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Pointer {
    pub fn at(client_x: f64, client_y: f64) -> Self {
        Self { client_x, client_y, dx: 0.0, dy: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeEvent {
    pub shape: ShapeHandle,
    pub kind: ShapeEventKind,
    pub pointer: Pointer,
}

/// Token returned by [`RenderSurface::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub id: u64,
    pub shape: ShapeHandle,
    pub kind: ShapeEventKind,
}

/// Drawing backend used by the node tree.
///
/// Calls on a handle that was already removed are ignored.
pub trait RenderSurface {
    fn create_node_shape(&mut self, spec: &NodeShapeSpec) -> ShapeHandle;
    fn create_edge_shape(&mut self, spec: &EdgeShapeSpec) -> ShapeHandle;
    fn create_expander_shape(&mut self, spec: &ExpanderShapeSpec) -> ShapeHandle;

    fn bounding_box(&self, shape: ShapeHandle) -> Option<BBox>;

    /// Move the shape's top-left corner; also shows a node created unplaced
    fn translate_to(&mut self, shape: ShapeHandle, x: f64, y: f64);
    fn set_label(&mut self, shape: ShapeHandle, label: &str);
    fn set_style(&mut self, shape: ShapeHandle, style: StyleKind);
    fn set_visible(&mut self, shape: ShapeHandle, visible: bool);
    /// Switch an expander glyph between its expanded and collapsed look
    fn set_expanded(&mut self, shape: ShapeHandle, expanded: bool);
    /// Replace an edge's geometry in place
    fn reshape_edge(&mut self, shape: ShapeHandle, spec: &EdgeShapeSpec);
    fn create_overlay_shape(&mut self, spec: &OverlaySpec) -> ShapeHandle;
    fn reshape_overlay(&mut self, shape: ShapeHandle, spec: &OverlaySpec);
    fn remove(&mut self, shape: ShapeHandle);

    fn subscribe(&mut self, shape: ShapeHandle, kind: ShapeEventKind, sink: mpsc::Sender<ShapeEvent>) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
}
