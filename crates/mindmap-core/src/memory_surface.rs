//! Headless render surface.
//!
//! Keeps every primitive as plain data and counts each mutation. Tests use the
//! counters to prove reconciliation does no redundant work; the SVG exporter
//! builds on the retained primitives.

use std::collections::BTreeMap;
use std::sync::mpsc;

use mindmap_geometry::{BBox, Point};
use tracing::trace;

use crate::record::NodeId;
use crate::surface::{
    EdgeShapeSpec, ExpanderShapeSpec, NodeShapeSpec, OverlaySpec, Pointer, RenderSurface, ShapeEvent, ShapeEventKind,
    ShapeHandle, StyleKind, Subscription,
};

/// Mutation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub created: usize,
    pub removed: usize,
    pub translated: usize,
    pub labels_set: usize,
    pub styles_set: usize,
    pub visibility_set: usize,
    pub expanders_toggled: usize,
    pub edges_reshaped: usize,
    pub overlays_reshaped: usize,
}

impl SurfaceStats {
    /// Sum of every counter
    pub fn mutations(&self) -> usize {
        self.created
            + self.removed
            + self.translated
            + self.labels_set
            + self.styles_set
            + self.visibility_set
            + self.expanders_toggled
            + self.edges_reshaped
            + self.overlays_reshaped
    }

    /// Counter-wise difference from an earlier reading
    pub fn since(&self, earlier: &SurfaceStats) -> SurfaceStats {
        SurfaceStats {
            created: self.created - earlier.created,
            removed: self.removed - earlier.removed,
            translated: self.translated - earlier.translated,
            labels_set: self.labels_set - earlier.labels_set,
            styles_set: self.styles_set - earlier.styles_set,
            visibility_set: self.visibility_set - earlier.visibility_set,
            expanders_toggled: self.expanders_toggled - earlier.expanders_toggled,
            edges_reshaped: self.edges_reshaped - earlier.edges_reshaped,
            overlays_reshaped: self.overlays_reshaped - earlier.overlays_reshaped,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryShapeKind {
    Node(NodeShapeSpec),
    Edge(EdgeShapeSpec),
    Expander(ExpanderShapeSpec),
    Overlay(OverlaySpec),
}

/// One retained primitive
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryShape {
    pub kind: MemoryShapeKind,
    pub bbox: BBox,
    pub style: StyleKind,
    pub visible: bool,
}

impl MemoryShape {
    pub fn node(&self) -> Option<&NodeShapeSpec> {
        match &self.kind {
            MemoryShapeKind::Node(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<&OverlaySpec> {
        match &self.kind {
            MemoryShapeKind::Overlay(spec) => Some(spec),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    next_handle: u64,
    next_subscription: u64,
    shapes: BTreeMap<ShapeHandle, MemoryShape>,
    subscriptions: Vec<(Subscription, mpsc::Sender<ShapeEvent>)>,
    stats: SurfaceStats,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&MemoryShape> {
        self.shapes.get(&handle)
    }

    /// Live primitives in creation order
    pub fn shapes(&self) -> impl Iterator<Item = (ShapeHandle, &MemoryShape)> {
        self.shapes.iter().map(|(h, s)| (*h, s))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Node shape drawn for a record id
    pub fn find_node(&self, id: &NodeId) -> Option<ShapeHandle> {
        self.shapes
            .iter()
            .find(|(_, s)| s.node().is_some_and(|spec| &spec.id == id))
            .map(|(h, _)| *h)
    }

    /// Deliver a pointer event to every subscriber of `shape` for `kind`
    pub fn fire(&mut self, shape: ShapeHandle, kind: ShapeEventKind, pointer: Pointer) -> usize {
        let event = ShapeEvent { shape, kind, pointer };
        let mut delivered = 0;
        self.subscriptions.retain(|(sub, tx)| {
            if sub.shape != shape || sub.kind != kind {
                return true;
            }
            let alive = tx.send(event).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });
        delivered
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn insert(&mut self, kind: MemoryShapeKind, bbox: BBox, visible: bool) -> ShapeHandle {
        self.next_handle += 1;
        let handle = ShapeHandle(self.next_handle);
        self.shapes.insert(handle, MemoryShape { kind, bbox, style: StyleKind::Base, visible });
        self.stats.created += 1;
        trace!(%handle, "shape created");
        handle
    }
}

impl RenderSurface for MemorySurface {
    fn create_node_shape(&mut self, spec: &NodeShapeSpec) -> ShapeHandle {
        let origin = spec.position.unwrap_or_default();
        let bbox = BBox::from_origin_size(origin, spec.size());
        self.insert(MemoryShapeKind::Node(spec.clone()), bbox, spec.position.is_some())
    }

    fn create_edge_shape(&mut self, spec: &EdgeShapeSpec) -> ShapeHandle {
        self.insert(MemoryShapeKind::Edge(spec.clone()), spec.bounds(), true)
    }

    fn create_expander_shape(&mut self, spec: &ExpanderShapeSpec) -> ShapeHandle {
        self.insert(MemoryShapeKind::Expander(*spec), spec.bounds(), true)
    }

    fn bounding_box(&self, shape: ShapeHandle) -> Option<BBox> {
        self.shapes.get(&shape).map(|s| s.bbox)
    }

    fn translate_to(&mut self, shape: ShapeHandle, x: f64, y: f64) {
        let Some(s) = self.shapes.get_mut(&shape) else {
            return;
        };
        s.bbox = s.bbox.moved_to(x, y);
        match &mut s.kind {
            MemoryShapeKind::Node(spec) => {
                if spec.position.is_none() {
                    s.visible = true;
                }
                spec.position = Some(Point::new(x, y));
            }
            MemoryShapeKind::Expander(spec) => {
                spec.center = Point::new(x + spec.radius, y + spec.radius);
            }
            MemoryShapeKind::Edge(_) | MemoryShapeKind::Overlay(_) => {}
        }
        self.stats.translated += 1;
        trace!(%shape, x, y, "shape translated");
    }

    fn set_label(&mut self, shape: ShapeHandle, label: &str) {
        let Some(s) = self.shapes.get_mut(&shape) else {
            return;
        };
        if let MemoryShapeKind::Node(spec) = &mut s.kind {
            spec.label = label.to_string();
            s.bbox = BBox::from_origin_size(s.bbox.origin(), spec.size());
            self.stats.labels_set += 1;
            trace!(%shape, label, "label set");
        }
    }

    fn set_style(&mut self, shape: ShapeHandle, style: StyleKind) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.style = style;
            self.stats.styles_set += 1;
        }
    }

    fn set_visible(&mut self, shape: ShapeHandle, visible: bool) {
        if let Some(s) = self.shapes.get_mut(&shape) {
            s.visible = visible;
            self.stats.visibility_set += 1;
        }
    }

    fn set_expanded(&mut self, shape: ShapeHandle, expanded: bool) {
        let Some(s) = self.shapes.get_mut(&shape) else {
            return;
        };
        if let MemoryShapeKind::Expander(spec) = &mut s.kind {
            spec.expanded = expanded;
            self.stats.expanders_toggled += 1;
        }
    }

    fn reshape_edge(&mut self, shape: ShapeHandle, spec: &EdgeShapeSpec) {
        let Some(s) = self.shapes.get_mut(&shape) else {
            return;
        };
        if let MemoryShapeKind::Edge(old) = &mut s.kind {
            *old = spec.clone();
            s.bbox = spec.bounds();
            self.stats.edges_reshaped += 1;
        }
    }

    fn create_overlay_shape(&mut self, spec: &OverlaySpec) -> ShapeHandle {
        self.insert(MemoryShapeKind::Overlay(spec.clone()), spec.bounds(), true)
    }

    fn reshape_overlay(&mut self, shape: ShapeHandle, spec: &OverlaySpec) {
        let Some(s) = self.shapes.get_mut(&shape) else {
            return;
        };
        if let MemoryShapeKind::Overlay(old) = &mut s.kind {
            *old = spec.clone();
            s.bbox = spec.bounds();
            self.stats.overlays_reshaped += 1;
        }
    }

    fn remove(&mut self, shape: ShapeHandle) {
        if self.shapes.remove(&shape).is_some() {
            self.subscriptions.retain(|(sub, _)| sub.shape != shape);
            self.stats.removed += 1;
            trace!(%shape, "shape removed");
        }
    }

    fn subscribe(&mut self, shape: ShapeHandle, kind: ShapeEventKind, sink: mpsc::Sender<ShapeEvent>) -> Subscription {
        self.next_subscription += 1;
        let subscription = Subscription { id: self.next_subscription, shape, kind };
        self.subscriptions.push((subscription, sink));
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscriptions.retain(|(sub, _)| sub.id != subscription.id);
    }
}
