//! Live node tree.
//!
//! Entities live in a generational arena. A node owns its children through
//! the ordered `children` index list; `father` is a plain back-reference used
//! for lookups only. Every shape a node owns on the render surface is tracked
//! here so it can be removed exactly once.

use std::collections::HashMap;
use std::sync::mpsc;

use generational_arena::{Arena, Index};
use mindmap_geometry::{BBox, Point};
use tracing::{debug, instrument, trace};

use crate::config::ExpanderMetrics;
use crate::expander::ExpandController;
use crate::record::{DepthTier, Direction, ImageData, NodeId, NodeRecord};
use crate::surface::{
    Collaborator, CollaboratorShapeSpec, EdgeShapeSpec, NodeShapeSpec, OverlaySpec, RenderSurface, ShapeEvent,
    ShapeEventKind, ShapeHandle, ShapeRole, StyleKind, Subscription,
};

/// Pointer events routed from every node box
const NODE_EVENTS: [ShapeEventKind; 8] = [
    ShapeEventKind::PointerDown,
    ShapeEventKind::Click,
    ShapeEventKind::DoubleClick,
    ShapeEventKind::DragStart,
    ShapeEventKind::DragMove,
    ShapeEventKind::DragEnd,
    ShapeEventKind::HoverIn,
    ShapeEventKind::HoverOut,
];

/// Record fields that only affect how a node box is drawn
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeContent {
    pub label: String,
    pub tooltip: String,
    pub image: Option<ImageData>,
    pub link: Option<String>,
}

impl NodeContent {
    pub fn from_record(record: &NodeRecord) -> Self {
        Self {
            label: record.label.clone(),
            tooltip: record.tooltip.clone(),
            image: record.image_data.clone(),
            link: record.link.clone(),
        }
    }

    /// True when anything besides the label differs
    pub fn differs_beyond_label(&self, other: &NodeContent) -> bool {
        self.tooltip != other.tooltip || self.image != other.image || self.link != other.link
    }
}

/// Edge into a node, with the geometry it was last drawn with
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeShape {
    pub handle: ShapeHandle,
    pub spec: EdgeShapeSpec,
}

/// Collaborator frame and badge as last drawn
#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorMarker {
    pub handle: ShapeHandle,
    pub spec: CollaboratorShapeSpec,
}

#[derive(Debug)]
pub struct NodeEntity {
    pub id: NodeId,
    pub depth: usize,
    /// `None` only for the root
    pub direction: Option<Direction>,
    pub content: NodeContent,
    pub father: Option<Index>,
    pub children: Vec<Index>,
    pub expander: ExpandController,
    pub shape: ShapeHandle,
    pub edge: Option<EdgeShape>,
    /// Last known box; the origin is meaningful once `placed`
    pub bbox: BBox,
    pub placed: bool,
    /// Whether the node box is currently displayed
    pub shown: bool,
    pub style: StyleKind,
    /// Vertical space reserved for this subtree by the layout
    pub extent: f64,
    /// Remote collaborator currently on this node
    pub collaborator: Option<Collaborator>,
    /// Drawn only while the node is shown
    pub marker: Option<CollaboratorMarker>,
    subscriptions: Vec<Subscription>,
}

impl NodeEntity {
    pub fn tier(&self) -> DepthTier {
        DepthTier::from_depth(self.depth)
    }

    pub fn is_root(&self) -> bool {
        self.father.is_none()
    }

    /// Side the node hangs on; the root reports RIGHT
    pub fn side(&self) -> Direction {
        self.direction.unwrap_or(Direction::Right)
    }

    pub fn label(&self) -> &str {
        &self.content.label
    }
}

/// Arena-backed tree of live nodes
#[derive(Debug)]
pub struct NodeTree {
    arena: Arena<NodeEntity>,
    root: Option<Index>,
    by_id: HashMap<NodeId, Index>,
    shape_owners: HashMap<ShapeHandle, (Index, ShapeRole)>,
    event_tx: mpsc::Sender<ShapeEvent>,
    event_rx: mpsc::Receiver<ShapeEvent>,
    expander_metrics: ExpanderMetrics,
}

impl NodeTree {
    pub fn new(expander_metrics: ExpanderMetrics) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            arena: Arena::new(),
            root: None,
            by_id: HashMap::new(),
            shape_owners: HashMap::new(),
            event_tx,
            event_rx,
            expander_metrics,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn get(&self, idx: Index) -> Option<&NodeEntity> {
        self.arena.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: Index) -> Option<&mut NodeEntity> {
        self.arena.get_mut(idx)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn entity(&self, id: &NodeId) -> Option<&NodeEntity> {
        self.index_of(id).and_then(|idx| self.arena.get(idx))
    }

    pub fn id_of(&self, idx: Index) -> Option<&NodeId> {
        self.arena.get(idx).map(|e| &e.id)
    }

    /// Node and role owning a surface shape
    pub fn owner_of(&self, shape: ShapeHandle) -> Option<(NodeId, ShapeRole)> {
        let (idx, role) = self.shape_owners.get(&shape)?;
        Some((self.arena.get(*idx)?.id.clone(), *role))
    }

    pub fn expander_metrics(&self) -> ExpanderMetrics {
        self.expander_metrics
    }

    /// Pointer events reported by shapes since the last drain
    pub fn drain_events(&self) -> Vec<ShapeEvent> {
        self.event_rx.try_iter().collect()
    }

    pub(crate) fn event_sender(&self) -> mpsc::Sender<ShapeEvent> {
        self.event_tx.clone()
    }

    pub(crate) fn register_shape(&mut self, shape: ShapeHandle, idx: Index, role: ShapeRole) {
        self.shape_owners.insert(shape, (idx, role));
    }

    pub(crate) fn forget_shape(&mut self, shape: ShapeHandle) {
        self.shape_owners.remove(&shape);
    }

    pub fn children_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.entity(id)
            .map(|e| e.children.iter().filter_map(|c| self.id_of(*c).cloned()).collect())
            .unwrap_or_default()
    }

    /// `idx` and everything below it, preorder
    pub fn subtree(&self, idx: Index) -> Vec<Index> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let Some(entity) = self.arena.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(entity.children.iter().rev().copied());
        }
        out
    }

    /// Every live node, preorder from the root
    pub fn preorder(&self) -> Vec<Index> {
        self.root.map(|r| self.subtree(r)).unwrap_or_default()
    }

    /// True when `idx` sits somewhere below `ancestor` (or is it)
    pub fn is_descendant(&self, idx: Index, ancestor: Index) -> bool {
        let mut cursor = Some(idx);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.arena.len() {
                return false;
            }
            cursor = self.arena.get(current).and_then(|e| e.father);
        }
        false
    }

    /// Displayed node under a world point, skipping the subtree of `exclude`
    pub fn hit_test(&self, point: Point, exclude: Option<Index>) -> Option<Index> {
        self.preorder().into_iter().rev().find(|&idx| {
            let Some(entity) = self.arena.get(idx) else {
                return false;
            };
            entity.shown
                && entity.bbox.contains(point)
                && exclude.is_none_or(|ex| !self.is_descendant(idx, ex))
        })
    }

    /// Displayed nodes whose box overlaps `area`, in preorder
    pub fn intersecting(&self, area: &BBox) -> Vec<Index> {
        self.preorder()
            .into_iter()
            .filter(|&idx| self.arena.get(idx).is_some_and(|e| e.shown && e.bbox.intersects(area)))
            .collect()
    }

    fn shape_spec(&self, entity: &NodeEntity, position: Option<Point>) -> NodeShapeSpec {
        NodeShapeSpec {
            id: entity.id.clone(),
            tier: entity.tier(),
            label: entity.content.label.clone(),
            tooltip: entity.content.tooltip.clone(),
            position,
            image: entity.content.image.clone(),
            link: entity.content.link.clone(),
        }
    }

    fn subscribe_node(&self, shape: ShapeHandle, surface: &mut dyn RenderSurface) -> Vec<Subscription> {
        NODE_EVENTS
            .iter()
            .map(|kind| surface.subscribe(shape, *kind, self.event_tx.clone()))
            .collect()
    }

    /// Create an entity and its (unplaced, hidden) node box
    #[instrument(level = "trace", skip(self, record, surface))]
    pub fn create(
        &mut self,
        id: NodeId,
        record: &NodeRecord,
        depth: usize,
        direction: Option<Direction>,
        father: Option<Index>,
        surface: &mut dyn RenderSurface,
    ) -> Index {
        let content = NodeContent::from_record(record);
        let spec = NodeShapeSpec {
            id: id.clone(),
            tier: DepthTier::from_depth(depth),
            label: content.label.clone(),
            tooltip: content.tooltip.clone(),
            position: None,
            image: content.image.clone(),
            link: content.link.clone(),
        };
        let shape = surface.create_node_shape(&spec);
        let bbox = surface
            .bounding_box(shape)
            .unwrap_or_else(|| BBox::from_origin_size(Point::default(), spec.size()));
        let subscriptions = self.subscribe_node(shape, surface);

        let idx = self.arena.insert(NodeEntity {
            id: id.clone(),
            depth,
            direction,
            content,
            father,
            children: Vec::new(),
            expander: ExpandController::new(record.is_expand),
            shape,
            edge: None,
            bbox,
            placed: false,
            shown: false,
            style: StyleKind::Base,
            extent: bbox.height,
            collaborator: None,
            marker: None,
            subscriptions,
        });
        if father.is_none() {
            self.root = Some(idx);
        }
        self.by_id.insert(id, idx);
        self.shape_owners.insert(shape, (idx, ShapeRole::Node));
        trace!(?idx, depth, "entity created");
        idx
    }

    /// Remove `idx` and its whole subtree from the tree and the surface.
    ///
    /// Returns how many entities were destroyed.
    #[instrument(level = "trace", skip(self, surface))]
    pub fn destroy(&mut self, idx: Index, surface: &mut dyn RenderSurface) -> usize {
        let Some(father) = self.arena.get(idx).map(|e| e.father) else {
            return 0;
        };
        if let Some(f) = father.and_then(|f| self.arena.get_mut(f)) {
            f.children.retain(|c| *c != idx);
        }

        let doomed = self.subtree(idx);
        for current in doomed.iter().rev() {
            let Some(entity) = self.arena.remove(*current) else {
                continue;
            };
            for sub in entity.subscriptions {
                surface.unsubscribe(sub);
            }
            if let Some(sub) = entity.expander.subscription() {
                surface.unsubscribe(sub);
            }
            let owned = [
                Some(entity.shape),
                entity.edge.map(|e| e.handle),
                entity.expander.affordance(),
                entity.marker.map(|m| m.handle),
            ];
            for shape in owned.into_iter().flatten() {
                surface.remove(shape);
                self.shape_owners.remove(&shape);
            }
            if self.by_id.get(&entity.id) == Some(current) {
                self.by_id.remove(&entity.id);
            }
            debug!(id = %entity.id, "entity destroyed");
        }
        if self.root == Some(idx) {
            self.root = None;
        }
        doomed.len()
    }

    /// Destroy everything
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) -> usize {
        match self.root {
            Some(root) => self.destroy(root, surface),
            None => 0,
        }
    }

    /// Update the label in place; the box keeps its origin
    pub fn set_label(&mut self, idx: Index, label: &str, surface: &mut dyn RenderSurface) {
        let Some(entity) = self.arena.get_mut(idx) else {
            return;
        };
        surface.set_label(entity.shape, label);
        entity.content.label = label.to_string();
        if let Some(measured) = surface.bounding_box(entity.shape) {
            entity.bbox = BBox::from_origin_size(entity.bbox.origin(), measured.size());
        }
        self.sync_marker(idx, surface);
    }

    /// Redraw the node box after a change only a new shape can express
    pub fn set_content(&mut self, idx: Index, content: NodeContent, surface: &mut dyn RenderSurface) {
        if let Some(entity) = self.arena.get_mut(idx) {
            entity.content = content;
        }
        self.recreate_shape(idx, surface);
    }

    pub fn set_style(&mut self, idx: Index, style: StyleKind, surface: &mut dyn RenderSurface) {
        let Some(entity) = self.arena.get_mut(idx) else {
            return;
        };
        if entity.style != style {
            surface.set_style(entity.shape, style);
            entity.style = style;
        }
    }

    /// Replace the node box, keeping position, visibility and style
    pub fn recreate_shape(&mut self, idx: Index, surface: &mut dyn RenderSurface) {
        let Some(entity) = self.arena.get(idx) else {
            return;
        };
        let position = entity.placed.then(|| entity.bbox.origin());
        let spec = self.shape_spec(entity, position);
        let (old_shape, shown, style) = (entity.shape, entity.shown, entity.style);

        let Some(entity) = self.arena.get_mut(idx) else {
            return;
        };
        for sub in entity.subscriptions.drain(..) {
            surface.unsubscribe(sub);
        }
        surface.remove(old_shape);
        self.shape_owners.remove(&old_shape);

        let shape = surface.create_node_shape(&spec);
        if position.is_some() && !shown {
            surface.set_visible(shape, false);
        }
        if style != StyleKind::Base {
            surface.set_style(shape, style);
        }
        let subscriptions = self.subscribe_node(shape, surface);
        let measured = surface.bounding_box(shape);
        if let Some(entity) = self.arena.get_mut(idx) {
            entity.shape = shape;
            entity.subscriptions = subscriptions;
            entity.shown = shown && position.is_some();
            if let Some(measured) = measured {
                entity.bbox = BBox::from_origin_size(entity.bbox.origin(), measured.size());
            }
        }
        self.shape_owners.insert(shape, (idx, ShapeRole::Node));
        self.sync_marker(idx, surface);
        trace!(?idx, %shape, "node shape recreated");
    }

    /// Move `idx` under `new_father`, recomputing depth below it.
    ///
    /// The caller decides where `idx` goes in the new father's child list.
    pub fn reparent(&mut self, idx: Index, new_father: Index, surface: &mut dyn RenderSurface) -> Option<Index> {
        let old_father = self.arena.get(idx)?.father;
        let father_depth = self.arena.get(new_father)?.depth;
        if let Some(f) = old_father.and_then(|f| self.arena.get_mut(f)) {
            f.children.retain(|c| *c != idx);
        }
        if let Some(entity) = self.arena.get_mut(idx) {
            entity.father = Some(new_father);
        }
        if old_father.is_none() && self.root == Some(idx) {
            self.root = None;
        }
        self.recompute_depth(idx, father_depth + 1, surface);
        debug!(?idx, ?new_father, "entity re-parented");
        old_father
    }

    fn recompute_depth(&mut self, idx: Index, depth: usize, surface: &mut dyn RenderSurface) {
        let mut stack = vec![(idx, depth)];
        while let Some((current, depth)) = stack.pop() {
            let Some(entity) = self.arena.get_mut(current) else {
                continue;
            };
            let old_tier = entity.tier();
            entity.depth = depth;
            let tier_changed = entity.tier() != old_tier;
            stack.extend(entity.children.iter().map(|c| (*c, depth + 1)));
            if tier_changed {
                self.recreate_shape(current, surface);
            }
        }
    }

    /// Move a node box without touching the rest of the tree
    pub fn translate(&mut self, idx: Index, x: f64, y: f64, surface: &mut dyn RenderSurface) {
        let Some(entity) = self.arena.get_mut(idx) else {
            return;
        };
        if entity.placed && entity.bbox.x == x && entity.bbox.y == y {
            return;
        }
        surface.translate_to(entity.shape, x, y);
        entity.bbox = entity.bbox.moved_to(x, y);
        if !entity.placed {
            entity.placed = true;
            entity.shown = true;
        }
        self.sync_marker(idx, surface);
    }

    /// Put a collaborator on a node, or take it off with `None`.
    ///
    /// Returns whether anything changed.
    pub fn set_collaborator(
        &mut self,
        idx: Index,
        collaborator: Option<Collaborator>,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        let Some(entity) = self.arena.get_mut(idx) else {
            return false;
        };
        if entity.collaborator == collaborator {
            return false;
        }
        entity.collaborator = collaborator;
        self.sync_marker(idx, surface);
        true
    }

    /// Make the collaborator marker match the node: drawn around a shown
    /// node that has a collaborator, absent otherwise.
    pub fn sync_marker(&mut self, idx: Index, surface: &mut dyn RenderSurface) {
        let Some(entity) = self.arena.get_mut(idx) else {
            return;
        };
        let wanted = match (&entity.collaborator, entity.shown) {
            (Some(who), true) => Some(CollaboratorShapeSpec::new(entity.bbox, who.clone())),
            _ => None,
        };
        match (wanted, entity.marker.take()) {
            (Some(spec), Some(mut marker)) => {
                if marker.spec != spec {
                    surface.reshape_overlay(marker.handle, &OverlaySpec::Collaborator(spec.clone()));
                    marker.spec = spec;
                }
                entity.marker = Some(marker);
            }
            (Some(spec), None) => {
                let handle = surface.create_overlay_shape(&OverlaySpec::Collaborator(spec.clone()));
                entity.marker = Some(CollaboratorMarker { handle, spec });
                self.shape_owners.insert(handle, (idx, ShapeRole::Collaborator));
                trace!(?idx, "collaborator marker drawn");
            }
            (None, Some(old)) => {
                surface.remove(old.handle);
                self.shape_owners.remove(&old.handle);
                trace!(?idx, "collaborator marker removed");
            }
            (None, None) => {}
        }
    }

    /// Drop the edge leading into `idx`
    pub fn remove_edge(&mut self, idx: Index, surface: &mut dyn RenderSurface) {
        let Some(edge) = self.arena.get_mut(idx).and_then(|e| e.edge.take()) else {
            return;
        };
        surface.remove(edge.handle);
        self.shape_owners.remove(&edge.handle);
    }

    /// Create or reshape the edge into `idx` so it matches `spec`
    pub fn sync_edge(&mut self, idx: Index, spec: EdgeShapeSpec, surface: &mut dyn RenderSurface) {
        let Some(entity) = self.arena.get_mut(idx) else {
            return;
        };
        if let Some(edge) = &mut entity.edge {
            if edge.spec != spec {
                surface.reshape_edge(edge.handle, &spec);
                edge.spec = spec;
            }
            return;
        }
        let handle = surface.create_edge_shape(&spec);
        entity.edge = Some(EdgeShape { handle, spec });
        self.shape_owners.insert(handle, (idx, ShapeRole::Edge));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_surface::MemorySurface;

    fn metrics() -> ExpanderMetrics {
        ExpanderMetrics { radius: 5.0, offset: 2.0 }
    }

    fn small_tree(surface: &mut MemorySurface) -> (NodeTree, Index, Index, Index) {
        let mut tree = NodeTree::new(metrics());
        let right = NodeRecord::child("leaf", Direction::Right);
        let root = tree.create("r".into(), &NodeRecord::root("root"), 0, None, None, surface);
        let a = tree.create("a".into(), &right, 1, Some(Direction::Right), Some(root), surface);
        let b = tree.create("b".into(), &right, 2, Some(Direction::Right), Some(a), surface);
        tree.get_mut(root).unwrap().children.push(a);
        tree.get_mut(a).unwrap().children.push(b);
        (tree, root, a, b)
    }

    #[test]
    fn destroy_removes_whole_subtree() {
        let mut surface = MemorySurface::new();
        let (mut tree, root, a, _) = small_tree(&mut surface);
        assert_eq!(tree.destroy(a, &mut surface), 2);
        assert_eq!(tree.len(), 1);
        assert!(tree.get(root).unwrap().children.is_empty());
        assert_eq!(surface.len(), 1);
        assert_eq!(surface.subscription_count(), NODE_EVENTS.len());
        assert!(tree.index_of(&"b".into()).is_none());
    }

    #[test]
    fn reparent_recomputes_depth_and_reshapes_tier_changes() {
        let mut surface = MemorySurface::new();
        let (mut tree, root, a, b) = small_tree(&mut surface);
        let old_shape = tree.get(b).unwrap().shape;
        tree.reparent(b, root, &mut surface);
        tree.get_mut(root).unwrap().children.push(b);

        let entity = tree.get(b).unwrap();
        assert_eq!(entity.depth, 1);
        assert_ne!(entity.shape, old_shape);
        assert!(tree.get(a).unwrap().children.is_empty());
        assert_eq!(tree.owner_of(entity.shape), Some(("b".into(), ShapeRole::Node)));
        assert_eq!(tree.owner_of(old_shape), None);
    }

    #[test]
    fn descendant_checks_follow_fathers() {
        let mut surface = MemorySurface::new();
        let (tree, root, a, b) = small_tree(&mut surface);
        assert!(tree.is_descendant(b, root));
        assert!(tree.is_descendant(a, a));
        assert!(!tree.is_descendant(a, b));
    }

    #[test]
    fn label_change_keeps_the_same_shape() {
        let mut surface = MemorySurface::new();
        let (mut tree, _, a, _) = small_tree(&mut surface);
        let shape = tree.get(a).unwrap().shape;
        let width = tree.get(a).unwrap().bbox.width;
        tree.set_label(a, "a much longer label", &mut surface);
        let entity = tree.get(a).unwrap();
        assert_eq!(entity.shape, shape);
        assert!(entity.bbox.width > width);
    }

    fn alice() -> Collaborator {
        Collaborator { name: "alice".into(), color: "#E74C3C".into() }
    }

    fn marker_spec(surface: &MemorySurface, tree: &NodeTree, idx: Index) -> CollaboratorShapeSpec {
        let handle = tree.get(idx).unwrap().marker.as_ref().unwrap().handle;
        match surface.shape(handle).unwrap().overlay() {
            Some(OverlaySpec::Collaborator(spec)) => spec.clone(),
            other => panic!("expected a collaborator overlay, got {other:?}"),
        }
    }

    #[test]
    fn collaborator_marker_waits_for_the_node_to_show() {
        let mut surface = MemorySurface::new();
        let (mut tree, _, a, _) = small_tree(&mut surface);
        assert!(tree.set_collaborator(a, Some(alice()), &mut surface));
        assert!(tree.get(a).unwrap().marker.is_none());
        assert!(!tree.set_collaborator(a, Some(alice()), &mut surface));

        tree.translate(a, 40.0, 10.0, &mut surface);
        let marker = tree.get(a).unwrap().marker.clone().unwrap();
        assert_eq!(tree.owner_of(marker.handle), Some(("a".into(), ShapeRole::Collaborator)));
        assert_eq!(marker_spec(&surface, &tree, a).node_box.origin(), Point::new(40.0, 10.0));
    }

    #[test]
    fn collaborator_marker_follows_moves_and_goes_with_the_node() {
        let mut surface = MemorySurface::new();
        let (mut tree, root, a, _) = small_tree(&mut surface);
        tree.translate(a, 0.0, 0.0, &mut surface);
        tree.set_collaborator(a, Some(alice()), &mut surface);
        let handle = tree.get(a).unwrap().marker.as_ref().unwrap().handle;

        tree.translate(a, 100.0, 50.0, &mut surface);
        assert_eq!(tree.get(a).unwrap().marker.as_ref().unwrap().handle, handle);
        assert_eq!(marker_spec(&surface, &tree, a).frame().origin(), Point::new(97.0, 47.0));

        let before = surface.len();
        tree.destroy(a, &mut surface);
        assert!(surface.shape(handle).is_none());
        assert_eq!(tree.owner_of(handle), None);
        assert_eq!(surface.len(), before - 3);
        assert!(tree.get(root).is_some());
    }

    #[test]
    fn clearing_the_collaborator_removes_the_marker() {
        let mut surface = MemorySurface::new();
        let (mut tree, _, a, _) = small_tree(&mut surface);
        tree.translate(a, 0.0, 0.0, &mut surface);
        tree.set_collaborator(a, Some(alice()), &mut surface);
        let handle = tree.get(a).unwrap().marker.as_ref().unwrap().handle;

        assert!(tree.set_collaborator(a, None, &mut surface));
        assert!(tree.get(a).unwrap().marker.is_none());
        assert!(surface.shape(handle).is_none());
    }

    #[test]
    fn intersecting_skips_hidden_nodes() {
        let mut surface = MemorySurface::new();
        let (mut tree, root, a, b) = small_tree(&mut surface);
        tree.translate(root, 0.0, 0.0, &mut surface);
        tree.translate(a, 200.0, 0.0, &mut surface);
        assert_eq!(tree.intersecting(&BBox::new(-10.0, -10.0, 400.0, 100.0)), vec![root, a]);
        assert_eq!(tree.intersecting(&BBox::new(190.0, -10.0, 20.0, 20.0)), vec![a]);
        assert!(!tree.intersecting(&BBox::new(-1000.0, -1000.0, 5000.0, 5000.0)).contains(&b));
    }
}
