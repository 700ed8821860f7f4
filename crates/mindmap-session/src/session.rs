//! Interactive mind-map session.
//!
//! [`MindMap`] ties the record store to the reconciler, the viewport and a
//! render surface. Store notifications are coalesced: any number of commits
//! between two [`MindMap::pump`] calls produce a single render pass.
//!
//! Remote collaborators are tracked by a [`PresenceManager`] and drawn as
//! markers on the nodes they work on after every render.

use std::collections::HashSet;
use std::sync::mpsc;

use anyhow::Result;
use mindmap_core::{
    Document, EngineConfig, NodeId, OverlaySpec, Pointer, Reconciler, RenderStats, RenderSurface, ShapeEvent,
    ShapeEventKind, ShapeHandle, ShapeRole, StoreEvent, StyleKind,
};
use mindmap_geometry::{Point, Size, Viewport};
use tracing::{debug, info, instrument, trace, warn};

use crate::interaction::{apply_wheel, DragViewportHandler, SelectionBox, WheelInput};
use crate::node_drag::{DropOutcome, NodeDragState};
use crate::presence::{PeerId, PeerPresence, PresenceManager};

/// Selection box gesture plus its overlay once drawn
#[derive(Debug)]
struct RubberBand {
    rect: SelectionBox,
    shape: Option<ShapeHandle>,
}

/// Main session state
pub struct MindMap<S: RenderSurface> {
    /// The automerge document - the source of truth
    doc: Document,
    store_rx: mpsc::Receiver<StoreEvent>,
    reconciler: Reconciler,
    viewport: Viewport,
    config: EngineConfig,
    surface: S,
    selection: Vec<NodeId>,
    /// Shared by background drags and root drags
    drag_viewport: DragViewportHandler,
    root_drag: bool,
    node_drag: Option<NodeDragState>,
    rubber_band: Option<RubberBand>,
    presence: PresenceManager,
    rendered: bool,
    /// Root the view was last centered on
    centered_root: Option<NodeId>,
    status_message: Option<String>,
}

impl<S: RenderSurface> MindMap<S> {
    pub fn new(mut doc: Document, surface: S, wrapper: Size, config: EngineConfig) -> Self {
        let store_rx = doc.subscribe();
        Self {
            store_rx,
            reconciler: Reconciler::new(&config),
            viewport: Viewport::new(wrapper, Some(config.initial_scale)),
            drag_viewport: DragViewportHandler::new(config.drag_threshold),
            doc,
            config,
            surface,
            selection: Vec::new(),
            root_drag: false,
            node_drag: None,
            rubber_band: None,
            presence: PresenceManager::new(PeerId::random()),
            rendered: false,
            centered_root: None,
            status_message: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct store access; changes show up on the next [`pump`](Self::pump)
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The selected node when exactly one is selected
    pub fn selection(&self) -> Option<&NodeId> {
        match self.selection.as_slice() {
            [one] => Some(one),
            _ => None,
        }
    }

    pub fn selected_nodes(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Render once if the store changed since the last pass.
    ///
    /// The first call always renders. The root is centered in the view
    /// whenever a render brings up a root other than the last centered one.
    #[instrument(level = "debug", skip_all)]
    pub fn pump(&mut self) -> Option<RenderStats> {
        let pending = self.store_rx.try_iter().count();
        if pending == 0 && self.rendered {
            return None;
        }
        trace!(pending, "coalesced store notifications");

        let snapshot = match self.doc.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(%e, "reading snapshot failed");
                self.set_status(format!("Render error: {}", e));
                return None;
            }
        };
        let stats = self.reconciler.render(&snapshot, &mut self.surface);
        self.rendered = true;

        let tree = self.reconciler.tree();
        let root_id = tree.root().and_then(|r| tree.id_of(r)).cloned();
        if root_id.is_some() && root_id != self.centered_root {
            self.center_root();
        }
        self.centered_root = root_id;

        let before = self.selection.len();
        let tree = self.reconciler.tree();
        self.selection.retain(|id| tree.entity(id).is_some());
        if self.selection.len() != before {
            debug!(dropped = before - self.selection.len(), "selected nodes are gone");
        }
        self.sync_presence();
        Some(stats)
    }

    /// Place the root so it sits in the middle of the current viewbox
    fn center_root(&mut self) {
        let Some(root) = self.reconciler.tree().root() else {
            return;
        };
        let Some(size) = self.reconciler.tree().get(root).map(|e| e.bbox.size()) else {
            return;
        };
        let vb = self.viewport.viewbox();
        let x = vb.x + (vb.width - size.width) / 2.0;
        let y = vb.y + (vb.height - size.height) / 2.0;
        self.reconciler.translate_root(x, y, &mut self.surface);
        info!(x, y, "root centered");
    }

    /// Route every pending shape event, then render whatever they changed
    pub fn process_events(&mut self) -> usize {
        let events = self.reconciler.tree().drain_events();
        let count = events.len();
        for event in events {
            self.handle_shape_event(event);
        }
        self.pump();
        count
    }

    fn handle_shape_event(&mut self, event: ShapeEvent) {
        let Some((id, role)) = self.reconciler.tree().owner_of(event.shape) else {
            trace!(shape = %event.shape, "event for a removed shape");
            return;
        };
        match (role, event.kind) {
            (ShapeRole::Expander, ShapeEventKind::PointerDown) => self.toggle_expand(&id),
            (ShapeRole::Node, ShapeEventKind::Click) => self.select(Some(id)),
            (ShapeRole::Node, ShapeEventKind::HoverIn) => self.hover(&id, true),
            (ShapeRole::Node, ShapeEventKind::HoverOut) => self.hover(&id, false),
            (ShapeRole::Node, ShapeEventKind::DragStart) => self.drag_start(&id, event.pointer),
            (ShapeRole::Node, ShapeEventKind::DragMove) => self.drag_move(event.pointer),
            (ShapeRole::Node, ShapeEventKind::DragEnd) => {
                self.drag_end();
            }
            _ => {}
        }
    }

    fn toggle_expand(&mut self, id: &NodeId) {
        let result = self.doc.get(id).and_then(|record| match record {
            Some(record) => self.doc.set_expand(id, !record.is_expand),
            None => Ok(()),
        });
        if let Err(e) = result {
            warn!(%id, %e, "toggling expand failed");
            self.set_status(format!("Expand error: {}", e));
        }
    }

    fn style_of(&self, id: &NodeId) -> Option<StyleKind> {
        self.reconciler.tree().entity(id).map(|e| e.style)
    }

    /// Style a node returns to when nothing transient applies
    fn resting_style(&self, id: &NodeId) -> StyleKind {
        if self.selection.contains(id) {
            StyleKind::Select
        } else {
            StyleKind::Base
        }
    }

    fn hover(&mut self, id: &NodeId, inside: bool) {
        match self.style_of(id) {
            None | Some(StyleKind::Select | StyleKind::Disable | StyleKind::Overlay) => return,
            Some(_) => {}
        }
        let next = if inside { StyleKind::Hover } else { StyleKind::Base };
        self.reconciler.set_style(id, next, &mut self.surface);
    }

    /// Replace the selection; `None` clears it
    pub fn select(&mut self, id: Option<NodeId>) {
        self.select_many(id.into_iter().collect());
    }

    /// Replace the selection with a set of nodes
    pub fn select_many(&mut self, mut ids: Vec<NodeId>) {
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(id.clone()));
        if self.selection == ids {
            return;
        }
        for old in std::mem::take(&mut self.selection) {
            if !ids.contains(&old) {
                self.reconciler.set_style(&old, StyleKind::Base, &mut self.surface);
            }
        }
        for new in &ids {
            self.reconciler.set_style(new, StyleKind::Select, &mut self.surface);
        }
        self.selection = ids;
    }

    /// Add a child under the selected node
    pub fn add_child(&mut self) -> Option<NodeId> {
        let selection = self.require_selection()?;
        let result = self.doc.add_child_node(&selection, NodeId::new());
        self.finish_edit(result, "Add child")
    }

    /// Add a sibling after the selected node (a child when the root is selected)
    pub fn add_brother(&mut self) -> Option<NodeId> {
        let selection = self.require_selection()?;
        let result = self.doc.add_brother_node(&selection, NodeId::new());
        self.finish_edit(result, "Add sibling")
    }

    pub fn rename_selected(&mut self, label: &str) -> Option<NodeId> {
        let selection = self.require_selection()?;
        let result = self.doc.set_label(&selection, label).map(|_| selection);
        self.finish_edit(result, "Rename")
    }

    /// Detach the selected node and its subtree
    pub fn remove_selected(&mut self) -> Option<NodeId> {
        let selection = self.require_selection()?;
        let result = self.doc.remove_node(&selection).map(|_| selection);
        self.finish_edit(result, "Remove")
    }

    fn require_selection(&mut self) -> Option<NodeId> {
        match self.selection.as_slice() {
            [one] => Some(one.clone()),
            [] => {
                self.set_status("Select a node first");
                None
            }
            _ => {
                self.set_status("Select a single node");
                None
            }
        }
    }

    fn finish_edit(&mut self, result: Result<NodeId>, action: &str) -> Option<NodeId> {
        match result {
            Ok(id) => {
                self.pump();
                Some(id)
            }
            Err(e) => {
                warn!(%e, action, "edit failed");
                self.set_status(format!("{} error: {}", action, e));
                None
            }
        }
    }

    pub fn zoom_in(&mut self) {
        self.viewport.add_scale(self.config.zoom_speed);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.add_scale(-self.config.zoom_speed);
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.set_scale(1.0);
    }

    /// Current zoom for display, e.g. "125%"
    pub fn scale_percent(&self) -> String {
        format!("{}%", (self.viewport.scale() * 100.0).floor() as i64)
    }

    /// Pan so the root's center is the viewbox center
    pub fn translate_to_center(&mut self) {
        let tree = self.reconciler.tree();
        let Some(center) = tree.root().and_then(|r| tree.get(r)).map(|e| e.bbox.center()) else {
            return;
        };
        let vb = self.viewport.viewbox();
        self.viewport.translate_to(center.x - vb.width / 2.0, center.y - vb.height / 2.0);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    /// Where the wrapper element sits on screen
    pub fn set_screen_origin(&mut self, origin: Point) {
        self.viewport.set_screen_origin(origin);
    }

    pub fn wheel(&mut self, input: WheelInput) {
        apply_wheel(&mut self.viewport, input, self.config.wheel_zoom_speed);
    }

    pub fn background_pointer_down(&mut self, client_x: f64, client_y: f64) {
        self.drag_viewport.pointer_down(client_x, client_y);
    }

    pub fn background_pointer_move(&mut self, client_x: f64, client_y: f64) -> bool {
        self.drag_viewport.pointer_move(client_x, client_y, &mut self.viewport)
    }

    pub fn background_pointer_up(&mut self) {
        self.drag_viewport.pointer_up();
    }

    /// A click that did not land on any node
    pub fn background_click(&mut self) {
        self.select(None);
    }

    /// Start a rubber-band selection at a screen point
    pub fn selection_box_down(&mut self, client_x: f64, client_y: f64) {
        self.cancel_selection_box();
        let start = self.viewport.screen_to_world(client_x, client_y);
        self.rubber_band = Some(RubberBand { rect: SelectionBox::new(start), shape: None });
    }

    /// Stretch the selection box; returns whether one is in progress
    pub fn selection_box_move(&mut self, client_x: f64, client_y: f64) -> bool {
        let current = self.viewport.screen_to_world(client_x, client_y);
        let Some(band) = self.rubber_band.as_mut() else {
            return false;
        };
        band.rect.update(current);
        let spec = OverlaySpec::SelectionBox(band.rect.bounds());
        match band.shape {
            Some(shape) => self.surface.reshape_overlay(shape, &spec),
            None => band.shape = Some(self.surface.create_overlay_shape(&spec)),
        }
        true
    }

    /// Finish the rubber band and select every displayed node it touches.
    ///
    /// A box without area leaves the selection alone.
    pub fn selection_box_up(&mut self) -> Vec<NodeId> {
        let Some(band) = self.rubber_band.take() else {
            return Vec::new();
        };
        if let Some(shape) = band.shape {
            self.surface.remove(shape);
        }
        if band.rect.is_empty() {
            return Vec::new();
        }
        let hits = self.reconciler.nodes_in(&band.rect.bounds());
        debug!(count = hits.len(), "rubber-band selection");
        self.select_many(hits.clone());
        hits
    }

    fn cancel_selection_box(&mut self) {
        if let Some(shape) = self.rubber_band.take().and_then(|band| band.shape) {
            self.surface.remove(shape);
        }
    }

    /// Record where a remote peer is working and redraw the markers
    pub fn update_peer(&mut self, presence: PeerPresence) {
        self.presence.update_peer(presence);
        self.sync_presence();
    }

    /// A peer left; returns whether it was known
    pub fn remove_peer(&mut self, peer_id: &PeerId) -> bool {
        let known = self.presence.remove_peer(peer_id);
        if known {
            self.sync_presence();
        }
        known
    }

    /// Drop peers that stopped reporting; returns how many went
    pub fn prune_presence(&mut self) -> usize {
        let pruned = self.presence.prune_stale();
        if pruned > 0 {
            debug!(pruned, "stale peers dropped");
            self.sync_presence();
        }
        pruned
    }

    fn sync_presence(&mut self) {
        let markers = self.presence.markers();
        self.reconciler.set_collaborators(&markers, &mut self.surface);
    }

    fn drag_start(&mut self, id: &NodeId, pointer: Pointer) {
        let Some(entity) = self.reconciler.tree().entity(id) else {
            return;
        };
        if entity.is_root() {
            self.root_drag = true;
            self.drag_viewport.pointer_down(pointer.client_x, pointer.client_y);
            return;
        }
        let world = self.viewport.screen_to_world(pointer.client_x, pointer.client_y);
        let origin = entity.bbox.origin();
        let grab_offset = Point::new(world.x - origin.x, world.y - origin.y);
        self.node_drag = Some(NodeDragState::new(
            id.clone(),
            Point::new(pointer.client_x, pointer.client_y),
            grab_offset,
        ));
    }

    fn drag_move(&mut self, pointer: Pointer) {
        if self.root_drag {
            self.drag_viewport.pointer_move(pointer.client_x, pointer.client_y, &mut self.viewport);
            return;
        }
        let Some(mut drag) = self.node_drag.take() else {
            return;
        };
        let client = Point::new(pointer.client_x, pointer.client_y);
        if !drag.committed && !drag.exceeds(client, self.config.drag_threshold) {
            self.node_drag = Some(drag);
            return;
        }
        if !drag.committed {
            debug!(node = %drag.node, "node drag started");
            drag.committed = true;
        }

        let world = self.viewport.screen_to_world(client.x, client.y);
        self.reconciler.preview_move(&drag.node, drag.box_origin(world), &mut self.surface);

        let target = self.reconciler.node_at(world, Some(&drag.node));
        if target != drag.target {
            if let Some(old) = drag.target.take() {
                let resting = self.resting_style(&old);
                self.reconciler.set_style(&old, resting, &mut self.surface);
            }
            if let Some(new) = &target {
                self.reconciler.set_style(new, StyleKind::Overlay, &mut self.surface);
            }
            drag.target = target;
        }
        self.node_drag = Some(drag);
    }

    /// Finish whichever drag is in progress. State is reset unconditionally.
    pub fn drag_end(&mut self) -> Option<DropOutcome> {
        if self.root_drag {
            self.root_drag = false;
            self.drag_viewport.pointer_up();
            return None;
        }
        let drag = self.node_drag.take()?;
        if let Some(target) = &drag.target {
            let resting = self.resting_style(target);
            self.reconciler.set_style(target, resting, &mut self.surface);
        }
        if !drag.committed {
            return Some(DropOutcome::Cancelled);
        }

        if let Some(father) = drag.target {
            match self.doc.move_node(&drag.node, &father, None) {
                Ok(()) => {
                    info!(node = %drag.node, father = %father, "node re-parented");
                    self.pump();
                    return Some(DropOutcome::Moved { node: drag.node, father });
                }
                Err(e) => {
                    warn!(node = %drag.node, %e, "move rejected");
                    self.set_status(format!("Move error: {}", e));
                }
            }
        }
        self.reconciler.settle(&drag.node, &mut self.surface);
        Some(DropOutcome::Settled)
    }

    pub fn is_dragging(&self) -> bool {
        self.root_drag || self.node_drag.is_some() || self.rubber_band.is_some() || self.drag_viewport.is_active()
    }
}

impl<S: RenderSurface + std::fmt::Debug> std::fmt::Debug for MindMap<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindMap")
            .field("doc", &self.doc)
            .field("selection", &self.selection)
            .field("scale", &self.viewport.scale())
            .finish_non_exhaustive()
    }
}
