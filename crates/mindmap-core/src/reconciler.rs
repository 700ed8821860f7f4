//! Snapshot reconciliation.
//!
//! [`Reconciler::render`] walks a record snapshot from the root and brings
//! the live [`NodeTree`] in line with it. Live entities are matched by id, not
//! position, so reordering, moving or relabelling a node reuses its shapes.
//! Only fields that actually differ are pushed to the surface, and only nodes
//! that changed are handed to the layout engine.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use mindmap_geometry::{BBox, Point};
use tracing::{debug, instrument, warn};

use crate::config::EngineConfig;
use crate::expander::ExpandOutcome;
use crate::layout::LayoutEngine;
use crate::node::{NodeContent, NodeTree};
use crate::record::{balanced_direction, Direction, NodeId, NodeRecord, Snapshot};
use crate::surface::{Collaborator, RenderSurface, StyleKind};

/// What one render pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub destroyed: usize,
    /// Entities whose label, content or direction changed
    pub updated: usize,
    /// Nodes the layout engine moved
    pub moved: usize,
}

impl RenderStats {
    pub fn is_noop(&self) -> bool {
        *self == RenderStats::default()
    }
}

/// Per-pass bookkeeping
struct Pass<'s> {
    snapshot: &'s Snapshot,
    visited: HashSet<NodeId>,
    changed: Vec<Index>,
    /// Unmatched prior children, destroyed at the end unless adopted elsewhere
    leftovers: Vec<Index>,
    stats: RenderStats,
}

#[derive(Debug)]
pub struct Reconciler {
    tree: NodeTree,
    layout: LayoutEngine,
}

impl Reconciler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tree: NodeTree::new(config.expander()),
            layout: LayoutEngine::new(config.layout),
        }
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    /// Bring the live tree in line with `snapshot`
    #[instrument(level = "debug", skip_all, fields(records = snapshot.len()))]
    pub fn render(&mut self, snapshot: &Snapshot, surface: &mut dyn RenderSurface) -> RenderStats {
        let Some(root_id) = snapshot.root_id().cloned() else {
            warn!("snapshot has no root record");
            let destroyed = self.tree.clear(surface);
            return RenderStats { destroyed, ..RenderStats::default() };
        };

        let mut stats = RenderStats::default();
        if let Some(root) = self.tree.root() {
            if self.tree.id_of(root) != Some(&root_id) {
                debug!(root = %root_id, "root changed, rebuilding");
                stats.destroyed += self.tree.clear(surface);
            }
        }

        let mut pass = Pass {
            snapshot,
            visited: HashSet::new(),
            changed: Vec::new(),
            leftovers: Vec::new(),
            stats,
        };
        let prior = self.tree.root();
        self.reconcile(&mut pass, &root_id, 0, None, None, prior, surface);

        for leftover in std::mem::take(&mut pass.leftovers) {
            let adopted = self.tree.get(leftover).is_none_or(|e| pass.visited.contains(&e.id));
            if !adopted {
                pass.stats.destroyed += self.tree.destroy(leftover, surface);
            }
        }

        let mut changed = std::mem::take(&mut pass.changed);
        changed.retain(|idx| self.tree.get(*idx).is_some());
        changed.sort();
        changed.dedup();
        if !changed.is_empty() {
            pass.stats.moved = self.layout.relayout(&mut self.tree, &changed, surface);
        }

        debug!(
            created = pass.stats.created,
            destroyed = pass.stats.destroyed,
            updated = pass.stats.updated,
            moved = pass.stats.moved,
            "render pass finished"
        );
        pass.stats
    }

    #[allow(clippy::too_many_arguments)]
    fn reconcile(
        &mut self,
        pass: &mut Pass<'_>,
        id: &NodeId,
        depth: usize,
        direction: Option<Direction>,
        father: Option<Index>,
        prior: Option<Index>,
        surface: &mut dyn RenderSurface,
    ) -> Option<Index> {
        let snapshot = pass.snapshot;
        let Some(record) = snapshot.get(id) else {
            debug!(%id, "dangling child id skipped");
            return None;
        };
        if !pass.visited.insert(id.clone()) {
            warn!(%id, "record reached twice, skipping repeat");
            return None;
        }

        let idx = match (prior, self.tree.index_of(id), father) {
            (Some(idx), _, _) => {
                self.update(pass, idx, record, direction, surface);
                idx
            }
            (None, Some(live), Some(new_father)) => {
                if let Some(old_father) = self.tree.reparent(live, new_father, surface) {
                    pass.changed.push(old_father);
                }
                pass.changed.push(live);
                debug!(%id, "entity adopted by new father");
                self.update(pass, live, record, direction, surface);
                live
            }
            _ => {
                let idx = self.tree.create(id.clone(), record, depth, direction, father, surface);
                pass.stats.created += 1;
                pass.changed.push(idx);
                idx
            }
        };

        self.reconcile_children(pass, idx, record, depth, direction, surface);

        let expanded = self.tree.get(idx).is_some_and(|e| e.expander.is_expanded());
        if record.is_expand != expanded {
            match self.tree.change_expand(idx, record.is_expand, surface) {
                ExpandOutcome::Unchanged => {}
                _ => pass.changed.push(idx),
            }
        }
        Some(idx)
    }

    fn reconcile_children(
        &mut self,
        pass: &mut Pass<'_>,
        idx: Index,
        record: &NodeRecord,
        depth: usize,
        direction: Option<Direction>,
        surface: &mut dyn RenderSurface,
    ) {
        let snapshot = pass.snapshot;
        let prior_children = self.tree.get_mut(idx).map(|e| std::mem::take(&mut e.children)).unwrap_or_default();
        let mut remaining = prior_children.clone();
        let mut next = Vec::with_capacity(record.children.len());
        let mut sides: Vec<Option<Direction>> = Vec::with_capacity(record.children.len());

        for child_id in &record.children {
            let Some(child_record) = snapshot.get(child_id) else {
                debug!(father = %record.label, child = %child_id, "dangling child id skipped");
                continue;
            };
            let child_direction = if depth == 0 {
                Some(child_record.direction.unwrap_or_else(|| balanced_direction(sides.iter().copied())))
            } else {
                direction
            };
            let prior = remaining
                .iter()
                .position(|c| self.tree.id_of(*c) == Some(child_id))
                .map(|pos| remaining.remove(pos));

            if let Some(child) = self.reconcile(pass, child_id, depth + 1, child_direction, Some(idx), prior, surface) {
                next.push(child);
                sides.push(child_direction);
            }
        }

        pass.leftovers.extend(remaining);
        if next != prior_children {
            pass.changed.push(idx);
        }
        if let Some(entity) = self.tree.get_mut(idx) {
            entity.children = next;
        }
    }

    /// Apply only the fields of `record` that differ from the live entity
    fn update(
        &mut self,
        pass: &mut Pass<'_>,
        idx: Index,
        record: &NodeRecord,
        direction: Option<Direction>,
        surface: &mut dyn RenderSurface,
    ) {
        let Some(entity) = self.tree.get(idx) else {
            return;
        };
        let content = NodeContent::from_record(record);
        let before = entity.bbox;
        let keep_center = entity.is_root() && entity.placed;
        let mut touched = false;

        if entity.content.differs_beyond_label(&content) {
            self.tree.set_content(idx, content, surface);
            touched = true;
        } else if entity.content.label != content.label {
            self.tree.set_label(idx, &content.label, surface);
            touched = true;
        }
        if touched && keep_center {
            if let Some(after) = self.tree.get(idx).map(|e| e.bbox) {
                let x = before.cx() - after.width / 2.0;
                let y = before.cy() - after.height / 2.0;
                self.tree.translate(idx, x, y, surface);
            }
        }

        if let Some(entity) = self.tree.get_mut(idx) {
            if entity.direction != direction {
                debug!(id = %entity.id, ?direction, "direction changed");
                entity.direction = direction;
                touched = true;
            }
        }

        if touched {
            pass.stats.updated += 1;
            pass.changed.push(idx);
        }
    }

    /// Move the root box and re-place everything around it
    pub fn translate_root(&mut self, x: f64, y: f64, surface: &mut dyn RenderSurface) -> usize {
        let Some(root) = self.tree.root() else {
            return 0;
        };
        self.tree.translate(root, x, y, surface);
        self.layout.layout_all(&mut self.tree, surface)
    }

    /// Re-place the whole tree
    pub fn relayout_all(&mut self, surface: &mut dyn RenderSurface) -> usize {
        self.layout.layout_all(&mut self.tree, surface)
    }

    /// Let a node box follow the pointer during a drag
    pub fn preview_move(&mut self, id: &NodeId, position: Point, surface: &mut dyn RenderSurface) {
        if let Some(idx) = self.tree.index_of(id) {
            self.tree.translate(idx, position.x, position.y, surface);
        }
    }

    /// Put a dragged node back where the layout wants it
    pub fn settle(&mut self, id: &NodeId, surface: &mut dyn RenderSurface) -> usize {
        match self.tree.index_of(id) {
            Some(idx) => self.layout.relayout(&mut self.tree, &[idx], surface),
            None => 0,
        }
    }

    pub fn set_style(&mut self, id: &NodeId, style: StyleKind, surface: &mut dyn RenderSurface) {
        if let Some(idx) = self.tree.index_of(id) {
            self.tree.set_style(idx, style, surface);
        }
    }

    /// Displayed node under a world point, ignoring the subtree of `exclude`
    pub fn node_at(&self, point: Point, exclude: Option<&NodeId>) -> Option<NodeId> {
        let exclude = exclude.and_then(|id| self.tree.index_of(id));
        let idx = self.tree.hit_test(point, exclude)?;
        self.tree.id_of(idx).cloned()
    }

    /// True when `id` is `ancestor` or sits below it
    pub fn is_within(&self, id: &NodeId, ancestor: &NodeId) -> bool {
        match (self.tree.index_of(id), self.tree.index_of(ancestor)) {
            (Some(idx), Some(anc)) => self.tree.is_descendant(idx, anc),
            _ => false,
        }
    }

    /// Displayed nodes overlapping a world-space area
    pub fn nodes_in(&self, area: &BBox) -> Vec<NodeId> {
        self.tree
            .intersecting(area)
            .into_iter()
            .filter_map(|idx| self.tree.id_of(idx).cloned())
            .collect()
    }

    /// Mark exactly the nodes in `markers` with their collaborator.
    ///
    /// Returns how many nodes changed.
    pub fn set_collaborators(
        &mut self,
        markers: &HashMap<NodeId, Collaborator>,
        surface: &mut dyn RenderSurface,
    ) -> usize {
        let mut changed = 0;
        for idx in self.tree.preorder() {
            let Some(id) = self.tree.id_of(idx) else {
                continue;
            };
            let wanted = markers.get(id).cloned();
            if self.tree.set_collaborator(idx, wanted, surface) {
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "collaborator markers updated");
        }
        changed
    }

    /// Tear everything down
    pub fn clear(&mut self, surface: &mut dyn RenderSurface) -> usize {
        self.tree.clear(surface)
    }
}
