//! Expand/collapse state per node.
//!
//! Collapsing hides a subtree without destroying it: entities, their records
//! and their cached layout stay in the tree, only shapes are hidden and the
//! edges and affordances inside the subtree are removed. Expanding marks the
//! subtree for display again; the next layout pass places and shows it.

use generational_arena::Index;
use tracing::{debug, trace};

use crate::node::NodeTree;
use crate::surface::{ExpanderShapeSpec, RenderSurface, ShapeEventKind, ShapeHandle, ShapeRole, Subscription};

#[derive(Debug, Clone, Default)]
pub struct ExpandController {
    expanded: bool,
    affordance: Option<ShapeHandle>,
    /// Geometry the affordance was last drawn with
    drawn: Option<ExpanderShapeSpec>,
    subscription: Option<Subscription>,
}

impl ExpandController {
    pub fn new(expanded: bool) -> Self {
        Self { expanded, ..Self::default() }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn affordance(&self) -> Option<ShapeHandle> {
        self.affordance
    }

    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription
    }
}

/// What a [`NodeTree::change_expand`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Already in the requested state
    Unchanged,
    /// Childless node: only its affordance was dropped
    AffordanceRemoved,
    Collapsed,
    Expanded,
}

impl NodeTree {
    /// Move a node's controller to `expanded`.
    ///
    /// A node without children keeps its state; its affordance is removed
    /// instead since there is nothing to hide.
    pub fn change_expand(&mut self, idx: Index, expanded: bool, surface: &mut dyn RenderSurface) -> ExpandOutcome {
        let Some(entity) = self.get(idx) else {
            return ExpandOutcome::Unchanged;
        };
        if entity.children.is_empty() {
            return if self.remove_affordance(idx, surface) {
                ExpandOutcome::AffordanceRemoved
            } else {
                ExpandOutcome::Unchanged
            };
        }
        if entity.expander.expanded == expanded {
            return ExpandOutcome::Unchanged;
        }

        if let Some(entity) = self.get_mut(idx) {
            entity.expander.expanded = expanded;
            if let Some(handle) = entity.expander.affordance {
                surface.set_expanded(handle, expanded);
                if let Some(drawn) = &mut entity.expander.drawn {
                    drawn.expanded = expanded;
                }
            }
        }

        if expanded {
            debug!(?idx, "subtree expanded");
            ExpandOutcome::Expanded
        } else {
            self.hide_descendants(idx, surface);
            debug!(?idx, "subtree collapsed");
            ExpandOutcome::Collapsed
        }
    }

    /// Hide every node below `idx` and drop their edges and affordances
    pub fn hide_descendants(&mut self, idx: Index, surface: &mut dyn RenderSurface) {
        for current in self.subtree(idx).into_iter().skip(1) {
            if let Some(entity) = self.get_mut(current) {
                if entity.shown {
                    surface.set_visible(entity.shape, false);
                    entity.shown = false;
                }
            }
            self.sync_marker(current, surface);
            self.remove_affordance(current, surface);
            self.remove_edge(current, surface);
        }
    }

    /// Returns whether there was an affordance to remove
    pub fn remove_affordance(&mut self, idx: Index, surface: &mut dyn RenderSurface) -> bool {
        let Some(entity) = self.get_mut(idx) else {
            return false;
        };
        let Some(handle) = entity.expander.affordance.take() else {
            return false;
        };
        entity.expander.drawn = None;
        if let Some(sub) = entity.expander.subscription.take() {
            surface.unsubscribe(sub);
        }
        surface.remove(handle);
        self.forget_shape(handle);
        trace!(?idx, "affordance removed");
        true
    }

    /// Make the affordance match the node: present beside a displayed node
    /// with children, absent otherwise.
    pub fn sync_affordance(&mut self, idx: Index, surface: &mut dyn RenderSurface) {
        let metrics = self.expander_metrics();
        let Some(entity) = self.get(idx) else {
            return;
        };
        if !entity.shown || entity.is_root() || entity.children.is_empty() {
            self.remove_affordance(idx, surface);
            return;
        }

        let spec = ExpanderShapeSpec::beside(&entity.bbox, entity.side(), metrics, entity.expander.expanded);
        match (entity.expander.affordance, entity.expander.drawn) {
            (Some(_), Some(drawn)) if drawn == spec => {}
            (Some(handle), drawn) => {
                if drawn.is_none_or(|d| d.center != spec.center) {
                    let bounds = spec.bounds();
                    surface.translate_to(handle, bounds.x, bounds.y);
                }
                if drawn.is_none_or(|d| d.expanded != spec.expanded) {
                    surface.set_expanded(handle, spec.expanded);
                }
                if let Some(entity) = self.get_mut(idx) {
                    entity.expander.drawn = Some(spec);
                }
            }
            (None, _) => {
                let handle = surface.create_expander_shape(&spec);
                let subscription = surface.subscribe(handle, ShapeEventKind::PointerDown, self.event_sender());
                self.register_shape(handle, idx, ShapeRole::Expander);
                if let Some(entity) = self.get_mut(idx) {
                    entity.expander.affordance = Some(handle);
                    entity.expander.drawn = Some(spec);
                    entity.expander.subscription = Some(subscription);
                }
                trace!(?idx, "affordance created");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExpanderMetrics;
    use crate::memory_surface::MemorySurface;
    use crate::record::{Direction, NodeRecord};

    fn tree(surface: &mut MemorySurface) -> (NodeTree, Index, Index, Index) {
        let mut tree = NodeTree::new(ExpanderMetrics { radius: 5.0, offset: 2.0 });
        let right = NodeRecord::child("n", Direction::Right);
        let root = tree.create("r".into(), &NodeRecord::root("r"), 0, None, None, surface);
        let a = tree.create("a".into(), &right, 1, Some(Direction::Right), Some(root), surface);
        let b = tree.create("b".into(), &right, 2, Some(Direction::Right), Some(a), surface);
        tree.get_mut(root).unwrap().children.push(a);
        tree.get_mut(a).unwrap().children.push(b);
        for idx in [root, a, b] {
            let shape = tree.get(idx).unwrap().shape;
            surface.translate_to(shape, 0.0, 0.0);
            let e = tree.get_mut(idx).unwrap();
            e.placed = true;
            e.shown = true;
        }
        (tree, root, a, b)
    }

    #[test]
    fn collapse_hides_but_keeps_entities() {
        let mut surface = MemorySurface::new();
        let (mut tree, _, a, b) = tree(&mut surface);
        tree.sync_affordance(a, &mut surface);
        assert!(tree.get(a).unwrap().expander.affordance().is_some());

        assert_eq!(tree.change_expand(a, false, &mut surface), ExpandOutcome::Collapsed);
        let hidden = tree.get(b).unwrap();
        assert!(!hidden.shown);
        assert!(!surface.shape(hidden.shape).unwrap().visible);
        assert_eq!(tree.len(), 3);
        assert!(tree.get(a).unwrap().expander.affordance().is_some());
    }

    #[test]
    fn repeating_a_transition_is_a_no_op() {
        let mut surface = MemorySurface::new();
        let (mut tree, _, a, _) = tree(&mut surface);
        tree.change_expand(a, false, &mut surface);
        let before = surface.stats();
        assert_eq!(tree.change_expand(a, false, &mut surface), ExpandOutcome::Unchanged);
        assert_eq!(surface.stats(), before);
        assert_eq!(tree.change_expand(a, true, &mut surface), ExpandOutcome::Expanded);
        assert_eq!(tree.change_expand(a, true, &mut surface), ExpandOutcome::Unchanged);
    }

    #[test]
    fn childless_collapse_only_drops_the_affordance() {
        let mut surface = MemorySurface::new();
        let (mut tree, _, a, b) = tree(&mut surface);
        tree.sync_affordance(a, &mut surface);
        tree.destroy(b, &mut surface);

        assert_eq!(tree.change_expand(a, false, &mut surface), ExpandOutcome::AffordanceRemoved);
        let entity = tree.get(a).unwrap();
        assert!(entity.expander.is_expanded());
        assert!(entity.expander.affordance().is_none());
        assert_eq!(tree.change_expand(a, false, &mut surface), ExpandOutcome::Unchanged);
    }

    #[test]
    fn affordance_follows_node_side() {
        let mut surface = MemorySurface::new();
        let (mut tree, root, a, _) = tree(&mut surface);
        tree.sync_affordance(root, &mut surface);
        assert!(tree.get(root).unwrap().expander.affordance().is_none());

        tree.sync_affordance(a, &mut surface);
        let handle = tree.get(a).unwrap().expander.affordance().unwrap();
        let node = tree.get(a).unwrap().bbox;
        let circle = surface.bounding_box(handle).unwrap();
        assert!(circle.x > node.x2());
        assert_eq!(tree.owner_of(handle).map(|(_, role)| role), Some(ShapeRole::Expander));

        let created = surface.stats().created;
        tree.sync_affordance(a, &mut surface);
        assert_eq!(surface.stats().created, created);
    }
}
