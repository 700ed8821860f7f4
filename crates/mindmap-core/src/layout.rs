//! Directional tree layout.
//!
//! Each subtree reserves a vertical extent computed bottom-up from its
//! leaves. Siblings are stacked inside their father's span without overlap
//! and the stack is centered on the father. Horizontal offset from the father
//! is a per-tier gap, signed by the child's direction.
//!
//! Layout is incremental: only the changed subtrees and the ancestors whose
//! extent changed are re-placed, and a shape is only translated when its
//! computed position differs from the one it already has.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::config::LayoutConfig;
use crate::node::NodeTree;
use crate::record::{DepthTier, Direction};
use crate::surface::{EdgeShapeSpec, RenderSurface};

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Re-place everything reachable from the root
    pub fn layout_all(&self, tree: &mut NodeTree, surface: &mut dyn RenderSurface) -> usize {
        match tree.root() {
            Some(root) => self.relayout(tree, &[root], surface),
            None => 0,
        }
    }

    /// Re-place the given changed nodes and whatever their change displaces.
    ///
    /// Returns how many nodes moved.
    #[instrument(level = "debug", skip_all, fields(changed = changed.len()))]
    pub fn relayout(&self, tree: &mut NodeTree, changed: &[Index], surface: &mut dyn RenderSurface) -> usize {
        let mut placement_roots: Vec<Index> = Vec::new();
        for &idx in changed {
            if tree.get(idx).is_none() {
                continue;
            }
            self.measure_subtree(tree, idx);
            placement_roots.push(self.climb(tree, idx));
        }

        placement_roots.sort();
        placement_roots.dedup();
        let roots: Vec<Index> = placement_roots
            .iter()
            .copied()
            .filter(|&r| !placement_roots.iter().any(|&other| other != r && tree.is_descendant(r, other)))
            .collect();

        let mut moved = 0;
        for root in roots {
            moved += self.place_from(tree, root, surface);
        }
        debug!(moved, "layout pass finished");
        moved
    }

    /// Recompute extents below and including `idx`, leaves first
    fn measure_subtree(&self, tree: &mut NodeTree, idx: Index) {
        for current in tree.subtree(idx).into_iter().rev() {
            let extent = self.own_extent(tree, current);
            if let Some(entity) = tree.get_mut(current) {
                entity.extent = extent;
            }
        }
    }

    /// Walk up from a changed node while ancestor extents keep changing.
    ///
    /// Returns the node whose children must be re-placed.
    fn climb(&self, tree: &mut NodeTree, idx: Index) -> Index {
        let mut current = idx;
        loop {
            let Some(father) = tree.get(current).and_then(|e| e.father) else {
                return current;
            };
            let Some(old) = tree.get(father).map(|e| e.extent) else {
                return current;
            };
            let new = self.own_extent(tree, father);
            if new == old {
                return father;
            }
            if let Some(entity) = tree.get_mut(father) {
                entity.extent = new;
            }
            current = father;
        }
    }

    /// Vertical space a subtree needs, from cached child extents
    fn own_extent(&self, tree: &NodeTree, idx: Index) -> f64 {
        let Some(entity) = tree.get(idx) else {
            return 0.0;
        };
        let height = entity.bbox.height;
        if entity.is_root() || entity.children.is_empty() || !entity.expander.is_expanded() {
            return height;
        }
        let tier = DepthTier::from_depth(entity.depth + 1);
        height.max(self.stack_height(tree, &entity.children, tier))
    }

    fn stack_height(&self, tree: &NodeTree, children: &[Index], tier: DepthTier) -> f64 {
        let extents: Vec<f64> = children.iter().filter_map(|c| tree.get(*c)).map(|e| e.extent).collect();
        if extents.is_empty() {
            return 0.0;
        }
        extents.iter().sum::<f64>() + self.config.y_gap(tier) * (extents.len() - 1) as f64
    }

    fn place_from(&self, tree: &mut NodeTree, idx: Index, surface: &mut dyn RenderSurface) -> usize {
        let Some(entity) = tree.get(idx) else {
            return 0;
        };
        let mut moved = 0;
        if entity.is_root() {
            let origin = entity.bbox.origin();
            if place_node(tree, idx, origin.x, origin.y, surface) {
                moved += 1;
            }
        } else if !entity.shown {
            return 0;
        }
        moved += self.place_children(tree, idx, surface);
        tree.sync_affordance(idx, surface);
        moved
    }

    fn place_children(&self, tree: &mut NodeTree, father: Index, surface: &mut dyn RenderSurface) -> usize {
        let Some(entity) = tree.get(father) else {
            return 0;
        };
        if !entity.expander.is_expanded() {
            tree.hide_descendants(father, surface);
            return 0;
        }

        let father_box = entity.bbox;
        let father_tier = entity.tier();
        let tier = DepthTier::from_depth(entity.depth + 1);
        let children = entity.children.clone();
        let (x_gap, y_gap) = (self.config.x_gap(tier), self.config.y_gap(tier));

        let mut moved = 0;
        for side in [Direction::Right, Direction::Left] {
            let group: Vec<Index> = children
                .iter()
                .copied()
                .filter(|c| tree.get(*c).is_some_and(|e| e.side() == side))
                .collect();
            if group.is_empty() {
                continue;
            }

            let total = self.stack_height(tree, &group, tier);
            let mut y = father_box.cy() - total / 2.0;
            for child in group {
                let Some(c) = tree.get(child) else {
                    continue;
                };
                let (slot, size) = (c.extent, c.bbox.size());
                let top = y + (slot - size.height) / 2.0;
                let x = match side {
                    Direction::Right => father_box.x2() + x_gap,
                    Direction::Left => father_box.x - x_gap - size.width,
                };
                if place_node(tree, child, x, top, surface) {
                    moved += 1;
                }
                if let Some(child_box) = tree.get(child).map(|e| e.bbox) {
                    let edge = EdgeShapeSpec::between(&father_box, father_tier, &child_box, side);
                    tree.sync_edge(child, edge, surface);
                }
                moved += self.place_children(tree, child, surface);
                tree.sync_affordance(child, surface);
                y += slot + y_gap;
            }
        }
        moved
    }
}

/// Put a node at `(x, y)` and make sure it is displayed
fn place_node(tree: &mut NodeTree, idx: Index, x: f64, y: f64, surface: &mut dyn RenderSurface) -> bool {
    let Some(entity) = tree.get(idx) else {
        return false;
    };
    let moved = !entity.placed || entity.bbox.x != x || entity.bbox.y != y;
    tree.translate(idx, x, y, surface);
    if let Some(entity) = tree.get_mut(idx) {
        if !entity.shown {
            surface.set_visible(entity.shape, true);
            entity.shown = true;
        }
    }
    tree.sync_marker(idx, surface);
    moved
}
