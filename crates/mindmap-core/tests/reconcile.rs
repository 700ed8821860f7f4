use mindmap_core::{
    Direction, EngineConfig, MemorySurface, NodeId, NodeRecord, Reconciler, RenderStats, Snapshot, StyleKind,
};
use proptest::prelude::*;

fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

fn sample() -> Snapshot {
    Snapshot::new()
        .with("root", NodeRecord::root("Central idea").with_children(["a", "b", "c"]))
        .with("a", NodeRecord::child("Alpha", Direction::Right).with_children(["a1", "a2"]))
        .with("b", NodeRecord::child("Beta", Direction::Left).with_children(["b1"]))
        .with("c", NodeRecord::child("Gamma", Direction::Right))
        .with("a1", NodeRecord::child("Alpha one", Direction::Right))
        .with("a2", NodeRecord::child("Alpha two", Direction::Right))
        .with("b1", NodeRecord::child("Beta one", Direction::Left))
}

fn rendered(snapshot: &Snapshot) -> (Reconciler, MemorySurface) {
    let mut surface = MemorySurface::new();
    let mut reconciler = Reconciler::new(&EngineConfig::default());
    reconciler.render(snapshot, &mut surface);
    (reconciler, surface)
}

fn shape_of(reconciler: &Reconciler, node: &str) -> mindmap_core::ShapeHandle {
    reconciler.tree().entity(&id(node)).unwrap().shape
}

/// Offset of every displayed node from its father, keyed by id
fn relative_offsets(reconciler: &Reconciler) -> Vec<(NodeId, f64, f64)> {
    let tree = reconciler.tree();
    tree.preorder()
        .into_iter()
        .filter_map(|idx| {
            let entity = tree.get(idx)?;
            let father = tree.get(entity.father?)?;
            Some((entity.id.clone(), entity.bbox.x - father.bbox.x, entity.bbox.y - father.bbox.y))
        })
        .collect()
}

#[test]
fn render_twice_is_idempotent() {
    let snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);
    let before = surface.stats();

    let stats = reconciler.render(&snapshot, &mut surface);
    assert_eq!(stats, RenderStats::default());
    assert_eq!(surface.stats().since(&before).mutations(), 0);
}

#[test]
fn reordering_reuses_every_shape() {
    let mut snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);
    let a1 = shape_of(&reconciler, "a1");
    let a2 = shape_of(&reconciler, "a2");
    let y1 = reconciler.tree().entity(&id("a1")).unwrap().bbox.y;

    snapshot.get_mut(&id("a")).unwrap().children = vec![id("a2"), id("a1")];
    let before = surface.stats();
    let stats = reconciler.render(&snapshot, &mut surface);

    assert_eq!(stats.created, 0);
    assert_eq!(stats.destroyed, 0);
    assert_eq!(surface.stats().since(&before).created, 0);
    assert_eq!(surface.stats().since(&before).removed, 0);
    assert_eq!(shape_of(&reconciler, "a1"), a1);
    assert_eq!(shape_of(&reconciler, "a2"), a2);
    assert_eq!(reconciler.tree().children_ids(&id("a")), vec![id("a2"), id("a1")]);
    assert_eq!(reconciler.tree().entity(&id("a2")).unwrap().bbox.y, y1);
}

#[test]
fn label_change_updates_in_place() {
    let mut snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);
    let shape = shape_of(&reconciler, "c");

    snapshot.get_mut(&id("c")).unwrap().label = "Gamma, renamed".into();
    let before = surface.stats();
    let stats = reconciler.render(&snapshot, &mut surface);
    let delta = surface.stats().since(&before);

    assert_eq!(stats.updated, 1);
    assert_eq!(delta.labels_set, 1);
    assert_eq!(delta.created, 0);
    assert_eq!(delta.removed, 0);
    assert_eq!(shape_of(&reconciler, "c"), shape);
}

#[test]
fn direction_flip_moves_the_same_shape_across() {
    let mut snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);
    let shape = shape_of(&reconciler, "c");

    snapshot.get_mut(&id("c")).unwrap().direction = Some(Direction::Left);
    let before = surface.stats();
    reconciler.render(&snapshot, &mut surface);
    let delta = surface.stats().since(&before);

    assert_eq!(shape_of(&reconciler, "c"), shape);
    assert_eq!(delta.created, 0);
    assert_eq!(delta.removed, 0);
    let tree = reconciler.tree();
    let c = tree.entity(&id("c")).unwrap();
    assert_eq!(c.direction, Some(Direction::Left));
    assert!(c.bbox.x2() < tree.entity(&id("root")).unwrap().bbox.x);
    assert_eq!(surface.shape(shape).unwrap().bbox, c.bbox);
}

#[test]
fn removed_subtree_is_destroyed() {
    let mut snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);

    snapshot.get_mut(&id("root")).unwrap().children = vec![id("b"), id("c")];
    let stats = reconciler.render(&snapshot, &mut surface);

    assert_eq!(stats.destroyed, 3);
    for gone in ["a", "a1", "a2"] {
        assert!(reconciler.tree().entity(&id(gone)).is_none());
        assert!(surface.find_node(&id(gone)).is_none());
    }
    assert_eq!(reconciler.tree().len(), 4);
}

#[test]
fn dangling_children_are_skipped() {
    let mut snapshot = sample();
    snapshot.get_mut(&id("c")).unwrap().children = vec![id("ghost")];
    let (reconciler, _) = rendered(&snapshot);

    assert!(reconciler.tree().children_ids(&id("c")).is_empty());
    assert_eq!(reconciler.tree().len(), 7);
}

#[test]
fn moved_node_is_adopted_not_recreated() {
    let mut snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);
    let c1 = NodeRecord::child("Leaf", Direction::Right);
    snapshot.insert("c1", c1);
    snapshot.get_mut(&id("c")).unwrap().children = vec![id("c1")];
    reconciler.render(&snapshot, &mut surface);
    let shape = shape_of(&reconciler, "c1");

    // c1 goes from depth 2 under c to depth 2 under a: same tier, same shape
    snapshot.get_mut(&id("c")).unwrap().children.clear();
    snapshot.get_mut(&id("a")).unwrap().children.push(id("c1"));
    let stats = reconciler.render(&snapshot, &mut surface);

    assert_eq!(stats.created, 0);
    assert_eq!(stats.destroyed, 0);
    assert_eq!(shape_of(&reconciler, "c1"), shape);
    assert_eq!(reconciler.tree().children_ids(&id("a")), vec![id("a1"), id("a2"), id("c1")]);
    let tree = reconciler.tree();
    let father = tree.entity(&id("c1")).unwrap().father.unwrap();
    assert_eq!(tree.id_of(father), Some(&id("a")));
}

#[test]
fn collapse_then_expand_restores_layout() {
    let mut snapshot = sample();
    let (mut reconciler, mut surface) = rendered(&snapshot);
    let offsets = relative_offsets(&reconciler);
    let directions: Vec<_> = reconciler
        .tree()
        .preorder()
        .into_iter()
        .map(|idx| reconciler.tree().get(idx).unwrap().direction)
        .collect();

    snapshot.get_mut(&id("a")).unwrap().is_expand = false;
    reconciler.render(&snapshot, &mut surface);
    let hidden = reconciler.tree().entity(&id("a1")).unwrap();
    assert!(!hidden.shown);
    assert!(!surface.shape(hidden.shape).unwrap().visible);
    assert_eq!(reconciler.tree().len(), 7);

    snapshot.get_mut(&id("a")).unwrap().is_expand = true;
    reconciler.render(&snapshot, &mut surface);

    assert_eq!(reconciler.tree().children_ids(&id("a")), vec![id("a1"), id("a2")]);
    assert_eq!(relative_offsets(&reconciler), offsets);
    let after: Vec<_> = reconciler
        .tree()
        .preorder()
        .into_iter()
        .map(|idx| reconciler.tree().get(idx).unwrap().direction)
        .collect();
    assert_eq!(after, directions);
    assert!(reconciler.tree().entity(&id("a1")).unwrap().shown);
}

#[test]
fn root_children_without_direction_are_balanced() {
    let mut snapshot = Snapshot::new().with("root", NodeRecord::root("r").with_children(["x", "y", "z"]));
    for child in ["x", "y", "z"] {
        let mut record = NodeRecord::child(child, Direction::Right);
        record.direction = None;
        snapshot.insert(child, record);
    }
    let (reconciler, _) = rendered(&snapshot);
    let sides: Vec<_> = ["x", "y", "z"]
        .iter()
        .map(|c| reconciler.tree().entity(&id(c)).unwrap().direction)
        .collect();
    assert_eq!(sides, vec![Some(Direction::Right), Some(Direction::Left), Some(Direction::Right)]);
}

#[test]
fn styles_are_only_pushed_when_they_change() {
    let (mut reconciler, mut surface) = rendered(&sample());
    reconciler.set_style(&id("a"), StyleKind::Select, &mut surface);
    let before = surface.stats();
    reconciler.set_style(&id("a"), StyleKind::Select, &mut surface);
    assert_eq!(surface.stats(), before);
    assert_eq!(surface.shape(shape_of(&reconciler, "a")).unwrap().style, StyleKind::Select);
}

#[test]
fn settle_returns_dragged_node_to_its_slot() {
    let (mut reconciler, mut surface) = rendered(&sample());
    let home = reconciler.tree().entity(&id("b1")).unwrap().bbox.origin();

    reconciler.preview_move(&id("b1"), mindmap_geometry::Point::new(500.0, 500.0), &mut surface);
    assert_eq!(reconciler.tree().entity(&id("b1")).unwrap().bbox.x, 500.0);

    reconciler.settle(&id("b1"), &mut surface);
    assert_eq!(reconciler.tree().entity(&id("b1")).unwrap().bbox.origin(), home);
}

/// Random tree as (father position, side) per non-root node
fn arbitrary_tree() -> impl Strategy<Value = Snapshot> {
    prop::collection::vec((any::<prop::sample::Index>(), any::<bool>(), any::<bool>()), 0..24).prop_map(|nodes| {
        let mut snapshot = Snapshot::new().with("n0", NodeRecord::root("root"));
        let mut ids = vec![id("n0")];
        for (i, (father, left, collapsed)) in nodes.into_iter().enumerate() {
            let child = id(&format!("n{}", i + 1));
            let father = ids[father.index(ids.len())].clone();
            let direction = if left { Direction::Left } else { Direction::Right };
            let mut record = NodeRecord::child(format!("node {i}"), direction);
            record.is_expand = !collapsed;
            snapshot.insert(child.clone(), record);
            snapshot.get_mut(&father).unwrap().children.push(child.clone());
            ids.push(child);
        }
        snapshot
    })
}

proptest! {
    #[test]
    fn rendering_any_tree_twice_is_a_no_op(snapshot in arbitrary_tree()) {
        let (mut reconciler, mut surface) = rendered(&snapshot);
        prop_assert_eq!(reconciler.tree().len(), snapshot.len());
        let before = surface.stats();
        let stats = reconciler.render(&snapshot, &mut surface);
        prop_assert!(stats.is_noop());
        prop_assert_eq!(surface.stats().since(&before).mutations(), 0);
    }

    #[test]
    fn displayed_siblings_never_overlap(snapshot in arbitrary_tree()) {
        let (reconciler, _) = rendered(&snapshot);
        let tree = reconciler.tree();
        for idx in tree.preorder() {
            let entity = tree.get(idx).unwrap();
            if !entity.shown {
                continue;
            }
            let shown: Vec<_> = entity
                .children
                .iter()
                .filter_map(|c| tree.get(*c))
                .filter(|c| c.shown)
                .collect();
            for (i, a) in shown.iter().enumerate() {
                for b in &shown[i + 1..] {
                    if a.side() == b.side() {
                        prop_assert!(!a.bbox.intersects(&b.bbox), "{} overlaps {}", a.id, b.id);
                    }
                }
            }
        }
    }
}
