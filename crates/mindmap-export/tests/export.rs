use mindmap_core::{Direction, EngineConfig, NodeId, NodeRecord, Reconciler, Snapshot};
use mindmap_export::SvgSurface;
use mindmap_geometry::{Size, Viewport};

fn snapshot() -> Snapshot {
    let mut linked = NodeRecord::child("Docs", Direction::Left);
    linked.link = Some("https://example.com/?a=1&b=2".into());
    linked.tooltip = "Open the docs".into();
    Snapshot::new()
        .with("root", NodeRecord::root("Roadmap").with_children(["q1", "docs"]))
        .with("q1", NodeRecord::child("Q1", Direction::Right).with_children(["ship"]))
        .with("ship", NodeRecord::child("Ship it", Direction::Right))
        .with("docs", linked)
}

#[test]
fn rendered_tree_saves_as_svg() {
    let mut surface = SvgSurface::new();
    let mut reconciler = Reconciler::new(&EngineConfig::default());
    reconciler.render(&snapshot(), &mut surface);
    reconciler.translate_root(300.0, 200.0, &mut surface);

    let viewport = Viewport::new(Size::new(800.0, 600.0), None);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadmap.svg");
    surface.save_svg(&viewport, &path).unwrap();

    let svg = std::fs::read_to_string(&path).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains(r#"viewBox="0 0 800 600""#));
    for label in ["Roadmap", "Q1", "Ship it", "Docs"] {
        assert!(svg.contains(&format!(">{label}</text>")), "missing {label}");
    }
    assert!(svg.contains("<title>Open the docs</title>"));
    assert!(svg.contains("a=1&amp;b=2"));
    // three edges, one underline for the grandchild, one expander on q1
    assert_eq!(svg.matches("<path").count(), 3);
    assert_eq!(svg.matches("<circle").count(), 1);
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn collapsed_subtrees_are_left_out() {
    let mut snapshot = snapshot();
    snapshot.get_mut(&NodeId::from("q1")).unwrap().is_expand = false;

    let mut surface = SvgSurface::new();
    let mut reconciler = Reconciler::new(&EngineConfig::default());
    reconciler.render(&snapshot, &mut surface);

    let svg = surface.to_svg(&Viewport::new(Size::new(800.0, 600.0), None)).unwrap();
    assert!(svg.contains(">Q1</text>"));
    assert!(!svg.contains("Ship it"));
    assert_eq!(svg.matches("<path").count(), 2);
    assert_eq!(svg.matches("<circle").count(), 1);
}
