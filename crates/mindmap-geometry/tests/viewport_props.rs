use mindmap_geometry::{Size, Viewport, MAX_SCALE, MIN_SCALE};
use proptest::prelude::*;

proptest! {
    #[test]
    fn scale_is_always_in_range(start in -10.0f64..10.0, deltas in prop::collection::vec(-20.0f64..20.0, 0..16)) {
        let mut vp = Viewport::new(Size::new(1024.0, 768.0), Some(start));
        for d in deltas {
            vp.add_scale(d);
            prop_assert!(vp.scale() >= MIN_SCALE && vp.scale() <= MAX_SCALE);
        }
    }

    #[test]
    fn unclamped_zoom_round_trip_restores_origin(
        scale in 0.5f64..2.5,
        delta in 0.0f64..4.0,
        x in -1000.0f64..1000.0,
        y in -1000.0f64..1000.0,
    ) {
        let mut vp = Viewport::new(Size::new(1024.0, 768.0), Some(scale));
        vp.translate_to(x, y);
        let before = vp.viewbox();
        vp.add_scale(delta);
        vp.add_scale(-delta);
        let after = vp.viewbox();
        prop_assert!((after.x - before.x).abs() < 1e-6);
        prop_assert!((after.y - before.y).abs() < 1e-6);
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen(
        scale in 0.25f64..3.0,
        px in -500.0f64..500.0,
        py in -500.0f64..500.0,
    ) {
        let mut vp = Viewport::new(Size::new(640.0, 480.0), Some(scale));
        vp.translate(37.0, -12.0);
        let offset = vp.world_to_screen_offset(px, py);
        let back = vp.screen_to_world(offset.x, offset.y);
        prop_assert!((back.x - px).abs() < 1e-6);
        prop_assert!((back.y - py).abs() < 1e-6);
    }
}
