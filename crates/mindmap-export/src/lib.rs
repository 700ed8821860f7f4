//! SVG export for mindmap
//!
//! [`SvgSurface`] is a [`RenderSurface`] that retains every primitive the
//! engine draws and serializes the visible ones as an SVG document:
//! - edges first, then node boxes, then expand/collapse circles, then
//!   overlays (collaborator badges and the selection box)
//! - the document viewBox is the viewport's current viewbox
//! - node styles come from the shared style table

use std::fmt::{self, Write};
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use mindmap_core::{
    style_attrs, CollaboratorShapeSpec, EdgeShapeSpec, ExpanderShapeSpec, MemoryShape, MemoryShapeKind,
    MemorySurface, NodeShapeSpec, OverlaySpec, RenderSurface, ShapeEvent, ShapeEventKind, ShapeHandle, StyleKind,
    Subscription, BADGE_FONT_SIZE, FRAME_STROKE_WIDTH,
};
use mindmap_geometry::{BBox, Viewport};
use tracing::debug;

/// Stroke color for edges and expander circles
const LINE_COLOR: &str = "#666";

/// Corner radius of node boxes
const NODE_RADIUS: f64 = 4.0;

const SELECTION_STROKE: &str = "#73a1bf";
const SELECTION_FILL: &str = "#997cff";

/// Render surface that can be written out as SVG
#[derive(Debug, Default)]
pub struct SvgSurface {
    inner: MemorySurface,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the visible primitives for the given viewport
    pub fn to_svg(&self, viewport: &Viewport) -> Result<String> {
        let mut output = String::new();
        self.write_svg(&mut output, viewport).context("formatting svg")?;
        Ok(output)
    }

    /// Save the SVG to a file
    pub fn save_svg(&self, viewport: &Viewport, path: &Path) -> Result<()> {
        let svg = self.to_svg(viewport)?;
        std::fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
        debug!(path = %path.display(), shapes = self.inner.len(), "svg saved");
        Ok(())
    }

    fn write_svg(&self, output: &mut String, viewport: &Viewport) -> fmt::Result {
        let size = viewport.wrapper_size();
        let vb = viewport.viewbox();

        writeln!(
            output,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"
     width="{}" height="{}"
     viewBox="{} {} {} {}"
     style="background-color: white;">"#,
            fmt_num(size.width),
            fmt_num(size.height),
            fmt_num(vb.x),
            fmt_num(vb.y),
            fmt_num(vb.width),
            fmt_num(vb.height)
        )?;

        let visible: Vec<&MemoryShape> = self.inner.shapes().map(|(_, s)| s).filter(|s| s.visible).collect();
        for shape in &visible {
            if let MemoryShapeKind::Edge(spec) = &shape.kind {
                render_edge(output, spec)?;
            }
        }
        for shape in &visible {
            if let MemoryShapeKind::Node(spec) = &shape.kind {
                render_node(output, spec, &shape.bbox, shape.style)?;
            }
        }
        for shape in &visible {
            if let MemoryShapeKind::Expander(spec) = &shape.kind {
                render_expander(output, spec)?;
            }
        }
        for shape in &visible {
            match &shape.kind {
                MemoryShapeKind::Overlay(OverlaySpec::Collaborator(spec)) => render_collaborator(output, spec)?,
                MemoryShapeKind::Overlay(OverlaySpec::SelectionBox(bbox)) => render_selection_box(output, bbox)?,
                _ => {}
            }
        }

        writeln!(output, "</svg>")
    }
}

impl RenderSurface for SvgSurface {
    fn create_node_shape(&mut self, spec: &NodeShapeSpec) -> ShapeHandle {
        self.inner.create_node_shape(spec)
    }

    fn create_edge_shape(&mut self, spec: &EdgeShapeSpec) -> ShapeHandle {
        self.inner.create_edge_shape(spec)
    }

    fn create_expander_shape(&mut self, spec: &ExpanderShapeSpec) -> ShapeHandle {
        self.inner.create_expander_shape(spec)
    }

    fn create_overlay_shape(&mut self, spec: &OverlaySpec) -> ShapeHandle {
        self.inner.create_overlay_shape(spec)
    }

    fn bounding_box(&self, shape: ShapeHandle) -> Option<BBox> {
        self.inner.bounding_box(shape)
    }

    fn translate_to(&mut self, shape: ShapeHandle, x: f64, y: f64) {
        self.inner.translate_to(shape, x, y);
    }

    fn set_label(&mut self, shape: ShapeHandle, label: &str) {
        self.inner.set_label(shape, label);
    }

    fn set_style(&mut self, shape: ShapeHandle, style: StyleKind) {
        self.inner.set_style(shape, style);
    }

    fn set_visible(&mut self, shape: ShapeHandle, visible: bool) {
        self.inner.set_visible(shape, visible);
    }

    fn set_expanded(&mut self, shape: ShapeHandle, expanded: bool) {
        self.inner.set_expanded(shape, expanded);
    }

    fn reshape_edge(&mut self, shape: ShapeHandle, spec: &EdgeShapeSpec) {
        self.inner.reshape_edge(shape, spec);
    }

    fn reshape_overlay(&mut self, shape: ShapeHandle, spec: &OverlaySpec) {
        self.inner.reshape_overlay(shape, spec);
    }

    fn remove(&mut self, shape: ShapeHandle) {
        self.inner.remove(shape);
    }

    fn subscribe(&mut self, shape: ShapeHandle, kind: ShapeEventKind, sink: mpsc::Sender<ShapeEvent>) -> Subscription {
        self.inner.subscribe(shape, kind, sink)
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.inner.unsubscribe(subscription);
    }
}

/// Render a node box with its label, image, tooltip and link
fn render_node(output: &mut String, spec: &NodeShapeSpec, bbox: &BBox, style: StyleKind) -> fmt::Result {
    let metrics = spec.metrics();
    let attrs = style_attrs(style);

    if let Some(link) = &spec.link {
        writeln!(output, r#"  <a xlink:href="{}" target="_blank">"#, escape_xml(link))?;
    }
    writeln!(output, r#"  <g opacity="{}">"#, fmt_num(attrs.opacity))?;
    if !spec.tooltip.is_empty() {
        writeln!(output, "    <title>{}</title>", escape_xml(&spec.tooltip))?;
    }
    writeln!(
        output,
        r#"    <rect x="{}" y="{}" width="{}" height="{}" rx="{}" fill="{}" stroke="{}" stroke-opacity="{}" stroke-width="2"/>"#,
        fmt_num(bbox.x),
        fmt_num(bbox.y),
        fmt_num(bbox.width),
        fmt_num(bbox.height),
        fmt_num(NODE_RADIUS),
        metrics.fill,
        attrs.border_stroke,
        fmt_num(attrs.border_opacity)
    )?;

    let (label_at, image_at) = metrics.content_origins(bbox.origin(), &spec.label, spec.image.as_ref());
    if let (Some(image), Some(at)) = (&spec.image, image_at) {
        writeln!(
            output,
            r#"    <image xlink:href="{}" x="{}" y="{}" width="{}" height="{}"/>"#,
            escape_xml(&image.src),
            fmt_num(at.x),
            fmt_num(at.y),
            fmt_num(image.width),
            fmt_num(image.height)
        )?;
    }
    let text = metrics.label_size(&spec.label);
    writeln!(
        output,
        r#"    <text x="{}" y="{}" dominant-baseline="middle" font-family="sans-serif" font-size="{}" fill="{}">{}</text>"#,
        fmt_num(label_at.x),
        fmt_num(label_at.y + text.height / 2.0),
        fmt_num(metrics.font_size),
        metrics.label_color,
        escape_xml(&spec.label)
    )?;
    writeln!(output, "  </g>")?;
    if spec.link.is_some() {
        writeln!(output, "  </a>")?;
    }
    Ok(())
}

/// Render an edge curve plus its underline
fn render_edge(output: &mut String, spec: &EdgeShapeSpec) -> fmt::Result {
    writeln!(
        output,
        r#"  <path d="M {} {} C {} {}, {} {}, {} {}" stroke="{}" stroke-width="{}" fill="none"/>"#,
        fmt_num(spec.start.x),
        fmt_num(spec.start.y),
        fmt_num(spec.control1.x),
        fmt_num(spec.control1.y),
        fmt_num(spec.control2.x),
        fmt_num(spec.control2.y),
        fmt_num(spec.end.x),
        fmt_num(spec.end.y),
        LINE_COLOR,
        fmt_num(spec.stroke_width)
    )?;
    if let Some((a, b)) = spec.underline {
        writeln!(
            output,
            r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
            fmt_num(a.x),
            fmt_num(a.y),
            fmt_num(b.x),
            fmt_num(b.y),
            LINE_COLOR,
            fmt_num(spec.stroke_width)
        )?;
    }
    Ok(())
}

/// Render the expand/collapse circle: a minus when expanded, a plus otherwise
fn render_expander(output: &mut String, spec: &ExpanderShapeSpec) -> fmt::Result {
    let ExpanderShapeSpec { center, radius, expanded } = *spec;
    let arm = radius * 0.6;
    writeln!(
        output,
        r#"  <circle cx="{}" cy="{}" r="{}" fill="white" stroke="{}"/>"#,
        fmt_num(center.x),
        fmt_num(center.y),
        fmt_num(radius),
        LINE_COLOR
    )?;
    writeln!(
        output,
        r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}"/>"#,
        fmt_num(center.x - arm),
        fmt_num(center.y),
        fmt_num(center.x + arm),
        fmt_num(center.y),
        LINE_COLOR
    )?;
    if !expanded {
        writeln!(
            output,
            r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}"/>"#,
            fmt_num(center.x),
            fmt_num(center.y - arm),
            fmt_num(center.x),
            fmt_num(center.y + arm),
            LINE_COLOR
        )?;
    }
    Ok(())
}

/// Render a collaborator frame around the node and a name badge above it
fn render_collaborator(output: &mut String, spec: &CollaboratorShapeSpec) -> fmt::Result {
    let frame = spec.frame();
    let badge = spec.badge();
    let color = escape_xml(&spec.collaborator.color);
    writeln!(
        output,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="none" stroke="{}" stroke-width="{}"/>"#,
        fmt_num(frame.x),
        fmt_num(frame.y),
        fmt_num(frame.width),
        fmt_num(frame.height),
        color,
        fmt_num(FRAME_STROKE_WIDTH)
    )?;
    writeln!(
        output,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="4" fill="{}"/>"#,
        fmt_num(badge.x),
        fmt_num(badge.y),
        fmt_num(badge.width),
        fmt_num(badge.height),
        color
    )?;
    let at = spec.label_origin();
    writeln!(
        output,
        r#"  <text x="{}" y="{}" dominant-baseline="middle" font-family="sans-serif" font-size="{}" fill="white">{}</text>"#,
        fmt_num(at.x),
        fmt_num(at.y + spec.label_size().height / 2.0),
        fmt_num(BADGE_FONT_SIZE),
        escape_xml(&spec.collaborator.name)
    )
}

fn render_selection_box(output: &mut String, bbox: &BBox) -> fmt::Result {
    writeln!(
        output,
        r#"  <rect x="{}" y="{}" width="{}" height="{}" stroke="{}" fill="{}" fill-opacity="0.1" opacity="0.8"/>"#,
        fmt_num(bbox.x),
        fmt_num(bbox.y),
        fmt_num(bbox.width),
        fmt_num(bbox.height),
        SELECTION_STROKE,
        SELECTION_FILL
    )
}

/// Two decimals at most, no trailing zeros
fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_core::{Collaborator, DepthTier, NodeId};
    use mindmap_geometry::{Point, Size};

    fn node(label: &str) -> NodeShapeSpec {
        NodeShapeSpec {
            id: NodeId::from("n"),
            tier: DepthTier::FirstLevel,
            label: label.to_string(),
            tooltip: String::new(),
            position: Some(Point::new(10.0, 20.0)),
            image: None,
            link: None,
        }
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(1.5), "1.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.33");
        assert_eq!(fmt_num(-0.001), "0");
    }

    #[test]
    fn labels_are_escaped() {
        let mut surface = SvgSurface::new();
        surface.create_node_shape(&node("a < b & c"));
        let svg = surface.to_svg(&Viewport::new(Size::new(100.0, 100.0), None)).unwrap();
        assert!(svg.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn hidden_shapes_are_skipped() {
        let mut surface = SvgSurface::new();
        let shown = surface.create_node_shape(&node("shown"));
        let hidden = surface.create_node_shape(&node("hidden"));
        surface.set_visible(hidden, false);
        surface.set_style(shown, StyleKind::Select);

        let svg = surface.to_svg(&Viewport::new(Size::new(100.0, 100.0), None)).unwrap();
        assert!(svg.contains("shown"));
        assert!(!svg.contains("hidden"));
        assert!(svg.contains(r##"stroke="#3498DB" stroke-opacity="1""##));
    }

    #[test]
    fn collapsed_expander_draws_a_plus() {
        let mut surface = SvgSurface::new();
        let spec = ExpanderShapeSpec { center: Point::new(50.0, 50.0), radius: 5.0, expanded: true };
        let handle = surface.create_expander_shape(&spec);
        let viewport = Viewport::new(Size::new(100.0, 100.0), None);
        let open = surface.to_svg(&viewport).unwrap().matches("<line").count();
        surface.set_expanded(handle, false);
        let closed = surface.to_svg(&viewport).unwrap().matches("<line").count();
        assert_eq!(closed, open + 1);
    }

    #[test]
    fn collaborator_badge_is_drawn_above_the_tree() {
        let mut surface = SvgSurface::new();
        surface.create_node_shape(&node("Topic"));
        let who = Collaborator { name: "Dana <ops>".into(), color: "#2ECC71".into() };
        let spec = CollaboratorShapeSpec::new(BBox::new(10.0, 20.0, 80.0, 30.0), who);
        surface.create_overlay_shape(&OverlaySpec::Collaborator(spec));

        let svg = surface.to_svg(&Viewport::new(Size::new(200.0, 200.0), None)).unwrap();
        assert!(svg.contains(r##"x="7" y="17" width="86" height="36" rx="4" fill="none" stroke="#2ECC71""##));
        assert!(svg.contains(">Dana &lt;ops&gt;</text>"));
        assert!(svg.find(">Topic</text>").unwrap() < svg.find("Dana").unwrap());
    }

    #[test]
    fn selection_box_follows_reshapes() {
        let mut surface = SvgSurface::new();
        let handle = surface.create_overlay_shape(&OverlaySpec::SelectionBox(BBox::new(0.0, 0.0, 5.0, 5.0)));
        surface.reshape_overlay(handle, &OverlaySpec::SelectionBox(BBox::new(0.0, 0.0, 40.0, 25.0)));

        let svg = surface.to_svg(&Viewport::new(Size::new(100.0, 100.0), None)).unwrap();
        assert!(svg.contains(r##"width="40" height="25" stroke="#73a1bf""##));
        assert!(!svg.contains(r#"width="5" height="5""#));
    }
}
