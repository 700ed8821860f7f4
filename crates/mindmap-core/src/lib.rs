//! Mind-map engine core.
//!
//! Node records live in an automerge-backed [`Document`]. A [`Reconciler`]
//! diffs record snapshots against a live, identity-stable [`NodeTree`], the
//! [`LayoutEngine`] places what changed, and every drawing call goes through
//! the [`RenderSurface`] trait.

pub mod config;
pub mod document;
pub mod events;
pub mod expander;
pub mod layout;
pub mod memory_surface;
pub mod node;
pub mod reconciler;
pub mod record;
pub mod surface;

pub use config::{EngineConfig, ExpanderMetrics, LayoutConfig};
pub use document::{Document, DocumentId, StoreEvent, StoreTx};
pub use events::EventBus;
pub use expander::{ExpandController, ExpandOutcome};
pub use layout::LayoutEngine;
pub use memory_surface::{MemoryShape, MemoryShapeKind, MemorySurface, SurfaceStats};
pub use node::{CollaboratorMarker, NodeContent, NodeEntity, NodeTree};
pub use reconciler::{Reconciler, RenderStats};
pub use record::{balanced_direction, DepthTier, Direction, ImageData, NodeId, NodeRecord, Snapshot, Toward};
pub use surface::{
    style_attrs, Collaborator, CollaboratorShapeSpec, EdgeShapeSpec, ExpanderShapeSpec, NodeShapeSpec, OverlaySpec,
    Pointer, RenderSurface, ShapeEvent, ShapeEventKind, ShapeHandle, ShapeRole, StyleAttrs, StyleKind, Subscription,
    TierMetrics, BADGE_FONT_SIZE, FRAME_STROKE_WIDTH,
};
