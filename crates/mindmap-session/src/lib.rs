//! Interactive layer over the mindmap engine: change pumping, selection,
//! editing commands, zoom controls, pointer gestures and collaborator
//! presence.

pub mod interaction;
pub mod node_drag;
pub mod presence;
pub mod session;

pub use interaction::{apply_wheel, DragViewportHandler, SelectionBox, WheelInput};
pub use node_drag::{DropOutcome, NodeDragState};
pub use presence::{PeerId, PeerPresence, PresenceManager, PEER_COLORS, STALE_THRESHOLD};
pub use session::MindMap;
