//! Presence tracking for remote collaborators.
//!
//! Presence is ephemeral: which node each peer is working on is kept here,
//! outside the record store, and shown as a frame plus name badge around
//! that node. Peers that stop reporting are dropped after a few seconds.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use mindmap_core::{Collaborator, NodeId};
use uuid::Uuid;

/// Staleness threshold - forget peers not updated in 5 seconds
pub const STALE_THRESHOLD: Duration = Duration::from_secs(5);

/// Badge colors for remote peers (8 distinct colors)
pub const PEER_COLORS: &[&str] = &[
    "#E74C3C", "#27AE60", "#2980B9", "#8E44AD", "#F1948A", "#82E0AA", "#85C1E9", "#D7BDE2",
];

/// Unique peer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A peer's presence state
#[derive(Debug, Clone, PartialEq)]
pub struct PeerPresence {
    pub peer_id: PeerId,
    /// Chosen display name; falls back to a short id
    pub name: Option<String>,
    /// Node the peer currently works on
    pub node: Option<NodeId>,
    pub color_index: u8,
}

impl PeerPresence {
    pub fn new(peer_id: PeerId, node: Option<NodeId>) -> Self {
        let color_index = peer_id.0.as_bytes()[0] % (PEER_COLORS.len() as u8);
        Self { peer_id, name: None, node, color_index }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, e.g. "Peer-1a2b" when the peer did not pick one
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let bytes = self.peer_id.0.as_bytes();
                format!("Peer-{:02x}{:02x}", bytes[0], bytes[1])
            }
        }
    }

    pub fn color(&self) -> &'static str {
        PEER_COLORS[self.color_index as usize % PEER_COLORS.len()]
    }

    pub fn collaborator(&self) -> Collaborator {
        Collaborator { name: self.display_name(), color: self.color().to_string() }
    }
}

/// Manages all remote peer presence states
#[derive(Debug)]
pub struct PresenceManager {
    local_peer_id: PeerId,
    peers: HashMap<PeerId, (PeerPresence, Instant)>,
}

impl PresenceManager {
    pub fn new(local_peer_id: PeerId) -> Self {
        Self { local_peer_id, peers: HashMap::new() }
    }

    pub fn local_peer_id(&self) -> PeerId {
        self.local_peer_id
    }

    /// Update or add a peer's presence. Our own presence is never stored.
    pub fn update_peer(&mut self, presence: PeerPresence) {
        if presence.peer_id != self.local_peer_id {
            self.peers.insert(presence.peer_id, (presence, Instant::now()));
        }
    }

    /// Returns whether the peer was known
    pub fn remove_peer(&mut self, peer_id: &PeerId) -> bool {
        self.peers.remove(peer_id).is_some()
    }

    /// Remove peers not updated within [`STALE_THRESHOLD`]
    pub fn prune_stale(&mut self) -> usize {
        self.prune_older_than(STALE_THRESHOLD)
    }

    /// Remove peers not updated within `max_age`; returns how many went
    pub fn prune_older_than(&mut self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.peers.len();
        self.peers.retain(|_, (_, last_update)| now.duration_since(*last_update) < max_age);
        before - self.peers.len()
    }

    pub fn active_peers(&self) -> impl Iterator<Item = &PeerPresence> {
        self.peers.values().map(|(p, _)| p)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Collaborator to show on each node. When several peers share a node
    /// the one with the lowest id is shown.
    pub fn markers(&self) -> HashMap<NodeId, Collaborator> {
        let mut peers: Vec<&PeerPresence> = self.active_peers().collect();
        peers.sort_by_key(|p| p.peer_id);
        let mut markers = HashMap::new();
        for peer in peers {
            if let Some(node) = &peer.node {
                markers.entry(node.clone()).or_insert_with(|| peer.collaborator());
            }
        }
        markers
    }
}
