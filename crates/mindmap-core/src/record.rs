//! Node records - the document-of-record description of each mind-map node.
//!
//! A [`Snapshot`] is a complete, internally consistent record map as the
//! store hands it out after merging. The reconciler only ever reads snapshots.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique node identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch side a node hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Sign of the horizontal offset from the father
    pub fn sign(self) -> f64 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LEFT" => Some(Direction::Left),
            "RIGHT" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Direction for a new child of the root.
///
/// Ties and right-deficits go RIGHT. Children without a direction count as
/// right-hand children.
pub fn balanced_direction<I>(existing: I) -> Direction
where
    I: IntoIterator<Item = Option<Direction>>,
{
    let (left, right) = existing.into_iter().fold((0usize, 0usize), |(l, r), d| match d {
        Some(Direction::Left) => (l + 1, r),
        _ => (l, r + 1),
    });
    if right > left {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Depth classification driving spacing and shape metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthTier {
    Root,
    FirstLevel,
    Grandchild,
}

impl DepthTier {
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => DepthTier::Root,
            1 => DepthTier::FirstLevel,
            _ => DepthTier::Grandchild,
        }
    }
}

/// Side of the label an attached image sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toward {
    #[default]
    Left,
    Right,
}

/// Image attached to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub src: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub toward: Toward,
    /// Space between image and label; 8 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
}

fn default_expand() -> bool {
    true
}

/// One node as stored in the shared document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(default)]
    pub label: String,
    /// Absent on the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Ordered child ids; order is sibling display order
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default = "default_expand")]
    pub is_expand: bool,
    #[serde(default)]
    pub tooltip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl NodeRecord {
    /// Root record with the given label
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            direction: None,
            children: Vec::new(),
            is_root: true,
            is_expand: true,
            tooltip: String::new(),
            image_data: None,
            link: None,
        }
    }

    /// Non-root record hanging on the given side
    pub fn child(label: impl Into<String>, direction: Direction) -> Self {
        Self {
            label: label.into(),
            direction: Some(direction),
            is_root: false,
            ..Self::root("")
        }
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeId>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }
}

/// Complete record map at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<NodeId, NodeRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<NodeId>, record: NodeRecord) {
        self.records.insert(id.into(), record);
    }

    pub fn with(mut self, id: impl Into<NodeId>, record: NodeRecord) -> Self {
        self.insert(id, record);
        self
    }

    pub fn get(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut NodeRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &NodeRecord)> {
        self.records.iter()
    }

    /// Id of the root record. With several roots the smallest id wins.
    pub fn root_id(&self) -> Option<&NodeId> {
        self.records.iter().find(|(_, r)| r.is_root).map(|(id, _)| id)
    }

    /// Id of the record whose children list contains `id`
    pub fn father_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.records
            .iter()
            .find(|(_, r)| r.children.contains(id))
            .map(|(father, _)| father)
    }

    /// Ids reachable from the root, dangling references excluded
    pub fn reachable(&self) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let Some(root) = self.root_id() else {
            return seen;
        };
        let mut stack = vec![root.clone()];
        while let Some(id) = stack.pop() {
            let Some(record) = self.records.get(&id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            stack.extend(record.children.iter().rev().cloned());
        }
        seen
    }

    /// `id` followed by every id below it, preorder
    pub fn subtree(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack = vec![id.clone()];
        while let Some(cur) = stack.pop() {
            let Some(record) = self.records.get(&cur) else {
                continue;
            };
            if !seen.insert(cur.clone()) {
                continue;
            }
            stack.extend(record.children.iter().rev().cloned());
            out.push(cur);
        }
        out
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
