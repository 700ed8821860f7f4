//! Local-first automerge document holding every node record.
//!
//! Layout inside the CRDT:
//! - `ROOT.id`: document uuid
//! - `ROOT.nodes`: map of node id to node map (`label`, `direction`,
//!   `children`, `isRoot`, `isExpand`, `tooltip`, `imageData`, `link`)
//!
//! All writes go through [`Document::transact`], which commits them as one
//! automerge change and notifies subscribers with the touched ids.

use std::collections::BTreeSet;
use std::sync::mpsc;

use anyhow::{anyhow, bail, Result};
use automerge::transaction::{Transactable, Transaction};
use automerge::{Automerge, ObjId, ObjType, ReadDoc, ScalarValue, Value, ROOT};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::EventBus;
use crate::record::{balanced_direction, Direction, ImageData, NodeId, NodeRecord, Snapshot, Toward};

const NODES: &str = "nodes";

/// Default label and tooltip for a new first-level node
pub const TOPIC_LABEL: &str = "Topic";
pub const TOPIC_TOOLTIP: &str = "Add topic node";
/// Default label and tooltip for a new deeper node
pub const SUBTOPIC_LABEL: &str = "Subtopic";
pub const SUBTOPIC_TOOLTIP: &str = "Add subtopic node";

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Change notifications
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A local transaction committed and wrote these records
    Changed { ids: Vec<NodeId> },
    /// Remote changes were merged in; any record may differ
    Merged,
}

/// The automerge-backed record store
pub struct Document {
    doc: Automerge,
    id: DocumentId,
    events: EventBus<StoreEvent>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        let id = DocumentId::new();
        let mut doc = Automerge::new();
        if let Err(err) = init_structure(&mut doc, id) {
            warn!(%err, "failed to initialize document structure");
        }
        Self { doc, id, events: EventBus::new() }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Independent replica for concurrent editing; it has no subscribers
    pub fn fork(&self) -> Self {
        Self { doc: self.doc.fork(), id: self.id, events: EventBus::new() }
    }

    /// Merge another replica's changes into this one
    pub fn merge(&mut self, other: &mut Document) -> Result<()> {
        self.merge_automerge(&mut other.doc)
    }

    pub fn merge_automerge(&mut self, other: &mut Automerge) -> Result<()> {
        let heads = self.doc.merge(other)?;
        debug!(changes = heads.len(), "merged remote document");
        self.events.emit(StoreEvent::Merged);
        Ok(())
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn get(&self, id: &NodeId) -> Result<Option<NodeRecord>> {
        let Some(nodes) = nodes_map(&self.doc)? else {
            return Ok(None);
        };
        get_record(&self.doc, &nodes, id)
    }

    /// Write one record in its own transaction
    pub fn set(&mut self, id: &NodeId, record: &NodeRecord) -> Result<()> {
        self.transact(|tx| tx.set(id, record))
    }

    /// Every record currently in the document
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        let Some(nodes) = nodes_map(&self.doc)? else {
            return Ok(snapshot);
        };
        for key in self.doc.keys(&nodes) {
            let id = NodeId::from(key);
            if let Some(record) = get_record(&self.doc, &nodes, &id)? {
                snapshot.insert(id, record);
            }
        }
        Ok(snapshot)
    }

    /// Run `f` as one atomic change.
    ///
    /// On error nothing `f` wrote is kept and no notification is sent.
    pub fn transact<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut StoreTx<'_>) -> Result<R>,
    {
        let mut tx = self.doc.transaction();
        let nodes = match tx.get(ROOT, NODES)? {
            Some((Value::Object(ObjType::Map), obj)) => obj,
            _ => tx.put_object(ROOT, NODES, ObjType::Map)?,
        };
        let mut store_tx = StoreTx { tx, nodes, touched: BTreeSet::new() };

        match f(&mut store_tx) {
            Ok(value) => {
                let StoreTx { tx, touched, .. } = store_tx;
                tx.commit();
                if !touched.is_empty() {
                    let ids: Vec<NodeId> = touched.into_iter().collect();
                    debug!(count = ids.len(), "transaction committed");
                    self.events.emit(StoreEvent::Changed { ids });
                }
                Ok(value)
            }
            Err(err) => {
                store_tx.tx.rollback();
                debug!(%err, "transaction rolled back");
                Err(err)
            }
        }
    }

    /// Replace the document contents with a snapshot
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.transact(|tx| {
            for stale in tx.ids()? {
                if !snapshot.contains(&stale) {
                    tx.delete(&stale)?;
                }
            }
            for (id, record) in snapshot.iter() {
                tx.set(id, record)?;
            }
            Ok(())
        })
    }

    pub fn find_father(&self, id: &NodeId) -> Result<Option<NodeId>> {
        Ok(self.snapshot()?.father_of(id).cloned())
    }

    pub fn create_root(&mut self, label: &str) -> Result<NodeId> {
        self.transact(|tx| tx.create_root(label))
    }

    pub fn add_child_node(&mut self, selection: &NodeId, new_id: NodeId) -> Result<NodeId> {
        self.transact(|tx| tx.add_child_node(selection, new_id))
    }

    pub fn add_brother_node(&mut self, selection: &NodeId, new_id: NodeId) -> Result<NodeId> {
        self.transact(|tx| tx.add_brother_node(selection, new_id))
    }

    pub fn set_label(&mut self, id: &NodeId, label: &str) -> Result<()> {
        self.transact(|tx| tx.update(id, |r| r.label = label.to_string()))
    }

    pub fn set_expand(&mut self, id: &NodeId, expand: bool) -> Result<()> {
        self.transact(|tx| tx.update(id, |r| r.is_expand = expand))
    }

    pub fn set_direction(&mut self, id: &NodeId, direction: Direction) -> Result<()> {
        self.transact(|tx| tx.set_direction(id, direction))
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Result<()> {
        self.transact(|tx| tx.remove_node(id))
    }

    pub fn move_node(&mut self, id: &NodeId, new_father: &NodeId, index: Option<usize>) -> Result<()> {
        self.transact(|tx| tx.move_node(id, new_father, index))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Writes staged inside one [`Document::transact`] call
pub struct StoreTx<'d> {
    tx: Transaction<'d>,
    nodes: ObjId,
    touched: BTreeSet<NodeId>,
}

impl StoreTx<'_> {
    pub fn get(&self, id: &NodeId) -> Result<Option<NodeRecord>> {
        get_record(&self.tx, &self.nodes, id)
    }

    /// Fetch a record that must exist
    pub fn require(&self, id: &NodeId) -> Result<NodeRecord> {
        self.get(id)?.ok_or_else(|| anyhow!("unknown node {id}"))
    }

    /// Ids of every stored record
    pub fn ids(&self) -> Result<Vec<NodeId>> {
        Ok(self.tx.keys(&self.nodes).map(NodeId::from).collect())
    }

    /// Write a record, touching only the fields that differ from the stored one
    pub fn set(&mut self, id: &NodeId, record: &NodeRecord) -> Result<()> {
        let existing = self.get(id)?;
        if existing.as_ref() == Some(record) {
            return Ok(());
        }
        let obj = match self.tx.get(&self.nodes, id.as_str())? {
            Some((Value::Object(ObjType::Map), obj)) => obj,
            _ => self.tx.put_object(&self.nodes, id.as_str(), ObjType::Map)?,
        };
        write_record(&mut self.tx, &obj, record, existing.as_ref())?;
        self.touched.insert(id.clone());
        Ok(())
    }

    /// Read-modify-write of one existing record
    pub fn update(&mut self, id: &NodeId, f: impl FnOnce(&mut NodeRecord)) -> Result<()> {
        let mut record = self.require(id)?;
        f(&mut record);
        self.set(id, &record)
    }

    pub fn delete(&mut self, id: &NodeId) -> Result<()> {
        self.tx.delete(&self.nodes, id.as_str())?;
        self.touched.insert(id.clone());
        Ok(())
    }

    pub fn root_id(&self) -> Result<Option<NodeId>> {
        for id in self.ids()? {
            if self.get(&id)?.is_some_and(|r| r.is_root) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    pub fn find_father(&self, id: &NodeId) -> Result<Option<NodeId>> {
        for candidate in self.ids()? {
            if self.get(&candidate)?.is_some_and(|r| r.children.contains(id)) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    pub fn create_root(&mut self, label: &str) -> Result<NodeId> {
        if let Some(existing) = self.root_id()? {
            bail!("document already has root {existing}");
        }
        let id = NodeId::new();
        self.set(&id, &NodeRecord::root(label))?;
        Ok(id)
    }

    /// Append a new child under `selection`; the father is forced expanded
    pub fn add_child_node(&mut self, selection: &NodeId, new_id: NodeId) -> Result<NodeId> {
        let mut father = self.require(selection)?;

        let (direction, first_level) = if father.is_root {
            let mut existing = Vec::with_capacity(father.children.len());
            for child in &father.children {
                existing.push(self.get(child)?.and_then(|r| r.direction));
            }
            (balanced_direction(existing), true)
        } else {
            (father.direction.unwrap_or(Direction::Right), false)
        };

        self.set(&new_id, &new_record(direction, first_level))?;
        father.children.push(new_id.clone());
        father.is_expand = true;
        self.set(selection, &father)?;
        debug!(father = %selection, child = %new_id, direction = direction.as_str(), "child added");
        Ok(new_id)
    }

    /// Append a sibling after the existing children of `selection`'s father.
    ///
    /// On the root this adds a child instead.
    pub fn add_brother_node(&mut self, selection: &NodeId, new_id: NodeId) -> Result<NodeId> {
        let current = self.require(selection)?;
        let father_id = match self.find_father(selection)? {
            Some(father) if !current.is_root => father,
            _ => return self.add_child_node(selection, new_id),
        };
        let mut father = self.require(&father_id)?;
        let direction = current.direction.unwrap_or(Direction::Right);

        self.set(&new_id, &new_record(direction, father.is_root))?;
        father.children.push(new_id.clone());
        father.is_expand = true;
        self.set(&father_id, &father)?;
        Ok(new_id)
    }

    /// Set the direction of `id` and everything below it
    pub fn set_direction(&mut self, id: &NodeId, direction: Direction) -> Result<()> {
        let mut stack = vec![id.clone()];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(mut record) = self.get(&current)? else {
                continue;
            };
            if record.is_root {
                continue;
            }
            stack.extend(record.children.iter().cloned());
            record.direction = Some(direction);
            self.set(&current, &record)?;
        }
        Ok(())
    }

    /// Detach `id` from its father; the subtree becomes unreachable
    pub fn remove_node(&mut self, id: &NodeId) -> Result<()> {
        let Some(father_id) = self.find_father(id)? else {
            bail!("node {id} has no father");
        };
        let mut father = self.require(&father_id)?;
        father.children.retain(|c| c != id);
        self.set(&father_id, &father)
    }

    /// Re-parent `id` under `new_father` at `index` (appended when `None`)
    pub fn move_node(&mut self, id: &NodeId, new_father: &NodeId, index: Option<usize>) -> Result<()> {
        let record = self.require(id)?;
        if record.is_root {
            bail!("cannot move the root");
        }
        let mut target = self.require(new_father)?;
        let mut cursor = Some(new_father.clone());
        let mut seen = BTreeSet::new();
        while let Some(current) = cursor {
            if &current == id {
                bail!("cannot move {id} below itself");
            }
            if !seen.insert(current.clone()) {
                break;
            }
            cursor = self.find_father(&current)?;
        }

        if let Some(old_father_id) = self.find_father(id)? {
            let mut old_father = self.require(&old_father_id)?;
            old_father.children.retain(|c| c != id);
            self.set(&old_father_id, &old_father)?;
            if &old_father_id == new_father {
                target = old_father;
            }
        }

        let direction = if target.is_root {
            let mut existing = Vec::with_capacity(target.children.len());
            for child in &target.children {
                existing.push(self.get(child)?.and_then(|r| r.direction));
            }
            balanced_direction(existing)
        } else {
            target.direction.unwrap_or(Direction::Right)
        };

        let at = index.unwrap_or(target.children.len()).min(target.children.len());
        target.children.insert(at, id.clone());
        target.is_expand = true;
        self.set(new_father, &target)?;
        self.set_direction(id, direction)?;
        debug!(node = %id, father = %new_father, index = at, "node moved");
        Ok(())
    }
}

fn new_record(direction: Direction, first_level: bool) -> NodeRecord {
    let (label, tooltip) = if first_level {
        (TOPIC_LABEL, TOPIC_TOOLTIP)
    } else {
        (SUBTOPIC_LABEL, SUBTOPIC_TOOLTIP)
    };
    NodeRecord {
        tooltip: tooltip.to_string(),
        ..NodeRecord::child(label, direction)
    }
}

fn init_structure(doc: &mut Automerge, id: DocumentId) -> Result<()> {
    let mut tx = doc.transaction();
    tx.put(ROOT, "id", id.0.to_string())?;
    tx.put_object(ROOT, NODES, ObjType::Map)?;
    tx.commit();
    Ok(())
}

// --- Serialization helpers ---

fn nodes_map<R: ReadDoc>(doc: &R) -> Result<Option<ObjId>> {
    match doc.get(ROOT, NODES)? {
        Some((Value::Object(ObjType::Map), obj)) => Ok(Some(obj)),
        _ => Ok(None),
    }
}

fn get_record<R: ReadDoc>(doc: &R, nodes: &ObjId, id: &NodeId) -> Result<Option<NodeRecord>> {
    match doc.get(nodes, id.as_str())? {
        Some((Value::Object(ObjType::Map), obj)) => Ok(Some(read_record(doc, &obj)?)),
        _ => Ok(None),
    }
}

fn read_record<R: ReadDoc>(doc: &R, obj: &ObjId) -> Result<NodeRecord> {
    let direction = get_opt_string(doc, obj, "direction")?.and_then(|s| Direction::parse(&s));

    let mut children = Vec::new();
    if let Some((Value::Object(ObjType::List), list)) = doc.get(obj, "children")? {
        for i in 0..doc.length(&list) {
            if let Some((Value::Scalar(s), _)) = doc.get(&list, i)? {
                if let ScalarValue::Str(text) = &*s {
                    children.push(NodeId::from(text.to_string()));
                }
            }
        }
    }

    let image_data = match doc.get(obj, "imageData")? {
        Some((Value::Object(ObjType::Map), img)) => Some(ImageData {
            src: get_opt_string(doc, &img, "src")?.unwrap_or_default(),
            width: get_opt_f64(doc, &img, "width")?.unwrap_or_default(),
            height: get_opt_f64(doc, &img, "height")?.unwrap_or_default(),
            toward: match get_opt_string(doc, &img, "toward")?.as_deref() {
                Some("right") => Toward::Right,
                _ => Toward::Left,
            },
            gap: get_opt_f64(doc, &img, "gap")?,
        }),
        _ => None,
    };

    Ok(NodeRecord {
        label: get_opt_string(doc, obj, "label")?.unwrap_or_default(),
        direction,
        children,
        is_root: get_opt_bool(doc, obj, "isRoot")?.unwrap_or(false),
        is_expand: get_opt_bool(doc, obj, "isExpand")?.unwrap_or(true),
        tooltip: get_opt_string(doc, obj, "tooltip")?.unwrap_or_default(),
        image_data,
        link: get_opt_string(doc, obj, "link")?,
    })
}

/// Write the fields of `record` that differ from `old`
fn write_record(tx: &mut Transaction<'_>, obj: &ObjId, record: &NodeRecord, old: Option<&NodeRecord>) -> Result<()> {
    if old.map(|o| &o.label) != Some(&record.label) {
        tx.put(obj, "label", record.label.as_str())?;
    }
    if old.map(|o| o.direction) != Some(record.direction) {
        match record.direction {
            Some(direction) => tx.put(obj, "direction", direction.as_str())?,
            None => tx.delete(obj, "direction")?,
        }
    }
    if old.map(|o| &o.children) != Some(&record.children) {
        let list = tx.put_object(obj, "children", ObjType::List)?;
        for (i, child) in record.children.iter().enumerate() {
            tx.insert(&list, i, child.as_str())?;
        }
    }
    if old.map(|o| o.is_root) != Some(record.is_root) {
        tx.put(obj, "isRoot", record.is_root)?;
    }
    if old.map(|o| o.is_expand) != Some(record.is_expand) {
        tx.put(obj, "isExpand", record.is_expand)?;
    }
    if old.map(|o| &o.tooltip) != Some(&record.tooltip) {
        tx.put(obj, "tooltip", record.tooltip.as_str())?;
    }
    if old.map(|o| &o.image_data) != Some(&record.image_data) {
        match &record.image_data {
            Some(image) => {
                let img = tx.put_object(obj, "imageData", ObjType::Map)?;
                tx.put(&img, "src", image.src.as_str())?;
                tx.put(&img, "width", image.width)?;
                tx.put(&img, "height", image.height)?;
                let toward = match image.toward {
                    Toward::Left => "left",
                    Toward::Right => "right",
                };
                tx.put(&img, "toward", toward)?;
                if let Some(gap) = image.gap {
                    tx.put(&img, "gap", gap)?;
                }
            }
            None => tx.delete(obj, "imageData")?,
        }
    }
    if old.map(|o| &o.link) != Some(&record.link) {
        match &record.link {
            Some(link) => tx.put(obj, "link", link.as_str())?,
            None => tx.delete(obj, "link")?,
        }
    }
    Ok(())
}

fn get_opt_string<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<String>> {
    match doc.get(obj, key)? {
        Some((Value::Scalar(s), _)) => match &*s {
            ScalarValue::Str(text) => Ok(Some(text.to_string())),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

fn get_opt_bool<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<bool>> {
    match doc.get(obj, key)? {
        Some((Value::Scalar(s), _)) => match &*s {
            ScalarValue::Boolean(b) => Ok(Some(*b)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

fn get_opt_f64<R: ReadDoc>(doc: &R, obj: &ObjId, key: &str) -> Result<Option<f64>> {
    match doc.get(obj, key)? {
        Some((Value::Scalar(s), _)) => match &*s {
            ScalarValue::F64(n) => Ok(Some(*n)),
            ScalarValue::Int(n) => Ok(Some(*n as f64)),
            ScalarValue::Uint(n) => Ok(Some(*n as f64)),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_root() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_root("Center").unwrap();
        (doc, root)
    }

    #[test]
    fn record_round_trips_through_automerge() {
        let mut doc = Document::new();
        let record = NodeRecord {
            image_data: Some(ImageData {
                src: "a.png".into(),
                width: 20.0,
                height: 10.0,
                toward: Toward::Right,
                gap: Some(4.0),
            }),
            link: Some("https://example.org".into()),
            tooltip: "tip".into(),
            ..NodeRecord::child("child", Direction::Left).with_children(["x", "y"])
        };
        let id = NodeId::from("n1");
        doc.set(&id, &record).unwrap();
        assert_eq!(doc.get(&id).unwrap(), Some(record));
    }

    #[test]
    fn unchanged_set_does_not_notify() {
        let (mut doc, root) = doc_with_root();
        let rx = doc.subscribe();
        let record = doc.get(&root).unwrap().unwrap();
        doc.set(&root, &record).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let (mut doc, root) = doc_with_root();
        let rx = doc.subscribe();
        let result: Result<()> = doc.transact(|tx| {
            tx.update(&root, |r| r.label = "changed".into())?;
            bail!("abort")
        });
        assert!(result.is_err());
        assert_eq!(doc.get(&root).unwrap().unwrap().label, "Center");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn add_child_forces_father_expanded() {
        let (mut doc, root) = doc_with_root();
        doc.set_expand(&root, false).unwrap();
        let child = doc.add_child_node(&root, NodeId::from("c")).unwrap();
        let root_record = doc.get(&root).unwrap().unwrap();
        assert!(root_record.is_expand);
        assert_eq!(root_record.children, vec![child.clone()]);
        let record = doc.get(&child).unwrap().unwrap();
        assert_eq!(record.label, TOPIC_LABEL);
        assert_eq!(record.tooltip, TOPIC_TOOLTIP);
    }

    #[test]
    fn deeper_children_inherit_direction() {
        let (mut doc, root) = doc_with_root();
        let a = doc.add_child_node(&root, NodeId::from("a")).unwrap();
        let b = doc.add_child_node(&root, NodeId::from("b")).unwrap();
        let deep = doc.add_child_node(&b, NodeId::from("deep")).unwrap();
        let record = doc.get(&deep).unwrap().unwrap();
        assert_eq!(doc.get(&a).unwrap().unwrap().direction, Some(Direction::Right));
        assert_eq!(record.direction, Some(Direction::Left));
        assert_eq!(record.label, SUBTOPIC_LABEL);
    }

    #[test]
    fn brother_of_root_becomes_child() {
        let (mut doc, root) = doc_with_root();
        let id = doc.add_brother_node(&root, NodeId::from("x")).unwrap();
        assert_eq!(doc.find_father(&id).unwrap(), Some(root));
    }

    #[test]
    fn brother_is_appended_after_siblings() {
        let (mut doc, root) = doc_with_root();
        let a = doc.add_child_node(&root, NodeId::from("a")).unwrap();
        let b = doc.add_child_node(&root, NodeId::from("b")).unwrap();
        let c = doc.add_brother_node(&a, NodeId::from("c")).unwrap();
        assert_eq!(doc.get(&root).unwrap().unwrap().children, vec![a, b, c.clone()]);
        assert_eq!(doc.get(&c).unwrap().unwrap().direction, Some(Direction::Right));
    }

    #[test]
    fn move_rejects_cycles() {
        let (mut doc, root) = doc_with_root();
        let a = doc.add_child_node(&root, NodeId::from("a")).unwrap();
        let b = doc.add_child_node(&a, NodeId::from("b")).unwrap();
        assert!(doc.move_node(&a, &b, None).is_err());
        assert_eq!(doc.find_father(&b).unwrap(), Some(a));
    }

    #[test]
    fn move_rewrites_subtree_direction() {
        let (mut doc, root) = doc_with_root();
        let a = doc.add_child_node(&root, NodeId::from("a")).unwrap();
        let b = doc.add_child_node(&root, NodeId::from("b")).unwrap();
        let leaf = doc.add_child_node(&a, NodeId::from("leaf")).unwrap();
        let under = doc.add_child_node(&leaf, NodeId::from("under")).unwrap();

        doc.move_node(&leaf, &b, Some(0)).unwrap();
        assert_eq!(doc.get(&b).unwrap().unwrap().children, vec![leaf.clone()]);
        assert!(doc.get(&a).unwrap().unwrap().children.is_empty());
        assert_eq!(doc.get(&under).unwrap().unwrap().direction, Some(Direction::Left));
    }

    #[test]
    fn remove_detaches_from_father() {
        let (mut doc, root) = doc_with_root();
        let a = doc.add_child_node(&root, NodeId::from("a")).unwrap();
        doc.remove_node(&a).unwrap();
        assert!(doc.get(&root).unwrap().unwrap().children.is_empty());
        assert!(doc.remove_node(&root).is_err());
    }

    #[test]
    fn load_snapshot_replaces_contents() {
        let (mut doc, _) = doc_with_root();
        let snap = Snapshot::new()
            .with("r", NodeRecord::root("R").with_children(["a"]))
            .with("a", NodeRecord::child("A", Direction::Left));
        doc.load_snapshot(&snap).unwrap();
        assert_eq!(doc.snapshot().unwrap(), snap);
    }
}
