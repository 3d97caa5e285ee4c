use crate::core::anchor::AnchorId;
use crate::core::value::{Name, Value};
use crate::error::TraceError;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Receives every mutation of an attached node.
pub trait NodeObserver {
    fn path_set(&self, node: &Node, name: &Name);

    fn path_deleted(&self, node: &Node, name: &Name, anchor: Option<AnchorId>);

    /// Called before a path disappears because its sequence shrank.
    fn path_removing(&self, path: &Path);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Table,
    Sequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Frame,
    Array,
    Seq,
}

impl NodeKind {
    pub fn shape(self) -> Shape {
        match self {
            Self::Seq => Shape::Sequence,
            _ => Shape::Table,
        }
    }

    pub fn is_indexed(self) -> bool {
        matches!(self, Self::Array | Self::Seq)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Frame => "frame",
            Self::Array => "array",
            Self::Seq => "seq",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    pub title: Option<String>,
    pub drop_history: bool,
    pub drop_history_fields: Vec<Name>,
    pub hidden: Vec<Name>,
}

impl NodeConfig {
    pub fn drops_history(&self, name: &Name) -> bool {
        self.drop_history || self.drop_history_fields.contains(name)
    }

    pub fn is_hidden(&self, name: &Name) -> bool {
        self.hidden.contains(name)
    }
}

#[derive(Debug)]
struct Slot {
    value: Value,
    anchor: Option<AnchorId>,
}

struct NodeData {
    kind: NodeKind,
    config: NodeConfig,
    slots: IndexMap<Name, Slot>,
    element: Option<AnchorId>,
    top_level: bool,
    observer: Option<Weak<dyn NodeObserver>>,
}

/// A reactive container of named or indexed paths. Clones share the same node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    pub fn new(kind: NodeKind, config: NodeConfig) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            kind,
            config,
            slots: IndexMap::new(),
            element: None,
            top_level: false,
            observer: None,
        })))
    }

    pub fn object() -> Self {
        Self::new(NodeKind::Object, NodeConfig::default())
    }

    pub fn frame(title: impl Into<String>) -> Self {
        Self::new(NodeKind::Frame, NodeConfig::default()).titled(title)
    }

    pub fn array() -> Self {
        Self::new(NodeKind::Array, NodeConfig::default())
    }

    pub fn seq<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let node = Self::new(NodeKind::Seq, NodeConfig::default());
        for value in values {
            node.push(value);
        }
        node
    }

    pub fn titled(self, title: impl Into<String>) -> Self {
        self.0.borrow_mut().config.title = Some(title.into());
        self
    }

    pub fn with_drop_history(self) -> Self {
        self.0.borrow_mut().config.drop_history = true;
        self
    }

    pub fn drop_history_for(self, name: impl Into<Name>) -> Self {
        let name = self.normalize(name.into());
        self.0.borrow_mut().config.drop_history_fields.push(name);
        self
    }

    pub fn hide(self, name: impl Into<Name>) -> Self {
        let name = self.normalize(name.into());
        self.0.borrow_mut().config.hidden.push(name);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.0.borrow().kind
    }

    pub fn config(&self) -> NodeConfig {
        self.0.borrow().config.clone()
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, name: impl Into<Name>) -> Option<Value> {
        let name = self.normalize(name.into());
        self.0.borrow().slots.get(&name).map(|slot| slot.value.clone())
    }

    pub fn path(&self, name: impl Into<Name>) -> Path {
        Path::new(self.clone(), self.normalize(name.into()))
    }

    pub fn contains(&self, name: impl Into<Name>) -> bool {
        let name = self.normalize(name.into());
        self.0.borrow().slots.contains_key(&name)
    }

    pub fn names(&self) -> Vec<Name> {
        self.0.borrow().slots.keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(Name, Value)> {
        self.0
            .borrow()
            .slots
            .iter()
            .map(|(name, slot)| (name.clone(), slot.value.clone()))
            .collect()
    }

    /// Number of live indices of an indexed node, or of named entries otherwise.
    pub fn len(&self) -> usize {
        let data = self.0.borrow();
        if data.kind.is_indexed() {
            data.slots
                .keys()
                .filter(|name| matches!(name, Name::Index(_)))
                .count()
        } else {
            data.slots.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set(&self, name: impl Into<Name>, value: impl Into<Value>) {
        let name = self.normalize(name.into());
        if let Name::Index(index) = name
            && self.kind().is_indexed()
            && index >= self.len()
        {
            self.set_len(index + 1);
        }
        self.store(name, value.into().wrap());
    }

    pub fn push(&self, value: impl Into<Value>) {
        let index = self.len();
        self.set(index, value);
    }

    /// Removes one entry. On an indexed node only the last index may go.
    pub fn delete(&self, name: impl Into<Name>) -> Result<Value, TraceError> {
        let name = self.normalize(name.into());
        if let Name::Index(index) = name
            && self.kind().is_indexed()
        {
            let len = self.len();
            if index + 1 != len && index < len {
                return Err(TraceError::NonContiguous { index, len });
            }
        }
        let removed = self.0.borrow_mut().slots.shift_remove(&name);
        let Some(slot) = removed else {
            return Err(TraceError::NotFound(name));
        };
        if let Some(observer) = self.observer() {
            observer.path_deleted(self, &name, slot.anchor);
        }
        Ok(slot.value)
    }

    /// Grows with empty entries in ascending order or shrinks highest index first.
    pub fn set_len(&self, len: usize) {
        if !self.kind().is_indexed() {
            return;
        }
        let current = self.len();
        for index in current..len {
            self.store(Name::Index(index), Value::empty());
        }
        for index in (len..current).rev() {
            if let Some(observer) = self.observer() {
                observer.path_removing(&self.path(index));
            }
            if self.delete(index).is_err() {
                break;
            }
        }
    }

    /// Visits every path of this node and of the nodes embedded in it.
    pub fn for_each_descendant(&self, f: &mut dyn FnMut(&Name, &Path)) {
        let mut visited = Vec::new();
        self.visit_descendants(f, &mut visited);
    }

    fn visit_descendants(
        &self,
        f: &mut dyn FnMut(&Name, &Path),
        visited: &mut Vec<*const RefCell<NodeData>>,
    ) {
        let key = Rc::as_ptr(&self.0);
        if visited.contains(&key) {
            return;
        }
        visited.push(key);
        for (name, value) in self.entries() {
            f(&name, &Path::new(self.clone(), name.clone()));
            if let Value::Node(child) = &value
                && !child.is_top_level()
            {
                child.visit_descendants(f, visited);
            }
        }
    }

    pub fn element(&self) -> Option<AnchorId> {
        self.0.borrow().element
    }

    pub fn is_attached(&self) -> bool {
        self.element().is_some() && self.observer().is_some()
    }

    pub fn is_top_level(&self) -> bool {
        self.0.borrow().top_level
    }

    pub fn anchor_of(&self, name: &Name) -> Option<AnchorId> {
        let name = self.normalize(name.clone());
        self.0.borrow().slots.get(&name).and_then(|slot| slot.anchor)
    }

    pub(crate) fn attach(&self, observer: Weak<dyn NodeObserver>, element: AnchorId) {
        let mut data = self.0.borrow_mut();
        data.observer = Some(observer);
        data.element = Some(element);
    }

    pub(crate) fn set_top_level(&self, top_level: bool) {
        self.0.borrow_mut().top_level = top_level;
    }

    /// Binds the visual anchor of a path once; later calls return the first binding.
    pub(crate) fn bind_anchor(&self, name: &Name, anchor: AnchorId) -> AnchorId {
        let mut data = self.0.borrow_mut();
        match data.slots.get_mut(name) {
            Some(slot) => *slot.anchor.get_or_insert(anchor),
            None => anchor,
        }
    }

    /// Forgets every visual binding of this node and its embedded nodes.
    pub(crate) fn detach(&self) {
        let children: Vec<Node> = {
            let mut data = self.0.borrow_mut();
            data.observer = None;
            data.element = None;
            data.slots
                .values_mut()
                .filter_map(|slot| {
                    slot.anchor = None;
                    match &slot.value {
                        Value::Node(child) => Some(child.clone()),
                        _ => None,
                    }
                })
                .collect()
        };
        for child in children {
            if child.is_attached() && !child.is_top_level() {
                child.detach();
            }
        }
    }

    fn store(&self, name: Name, value: Value) {
        {
            let mut data = self.0.borrow_mut();
            match data.slots.get_mut(&name) {
                Some(slot) => slot.value = value,
                None => {
                    data.slots.insert(name.clone(), Slot { value, anchor: None });
                }
            }
        }
        if let Some(observer) = self.observer() {
            observer.path_set(self, &name);
        }
    }

    fn observer(&self) -> Option<Rc<dyn NodeObserver>> {
        self.0.borrow().observer.as_ref().and_then(Weak::upgrade)
    }

    fn normalize(&self, name: Name) -> Name {
        match name {
            Name::Field(_) if self.kind().is_indexed() => match name.index() {
                Some(index) => Name::Index(index),
                None => name,
            },
            other => other,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Node")
            .field("kind", &data.kind)
            .field("names", &data.slots.keys().collect::<Vec<_>>())
            .field("element", &data.element)
            .finish()
    }
}

/// The location of one value inside a node.
#[derive(Clone)]
pub struct Path {
    node: Node,
    name: Name,
}

impl Path {
    pub fn new(node: Node, name: Name) -> Self {
        Self { node, name }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn get(&self) -> Option<Value> {
        self.node.get(self.name.clone())
    }

    pub fn value(&self) -> Value {
        self.get().unwrap_or_else(Value::empty)
    }

    pub fn assign(&self, value: impl Into<Value>) {
        self.node.set(self.name.clone(), value);
    }

    pub fn anchor(&self) -> Option<AnchorId> {
        self.node.anchor_of(&self.name)
    }

    pub fn addr(&self) -> Addr {
        Addr::new(self.clone())
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.node.ptr_eq(&other.node) && self.name == other.name
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({}.{})", self.node.kind().label(), self.name)
    }
}

/// A non-owning reference to a path.
#[derive(Debug, Clone, PartialEq)]
pub struct Addr {
    path: Path,
}

impl Addr {
    pub fn new(path: Path) -> Self {
        Self { path }
    }

    pub fn deref(&self) -> &Path {
        &self.path
    }
}
