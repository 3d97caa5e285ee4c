use crate::config::Language;
use crate::core::anchor::{AnchorId, Capabilities, Marker};
use crate::core::node::{Node, NodeObserver, Path, Shape};
use crate::core::value::{Name, Value};
use crate::ui::canvas::{Canvas, VisualKind};
use crate::ui::geometry::{Point, Rect};
use crate::ui::widgets::Item;
use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Keeps the canvas in step with the value model.
///
/// Nodes notify the renderer after every mutation; the renderer owns the
/// canvas and is the only writer of the incidence index.
pub struct Renderer {
    canvas: RefCell<Canvas>,
    language: Language,
    items: RefCell<IndexMap<AnchorId, Item>>,
    nodes: RefCell<HashMap<AnchorId, Node>>,
    buttons: RefCell<IndexMap<String, AnchorId>>,
    this: Weak<Renderer>,
}

impl Renderer {
    pub fn new(language: Language) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            canvas: RefCell::new(Canvas::new()),
            language,
            items: RefCell::new(IndexMap::new()),
            nodes: RefCell::new(HashMap::new()),
            buttons: RefCell::new(IndexMap::new()),
            this: this.clone(),
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn canvas(&self) -> Ref<'_, Canvas> {
        self.canvas.borrow()
    }

    pub(crate) fn canvas_mut(&self) -> RefMut<'_, Canvas> {
        self.canvas.borrow_mut()
    }

    pub(crate) fn weak(&self) -> Weak<Renderer> {
        self.this.clone()
    }

    /// Top-level items in placement order.
    pub fn items(&self) -> Vec<Item> {
        self.items.borrow().values().cloned().collect()
    }

    pub fn item(&self, element: AnchorId) -> Option<Item> {
        self.items.borrow().get(&element).cloned()
    }

    /// The node rendered by `element`, top-level or embedded.
    pub fn node(&self, element: AnchorId) -> Option<Node> {
        self.nodes.borrow().get(&element).cloned()
    }

    /// Places an item in the arena at grid position `(x, y)`, attaching it first.
    pub fn add(&self, x: f64, y: f64, item: &Item) -> AnchorId {
        let element = match item {
            Item::Node(node) => {
                node.set_top_level(true);
                match node.element() {
                    Some(element) if node.is_attached() => element,
                    _ => self.attach_node(node),
                }
            }
            Item::Code(code) => match code.element() {
                Some(element) => element,
                None => code.attach(self),
            },
            Item::Terminal(terminal) => match terminal.element() {
                Some(element) => element,
                None => terminal.attach(self),
            },
        };
        debug!(%element, item = %item.describe(), x, y, "placing item");
        self.items.borrow_mut().insert(element, item.clone());
        let mut canvas = self.canvas_mut();
        canvas.place(element, Point::new(x, y));
        canvas.resize();
        element
    }

    /// Removes an item and every pointer from or to anything it owns.
    pub fn remove(&self, item: &Item) {
        let mut anchors = Vec::new();
        if let Item::Node(node) = item {
            node.for_each_descendant(&mut |_, path| {
                if let Some(anchor) = path.anchor() {
                    anchors.push(anchor);
                }
            });
        }
        anchors.extend(item.element());
        for anchor in anchors {
            self.remove_pointer_from(anchor);
            self.remove_pointers_to(anchor);
        }
        if let Some(element) = item.element()
            && self.items.borrow_mut().shift_remove(&element).is_some()
        {
            debug!(%element, item = %item.describe(), "removing item");
            self.canvas_mut().discard(element);
            self.forget_discarded();
            self.resize();
        }
        match item {
            Item::Node(node) => {
                node.detach();
                node.set_top_level(false);
            }
            Item::Code(code) => code.detach(),
            Item::Terminal(terminal) => terminal.detach(),
        }
    }

    pub fn add_buttons<S: AsRef<str>>(&self, labels: &[S]) {
        for label in labels {
            let label = label.as_ref();
            if self.buttons.borrow().contains_key(label) {
                continue;
            }
            let anchor = self.canvas_mut().create(
                VisualKind::Button {
                    label: label.to_string(),
                },
                None,
                Capabilities::default().selectable(),
            );
            self.buttons.borrow_mut().insert(label.to_string(), anchor);
        }
    }

    pub fn button(&self, label: &str) -> Option<AnchorId> {
        self.buttons.borrow().get(label).copied()
    }

    pub fn buttons(&self) -> Vec<(String, AnchorId)> {
        self.buttons
            .borrow()
            .iter()
            .map(|(label, anchor)| (label.clone(), *anchor))
            .collect()
    }

    pub fn add_pointer(&self, from: AnchorId, to: AnchorId) {
        let mut canvas = self.canvas_mut();
        canvas.add_pointer(from, to);
        canvas.resize();
    }

    pub fn remove_pointer_from(&self, from: AnchorId) {
        self.canvas_mut().remove_pointer_from(from);
    }

    pub fn remove_pointers_to(&self, to: AnchorId) {
        let sources = self.canvas_mut().remove_pointers_to(to);
        if !sources.is_empty() {
            warn!(target_anchor = %to, ?sources, "pointer target removed, marking dangling");
        }
    }

    pub fn resize(&self) {
        self.canvas_mut().resize();
    }

    pub fn preview(&self, from: AnchorId, to: Rect) {
        self.canvas_mut().preview(from, to);
    }

    pub fn clear_preview(&self) {
        self.canvas_mut().clear_preview();
    }

    pub fn mark(&self, anchor: AnchorId, marker: Marker) {
        self.canvas_mut().mark(anchor, marker);
    }

    pub fn unmark(&self, anchor: AnchorId, marker: Marker) {
        self.canvas_mut().unmark(anchor, marker);
    }

    pub fn clear_marker(&self, marker: Marker) {
        self.canvas_mut().clear_marker(marker);
    }

    pub fn has_marker(&self, anchor: AnchorId, marker: Marker) -> bool {
        self.canvas().has_marker(anchor, marker)
    }

    fn attach_node(&self, node: &Node) -> AnchorId {
        let config = node.config();
        let kind = match node.kind().shape() {
            Shape::Table => VisualKind::Table {
                kind: node.kind(),
                title: config.title.clone(),
            },
            Shape::Sequence => VisualKind::Sequence,
        };
        let element = self.canvas_mut().create(
            kind,
            None,
            Capabilities::default().selectable().target(),
        );
        self.nodes.borrow_mut().insert(element, node.clone());
        let observer: Weak<dyn NodeObserver> = self.this.clone();
        node.attach(observer, element);
        for name in node.names() {
            self.render_path(node, &name);
        }
        element
    }

    /// The value cell of a path, created on first render.
    fn slot_anchor(&self, node: &Node, name: &Name, element: AnchorId) -> AnchorId {
        if let Some(anchor) = node.anchor_of(name)
            && self.canvas().contains(anchor)
        {
            return anchor;
        }
        let config = node.config();
        let mut caps = Capabilities::default().editable().source();
        if self.language.addressable_cells() {
            caps = caps.selectable().target();
        }
        let anchor = {
            let mut canvas = self.canvas_mut();
            let cell = match node.kind().shape() {
                Shape::Table => {
                    let row = canvas.create(
                        VisualKind::Row {
                            name: name.to_string(),
                        },
                        Some(element),
                        Capabilities::NONE,
                    );
                    canvas.create(VisualKind::Value, Some(row), caps)
                }
                Shape::Sequence => canvas.create(VisualKind::Cell, Some(element), caps),
            };
            if let Some(visual) = canvas.visual_mut(cell) {
                visual.drop_history = config.drops_history(name);
            }
            canvas.show_placeholder(cell);
            cell
        };
        node.bind_anchor(name, anchor)
    }

    fn render_path(&self, node: &Node, name: &Name) {
        let Some(element) = node.element() else {
            return;
        };
        if node.config().is_hidden(name) {
            return;
        }
        let Some(value) = node.get(name.clone()) else {
            return;
        };
        let cell = self.slot_anchor(node, name, element);
        match value {
            Value::Scalar(_) | Value::Null => {
                self.release(cell, None);
                self.remove_pointer_from(cell);
                let text = value.display(self.language.null_text()).unwrap_or_default();
                self.canvas_mut().push_text(cell, &text);
            }
            Value::Node(child) if child.is_top_level() => {
                self.release(cell, None);
                self.canvas_mut().show_placeholder(cell);
                match child.element() {
                    Some(target) => self.add_pointer(cell, target),
                    None => self.mark_dangling(cell, name),
                }
            }
            Value::Node(child) => {
                let child_element = match child.element() {
                    Some(element) if child.is_attached() => element,
                    _ => self.attach_node(&child),
                };
                self.remove_pointer_from(cell);
                self.release(cell, Some(child_element));
                self.canvas_mut().embed(cell, child_element);
            }
            Value::Addr(addr) => {
                self.release(cell, None);
                self.canvas_mut().show_placeholder(cell);
                match addr.deref().anchor() {
                    Some(target) => self.add_pointer(cell, target),
                    None => self.mark_dangling(cell, name),
                }
            }
        }
        self.resize();
    }

    fn mark_dangling(&self, cell: AnchorId, name: &Name) {
        warn!(%cell, %name, "pointer target is not rendered");
        let mut canvas = self.canvas_mut();
        canvas.remove_pointer_from(cell);
        if let Some(visual) = canvas.visual_mut(cell) {
            visual.dangling = true;
        }
    }

    /// Drops embedded visuals of a cell other than `keep`.
    fn release(&self, cell: AnchorId, keep: Option<AnchorId>) {
        let children: Vec<AnchorId> = self
            .canvas()
            .visual(cell)
            .map(|visual| visual.children.clone())
            .unwrap_or_default();
        let released: Vec<AnchorId> = children
            .into_iter()
            .filter(|child| Some(*child) != keep)
            .collect();
        if released.is_empty() {
            return;
        }
        for child in released {
            let node = self.nodes.borrow_mut().remove(&child);
            if let Some(node) = node {
                node.detach();
            }
            self.canvas_mut().discard(child);
        }
        self.forget_discarded();
    }

    fn forget_discarded(&self) {
        let canvas = self.canvas.borrow();
        self.nodes
            .borrow_mut()
            .retain(|element, _| canvas.contains(*element));
    }
}

impl NodeObserver for Renderer {
    fn path_set(&self, node: &Node, name: &Name) {
        self.render_path(node, name);
    }

    fn path_deleted(&self, _node: &Node, name: &Name, anchor: Option<AnchorId>) {
        let Some(anchor) = anchor else {
            return;
        };
        debug!(%anchor, %name, "deleting path visual");
        self.release(anchor, None);
        let visual = {
            let canvas = self.canvas();
            canvas.visual(anchor).map(|visual| (visual.kind.clone(), visual.parent))
        };
        let removed = match visual {
            Some((VisualKind::Value, Some(row))) => row,
            _ => anchor,
        };
        self.canvas_mut().discard(removed);
        self.forget_discarded();
        self.resize();
    }

    fn path_removing(&self, path: &Path) {
        let Some(anchor) = path.anchor() else {
            return;
        };
        self.remove_pointer_from(anchor);
        self.remove_pointers_to(anchor);
    }
}
