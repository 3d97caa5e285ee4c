use crate::core::anchor::{AnchorId, Capabilities, Marker};
use crate::core::node::NodeKind;
use crate::ui::geometry::{Point, Rect, Size};
use crate::ui::route::Route;
use crate::ui::span::{self, Span};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use unicode_width::UnicodeWidthStr;

const GRID_X: f64 = 4.0;
const GRID_Y: f64 = 2.75;
const CHAR_WIDTH: f64 = 0.6;
const ROW_HEIGHT: f64 = 1.5;
const LINE_HEIGHT: f64 = 1.25;
const TITLE_HEIGHT: f64 = 1.25;
const PADDING: f64 = 0.25;
const SPAN_GAP: f64 = 0.3;
const MIN_VALUE_WIDTH: f64 = 2.0;
const MIN_CELL_WIDTH: f64 = 1.5;
const MIN_BLOCK_WIDTH: f64 = 4.0;

pub const DANGLING: &str = "\u{26A0}";

#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    Table {
        kind: NodeKind,
        title: Option<String>,
    },
    Sequence,
    /// A name/value row of a table; its single child is the value cell.
    Row {
        name: String,
    },
    Value,
    Cell,
    Code,
    CodeLine,
    Terminal,
    TerminalLine {
        input: bool,
    },
    Button {
        label: String,
    },
}

impl VisualKind {
    fn is_box(&self) -> bool {
        matches!(
            self,
            Self::Table { .. } | Self::Sequence | Self::Code | Self::Terminal
        )
    }
}

#[derive(Debug, Clone)]
pub struct Visual {
    pub kind: VisualKind,
    pub parent: Option<AnchorId>,
    pub children: Vec<AnchorId>,
    pub spans: Vec<Span>,
    pub caps: Capabilities,
    pub markers: BTreeSet<Marker>,
    pub drop_history: bool,
    pub dangling: bool,
    pub bounds: Rect,
}

impl Visual {
    fn new(kind: VisualKind, parent: Option<AnchorId>, caps: Capabilities) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            spans: Vec::new(),
            caps,
            markers: BTreeSet::new(),
            drop_history: false,
            dangling: false,
            bounds: Rect::default(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        span::current_text(&self.spans)
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.spans
            .iter()
            .filter(|span| span.history)
            .map(|span| span.text.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub to: AnchorId,
    pub route: Route,
}

/// The arena: every visual element, top-level placements, and the
/// incidence index of drawn pointers.
#[derive(Debug, Default)]
pub struct Canvas {
    visuals: IndexMap<AnchorId, Visual>,
    placed: IndexMap<AnchorId, Point>,
    edges: IndexMap<AnchorId, Edge>,
    incoming: IndexMap<AnchorId, IndexSet<AnchorId>>,
    rubber_band: Option<(AnchorId, Route)>,
    viewport: Size,
    next_id: u32,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        kind: VisualKind,
        parent: Option<AnchorId>,
        caps: Capabilities,
    ) -> AnchorId {
        let id = AnchorId::new(self.next_id);
        self.next_id += 1;
        self.visuals.insert(id, Visual::new(kind, parent, caps));
        if let Some(parent) = parent
            && let Some(visual) = self.visuals.get_mut(&parent)
        {
            visual.children.push(id);
        }
        id
    }

    pub fn visual(&self, id: AnchorId) -> Option<&Visual> {
        self.visuals.get(&id)
    }

    pub fn visual_mut(&mut self, id: AnchorId) -> Option<&mut Visual> {
        self.visuals.get_mut(&id)
    }

    pub fn contains(&self, id: AnchorId) -> bool {
        self.visuals.contains_key(&id)
    }

    pub fn visuals(&self) -> impl Iterator<Item = (AnchorId, &Visual)> {
        self.visuals.iter().map(|(id, visual)| (*id, visual))
    }

    pub fn caps(&self, id: AnchorId) -> Capabilities {
        self.visual(id).map(|v| v.caps).unwrap_or(Capabilities::NONE)
    }

    pub fn text(&self, id: AnchorId) -> Option<&str> {
        self.visual(id).and_then(Visual::text)
    }

    pub fn bounds(&self, id: AnchorId) -> Option<Rect> {
        self.visual(id).map(|v| v.bounds)
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Removes a visual and everything inside it; edges touching any of
    /// them leave the incidence index.
    pub fn discard(&mut self, id: AnchorId) {
        let Some(visual) = self.visuals.get(&id) else {
            return;
        };
        if let Some(parent) = visual.parent
            && let Some(parent) = self.visuals.get_mut(&parent)
        {
            parent.children.retain(|child| *child != id);
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            self.remove_pointer_from(current);
            self.remove_pointers_to(current);
            self.placed.shift_remove(&current);
            if let Some(visual) = self.visuals.shift_remove(&current) {
                stack.extend(visual.children);
            }
        }
    }

    pub fn place(&mut self, id: AnchorId, position: Point) {
        self.placed.insert(id, position);
    }

    pub fn placed(&self) -> impl Iterator<Item = AnchorId> + '_ {
        self.placed.keys().copied()
    }

    pub fn push_text(&mut self, id: AnchorId, text: &str) {
        if let Some(visual) = self.visuals.get_mut(&id) {
            if visual.dangling {
                visual.spans.clear();
                visual.dangling = false;
            }
            let drop_history = visual.drop_history;
            span::push_value(&mut visual.spans, text, drop_history);
        }
    }

    pub fn set_spans(&mut self, id: AnchorId, spans: Vec<Span>) {
        if let Some(visual) = self.visuals.get_mut(&id) {
            visual.spans = spans;
        }
    }

    /// Shows a cell as the tail of a pointer.
    pub fn show_placeholder(&mut self, id: AnchorId) {
        if let Some(visual) = self.visuals.get_mut(&id) {
            visual.dangling = false;
            visual.spans = vec![Span::placeholder()];
        }
    }

    pub fn embed(&mut self, cell: AnchorId, child: AnchorId) {
        let previous_parent = self.visual(child).and_then(|v| v.parent);
        if let Some(previous) = previous_parent
            && let Some(visual) = self.visuals.get_mut(&previous)
        {
            visual.children.retain(|c| *c != child);
        }
        if let Some(visual) = self.visuals.get_mut(&cell) {
            visual.spans.clear();
            visual.children = vec![child];
        }
        if let Some(visual) = self.visuals.get_mut(&child) {
            visual.parent = Some(cell);
        }
    }

    /// Nearest enclosing box (table, sequence, code, terminal) of an anchor.
    pub fn container_of(&self, id: AnchorId) -> Option<AnchorId> {
        let mut current = self.visual(id)?.parent;
        while let Some(candidate) = current {
            let visual = self.visual(candidate)?;
            if visual.kind.is_box() {
                return Some(candidate);
            }
            current = visual.parent;
        }
        None
    }

    pub fn mark(&mut self, id: AnchorId, marker: Marker) {
        if let Some(visual) = self.visuals.get_mut(&id) {
            visual.markers.insert(marker);
        }
    }

    pub fn unmark(&mut self, id: AnchorId, marker: Marker) {
        if let Some(visual) = self.visuals.get_mut(&id) {
            visual.markers.remove(&marker);
        }
    }

    pub fn has_marker(&self, id: AnchorId, marker: Marker) -> bool {
        self.visual(id)
            .is_some_and(|visual| visual.markers.contains(&marker))
    }

    pub fn clear_marker(&mut self, marker: Marker) {
        for visual in self.visuals.values_mut() {
            visual.markers.remove(&marker);
        }
    }

    /// Records an edge; a source keeps at most one outgoing edge.
    pub fn add_pointer(&mut self, from: AnchorId, to: AnchorId) {
        self.remove_pointer_from(from);
        let attachment = {
            let sources = self.incoming.entry(to).or_default();
            sources.insert(from);
            sources.len()
        };
        let route = self.route_for(from, self.bounds(to).unwrap_or_default(), attachment);
        self.edges.insert(from, Edge { to, route });
        if let Some(visual) = self.visuals.get_mut(&from) {
            visual.dangling = false;
        }
    }

    pub fn remove_pointer_from(&mut self, from: AnchorId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&from)?;
        if let Some(sources) = self.incoming.get_mut(&edge.to) {
            sources.shift_remove(&from);
            if sources.is_empty() {
                self.incoming.shift_remove(&edge.to);
            }
        }
        Some(edge)
    }

    /// Drops every edge ending at `to` and flags each source as dangling.
    pub fn remove_pointers_to(&mut self, to: AnchorId) -> Vec<AnchorId> {
        let sources: Vec<AnchorId> = self
            .incoming
            .get(&to)
            .map(|sources| sources.iter().copied().collect())
            .unwrap_or_default();
        for source in &sources {
            self.remove_pointer_from(*source);
            if let Some(visual) = self.visuals.get_mut(source) {
                visual.dangling = true;
                visual.spans = vec![Span::new(DANGLING)];
            }
        }
        sources
    }

    pub fn edge(&self, from: AnchorId) -> Option<&Edge> {
        self.edges.get(&from)
    }

    pub fn edges(&self) -> impl Iterator<Item = (AnchorId, &Edge)> {
        self.edges.iter().map(|(from, edge)| (*from, edge))
    }

    pub fn incoming(&self, to: AnchorId) -> Vec<AnchorId> {
        self.incoming
            .get(&to)
            .map(|sources| sources.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Draws the transient edge from a pending connect source.
    pub fn preview(&mut self, from: AnchorId, to: Rect) {
        let route = self.route_for(from, to, 1);
        self.rubber_band = Some((from, route));
        self.update_viewport();
    }

    pub fn clear_preview(&mut self) {
        if self.rubber_band.take().is_some() {
            self.update_viewport();
        }
    }

    pub fn rubber_band(&self) -> Option<&Route> {
        self.rubber_band.as_ref().map(|(_, route)| route)
    }

    /// Deepest interactive visual whose bounds contain the point.
    pub fn anchor_at(&self, point: Point) -> Option<AnchorId> {
        let mut found = None;
        let mut candidates: Vec<AnchorId> = self.placed.keys().copied().collect();
        while let Some(id) = candidates.pop() {
            let Some(visual) = self.visual(id) else {
                continue;
            };
            if visual.bounds.contains(point) {
                if visual.caps != Capabilities::NONE {
                    found = Some(id);
                }
                candidates = visual.children.clone();
            }
        }
        found
    }

    /// Lays out placed items, re-routes every edge and grows the viewport.
    pub fn resize(&mut self) {
        self.layout();
        self.reroute();
        self.update_viewport();
    }

    fn layout(&mut self) {
        let placed: Vec<(AnchorId, Point)> = self.placed.iter().map(|(id, p)| (*id, *p)).collect();
        for (id, position) in placed {
            let size = self.measure(id);
            let origin = Point::new(position.x * GRID_X, position.y * GRID_Y);
            self.arrange(id, Rect::at(origin, size));
        }
    }

    fn reroute(&mut self) {
        let edges: Vec<(AnchorId, AnchorId)> =
            self.edges.iter().map(|(from, edge)| (*from, edge.to)).collect();
        for (from, to) in edges {
            let attachment = self
                .incoming
                .get(&to)
                .and_then(|sources| sources.get_index_of(&from))
                .map_or(1, |index| index + 1);
            let route = self.route_for(from, self.bounds(to).unwrap_or_default(), attachment);
            if let Some(edge) = self.edges.get_mut(&from) {
                edge.route = route;
            }
        }
    }

    fn update_viewport(&mut self) {
        let mut extent = Size::default();
        for id in self.placed.keys() {
            if let Some(bounds) = self.bounds(*id) {
                extent.width = extent.width.max(bounds.right());
                extent.height = extent.height.max(bounds.bottom());
            }
        }
        let routes = self
            .edges
            .values()
            .map(|edge| edge.route.bounds())
            .chain(self.rubber_band.iter().map(|(_, route)| route.bounds()))
            .reduce(|a, b| a.union(&b));
        self.viewport = match routes {
            None => Size::new(extent.width * 1.15, extent.height),
            Some(routes) => Size::new(
                extent.width.max(routes.right()) + 0.1,
                extent.height.max(routes.bottom()),
            ),
        };
    }

    fn route_for(&self, from: AnchorId, to: Rect, attachment: usize) -> Route {
        let from_bounds = self.bounds(from).unwrap_or_default();
        let outer = self
            .container_of(from)
            .and_then(|container| self.bounds(container))
            .unwrap_or(from_bounds);
        Route::between(from_bounds, outer, to, attachment)
    }

    fn measure(&self, id: AnchorId) -> Size {
        let Some(visual) = self.visual(id) else {
            return Size::default();
        };
        match &visual.kind {
            VisualKind::Table { title, .. } => {
                let metrics = self.table_metrics(id, title.as_deref());
                let title_width = title.as_deref().map_or(0.0, text_width) + 2.0 * PADDING;
                let height = metrics.title_height + metrics.row_heights.iter().sum::<f64>();
                Size::new(
                    (metrics.name_width + metrics.value_width).max(title_width),
                    height.max(PADDING * 2.0),
                )
            }
            VisualKind::Sequence => {
                let cells: Vec<Size> = visual.children.iter().map(|c| self.measure(*c)).collect();
                let width: f64 = cells.iter().map(|s| s.width).sum();
                let height = cells.iter().map(|s| s.height).fold(ROW_HEIGHT, f64::max);
                Size::new(width.max(PADDING * 2.0), height)
            }
            VisualKind::Row { .. } => visual
                .children
                .first()
                .map_or(Size::new(MIN_VALUE_WIDTH, ROW_HEIGHT), |cell| self.measure(*cell)),
            VisualKind::Value | VisualKind::Cell => match visual.children.first() {
                Some(child) => {
                    let inner = self.measure(*child);
                    Size::new(
                        (inner.width + 2.0 * PADDING).max(MIN_CELL_WIDTH),
                        (inner.height + 2.0 * PADDING).max(ROW_HEIGHT),
                    )
                }
                None => {
                    let width: f64 = visual
                        .spans
                        .iter()
                        .map(|span| span.width() as f64 * CHAR_WIDTH + SPAN_GAP)
                        .sum();
                    Size::new(width.max(MIN_CELL_WIDTH), ROW_HEIGHT)
                }
            },
            VisualKind::Code | VisualKind::Terminal => {
                let width = visual
                    .children
                    .iter()
                    .map(|line| self.measure(*line).width)
                    .fold(MIN_BLOCK_WIDTH, f64::max);
                let height = (visual.children.len() as f64 * LINE_HEIGHT).max(LINE_HEIGHT);
                Size::new(width, height)
            }
            VisualKind::CodeLine | VisualKind::TerminalLine { .. } => {
                let width: usize = visual.spans.iter().map(Span::width).sum();
                Size::new(width as f64 * CHAR_WIDTH + 2.0 * PADDING, LINE_HEIGHT)
            }
            VisualKind::Button { label } => {
                Size::new(text_width(label) + 2.0 * PADDING, ROW_HEIGHT)
            }
        }
    }

    fn table_metrics(&self, id: AnchorId, title: Option<&str>) -> TableMetrics {
        let rows = self.visual(id).map(|v| v.children.clone()).unwrap_or_default();
        let mut name_width: f64 = 1.0;
        let mut value_width = MIN_VALUE_WIDTH;
        let mut row_heights = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(visual) = self.visual(*row) else {
                continue;
            };
            if let VisualKind::Row { name } = &visual.kind {
                name_width = name_width.max(text_width(name) + 2.0 * PADDING);
            }
            let cell = self.measure(*row);
            value_width = value_width.max(cell.width);
            row_heights.push(cell.height.max(ROW_HEIGHT));
        }
        TableMetrics {
            title_height: if title.is_some() { TITLE_HEIGHT } else { 0.0 },
            name_width,
            value_width,
            row_heights,
        }
    }

    fn arrange(&mut self, id: AnchorId, rect: Rect) {
        let Some(visual) = self.visuals.get_mut(&id) else {
            return;
        };
        visual.bounds = rect;
        let kind = visual.kind.clone();
        let children = visual.children.clone();
        match kind {
            VisualKind::Table { title, .. } => {
                let metrics = self.table_metrics(id, title.as_deref());
                let mut y = rect.y + metrics.title_height;
                for (row, height) in children.iter().zip(metrics.row_heights) {
                    let row_rect = Rect::new(rect.x, y, rect.width, height);
                    if let Some(visual) = self.visuals.get_mut(row) {
                        visual.bounds = row_rect;
                    }
                    let cells = self.visual(*row).map(|v| v.children.clone()).unwrap_or_default();
                    for cell in cells {
                        let cell_rect = Rect::new(
                            rect.x + metrics.name_width,
                            y,
                            rect.width - metrics.name_width,
                            height,
                        );
                        self.arrange(cell, cell_rect);
                    }
                    y += height;
                }
            }
            VisualKind::Sequence => {
                let mut x = rect.x;
                for cell in children {
                    let size = self.measure(cell);
                    self.arrange(cell, Rect::new(x, rect.y, size.width, rect.height));
                    x += size.width;
                }
            }
            VisualKind::Value | VisualKind::Cell | VisualKind::Row { .. } => {
                if let Some(child) = children.first() {
                    let size = self.measure(*child);
                    let origin = Point::new(rect.x + PADDING, rect.y + PADDING);
                    self.arrange(*child, Rect::at(origin, size));
                }
            }
            VisualKind::Code | VisualKind::Terminal => {
                let mut y = rect.y;
                for line in children {
                    self.arrange(line, Rect::new(rect.x, y, rect.width, LINE_HEIGHT));
                    y += LINE_HEIGHT;
                }
            }
            VisualKind::CodeLine | VisualKind::TerminalLine { .. } | VisualKind::Button { .. } => {}
        }
    }
}

struct TableMetrics {
    title_height: f64,
    name_width: f64,
    value_width: f64,
    row_heights: Vec<f64>,
}

fn text_width(text: &str) -> f64 {
    text.width() as f64 * CHAR_WIDTH
}

#[cfg(test)]
mod tests {
    use super::{Canvas, DANGLING, VisualKind};
    use crate::core::anchor::{AnchorId, Capabilities, Marker};
    use crate::core::node::NodeKind;
    use crate::ui::geometry::{Point, Rect};
    use crate::ui::route::RouteShape;

    fn table(canvas: &mut Canvas, at: Point, fields: &[&str]) -> (AnchorId, Vec<AnchorId>) {
        let table = canvas.create(
            VisualKind::Table {
                kind: NodeKind::Object,
                title: None,
            },
            None,
            Capabilities::default().selectable().target(),
        );
        let cells = fields
            .iter()
            .map(|name| {
                let row = canvas.create(
                    VisualKind::Row {
                        name: name.to_string(),
                    },
                    Some(table),
                    Capabilities::NONE,
                );
                let cell = canvas.create(
                    VisualKind::Value,
                    Some(row),
                    Capabilities::default().editable().source(),
                );
                canvas.push_text(cell, "");
                cell
            })
            .collect();
        canvas.place(table, at);
        (table, cells)
    }

    #[test]
    fn rows_stack_below_each_other() {
        let mut canvas = Canvas::new();
        let (table, cells) = table(&mut canvas, Point::new(1.0, 2.0), &["a", "b"]);
        canvas.resize();

        let outer = canvas.bounds(table).expect("table bounds");
        assert_eq!((outer.x, outer.y), (4.0, 5.5));
        let first = canvas.bounds(cells[0]).expect("cell bounds");
        let second = canvas.bounds(cells[1]).expect("cell bounds");
        assert_eq!(second.y, first.bottom());
        assert_eq!(canvas.container_of(cells[0]), Some(table));
    }

    #[test]
    fn one_outgoing_edge_per_source() {
        let mut canvas = Canvas::new();
        let (a, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["next"]);
        let (b, _) = table(&mut canvas, Point::new(4.0, 0.0), &["next"]);
        canvas.resize();

        canvas.add_pointer(cells[0], b);
        canvas.add_pointer(cells[0], a);

        assert_eq!(canvas.edges().count(), 1);
        assert_eq!(canvas.edge(cells[0]).map(|e| e.to), Some(a));
        assert!(canvas.incoming(b).is_empty());
        assert_eq!(canvas.incoming(a), vec![cells[0]]);
    }

    #[test]
    fn removing_target_marks_sources_dangling() {
        let mut canvas = Canvas::new();
        let (_, left) = table(&mut canvas, Point::new(0.0, 0.0), &["p", "q"]);
        let (b, _) = table(&mut canvas, Point::new(4.0, 0.0), &["x"]);
        canvas.resize();
        canvas.add_pointer(left[0], b);
        canvas.add_pointer(left[1], b);

        let sources = canvas.remove_pointers_to(b);

        assert_eq!(sources, vec![left[0], left[1]]);
        assert_eq!(canvas.edges().count(), 0);
        assert_eq!(canvas.text(left[0]), Some(DANGLING));
        assert!(canvas.visual(left[1]).is_some_and(|v| v.dangling));
    }

    #[test]
    fn discard_drops_edges_of_removed_visuals() {
        let mut canvas = Canvas::new();
        let (a, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["next"]);
        let (b, _) = table(&mut canvas, Point::new(4.0, 0.0), &[]);
        canvas.resize();
        canvas.add_pointer(cells[0], b);

        canvas.discard(a);

        assert!(!canvas.contains(cells[0]));
        assert_eq!(canvas.edges().count(), 0);
        assert!(canvas.incoming(b).is_empty());
    }

    #[test]
    fn forward_edge_between_side_by_side_tables() {
        let mut canvas = Canvas::new();
        let (_, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["next"]);
        let (b, _) = table(&mut canvas, Point::new(3.0, 1.0), &["value"]);
        canvas.add_pointer(cells[0], b);
        canvas.resize();

        let edge = canvas.edge(cells[0]).expect("edge");
        assert_eq!(edge.route.shape, RouteShape::Forward);
    }

    #[test]
    fn viewport_grows_with_content() {
        let mut canvas = Canvas::new();
        let (_, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["x"]);
        canvas.resize();
        let small = canvas.viewport();

        let (b, _) = table(&mut canvas, Point::new(5.0, 3.0), &["y"]);
        canvas.add_pointer(cells[0], b);
        canvas.resize();
        let large = canvas.viewport();

        assert!(large.width > small.width);
        assert!(large.height > small.height);
        let far = canvas.bounds(b).expect("bounds");
        assert!(large.width >= far.right());
    }

    #[test]
    fn rubber_band_appears_and_clears() {
        let mut canvas = Canvas::new();
        let (_, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["x"]);
        canvas.resize();

        canvas.preview(cells[0], Rect::point(Point::new(12.0, 6.0)));
        assert!(canvas.rubber_band().is_some());
        canvas.clear_preview();
        assert!(canvas.rubber_band().is_none());
    }

    #[test]
    fn hit_test_finds_innermost_visual() {
        let mut canvas = Canvas::new();
        let (table_id, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["x"]);
        canvas.resize();

        let cell = canvas.bounds(cells[0]).expect("bounds");
        assert_eq!(canvas.anchor_at(cell.center()), Some(cells[0]));
        let outer = canvas.bounds(table_id).expect("bounds");
        assert_eq!(
            canvas.anchor_at(Point::new(outer.x + 0.1, outer.y + 0.1)),
            Some(table_id)
        );
        assert_eq!(canvas.anchor_at(Point::new(100.0, 100.0)), None);
    }

    #[test]
    fn markers_clear_across_canvas() {
        let mut canvas = Canvas::new();
        let (a, cells) = table(&mut canvas, Point::new(0.0, 0.0), &["x"]);
        canvas.mark(a, Marker::Bad);
        canvas.mark(cells[0], Marker::Bad);
        canvas.mark(cells[0], Marker::Good);

        canvas.clear_marker(Marker::Bad);

        assert!(!canvas.has_marker(a, Marker::Bad));
        assert!(canvas.has_marker(cells[0], Marker::Good));
    }
}
