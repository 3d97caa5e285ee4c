use crate::core::anchor::AnchorId;
use crate::ui::canvas::{Canvas, DANGLING, Visual, VisualKind};
use crate::ui::render::Renderer;
use crate::ui::style::{Color, Style};

/// One styled console line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pieces: Vec<(String, Style)>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().push(text, Style::new())
    }

    pub fn push(mut self, text: impl Into<String>, style: Style) -> Self {
        self.pieces.push((text.into(), style));
        self
    }

    pub fn pieces(&self) -> &[(String, Style)] {
        &self.pieces
    }

    /// The text without styling.
    pub fn text(&self) -> String {
        self.pieces.iter().map(|(text, _)| text.as_str()).collect()
    }
}

/// A text rendition of the arena: every placed item, then the buttons.
/// Anchors learners can act on carry their `#n` id.
pub fn render(renderer: &Renderer) -> Vec<Line> {
    let canvas = renderer.canvas();
    let mut lines = Vec::new();
    for id in canvas.placed() {
        draw(&canvas, id, 0, &mut lines);
    }
    let buttons = renderer.buttons();
    if !buttons.is_empty() {
        let mut line = Line::new();
        for (label, anchor) in buttons {
            let style = canvas
                .visual(anchor)
                .map_or(Style::new(), |visual| Style::for_markers(&visual.markers));
            line = line
                .push(format!("[{anchor} "), Style::new().color(Color::Blue))
                .push(label, style.color(Color::Blue))
                .push("] ", Style::new().color(Color::Blue));
        }
        lines.push(line);
    }
    lines
}

fn draw(canvas: &Canvas, id: AnchorId, depth: usize, lines: &mut Vec<Line>) {
    let Some(visual) = canvas.visual(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    match &visual.kind {
        VisualKind::Table { kind, title } => {
            let heading = title.clone().unwrap_or_else(|| kind.label().to_string());
            lines.push(
                Line::plain(indent)
                    .push(heading, Style::for_markers(&visual.markers).bold())
                    .push(format!(" {id}"), Style::new().color(Color::DarkGrey)),
            );
            for row in &visual.children {
                let Some(row_visual) = canvas.visual(*row) else {
                    continue;
                };
                let VisualKind::Row { name } = &row_visual.kind else {
                    continue;
                };
                let Some(cell) = row_visual.children.first() else {
                    continue;
                };
                let line = Line::plain(format!("{}  {name}: ", "  ".repeat(depth)));
                cell_line(canvas, *cell, depth + 2, line, lines);
            }
        }
        VisualKind::Sequence => {
            let mut line = Line::plain(indent).push("[", Style::new());
            let mut nested = Vec::new();
            for (position, cell) in visual.children.iter().enumerate() {
                if position > 0 {
                    line = line.push(" | ", Style::new());
                }
                match canvas.visual(*cell) {
                    Some(cell_visual) if !cell_visual.children.is_empty() => {
                        line = line.push(format!("{cell}"), Style::new().color(Color::DarkGrey));
                        nested.extend(cell_visual.children.iter().copied());
                    }
                    Some(cell_visual) => line = value_pieces(line, *cell, cell_visual, canvas),
                    None => {}
                }
            }
            line = line
                .push("]", Style::new())
                .push(format!(" {id}"), Style::new().color(Color::DarkGrey));
            lines.push(line);
            for child in nested {
                draw(canvas, child, depth + 1, lines);
            }
        }
        VisualKind::Code => {
            for line_id in &visual.children {
                let Some(code_line) = canvas.visual(*line_id) else {
                    continue;
                };
                let text = code_line.text().unwrap_or_default();
                let tag = if code_line.caps.selectable {
                    format!("{line_id} ")
                } else {
                    "     ".to_string()
                };
                lines.push(
                    Line::plain(&indent)
                        .push(tag, Style::new().color(Color::DarkGrey))
                        .push(text, Style::for_markers(&code_line.markers)),
                );
            }
        }
        VisualKind::Terminal => {
            lines.push(Line::plain(format!("{indent}$ {id}")));
            for line_id in &visual.children {
                let Some(output) = canvas.visual(*line_id) else {
                    continue;
                };
                let mut style = Style::for_markers(&output.markers);
                if matches!(output.kind, VisualKind::TerminalLine { input: true }) {
                    style = style.bold();
                }
                lines.push(
                    Line::plain(format!("{indent}  "))
                        .push(output.text().unwrap_or_default(), style)
                        .push(format!(" {line_id}"), Style::new().color(Color::DarkGrey)),
                );
            }
        }
        _ => {
            let line = Line::plain(indent);
            cell_line(canvas, id, depth, line, lines);
        }
    }
}

fn cell_line(canvas: &Canvas, cell: AnchorId, depth: usize, line: Line, lines: &mut Vec<Line>) {
    let Some(visual) = canvas.visual(cell) else {
        lines.push(line);
        return;
    };
    if visual.children.is_empty() {
        lines.push(value_pieces(line, cell, visual, canvas));
        return;
    }
    lines.push(line.push(format!("{cell}"), Style::new().color(Color::DarkGrey)));
    for child in &visual.children {
        draw(canvas, *child, depth, lines);
    }
}

fn value_pieces(mut line: Line, cell: AnchorId, visual: &Visual, canvas: &Canvas) -> Line {
    for old in visual.history() {
        line = line.push(old, Style::history()).push(" ", Style::new());
    }
    let current = visual.text().unwrap_or_default();
    let style = if visual.dangling {
        Style::new().color(Color::Yellow)
    } else {
        Style::for_markers(&visual.markers)
    };
    line = line.push(current.trim().to_string(), style);
    if let Some(edge) = canvas.edge(cell) {
        line = line.push(format!(" \u{2192} {}", edge.to), Style::new().color(Color::Cyan));
    } else if visual.dangling && current != DANGLING {
        line = line.push(format!(" {DANGLING}"), Style::new().color(Color::Yellow));
    }
    line.push(format!(" {cell}"), Style::new().color(Color::DarkGrey))
}
