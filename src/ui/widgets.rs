use crate::core::anchor::{AnchorId, Capabilities, Marker};
use crate::core::node::Node;
use crate::runtime::answer::Answer;
use crate::runtime::step::{Action, Resume, Step, Target};
use crate::ui::canvas::VisualKind;
use crate::ui::render::Renderer;
use crate::ui::span::Span;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Anything that can be placed in the arena.
#[derive(Clone, Debug)]
pub enum Item {
    Node(Node),
    Code(Code),
    Terminal(Terminal),
}

impl Item {
    pub fn element(&self) -> Option<AnchorId> {
        match self {
            Self::Node(node) => node.element(),
            Self::Code(code) => code.element(),
            Self::Terminal(terminal) => terminal.element(),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn same(&self, other: &Item) -> bool {
        match (self, other) {
            (Self::Node(a), Self::Node(b)) => a.ptr_eq(b),
            (Self::Code(a), Self::Code(b)) => Rc::ptr_eq(&a.0, &b.0),
            (Self::Terminal(a), Self::Terminal(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Node(node) => match node.config().title {
                Some(title) => format!("{} {title}", node.kind().label()),
                None => node.kind().label().to_string(),
            },
            Self::Code(_) => "code".to_string(),
            Self::Terminal(_) => "terminal".to_string(),
        }
    }
}

impl From<Node> for Item {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<&Node> for Item {
    fn from(value: &Node) -> Self {
        Self::Node(value.clone())
    }
}

impl From<Code> for Item {
    fn from(value: Code) -> Self {
        Self::Code(value)
    }
}

impl From<&Code> for Item {
    fn from(value: &Code) -> Self {
        Self::Code(value.clone())
    }
}

impl From<Terminal> for Item {
    fn from(value: Terminal) -> Self {
        Self::Terminal(value)
    }
}

impl From<&Terminal> for Item {
    fn from(value: &Terminal) -> Self {
        Self::Terminal(value.clone())
    }
}

const CLICK_LINE: &str = "Click on the next line to be executed.";
const NEXT_OUTPUT: &str = "Enter the next output";

struct CodeData {
    lines: Vec<String>,
    current: usize,
    element: Option<AnchorId>,
    anchors: Vec<AnchorId>,
    renderer: Weak<Renderer>,
}

/// A program listing with a current-line highlight. Lines are numbered from 1.
#[derive(Clone)]
pub struct Code(Rc<RefCell<CodeData>>);

impl Code {
    pub fn new(source: &str) -> Self {
        let lines: Vec<&str> = source.split('\n').collect();
        let start = lines
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(lines.len());
        let end = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(start, |end| end + 1);
        Self(Rc::new(RefCell::new(CodeData {
            lines: lines[start..end.max(start)]
                .iter()
                .map(|line| line.to_string())
                .collect(),
            current: 0,
            element: None,
            anchors: Vec::new(),
            renderer: Weak::new(),
        })))
    }

    pub fn is_selectable(line: &str) -> bool {
        !matches!(
            line.trim(),
            "" | "{" | "}" | "else" | "else:" | "else :" | "do"
        )
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().lines.clone()
    }

    pub fn current_line(&self) -> usize {
        self.0.borrow().current
    }

    /// First selectable line after the current one.
    pub fn next_line(&self) -> Option<usize> {
        let data = self.0.borrow();
        (data.current + 1..=data.lines.len()).find(|line| Self::is_selectable(&data.lines[line - 1]))
    }

    /// Moves the highlight; `None` moves it to the next selectable line.
    pub fn go(&self, line: Option<usize>) -> &Self {
        let line = line.or_else(|| self.next_line()).unwrap_or(0);
        let (previous, renderer) = {
            let mut data = self.0.borrow_mut();
            let previous = data.current;
            data.current = line;
            (previous, data.renderer.upgrade())
        };
        if let Some(renderer) = renderer {
            if let Some(anchor) = self.line_anchor(previous) {
                renderer.unmark(anchor, Marker::CurrentLine);
            }
            if let Some(anchor) = self.line_anchor(line) {
                renderer.mark(anchor, Marker::CurrentLine);
            }
        }
        self
    }

    /// A select step over `lines` (the next line when empty); completing it
    /// moves the highlight to the first of them.
    pub fn ask(&self, lines: &[usize], prompt: Option<&str>) -> Step {
        let lines: Vec<usize> = if lines.is_empty() {
            self.next_line().into_iter().collect()
        } else {
            lines.to_vec()
        };
        let first = lines.first().copied();
        let code = self.clone();
        Step::new(
            Action::Select {
                elements: lines
                    .into_iter()
                    .map(|line| Target::CodeLine(self.clone(), line))
                    .collect(),
                value: None,
            },
            prompt.unwrap_or(CLICK_LINE),
        )
        .with_done(move |_| {
            code.go(first);
        })
    }

    pub fn element(&self) -> Option<AnchorId> {
        self.0.borrow().element
    }

    pub fn line_anchor(&self, line: usize) -> Option<AnchorId> {
        let data = self.0.borrow();
        line.checked_sub(1)
            .and_then(|index| data.anchors.get(index))
            .copied()
    }

    pub(crate) fn attach(&self, renderer: &Renderer) -> AnchorId {
        let lines = self.lines();
        let (element, anchors) = {
            let mut canvas = renderer.canvas_mut();
            let element = canvas.create(VisualKind::Code, None, Capabilities::NONE);
            let anchors: Vec<AnchorId> = lines
                .iter()
                .map(|line| {
                    let caps = if Self::is_selectable(line) {
                        Capabilities::default().selectable()
                    } else {
                        Capabilities::NONE
                    };
                    let anchor = canvas.create(VisualKind::CodeLine, Some(element), caps);
                    canvas.set_spans(anchor, vec![Span::new(line.as_str())]);
                    anchor
                })
                .collect();
            (element, anchors)
        };
        {
            let mut data = self.0.borrow_mut();
            data.element = Some(element);
            data.anchors = anchors;
            data.renderer = renderer.weak();
        }
        self.go(Some(1));
        element
    }

    pub(crate) fn detach(&self) {
        let mut data = self.0.borrow_mut();
        data.element = None;
        data.anchors.clear();
        data.renderer = Weak::new();
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Code")
            .field("lines", &data.lines.len())
            .field("current", &data.current)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub text: String,
    /// Echoed learner input.
    pub input: bool,
    closed: bool,
}

struct TerminalData {
    lines: Vec<TerminalLine>,
    element: Option<AnchorId>,
    anchors: Vec<AnchorId>,
    renderer: Weak<Renderer>,
}

/// Console output of the traced program.
#[derive(Clone)]
pub struct Terminal(Rc<RefCell<TerminalData>>);

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TerminalData {
            lines: Vec::new(),
            element: None,
            anchors: Vec::new(),
            renderer: Weak::new(),
        })))
    }

    pub fn print(&self, text: &str) -> &Self {
        {
            let mut data = self.0.borrow_mut();
            match data.lines.last_mut() {
                Some(line) if !line.closed && !line.input => line.text.push_str(text),
                _ => data.lines.push(TerminalLine {
                    text: text.to_string(),
                    input: false,
                    closed: false,
                }),
            }
        }
        self.sync();
        self
    }

    pub fn println(&self, text: &str) -> &Self {
        self.print(text);
        if let Some(line) = self.0.borrow_mut().lines.last_mut() {
            line.closed = true;
        }
        self
    }

    pub fn input(&self, text: &str) -> &Self {
        self.push_line(text, true);
        self.sync();
        self
    }

    /// An input step over a fresh line. Without an expected text any
    /// non-empty answer is accepted and echoed as input.
    pub fn ask(&self, expected: Option<&str>) -> Step {
        let index = self.push_line("", expected.is_none());
        self.sync();
        let terminal = self.clone();
        let expected = expected.map(str::to_string);
        Step::new(
            Action::Input {
                answer: expected.clone().map(Answer::from),
                element: Some(Target::TerminalLine(self.clone(), index)),
                select_first: false,
            },
            NEXT_OUTPUT,
        )
        .with_done(move |resume| {
            let text = match (&expected, resume) {
                (Some(text), _) => text.clone(),
                (None, Resume::Text(typed)) => typed.clone(),
                (None, _) => String::new(),
            };
            terminal.set_line(index, &text);
        })
    }

    pub fn lines(&self) -> Vec<TerminalLine> {
        self.0.borrow().lines.clone()
    }

    pub fn element(&self) -> Option<AnchorId> {
        self.0.borrow().element
    }

    pub fn line_anchor(&self, index: usize) -> Option<AnchorId> {
        self.0.borrow().anchors.get(index).copied()
    }

    fn push_line(&self, text: &str, input: bool) -> usize {
        let mut data = self.0.borrow_mut();
        if let Some(last) = data.lines.last_mut() {
            last.closed = true;
        }
        data.lines.push(TerminalLine {
            text: text.to_string(),
            input,
            closed: true,
        });
        data.lines.len() - 1
    }

    fn set_line(&self, index: usize, text: &str) {
        if let Some(line) = self.0.borrow_mut().lines.get_mut(index) {
            line.text = text.to_string();
        }
        self.sync();
    }

    /// Brings the canvas lines up to date with the buffered output.
    fn sync(&self) {
        let (element, renderer) = {
            let data = self.0.borrow();
            (data.element, data.renderer.upgrade())
        };
        let (Some(element), Some(renderer)) = (element, renderer) else {
            return;
        };
        let lines = self.lines();
        let mut anchors = self.0.borrow().anchors.clone();
        {
            let mut canvas = renderer.canvas_mut();
            for (index, line) in lines.iter().enumerate() {
                let anchor = match anchors.get(index) {
                    Some(anchor) => *anchor,
                    None => {
                        let anchor = canvas.create(
                            VisualKind::TerminalLine { input: line.input },
                            Some(element),
                            Capabilities::default().editable(),
                        );
                        anchors.push(anchor);
                        anchor
                    }
                };
                canvas.set_spans(anchor, vec![Span::new(line.text.as_str())]);
            }
        }
        self.0.borrow_mut().anchors = anchors;
        renderer.resize();
    }

    pub(crate) fn attach(&self, renderer: &Renderer) -> AnchorId {
        let element = renderer
            .canvas_mut()
            .create(VisualKind::Terminal, None, Capabilities::NONE);
        {
            let mut data = self.0.borrow_mut();
            data.element = Some(element);
            data.anchors.clear();
            data.renderer = renderer.weak();
        }
        self.sync();
        element
    }

    pub(crate) fn detach(&self) {
        let mut data = self.0.borrow_mut();
        data.element = None;
        data.anchors.clear();
        data.renderer = Weak::new();
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("lines", &self.0.borrow().lines.len())
            .finish()
    }
}
