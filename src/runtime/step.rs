use crate::core::anchor::AnchorId;
use crate::core::node::{Node, Path};
use crate::core::value::Value;
use crate::runtime::answer::Answer;
use crate::ui::widgets::{Code, Item, Terminal};
use std::fmt;

/// Something a learner can point at, resolved to a canvas anchor on demand.
#[derive(Clone, Debug)]
pub enum Target {
    Path(Path),
    Item(Item),
    CodeLine(Code, usize),
    TerminalLine(Terminal, usize),
}

impl Target {
    pub fn anchor(&self) -> Option<AnchorId> {
        match self {
            Self::Path(path) => path.anchor(),
            Self::Item(item) => item.element(),
            Self::CodeLine(code, line) => code.line_anchor(*line),
            Self::TerminalLine(terminal, index) => terminal.line_anchor(*index),
        }
    }

    /// Rendering-independent description used to compare step sequences.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => format!("path {}.{}", path.node().kind().label(), path.name()),
            Self::Item(item) => format!("item {}", item.describe()),
            Self::CodeLine(_, line) => format!("line {line}"),
            Self::TerminalLine(_, index) => format!("output {index}"),
        }
    }
}

impl From<Path> for Target {
    fn from(value: Path) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for Target {
    fn from(value: &Path) -> Self {
        Self::Path(value.clone())
    }
}

impl From<Item> for Target {
    fn from(value: Item) -> Self {
        Self::Item(value)
    }
}

impl From<&Node> for Target {
    fn from(value: &Node) -> Self {
        Self::Item(Item::from(value))
    }
}

impl From<&Code> for Target {
    fn from(value: &Code) -> Self {
        Self::Item(Item::from(value))
    }
}

impl From<&Terminal> for Target {
    fn from(value: &Terminal) -> Self {
        Self::Item(Item::from(value))
    }
}

/// The value a suspended routine resumes with.
#[derive(Clone, Debug, Default)]
pub enum Resume {
    #[default]
    Empty,
    Text(String),
    Value(Value),
    Target(Target),
}

impl Resume {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Start,
    Pause,
    Next,
    Click,
    Select,
    Input,
    Connect,
}

impl StepKind {
    /// Steps the learner has to perform count towards the maximum score.
    pub fn is_scoreable(self) -> bool {
        !matches!(self, Self::Start | Self::Next | Self::Pause)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Next => "next",
            Self::Click => "click",
            Self::Select => "select",
            Self::Input => "input",
            Self::Connect => "connect",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug)]
pub enum Action {
    Start {
        state: serde_json::Value,
    },
    Pause,
    Next,
    Click {
        label: String,
    },
    Select {
        elements: Vec<Target>,
        value: Option<Value>,
    },
    Input {
        /// `None` accepts any non-empty input.
        answer: Option<Answer>,
        element: Option<Target>,
        /// The learner selects `element` before typing.
        select_first: bool,
    },
    Connect {
        source: Target,
        target: Target,
    },
}

type Done = Box<dyn FnOnce(&Resume)>;

pub struct Step {
    pub action: Action,
    pub prompt: String,
    done: Option<Done>,
}

impl Step {
    pub fn new(action: Action, prompt: impl Into<String>) -> Self {
        Self {
            action,
            prompt: prompt.into(),
            done: None,
        }
    }

    pub fn with_done(mut self, done: impl FnOnce(&Resume) + 'static) -> Self {
        self.done = Some(Box::new(done));
        self
    }

    pub fn kind(&self) -> StepKind {
        match self.action {
            Action::Start { .. } => StepKind::Start,
            Action::Pause => StepKind::Pause,
            Action::Next => StepKind::Next,
            Action::Click { .. } => StepKind::Click,
            Action::Select { .. } => StepKind::Select,
            Action::Input { .. } => StepKind::Input,
            Action::Connect { .. } => StepKind::Connect,
        }
    }

    pub fn has_done(&self) -> bool {
        self.done.is_some()
    }

    /// Runs the completion callback; later calls do nothing.
    pub fn complete(&mut self, result: &Resume) {
        if let Some(done) = self.done.take() {
            done(result);
        }
    }

    /// The result the step completes with when the engine performs it.
    pub fn natural_result(&self) -> Resume {
        match &self.action {
            Action::Select { value: Some(value), .. } => Resume::Value(value.clone()),
            Action::Select { elements, .. } => elements
                .first()
                .cloned()
                .map_or(Resume::Empty, Resume::Target),
            Action::Click { label } => Resume::Text(label.clone()),
            Action::Input { answer, .. } => Resume::Text(
                answer
                    .as_ref()
                    .and_then(Answer::preferred)
                    .unwrap_or_default(),
            ),
            Action::Connect { target, .. } => Resume::Target(target.clone()),
            Action::Start { .. } | Action::Pause | Action::Next => Resume::Empty,
        }
    }

    pub fn candidates(&self) -> Vec<&Target> {
        match &self.action {
            Action::Select { elements, .. } => elements.iter().collect(),
            Action::Input {
                element: Some(element),
                ..
            } => vec![element],
            Action::Connect { source, target } => vec![source, target],
            _ => Vec::new(),
        }
    }

    pub fn summary(&self) -> StepSummary {
        StepSummary {
            kind: self.kind(),
            prompt: self.prompt.clone(),
            candidates: self.candidates().into_iter().map(Target::describe).collect(),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("action", &self.action)
            .field("prompt", &self.prompt)
            .field("done", &self.done.is_some())
            .finish()
    }
}

/// Comparable shape of a step: type, prompt and candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSummary {
    pub kind: StepKind,
    pub prompt: String,
    pub candidates: Vec<String>,
}
