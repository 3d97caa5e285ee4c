use crate::core::anchor::AnchorId;
use crate::ui::geometry::Point;

/// Something the learner did.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnerEvent {
    /// Click on a canvas anchor.
    Activate(AnchorId),
    /// Click on a named button.
    Button(String),
    /// Keystroke in the open editor; carries the draft so far.
    Edit(String),
    /// Enter in the open editor.
    Submit(String),
    /// Pointer moved while an arrow is being drawn.
    Hover(Point),
    Next,
    ShowMe,
}

impl LearnerEvent {
    pub fn activate(anchor: AnchorId) -> Self {
        Self::Activate(anchor)
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::Button(label.into())
    }

    pub fn submit(text: impl Into<String>) -> Self {
        Self::Submit(text.into())
    }

    pub fn edit(text: impl Into<String>) -> Self {
        Self::Edit(text.into())
    }
}

/// Deferred driver work, fired by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Prepare the step after `index`; `complete` runs its callback first.
    Advance { index: i64, complete: bool },
    ClearGood,
    ReleaseLatch { index: i64 },
    EnterMessage,
    EditComplete,
    PlayStep,
}

impl TimerEvent {
    /// Scheduler key; events sharing a key supersede each other when debounced.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::ClearGood => "clear-good",
            Self::ReleaseLatch { .. } => "latch",
            Self::EnterMessage => "enter-message",
            Self::EditComplete => "edit-complete",
            Self::PlayStep => "play",
        }
    }
}

/// How the driver reacted to a learner event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The step was performed correctly.
    Matched,
    /// A wrong action was scored as an error.
    Mismatch,
    /// Accepted as part of a multi-gesture step.
    Progressed,
    Ignored,
}
