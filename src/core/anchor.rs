use std::fmt;

/// Stable logical identifier of one visual element on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(u32);

impl AnchorId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which learner interactions an anchor responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub selectable: bool,
    pub editable: bool,
    pub source: bool,
    pub target: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        selectable: false,
        editable: false,
        source: false,
        target: false,
    };

    pub fn selectable(mut self) -> Self {
        self.selectable = true;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn source(mut self) -> Self {
        self.source = true;
        self
    }

    pub fn target(mut self) -> Self {
        self.target = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marker {
    Good,
    Bad,
    Selected,
    CurrentLine,
}
