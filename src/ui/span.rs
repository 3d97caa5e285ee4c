use crate::core::value::PLACEHOLDER;
use unicode_width::UnicodeWidthStr;

/// One displayed value inside a cell. Superseded values stay as history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub history: bool,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            history: false,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER)
    }

    pub fn is_placeholder(&self) -> bool {
        self.text == PLACEHOLDER
    }

    pub fn width(&self) -> usize {
        self.text.width()
    }
}

/// Appends `text` as the current value of a cell.
///
/// A placeholder is replaced rather than kept as history. With
/// `drop_history` only the latest value is retained.
pub fn push_value(spans: &mut Vec<Span>, text: &str, drop_history: bool) {
    let text = if text.is_empty() { PLACEHOLDER } else { text };
    if drop_history {
        spans.clear();
        spans.push(Span::new(text));
        return;
    }
    if let Some(last) = spans.last_mut() {
        if last.is_placeholder() {
            spans.pop();
        } else {
            last.history = true;
        }
    }
    spans.push(Span::new(text));
}

pub fn current_text(spans: &[Span]) -> Option<&str> {
    spans
        .iter()
        .rev()
        .find(|span| !span.history)
        .map(|span| span.text.as_str())
}
