use crate::core::anchor::Marker;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    DarkGrey,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub bold: bool,
    pub crossed_out: bool,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn crossed_out(mut self) -> Self {
        self.crossed_out = true;
        self
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Superseded values are greyed out and struck through.
    pub fn history() -> Self {
        Self::new().color(Color::DarkGrey).crossed_out()
    }

    /// Highlight for an anchor's markers; bad wins over good.
    pub fn for_markers(markers: &BTreeSet<Marker>) -> Self {
        if markers.contains(&Marker::Bad) {
            Self::new().background(Color::Red)
        } else if markers.contains(&Marker::Good) {
            Self::new().background(Color::Green)
        } else if markers.contains(&Marker::Selected) {
            Self::new().background(Color::Cyan)
        } else if markers.contains(&Marker::CurrentLine) {
            Self::new().background(Color::Yellow)
        } else {
            Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, Style};
    use crate::core::anchor::Marker;
    use std::collections::BTreeSet;

    #[test]
    fn bad_marker_takes_precedence() {
        let markers = BTreeSet::from([Marker::Good, Marker::Bad]);
        assert_eq!(Style::for_markers(&markers).background, Some(Color::Red));
        assert!(Style::for_markers(&BTreeSet::new()).is_plain());
    }
}
