use crate::terminal::view::Line;
use crate::ui::style::{Color, Style};
use crossterm::style::{
    Attribute, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use std::io::{self, IsTerminal, Stdout, Write};

/// Writes styled lines, with ANSI styling only when enabled.
pub struct Writer<W: Write> {
    out: W,
    styled: bool,
}

impl Writer<Stdout> {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let styled = out.is_terminal();
        Self { out, styled }
    }
}

impl<W: Write> Writer<W> {
    pub fn new(out: W) -> Self {
        Self { out, styled: false }
    }

    pub fn with_styling(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn render_line(&mut self, line: &Line) -> io::Result<()> {
        for (text, style) in line.pieces() {
            self.write_styled(text, *style)?;
        }
        writeln!(self.out)
    }

    pub fn render_lines(&mut self, lines: &[Line]) -> io::Result<()> {
        for line in lines {
            self.render_line(line)?;
        }
        self.flush()
    }

    pub fn message(&mut self, text: &str, style: Style) -> io::Result<()> {
        self.write_styled(text, style)?;
        writeln!(self.out)?;
        self.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn write_styled(&mut self, text: &str, style: Style) -> io::Result<()> {
        if !self.styled || style.is_plain() {
            return write!(self.out, "{text}");
        }
        if let Some(fg) = style.color {
            write!(self.out, "{}", SetForegroundColor(map_color(fg)))?;
        }
        if let Some(bg) = style.background {
            write!(self.out, "{}", SetBackgroundColor(map_color(bg)))?;
        }
        if style.bold {
            write!(self.out, "{}", SetAttribute(Attribute::Bold))?;
        }
        if style.crossed_out {
            write!(self.out, "{}", SetAttribute(Attribute::CrossedOut))?;
        }
        write!(self.out, "{text}")?;
        write!(self.out, "{}", SetAttribute(Attribute::Reset))?;
        write!(self.out, "{}", ResetColor)
    }
}

fn map_color(color: Color) -> crossterm::style::Color {
    match color {
        Color::DarkGrey => crossterm::style::Color::DarkGrey,
        Color::Red => crossterm::style::Color::Red,
        Color::Green => crossterm::style::Color::Green,
        Color::Yellow => crossterm::style::Color::Yellow,
        Color::Blue => crossterm::style::Color::Blue,
        Color::Cyan => crossterm::style::Color::Cyan,
    }
}

#[cfg(test)]
mod tests {
    use super::Writer;
    use crate::terminal::view::Line;
    use crate::ui::style::{Color, Style};

    #[test]
    fn unstyled_output_is_plain_text() {
        let mut writer = Writer::new(Vec::new());
        writer
            .render_line(&Line::plain("x: ").push("1", Style::history()))
            .expect("write");
        assert_eq!(String::from_utf8_lossy(writer.get_ref()), "x: 1\n");
    }

    #[test]
    fn styled_output_resets_after_each_piece() {
        let mut writer = Writer::new(Vec::new()).with_styling(true);
        writer
            .message("ok", Style::new().color(Color::Green))
            .expect("write");
        let text = String::from_utf8_lossy(writer.get_ref()).to_string();
        assert!(text.contains("ok"));
        assert!(text.starts_with('\u{1b}'));
        assert!(text.ends_with("\u{1b}[0m\n"));
    }
}
