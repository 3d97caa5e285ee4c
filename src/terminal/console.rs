use crate::runtime::shell::{ErrorOffer, InstructionOptions, Progress, Shell};
use crate::terminal::writer::Writer;
use crate::ui::style::{Color, Style};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use tracing::warn;

/// A line-oriented shell printing instructions and feedback.
pub struct ConsoleShell<W: Write> {
    writer: Rc<RefCell<Writer<W>>>,
    saved: Option<Progress>,
    interactive: bool,
}

impl<W: Write> ConsoleShell<W> {
    pub fn new(writer: Rc<RefCell<Writer<W>>>) -> Self {
        Self {
            writer,
            saved: None,
            interactive: true,
        }
    }

    /// Progress handed to the driver on restore.
    pub fn with_saved(mut self, progress: Option<Progress>) -> Self {
        self.saved = progress;
        self
    }

    /// Without interaction no scores are shown.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn say(&self, text: &str, style: Style) {
        if let Err(error) = self.writer.borrow_mut().message(text, style) {
            warn!(%error, "console write failed");
        }
    }

    fn tally(&self, progress: &Progress, score: f64) -> String {
        format!(
            "{} correct, {} errors, {}%",
            progress.correct,
            progress.errors,
            (score * 100.0).round()
        )
    }
}

impl<W: Write> Shell for ConsoleShell<W> {
    fn instruction(&mut self, prompt: Option<&str>, options: &InstructionOptions) {
        if let Some(prompt) = prompt.filter(|prompt| !prompt.is_empty()) {
            self.say(&format!("> {prompt}"), Style::new().bold());
        }
        if let Some(secondary) = &options.secondary {
            self.say(&format!("  {secondary}"), Style::new());
        }
        if options.next_button {
            self.say("  (type `next` to continue)", Style::new().color(Color::Blue));
        }
    }

    fn warning(&mut self, text: &str) {
        self.say(&format!("! {text}"), Style::new().color(Color::Yellow));
    }

    fn correct(&mut self, progress: &Progress, score: f64) {
        let text = if self.interactive {
            format!("\u{2714} correct ({})", self.tally(progress, score))
        } else {
            "\u{2714} correct".to_string()
        };
        self.say(&text, Style::new().color(Color::Green));
    }

    fn error(&mut self, progress: &Progress, score: f64, offer: &ErrorOffer) {
        let hint = if offer.show_me {
            "try again, or type `show` to see the step"
        } else {
            "try again"
        };
        let text = if self.interactive {
            format!("\u{2718} {hint} ({})", self.tally(progress, score))
        } else {
            format!("\u{2718} {hint}")
        };
        self.say(&text, Style::new().color(Color::Red));
    }

    fn done(&mut self, progress: &Progress) {
        let text = if self.interactive {
            format!(
                "Good job: {} correct, {} errors. Type `play` to replay.",
                progress.correct, progress.errors
            )
        } else {
            "The end. Type `play` to replay.".to_string()
        };
        self.say(&text, Style::new().color(Color::Green).bold());
    }

    fn play_finished(&mut self) {
        self.say("(replay finished)", Style::new().color(Color::DarkGrey));
    }

    fn restore(&mut self) -> Option<Progress> {
        self.saved.take()
    }
}

#[cfg(test)]
mod tests {
    use super::ConsoleShell;
    use crate::runtime::shell::{ErrorOffer, InstructionOptions, Progress, Shell};
    use crate::terminal::writer::Writer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn output(writer: &Rc<RefCell<Writer<Vec<u8>>>>) -> String {
        String::from_utf8_lossy(writer.borrow().get_ref()).to_string()
    }

    #[test]
    fn prints_prompts_and_feedback() {
        let writer = Rc::new(RefCell::new(Writer::new(Vec::new())));
        let mut shell = ConsoleShell::new(writer.clone());
        shell.instruction(Some("Pick one"), &InstructionOptions::secondary("then type"));
        let progress = Progress {
            correct: 1,
            errors: 2,
            ..Progress::default()
        };
        shell.error(&progress, 0.0, &ErrorOffer { tries: 2, show_me: true });

        let text = output(&writer);
        assert!(text.contains("> Pick one\n  then type\n"));
        assert!(text.contains("type `show`"));
        assert!(text.contains("1 correct, 2 errors, 0%"));
    }

    #[test]
    fn restore_hands_out_saved_progress_once() {
        let writer = Rc::new(RefCell::new(Writer::new(Vec::new())));
        let mut shell = ConsoleShell::new(writer).with_saved(Some(Progress::default()));
        assert!(shell.restore().is_some());
        assert!(shell.restore().is_none());
    }
}
