use crate::core::anchor::AnchorId;
use crate::error::{TraceError, TraceResult};
use crate::runtime::driver::{Driver, Phase};
use crate::runtime::event::{LearnerEvent, Outcome};
use crate::runtime::shell::Progress;
use crate::terminal::view;
use crate::terminal::writer::Writer;
use crate::ui::geometry::Rect;
use crate::ui::style::{Color, Style};
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

const HELP: &str = "commands: <n> | #<n> activate anchor, ~<n> point at anchor, b <label> click button, \
= <text> enter text, next, show, start, over, play, draw, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Activate(AnchorId),
    Point(AnchorId),
    Button(String),
    Submit(String),
    Next,
    ShowMe,
    Start,
    StartOver,
    Play,
    Draw,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if let Some(text) = input.strip_prefix('=') {
            return Ok(Self::Submit(text.trim().to_string()));
        }
        if let Some(label) = input.strip_prefix("b ") {
            return Ok(Self::Button(label.trim().to_string()));
        }
        if let Some(raw) = input.strip_prefix('~') {
            return parse_anchor(raw).map(Self::Point);
        }
        match input {
            "next" | "n" => Ok(Self::Next),
            "show" => Ok(Self::ShowMe),
            "start" => Ok(Self::Start),
            "over" => Ok(Self::StartOver),
            "play" => Ok(Self::Play),
            "draw" | "" => Ok(Self::Draw),
            "help" | "?" => Ok(Self::Help),
            "quit" | "q" => Ok(Self::Quit),
            other => parse_anchor(other).map(Self::Activate),
        }
    }
}

fn parse_anchor(raw: &str) -> Result<AnchorId, String> {
    let raw = raw.trim();
    raw.strip_prefix('#')
        .unwrap_or(raw)
        .parse::<u32>()
        .map(AnchorId::new)
        .map_err(|_| format!("unknown command `{raw}`"))
}

/// Drives one exercise from line commands. Timers are fast-forwarded after
/// every command, so pauses and replays complete immediately.
pub struct Session<W: Write> {
    driver: Driver,
    writer: Rc<RefCell<Writer<W>>>,
}

impl<W: Write> Session<W> {
    pub fn new(driver: Driver, writer: Rc<RefCell<Writer<W>>>) -> Self {
        Self { driver, writer }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Runs until `quit` or end of input and returns the persisted state.
    pub fn run<R: BufRead>(mut self, input: R) -> TraceResult<Progress> {
        let now = Instant::now();
        self.driver.initialize(now)?;
        if self.driver.phase() == Phase::Unstarted {
            self.driver.start(now)?;
        }
        self.settle()?;
        for line in input.lines() {
            let line = line?;
            match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => match self.execute(command) {
                    Err(error @ TraceError::InvalidPhase { .. }) => {
                        self.say(&error.to_string(), Style::new().color(Color::Red))?
                    }
                    other => other?,
                },
                Err(message) => self.say(&message, Style::new().color(Color::Red))?,
            }
        }
        Ok(self.driver.progress().clone())
    }

    pub fn execute(&mut self, command: Command) -> TraceResult<()> {
        let now = self.driver.fast_forward()?;
        debug!(?command, "console command");
        let event = match command {
            Command::Activate(anchor) => Some(LearnerEvent::Activate(anchor)),
            Command::Point(anchor) => self
                .driver
                .renderer()
                .canvas()
                .bounds(anchor)
                .map(|bounds: Rect| LearnerEvent::Hover(bounds.center())),
            Command::Button(label) => Some(LearnerEvent::Button(label)),
            Command::Submit(text) => Some(LearnerEvent::Submit(text)),
            Command::Next => Some(LearnerEvent::Next),
            Command::ShowMe => Some(LearnerEvent::ShowMe),
            Command::Start => {
                self.driver.start(now)?;
                None
            }
            Command::StartOver => {
                self.driver.start_over(now)?;
                None
            }
            Command::Play => {
                self.driver.play(now)?;
                None
            }
            Command::Draw => None,
            Command::Help => {
                self.say(HELP, Style::new().color(Color::DarkGrey))?;
                return Ok(());
            }
            Command::Quit => return Ok(()),
        };
        if let Some(event) = event
            && self.driver.handle(event, now)? == Outcome::Ignored
        {
            self.say("(ignored)", Style::new().color(Color::DarkGrey))?;
        }
        self.settle()
    }

    fn settle(&mut self) -> TraceResult<()> {
        self.driver.fast_forward()?;
        let lines = view::render(self.driver.renderer());
        self.writer.borrow_mut().render_lines(&lines)?;
        Ok(())
    }

    fn say(&self, text: &str, style: Style) -> TraceResult<()> {
        self.writer.borrow_mut().message(text, style)?;
        Ok(())
    }
}
