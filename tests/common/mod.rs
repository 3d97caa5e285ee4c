#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use steptrace::anchor::AnchorId;
use steptrace::config::{Delays, TracerConfig};
use steptrace::driver::{Driver, Phase};
use steptrace::registry::Registry;
use steptrace::runtime::event::{LearnerEvent, Outcome};
use steptrace::runtime::routine::Algorithm;
use steptrace::shell::{ErrorOffer, InstructionOptions, Progress, Shell};
use steptrace::step::{Action, StepSummary, Target};

#[derive(Debug, Default)]
pub struct Log {
    pub prompts: Vec<String>,
    pub secondary: Vec<String>,
    pub warnings: Vec<String>,
    pub correct: Vec<Progress>,
    pub errors: Vec<ErrorOffer>,
    pub scores: Vec<f64>,
    pub done: Option<Progress>,
    pub play_finished: bool,
}

pub struct RecordingShell {
    log: Rc<RefCell<Log>>,
    saved: Option<Progress>,
}

impl RecordingShell {
    pub fn new(log: Rc<RefCell<Log>>, saved: Option<Progress>) -> Self {
        Self { log, saved }
    }
}

impl Shell for RecordingShell {
    fn instruction(&mut self, prompt: Option<&str>, options: &InstructionOptions) {
        let mut log = self.log.borrow_mut();
        if let Some(prompt) = prompt {
            log.prompts.push(prompt.to_string());
        }
        if let Some(secondary) = &options.secondary {
            log.secondary.push(secondary.clone());
        }
    }

    fn warning(&mut self, text: &str) {
        self.log.borrow_mut().warnings.push(text.to_string());
    }

    fn correct(&mut self, progress: &Progress, score: f64) {
        let mut log = self.log.borrow_mut();
        log.correct.push(progress.clone());
        log.scores.push(score);
    }

    fn error(&mut self, _progress: &Progress, score: f64, offer: &ErrorOffer) {
        let mut log = self.log.borrow_mut();
        log.errors.push(*offer);
        log.scores.push(score);
    }

    fn done(&mut self, progress: &Progress) {
        self.log.borrow_mut().done = Some(progress.clone());
    }

    fn play_finished(&mut self) {
        self.log.borrow_mut().play_finished = true;
    }

    fn restore(&mut self) -> Option<Progress> {
        self.saved.take()
    }
}

/// Millisecond delays so tests can step the clock precisely.
pub fn config(seed: u64) -> TracerConfig {
    TracerConfig {
        delays: Delays {
            play_step: 10,
            show_step: 10,
            after_action: 10,
            good_marker: 20,
            after_error: 5,
            enter_message: 100,
            edit_complete: 200,
        },
        ..TracerConfig::default()
    }
    .with_seed(seed)
}

pub fn driver(
    algorithm: impl Algorithm + 'static,
    config: TracerConfig,
    saved: Option<Progress>,
) -> (Driver, Rc<RefCell<Log>>) {
    let mut registry = Registry::new();
    let id = registry.register(None, algorithm, config);
    let log = Rc::new(RefCell::new(Log::default()));
    let shell = RecordingShell::new(log.clone(), saved);
    let driver = registry.driver(&id, Box::new(shell)).expect("registered");
    (driver, log)
}

/// A driver that has restored and, when nothing was saved, started.
pub fn running(
    algorithm: impl Algorithm + 'static,
    config: TracerConfig,
    saved: Option<Progress>,
    now: Instant,
) -> (Driver, Rc<RefCell<Log>>) {
    let (mut driver, log) = driver(algorithm, config, saved);
    driver.initialize(now).expect("initialized");
    if driver.phase() == Phase::Unstarted {
        driver.start(now).expect("started");
    }
    (driver, log)
}

pub fn after(now: Instant, ms: u64) -> Instant {
    now + Duration::from_millis(ms)
}

pub fn anchor(target: &Target) -> AnchorId {
    target.anchor().expect("candidate is rendered")
}

/// Fires timers in due order until the driver leaves step `index`.
pub fn settle(driver: &mut Driver, index: i64, mut now: Instant) -> Instant {
    while driver.phase() == Phase::Running && driver.step_index() == index {
        let Some(due) = driver.next_due() else {
            break;
        };
        now = now.max(due);
        driver.tick(now).expect("timers run");
    }
    now
}

/// Performs the current step the way a learner who knows the answer would.
pub fn perform(driver: &mut Driver, now: Instant) -> Instant {
    let index = driver.step_index();
    let action = driver
        .current_step()
        .map(|step| step.action.clone())
        .expect("a current step");
    let mut handle =
        |event: LearnerEvent| driver.handle(event, now).expect("event handled");
    match action {
        Action::Start { .. } | Action::Pause => {}
        Action::Next => {
            assert_eq!(handle(LearnerEvent::Next), Outcome::Progressed);
        }
        Action::Click { label } => {
            assert_eq!(handle(LearnerEvent::Button(label)), Outcome::Matched);
        }
        Action::Select { elements, .. } => {
            let target = elements.first().expect("candidates");
            assert_eq!(handle(LearnerEvent::Activate(anchor(target))), Outcome::Matched);
        }
        Action::Input {
            answer,
            element,
            select_first,
        } => {
            if select_first && let Some(element) = &element {
                assert_eq!(
                    handle(LearnerEvent::Activate(anchor(element))),
                    Outcome::Progressed
                );
            }
            let text = answer
                .as_ref()
                .and_then(|answer| answer.preferred())
                .unwrap_or_else(|| "anything".to_string());
            assert_eq!(handle(LearnerEvent::Submit(text)), Outcome::Matched);
        }
        Action::Connect { source, target } => {
            assert_eq!(
                handle(LearnerEvent::Activate(anchor(&source))),
                Outcome::Progressed
            );
            assert_eq!(handle(LearnerEvent::Activate(anchor(&target))), Outcome::Matched);
        }
    }
    settle(driver, index, now)
}

/// Solves the exercise from its current step, returning the summary of
/// every step met on the way.
pub fn solve(driver: &mut Driver, mut now: Instant) -> (Vec<StepSummary>, Instant) {
    let mut seen = Vec::new();
    while driver.phase() == Phase::Running {
        let Some(summary) = driver.summary() else {
            break;
        };
        seen.push(summary);
        now = perform(driver, now);
    }
    (seen, now)
}
