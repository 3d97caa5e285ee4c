use crate::config::TracerConfig;
use crate::core::anchor::{AnchorId, Marker};
use crate::error::{TraceError, TraceResult};
use crate::runtime::event::{LearnerEvent, Outcome, TimerEvent};
use crate::runtime::routine::{Algorithm, Routine};
use crate::runtime::scheduler::{Scheduler, SchedulerCommand};
use crate::runtime::shell::{ErrorOffer, InstructionOptions, Progress, Shell};
use crate::runtime::step::{Action, Resume, Step, StepSummary, Target};
use crate::runtime::tracer::Tracer;
use crate::ui::geometry::{Point, Rect};
use crate::ui::render::Renderer;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const SELECT_VALUE: &str = "Select the value to be updated";
const ENTER_VALUE: &str = "Enter the new value";
const ARROW_END: &str = "Select the end of the arrow.";
const ARROW_START: &str = "Select the start of the arrow.";
const PRESS_ENTER: &str = "Press Enter when done.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Running,
    Finished,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Running => "running",
            Self::Finished => "finished",
        }
    }
}

/// Runs one exercise: resumes the routine, checks learner actions against
/// the current step, keeps score and replays persisted progress.
pub struct Driver {
    id: String,
    algorithm: Rc<dyn Algorithm>,
    config: TracerConfig,
    shell: Box<dyn Shell>,
    seed: u64,
    renderer: Rc<Renderer>,
    routine: Option<Routine>,
    step: Option<Step>,
    index: i64,
    last_result: Resume,
    progress: Progress,
    maxscore: u32,
    phase: Phase,
    replaying: bool,
    playing: bool,
    /// The current step was performed by the engine and waits to advance.
    resolved: bool,
    scheduler: Scheduler<TimerEvent>,
    latch: Option<i64>,
    pending_edge: Option<AnchorId>,
    editing: bool,
    draft: String,
    tries: u32,
    clock: Option<Instant>,
}

impl Driver {
    pub fn new(
        id: impl Into<String>,
        algorithm: Rc<dyn Algorithm>,
        config: TracerConfig,
        shell: Box<dyn Shell>,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        let renderer = Renderer::new(config.language);
        Self {
            id: id.into(),
            algorithm,
            config,
            shell,
            seed,
            renderer,
            routine: None,
            step: None,
            index: -1,
            last_result: Resume::Empty,
            progress: Progress::default(),
            maxscore: 0,
            phase: Phase::Unstarted,
            replaying: false,
            playing: false,
            resolved: false,
            scheduler: Scheduler::new(),
            latch: None,
            pending_edge: None,
            editing: false,
            draft: String::new(),
            tries: 0,
            clock: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn maxscore(&self) -> u32 {
        self.maxscore
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn pending_edge(&self) -> Option<AnchorId> {
        self.pending_edge
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.step.as_ref()
    }

    pub fn step_index(&self) -> i64 {
        self.index
    }

    pub fn summary(&self) -> Option<StepSummary> {
        self.step.as_ref().map(Step::summary)
    }

    pub fn renderer(&self) -> &Rc<Renderer> {
        &self.renderer
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    /// Clamped to `[0, 1]`; zero when nothing is scoreable.
    pub fn score(&self) -> f64 {
        if self.maxscore == 0 {
            return 0.0;
        }
        let net = f64::from(self.progress.correct) - f64::from(self.progress.errors);
        (net / f64::from(self.maxscore)).clamp(0.0, 1.0)
    }

    /// Runs the routine to completion without a renderer, performing every
    /// step itself. Returns the number of scoreable steps and the state of
    /// the leading start step, if there is one.
    pub fn count_steps(
        &self,
        data: Option<serde_json::Value>,
    ) -> TraceResult<(u32, Option<serde_json::Value>)> {
        let tracer = Tracer::silent(self.config.language, self.seed);
        let mut routine = Routine::new(self.algorithm.as_ref(), tracer, data);
        let mut result = Resume::Empty;
        let mut maxscore = 0;
        let mut start_state = None;
        while let Some(mut step) = routine.next(result)? {
            match &step.action {
                Action::Start { state } => start_state = Some(state.clone()),
                _ if step.kind().is_scoreable() => maxscore += 1,
                _ => {}
            }
            result = step.natural_result();
            step.complete(&result);
        }
        debug!(exercise = %self.id, maxscore, steps = routine.yielded(), "counted steps");
        Ok((maxscore, start_state))
    }

    /// Restores from the shell's persisted state.
    pub fn initialize(&mut self, now: Instant) -> TraceResult<()> {
        let saved = self.shell.restore();
        self.restore(saved, now)
    }

    /// Rebuilds everything from `progress` and silently replays its
    /// completed steps. Without recorded attempts the exercise waits for
    /// [`Driver::start`].
    pub fn restore(&mut self, progress: Option<Progress>, now: Instant) -> TraceResult<()> {
        self.clock = Some(now);
        self.playing = false;
        self.init_state(progress.as_ref())?;
        let Some(saved) = progress.filter(Progress::has_attempts) else {
            self.phase = Phase::Unstarted;
            return Ok(());
        };
        info!(exercise = %self.id, last_step = saved.last_step, "restoring progress");
        self.phase = Phase::Running;
        self.replaying = true;
        while self.index < saved.last_step {
            if !self.advance_routine()? {
                break;
            }
            debug!(exercise = %self.id, index = self.index, "replaying step");
            self.do_step(now);
        }
        self.replaying = false;
        self.progress.correct = saved.correct;
        self.progress.errors = saved.errors;
        self.prepare_next_step(now)
    }

    pub fn start(&mut self, now: Instant) -> TraceResult<()> {
        self.expect_phase(Phase::Unstarted)?;
        self.clock = Some(now);
        self.progress.correct = 0;
        self.progress.errors = 0;
        self.tries = 0;
        self.phase = Phase::Running;
        self.prepare_next_step(now)
    }

    /// Discards all progress and starts on fresh data.
    pub fn start_over(&mut self, now: Instant) -> TraceResult<()> {
        if self.config.seed.is_none() {
            self.seed = rand::random();
        }
        self.restore(None, now)?;
        self.start(now)
    }

    /// Re-runs the finished exercise on its persisted data, performing one
    /// step per `play_step` interval.
    pub fn play(&mut self, now: Instant) -> TraceResult<()> {
        self.expect_phase(Phase::Finished)?;
        self.clock = Some(now);
        let saved = self.progress.clone();
        self.init_state(Some(&saved))?;
        self.progress.correct = saved.correct;
        self.progress.errors = saved.errors;
        self.playing = true;
        info!(exercise = %self.id, "playing");
        self.emit_after(TimerEvent::PlayStep, self.config.delays.play_step(), now);
        Ok(())
    }

    /// Fires every timer due at `now`.
    pub fn tick(&mut self, now: Instant) -> TraceResult<()> {
        self.clock = Some(self.clock.map_or(now, |clock| clock.max(now)));
        loop {
            let due = self.scheduler.drain_ready(now);
            if due.is_empty() {
                return Ok(());
            }
            for event in due {
                self.on_timer(event, now)?;
            }
        }
    }

    /// Fires all pending timers in due order and returns the resulting clock.
    pub fn fast_forward(&mut self) -> TraceResult<Instant> {
        while let Some(due) = self.scheduler.next_due() {
            let at = self.clock.map_or(due, |clock| clock.max(due));
            self.tick(at)?;
        }
        Ok(self.clock.unwrap_or_else(Instant::now))
    }

    pub fn handle(&mut self, event: LearnerEvent, now: Instant) -> TraceResult<Outcome> {
        self.clock = Some(self.clock.map_or(now, |clock| clock.max(now)));
        if self.phase != Phase::Running || self.playing {
            warn!(exercise = %self.id, ?event, phase = self.phase.label(), "event outside a running exercise");
            return Ok(Outcome::Ignored);
        }
        if self.resolved {
            debug!(?event, "step already completing");
            return Ok(Outcome::Ignored);
        }
        match event {
            LearnerEvent::ShowMe => self.show_me(now),
            LearnerEvent::Next => self.on_next(now),
            LearnerEvent::Hover(point) => Ok(self.on_hover(point)),
            LearnerEvent::Edit(text) => Ok(self.on_edit(text, now)),
            _ if self.latch.is_some() => {
                warn!(exercise = %self.id, ?event, "event during error latch");
                Ok(Outcome::Ignored)
            }
            LearnerEvent::Activate(anchor) => self.on_activate(anchor, now),
            LearnerEvent::Button(label) => self.on_button(&label, now),
            LearnerEvent::Submit(text) => self.on_submit(&text, now),
        }
    }

    fn expect_phase(&self, expected: Phase) -> TraceResult<()> {
        if self.phase == expected {
            return Ok(());
        }
        Err(TraceError::InvalidPhase {
            expected: expected.label(),
            actual: self.phase.label(),
        })
    }

    fn init_state(&mut self, from: Option<&Progress>) -> TraceResult<()> {
        self.scheduler.clear();
        self.reset_step_state();
        self.latch = None;
        self.tries = 0;

        let data = from.and_then(|progress| progress.data.clone());
        let (maxscore, start_state) = self.count_steps(data.clone())?;
        self.maxscore = maxscore;
        let start_found = start_state.is_some();
        let data = start_state.or(data);
        self.progress = Progress {
            data: data.clone(),
            ..Progress::default()
        };

        self.renderer = Renderer::new(self.config.language);
        let tracer = Tracer::live(self.renderer.clone(), self.seed);
        let mut routine = Routine::new(self.algorithm.as_ref(), tracer, data);
        if start_found && let Some(mut start) = routine.next(Resume::Empty)? {
            start.complete(&Resume::Empty);
        }
        self.routine = Some(routine);
        self.step = None;
        self.index = -1;
        self.last_result = Resume::Empty;
        Ok(())
    }

    fn reset_step_state(&mut self) {
        self.resolved = false;
        self.pending_edge = None;
        self.editing = false;
        self.draft.clear();
        self.renderer.clear_preview();
        self.renderer.clear_marker(Marker::Selected);
    }

    /// Resumes the routine with the last result; false once it is exhausted.
    fn advance_routine(&mut self) -> TraceResult<bool> {
        let result = std::mem::take(&mut self.last_result);
        let next = match self.routine.as_mut() {
            Some(routine) => routine.next(result)?,
            None => None,
        };
        self.index += 1;
        self.step = next;
        Ok(self.step.is_some())
    }

    fn prepare_next_step(&mut self, now: Instant) -> TraceResult<()> {
        self.reset_step_state();
        self.cancel(TimerEvent::EnterMessage);
        self.cancel(TimerEvent::EditComplete);
        if !self.advance_routine()? {
            self.phase = Phase::Finished;
            info!(
                exercise = %self.id,
                correct = self.progress.correct,
                errors = self.progress.errors,
                "exercise finished"
            );
            self.shell.done(&self.progress);
            return Ok(());
        }
        let Some(step) = self.step.as_ref() else {
            return Ok(());
        };
        debug!(exercise = %self.id, index = self.index, kind = %step.kind(), prompt = %step.prompt, "step ready");
        let prompt = step.prompt.clone();
        let mut options = InstructionOptions::default();
        let mut auto_advance = false;
        match &step.action {
            Action::Next => options.next_button = true,
            Action::Start { .. } | Action::Pause => auto_advance = true,
            Action::Input { element: None, .. } => self.editing = true,
            Action::Input {
                select_first: true, ..
            } => options = InstructionOptions::secondary(SELECT_VALUE),
            Action::Input { .. } => {
                self.editing = true;
                self.draft = self.current_text();
            }
            _ => {}
        }
        self.shell.instruction(Some(&prompt), &options);
        if auto_advance {
            self.emit_after(
                TimerEvent::Advance {
                    index: self.index,
                    complete: true,
                },
                self.config.delays.show_step(),
                now,
            );
        }
        Ok(())
    }

    fn step_completed(&mut self, success: bool, result: Resume, now: Instant) -> TraceResult<Outcome> {
        if success {
            if let Some(step) = self.step.as_mut() {
                step.complete(&result);
            }
            self.last_result = result;
            self.progress.last_step = self.index;
            self.progress.correct += 1;
            self.tries = 0;
            debug!(exercise = %self.id, index = self.index, "step matched");
            let score = self.score();
            self.shell.correct(&self.progress, score);
            self.renderer.clear_marker(Marker::Bad);
            self.emit_after(TimerEvent::ClearGood, self.config.delays.good_marker(), now);
            self.prepare_next_step(now)?;
            return Ok(Outcome::Matched);
        }
        self.progress.errors += 1;
        self.tries += 1;
        debug!(exercise = %self.id, index = self.index, tries = self.tries, "step mismatched");
        let offer = ErrorOffer {
            tries: self.tries,
            show_me: self.tries >= self.config.show_me_after,
        };
        let score = self.score();
        self.shell.error(&self.progress, score, &offer);
        self.latch = Some(self.index);
        self.scheduler.schedule(
            SchedulerCommand::Debounce {
                key: TimerEvent::ReleaseLatch { index: self.index }.key().to_string(),
                delay: self.config.delays.after_error(),
                event: TimerEvent::ReleaseLatch { index: self.index },
            },
            now,
        );
        Ok(Outcome::Mismatch)
    }

    /// Performs the current step on the learner's behalf.
    fn do_step(&mut self, now: Instant) {
        let Some(step) = self.step.as_mut() else {
            return;
        };
        let result = step.natural_result();
        if !self.replaying
            && let Action::Select { elements, .. } = &step.action
            && let Some(anchor) = elements.first().and_then(Target::anchor)
        {
            self.renderer.mark(anchor, Marker::Good);
            self.scheduler.schedule(
                SchedulerCommand::EmitAfter {
                    key: TimerEvent::ClearGood.key().to_string(),
                    delay: self.config.delays.play_step(),
                    event: TimerEvent::ClearGood,
                },
                now,
            );
        }
        step.complete(&result);
        self.last_result = result;
        self.progress.last_step = self.index;
        self.resolved = true;
    }

    fn on_timer(&mut self, event: TimerEvent, now: Instant) -> TraceResult<()> {
        debug!(exercise = %self.id, ?event, "timer fired");
        match event {
            TimerEvent::Advance { index, complete } => {
                if index != self.index || self.phase != Phase::Running {
                    return Ok(());
                }
                if complete {
                    self.do_step(now);
                }
                self.prepare_next_step(now)
            }
            TimerEvent::ClearGood => {
                self.renderer.clear_marker(Marker::Good);
                Ok(())
            }
            TimerEvent::ReleaseLatch { index } => {
                if self.latch == Some(index) {
                    self.latch = None;
                }
                Ok(())
            }
            TimerEvent::EnterMessage => {
                if self.editing {
                    self.shell.warning(PRESS_ENTER);
                    self.emit_after(TimerEvent::EditComplete, self.config.delays.edit_complete(), now);
                }
                Ok(())
            }
            TimerEvent::EditComplete => {
                if self.editing && !self.draft.trim().is_empty() && self.latch.is_none() {
                    let draft = self.draft.clone();
                    self.on_submit(&draft, now)?;
                }
                Ok(())
            }
            TimerEvent::PlayStep => self.play_step(now),
        }
    }

    fn play_step(&mut self, now: Instant) -> TraceResult<()> {
        if !self.playing {
            return Ok(());
        }
        if self.advance_routine()? {
            debug!(exercise = %self.id, index = self.index, "playing step");
            self.do_step(now);
            self.emit_after(TimerEvent::PlayStep, self.config.delays.play_step(), now);
        } else {
            self.playing = false;
            info!(exercise = %self.id, "play finished");
            self.shell.play_finished();
        }
        Ok(())
    }

    fn on_activate(&mut self, anchor: AnchorId, now: Instant) -> TraceResult<Outcome> {
        let Some(step) = self.step.as_ref() else {
            return Ok(Outcome::Ignored);
        };
        if self.renderer.has_marker(anchor, Marker::Bad) {
            return Ok(Outcome::Ignored);
        }
        let caps = self.renderer.canvas().caps(anchor);
        match step.action.clone() {
            Action::Select { elements, value } => {
                if !caps.selectable {
                    return Ok(Outcome::Ignored);
                }
                let chosen = elements
                    .into_iter()
                    .find(|target| target.anchor() == Some(anchor));
                match chosen {
                    Some(target) => {
                        self.renderer.mark(anchor, Marker::Good);
                        let result = value.map_or(Resume::Target(target), Resume::Value);
                        self.step_completed(true, result, now)
                    }
                    None => self.reject(anchor, now),
                }
            }
            Action::Input {
                element: Some(element),
                select_first: true,
                ..
            } if !self.editing => {
                if !caps.editable {
                    return Ok(Outcome::Ignored);
                }
                if element.anchor() != Some(anchor) {
                    return self.reject(anchor, now);
                }
                self.renderer.mark(anchor, Marker::Selected);
                self.editing = true;
                self.draft = self.current_text();
                self.shell.instruction(
                    None,
                    &InstructionOptions::secondary(ENTER_VALUE).with_remove_bad_markers(),
                );
                self.renderer.clear_marker(Marker::Bad);
                Ok(Outcome::Progressed)
            }
            Action::Connect { source, target } => match self.pending_edge {
                None => {
                    if !caps.source {
                        return Ok(Outcome::Ignored);
                    }
                    if source.anchor() != Some(anchor) {
                        return self.reject(anchor, now);
                    }
                    self.pending_edge = Some(anchor);
                    self.renderer.mark(anchor, Marker::Selected);
                    self.renderer.clear_marker(Marker::Bad);
                    self.shell.instruction(
                        None,
                        &InstructionOptions::secondary(ARROW_END).with_remove_bad_markers(),
                    );
                    Ok(Outcome::Progressed)
                }
                Some(from) => {
                    if from == anchor || !caps.target {
                        return Ok(Outcome::Ignored);
                    }
                    self.pending_edge = None;
                    self.renderer.clear_preview();
                    self.renderer.unmark(from, Marker::Selected);
                    if target.anchor() == Some(anchor) {
                        return self.step_completed(true, Resume::Target(target), now);
                    }
                    self.shell
                        .instruction(None, &InstructionOptions::secondary(ARROW_START));
                    self.reject(anchor, now)
                }
            },
            _ => Ok(Outcome::Ignored),
        }
    }

    fn reject(&mut self, anchor: AnchorId, now: Instant) -> TraceResult<Outcome> {
        self.renderer.mark(anchor, Marker::Bad);
        self.step_completed(false, Resume::Empty, now)
    }

    fn on_button(&mut self, label: &str, now: Instant) -> TraceResult<Outcome> {
        let Some(Action::Click { label: expected }) = self.step.as_ref().map(|step| &step.action)
        else {
            return Ok(Outcome::Ignored);
        };
        let matched = expected == label;
        let Some(anchor) = self.renderer.button(label) else {
            warn!(exercise = %self.id, label, "click on an unknown button");
            return Ok(Outcome::Ignored);
        };
        if matched {
            self.renderer.mark(anchor, Marker::Good);
            self.step_completed(true, Resume::Text(label.to_string()), now)
        } else {
            self.reject(anchor, now)
        }
    }

    fn on_edit(&mut self, text: String, now: Instant) -> Outcome {
        if !self.editing {
            return Outcome::Ignored;
        }
        self.draft = text;
        self.cancel(TimerEvent::EditComplete);
        self.scheduler.schedule(
            SchedulerCommand::Debounce {
                key: TimerEvent::EnterMessage.key().to_string(),
                delay: self.config.delays.enter_message(),
                event: TimerEvent::EnterMessage,
            },
            now,
        );
        Outcome::Progressed
    }

    fn on_submit(&mut self, text: &str, now: Instant) -> TraceResult<Outcome> {
        if !self.editing || text.trim().is_empty() {
            return Ok(Outcome::Ignored);
        }
        let Some(Action::Input { answer, element, .. }) = self.step.as_ref().map(|step| step.action.clone())
        else {
            return Ok(Outcome::Ignored);
        };
        self.cancel(TimerEvent::EnterMessage);
        self.cancel(TimerEvent::EditComplete);
        self.draft = text.to_string();
        let matched = answer.as_ref().is_none_or(|answer| answer.matches(text));
        if matched {
            if let Some(anchor) = element.as_ref().and_then(Target::anchor) {
                self.renderer.mark(anchor, Marker::Good);
            }
            self.step_completed(true, Resume::Text(text.to_string()), now)
        } else {
            self.step_completed(false, Resume::Empty, now)
        }
    }

    fn on_hover(&mut self, point: Point) -> Outcome {
        let Some(from) = self.pending_edge else {
            return Outcome::Ignored;
        };
        let to = {
            let canvas = self.renderer.canvas();
            canvas
                .anchor_at(point)
                .filter(|anchor| *anchor != from)
                .and_then(|anchor| canvas.bounds(anchor))
                .unwrap_or(Rect::point(point))
        };
        self.renderer.preview(from, to);
        Outcome::Progressed
    }

    fn on_next(&mut self, now: Instant) -> TraceResult<Outcome> {
        if !matches!(self.step.as_ref().map(|step| &step.action), Some(Action::Next)) {
            return Ok(Outcome::Ignored);
        }
        self.do_step(now);
        self.schedule_advance(self.config.delays.show_step(), now);
        Ok(Outcome::Progressed)
    }

    fn show_me(&mut self, now: Instant) -> TraceResult<Outcome> {
        if self.step.is_none() || self.tries < self.config.show_me_after {
            return Ok(Outcome::Ignored);
        }
        info!(exercise = %self.id, index = self.index, "showing step");
        self.tries = 0;
        self.latch = None;
        self.pending_edge = None;
        self.editing = false;
        self.renderer.clear_preview();
        self.do_step(now);
        self.schedule_advance(self.config.delays.after_action(), now);
        Ok(Outcome::Progressed)
    }

    fn schedule_advance(&mut self, delay: Duration, now: Instant) {
        let event = TimerEvent::Advance {
            index: self.index,
            complete: false,
        };
        self.scheduler.schedule(
            SchedulerCommand::Debounce {
                key: event.key().to_string(),
                delay,
                event,
            },
            now,
        );
    }

    fn emit_after(&mut self, event: TimerEvent, delay: Duration, now: Instant) {
        self.scheduler.schedule(
            SchedulerCommand::EmitAfter {
                key: event.key().to_string(),
                delay,
                event,
            },
            now,
        );
    }

    fn cancel(&mut self, event: TimerEvent) {
        self.scheduler.schedule(
            SchedulerCommand::Cancel {
                key: event.key().to_string(),
            },
            self.clock.unwrap_or_else(Instant::now),
        );
    }

    /// Text shown at the input element, used to prefill the editor.
    fn current_text(&self) -> String {
        let Some(Action::Input {
            element: Some(element),
            ..
        }) = self.step.as_ref().map(|step| &step.action)
        else {
            return String::new();
        };
        element
            .anchor()
            .and_then(|anchor| self.renderer.canvas().text(anchor).map(str::to_string))
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}
