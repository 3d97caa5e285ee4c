use crate::error::{TraceError, TraceResult};
use crate::runtime::step::{Action, Resume, Step, StepKind};
use crate::runtime::tracer::{StepChannel, Tracer};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use tracing::{debug, error};

pub type RoutineFuture = Pin<Box<dyn Future<Output = ()>>>;

/// An algorithm routine: given the tracer and the persisted seed data,
/// an async body that awaits one step future per suspension point.
pub trait Algorithm {
    fn run(&self, tracer: Tracer, data: Option<serde_json::Value>) -> RoutineFuture;
}

impl<F, Fut> Algorithm for F
where
    F: Fn(Tracer, Option<serde_json::Value>) -> Fut,
    Fut: Future<Output = ()> + 'static,
{
    fn run(&self, tracer: Tracer, data: Option<serde_json::Value>) -> RoutineFuture {
        Box::pin(self(tracer, data))
    }
}

/// One execution of an algorithm, advanced step by step.
pub struct Routine {
    future: Option<RoutineFuture>,
    channel: Rc<StepChannel>,
    yielded: usize,
    /// A leading start step was yielded; it is not numbered.
    started: bool,
}

impl Routine {
    pub fn new(algorithm: &dyn Algorithm, tracer: Tracer, data: Option<serde_json::Value>) -> Self {
        let channel = tracer.channel();
        Self {
            future: Some(algorithm.run(tracer, data)),
            channel,
            yielded: 0,
            started: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.future.is_none()
    }

    /// Number of steps yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Resumes the routine with the result of the previous step and returns
    /// the next one, or `None` once the routine has run to completion.
    pub fn next(&mut self, result: Resume) -> TraceResult<Option<Step>> {
        let Some(future) = self.future.as_mut() else {
            return Ok(None);
        };
        self.channel.set_resume(result);
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                debug!(steps = self.yielded, "routine finished");
                self.future = None;
                Ok(None)
            }
            Poll::Pending => {
                let index = self.step_index();
                let Some(step) = self.channel.take_step() else {
                    return Err(self.violation(index, "routine suspended without yielding a step".into()));
                };
                self.check(index, &step)?;
                self.started |= step.kind() == StepKind::Start;
                self.yielded += 1;
                Ok(Some(step))
            }
        }
    }

    /// Index of the next step as the driver numbers it.
    fn step_index(&self) -> i64 {
        self.yielded as i64 - i64::from(self.started)
    }

    fn check(&mut self, index: i64, step: &Step) -> TraceResult<()> {
        if step.kind() == StepKind::Start && self.yielded > 0 {
            return Err(self.violation(index, format!("unexpected start step {step:?}")));
        }
        if let Action::Select { elements, .. } = &step.action
            && elements.is_empty()
        {
            return Err(self.violation(index, format!("select step without candidates {step:?}")));
        }
        Ok(())
    }

    fn violation(&mut self, index: i64, reason: String) -> TraceError {
        error!(index, %reason, "protocol violation");
        self.future = None;
        TraceError::ProtocolViolation { index, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::{Algorithm, Routine};
    use crate::config::Language;
    use crate::error::TraceError;
    use crate::runtime::step::{Resume, StepKind};
    use crate::runtime::tracer::Tracer;
    use std::cell::RefCell;
    use std::rc::Rc;

    async fn counting(sim: Tracer, _data: Option<serde_json::Value>) {
        sim.pause("one").await;
        let answer = sim.ask(2, Some("two")).await;
        sim.pause(answer.text().unwrap_or("none")).await;
    }

    fn run(algorithm: &dyn Algorithm) -> Routine {
        Routine::new(algorithm, Tracer::silent(Language::Java, 0), None)
    }

    #[test]
    fn steps_come_out_in_order_with_resume_values() {
        let mut routine = run(&counting);
        let first = routine.next(Resume::Empty).expect("ok").expect("step");
        assert_eq!(first.prompt, "one");
        let second = routine.next(Resume::Empty).expect("ok").expect("step");
        assert_eq!(second.kind(), StepKind::Input);
        let third = routine
            .next(Resume::Text("2".to_string()))
            .expect("ok")
            .expect("step");
        assert_eq!(third.prompt, "2");
        assert!(routine.next(Resume::Empty).expect("ok").is_none());
        assert!(routine.is_finished());
        assert_eq!(routine.yielded(), 3);
    }

    #[test]
    fn late_start_is_a_protocol_violation() {
        let late = |sim: Tracer, _data: Option<serde_json::Value>| async move {
            sim.pause("first").await;
            sim.start(serde_json::json!({}), "again").await;
        };
        let mut routine = run(&late);
        routine.next(Resume::Empty).expect("first step");
        let error = routine.next(Resume::Empty).expect_err("start after first step");
        assert!(error.is_protocol_violation());
        assert!(routine.is_finished());
    }

    #[test]
    fn violations_are_numbered_after_the_start_step() {
        let empty_select = |sim: Tracer, _data: Option<serde_json::Value>| async move {
            sim.start(serde_json::json!({}), "begin").await;
            sim.pause("first").await;
            let step = crate::runtime::step::Step::new(
                crate::runtime::step::Action::Select {
                    elements: Vec::new(),
                    value: None,
                },
                "pick nothing",
            );
            sim.perform(step).await;
        };
        let mut routine = run(&empty_select);
        routine.next(Resume::Empty).expect("start");
        routine.next(Resume::Empty).expect("pause");
        let error = routine.next(Resume::Empty).expect_err("empty select");
        assert!(matches!(error, TraceError::ProtocolViolation { index: 1, .. }));
    }

    #[test]
    fn foreign_suspension_is_a_protocol_violation() {
        let stalled = |_sim: Tracer, _data: Option<serde_json::Value>| async move {
            std::future::pending::<()>().await;
        };
        let mut routine = run(&stalled);
        assert!(
            routine
                .next(Resume::Empty)
                .expect_err("no step yielded")
                .is_protocol_violation()
        );
    }

    #[test]
    fn done_callbacks_see_routine_state() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let seen = log.clone();
        let algorithm = move |sim: Tracer, _data: Option<serde_json::Value>| {
            let log = seen.clone();
            async move {
                let step = crate::runtime::step::Step::new(
                    crate::runtime::step::Action::Pause,
                    "p",
                )
                .with_done(move |_| log.borrow_mut().push("done"));
                sim.perform(step).await;
            }
        };
        let mut routine = run(&algorithm);
        let mut step = routine.next(Resume::Empty).expect("ok").expect("step");
        step.complete(&Resume::Empty);
        assert_eq!(log.borrow().as_slice(), &["done"]);
    }
}
