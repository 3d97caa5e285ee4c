use crate::config::Language;
use crate::core::node::Path;
use crate::core::value::Value;
use crate::runtime::answer::Answer;
use crate::runtime::step::{Action, Resume, Step, Target};
use crate::ui::render::Renderer;
use crate::ui::widgets::Item;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

const SELECT_TARGET: &str = "Select the pointer target.";
const ENTER_VALUE: &str = "Enter the new value.";
const UPDATE_VALUE: &str = "Update the value.";
const DRAW_ARROW: &str = "Select the start and the end of the arrow.";
const CLICK_BUTTON: &str = "Click one of the blue buttons.";

/// Hand-off point between a suspended routine and the driver.
#[derive(Default)]
pub(crate) struct StepChannel {
    pending: RefCell<Option<Step>>,
    resume: RefCell<Option<Resume>>,
}

impl StepChannel {
    pub(crate) fn take_step(&self) -> Option<Step> {
        self.pending.borrow_mut().take()
    }

    pub(crate) fn set_resume(&self, result: Resume) {
        *self.resume.borrow_mut() = Some(result);
    }
}

/// Awaiting it yields the step to the driver and resolves to the result
/// the driver resumes with.
#[must_use = "a step only happens when awaited"]
pub struct StepFuture {
    channel: Rc<StepChannel>,
    step: Option<Step>,
}

impl Future for StepFuture {
    type Output = Resume;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Resume> {
        match self.step.take() {
            Some(step) => {
                *self.channel.pending.borrow_mut() = Some(step);
                Poll::Pending
            }
            None => Poll::Ready(self.channel.resume.borrow_mut().take().unwrap_or_default()),
        }
    }
}

struct TracerState {
    renderer: Option<Rc<Renderer>>,
    language: Language,
    rng: RefCell<StdRng>,
    channel: Rc<StepChannel>,
}

/// What an algorithm sees: item placement, step helpers and randomness.
///
/// A silent tracer has no renderer; placement and pointer drawing are
/// skipped while the value model still runs.
#[derive(Clone)]
pub struct Tracer(Rc<TracerState>);

impl Tracer {
    pub fn live(renderer: Rc<Renderer>, seed: u64) -> Self {
        let language = renderer.language();
        Self::build(Some(renderer), language, seed)
    }

    pub fn silent(language: Language, seed: u64) -> Self {
        Self::build(None, language, seed)
    }

    fn build(renderer: Option<Rc<Renderer>>, language: Language, seed: u64) -> Self {
        Self(Rc::new(TracerState {
            renderer,
            language,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
            channel: Rc::new(StepChannel::default()),
        }))
    }

    pub(crate) fn channel(&self) -> Rc<StepChannel> {
        self.0.channel.clone()
    }

    pub fn renderer(&self) -> Option<&Rc<Renderer>> {
        self.0.renderer.as_ref()
    }

    pub fn language(&self) -> Language {
        self.0.language
    }

    /// Yields an arbitrary step, such as one built by a code or terminal widget.
    pub fn perform(&self, step: Step) -> StepFuture {
        StepFuture {
            channel: self.channel(),
            step: Some(step),
        }
    }

    pub fn start(&self, state: serde_json::Value, prompt: &str) -> StepFuture {
        self.perform(Step::new(Action::Start { state }, prompt))
    }

    pub fn pause(&self, prompt: &str) -> StepFuture {
        self.perform(Step::new(Action::Pause, prompt))
    }

    pub fn next(&self, prompt: &str) -> StepFuture {
        self.perform(Step::new(Action::Next, prompt))
    }

    pub fn click(&self, label: &str, prompt: Option<&str>) -> StepFuture {
        self.perform(Step::new(
            Action::Click {
                label: label.to_string(),
            },
            prompt.unwrap_or(CLICK_BUTTON),
        ))
    }

    pub fn select(&self, target: impl Into<Target>, prompt: &str) -> StepFuture {
        self.perform(Step::new(
            Action::Select {
                elements: vec![target.into()],
                value: None,
            },
            prompt,
        ))
    }

    /// Asks for a value: pointer targets and nodes are selected, scalars typed.
    pub fn ask(&self, value: impl Into<Value>, prompt: Option<&str>) -> StepFuture {
        let value = value.into();
        let step = match &value {
            Value::Addr(addr) => Step::new(
                Action::Select {
                    elements: vec![Target::Path(addr.deref().clone())],
                    value: Some(value.clone()),
                },
                prompt.unwrap_or(SELECT_TARGET),
            ),
            Value::Node(node) => Step::new(
                Action::Select {
                    elements: vec![Target::from(node)],
                    value: Some(value.clone()),
                },
                prompt.unwrap_or(SELECT_TARGET),
            ),
            scalar => Step::new(
                Action::Input {
                    answer: Answer::from_value(scalar, self.language().null_text()),
                    element: None,
                    select_first: true,
                },
                prompt.unwrap_or(ENTER_VALUE),
            ),
        };
        self.perform(step)
    }

    /// Asks the learner to perform `lhs = rhs`: draw an arrow for pointer
    /// and top-level values, type the value otherwise. Completing the step
    /// assigns.
    pub fn set(&self, lhs: &Path, rhs: impl Into<Value>, prompt: Option<&str>) -> StepFuture {
        let rhs = rhs.into();
        let action = match &rhs {
            Value::Addr(addr) => Action::Connect {
                source: Target::Path(lhs.clone()),
                target: Target::Path(addr.deref().clone()),
            },
            Value::Node(node) if node.is_top_level() => Action::Connect {
                source: Target::Path(lhs.clone()),
                target: Target::from(node),
            },
            _ => Action::Input {
                answer: Answer::from_value(&rhs, self.language().null_text()),
                element: Some(Target::Path(lhs.clone())),
                select_first: true,
            },
        };
        let prompt = match action {
            Action::Connect { .. } => prompt.unwrap_or(DRAW_ARROW),
            _ => prompt.unwrap_or(UPDATE_VALUE),
        };
        let lhs = lhs.clone();
        self.perform(Step::new(action, prompt).with_done(move |_| lhs.assign(rhs)))
    }

    /// Places an item at grid position `(x, y)`.
    pub fn add<I: Into<Item>>(&self, x: f64, y: f64, item: I) -> Item {
        let item = item.into();
        if let Item::Node(node) = &item {
            node.set_top_level(true);
        }
        if let Some(renderer) = self.renderer() {
            renderer.add(x, y, &item);
        }
        item
    }

    /// Removes an item, dropping every pointer into or out of it.
    pub fn remove<I: Into<Item>>(&self, item: I) {
        let item = item.into();
        match self.renderer() {
            Some(renderer) => renderer.remove(&item),
            None => {
                if let Item::Node(node) = &item {
                    node.set_top_level(false);
                }
            }
        }
    }

    pub fn add_buttons<S: AsRef<str>>(&self, labels: &[S]) {
        if let Some(renderer) = self.renderer() {
            renderer.add_buttons(labels);
        }
    }

    pub fn resize(&self) {
        if let Some(renderer) = self.renderer() {
            renderer.resize();
        }
    }

    /// Uniform in `low..=high`.
    pub fn rand_int(&self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.0.rng.borrow_mut().gen_range(low..=high)
    }

    pub fn rand_int_array(&self, len: usize, low: i64, high: i64) -> Vec<i64> {
        (0..len).map(|_| self.rand_int(low, high)).collect()
    }

    pub fn rand_select<T: Clone>(&self, choices: &[T]) -> Option<T> {
        if choices.is_empty() {
            return None;
        }
        let index = self.rand_int(0, choices.len() as i64 - 1) as usize;
        choices.get(index).cloned()
    }

    pub fn rand_code_point(&self, low: char, high: char) -> char {
        let code = self.rand_int(i64::from(u32::from(low)), i64::from(u32::from(high)));
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or(low)
    }

    pub fn rand_string(&self, len: usize, low: char, high: char) -> String {
        (0..len).map(|_| self.rand_code_point(low, high)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Tracer;
    use crate::config::Language;
    use crate::core::node::Node;
    use crate::core::value::Value;
    use crate::runtime::step::{Action, Resume, StepKind};
    use crate::ui::render::Renderer;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    #[test]
    fn step_future_yields_then_resumes() {
        let tracer = Tracer::silent(Language::Java, 1);
        let channel = tracer.channel();
        let mut future = pin!(tracer.pause("look"));
        let mut cx = Context::from_waker(Waker::noop());

        assert!(future.as_mut().poll(&mut cx).is_pending());
        let step = channel.take_step().expect("step yielded");
        assert_eq!(step.kind(), StepKind::Pause);

        channel.set_resume(Resume::Text("ok".to_string()));
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(resume) => assert_eq!(resume.text(), Some("ok")),
            Poll::Pending => panic!("second poll should resume"),
        }
    }

    #[test]
    fn same_seed_same_numbers() {
        let a = Tracer::silent(Language::Java, 99);
        let b = Tracer::silent(Language::Java, 99);
        assert_eq!(a.rand_int_array(8, 0, 100), b.rand_int_array(8, 0, 100));
        let word = a.rand_string(5, 'a', 'e');
        assert_eq!(word.chars().count(), 5);
        assert!(word.chars().all(|ch| ('a'..='e').contains(&ch)));
    }

    #[test]
    fn rand_select_picks_a_member() {
        let a = Tracer::silent(Language::Java, 7);
        let b = Tracer::silent(Language::Java, 7);
        let choices = ["red", "green", "blue"];
        let picks: Vec<_> = (0..6).map(|_| a.rand_select(&choices)).collect();
        let again: Vec<_> = (0..6).map(|_| b.rand_select(&choices)).collect();
        assert_eq!(picks, again);
        assert!(picks.iter().flatten().all(|pick| choices.contains(pick)));
        assert_eq!(a.rand_select::<&str>(&[]), None);
        assert_eq!(a.rand_select(&["only"]), Some("only"));
    }

    #[test]
    fn set_to_scalar_is_input_over_lhs() {
        let tracer = Tracer::silent(Language::Java, 1);
        let channel = tracer.channel();
        let vars = Node::frame("main");
        let lhs = vars.path("x");
        let mut future = pin!(tracer.set(&lhs, 5, None));
        let mut cx = Context::from_waker(Waker::noop());
        assert!(future.as_mut().poll(&mut cx).is_pending());

        let mut step = channel.take_step().expect("step");
        let Action::Input { element, select_first, answer } = &step.action else {
            panic!("expected input step");
        };
        assert!(*select_first);
        assert!(answer.as_ref().is_some_and(|a| a.matches("5.0")));
        assert_eq!(element.as_ref().map(|t| t.describe()).as_deref(), Some("path frame.x"));

        step.complete(&Resume::Empty);
        assert_eq!(vars.get("x"), Some(Value::from(5)));
    }

    #[test]
    fn set_to_top_level_node_is_connect() {
        let tracer = Tracer::live(Renderer::new(Language::Java), 1);
        let channel = tracer.channel();
        let vars = tracer.add(0.0, 0.0, Node::frame("main"));
        let target = Node::object();
        tracer.add(4.0, 0.0, &target);
        let vars = vars.as_node().expect("node").clone();

        let mut future = pin!(tracer.set(&vars.path("p"), &target, None));
        let mut cx = Context::from_waker(Waker::noop());
        assert!(future.as_mut().poll(&mut cx).is_pending());
        let step = channel.take_step().expect("step");
        assert_eq!(step.kind(), StepKind::Connect);
    }

    #[test]
    fn silent_add_still_marks_top_level() {
        let tracer = Tracer::silent(Language::Java, 1);
        let node = Node::object();
        tracer.add(0.0, 0.0, &node);
        assert!(node.is_top_level());
        assert!(node.element().is_none());
        tracer.remove(&node);
        assert!(!node.is_top_level());
    }
}
