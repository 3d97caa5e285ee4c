pub mod answer;
pub mod driver;
pub mod event;
pub mod registry;
pub mod routine;
pub mod scheduler;
pub mod shell;
pub mod step;
pub mod tracer;

pub use answer::Answer;
pub use driver::{Driver, Phase};
pub use event::{LearnerEvent, Outcome, TimerEvent};
pub use registry::Registry;
pub use routine::{Algorithm, Routine};
pub use scheduler::{Scheduler, SchedulerCommand};
pub use shell::{ErrorOffer, InstructionOptions, Progress, Shell};
pub use step::{Action, Resume, Step, StepKind, StepSummary, Target};
pub use tracer::{StepFuture, Tracer};
