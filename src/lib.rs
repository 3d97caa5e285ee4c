pub mod config;
pub mod core;
pub mod demos;
pub mod error;
pub mod runtime;
pub mod terminal;
pub mod ui;

pub use config::{Delays, Language, TracerConfig};
pub use error::{TraceError, TraceResult};

pub use crate::core::anchor;
pub use crate::core::node;
pub use crate::core::value;

pub use crate::runtime::driver;
pub use crate::runtime::registry;
pub use crate::runtime::shell;
pub use crate::runtime::step;
pub use crate::runtime::tracer;

pub use crate::ui::canvas;
pub use crate::ui::render;
pub use crate::ui::widgets;
