pub mod console;
pub mod session;
pub mod view;
pub mod writer;

pub use console::ConsoleShell;
pub use session::{Command, Session};
pub use view::Line;
pub use writer::Writer;
