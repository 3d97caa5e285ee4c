pub mod canvas;
pub mod geometry;
pub mod render;
pub mod route;
pub mod span;
pub mod style;
pub mod widgets;

pub use canvas::{Canvas, Edge, Visual, VisualKind};
pub use geometry::{Point, Rect, Size};
pub use render::Renderer;
pub use route::{Route, RouteShape};
pub use style::{Color, Style};
pub use widgets::{Code, Item, Terminal};
