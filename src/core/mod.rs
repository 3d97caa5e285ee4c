pub mod anchor;
pub mod node;
pub mod value;

pub use anchor::{AnchorId, Capabilities, Marker};
pub use node::{Addr, Node, NodeConfig, NodeKind, NodeObserver, Path, Shape};
pub use value::{Name, PLACEHOLDER, Scalar, Value};
