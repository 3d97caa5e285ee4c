use crate::core::node::{Addr, Node};
use std::fmt;

/// Placeholder shown in a value cell that holds nothing visible.
pub const PLACEHOLDER: &str = "\u{202F}";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Name {
    Field(String),
    Index(usize),
}

impl Name {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Field(field) => field.parse().ok(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => f.write_str(field),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::Field(value.to_string())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self::Field(value)
    }
}

impl From<usize> for Name {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Scalar {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => f.write_str(&format_number(*number)),
            Self::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

/// Integral numbers print without a fraction, like `42` rather than `42.0`.
pub fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

/// What a Path holds.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    Null,
    Addr(Addr),
    Node(Node),
}

impl Value {
    /// The value of a name that was never given one.
    pub fn empty() -> Self {
        Self::Scalar(Scalar::Text(String::new()))
    }

    /// Applies the storage rule: pointers are re-targeted copies, composites alias.
    pub fn wrap(self) -> Self {
        match self {
            Self::Addr(addr) => Self::Addr(Addr::new(addr.deref().clone())),
            other => other,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_number)
    }

    /// Text shown for scalar values; `None` for pointers and nodes.
    pub fn display(&self, null_text: &str) -> Option<String> {
        match self {
            Self::Scalar(scalar) => Some(scalar.to_string()),
            Self::Null => Some(null_text.to_string()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Addr(a), Self::Addr(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => scalar.fmt(f),
            Self::Null => f.write_str("null"),
            Self::Addr(addr) => write!(f, "&{}", addr.deref().name()),
            Self::Node(node) => write!(f, "<{}>", node.kind().label()),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Text(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Number(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Number(value as f64))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Scalar(Scalar::Number(f64::from(value)))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Scalar(Scalar::Number(value as f64))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<Addr> for Value {
    fn from(value: Addr) -> Self {
        Self::Addr(value)
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<&Node> for Value {
    fn from(value: &Node) -> Self {
        Self::Node(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::{Name, Scalar, Value, format_number};
    use crate::core::node::Node;

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn conversions_follow_wrapping_rule() {
        assert_eq!(Value::from("x"), Value::Scalar(Scalar::Text("x".into())));
        assert_eq!(Value::from(7), Value::Scalar(Scalar::Number(7.0)));
        assert_eq!(Value::from(true), Value::Scalar(Scalar::Bool(true)));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::empty().as_scalar().map(Scalar::is_empty), Some(true));
    }

    #[test]
    fn composite_values_alias() {
        let node = Node::object();
        let a = Value::from(&node).wrap();
        let b = Value::from(&node).wrap();
        assert_eq!(a, b);
        node.set("x", 1);
        assert_eq!(a.as_node().and_then(|n| n.get("x")), Some(Value::from(1)));
    }

    #[test]
    fn name_index_parses_numeric_fields() {
        assert_eq!(Name::from("3").index(), Some(3));
        assert_eq!(Name::from(4usize).index(), Some(4));
        assert_eq!(Name::from("next").index(), None);
    }
}
