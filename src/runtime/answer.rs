use crate::core::value::{Scalar, Value, format_number};
use crate::error::TraceResult;
use regex::Regex;
use std::sync::LazyLock;

/// Expected learner input of an input step.
#[derive(Debug, Clone)]
pub enum Answer {
    /// Case-insensitive after trimming.
    Text(String),
    /// Numeric equality after parsing.
    Number(f64),
    /// Must match the whole trimmed input.
    Pattern(Regex),
    /// Any alternative may match.
    AnyOf(Vec<Answer>),
}

static OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\\\+\+|\\\+=|\\\+|--|-=|->|-|\\\*=|\\\*|/=|/|<<|>>|==|<=|>=|=|<|>|,|\\\[|\\\]|\\\(|\\\)|\\\{|\\\}|&&|&|\\\|\\\||\\\||!)",
    )
    .expect("operator pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

impl Answer {
    pub fn matches(&self, input: &str) -> bool {
        let input = input.trim();
        match self {
            Self::Text(text) => text.trim().to_uppercase() == input.to_uppercase(),
            Self::Number(number) => input.parse::<f64>().is_ok_and(|parsed| parsed == *number),
            Self::Pattern(pattern) => Regex::new(&format!("^(?:{})$", pattern.as_str()))
                .is_ok_and(|whole| whole.is_match(input)),
            Self::AnyOf(alternatives) => alternatives.iter().any(|answer| answer.matches(input)),
        }
    }

    /// Text the engine types when it performs the step itself.
    pub fn preferred(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(number) => Some(format_number(*number)),
            Self::Pattern(_) => None,
            Self::AnyOf(alternatives) => alternatives.iter().find_map(Answer::preferred),
        }
    }

    /// Expected input for a scalar value.
    pub fn from_value(value: &Value, null_text: &str) -> Option<Self> {
        match value {
            Value::Scalar(Scalar::Number(number)) => Some(Self::Number(*number)),
            Value::Scalar(scalar) => Some(Self::Text(scalar.to_string())),
            Value::Null => Some(Self::Text(null_text.to_string())),
            Value::Addr(_) | Value::Node(_) => None,
        }
    }

    /// A pattern accepting any of the given code expressions, with optional
    /// whitespace around operators and brackets and an optional trailing `;`.
    /// Whitespace present in an expression stays required.
    pub fn expression<S: AsRef<str>>(alternatives: &[S]) -> TraceResult<Self> {
        let body = alternatives
            .iter()
            .map(|expression| expression_pattern(expression.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"^(?:\s*({body})\s*)$");
        Ok(Self::Pattern(Regex::new(&pattern)?))
    }

    /// `"s"`, `'s'` or `“s”`.
    pub fn quoted(text: &str) -> Self {
        Self::AnyOf(quotes(text))
    }

    /// Like [`Answer::quoted`], also accepting the bare text.
    pub fn quoted_or_bare(text: &str) -> Self {
        let mut alternatives = quotes(text);
        alternatives.push(Self::Text(text.to_string()));
        Self::AnyOf(alternatives)
    }
}

fn quotes(text: &str) -> Vec<Answer> {
    vec![
        Answer::Text(format!("\"{text}\"")),
        Answer::Text(format!("'{text}'")),
        Answer::Text(format!("\u{201C}{text}\u{201D}")),
    ]
}

fn expression_pattern(expression: &str) -> String {
    let mut escaped = String::with_capacity(expression.len() * 2);
    for ch in expression.chars() {
        if matches!(
            ch,
            '\\' | '^' | '$' | '*' | '+' | '?' | '.' | '(' | ')' | '|' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    if let Some(stripped) = escaped.strip_suffix(';') {
        escaped = format!(r"{stripped}\s*;?");
    }
    let spaced = OPERATOR.replace_all(&escaped, r"\s*${1}\s*");
    let spaced = WHITESPACE.replace_all(&spaced, r"\s+");
    spaced.replace(r"\s*\s*", r"\s*")
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Answer {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for Answer {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<Regex> for Answer {
    fn from(value: Regex) -> Self {
        Self::Pattern(value)
    }
}

impl<T: Into<Answer>> From<Vec<T>> for Answer {
    fn from(value: Vec<T>) -> Self {
        Self::AnyOf(value.into_iter().map(Into::into).collect())
    }
}
