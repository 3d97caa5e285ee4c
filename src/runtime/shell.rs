use serde::{Deserialize, Serialize};

/// Durable exercise state, the only contract shared with the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    pub data: Option<serde_json::Value>,
    pub last_step: i64,
    pub correct: u32,
    pub errors: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            data: None,
            last_step: -1,
            correct: 0,
            errors: 0,
        }
    }
}

impl Progress {
    pub fn from_json(text: &str) -> crate::error::TraceResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> crate::error::TraceResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn has_attempts(&self) -> bool {
        self.correct > 0 || self.errors > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructionOptions {
    pub secondary: Option<String>,
    /// The step advances on an explicit "next".
    pub next_button: bool,
    pub remove_bad_markers: bool,
}

impl InstructionOptions {
    pub fn secondary(text: impl Into<String>) -> Self {
        Self {
            secondary: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_remove_bad_markers(mut self) -> Self {
        self.remove_bad_markers = true;
        self
    }
}

/// What a failed attempt offers besides retrying the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorOffer {
    /// Consecutive failures on the current step.
    pub tries: u32,
    pub show_me: bool,
}

/// Host callbacks: instructions, scoring feedback and persistence.
pub trait Shell {
    /// `None` clears the primary instruction and only updates options.
    fn instruction(&mut self, prompt: Option<&str>, options: &InstructionOptions);

    fn warning(&mut self, text: &str);

    fn correct(&mut self, progress: &Progress, score: f64);

    fn error(&mut self, progress: &Progress, score: f64, offer: &ErrorOffer);

    fn done(&mut self, progress: &Progress);

    fn play_finished(&mut self) {}

    /// Persisted state to resume from, if any.
    fn restore(&mut self) -> Option<Progress> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;

    #[test]
    fn progress_uses_host_field_names() {
        let progress = Progress {
            data: Some(serde_json::json!({"n": 3})),
            last_step: 4,
            correct: 2,
            errors: 1,
        };
        let json = progress.to_json().expect("serializes");
        assert!(json.contains("\"lastStep\":4"));
        assert_eq!(Progress::from_json(&json).expect("parses"), progress);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let progress = Progress::from_json("{\"correct\": 1}").expect("parses");
        assert_eq!(progress.last_step, -1);
        assert_eq!(progress.errors, 0);
        assert!(progress.data.is_none());
        assert!(progress.has_attempts());
    }
}
