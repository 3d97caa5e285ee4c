use crate::error::TraceResult;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Timing of the driver, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Delays {
    pub play_step: u64,
    pub show_step: u64,
    pub after_action: u64,
    pub good_marker: u64,
    pub after_error: u64,
    pub enter_message: u64,
    pub edit_complete: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            play_step: 1000,
            show_step: 1000,
            after_action: 1000,
            good_marker: 2000,
            after_error: 500,
            enter_message: 10_000,
            edit_complete: 20_000,
        }
    }
}

impl Delays {
    pub fn play_step(&self) -> Duration {
        Duration::from_millis(self.play_step)
    }

    pub fn show_step(&self) -> Duration {
        Duration::from_millis(self.show_step)
    }

    pub fn after_action(&self) -> Duration {
        Duration::from_millis(self.after_action)
    }

    pub fn good_marker(&self) -> Duration {
        Duration::from_millis(self.good_marker)
    }

    pub fn after_error(&self) -> Duration {
        Duration::from_millis(self.after_error)
    }

    pub fn enter_message(&self) -> Duration {
        Duration::from_millis(self.enter_message)
    }

    pub fn edit_complete(&self) -> Duration {
        Duration::from_millis(self.edit_complete)
    }
}

/// Language the traced program is written in; affects null display and
/// whether value cells can be pointer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Java,
    Cpp,
    Python,
}

impl Language {
    pub fn null_text(self) -> &'static str {
        match self {
            Self::Python => "None",
            _ => "null",
        }
    }

    /// Value cells have addresses in C++, so they are selectable pointer targets.
    pub fn addressable_cells(self) -> bool {
        self == Self::Cpp
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    pub delays: Delays,
    pub seed: Option<u64>,
    pub language: Language,
    pub show_me_after: u32,
    pub interactive: bool,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            delays: Delays::default(),
            seed: None,
            language: Language::default(),
            show_me_after: 2,
            interactive: true,
        }
    }
}

impl TracerConfig {
    pub fn from_yaml(source: &str) -> TraceResult<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load(path: &Path) -> TraceResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Language, TracerConfig};

    #[test]
    fn missing_fields_take_defaults() {
        let config = TracerConfig::from_yaml("seed: 7\ndelays:\n  after_error: 250\n")
            .expect("config should parse");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.delays.after_error, 250);
        assert_eq!(config.delays.play_step, 1000);
        assert_eq!(config.show_me_after, 2);
        assert!(config.interactive);
    }

    #[test]
    fn language_is_lowercase() {
        let config = TracerConfig::from_yaml("language: python").expect("config should parse");
        assert_eq!(config.language, Language::Python);
        assert_eq!(config.language.null_text(), "None");
    }

    #[test]
    fn empty_source_is_default() {
        assert_eq!(
            TracerConfig::from_yaml("").expect("config should parse"),
            TracerConfig::default()
        );
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert!(TracerConfig::from_yaml("language: cobol").is_err());
    }
}
