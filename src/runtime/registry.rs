use crate::config::TracerConfig;
use crate::error::{TraceError, TraceResult};
use crate::runtime::driver::Driver;
use crate::runtime::routine::Algorithm;
use crate::runtime::shell::Shell;
use indexmap::IndexMap;
use std::rc::Rc;
use std::time::Instant;
use tracing::debug;

struct Exercise {
    algorithm: Rc<dyn Algorithm>,
    config: TracerConfig,
}

/// Exercises in registration order.
#[derive(Default)]
pub struct Registry {
    exercises: IndexMap<String, Exercise>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an exercise; without an id it becomes `exerciseN`.
    /// Returns the id used.
    pub fn register(
        &mut self,
        id: Option<&str>,
        algorithm: impl Algorithm + 'static,
        config: TracerConfig,
    ) -> String {
        let id = id
            .map(str::to_string)
            .unwrap_or_else(|| format!("exercise{}", self.exercises.len() + 1));
        debug!(exercise = %id, "registered");
        self.exercises.insert(
            id.clone(),
            Exercise {
                algorithm: Rc::new(algorithm),
                config,
            },
        );
        id
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.exercises.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// A driver for one exercise, not yet restored.
    pub fn driver(&self, id: &str, shell: Box<dyn Shell>) -> TraceResult<Driver> {
        let exercise = self
            .exercises
            .get(id)
            .ok_or_else(|| TraceError::UnknownExercise(id.to_string()))?;
        Ok(Driver::new(
            id,
            exercise.algorithm.clone(),
            exercise.config.clone(),
            shell,
        ))
    }

    /// One driver per exercise, each restored from its shell's persisted state.
    pub fn initialize<F>(&self, now: Instant, mut make_shell: F) -> TraceResult<Vec<Driver>>
    where
        F: FnMut(&str) -> Box<dyn Shell>,
    {
        self.ids()
            .map(|id| -> TraceResult<Driver> {
                let mut driver = self.driver(id, make_shell(id))?;
                driver.initialize(now)?;
                Ok(driver)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::config::TracerConfig;
    use crate::runtime::tracer::Tracer;

    async fn empty(_sim: Tracer, _data: Option<serde_json::Value>) {}

    #[test]
    fn ids_default_in_registration_order() {
        let mut registry = Registry::new();
        registry.register(None, empty, TracerConfig::default());
        registry.register(Some("lists"), empty, TracerConfig::default());
        registry.register(None, empty, TracerConfig::default());
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["exercise1", "lists", "exercise3"]
        );
    }
}
