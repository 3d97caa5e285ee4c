use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum SchedulerCommand<E> {
    EmitAfter {
        key: String,
        delay: Duration,
        event: E,
    },
    /// Like `EmitAfter`, but supersedes anything pending under the same key.
    Debounce {
        key: String,
        delay: Duration,
        event: E,
    },
    Cancel {
        key: String,
    },
}

#[derive(Debug, Clone)]
struct Guard {
    key: String,
    version: u64,
}

#[derive(Debug, Clone)]
struct DelayedTask<E> {
    due_at: Instant,
    seq: u64,
    guard: Guard,
    event: E,
}

/// Keyed timers driven by an explicit clock.
#[derive(Debug)]
pub struct Scheduler<E> {
    delayed: Vec<DelayedTask<E>>,
    key_versions: HashMap<String, u64>,
    seq: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            delayed: Vec::new(),
            key_versions: HashMap::new(),
            seq: 0,
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, command: SchedulerCommand<E>, now: Instant) {
        match command {
            SchedulerCommand::EmitAfter { key, delay, event } => {
                let version = *self.key_versions.entry(key.clone()).or_insert(0);
                self.push(now + delay, Guard { key, version }, event);
            }
            SchedulerCommand::Debounce { key, delay, event } => {
                let version = self.bump_version(&key);
                self.push(now + delay, Guard { key, version }, event);
            }
            SchedulerCommand::Cancel { key } => {
                self.bump_version(&key);
            }
        }
    }

    /// Removes and returns every live task due at `now`, earliest first.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<E> {
        let mut due = Vec::new();
        let mut idx = 0usize;
        while idx < self.delayed.len() {
            if self.delayed[idx].due_at <= now {
                due.push(self.delayed.swap_remove(idx));
            } else {
                idx += 1;
            }
        }
        due.sort_by_key(|task| (task.due_at, task.seq));
        due.into_iter()
            .filter(|task| self.task_is_valid(task))
            .map(|task| task.event)
            .collect()
    }

    /// When the earliest live task falls due.
    pub fn next_due(&self) -> Option<Instant> {
        self.delayed
            .iter()
            .filter(|task| self.task_is_valid(task))
            .map(|task| task.due_at)
            .min()
    }

    /// Drops every pending task.
    pub fn clear(&mut self) {
        for task in std::mem::take(&mut self.delayed) {
            self.bump_version(&task.guard.key);
        }
    }

    fn push(&mut self, due_at: Instant, guard: Guard, event: E) {
        self.seq += 1;
        self.delayed.push(DelayedTask {
            due_at,
            seq: self.seq,
            guard,
            event,
        });
    }

    fn task_is_valid(&self, task: &DelayedTask<E>) -> bool {
        let current = *self.key_versions.get(&task.guard.key).unwrap_or(&0);
        current == task.guard.version
    }

    fn bump_version(&mut self, key: &str) -> u64 {
        let entry = self.key_versions.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }
}

#[cfg(test)]
mod tests {
    use super::{Scheduler, SchedulerCommand};
    use std::time::{Duration, Instant};

    fn after(key: &str, ms: u64, event: u32) -> SchedulerCommand<u32> {
        SchedulerCommand::EmitAfter {
            key: key.to_string(),
            delay: Duration::from_millis(ms),
            event,
        }
    }

    #[test]
    fn drains_in_due_order() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(after("b", 20, 2), now);
        scheduler.schedule(after("a", 10, 1), now);
        scheduler.schedule(after("c", 30, 3), now);

        assert!(scheduler.drain_ready(now).is_empty());
        assert_eq!(scheduler.next_due(), Some(now + Duration::from_millis(10)));
        assert_eq!(scheduler.drain_ready(now + Duration::from_millis(25)), vec![1, 2]);
        assert_eq!(scheduler.drain_ready(now + Duration::from_millis(30)), vec![3]);
        assert_eq!(scheduler.next_due(), None);
    }

    #[test]
    fn debounce_keeps_only_latest() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        for (offset, event) in [(0, 1), (5, 2), (9, 3)] {
            scheduler.schedule(
                SchedulerCommand::Debounce {
                    key: "typing".to_string(),
                    delay: Duration::from_millis(10),
                    event,
                },
                now + Duration::from_millis(offset),
            );
        }
        assert!(scheduler.drain_ready(now + Duration::from_millis(15)).is_empty());
        assert_eq!(scheduler.drain_ready(now + Duration::from_millis(19)), vec![3]);
    }

    #[test]
    fn cancel_and_clear_invalidate_pending() {
        let now = Instant::now();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(after("x", 10, 1), now);
        scheduler.schedule(SchedulerCommand::Cancel { key: "x".to_string() }, now);
        scheduler.schedule(after("y", 10, 2), now);
        assert_eq!(scheduler.drain_ready(now + Duration::from_secs(1)), vec![2]);

        scheduler.schedule(after("z", 10, 3), now);
        scheduler.clear();
        assert_eq!(scheduler.next_due(), None);
        scheduler.schedule(after("z", 10, 4), now);
        assert_eq!(scheduler.drain_ready(now + Duration::from_secs(1)), vec![4]);
    }
}
