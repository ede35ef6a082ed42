use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, error};

/// Presentation views whose cached data goes stale after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    PollList,
    Dashboard,
}

impl View {
    pub const fn name(self) -> &'static str {
        match self {
            View::PollList => "polls",
            View::Dashboard => "dashboard",
        }
    }
}

pub const MUTATED_VIEWS: [View; 2] = [View::PollList, View::Dashboard];

/// Per-view generation counters. A bumped generation tells clients to refetch.
#[derive(Debug, Default)]
pub struct ViewCache {
    generations: Mutex<HashMap<View, u64>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&self, views: &[View]) {
        match self.generations.lock() {
            Ok(mut generations) => {
                for view in views {
                    let generation = generations.entry(*view).or_insert(0);
                    *generation += 1;
                    debug!("Marked view '{}' stale (generation {})", view.name(), generation);
                }
            }
            Err(e) => error!("Failed to acquire view cache lock: {}", e),
        }
    }

    pub fn generation(&self, view: View) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(&view).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}
