//! Shared state for the HTTP handlers

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::store::Store;

/// Source of "now" for handlers
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// Local wall clock
    System,
    /// Frozen time, for tests
    #[allow(dead_code)]
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::System => Local::now().naive_local(),
            Self::Fixed(at) => *at,
        }
    }
}

/// State cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// Dashboard category order; the last one is the fallback bucket
    pub categories: Arc<Vec<String>>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(store: Store, categories: Vec<String>) -> Self {
        Self {
            store,
            categories: Arc::new(categories),
            clock: Clock::System,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}
