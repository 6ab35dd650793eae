#![allow(dead_code)]

use std::sync::Arc;

use bootcamp_progress::{
    Catalog, Clock, ManualClock, MemoryStorage, ProgressEngine, ProgressStore,
};
use chrono::{DateTime, FixedOffset, TimeZone};

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(year, month, day, hour, 0, 0)
        .unwrap()
}

pub struct Harness {
    pub backend: MemoryStorage,
    pub clock: Arc<ManualClock>,
    pub engine: Arc<ProgressEngine>,
}

impl Harness {
    pub fn new() -> Self {
        Self::starting_at(at(2026, 3, 2, 12))
    }

    pub fn starting_at(now: DateTime<FixedOffset>) -> Self {
        let backend = MemoryStorage::new();
        let clock = Arc::new(ManualClock::new(now));
        let engine = Self::engine_on(&backend, &clock);
        Self {
            backend,
            clock,
            engine,
        }
    }

    /// Another execution context sharing the same storage.
    pub fn second_tab(&self) -> Arc<ProgressEngine> {
        Self::engine_on(&self.backend, &self.clock)
    }

    fn engine_on(backend: &MemoryStorage, clock: &Arc<ManualClock>) -> Arc<ProgressEngine> {
        let clock: Arc<dyn Clock> = clock.clone();
        let store = ProgressStore::new(Arc::new(backend.clone()), clock);
        Arc::new(ProgressEngine::new(store, Arc::new(Catalog::builtin())))
    }

    pub fn next_day(&self) {
        self.clock.advance(chrono::Duration::days(1));
    }
}
