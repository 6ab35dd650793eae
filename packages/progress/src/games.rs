use std::time::{Duration, Instant};

/// `75` -> `1:15`.
pub fn format_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Stopwatch for timed games, counted in whole seconds.
#[derive(Debug, Default)]
pub struct GameTimer {
    started: Option<Instant>,
    accumulated: Duration,
}

impl GameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stops the timer and returns the elapsed seconds.
    pub fn stop(&mut self) -> u64 {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
        self.accumulated.as_secs()
    }

    pub fn elapsed(&self) -> u64 {
        let running = self.started.map(|s| s.elapsed()).unwrap_or_default();
        (self.accumulated + running).as_secs()
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }
}
