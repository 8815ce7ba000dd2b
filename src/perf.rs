//! Opt-in timing of render and save paths.
//!
//! A [`Scope`] created while timing is off costs nothing and reports
//! nothing. While on, dropping it emits a `perf` target tracing event.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static TIMING: AtomicBool = AtomicBool::new(false);

#[derive(Debug)]
#[must_use = "the scope measures until it is dropped"]
pub struct Scope {
    label: &'static str,
    started: Option<Instant>,
}

impl Scope {
    /// Time since the scope opened, `None` when timing was off.
    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|started| started.elapsed())
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if let Some(elapsed) = self.elapsed() {
            let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
            tracing::info!(target: "perf", scope = self.label, elapsed_ms, "timing");
        }
    }
}

pub fn set_enabled(enabled: bool) {
    TIMING.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    TIMING.load(Ordering::Relaxed)
}

pub fn scope(label: &'static str) -> Scope {
    Scope {
        label,
        started: is_enabled().then(Instant::now),
    }
}
