//! Progress display for the run loop
//!
//! Wraps indicatif so the orchestrator can narrate probing without
//! knowing about terminals. Disabled in quiet mode and when writing JSON.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter over the targets being processed
pub struct Progress {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a reporter; disabled reporters swallow every call
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Start the bar for a known number of targets
    pub fn start(&mut self, total: u64) {
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:28.green/white}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("█▓░"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Announce the target currently being checked
    pub fn checking(&self, display_name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("checking {}", display_name));
        }
    }

    /// Announce the action currently running
    pub fn updating(&self, display_name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("updating {}", display_name));
        }
    }

    /// One target finished
    pub fn target_done(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Run a closure with the bar hidden, for interactive prompts
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    /// Remove the bar
    pub fn finish(&mut self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        self.bar = None;
    }
}
