//! CLI-specific progress handling for rally-copilot
//!
//! A progress bar counts waypoints reached; callouts are printed above it.

use indicatif::{ProgressBar, ProgressStyle};
use rally_copilot::DisplaySink;

/// Creates a progress bar for waypoint tracking
pub fn create_progress_bar(waypoint_count: u64) -> ProgressBar {
    let pb = ProgressBar::new(waypoint_count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.red} [{elapsed_precise}] [{wide_bar:.red/white}] {pos}/{len} waypoints {msg}")
            .expect("Failed to create progress style")
            .progress_chars("#>-"),
    );
    pb
}

/// Display sink that prints callouts and advances the waypoint bar
pub struct RouteProgress {
    pub pb: ProgressBar,
}

impl RouteProgress {
    /// Create a progress display for a route of `waypoint_count` waypoints
    pub fn new(waypoint_count: u64, message: &str) -> Self {
        let pb = create_progress_bar(waypoint_count);

        // Print initial message to stderr
        eprintln!("{message}");

        Self { pb }
    }

    /// Same display without drawing anything
    #[cfg(test)]
    pub fn hidden(waypoint_count: u64) -> Self {
        let pb = create_progress_bar(waypoint_count);
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        Self { pb }
    }

    pub fn finish(&self) {
        if self.pb.position() >= self.pb.length().unwrap_or(0) {
            self.pb.finish_with_message("🏁 Route complete!");
        } else {
            self.pb.abandon_with_message("⏸️  Navigation stopped");
        }
    }
}

impl DisplaySink for RouteProgress {
    fn display(&self, text: &str) {
        // stdout carries the callouts; the bar itself lives on stderr
        self.pb.suspend(|| println!(">> {text}"));
        self.pb.inc(1);
    }
}
