//! Terminal progress bar for a merge run.

use indicatif::{ProgressBar, ProgressStyle};
use tilestitch::stream::StreamProgress;

const TEMPLATE: &str = "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} tiles ({eta}) {msg}";

/// Progress bar fed by the streamer's callback.
///
/// The total is only known once the grid is scanned, so the bar starts
/// empty and picks up its length from the first update.
pub struct MergeProgress {
    bar: ProgressBar,
}

impl MergeProgress {
    /// Create a bar; a disabled bar draws nothing.
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    /// Apply one progress snapshot.
    pub fn update(&self, progress: &StreamProgress) {
        if self.bar.length() != Some(progress.total) {
            self.bar.set_length(progress.total);
        }
        self.bar.set_position(progress.emitted);
        self.bar.set_message(format!("row {}", progress.row));
    }

    /// Finish the bar, leaving it on screen.
    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }

    /// Remove the bar after a failure.
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
