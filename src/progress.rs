/**
 * Progress Reporting
 *
 * Advisory hook ticked by the pipeline: once per recipe operation, twenty
 * times over each halftone pass and a few times for setup and cleanup. The
 * total is known up front from the recipe. There is no cancellation.
 */

use indicatif::{ProgressBar, ProgressStyle};

/// Receiver of progress ticks
pub trait Progress {
    /// Announce the total number of steps
    fn set_length(&mut self, _steps: u64) {}

    /// Advance by one step
    fn step(&mut self) {}

    /// Describe the current stage
    fn message(&mut self, _message: &str) {}

    /// The run is complete
    fn finish(&mut self) {}
}

/// Progress hook that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

impl Progress for ProgressBar {
    fn set_length(&mut self, steps: u64) {
        ProgressBar::set_length(self, steps);
    }

    fn step(&mut self) {
        self.inc(1);
    }

    fn message(&mut self, message: &str) {
        self.set_message(message.to_string());
    }

    fn finish(&mut self) {
        self.finish_with_message("Done");
    }
}

/// Terminal progress bar in the crate's usual style
pub fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}/{len} {msg}") {
        bar.set_style(style.progress_chars("##-"));
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_counts_steps() {
        let mut bar = ProgressBar::hidden();
        Progress::set_length(&mut bar, 5);
        for _ in 0..3 {
            bar.step();
        }
        assert_eq!(bar.position(), 3);
        assert_eq!(bar.length(), Some(5));
        Progress::finish(&mut bar);
        assert!(bar.is_finished());
    }

    #[test]
    fn test_no_progress_is_inert() {
        let mut progress = NoProgress;
        progress.set_length(10);
        progress.step();
        progress.message("ignored");
        progress.finish();
    }
}
