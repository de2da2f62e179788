use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reporover::sync::SyncProgress;

/// Consolidated progress state to avoid multiple mutex locks.
#[derive(Default)]
struct ProgressState {
    /// Spinner shown while listing.
    list_bar: Option<ProgressBar>,
    /// One tick per finished detail fetch.
    enrich_bar: Option<ProgressBar>,
    /// One tick per outcome the collector handled.
    save_bar: Option<ProgressBar>,
    enrich_errors: usize,
    save_errors: usize,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self::with_multi(MultiProgress::new())
    }

    /// Reporter that draws nowhere. Used in tests.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self::with_multi(MultiProgress::with_draw_target(
            indicatif::ProgressDrawTarget::hidden(),
        ))
    }

    fn with_multi(multi: MultiProgress) -> Self {
        Self {
            multi,
            state: Mutex::new(ProgressState::default()),
        }
    }

    fn counted_bar(&self, len: usize, prefix: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix(format!("{prefix:10}"));
        pb
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::ListingRepositories { group } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_prefix(format!("{:10}", "Listing"));
                pb.set_message(format!("Fetching repository list for {group}..."));
                pb.enable_steady_tick(Duration::from_millis(100));
                state.list_bar = Some(pb);
            }

            SyncProgress::ListComplete { total } => {
                if let Some(pb) = state.list_bar.take() {
                    pb.finish_with_message(format!("Found {total} repositories"));
                }
            }

            SyncProgress::EnrichingRepositories { count, concurrency } => {
                let enrich = self.counted_bar(count, "Enriching");
                enrich.set_message(format!("{concurrency} workers"));
                let save = self.counted_bar(count, "Saving");
                state.enrich_bar = Some(enrich);
                state.save_bar = Some(save);
            }

            SyncProgress::Enriched { name, .. } => {
                if let Some(ref pb) = state.enrich_bar {
                    pb.inc(1);
                    pb.set_message(name);
                }
            }

            SyncProgress::EnrichError { name, .. } => {
                state.enrich_errors += 1;
                if let Some(ref pb) = state.enrich_bar {
                    pb.inc(1);
                    pb.set_message(format!("{} failed ({name})", state.enrich_errors));
                }
                // The collector counts a fetch failure as handled.
                if let Some(ref pb) = state.save_bar {
                    pb.inc(1);
                }
            }

            SyncProgress::Persisted { name, .. } => {
                if let Some(ref pb) = state.save_bar {
                    pb.inc(1);
                    pb.set_message(name);
                }
            }

            SyncProgress::PersistError { name, .. } => {
                state.save_errors += 1;
                if let Some(ref pb) = state.save_bar {
                    pb.inc(1);
                    pb.set_message(format!("{} failed ({name})", state.save_errors));
                }
            }

            SyncProgress::PassComplete { succeeded, failed } => {
                if let Some(ref pb) = state.enrich_bar {
                    let fetched = (pb.position() as usize).saturating_sub(state.enrich_errors);
                    pb.finish_with_message(format!("{fetched} fetched"));
                }
                if let Some(ref pb) = state.save_bar {
                    pb.finish_with_message(format!("{succeeded} saved, {failed} failed"));
                }
            }

            _ => {}
        }
    }

    /// Current positions of the enrich and save bars.
    #[cfg(test)]
    pub fn positions(&self) -> (Option<u64>, Option<u64>) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (
            state.enrich_bar.as_ref().map(ProgressBar::position),
            state.save_bar.as_ref().map(ProgressBar::position),
        )
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in [&state.list_bar, &state.enrich_bar, &state.save_bar]
            .into_iter()
            .flatten()
        {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
