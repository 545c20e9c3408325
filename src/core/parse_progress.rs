/*
 * Defines the progress handle shared between a background directory parse and
 * the UI-owning thread. The worker only ever adds to the counters, so anything
 * observing the handle sees `completed` and `total` grow monotonically until
 * the parse finishes or is cancelled. Cancelling is done through the same
 * handle the UI shows, which mirrors how a progress indicator doubles as the
 * cancel button of a long import.
 */
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/*
 * Summarizes how a finished (or abandoned) parse went. Skipped entries are the
 * per-entry scan errors that were recovered by leaving the entry out.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseStats {
    pub completed: usize,
    pub total: usize,
    pub skipped_entries: usize,
    pub unreadable_directories: usize,
    pub root_unavailable: bool,
}

#[derive(Debug, Default)]
struct ProgressState {
    completed: AtomicUsize,
    total: AtomicUsize,
    skipped_entries: AtomicUsize,
    unreadable_directories: AtomicUsize,
    root_unavailable: AtomicBool,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

/*
 * A cloneable, thread-safe view of one parse. Clones share the same state, so
 * the controller can hand a clone to a progress indicator while the worker
 * keeps reporting into its own.
 */
#[derive(Debug, Clone, Default)]
pub struct ParseProgress {
    state: Arc<ProgressState>,
}

impl ParseProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> usize {
        self.state.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.state.total.load(Ordering::Acquire)
    }

    /*
     * Fraction of discovered work that is done, clamped to [0, 1]. The total
     * grows while directories are discovered, so the fraction can move
     * backwards; the counters themselves never do.
     */
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return if self.is_finished() { 1.0 } else { 0.0 };
        }
        (self.completed() as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn cancel(&self) {
        if !self.state.cancelled.swap(true, Ordering::AcqRel) {
            log::debug!("ParseProgress: Cancellation requested.");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ParseStats {
        ParseStats {
            completed: self.completed(),
            total: self.total(),
            skipped_entries: self.state.skipped_entries.load(Ordering::Acquire),
            unreadable_directories: self.state.unreadable_directories.load(Ordering::Acquire),
            root_unavailable: self.state.root_unavailable.load(Ordering::Acquire),
        }
    }

    pub(crate) fn add_total(&self, units: usize) {
        self.state.total.fetch_add(units, Ordering::AcqRel);
    }

    pub(crate) fn complete_unit(&self) {
        self.state.completed.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_skipped_entry(&self) {
        self.state.skipped_entries.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_unreadable_directory(&self) {
        self.state
            .unreadable_directories
            .fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn mark_root_unavailable(&self) {
        self.state.root_unavailable.store(true, Ordering::Release);
    }

    pub(crate) fn mark_finished(&self) {
        self.state.finished.store(true, Ordering::Release);
    }
}
