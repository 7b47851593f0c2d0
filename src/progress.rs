//! Progress reporting for sorting runs.

/// Counters passed to a [`ProgressReporter`] after each processed entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Entries processed so far, `1..=total`.
    pub processed: usize,
    /// Size of the directory snapshot.
    pub total: usize,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Receives progress updates from a run.
///
/// `report` is called synchronously on the thread that called
/// [`Relocator::run`](crate::organizer::Relocator::run), once per entry and in
/// order, so implementations may touch caller state without locking.
pub trait ProgressReporter {
    fn report(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressReporter for F {
    fn report(&mut self, progress: Progress) {
        self(progress)
    }
}

/// A reporter that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _progress: Progress) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        {
            let mut reporter = |p: Progress| seen.push(p.processed);
            reporter.report(Progress {
                processed: 1,
                total: 2,
                ..Default::default()
            });
            reporter.report(Progress {
                processed: 2,
                total: 2,
                ..Default::default()
            });
        }
        assert_eq!(seen, [1, 2]);
    }
}
