//! Run-level progress.
//!
//! Operation `i` of `N` reporting `p` percent maps to
//! `(i / N) * 100 + (p / 100 / N) * 100`. Reports are clamped so the
//! sequence a sink sees never decreases, and a successful run ends with
//! exactly one 100 labelled `Complete`.

use serde::Serialize;
use std::sync::mpsc::Sender;

/// Label of the final report of a successful run.
pub const COMPLETE_LABEL: &str = "Complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressState {
    Running,
    Completed,
}

/// One progress report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineProgress {
    pub percent: f64,
    pub label: String,
    pub state: ProgressState,
}

/// Receiver of progress reports.
pub trait ProgressSink {
    fn report(&mut self, progress: PipelineProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(PipelineProgress),
{
    fn report(&mut self, progress: PipelineProgress) {
        self(progress);
    }
}

impl ProgressSink for Sender<PipelineProgress> {
    fn report(&mut self, progress: PipelineProgress) {
        if self.send(progress).is_err() {
            log::trace!("Progress receiver dropped");
        }
    }
}

/// Combines per-operation progress into the run percentage.
#[derive(Debug)]
pub struct ProgressAggregator {
    total_operations: usize,
    last_percent: f64,
}

impl ProgressAggregator {
    #[must_use]
    pub fn new(total_operations: usize) -> Self {
        Self {
            total_operations,
            last_percent: 0.0,
        }
    }

    /// Run percentage for operation `index` at `op_percent`.
    #[must_use]
    pub fn global_percent(&self, index: usize, op_percent: f64) -> f64 {
        if self.total_operations == 0 {
            return 100.0;
        }
        let n = self.total_operations as f64;
        let op = op_percent.clamp(0.0, 100.0);
        ((index as f64 / n) * 100.0 + (op / 100.0 / n) * 100.0).min(100.0)
    }

    /// Reports operation progress, never going backwards.
    pub fn report(&mut self, index: usize, op_percent: f64, label: &str, sink: &mut dyn ProgressSink) {
        let percent = self.global_percent(index, op_percent).max(self.last_percent);
        self.last_percent = percent;
        sink.report(PipelineProgress {
            percent,
            label: label.to_string(),
            state: ProgressState::Running,
        });
    }

    /// Reports the final 100.
    pub fn complete(&mut self, sink: &mut dyn ProgressSink) {
        self.last_percent = 100.0;
        sink.report(PipelineProgress {
            percent: 100.0,
            label: COMPLETE_LABEL.to_string(),
            state: ProgressState::Completed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_splits_evenly() {
        let agg = ProgressAggregator::new(4);
        assert_eq!(agg.global_percent(0, 0.0), 0.0);
        assert_eq!(agg.global_percent(0, 100.0), 25.0);
        assert_eq!(agg.global_percent(2, 50.0), 62.5);
        assert_eq!(agg.global_percent(3, 100.0), 100.0);
    }

    #[test]
    fn reports_never_decrease() {
        let mut seen = Vec::new();
        let mut sink = |p: PipelineProgress| seen.push(p.percent);
        let mut agg = ProgressAggregator::new(2);
        agg.report(0, 80.0, "a", &mut sink);
        agg.report(0, 40.0, "a", &mut sink);
        agg.report(1, 0.0, "b", &mut sink);
        agg.complete(&mut sink);
        assert_eq!(seen, vec![40.0, 40.0, 50.0, 100.0]);
    }

    #[test]
    fn channel_sink_forwards_reports() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut sink = tx;
        let mut agg = ProgressAggregator::new(1);
        agg.complete(&mut sink);
        let last = rx.recv().unwrap();
        assert_eq!(last.label, COMPLETE_LABEL);
        assert_eq!(last.state, ProgressState::Completed);
    }
}
