//! Plan validation and normalization.
//!
//! Plans are produced by an external generator or by hand, so times may fall
//! outside the source or collapse to empty windows. `normalize_plan` clamps
//! every window into `[0, total]` and widens degenerate windows to one second
//! ending at the clamped end. Normalizing an already normalized plan is a
//! no-op.

use super::model::EditOperation;
use crate::error::{CoreError, CoreResult};
use std::collections::HashSet;

/// Width given to windows whose start is not before their end.
pub const MIN_WINDOW_SEC: f64 = 1.0;

/// Clamps a time into `[0, total]`; NaN becomes 0.
fn clamp_time(value: f64, total: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, total)
    }
}

/// Clamps a window into the source and repairs degenerate ranges.
#[must_use]
pub fn clamp_range(start_sec: f64, end_sec: f64, total_duration_sec: f64) -> (f64, f64) {
    let total = if total_duration_sec.is_finite() {
        total_duration_sec.max(0.0)
    } else {
        0.0
    };
    let start = clamp_time(start_sec, total);
    let end = clamp_time(end_sec, total);

    if start < end {
        return (start, end);
    }

    let collapsed = ((end - MIN_WINDOW_SEC).max(0.0), end);
    if collapsed.0 < collapsed.1 {
        collapsed
    } else {
        (0.0, MIN_WINDOW_SEC.min(total))
    }
}

/// Validates plan size and normalizes every operation window.
pub fn normalize_plan(
    plan: Vec<EditOperation>,
    total_duration_sec: f64,
    max_operations: usize,
) -> CoreResult<Vec<EditOperation>> {
    if plan.len() > max_operations {
        return Err(CoreError::InvalidPlan(format!(
            "plan has {} operations, the limit is {}",
            plan.len(),
            max_operations
        )));
    }
    if !total_duration_sec.is_finite() || total_duration_sec < 0.0 {
        return Err(CoreError::InvalidPlan(format!(
            "invalid source duration {total_duration_sec}"
        )));
    }

    let mut seen = HashSet::new();
    Ok(plan
        .into_iter()
        .map(|mut op| {
            if !seen.insert(op.id.clone()) {
                log::warn!("Plan contains duplicate operation id '{}'", op.id);
            }
            let (start, end) = clamp_range(op.start_sec, op.end_sec, total_duration_sec);
            if (start, end) != (op.start_sec, op.end_sec) {
                log::debug!(
                    "Normalized '{}' window {}-{} to {}-{}",
                    op.id,
                    op.start_sec,
                    op.end_sec,
                    start,
                    end
                );
            }
            op.start_sec = start;
            op.end_sec = end;
            op
        })
        .collect())
}
