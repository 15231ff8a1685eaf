//! Edit plans: typed operations, JSON loading and normalization.

pub mod model;
pub mod normalize;

pub use model::{
    CaptionAnimation, CaptionPosition, CaptionStyle, EditAction, EditOperation, OperationKind,
    OperationStatus, OverlayPosition,
};
pub use normalize::{clamp_range, normalize_plan};

use crate::error::{CoreError, CoreResult};
use serde::Deserialize;
use std::path::Path;

/// An ordered list of operations.
pub type Plan = Vec<EditOperation>;

/// Accepts a bare array or an object wrapping it.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDocument {
    Operations(Plan),
    Wrapped {
        #[serde(alias = "plan")]
        operations: Plan,
    },
}

/// Parses a plan from JSON text.
pub fn parse_plan(json: &str) -> CoreResult<Plan> {
    let document: PlanDocument = serde_json::from_str(json)?;
    Ok(match document {
        PlanDocument::Operations(plan) | PlanDocument::Wrapped { operations: plan } => plan,
    })
}

/// Reads and parses a plan file.
pub fn load_plan(path: &Path) -> CoreResult<Plan> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CoreError::InvalidPlan(format!("cannot read plan {}: {e}", path.display()))
    })?;
    parse_plan(&text)
}
