// ============================================================================
// cutlist-core/src/plan/model.rs
// ============================================================================
//
// PLAN MODEL: Typed edit operations
//
// Plans arrive as JSON with an untyped `params` object per operation. At the
// serde boundary each operation is converted into an `EditAction`, a tagged
// union carrying only the fields its kind uses, with defaults applied. A
// known kind with missing or malformed parameters becomes
// `EditAction::Invalid` and an unknown kind becomes `EditAction::Unsupported`;
// the sequencer degrades both to a passthrough copy.
//
// KEY COMPONENTS:
// - EditOperation: One step of a plan (id, window, label, status, action)
// - EditAction: Per-kind typed parameters
// - OperationKind: The nine supported kinds
// - OverlayPosition / CaptionPosition / CaptionAnimation: Parameter enums

use crate::assets::{AssetReference, AssetRole};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

// ============================================================================
// DEFAULTS
// ============================================================================

pub const DEFAULT_EFFECT_STRENGTH: f64 = 50.0;
pub const DEFAULT_COLOR_PRESET: &str = "warm";
pub const DEFAULT_COLOR_INTENSITY: f64 = 100.0;
pub const DEFAULT_OVERLAY_SCALE: f64 = 0.3;
pub const DEFAULT_AUDIO_VOLUME: f64 = 1.0;
pub const DEFAULT_CAPTION_FONT_SIZE: u32 = 72;
pub const DEFAULT_CAPTION_FONT_COLOR: &str = "white";
pub const DEFAULT_CAPTION_BG_COLOR: &str = "black@0.7";
pub const DEFAULT_CAPTION_FADE_SEC: f64 = 0.3;

// ============================================================================
// OPERATION KINDS
// ============================================================================

/// The operation kinds the pipeline knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    RemoveSilence,
    Effect,
    OverlayAudio,
    OverlayVideo,
    OverlayImage,
    Captions,
    Trim,
    Speed,
    ColorGrade,
}

impl OperationKind {
    pub const ALL: [OperationKind; 9] = [
        OperationKind::RemoveSilence,
        OperationKind::Effect,
        OperationKind::OverlayAudio,
        OperationKind::OverlayVideo,
        OperationKind::OverlayImage,
        OperationKind::Captions,
        OperationKind::Trim,
        OperationKind::Speed,
        OperationKind::ColorGrade,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::RemoveSilence => "remove_silence",
            OperationKind::Effect => "effect",
            OperationKind::OverlayAudio => "overlay_audio",
            OperationKind::OverlayVideo => "overlay_video",
            OperationKind::OverlayImage => "overlay_image",
            OperationKind::Captions => "captions",
            OperationKind::Trim => "trim",
            OperationKind::Speed => "speed",
            OperationKind::ColorGrade => "color_grade",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    #[default]
    Planned,
    Rendered,
}

// ============================================================================
// PARAMETER ENUMS
// ============================================================================

/// Placement of an overlay within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl OverlayPosition {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" => Some(OverlayPosition::TopLeft),
            "top-right" => Some(OverlayPosition::TopRight),
            "bottom-left" => Some(OverlayPosition::BottomLeft),
            "bottom-right" => Some(OverlayPosition::BottomRight),
            "center" | "centre" => Some(OverlayPosition::Center),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayPosition::TopLeft => "top-left",
            OverlayPosition::TopRight => "top-right",
            OverlayPosition::BottomLeft => "bottom-left",
            OverlayPosition::BottomRight => "bottom-right",
            OverlayPosition::Center => "center",
        }
    }
}

/// Vertical placement of caption text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionPosition {
    Top,
    Center,
    Bottom,
}

impl CaptionPosition {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "top" => Some(CaptionPosition::Top),
            "center" | "centre" | "middle" => Some(CaptionPosition::Center),
            "bottom" => Some(CaptionPosition::Bottom),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CaptionPosition::Top => "top",
            CaptionPosition::Center => "center",
            CaptionPosition::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionAnimation {
    Fade,
    None,
}

impl CaptionAnimation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CaptionAnimation::Fade => "fade",
            CaptionAnimation::None => "none",
        }
    }
}

/// Caption styling and content.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub text: String,
    pub position: CaptionPosition,
    pub animation: CaptionAnimation,
    pub font_size: u32,
    pub font_color: String,
    pub bg_color: String,
    pub fade_duration: f64,
}

// ============================================================================
// EDIT ACTION
// ============================================================================

/// Typed parameters for one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// Thresholds are `None` when the plan leaves them to the configured defaults.
    RemoveSilence {
        min_silence_sec: Option<f64>,
        threshold_db: Option<f64>,
    },
    /// A named visual or audio effect with a 0-100 strength.
    Effect { name: String, strength: f64 },
    ColorGrade { preset: String, intensity: f64 },
    Captions(CaptionStyle),
    OverlayImage {
        asset: AssetReference,
        position: OverlayPosition,
        scale: f64,
    },
    OverlayVideo {
        asset: AssetReference,
        position: OverlayPosition,
        scale: f64,
    },
    OverlayAudio {
        asset: AssetReference,
        volume: f64,
        loop_audio: bool,
    },
    Trim,
    Speed { factor: f64 },
    /// A known kind whose parameters could not be used.
    Invalid {
        kind: OperationKind,
        reason: String,
        params: Map<String, Value>,
    },
    /// A kind this pipeline does not know.
    Unsupported {
        kind: String,
        params: Map<String, Value>,
    },
}

impl EditAction {
    /// Wire name of the operation kind.
    #[must_use]
    pub fn kind_name(&self) -> &str {
        match self.kind() {
            Some(kind) => kind.as_str(),
            None => match self {
                EditAction::Unsupported { kind, .. } => kind,
                _ => "unknown",
            },
        }
    }

    /// The known kind, or `None` for unsupported operations.
    #[must_use]
    pub fn kind(&self) -> Option<OperationKind> {
        Some(match self {
            EditAction::RemoveSilence { .. } => OperationKind::RemoveSilence,
            EditAction::Effect { .. } => OperationKind::Effect,
            EditAction::ColorGrade { .. } => OperationKind::ColorGrade,
            EditAction::Captions(_) => OperationKind::Captions,
            EditAction::OverlayImage { .. } => OperationKind::OverlayImage,
            EditAction::OverlayVideo { .. } => OperationKind::OverlayVideo,
            EditAction::OverlayAudio { .. } => OperationKind::OverlayAudio,
            EditAction::Trim => OperationKind::Trim,
            EditAction::Speed { .. } => OperationKind::Speed,
            EditAction::Invalid { kind, .. } => *kind,
            EditAction::Unsupported { .. } => return None,
        })
    }

    #[must_use]
    pub fn is_remove_silence(&self) -> bool {
        matches!(self, EditAction::RemoveSilence { .. })
    }

    /// Builds the typed action for a wire operation.
    #[must_use]
    pub fn from_params(kind_name: &str, label: &str, params: Map<String, Value>) -> Self {
        let Some(kind) = OperationKind::from_name(kind_name) else {
            return EditAction::Unsupported {
                kind: kind_name.to_string(),
                params,
            };
        };
        match parse_action(kind, label, &params) {
            Ok(action) => action,
            Err(reason) => EditAction::Invalid {
                kind,
                reason,
                params,
            },
        }
    }

    /// Regenerates the wire `params` object.
    #[must_use]
    pub fn to_params(&self) -> Map<String, Value> {
        let value = match self {
            EditAction::RemoveSilence {
                min_silence_sec,
                threshold_db,
            } => {
                let mut map = Map::new();
                if let Some(min) = min_silence_sec {
                    map.insert("minSilence".to_string(), json!(min));
                }
                if let Some(db) = threshold_db {
                    map.insert("thresholdDb".to_string(), json!(db));
                }
                return map;
            }
            EditAction::Effect { name, strength } => json!({ "effect": name, "strength": strength }),
            EditAction::ColorGrade { preset, intensity } => {
                json!({ "preset": preset, "intensity": intensity })
            }
            EditAction::Captions(style) => json!({
                "text": style.text,
                "position": style.position.as_str(),
                "animation": style.animation.as_str(),
                "fontSize": style.font_size,
                "fontColor": style.font_color,
                "bgColor": style.bg_color,
                "fadeDuration": style.fade_duration,
            }),
            EditAction::OverlayImage {
                asset,
                position,
                scale,
            } => json!({ "imagePath": asset.to_param(), "position": position.as_str(), "scale": scale }),
            EditAction::OverlayVideo {
                asset,
                position,
                scale,
            } => json!({ "videoPath": asset.to_param(), "position": position.as_str(), "scale": scale }),
            EditAction::OverlayAudio {
                asset,
                volume,
                loop_audio,
            } => json!({ "audioPath": asset.to_param(), "volume": volume, "loop": loop_audio }),
            EditAction::Trim => json!({}),
            EditAction::Speed { factor } => json!({ "speed": factor }),
            EditAction::Invalid { params, .. } | EditAction::Unsupported { params, .. } => {
                return params.clone();
            }
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

// ============================================================================
// PARAMETER PARSING
// ============================================================================

fn parse_action(kind: OperationKind, label: &str, params: &Map<String, Value>) -> Result<EditAction, String> {
    Ok(match kind {
        OperationKind::RemoveSilence => EditAction::RemoveSilence {
            min_silence_sec: positive(number(params, &["minSilence", "minSilenceSec"])?, "minSilence")?,
            threshold_db: number(params, &["thresholdDb", "threshold"])?,
        },
        OperationKind::Effect => {
            let name = string(params, &["effect", "name"])?
                .map(|n| slug(&n))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| slug(label));
            if name.is_empty() {
                return Err("effect has no name and no label".to_string());
            }
            EditAction::Effect {
                name,
                strength: percent(number(params, &["strength"])?, DEFAULT_EFFECT_STRENGTH),
            }
        }
        OperationKind::ColorGrade => EditAction::ColorGrade {
            preset: string(params, &["preset"])?
                .map(|p| slug(&p))
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_COLOR_PRESET.to_string()),
            intensity: percent(number(params, &["intensity", "strength"])?, DEFAULT_COLOR_INTENSITY),
        },
        OperationKind::Captions => {
            let text = string(params, &["text"])?
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| label.to_string());
            if text.trim().is_empty() {
                return Err("captions need a text or a label".to_string());
            }
            let position = string(params, &["position"])?
                .and_then(|p| CaptionPosition::from_name(&p))
                .unwrap_or(CaptionPosition::Bottom);
            let animation = match string(params, &["animation"])?.as_deref() {
                None | Some("fade") => CaptionAnimation::Fade,
                Some(_) => CaptionAnimation::None,
            };
            let font_size = positive(number(params, &["fontSize"])?, "fontSize")?
                .map_or(DEFAULT_CAPTION_FONT_SIZE, |s| s.round() as u32);
            EditAction::Captions(CaptionStyle {
                text,
                position,
                animation,
                font_size,
                font_color: string(params, &["fontColor"])?
                    .unwrap_or_else(|| DEFAULT_CAPTION_FONT_COLOR.to_string()),
                bg_color: string(params, &["bgColor", "backgroundColor"])?
                    .unwrap_or_else(|| DEFAULT_CAPTION_BG_COLOR.to_string()),
                fade_duration: number(params, &["fadeDuration"])?
                    .filter(|f| *f >= 0.0)
                    .unwrap_or(DEFAULT_CAPTION_FADE_SEC),
            })
        }
        OperationKind::OverlayImage => EditAction::OverlayImage {
            asset: asset(params, "imagePath", AssetRole::Image)?,
            position: overlay_position(params, OverlayPosition::TopRight)?,
            scale: positive(number(params, &["scale"])?, "scale")?.unwrap_or(DEFAULT_OVERLAY_SCALE),
        },
        OperationKind::OverlayVideo => EditAction::OverlayVideo {
            asset: asset(params, "videoPath", AssetRole::Video)?,
            position: overlay_position(params, OverlayPosition::BottomRight)?,
            scale: positive(number(params, &["scale"])?, "scale")?.unwrap_or(DEFAULT_OVERLAY_SCALE),
        },
        OperationKind::OverlayAudio => EditAction::OverlayAudio {
            asset: asset(params, "audioPath", AssetRole::Audio)?,
            volume: number(params, &["volume"])?
                .filter(|v| *v >= 0.0)
                .unwrap_or(DEFAULT_AUDIO_VOLUME),
            loop_audio: boolean(params, "loop")?.unwrap_or(false),
        },
        OperationKind::Trim => EditAction::Trim,
        OperationKind::Speed => {
            let factor = number(params, &["speed", "speedFactor"])?.unwrap_or(1.0);
            if !factor.is_finite() || factor <= 0.0 {
                return Err(format!("speed factor must be a positive number, got {factor}"));
            }
            EditAction::Speed { factor }
        }
    })
}

/// Lower-cases and joins whitespace runs with `-`: "Punch In" -> "punch-in".
#[must_use]
pub fn slug(value: &str) -> String {
    value
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// First present key among `keys`, as a number. Numeric strings are accepted.
fn number(params: &Map<String, Value>, keys: &[&str]) -> Result<Option<f64>, String> {
    for key in keys {
        match params.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(n)) => return Ok(n.as_f64()),
            Some(Value::String(s)) => {
                return s
                    .trim()
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| format!("'{key}' must be a number, got '{s}'"));
            }
            Some(other) => return Err(format!("'{key}' must be a number, got {other}")),
        }
    }
    Ok(None)
}

fn string(params: &Map<String, Value>, keys: &[&str]) -> Result<Option<String>, String> {
    for key in keys {
        match params.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return Ok(Some(s.clone())),
            Some(Value::Number(n)) => return Ok(Some(n.to_string())),
            Some(other) => return Err(format!("'{key}' must be a string, got {other}")),
        }
    }
    Ok(None)
}

fn boolean(params: &Map<String, Value>, key: &str) -> Result<Option<bool>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Some(true)),
            "false" | "no" | "0" => Ok(Some(false)),
            _ => Err(format!("'{key}' must be a boolean, got '{s}'")),
        },
        Some(other) => Err(format!("'{key}' must be a boolean, got {other}")),
    }
}

fn positive(value: Option<f64>, key: &str) -> Result<Option<f64>, String> {
    match value {
        Some(v) if !v.is_finite() || v <= 0.0 => Err(format!("'{key}' must be positive, got {v}")),
        other => Ok(other),
    }
}

/// Clamps a 0-100 value, using `default` when absent.
fn percent(value: Option<f64>, default: f64) -> f64 {
    value
        .filter(|v| v.is_finite())
        .unwrap_or(default)
        .clamp(0.0, 100.0)
}

fn asset(params: &Map<String, Value>, key: &str, role: AssetRole) -> Result<AssetReference, String> {
    let raw = string(params, &[key])?.ok_or_else(|| format!("missing '{key}'"))?;
    let reference = AssetReference::parse(&raw).map_err(|e| format!("'{key}': {e}"))?;
    log::trace!("Parsed {:?} asset reference {}", role, reference);
    Ok(reference)
}

fn overlay_position(params: &Map<String, Value>, default: OverlayPosition) -> Result<OverlayPosition, String> {
    Ok(string(params, &["position"])?
        .and_then(|p| OverlayPosition::from_name(&p))
        .unwrap_or(default))
}

// ============================================================================
// EDIT OPERATION
// ============================================================================

/// Wire representation of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    id: String,
    start_sec: f64,
    end_sec: f64,
    #[serde(alias = "kind")]
    op: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    params: Map<String, Value>,
    #[serde(default)]
    status: OperationStatus,
}

/// One step of an edit plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOperation", into = "RawOperation")]
pub struct EditOperation {
    pub id: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub label: String,
    pub status: OperationStatus,
    pub action: EditAction,
}

impl EditOperation {
    #[must_use]
    pub fn new(id: impl Into<String>, start_sec: f64, end_sec: f64, label: impl Into<String>, action: EditAction) -> Self {
        Self {
            id: id.into(),
            start_sec,
            end_sec,
            label: label.into(),
            status: OperationStatus::Planned,
            action,
        }
    }

    /// Builds an operation from its wire parts.
    #[must_use]
    pub fn from_wire(
        id: impl Into<String>,
        kind: &str,
        start_sec: f64,
        end_sec: f64,
        label: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        let label = label.into();
        let action = EditAction::from_params(kind, &label, params);
        Self::new(id, start_sec, end_sec, label, action)
    }

    /// Length of the operation window in seconds.
    #[must_use]
    pub fn window(&self) -> f64 {
        (self.end_sec - self.start_sec).max(0.0)
    }

    /// Label shown in progress reports; falls back to the kind name.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            self.action.kind_name()
        } else {
            &self.label
        }
    }
}

impl From<RawOperation> for EditOperation {
    fn from(raw: RawOperation) -> Self {
        let action = EditAction::from_params(&raw.op, &raw.label, raw.params);
        Self {
            id: raw.id,
            start_sec: raw.start_sec,
            end_sec: raw.end_sec,
            label: raw.label,
            status: raw.status,
            action,
        }
    }
}

impl From<EditOperation> for RawOperation {
    fn from(op: EditOperation) -> Self {
        Self {
            op: op.action.kind_name().to_string(),
            params: op.action.to_params(),
            id: op.id,
            start_sec: op.start_sec,
            end_sec: op.end_sec,
            label: op.label,
            status: op.status,
        }
    }
}
