//! Cue Data Models
//!
//! Defines the WebVTT cue and its display settings.
//!
//! # Overview
//!
//! A cue carries its timing, its parsed text tree and a `CueSettings`
//! record. Settings are immutable once parsed; `sanitized()` is the only
//! place where invalid values are replaced by their defaults.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cuetext::CueText;
use crate::{CoreError, CoreResult, TimeMs};

// =============================================================================
// Setting Enumerations
// =============================================================================

/// Direction in which cue lines are laid out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritingDirection {
    #[default]
    Horizontal,
    /// `vertical:rl`
    VerticalGrowLeft,
    /// `vertical:lr`
    VerticalGrowRight,
}

impl WritingDirection {
    pub fn is_horizontal(self) -> bool {
        self == Self::Horizontal
    }
}

/// How the `line` value maps to the cue box edges
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LineAlign {
    #[default]
    Start,
    Center,
    End,
}

/// How the `position` value maps to the cue box edges
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PosAlign {
    /// Derived from `text_align` and the base direction
    #[default]
    Auto,
    LineLeft,
    Center,
    LineRight,
}

/// Alignment of text inside the cue box
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Start,
    #[default]
    Center,
    End,
    Left,
    Right,
}

/// Paragraph base direction of the cue text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BaseDirection {
    #[default]
    Ltr,
    Rtl,
}

fn unknown_keyword(setting: &str, value: &str) -> CoreError {
    CoreError::ValidationError(format!("unknown {} value '{}'", setting, value))
}

impl FromStr for WritingDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "rl" => Ok(Self::VerticalGrowLeft),
            "lr" => Ok(Self::VerticalGrowRight),
            _ => Err(unknown_keyword("vertical", s)),
        }
    }
}

impl FromStr for LineAlign {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "start" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "end" => Ok(Self::End),
            _ => Err(unknown_keyword("line alignment", s)),
        }
    }
}

impl FromStr for PosAlign {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "line-left" => Ok(Self::LineLeft),
            // "middle" is the pre-standard spelling
            "center" | "middle" => Ok(Self::Center),
            "line-right" => Ok(Self::LineRight),
            _ => Err(unknown_keyword("position alignment", s)),
        }
    }
}

impl FromStr for TextAlign {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "start" => Ok(Self::Start),
            "center" | "middle" => Ok(Self::Center),
            "end" => Ok(Self::End),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(unknown_keyword("align", s)),
        }
    }
}

// =============================================================================
// Cue Settings
// =============================================================================

/// Declarative display settings of one cue
///
/// `line` and `position` are fractions of the video dimension; `None`
/// means "auto".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueSettings {
    #[serde(default)]
    pub writing_direction: WritingDirection,
    #[serde(default = "default_snap_to_lines")]
    pub snap_to_lines: bool,
    #[serde(default)]
    pub line: Option<f64>,
    #[serde(default)]
    pub line_align: LineAlign,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub pos_align: PosAlign,
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub base_direction: BaseDirection,
}

fn default_snap_to_lines() -> bool {
    true
}

fn default_size() -> f64 {
    1.0
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            writing_direction: WritingDirection::Horizontal,
            snap_to_lines: default_snap_to_lines(),
            line: None,
            line_align: LineAlign::Start,
            position: None,
            pos_align: PosAlign::Auto,
            size: default_size(),
            text_align: TextAlign::Center,
            base_direction: BaseDirection::Ltr,
        }
    }
}

impl CueSettings {
    /// Returns a copy with every invalid numeric field replaced by its
    /// default, plus one `ValidationError` per replaced field.
    pub fn sanitized(&self) -> (CueSettings, Vec<CoreError>) {
        let mut out = self.clone();
        let mut errors = Vec::new();

        if !self.size.is_finite() || !(0.0..=1.0).contains(&self.size) {
            errors.push(CoreError::ValidationError(format!(
                "size {} is outside [0, 1], using {}",
                self.size,
                default_size()
            )));
            out.size = default_size();
        }

        if let Some(position) = self.position {
            if !position.is_finite() || !(0.0..=1.0).contains(&position) {
                errors.push(CoreError::ValidationError(format!(
                    "position {} is outside [0, 1], using auto",
                    position
                )));
                out.position = None;
            }
        }

        if let Some(line) = self.line {
            // Out-of-range finite lines are legal; the positioner clamps them
            if !line.is_finite() {
                errors.push(CoreError::ValidationError(format!(
                    "line {} is not finite, using auto",
                    line
                )));
                out.line = None;
            }
        }

        (out, errors)
    }
}

// =============================================================================
// Cue
// =============================================================================

/// A timestamped, positioned block of subtitle text
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Optional identifier line (empty when absent)
    #[serde(default)]
    pub id: String,
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
    #[serde(default)]
    pub settings: CueSettings,
    pub text: CueText,
}

impl Cue {
    pub fn new(id: &str, start_ms: TimeMs, end_ms: TimeMs, text: CueText) -> Self {
        Self {
            id: id.to_string(),
            start_ms,
            end_ms,
            settings: CueSettings::default(),
            text,
        }
    }

    /// Cue duration in milliseconds (zero for inverted timings)
    pub fn duration_ms(&self) -> TimeMs {
        (self.end_ms - self.start_ms).max(0)
    }
}

// =============================================================================
// Tests
// =============================================================================
