//! vtt2ass Core Type Definitions
//!
//! Defines fundamental types shared by the parsers, the layout engine
//! and the renderers.

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Time Types
// =============================================================================

/// Time in milliseconds
pub type TimeMs = i64;

// =============================================================================
// Geometry Types
// =============================================================================

/// Video frame dimensions in pixels, supplied once per run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width_f(&self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f(&self) -> f64 {
        f64::from(self.height)
    }
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Measured size of a shaped text run, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextExtents {
    pub width: f64,
    pub height: f64,
}

impl TextExtents {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Bounding extents of stacked lines: widest line by the sum of heights
    pub fn stack(lines: &[TextExtents]) -> TextExtents {
        lines.iter().fold(TextExtents::default(), |acc, l| TextExtents {
            width: acc.width.max(l.width),
            height: acc.height + l.height,
        })
    }
}

/// Pixel box a cue occupies on screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CuePositionBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CuePositionBox {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Checks that the box lies inside the video frame (with a small tolerance
    /// for float rounding)
    pub fn fits_within(&self, video: &VideoInfo) -> bool {
        const EPS: f64 = 1e-6;
        self.left >= -EPS
            && self.top >= -EPS
            && self.right() <= video.width_f() + EPS
            && self.bottom() <= video.height_f() + EPS
    }
}

// =============================================================================
// Color
// =============================================================================

/// RGBA color value (0-255 for each component)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Creates a new color from RGBA components
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from RGB components
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Parses a CSS color value as used in `::cue` style blocks.
    ///
    /// Accepts `#rgb`, `#rrggbb` and a handful of named colors.
    pub fn parse_css(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| d as u8))
                .collect::<Option<Vec<_>>>()?;
            return match digits.as_slice() {
                [r, g, b] => Some(Self::rgb(r * 17, g * 17, b * 17)),
                [r1, r2, g1, g2, b1, b2] => {
                    Some(Self::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2))
                }
                _ => None,
            };
        }

        match value.to_ascii_lowercase().as_str() {
            "black" => Some(Self::black()),
            "white" => Some(Self::white()),
            "red" => Some(Self::rgb(255, 0, 0)),
            "lime" => Some(Self::rgb(0, 255, 0)),
            "green" => Some(Self::rgb(0, 128, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            "yellow" => Some(Self::rgb(255, 255, 0)),
            "cyan" => Some(Self::rgb(0, 255, 255)),
            "magenta" => Some(Self::rgb(255, 0, 255)),
            "gray" | "grey" => Some(Self::rgb(128, 128, 128)),
            _ => None,
        }
    }

    /// Like [`Color::parse_css`], but falls back to black with a warning
    pub fn parse_css_or_black(value: &str) -> Self {
        Self::parse_css(value).unwrap_or_else(|| {
            warn!("Unknown color '{}', using black", value);
            Self::black()
        })
    }

    /// Converts to ASS/SSA color format (&HAABBGGRR)
    pub fn to_ass_color(&self) -> String {
        format!(
            "&H{:02X}{:02X}{:02X}{:02X}",
            255 - self.a,
            self.b,
            self.g,
            self.r
        )
    }

    /// ASS inline override form (&HBBGGRR&), used by `\3c` and friends
    pub fn to_ass_inline(&self) -> String {
        format!("&H{:02X}{:02X}{:02X}&", self.b, self.g, self.r)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// What happened to the cue a diagnostic refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A field was invalid and its default was substituted
    Recovered,
    /// The cue was left out of the output
    Skipped,
}

/// A per-cue problem reported instead of aborting the run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Position of the cue in the input file (0-based)
    pub cue_index: usize,
    /// Cue identifier, empty when the cue has none
    pub cue_id: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn recovered(cue_index: usize, cue_id: &str, message: impl Into<String>) -> Self {
        Self {
            cue_index,
            cue_id: cue_id.to_string(),
            kind: DiagnosticKind::Recovered,
            message: message.into(),
        }
    }

    pub fn skipped(cue_index: usize, cue_id: &str, message: impl Into<String>) -> Self {
        Self {
            cue_index,
            cue_id: cue_id.to_string(),
            kind: DiagnosticKind::Skipped,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self.kind {
            DiagnosticKind::Recovered => "recovered",
            DiagnosticKind::Skipped => "skipped",
        };
        if self.cue_id.is_empty() {
            write!(f, "cue #{} {}: {}", self.cue_index + 1, action, self.message)
        } else {
            write!(
                f,
                "cue #{} ({}) {}: {}",
                self.cue_index + 1,
                self.cue_id,
                action,
                self.message
            )
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
