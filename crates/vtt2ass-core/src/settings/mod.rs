//! Conversion Settings
//!
//! Run-wide options for the converter, loadable from a JSON file:
//! - Every field has a default, so partial files are valid
//! - Out-of-range values are clamped by `normalize()` instead of failing
//! - Files are written atomically (temp file + rename)

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::layout::{LayoutLimits, DEFAULT_RUBY_SCALE};
use crate::{CoreError, CoreResult, VideoInfo};

/// Default font size as a fraction of the video height
pub const DEFAULT_FONT_SIZE_RATIO: f64 = 0.05;

/// Largest accepted video dimension
pub const MAX_VIDEO_DIMENSION: u32 = 16384;

/// Options shared by every cue of a conversion run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConvertSettings {
    /// Target video size; also the ASS play resolution
    #[serde(default)]
    pub video: VideoInfo,

    /// Font file used for shaping; fixed-advance metrics when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Base font size in pixels; derived from the video height when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    /// Font size relative to the video height when `font_size` is unset
    #[serde(default = "default_font_size_ratio")]
    pub font_size_ratio: f64,

    /// Annotation font size relative to the base font size
    #[serde(default = "default_ruby_scale")]
    pub ruby_scale: f64,

    /// Default letter spacing in pixels
    #[serde(default)]
    pub letter_spacing: f64,

    /// Outline width of the default ASS style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_size: Option<f64>,

    /// Draw cue, text block and ruby base boxes
    #[serde(default)]
    pub debug_boxes: bool,

    #[serde(default)]
    pub limits: LayoutLimits,

    /// Worker threads for cue layout (0 = one per CPU)
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_font_size_ratio() -> f64 {
    DEFAULT_FONT_SIZE_RATIO
}

fn default_ruby_scale() -> f64 {
    DEFAULT_RUBY_SCALE
}

fn default_jobs() -> usize {
    1
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            video: VideoInfo::default(),
            font_path: None,
            font_size: None,
            font_size_ratio: default_font_size_ratio(),
            ruby_scale: default_ruby_scale(),
            letter_spacing: 0.0,
            border_size: None,
            debug_boxes: false,
            limits: LayoutLimits::default(),
            jobs: default_jobs(),
        }
    }
}

impl ConvertSettings {
    /// Reads settings from a JSON file and normalizes them
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut settings: ConvertSettings = serde_json::from_str(&content)?;
        settings.normalize();
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Writes normalized settings as pretty JSON, atomically
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let mut normalized = self.clone();
        normalized.normalize();
        let content = serde_json::to_string_pretty(&normalized)?;

        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Clamps out-of-range values to usable ones
    pub fn normalize(&mut self) {
        self.video.width = self.video.width.min(MAX_VIDEO_DIMENSION);
        self.video.height = self.video.height.min(MAX_VIDEO_DIMENSION);

        self.font_size = self
            .font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.clamp(1.0, 1000.0));
        self.font_size_ratio = clamp_f64(self.font_size_ratio, 0.001, 1.0, DEFAULT_FONT_SIZE_RATIO);
        self.ruby_scale = clamp_f64(self.ruby_scale, 0.1, 1.0, DEFAULT_RUBY_SCALE);
        self.letter_spacing = clamp_f64(self.letter_spacing, -100.0, 100.0, 0.0);
        self.border_size = self
            .border_size
            .filter(|b| b.is_finite())
            .map(|b| b.clamp(0.0, 100.0));

        let defaults = LayoutLimits::default();
        if self.limits.max_parts == 0 {
            self.limits.max_parts = defaults.max_parts;
        }
        if self.limits.max_lines == 0 {
            self.limits.max_lines = defaults.max_lines;
        }
        if self.limits.max_style_depth < 2 {
            warn!(
                "maxStyleDepth {} leaves no room for cue text, using {}",
                self.limits.max_style_depth, defaults.max_style_depth
            );
            self.limits.max_style_depth = defaults.max_style_depth;
        }

        self.jobs = self.jobs.min(256);
    }

    /// Checks what normalization cannot repair
    pub fn validate(&self) -> CoreResult<()> {
        if self.video.width == 0 || self.video.height == 0 {
            return Err(CoreError::InvalidSettings(format!(
                "video size must be positive, got {}x{}",
                self.video.width, self.video.height
            )));
        }
        Ok(())
    }

    /// Base font size in pixels
    pub fn resolved_font_size(&self) -> f64 {
        self.font_size
            .unwrap_or_else(|| (self.video.height_f() * self.font_size_ratio).round())
    }

    /// Number of layout threads to use
    pub fn effective_jobs(&self) -> usize {
        match self.jobs {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

// =============================================================================
// Tests
// =============================================================================
