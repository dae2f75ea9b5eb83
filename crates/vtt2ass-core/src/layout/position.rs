//! Cue Positioner
//!
//! Maps a cue's declarative settings onto a pixel box, following the
//! WebVTT "apply cue settings" box model. Multi-cue stacking of snapped
//! cues is not resolved: snapped cues always get a secondary-axis
//! offset of zero.
//!
//! See <https://www.w3.org/TR/webvtt1/#apply-webvtt-cue-settings>

use tracing::debug;

use crate::captions::{BaseDirection, CueSettings, LineAlign, PosAlign, TextAlign};
use crate::{CoreError, CoreResult, CuePositionBox, VideoInfo};

/// Effective position alignment (never `Auto`)
///
/// <https://www.w3.org/TR/webvtt1/#webvtt-cue-position-alignment>
pub fn compute_pos_align(settings: &CueSettings) -> PosAlign {
    if settings.pos_align != PosAlign::Auto {
        return settings.pos_align;
    }

    let ltr = settings.base_direction == BaseDirection::Ltr;
    match settings.text_align {
        TextAlign::Left => PosAlign::LineLeft,
        TextAlign::Right => PosAlign::LineRight,
        TextAlign::Start if ltr => PosAlign::LineLeft,
        TextAlign::Start => PosAlign::LineRight,
        TextAlign::End if ltr => PosAlign::LineRight,
        TextAlign::End => PosAlign::LineLeft,
        TextAlign::Center => PosAlign::Center,
    }
}

/// Computed position as a fraction of the primary axis
///
/// <https://www.w3.org/TR/webvtt1/#cue-computed-position>
pub fn compute_position(settings: &CueSettings) -> f64 {
    if let Some(position) = settings.position {
        return position;
    }

    match settings.text_align {
        TextAlign::Left | TextAlign::Start => 0.0,
        TextAlign::Right | TextAlign::End => 1.0,
        TextAlign::Center => 0.5,
    }
}

/// Computed line as a fraction of the secondary axis.
///
/// `None` for auto lines of snapped cues, whose value depends on the
/// other cues on screen.
///
/// <https://www.w3.org/TR/webvtt1/#cue-computed-line>
pub fn compute_line(settings: &CueSettings) -> Option<f64> {
    match settings.line {
        Some(line) if !settings.snap_to_lines && !(0.0..=1.0).contains(&line) => Some(1.0),
        Some(line) => Some(line),
        None if !settings.snap_to_lines => Some(1.0),
        None => None,
    }
}

/// Largest size the box may take for a given alignment and position
pub fn max_size(pos_align: PosAlign, position: f64) -> f64 {
    match pos_align {
        PosAlign::LineLeft => 1.0 - position,
        PosAlign::LineRight => position,
        // compute_pos_align never yields Auto
        PosAlign::Center | PosAlign::Auto => 2.0 * position.min(1.0 - position),
    }
}

/// Pure mapping from cue settings to an on-screen box
pub struct CuePositioner;

impl CuePositioner {
    /// Computes the pixel box of a cue.
    ///
    /// Fails with a `ValidationError` when `size`, `position` or `line`
    /// is not finite; callers sanitize settings first to recover.
    pub fn apply(settings: &CueSettings, video: &VideoInfo) -> CoreResult<CuePositionBox> {
        validate(settings)?;

        let horizontal = settings.writing_direction.is_horizontal();
        let pos_align = compute_pos_align(settings);
        let position = compute_position(settings);
        let size = settings.size.min(max_size(pos_align, position)).max(0.0);

        let primary = match pos_align {
            PosAlign::LineLeft => position,
            PosAlign::LineRight => position - size,
            PosAlign::Center | PosAlign::Auto => position - size / 2.0,
        };

        let secondary = if settings.snap_to_lines {
            0.0
        } else {
            let line = compute_line(settings).unwrap_or(1.0);
            if settings.line_align == LineAlign::Start && horizontal {
                1.0 - line
            } else {
                line
            }
        };

        let (primary_dim, cross_dim) = if horizontal {
            (video.width_f(), video.height_f())
        } else {
            (video.height_f(), video.width_f())
        };

        let start = primary * primary_dim;
        let extent = size * primary_dim;
        let mut cross_start = secondary * cross_dim;
        let cross_extent = match settings.line_align {
            LineAlign::Start => cross_dim - cross_start,
            LineAlign::Center => (cross_dim - cross_start).min(cross_start) * 2.0,
            LineAlign::End => cross_start,
        };

        if !settings.snap_to_lines {
            match settings.line_align {
                LineAlign::Start => {}
                LineAlign::Center => cross_start -= cross_extent / 2.0,
                LineAlign::End => cross_start -= cross_extent,
            }
        }

        let cue_box = if horizontal {
            CuePositionBox {
                left: start,
                top: cross_start,
                width: extent,
                height: cross_extent,
            }
        } else {
            CuePositionBox {
                left: cross_start,
                top: start,
                width: cross_extent,
                height: extent,
            }
        };

        debug!(
            "Cue box {:?} (pos_align {:?}, position {}, size {})",
            cue_box, pos_align, position, size
        );
        Ok(cue_box)
    }
}

fn validate(settings: &CueSettings) -> CoreResult<()> {
    if !settings.size.is_finite() {
        return Err(CoreError::ValidationError(format!(
            "cue size {} is not finite",
            settings.size
        )));
    }
    for (name, value) in [("position", settings.position), ("line", settings.line)] {
        if let Some(v) = value.filter(|v| !v.is_finite()) {
            return Err(CoreError::ValidationError(format!(
                "cue {} {} is not finite",
                name, v
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
