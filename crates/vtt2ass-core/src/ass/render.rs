//! Cue to ASS event rendering
//!
//! A cue becomes one base-text event anchored according to its position
//! box, plus one event per ruby annotation positioned from the top-left
//! corner of the text block. Annotation placement uses `\an1` for `over`
//! (bottom edge on the line top) and `\an7` for `under`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::document::{fmt_num, AssEvent, AssStyle};
use super::tags::{escape_text, TagWriter};
use crate::captions::{BaseDirection, Cue, CueSettings, LineAlign, TextAlign};
use crate::cuetext::RubyPosition;
use crate::layout::{last_cluster_offset, CueLayout, LineLayout, LinePart};
use crate::{Color, CuePositionBox, TextExtents, VideoInfo};

/// Layer of text events
pub const TEXT_LAYER: i32 = 4;

/// Layer of debug boxes, below the text
pub const DEBUG_LAYER: i32 = 0;

const FULL_EXTENTS_COLOR: Color = Color { r: 0xFC, g: 0x19, b: 0xDA, a: 255 };
const RUBY_BASE_COLOR: Color = Color { r: 0x0B, g: 0xE5, b: 0x7F, a: 255 };
const CUE_BOX_COLOR: Color = Color { r: 0x2D, g: 0x8C, b: 0xF0, a: 255 };
const CLUSTER_COLOR: Color = Color { r: 0xFF, g: 0xD4, b: 0x00, a: 255 };

// =============================================================================
// Anchor
// =============================================================================

/// `\an` alignment and `\pos` of a base-text event
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssAnchor {
    /// Numpad alignment (1-9)
    pub alignment: u8,
    pub x: f64,
    pub y: f64,
}

impl AssAnchor {
    /// 0 for left, 0.5 for center, 1 for right alignments
    pub fn column_factor(&self) -> f64 {
        match (self.alignment.max(1) - 1) % 3 {
            0 => 0.0,
            1 => 0.5,
            _ => 1.0,
        }
    }

    /// 0 for top, 0.5 for middle, 1 for bottom alignments
    pub fn row_factor(&self) -> f64 {
        match self.alignment {
            1..=3 => 1.0,
            4..=6 => 0.5,
            _ => 0.0,
        }
    }

    /// Top-left corner of a block with `extents` drawn at this anchor
    pub fn top_left(&self, extents: TextExtents) -> (f64, f64) {
        (
            self.x - self.column_factor() * extents.width,
            self.y - self.row_factor() * extents.height,
        )
    }
}

#[derive(Clone, Copy)]
enum Column {
    Left,
    Center,
    Right,
}

fn text_column(settings: &CueSettings) -> Column {
    let ltr = settings.base_direction == BaseDirection::Ltr;
    match settings.text_align {
        TextAlign::Left => Column::Left,
        TextAlign::Right => Column::Right,
        TextAlign::Center => Column::Center,
        TextAlign::Start if ltr => Column::Left,
        TextAlign::Start => Column::Right,
        TextAlign::End if ltr => Column::Right,
        TextAlign::End => Column::Left,
    }
}

/// Derives the ASS anchor of a cue from its position box.
///
/// Snapped cues sit on the bottom edge, half a line above the frame
/// border. Other cues follow `line_align`: `start` puts the text top on
/// the mirrored box edge, `center` the text middle on the box middle and
/// `end` the text bottom on the box bottom.
pub fn cue_anchor(
    settings: &CueSettings,
    cue_box: &CuePositionBox,
    video: &VideoInfo,
    font_size: f64,
) -> AssAnchor {
    if !settings.writing_direction.is_horizontal() {
        return AssAnchor {
            alignment: 5,
            x: cue_box.left + cue_box.width / 2.0,
            y: cue_box.top + cue_box.height / 2.0,
        };
    }

    let (column, x) = match text_column(settings) {
        Column::Left => (0, cue_box.left),
        Column::Center => (1, cue_box.left + cue_box.width / 2.0),
        Column::Right => (2, cue_box.right()),
    };

    let (row, y) = if settings.snap_to_lines {
        (1, video.height_f() - (font_size / 2.0).round())
    } else {
        match settings.line_align {
            LineAlign::Start => (7, video.height_f() - cue_box.top),
            LineAlign::Center => (4, cue_box.top + cue_box.height / 2.0),
            LineAlign::End => (1, cue_box.bottom()),
        }
    };

    AssAnchor {
        alignment: row + column,
        x,
        y,
    }
}

fn px(value: f64) -> i64 {
    value.round() as i64
}

// =============================================================================
// Renderer
// =============================================================================

/// Turns laid-out cues into ASS events
pub struct CueRenderer<'a> {
    style: &'a AssStyle,
    video: VideoInfo,
    debug_boxes: bool,
}

impl<'a> CueRenderer<'a> {
    pub fn new(style: &'a AssStyle, video: VideoInfo) -> Self {
        Self {
            style,
            video,
            debug_boxes: false,
        }
    }

    pub fn with_debug_boxes(mut self, enabled: bool) -> Self {
        self.debug_boxes = enabled;
        self
    }

    /// Events of one cue; an empty layout renders nothing
    pub fn render(&self, cue: &Cue, cue_box: &CuePositionBox, layout: &CueLayout) -> Vec<AssEvent> {
        if layout.is_empty() {
            return Vec::new();
        }

        let anchor = cue_anchor(&cue.settings, cue_box, &self.video, layout.base_font_size);
        let full = layout.extents();
        let (origin_x, origin_y) = anchor.top_left(full);
        let column = anchor.column_factor();

        let mut events = Vec::new();
        let mut rubies = Vec::new();
        let mut tags = TagWriter::new(self.style);
        let mut text = format!(
            "{{\\an{}\\pos({},{})\\fs{}}}",
            anchor.alignment,
            px(anchor.x),
            px(anchor.y),
            fmt_num(layout.base_font_size)
        );

        if self.debug_boxes {
            events.push(self.box_event(cue, cue_box.left, cue_box.top, cue_box.width, cue_box.height, CUE_BOX_COLOR));
            events.push(self.box_event(cue, origin_x, origin_y, full.width, full.height, FULL_EXTENTS_COLOR));
        }

        for (i, line) in layout.lines.iter().enumerate() {
            if i > 0 {
                text.push_str("\\N");
            }
            // Lines narrower than the block are aligned like the anchor
            let line_x = origin_x + (full.width - line.extents.width) * column;
            let line_y = origin_y + line.top;

            for part in &line.parts {
                text.push_str(&tags.switch_to(&part.style));
                push_base_run(&mut text, layout.part_text(part), part);

                let Some(annotation) = part.annotation.as_deref() else {
                    continue;
                };
                if !annotation.is_empty() {
                    rubies.push(self.ruby_event(cue, layout, part, annotation, line_x, line_y, &tags));
                }
                if self.debug_boxes {
                    events.extend(self.part_debug_boxes(cue, layout, line, part, line_x, line_y));
                }
            }
        }

        debug!(
            "Cue '{}' anchored \\an{} at ({:.1}, {:.1}), {} ruby event(s)",
            cue.id,
            anchor.alignment,
            anchor.x,
            anchor.y,
            rubies.len()
        );

        events.push(AssEvent::new(TEXT_LAYER, cue.start_ms, cue.end_ms, text));
        events.extend(rubies);
        events
    }

    #[allow(clippy::too_many_arguments)]
    fn ruby_event(
        &self,
        cue: &Cue,
        layout: &CueLayout,
        part: &LinePart,
        annotation: &str,
        line_x: f64,
        line_y: f64,
        tags: &TagWriter,
    ) -> AssEvent {
        let alignment = match part.ruby_position {
            RubyPosition::Over => 1,
            RubyPosition::Under => 7,
        };
        let x = line_x + part.cursor_x + part.ruby_offset.dx;
        let y = line_y + part.ruby_offset.dy;

        let mut text = format!(
            "{{\\an{}\\pos({},{})\\fs{}",
            alignment,
            px(x),
            px(y),
            fmt_num(layout.ruby_font_size)
        );
        if part.resizes_annotation {
            text.push_str(&format!("\\fsp{}", fmt_num(part.spacing)));
        }
        text.push_str(&tags.standalone(&part.style));
        text.push('}');
        text.push_str(&escape_text(annotation));

        AssEvent::new(TEXT_LAYER, cue.start_ms, cue.end_ms, text)
    }

    fn part_debug_boxes(
        &self,
        cue: &Cue,
        layout: &CueLayout,
        line: &LineLayout,
        part: &LinePart,
        line_x: f64,
        line_y: f64,
    ) -> Vec<AssEvent> {
        let x = line_x + part.cursor_x;
        let base_height = part.base_extent.height;
        let mut boxes = vec![self.box_event(cue, x, line_y, part.advance, base_height, RUBY_BASE_COLOR)];

        let (marker_y, marker_height) = if part.resizes_base {
            (line_y, base_height)
        } else {
            match part.ruby_position {
                RubyPosition::Over => (line_y - layout.ruby_font_size, layout.ruby_font_size),
                RubyPosition::Under => (line_y + base_height, layout.ruby_font_size),
            }
        };
        for offset in &part.cluster_offsets {
            boxes.push(self.box_event(cue, x + offset, marker_y, 1.0, marker_height, CLUSTER_COLOR));
        }

        debug!("Line {}: {} debug box(es) for part at {:.1}", line.index, boxes.len(), x);
        boxes
    }

    fn box_event(&self, cue: &Cue, x: f64, y: f64, width: f64, height: f64, color: Color) -> AssEvent {
        let (w, h) = (fmt_num(width), fmt_num(height));
        let text = format!(
            "{{\\an7\\pos({},{})\\bord0\\shad0\\1c{}\\1a&HA0&\\p1}}m 0 0 l {w} 0 {w} {h} 0 {h}{{\\p0}}",
            px(x),
            px(y),
            color.to_ass_inline(),
        );
        AssEvent::new(DEBUG_LAYER, cue.start_ms, cue.end_ms, text)
    }
}

/// Appends a base run with its spacing; a trailing spacing is applied to
/// the last cluster only
fn push_base_run(out: &mut String, text: &str, part: &LinePart) {
    let spacing = fmt_num(part.base_spacing());
    match (part.trailing_spacing, last_cluster_offset(text)) {
        (Some(trailing), Some(split)) => {
            let (head, tail) = text.split_at(split);
            if !head.is_empty() {
                out.push_str(&format!("{{\\fsp{}}}{}", spacing, escape_text(head)));
            }
            out.push_str(&format!("{{\\fsp{}}}{}", fmt_num(trailing), escape_text(tail)));
        }
        _ => out.push_str(&format!("{{\\fsp{}}}{}", spacing, escape_text(text))),
    }
}

// =============================================================================
// Tests
// =============================================================================
