//! Ruby Layout Engine
//!
//! Turns a cue text tree into measured, justified runs grouped by
//! display line. Layout happens in stages:
//!
//! 1. Flatten the tree into a plain-text buffer of base runs (`LinePart`),
//!    attaching `<rt>` text to the run before it.
//! 2. Measure every base run and annotation.
//! 3. Decide which side of an annotated run is stretched.
//! 4. Sum line extents from effective widths.
//! 5. Compute justification spacing.
//! 6. Place runs on their lines (cursor, advance, ruby offsets).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::justify::{cluster_offsets, justify_spacing, utf8_cluster_count};
use super::style_stack::{StyleAttributes, StyleStack, DEFAULT_MAX_STYLE_DEPTH};
use crate::cuetext::{CueText, NodeId, NodeKind, RubyPosition, StyleSheet};
use crate::text::TextMetrics;
use crate::{CoreError, CoreResult, TextExtents};

/// Annotation font size relative to the base font size
pub const DEFAULT_RUBY_SCALE: f64 = 0.55;

/// Default maximum number of base runs in one cue
pub const DEFAULT_MAX_PARTS: usize = 128;

/// Default maximum number of display lines in one cue
pub const DEFAULT_MAX_LINES: usize = 128;

/// Widths closer than this are treated as equal
const WIDTH_EPSILON: f64 = 1e-6;

// =============================================================================
// Limits
// =============================================================================

/// Fixed per-cue bounds; exceeding any of them skips the cue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutLimits {
    pub max_parts: usize,
    pub max_lines: usize,
    pub max_style_depth: usize,
}

impl Default for LayoutLimits {
    fn default() -> Self {
        Self {
            max_parts: DEFAULT_MAX_PARTS,
            max_lines: DEFAULT_MAX_LINES,
            max_style_depth: DEFAULT_MAX_STYLE_DEPTH,
        }
    }
}

// =============================================================================
// Layout Output
// =============================================================================

/// Extents of one display line
pub type LineExtents = TextExtents;

/// Placement of an annotation relative to the start of its base run
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RubyOffset {
    /// Horizontal offset (leading spacing of a stretched annotation)
    pub dx: f64,
    /// Vertical offset from the line top (the base height for `under`)
    pub dy: f64,
}

/// One contiguous base-text run on one display line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePart {
    /// Byte range of the run inside [`CueLayout::text`]
    pub byte_offset: usize,
    pub byte_len: usize,
    pub line_index: usize,
    /// The run is a direct child of `<ruby>`
    pub is_ruby: bool,
    /// Cascaded style when the run was emitted
    pub style: StyleAttributes,
    pub annotation: Option<String>,
    pub ruby_position: RubyPosition,
    pub base_extent: TextExtents,
    pub annotation_extent: Option<TextExtents>,
    pub resizes_base: bool,
    pub resizes_annotation: bool,
    /// Spacing after every cluster of the stretched side
    pub spacing: f64,
    /// Spacing after the last cluster when it differs from `spacing`
    pub trailing_spacing: Option<f64>,
    /// Distance from the line start to the run
    pub cursor_x: f64,
    /// Horizontal room the run takes on its line
    pub advance: f64,
    pub ruby_offset: RubyOffset,
    /// Left edge of each cluster of the stretched side, relative to the
    /// run start
    pub cluster_offsets: Vec<f64>,
}

impl LinePart {
    fn new(byte_offset: usize, byte_len: usize, line_index: usize, is_ruby: bool, style: StyleAttributes) -> Self {
        Self {
            byte_offset,
            byte_len,
            line_index,
            is_ruby,
            style,
            annotation: None,
            ruby_position: RubyPosition::default(),
            base_extent: TextExtents::default(),
            annotation_extent: None,
            resizes_base: false,
            resizes_annotation: false,
            spacing: 0.0,
            trailing_spacing: None,
            cursor_x: 0.0,
            advance: 0.0,
            ruby_offset: RubyOffset::default(),
            cluster_offsets: Vec::new(),
        }
    }

    /// Letter spacing the run was measured with
    pub fn default_spacing(&self) -> f64 {
        self.style.spacing()
    }

    /// Width the run occupies after stretching
    pub fn effective_width(&self) -> f64 {
        match self.annotation_extent {
            Some(annotation) if self.resizes_base => annotation.width,
            _ => self.base_extent.width,
        }
    }

    /// Spacing to apply after the base clusters (all but the last)
    pub fn base_spacing(&self) -> f64 {
        if self.resizes_base {
            self.spacing
        } else {
            self.default_spacing()
        }
    }

    /// Spacing to apply after the annotation clusters
    pub fn annotation_spacing(&self) -> f64 {
        if self.resizes_annotation {
            self.spacing
        } else {
            self.default_spacing()
        }
    }
}

/// Runs of one display line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineLayout {
    pub index: usize,
    pub extents: LineExtents,
    /// Sum of the heights of the lines above
    pub top: f64,
    pub parts: Vec<LinePart>,
}

/// Layout of a whole cue
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueLayout {
    /// Flattened base text; annotations are not part of it
    pub text: String,
    pub lines: Vec<LineLayout>,
    pub base_font_size: f64,
    pub ruby_font_size: f64,
}

impl CueLayout {
    /// True when the cue has no base text to render
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.parts.is_empty())
    }

    pub fn parts(&self) -> impl Iterator<Item = &LinePart> {
        self.lines.iter().flat_map(|l| l.parts.iter())
    }

    pub fn part_count(&self) -> usize {
        self.lines.iter().map(|l| l.parts.len()).sum()
    }

    /// Base text of a run
    pub fn part_text(&self, part: &LinePart) -> &str {
        self.text
            .get(part.byte_offset..part.byte_offset + part.byte_len)
            .unwrap_or("")
    }

    pub fn line_extents(&self) -> Vec<LineExtents> {
        self.lines.iter().map(|l| l.extents).collect()
    }

    /// Bounding extents of the whole text block
    pub fn extents(&self) -> TextExtents {
        TextExtents::stack(&self.line_extents())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Flattens, measures and justifies cue text
pub struct RubyLayoutEngine<'a> {
    metrics: &'a dyn TextMetrics,
    font: &'a str,
    styles: &'a StyleSheet,
    ruby_scale: f64,
    limits: LayoutLimits,
}

impl<'a> RubyLayoutEngine<'a> {
    pub fn new(metrics: &'a dyn TextMetrics, font: &'a str, styles: &'a StyleSheet) -> Self {
        Self {
            metrics,
            font,
            styles,
            ruby_scale: DEFAULT_RUBY_SCALE,
            limits: LayoutLimits::default(),
        }
    }

    pub fn with_ruby_scale(mut self, ruby_scale: f64) -> Self {
        self.ruby_scale = ruby_scale;
        self
    }

    pub fn with_limits(mut self, limits: LayoutLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &LayoutLimits {
        &self.limits
    }

    /// Annotation font size for a base font size
    pub fn ruby_font_size(&self, base_font_size: f64) -> f64 {
        (base_font_size * self.ruby_scale).round()
    }

    /// Lays out one cue.
    ///
    /// A tree without base text yields an empty [`CueLayout`].
    pub fn layout(&self, tree: &CueText, mut style: StyleStack, base_font_size: f64) -> CoreResult<CueLayout> {
        let ruby_font_size = self.ruby_font_size(base_font_size);

        let mut flat = Flattener {
            tree,
            styles: self.styles,
            limits: &self.limits,
            stack: &mut style,
            buffer: String::new(),
            parts: Vec::new(),
            annotation_sources: Vec::new(),
            line: 0,
        };
        flat.walk(tree.root())?;
        let Flattener { buffer, mut parts, .. } = flat;

        if parts.is_empty() {
            debug!("Cue text has no base runs");
            return Ok(CueLayout {
                text: buffer,
                lines: Vec::new(),
                base_font_size,
                ruby_font_size,
            });
        }

        self.measure(&buffer, &mut parts, base_font_size, ruby_font_size)?;
        decide_resize_sides(&mut parts);
        self.justify(&buffer, &mut parts, base_font_size, ruby_font_size)?;
        let lines = assemble_lines(parts, base_font_size);

        debug!(
            "Laid out {} line(s), block {:?}",
            lines.len(),
            TextExtents::stack(&lines.iter().map(|l| l.extents).collect::<Vec<_>>())
        );

        Ok(CueLayout {
            text: buffer,
            lines,
            base_font_size,
            ruby_font_size,
        })
    }

    fn measure(&self, buffer: &str, parts: &mut [LinePart], base_size: f64, ruby_size: f64) -> CoreResult<()> {
        for part in parts.iter_mut() {
            let text = &buffer[part.byte_offset..part.byte_offset + part.byte_len];
            let spacing = part.default_spacing();
            part.base_extent = self.metrics.shape(self.font, text, base_size, spacing)?;
            if let Some(annotation) = &part.annotation {
                part.annotation_extent =
                    Some(self.metrics.shape(self.font, annotation, ruby_size, spacing)?);
            }
        }
        Ok(())
    }

    fn justify(&self, buffer: &str, parts: &mut [LinePart], base_size: f64, ruby_size: f64) -> CoreResult<()> {
        for i in 0..parts.len() {
            let Some(annotation_extent) = parts[i].annotation_extent else {
                continue;
            };
            let def = parts[i].default_spacing();
            let base_width = parts[i].base_extent.width;

            if parts[i].resizes_base {
                let text = &buffer[parts[i].byte_offset..parts[i].byte_offset + parts[i].byte_len];
                let first_on_line = i == 0 || parts[i - 1].line_index != parts[i].line_index;
                let outer = usize::from(!first_on_line);
                let spacing = justify_spacing(
                    utf8_cluster_count(text),
                    outer,
                    def,
                    base_width,
                    annotation_extent.width,
                );

                if outer == 1 {
                    let prev = &mut parts[i - 1];
                    prev.trailing_spacing = Some(prev.base_spacing() + spacing);
                }

                let widths = self.metrics.cluster_widths(self.font, text, base_size)?;
                let part = &mut parts[i];
                part.spacing = spacing;
                part.cluster_offsets = cluster_offsets(&widths, spacing, outer == 1);
            } else if parts[i].resizes_annotation {
                let part = &mut parts[i];
                let annotation = part.annotation.as_deref().unwrap_or("");
                let spacing = justify_spacing(
                    utf8_cluster_count(annotation),
                    1,
                    def,
                    annotation_extent.width,
                    base_width,
                );
                let widths = self.metrics.cluster_widths(self.font, annotation, ruby_size)?;
                part.spacing = spacing;
                part.cluster_offsets = cluster_offsets(&widths, spacing, true);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Stage 1: Flatten
// =============================================================================

struct Flattener<'t, 's> {
    tree: &'t CueText,
    styles: &'t StyleSheet,
    limits: &'t LayoutLimits,
    stack: &'s mut StyleStack,
    buffer: String,
    parts: Vec<LinePart>,
    /// `<rt>` node each part's annotation came from
    annotation_sources: Vec<Option<NodeId>>,
    line: usize,
}

impl Flattener<'_, '_> {
    fn walk(&mut self, id: NodeId) -> CoreResult<()> {
        let tree = self.tree;
        match tree.kind(id) {
            NodeKind::Text(text) => self.text(id, text),
            NodeKind::Timestamp(_) => Ok(()),
            kind => {
                self.stack.push(&self.styles.node_style(tree, id))?;
                // An `<rt>` without text still annotates its base
                if matches!(kind, NodeKind::RubyText) {
                    self.annotate(id, "")?;
                }
                for &child in tree.children(id) {
                    self.walk(child)?;
                }
                self.stack.pop();
                Ok(())
            }
        }
    }

    fn text(&mut self, id: NodeId, text: &str) -> CoreResult<()> {
        if let Some(rt) = self.tree.enclosing_ruby_text(id) {
            return self.annotate(rt, text);
        }

        let in_ruby = self
            .tree
            .ancestors(id)
            .any(|a| matches!(self.tree.kind(a), NodeKind::Ruby));
        if in_ruby && text.contains('\n') {
            return Err(CoreError::ValidationError(
                "ruby base spans a line break".to_string(),
            ));
        }
        let is_ruby = matches!(self.tree.parent_kind(id), Some(NodeKind::Ruby));

        for (i, segment) in text.split('\n').enumerate() {
            if i > 0 {
                self.buffer.push('\n');
                self.line += 1;
            }
            if segment.is_empty() {
                continue;
            }
            self.push_part(segment, is_ruby)?;
        }
        Ok(())
    }

    fn push_part(&mut self, segment: &str, is_ruby: bool) -> CoreResult<()> {
        if self.parts.len() >= self.limits.max_parts {
            return Err(CoreError::capacity("parts", self.limits.max_parts));
        }
        if self.line >= self.limits.max_lines {
            return Err(CoreError::capacity("lines", self.limits.max_lines));
        }

        let offset = self.buffer.len();
        self.buffer.push_str(segment);
        self.parts.push(LinePart::new(
            offset,
            segment.len(),
            self.line,
            is_ruby,
            self.stack.top().clone(),
        ));
        self.annotation_sources.push(None);
        Ok(())
    }

    fn annotate(&mut self, rt: NodeId, text: &str) -> CoreResult<()> {
        if text.contains('\n') {
            return Err(CoreError::ValidationError(
                "ruby annotation contains a line break".to_string(),
            ));
        }
        let ruby_position = self.stack.top().ruby_position();
        let (Some(part), Some(source)) = (self.parts.last_mut(), self.annotation_sources.last_mut())
        else {
            return Err(CoreError::ValidationError(
                "ruby annotation has no base text".to_string(),
            ));
        };

        match *source {
            Some(prev) if prev != rt => {
                return Err(CoreError::ValidationError(
                    "base text has more than one annotation".to_string(),
                ));
            }
            Some(_) => {
                if let Some(annotation) = part.annotation.as_mut() {
                    annotation.push_str(text);
                }
            }
            None => {
                part.annotation = Some(text.to_string());
                part.ruby_position = ruby_position;
                *source = Some(rt);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Stages 3, 4 and 6
// =============================================================================

fn decide_resize_sides(parts: &mut [LinePart]) {
    for part in parts.iter_mut() {
        let Some(annotation) = part.annotation_extent else {
            continue;
        };
        let diff = annotation.width - part.base_extent.width;
        part.resizes_base = diff > WIDTH_EPSILON;
        part.resizes_annotation = diff < -WIDTH_EPSILON;
    }
}

fn assemble_lines(parts: Vec<LinePart>, base_font_size: f64) -> Vec<LineLayout> {
    let line_count = parts.last().map_or(0, |p| p.line_index + 1);
    let mut lines: Vec<LineLayout> = (0..line_count)
        .map(|index| LineLayout {
            index,
            extents: LineExtents::default(),
            top: 0.0,
            parts: Vec::new(),
        })
        .collect();

    for mut part in parts {
        let line = &mut lines[part.line_index];
        part.cursor_x = line.extents.width;
        part.advance = part.effective_width();
        part.ruby_offset = RubyOffset {
            dx: if part.resizes_annotation { part.spacing } else { 0.0 },
            dy: match part.ruby_position {
                RubyPosition::Over => 0.0,
                RubyPosition::Under => part.base_extent.height,
            },
        };
        line.extents.width += part.advance;
        line.extents.height = line.extents.height.max(part.base_extent.height);
        line.parts.push(part);
    }

    let mut top = 0.0;
    for line in &mut lines {
        // Blank lines keep the height of one line of base text
        if line.parts.is_empty() {
            line.extents.height = base_font_size;
        }
        line.top = top;
        top += line.extents.height;
    }
    lines
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuetext::parse_cue_text;
    use crate::text::FixedAdvanceMetrics;

    const EPS: f64 = 0.01;
    const FONT_SIZE: f64 = 20.0;

    fn engine<'a>(metrics: &'a FixedAdvanceMetrics, styles: &'a StyleSheet) -> RubyLayoutEngine<'a> {
        // 20px base with 10px annotations keeps widths whole
        RubyLayoutEngine::new(metrics, "test", styles).with_ruby_scale(0.5)
    }

    fn layout(input: &str) -> CoreResult<CueLayout> {
        let metrics = FixedAdvanceMetrics::default();
        let styles = StyleSheet::default();
        engine(&metrics, &styles).layout(&parse_cue_text(input), StyleStack::default(), FONT_SIZE)
    }

    // -------------------------------------------------------------------------
    // Flatten Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_plain_text_single_part() {
        let out = layout("hello").unwrap();
        assert_eq!(out.lines.len(), 1);
        assert_eq!(out.part_count(), 1);
        let part = &out.lines[0].parts[0];
        assert_eq!(out.part_text(part), "hello");
        assert!(!part.is_ruby);
        assert_eq!(part.annotation, None);
        assert_eq!(out.lines[0].extents, LineExtents::new(100.0, 20.0));
    }

    #[test]
    fn test_annotation_excluded_from_buffer() {
        let out = layout("<ruby>漢<rt>かん</rt>字<rt>じ</rt></ruby>です").unwrap();
        assert_eq!(out.text, "漢字です");
        let parts: Vec<_> = out.parts().collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].annotation.as_deref(), Some("かん"));
        assert_eq!(parts[1].annotation.as_deref(), Some("じ"));
        assert_eq!(parts[2].annotation, None);
        assert!(parts[0].is_ruby && parts[1].is_ruby && !parts[2].is_ruby);
    }

    #[test]
    fn test_newlines_split_lines() {
        let out = layout("ab\n<i>c</i>d\n\ne").unwrap();
        assert_eq!(out.text, "ab\ncd\n\ne");
        let lines: Vec<usize> = out.parts().map(|p| p.line_index).collect();
        assert_eq!(lines, vec![0, 1, 1, 3]);
        assert_eq!(out.lines.len(), 4);
        assert!(out.lines[2].parts.is_empty());
        assert_eq!(out.lines[2].extents.height, FONT_SIZE);
        assert_eq!(out.lines[3].top, 60.0);
    }

    #[test]
    fn test_style_snapshot_per_part() {
        let out = layout("<i>a</i>b").unwrap();
        let parts: Vec<_> = out.parts().collect();
        assert!(parts[0].style.is_italic());
        assert!(!parts[1].style.is_italic());
    }

    #[test]
    fn test_ruby_position_from_class() {
        let mut styles = StyleSheet::default();
        styles.parse_block("::cue(.under) { ruby-position: under; }");
        let metrics = FixedAdvanceMetrics::default();
        let out = engine(&metrics, &styles)
            .layout(
                &parse_cue_text("<ruby.under>ab<rt>cd</rt></ruby>"),
                StyleStack::default(),
                FONT_SIZE,
            )
            .unwrap();
        let part = out.parts().next().unwrap();
        assert_eq!(part.ruby_position, RubyPosition::Under);
        assert_eq!(part.ruby_offset.dy, FONT_SIZE);
    }

    #[test]
    fn test_split_text_in_one_rt_concatenates() {
        let out = layout("<ruby>ab<rt>c<i>d</i></rt></ruby>").unwrap();
        assert_eq!(out.parts().next().unwrap().annotation.as_deref(), Some("cd"));
    }

    // -------------------------------------------------------------------------
    // Justification Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_wider_annotation_stretches_base() {
        // base 2 × 20px = 40px, annotation 7 × 10px = 70px
        let out = layout("<ruby>ab<rt>abcdefg</rt></ruby>").unwrap();
        let part = out.parts().next().unwrap();

        assert!(part.resizes_base);
        assert!(!part.resizes_annotation);
        assert_eq!(part.base_extent.width, 40.0);
        assert!((part.effective_width() - 70.0).abs() < EPS);
        assert_eq!(part.annotation_extent, Some(TextExtents::new(70.0, 10.0)));
        assert!((part.spacing - 15.0).abs() < EPS);
        assert!((part.base_extent.width + 2.0 * part.spacing - 70.0).abs() < EPS);
        assert_eq!(part.cluster_offsets, vec![0.0, 35.0]);
    }

    #[test]
    fn test_stretch_borrows_gap_from_previous_part() {
        let out = layout("x<ruby>ab<rt>abcdefg</rt></ruby>").unwrap();
        let parts: Vec<_> = out.parts().collect();

        // three gaps: one before "a", one after each cluster
        assert!((parts[1].spacing - 10.0).abs() < EPS);
        assert_eq!(parts[0].trailing_spacing, Some(10.0));
        assert_eq!(parts[1].cursor_x, 20.0);
        assert!((out.lines[0].extents.width - 90.0).abs() < EPS);
        assert_eq!(parts[1].cluster_offsets, vec![10.0, 40.0]);
    }

    #[test]
    fn test_trailing_spacing_coalesces_with_resized_previous() {
        let out = layout("<ruby>a<rt>abcd</rt>b<rt>abcdef</rt></ruby>").unwrap();
        let parts: Vec<_> = out.parts().collect();
        // "a" (20px) under 40px: 20px after its only cluster
        assert!((parts[0].spacing - 20.0).abs() < EPS);
        // "b" (20px) under 60px with a leading gap: 20px per gap
        assert!((parts[1].spacing - 20.0).abs() < EPS);
        assert_eq!(parts[0].trailing_spacing, Some(40.0));
        assert!((out.lines[0].extents.width - 100.0).abs() < EPS);
    }

    #[test]
    fn test_wider_base_stretches_annotation() {
        // base 4 × 20px = 80px, annotation 2 × 10px = 20px
        let out = layout("<ruby>abcd<rt>ab</rt></ruby>").unwrap();
        let part = out.parts().next().unwrap();

        assert!(part.resizes_annotation);
        assert!(!part.resizes_base);
        assert!((part.spacing - 20.0).abs() < EPS);
        let annotation = part.annotation_extent.unwrap();
        assert!((annotation.width + 3.0 * part.spacing - 80.0).abs() < EPS);
        assert_eq!(part.ruby_offset.dx, part.spacing);
        assert_eq!(part.effective_width(), 80.0);
        assert_eq!(part.trailing_spacing, None);
    }

    #[test]
    fn test_equal_widths_resize_nothing() {
        let out = layout("<ruby>a<rt>ab</rt></ruby>").unwrap();
        let part = out.parts().next().unwrap();
        assert!(!part.resizes_base && !part.resizes_annotation);
        assert_eq!(part.spacing, 0.0);
        assert!(part.cluster_offsets.is_empty());
    }

    #[test]
    fn test_default_spacing_is_removed_before_stretching() {
        let metrics = FixedAdvanceMetrics::default();
        let styles = StyleSheet::default();
        let base = StyleAttributes {
            letter_spacing: Some(2.0),
            ..Default::default()
        };
        let out = engine(&metrics, &styles)
            .layout(
                &parse_cue_text("<ruby>ab<rt>abcdefgh</rt></ruby>"),
                StyleStack::new(base, DEFAULT_MAX_STYLE_DEPTH),
                FONT_SIZE,
            )
            .unwrap();
        let part = out.parts().next().unwrap();
        // base 2 × 22 = 44, annotation 8 × 12 = 96
        assert_eq!(part.base_extent.width, 44.0);
        assert!((part.spacing - (96.0 - 40.0) / 2.0).abs() < EPS);
        assert!((part.effective_width() - 96.0).abs() < EPS);
    }

    #[test]
    fn test_multibyte_clusters() {
        let out = layout("<ruby>漢字<rt>かんじかんじか</rt></ruby>").unwrap();
        let part = out.parts().next().unwrap();
        assert_eq!(part.byte_len, "漢字".len());
        assert!((part.spacing - 15.0).abs() < EPS);
    }

    #[test]
    fn test_line_extents_and_cursor() {
        let out = layout("ab<i>c</i>\nd").unwrap();
        assert_eq!(out.lines[0].extents, LineExtents::new(60.0, 20.0));
        assert_eq!(out.lines[1].extents, LineExtents::new(20.0, 20.0));
        assert_eq!(out.lines[1].top, 20.0);
        let cursors: Vec<f64> = out.lines[0].parts.iter().map(|p| p.cursor_x).collect();
        assert_eq!(cursors, vec![0.0, 40.0]);
        assert_eq!(out.extents(), TextExtents::new(60.0, 40.0));
    }

    // -------------------------------------------------------------------------
    // Edge Case Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_cue_is_empty_layout() {
        for input in ["", "\n\n", "<00:00:01.000>", "<i></i>"] {
            let out = layout(input).unwrap();
            assert!(out.is_empty(), "{input:?}");
            assert!(out.lines.is_empty());
        }
    }

    #[test]
    fn test_empty_annotation_stretches_to_base() {
        let out = layout("<ruby>ab<rt></rt></ruby>").unwrap();
        let part = out.parts().next().unwrap();
        assert_eq!(part.annotation.as_deref(), Some(""));
        assert!(part.resizes_annotation);
        assert!((part.spacing - 40.0).abs() < EPS);
    }

    #[test]
    fn test_ruby_base_across_line_break_rejected() {
        let err = layout("<ruby>a\nb<rt>x</rt></ruby>").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_second_annotation_rejected() {
        let err = layout("<ruby>ab<rt>x</rt><rt>y</rt></ruby>").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_annotation_without_base_rejected() {
        let err = layout("<ruby><rt>x</rt></ruby>").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_part_capacity() {
        let metrics = FixedAdvanceMetrics::default();
        let styles = StyleSheet::default();
        let limits = LayoutLimits {
            max_parts: 2,
            ..Default::default()
        };
        let err = engine(&metrics, &styles)
            .with_limits(limits)
            .layout(&parse_cue_text("a<i>b</i>c"), StyleStack::default(), FONT_SIZE)
            .unwrap_err();
        assert!(matches!(err, CoreError::CapacityError { what: "parts", limit: 2 }));
    }

    #[test]
    fn test_line_capacity() {
        let metrics = FixedAdvanceMetrics::default();
        let styles = StyleSheet::default();
        let limits = LayoutLimits {
            max_lines: 2,
            ..Default::default()
        };
        let err = engine(&metrics, &styles)
            .with_limits(limits)
            .layout(&parse_cue_text("a\nb\nc"), StyleStack::default(), FONT_SIZE)
            .unwrap_err();
        assert!(matches!(err, CoreError::CapacityError { what: "lines", limit: 2 }));
    }

    #[test]
    fn test_style_depth_capacity() {
        let input = format!("{}x{}", "<i>".repeat(40), "</i>".repeat(40));
        let err = layout(&input).unwrap_err();
        assert!(matches!(err, CoreError::CapacityError { what: "style layers", .. }));
    }

    #[test]
    fn test_shaping_error_propagates() {
        struct NoFont;
        impl TextMetrics for NoFont {
            fn shape(&self, font: &str, _: &str, _: f64, _: f64) -> CoreResult<TextExtents> {
                Err(CoreError::ShapingError(format!("no font {font}")))
            }
            fn cluster_widths(&self, _: &str, _: &str, _: f64) -> CoreResult<Vec<f64>> {
                Ok(Vec::new())
            }
        }

        let styles = StyleSheet::default();
        let err = RubyLayoutEngine::new(&NoFont, "missing", &styles)
            .layout(&parse_cue_text("a"), StyleStack::default(), FONT_SIZE)
            .unwrap_err();
        assert!(matches!(err, CoreError::ShapingError(_)));
    }

    #[test]
    fn test_layout_is_idempotent() {
        let input = "x<ruby>漢<rt>かんかん</rt></ruby>y\n<b>z</b><ruby>ab<rt>q</rt></ruby>";
        let first = layout(input).unwrap();
        let second = layout(input).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_default_ruby_font_size() {
        let metrics = FixedAdvanceMetrics::default();
        let styles = StyleSheet::default();
        let engine = RubyLayoutEngine::new(&metrics, "test", &styles);
        assert_eq!(engine.ruby_font_size(54.0), 30.0);
        assert_eq!(engine.ruby_font_size(20.0), 11.0);
    }
}
