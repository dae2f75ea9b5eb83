//! Cue Layout Module
//!
//! Geometry of a single cue, computed independently of every other cue:
//!
//! ```text
//! CueSettings + VideoInfo ──► CuePositioner ──► CuePositionBox ─┐
//!                                                               ├──► renderer
//! CueText + StyleStack ─────► RubyLayoutEngine ──► CueLayout ───┘
//!                                   │
//!                                   └── TextMetrics (shape, cluster widths)
//! ```
//!
//! - `position.rs`    - WebVTT box model for cue settings
//! - `style_stack.rs` - cascading style attributes
//! - `ruby.rs`        - flatten, measure and justify ruby runs
//! - `justify.rs`     - spacing arithmetic shared by both resize sides

mod justify;
mod position;
mod ruby;
mod style_stack;

pub use justify::{cluster_offsets, justify_spacing, last_cluster_offset, utf8_cluster_count};
pub use position::{compute_line, compute_pos_align, compute_position, max_size, CuePositioner};
pub use ruby::{
    CueLayout, LayoutLimits, LineExtents, LineLayout, LinePart, RubyLayoutEngine, RubyOffset,
    DEFAULT_MAX_LINES, DEFAULT_MAX_PARTS, DEFAULT_RUBY_SCALE,
};
pub use style_stack::{StyleAttributes, StyleStack, DEFAULT_MAX_STYLE_DEPTH};
