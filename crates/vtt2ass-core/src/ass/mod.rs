//! ASS Output Module
//!
//! - `document.rs` - script sections, styles, events, timestamps
//! - `tags.rs`     - override tags and text escaping
//! - `render.rs`   - cue box + layout to positioned events

mod document;
mod render;
mod tags;

pub use document::{
    fmt_num, format_ass_timestamp, AssDocument, AssEvent, AssStyle, DEFAULT_OUTLINE,
    DEFAULT_STYLE_NAME,
};
pub use render::{cue_anchor, AssAnchor, CueRenderer, DEBUG_LAYER, TEXT_LAYER};
pub use tags::{escape_text, InlineState, TagWriter};
