//! Cue Text Module
//!
//! Everything between a cue's timing line and the renderer's view of
//! its text:
//! - `tokenizer.rs`  - tags, classes, annotations, character references
//! - `parser.rs`     - builds the rich-text tree
//! - `node.rs`       - index-addressed node arena with parent links
//! - `stylesheet.rs` - `::cue(.class)` rules and node-to-style mapping

mod node;
mod parser;
mod stylesheet;
mod tokenizer;

pub use node::{CueText, Node, NodeId, NodeKind};
pub use parser::parse_cue_text;
pub use stylesheet::{
    parse_text_shadow, CueStyle, RubyPosition, StyleSheet, TextShadow, MAX_TEXT_SHADOWS,
};
pub use tokenizer::{tokenize, Token};
