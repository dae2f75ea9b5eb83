//! Caption System Module
//!
//! WebVTT input and the simple text outputs:
//! - Cue data models (Cue, CueSettings and the alignment enums)
//! - WebVTT file parsing
//! - SRT export
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  models.rs     - Cue, CueSettings, alignment enums              │
//! │  vtt.rs        - WebVTT parser (header, STYLE, NOTE, cues)      │
//! │  srt.rs        - SubRip export                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use vtt2ass_core::captions::{export_srt, parse_vtt};
//!
//! let doc = parse_vtt(&std::fs::read_to_string("in.vtt")?)?;
//! std::fs::write("out.srt", export_srt(&doc.cues, &doc.styles))?;
//! ```

mod models;
mod srt;
mod vtt;

// Re-export models
pub use models::{
    BaseDirection, Cue, CueSettings, LineAlign, PosAlign, TextAlign, WritingDirection,
};

// Re-export format functions
pub use srt::{export_srt, format_srt_timestamp};
pub use vtt::{parse_cue_settings, parse_timestamp_ms, parse_vtt, ParseError, VttDocument};
