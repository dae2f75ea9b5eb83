//! vtt2ass Core Library
//!
//! Converts WebVTT subtitle cues into positioned, styled ASS events.
//! This library contains the WebVTT parsers, the cue layout engine
//! (box positioning and ruby justification), text measurement and the
//! ASS/SRT writers. File I/O and argument handling live in the CLI.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  captions   - WebVTT file parser, cue settings, SRT export       │
//! │  cuetext    - cue text tokenizer, node arena, stylesheet         │
//! │  layout     - cue positioner, style stack, ruby layout engine    │
//! │  text       - TextMetrics trait, rustybuzz shaper, fixed metrics │
//! │  ass        - ASS document model and event renderer              │
//! │  convert    - per-cue driver, diagnostics, parallel layout       │
//! │  settings   - conversion settings (JSON, defaults, normalize)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod ass;
pub mod captions;
pub mod convert;
pub mod cuetext;
pub mod layout;
pub mod settings;
pub mod text;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_pipeline;
