//! Text Measurement Module
//!
//! The layout engine never touches font data directly; it measures text
//! through the [`TextMetrics`] trait.
//!
//! # Implementations
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  ShapingMetrics      - rustybuzz shaping of loaded fonts   │
//! │  FixedAdvanceMetrics - every cluster advances size × ratio │
//! └────────────────────────────────────────────────────────────┘
//! ```

mod fixed;
mod shaper;

pub use fixed::{FixedAdvanceMetrics, DEFAULT_ADVANCE_RATIO};
pub use shaper::{FontData, FontStore, ShapingMetrics};

use crate::{CoreResult, TextExtents};

// =============================================================================
// TextMetrics Trait
// =============================================================================

/// Measures shaped text.
///
/// Implementations must be deterministic and safe to share between the
/// threads of a parallel conversion; any internal caching has to be
/// synchronized.
pub trait TextMetrics: Send + Sync {
    /// Shapes `text` with `font` at `size` pixels.
    ///
    /// The returned width already includes `letter_spacing` once per
    /// character, the same count [`utf8_cluster_count`] uses when
    /// justification removes that spacing again.
    ///
    /// [`utf8_cluster_count`]: crate::layout::utf8_cluster_count
    fn shape(&self, font: &str, text: &str, size: f64, letter_spacing: f64)
        -> CoreResult<TextExtents>;

    /// Advance width of every glyph cluster of `text`, in visual order,
    /// without letter spacing
    fn cluster_widths(&self, font: &str, text: &str, size: f64) -> CoreResult<Vec<f64>>;

    /// Family name to reference the font by in output styles
    fn family_name(&self, _font: &str) -> Option<String> {
        None
    }
}

impl<T: TextMetrics + ?Sized> TextMetrics for &T {
    fn shape(
        &self,
        font: &str,
        text: &str,
        size: f64,
        letter_spacing: f64,
    ) -> CoreResult<TextExtents> {
        (**self).shape(font, text, size, letter_spacing)
    }

    fn cluster_widths(&self, font: &str, text: &str, size: f64) -> CoreResult<Vec<f64>> {
        (**self).cluster_widths(font, text, size)
    }

    fn family_name(&self, font: &str) -> Option<String> {
        (**self).family_name(font)
    }
}
