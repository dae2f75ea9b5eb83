//! Fixed-advance metrics
//!
//! Deterministic stand-in for a real font: every character is one
//! cluster of width `size × ratio`, and lines are `size` tall.

use super::TextMetrics;
use crate::{CoreResult, TextExtents};

/// Advance of one character relative to the font size
pub const DEFAULT_ADVANCE_RATIO: f64 = 1.0;

/// Metrics where every character advances by the same amount
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvanceMetrics {
    ratio: f64,
}

impl FixedAdvanceMetrics {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

impl Default for FixedAdvanceMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_ADVANCE_RATIO)
    }
}

impl TextMetrics for FixedAdvanceMetrics {
    fn shape(
        &self,
        _font: &str,
        text: &str,
        size: f64,
        letter_spacing: f64,
    ) -> CoreResult<TextExtents> {
        let clusters = text.chars().count() as f64;
        Ok(TextExtents::new(
            clusters * (size * self.ratio + letter_spacing),
            size,
        ))
    }

    fn cluster_widths(&self, _font: &str, text: &str, size: f64) -> CoreResult<Vec<f64>> {
        Ok(text.chars().map(|_| size * self.ratio).collect())
    }

    fn family_name(&self, _font: &str) -> Option<String> {
        Some("sans-serif".to_string())
    }
}
