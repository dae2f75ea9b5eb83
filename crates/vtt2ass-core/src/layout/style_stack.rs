//! Style Stack
//!
//! Cascading style attributes maintained while walking a cue text tree.
//! Each layer stores the already-cascaded result, so `top()` is O(1).

use serde::{Deserialize, Serialize};

use crate::cuetext::RubyPosition;
use crate::{Color, CoreError, CoreResult};

/// Default bound on nested style layers, base layer included
pub const DEFAULT_MAX_STYLE_DEPTH: usize = 30;

/// Style fields that cascade through the cue text tree.
///
/// `None` means "inherit from the enclosing layer".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleAttributes {
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub letter_spacing: Option<f64>,
    #[serde(default)]
    pub border_width: Option<f64>,
    #[serde(default)]
    pub border_color: Option<Color>,
    #[serde(default)]
    pub ruby_position: Option<RubyPosition>,
}

impl StyleAttributes {
    /// Layers `self` over `parent`: set fields win, unset fields inherit
    pub fn cascade(&self, parent: &StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            italic: self.italic.or(parent.italic),
            bold: self.bold.or(parent.bold),
            underline: self.underline.or(parent.underline),
            letter_spacing: self.letter_spacing.or(parent.letter_spacing),
            border_width: self.border_width.or(parent.border_width),
            border_color: self.border_color.or(parent.border_color),
            ruby_position: self.ruby_position.or(parent.ruby_position),
        }
    }

    pub fn is_unset(&self) -> bool {
        *self == StyleAttributes::default()
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_underline(&self) -> bool {
        self.underline.unwrap_or(false)
    }

    /// Letter spacing in pixels, zero when unset
    pub fn spacing(&self) -> f64 {
        self.letter_spacing.unwrap_or(0.0)
    }

    pub fn ruby_position(&self) -> RubyPosition {
        self.ruby_position.unwrap_or_default()
    }
}

/// Bounded stack of cascaded style layers
#[derive(Clone, Debug)]
pub struct StyleStack {
    layers: Vec<StyleAttributes>,
    max_depth: usize,
}

impl StyleStack {
    /// Creates a stack holding only `base`
    pub fn new(base: StyleAttributes, max_depth: usize) -> Self {
        Self {
            layers: vec![base],
            max_depth: max_depth.max(1),
        }
    }

    /// Pushes a layer on top of the current effective style
    pub fn push(&mut self, style: &StyleAttributes) -> CoreResult<()> {
        if self.layers.len() >= self.max_depth {
            return Err(CoreError::capacity("style layers", self.max_depth));
        }
        let cascaded = style.cascade(self.top());
        self.layers.push(cascaded);
        Ok(())
    }

    /// Removes the top layer.
    ///
    /// Returns `None` instead of removing the base layer; a caller that
    /// sees `None` has unbalanced push/pop calls.
    pub fn pop(&mut self) -> Option<StyleAttributes> {
        if self.layers.len() <= 1 {
            return None;
        }
        self.layers.pop()
    }

    /// Effective style: nearest explicit value for every field
    pub fn top(&self) -> &StyleAttributes {
        // The base layer is never removed
        &self.layers[self.layers.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl Default for StyleStack {
    fn default() -> Self {
        Self::new(StyleAttributes::default(), DEFAULT_MAX_STYLE_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn italic() -> StyleAttributes {
        StyleAttributes {
            italic: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_top_inherits_unset_fields() {
        let base = StyleAttributes {
            letter_spacing: Some(1.5),
            border_width: Some(2.0),
            ..Default::default()
        };
        let mut stack = StyleStack::new(base, 8);
        stack.push(&italic()).unwrap();
        stack
            .push(&StyleAttributes {
                border_width: Some(4.0),
                ruby_position: Some(RubyPosition::Under),
                ..Default::default()
            })
            .unwrap();

        let top = stack.top();
        assert!(top.is_italic());
        assert_eq!(top.spacing(), 1.5);
        assert_eq!(top.border_width, Some(4.0));
        assert_eq!(top.ruby_position(), RubyPosition::Under);
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn test_pop_restores_previous_layer() {
        let mut stack = StyleStack::default();
        stack.push(&italic()).unwrap();
        assert!(stack.top().is_italic());
        assert!(stack.pop().is_some());
        assert!(!stack.top().is_italic());
        assert!(stack.top().is_unset());
    }

    #[test]
    fn test_pop_never_removes_base() {
        let mut stack = StyleStack::default();
        assert!(stack.pop().is_none());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_depth_limit_is_capacity_error() {
        let mut stack = StyleStack::new(StyleAttributes::default(), 3);
        stack.push(&italic()).unwrap();
        stack.push(&italic()).unwrap();
        let err = stack.push(&italic()).unwrap_err();
        assert!(matches!(err, CoreError::CapacityError { limit: 3, .. }));
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn test_explicit_false_overrides_inherited_true() {
        let mut stack = StyleStack::default();
        stack.push(&italic()).unwrap();
        stack
            .push(&StyleAttributes {
                italic: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert!(!stack.top().is_italic());
        assert_eq!(stack.top().italic, Some(false));
    }
}
