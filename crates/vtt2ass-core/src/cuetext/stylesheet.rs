//! Cue Stylesheet
//!
//! Parses the `::cue(...)` rules of WebVTT `STYLE` blocks and maps cue
//! text nodes to the style attributes the layout engine cascades.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::node::{CueText, NodeId, NodeKind};
use crate::layout::StyleAttributes;
use crate::Color;

/// Maximum number of `text-shadow` layers kept per rule
pub const MAX_TEXT_SHADOWS: usize = 4;

// =============================================================================
// Style Models
// =============================================================================

/// Placement of ruby annotations relative to their base text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RubyPosition {
    #[default]
    Over,
    Under,
}

/// One `text-shadow` layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShadow {
    pub x_offset: i32,
    pub y_offset: i32,
    /// Color as written in the stylesheet (`#rrggbb`, name, ...)
    pub color: String,
}

/// Properties of one `::cue` rule
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueStyle {
    pub selector: String,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    #[serde(default)]
    pub ruby_position: Option<RubyPosition>,
    #[serde(default)]
    pub text_shadow: Vec<TextShadow>,
}

impl CueStyle {
    fn apply_property(&mut self, key: &str, value: &str) {
        match key {
            "ruby-position" => match value {
                "over" => self.ruby_position = Some(RubyPosition::Over),
                "under" => self.ruby_position = Some(RubyPosition::Under),
                other => warn!("Unsupported ruby-position '{}'", other),
            },
            "font-style" => self.italic = Some(matches!(value, "italic" | "oblique")),
            "x-ttml-shear" => self.italic = Some(true),
            "font-weight" => {
                self.bold = Some(matches!(value, "bold" | "bolder" | "600" | "700" | "800" | "900"))
            }
            "text-decoration" => self.underline = Some(value.contains("underline")),
            "text-shadow" => self.text_shadow = parse_text_shadow(value),
            other => debug!("Ignoring unsupported style property '{}'", other),
        }
    }

    /// Border width implied by the shadows: the largest offset
    pub fn border_width(&self) -> Option<f64> {
        self.text_shadow
            .iter()
            .map(|s| s.x_offset.abs().max(s.y_offset.abs()))
            .max()
            .map(f64::from)
    }

    /// Border color implied by the shadows: the first shadow's color
    pub fn border_color(&self) -> Option<Color> {
        self.text_shadow
            .first()
            .map(|s| Color::parse_css_or_black(&s.color))
    }
}

fn shadow_regex() -> Option<&'static Regex> {
    static SHADOW: OnceLock<Option<Regex>> = OnceLock::new();
    SHADOW
        .get_or_init(|| Regex::new(r"(-?\d+)(?:px)?\s+(-?\d+)(?:px)?\s+([^,]+),?").ok())
        .as_ref()
}

/// Parses `text-shadow: <x>[px] <y>[px] <color>, ...`
pub fn parse_text_shadow(value: &str) -> Vec<TextShadow> {
    let Some(re) = shadow_regex() else {
        return Vec::new();
    };
    re.captures_iter(value)
        .take(MAX_TEXT_SHADOWS)
        .filter_map(|caps| {
            Some(TextShadow {
                x_offset: caps.get(1)?.as_str().parse().ok()?,
                y_offset: caps.get(2)?.as_str().parse().ok()?,
                color: caps.get(3)?.as_str().trim().to_string(),
            })
        })
        .collect()
}

// =============================================================================
// Stylesheet
// =============================================================================

/// Ordered list of `::cue` rules, looked up by exact selector
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub rules: Vec<CueStyle>,
}

impl StyleSheet {
    /// Parses the body of one `STYLE` block and appends its rules
    pub fn parse_block(&mut self, block: &str) {
        let block = strip_comments(block);
        let mut rest = block.as_str();

        while let Some(open) = rest.find('{') {
            let selector = rest[..open].trim().to_string();
            let Some(close) = rest[open..].find('}') else {
                warn!("Unterminated style rule '{}'", selector);
                break;
            };
            let body = &rest[open + 1..open + close];
            rest = &rest[open + close + 1..];

            let mut style = CueStyle {
                selector,
                ..Default::default()
            };
            for declaration in body.split(';') {
                let Some((key, value)) = declaration.split_once(':') else {
                    continue;
                };
                style.apply_property(key.trim(), value.trim());
            }
            self.rules.push(style);
        }
    }

    /// Finds the last rule with exactly this selector
    pub fn get(&self, selector: &str) -> Option<&CueStyle> {
        self.rules.iter().rev().find(|r| r.selector == selector)
    }

    /// Rule for a class name, i.e. `::cue(.name)`
    pub fn for_class(&self, class: &str) -> Option<&CueStyle> {
        self.get(&format!("::cue(.{})", class))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Maps a cue text node to the attributes it sets.
    ///
    /// Fields the node does not touch stay unset so that they inherit.
    pub fn node_style(&self, tree: &CueText, id: NodeId) -> StyleAttributes {
        let node = tree.node(id);
        let mut attrs = StyleAttributes::default();

        match node.kind {
            NodeKind::Italic => attrs.italic = Some(true),
            NodeKind::Bold => attrs.bold = Some(true),
            NodeKind::Underline => attrs.underline = Some(true),
            _ => {}
        }

        for class in &node.classes {
            let Some(rule) = self.for_class(class) else {
                continue;
            };
            attrs.italic = rule.italic.or(attrs.italic);
            attrs.bold = rule.bold.or(attrs.bold);
            attrs.underline = rule.underline.or(attrs.underline);
            attrs.ruby_position = rule.ruby_position.or(attrs.ruby_position);
            attrs.border_width = rule.border_width().or(attrs.border_width);
            attrs.border_color = rule.border_color().or(attrs.border_color);
        }

        attrs
    }
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        rest = match rest[start + 2..].find("*/") {
            Some(end) => &rest[start + 2 + end + 2..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}
