//! Inline override tags and text escaping

use super::document::{fmt_num, AssStyle};
use crate::layout::StyleAttributes;
use crate::Color;

/// Word joiner inserted to break up accidental `\n`, `\N` and `\h`
const WORD_JOINER: char = '\u{2060}';

/// Escapes base or annotation text for an event line.
///
/// Braces would open override blocks, and a backslash followed by
/// `n`, `N` or `h` would turn into a line break or hard space.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\\' => {
                out.push('\\');
                if matches!(chars.peek(), Some('n' | 'N' | 'h')) {
                    out.push(WORD_JOINER);
                }
            }
            '\n' => out.push_str("\\N"),
            other => out.push(other),
        }
    }
    out
}

/// Style values in effect at some point of an event line
#[derive(Clone, Debug, PartialEq)]
pub struct InlineState {
    pub italic: bool,
    pub bold: bool,
    pub underline: bool,
    pub border: f64,
    pub border_color: Color,
}

impl InlineState {
    /// State right after the event starts, i.e. the style's own values
    pub fn from_style(style: &AssStyle) -> Self {
        Self {
            italic: style.italic,
            bold: style.bold,
            underline: style.underline,
            border: style.outline,
            border_color: style.outline_color,
        }
    }

    /// State a run with `attrs` is drawn with; unset fields fall back to `base`
    pub fn resolve(base: &InlineState, attrs: &StyleAttributes) -> Self {
        Self {
            italic: attrs.italic.unwrap_or(base.italic),
            bold: attrs.bold.unwrap_or(base.bold),
            underline: attrs.underline.unwrap_or(base.underline),
            border: attrs.border_width.unwrap_or(base.border),
            border_color: attrs.border_color.unwrap_or(base.border_color),
        }
    }

    /// Tags that turn `self` into `target`, without braces
    pub fn diff_tags(&self, target: &InlineState) -> String {
        let flag = |b: bool| if b { 1 } else { 0 };
        let mut tags = String::new();
        if self.italic != target.italic {
            tags.push_str(&format!("\\i{}", flag(target.italic)));
        }
        if self.bold != target.bold {
            tags.push_str(&format!("\\b{}", flag(target.bold)));
        }
        if self.underline != target.underline {
            tags.push_str(&format!("\\u{}", flag(target.underline)));
        }
        if self.border != target.border {
            tags.push_str(&format!("\\bord{}", fmt_num(target.border)));
        }
        if self.border_color != target.border_color {
            tags.push_str(&format!("\\3c{}", target.border_color.to_ass_inline()));
        }
        tags
    }
}

/// Emits override tags run by run, only for values that changed
#[derive(Clone, Debug)]
pub struct TagWriter {
    base: InlineState,
    current: InlineState,
}

impl TagWriter {
    pub fn new(style: &AssStyle) -> Self {
        let base = InlineState::from_style(style);
        Self {
            current: base.clone(),
            base,
        }
    }

    /// Override block switching to `attrs`, or an empty string
    pub fn switch_to(&mut self, attrs: &StyleAttributes) -> String {
        let target = InlineState::resolve(&self.base, attrs);
        let tags = self.current.diff_tags(&target);
        self.current = target;
        if tags.is_empty() {
            tags
        } else {
            format!("{{{}}}", tags)
        }
    }

    /// Tags (without braces) that draw `attrs` on top of the bare style
    pub fn standalone(&self, attrs: &StyleAttributes) -> String {
        self.base.diff_tags(&InlineState::resolve(&self.base, attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_braces_and_breaks() {
        assert_eq!(escape_text("a{b}c"), "a\\{b\\}c");
        assert_eq!(escape_text("C:\\new"), "C:\\\u{2060}new");
        assert_eq!(escape_text("\\hi \\x"), "\\\u{2060}hi \\x");
        assert_eq!(escape_text("a\nb"), "a\\Nb");
        assert_eq!(escape_text("漢字"), "漢字");
    }

    #[test]
    fn test_tag_writer_emits_changes_only() {
        let mut writer = TagWriter::new(&AssStyle::default());
        let italic = StyleAttributes {
            italic: Some(true),
            ..Default::default()
        };
        assert_eq!(writer.switch_to(&italic), "{\\i1}");
        assert_eq!(writer.switch_to(&italic), "");
        assert_eq!(writer.switch_to(&StyleAttributes::default()), "{\\i0}");
    }

    #[test]
    fn test_border_tags() {
        let mut writer = TagWriter::new(&AssStyle::default());
        let shadowed = StyleAttributes {
            border_width: Some(3.0),
            border_color: Some(Color::rgb(0x11, 0x22, 0x33)),
            bold: Some(true),
            ..Default::default()
        };
        assert_eq!(writer.switch_to(&shadowed), "{\\b1\\bord3\\3c&H332211&}");
        assert_eq!(writer.standalone(&shadowed), "\\b1\\bord3\\3c&H332211&");
        assert_eq!(writer.standalone(&StyleAttributes::default()), "");
    }
}
