//! ASS document model
//!
//! The three sections written by the converter: `[Script Info]`,
//! `[V4+ Styles]` and `[Events]`.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Color, CoreResult, TimeMs, VideoInfo};

/// Outline width used when no border size is configured
pub const DEFAULT_OUTLINE: f64 = 2.0;

/// Name of the style every event references
pub const DEFAULT_STYLE_NAME: &str = "Default";

// =============================================================================
// Styles
// =============================================================================

/// One `Style:` line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: f64,
    pub primary_color: Color,
    pub secondary_color: Color,
    pub outline_color: Color,
    pub back_color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub spacing: f64,
    pub outline: f64,
    pub shadow: f64,
    /// Numpad alignment (1-9)
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl Default for AssStyle {
    fn default() -> Self {
        Self {
            name: DEFAULT_STYLE_NAME.to_string(),
            font_name: "sans-serif".to_string(),
            font_size: 54.0,
            primary_color: Color::white(),
            secondary_color: Color::rgb(255, 0, 0),
            outline_color: Color::black(),
            back_color: Color::black(),
            bold: false,
            italic: false,
            underline: false,
            spacing: 0.0,
            outline: DEFAULT_OUTLINE,
            shadow: 0.0,
            alignment: 2,
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
        }
    }
}

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

impl AssStyle {
    /// Formats the `Style:` line
    pub fn to_line(&self) -> String {
        let flag = |b: bool| if b { "-1" } else { "0" };
        format!(
            "Style: {},{},{},{},{},{},{},{},{},{},0,100,100,{},0,1,{},{},{},{},{},{},1",
            self.name,
            self.font_name,
            fmt_num(self.font_size),
            self.primary_color.to_ass_color(),
            self.secondary_color.to_ass_color(),
            self.outline_color.to_ass_color(),
            self.back_color.to_ass_color(),
            flag(self.bold),
            flag(self.italic),
            flag(self.underline),
            fmt_num(self.spacing),
            fmt_num(self.outline),
            fmt_num(self.shadow),
            self.alignment,
            self.margin_l,
            self.margin_r,
            self.margin_v,
        )
    }
}

// =============================================================================
// Events
// =============================================================================

/// One `Dialogue:` line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssEvent {
    pub layer: i32,
    pub start_ms: TimeMs,
    pub end_ms: TimeMs,
    pub style: String,
    /// Event text including override blocks
    pub text: String,
}

impl AssEvent {
    pub fn new(layer: i32, start_ms: TimeMs, end_ms: TimeMs, text: String) -> Self {
        Self {
            layer,
            start_ms,
            end_ms,
            style: DEFAULT_STYLE_NAME.to_string(),
            text,
        }
    }

    pub fn to_line(&self) -> String {
        format!(
            "Dialogue: {},{},{},{},,0,0,0,,{}",
            self.layer,
            format_ass_timestamp(self.start_ms),
            format_ass_timestamp(self.end_ms),
            self.style,
            self.text
        )
    }
}

/// Formats milliseconds as an ASS timestamp (H:MM:SS.cc)
pub fn format_ass_timestamp(ms: TimeMs) -> String {
    let total_cs = ms.max(0) / 10;
    let cs = total_cs % 100;
    let total_secs = total_cs / 100;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, cs)
}

/// Formats a number with at most three decimals and no trailing zeros
pub fn fmt_num(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Document
// =============================================================================

/// A complete ASS script
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssDocument {
    pub title: String,
    pub play_res: VideoInfo,
    pub styles: Vec<AssStyle>,
    pub events: Vec<AssEvent>,
}

impl AssDocument {
    pub fn new(play_res: VideoInfo, style: AssStyle) -> Self {
        Self {
            title: "Converted from WebVTT".to_string(),
            play_res,
            styles: vec![style],
            events: Vec::new(),
        }
    }

    pub fn push_events(&mut self, events: impl IntoIterator<Item = AssEvent>) {
        self.events.extend(events);
    }

    /// Writes the script to `path`
    pub fn write_to(&self, path: &Path) -> CoreResult<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for AssDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Script Info]")?;
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "ScriptType: v4.00+")?;
        writeln!(f, "WrapStyle: 2")?;
        writeln!(f, "ScaledBorderAndShadow: yes")?;
        writeln!(f, "PlayResX: {}", self.play_res.width)?;
        writeln!(f, "PlayResY: {}", self.play_res.height)?;
        writeln!(f)?;

        writeln!(f, "[V4+ Styles]")?;
        writeln!(f, "{}", STYLE_FORMAT)?;
        for style in &self.styles {
            writeln!(f, "{}", style.to_line())?;
        }
        writeln!(f)?;

        writeln!(f, "[Events]")?;
        writeln!(
            f,
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
        )?;
        for event in &self.events {
            writeln!(f, "{}", event.to_line())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ass_timestamp() {
        assert_eq!(format_ass_timestamp(0), "0:00:00.00");
        assert_eq!(format_ass_timestamp(1_500), "0:00:01.50");
        assert_eq!(format_ass_timestamp(3_723_456), "1:02:03.45");
        assert_eq!(format_ass_timestamp(-20), "0:00:00.00");
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(54.0), "54");
        assert_eq!(fmt_num(2.5), "2.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(-12.25), "-12.25");
    }

    #[test]
    fn test_style_line() {
        let style = AssStyle {
            font_name: "Noto Sans CJK JP".into(),
            bold: true,
            ..Default::default()
        };
        assert_eq!(
            style.to_line(),
            "Style: Default,Noto Sans CJK JP,54,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,\
             -1,0,0,0,100,100,0,0,1,2,0,2,0,0,0,1"
        );
    }

    #[test]
    fn test_event_line() {
        let event = AssEvent::new(4, 1_000, 2_500, "{\\an2}hi".into());
        assert_eq!(
            event.to_line(),
            "Dialogue: 4,0:00:01.00,0:00:02.50,Default,,0,0,0,,{\\an2}hi"
        );
    }

    #[test]
    fn test_document_sections() {
        let mut doc = AssDocument::new(VideoInfo::new(1280, 720), AssStyle::default());
        doc.push_events([AssEvent::new(4, 0, 1_000, "a".into())]);
        let out = doc.to_string();

        assert!(out.starts_with("[Script Info]\n"));
        assert!(out.contains("PlayResX: 1280\nPlayResY: 720\n"));
        assert!(out.contains("ScaledBorderAndShadow: yes"));
        assert!(out.contains("[V4+ Styles]\nFormat: Name, Fontname"));
        assert!(out.ends_with("Dialogue: 4,0:00:00.00,0:00:01.00,Default,,0,0,0,,a\n"));
    }
}
