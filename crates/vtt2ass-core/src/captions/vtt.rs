//! WebVTT File Parser
//!
//! Reads a WebVTT file into cues (timing, settings, rich-text tree) and
//! the stylesheet collected from its `STYLE` blocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use vtt2ass_core::captions::parse_vtt;
//!
//! let content = std::fs::read_to_string("episode.vtt")?;
//! let doc = parse_vtt(&content)?;
//! println!("{} cues, {} style rules", doc.cues.len(), doc.styles.rules.len());
//! ```

use tracing::{debug, warn};

use super::models::{Cue, CueSettings, LineAlign, PosAlign};
use crate::cuetext::{parse_cue_text, StyleSheet};
use crate::{CoreError, CoreResult, Diagnostic, TimeMs};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that make a WebVTT file unreadable as a whole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid timestamp format
    InvalidTimestamp(String),
    /// Invalid block or timing line format
    InvalidFormat(String),
    /// The file does not start with a `WEBVTT` line
    MissingHeader,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(s) => write!(f, "Invalid timestamp: {}", s),
            Self::InvalidFormat(s) => write!(f, "Invalid format: {}", s),
            Self::MissingHeader => write!(f, "VTT file must start with WEBVTT"),
        }
    }
}

impl std::error::Error for ParseError {}

// =============================================================================
// Document
// =============================================================================

/// Parsed contents of a WebVTT file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VttDocument {
    pub cues: Vec<Cue>,
    pub styles: StyleSheet,
    /// Settings that were recovered and cue blocks that were dropped
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses WebVTT content
///
/// # VTT Format
///
/// ```text
/// WEBVTT
///
/// STYLE
/// ::cue(.under) { ruby-position: under; }
///
/// intro
/// 00:00:01.000 --> 00:00:04.000 line:80% align:start
/// <ruby>漢<rt>かん</rt></ruby>字
/// ```
pub fn parse_vtt(content: &str) -> Result<VttDocument, ParseError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut doc = VttDocument::default();
    let mut lines = content.lines().peekable();

    let header = lines.next().ok_or(ParseError::MissingHeader)?;
    if !is_header(header) {
        return Err(ParseError::MissingHeader);
    }

    // Skip any header metadata (lines before first blank line after WEBVTT)
    while lines.peek().is_some_and(|l| !l.trim().is_empty()) {
        lines.next();
    }

    while lines.peek().is_some() {
        // Skip empty lines
        while lines.peek().is_some_and(|l| l.trim().is_empty()) {
            lines.next();
        }

        let Some(first_line) = lines.next() else {
            break;
        };

        if is_block_keyword(first_line, "NOTE") {
            skip_block(&mut lines);
            continue;
        }

        if first_line.trim() == "STYLE" {
            let mut body = String::new();
            while let Some(line) = lines.next_if(|l| !l.trim().is_empty()) {
                body.push_str(line);
                body.push('\n');
            }
            if doc.cues.is_empty() {
                doc.styles.parse_block(&body);
            } else {
                warn!("Ignoring STYLE block after the first cue");
            }
            continue;
        }

        // Check if this is a cue identifier (optional in VTT)
        let (id, timing_line) = if first_line.contains("-->") {
            ("", first_line)
        } else {
            match lines.next_if(|l| l.contains("-->")) {
                Some(timing) => (first_line.trim(), timing),
                None => {
                    warn!("Skipping block without a timing line: {:?}", first_line);
                    skip_block(&mut lines);
                    continue;
                }
            }
        };

        let cue_index = doc.cues.len();
        let (start_ms, end_ms, settings_str) = match parse_timing_line(timing_line) {
            Ok(timing) => timing,
            Err(e) => {
                warn!("Skipping cue with bad timing: {}", e);
                doc.diagnostics
                    .push(Diagnostic::skipped(cue_index, id, e.to_string()));
                skip_block(&mut lines);
                continue;
            }
        };

        // Cue text runs until a blank line or the next timing line
        let mut text_lines = Vec::new();
        while let Some(line) = lines.next_if(|l| !l.trim().is_empty() && !l.contains("-->")) {
            text_lines.push(line);
        }

        let mut settings = CueSettings::default();
        for err in parse_cue_settings(settings_str, &mut settings) {
            warn!("Cue {:?}: {}", id, err);
            doc.diagnostics
                .push(Diagnostic::recovered(cue_index, id, err.to_string()));
        }

        let mut cue = Cue::new(id, start_ms, end_ms, parse_cue_text(&text_lines.join("\n")));
        cue.settings = settings;
        doc.cues.push(cue);
    }

    debug!(
        "Parsed {} cues and {} style rules",
        doc.cues.len(),
        doc.styles.rules.len()
    );
    Ok(doc)
}

fn is_header(line: &str) -> bool {
    is_block_keyword(line, "WEBVTT")
}

/// `keyword` alone or followed by whitespace
fn is_block_keyword(line: &str, keyword: &str) -> bool {
    line.strip_prefix(keyword)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
}

fn skip_block<'a>(lines: &mut std::iter::Peekable<impl Iterator<Item = &'a str>>) {
    while lines.next_if(|l| !l.trim().is_empty()).is_some() {}
}

// =============================================================================
// Timing
// =============================================================================

/// Parses a timing line, returning start, end and the trailing settings
fn parse_timing_line(line: &str) -> Result<(TimeMs, TimeMs, &str), ParseError> {
    let Some((start, rest)) = line.split_once("-->") else {
        return Err(ParseError::InvalidFormat(format!(
            "Expected 'start --> end' format: {}",
            line
        )));
    };

    let rest = rest.trim_start();
    let (end, settings) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));

    let start_ms = parse_timestamp_ms(start.trim())?;
    let end_ms = parse_timestamp_ms(end)?;
    Ok((start_ms, end_ms, settings))
}

/// Parses a WebVTT timestamp (`HH:MM:SS.mmm` or `MM:SS.mmm`) into milliseconds
pub fn parse_timestamp_ms(ts: &str) -> Result<TimeMs, ParseError> {
    let invalid = || ParseError::InvalidTimestamp(ts.to_string());
    let digits = |s: &str| -> Result<TimeMs, ParseError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse().map_err(|_| invalid())
    };

    let (clock, millis) = ts.split_once('.').ok_or_else(invalid)?;
    if millis.len() != 3 {
        return Err(invalid());
    }

    let fields: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (digits(h)?, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes.len() != 2 || seconds.len() != 2 {
        return Err(invalid());
    }

    let minutes = digits(minutes)?;
    let seconds = digits(seconds)?;
    if minutes > 59 || seconds > 59 {
        return Err(invalid());
    }

    let millis = digits(millis)?;
    hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + millis))
        .ok_or_else(invalid)
}

// =============================================================================
// Cue Settings
// =============================================================================

/// Applies a cue settings list (`line:80% align:start ...`) to `settings`.
///
/// A setting that fails to parse leaves its fields untouched; one
/// `ValidationError` is returned per rejected setting.
pub fn parse_cue_settings(input: &str, settings: &mut CueSettings) -> Vec<CoreError> {
    let mut errors = Vec::new();

    for item in input.split_whitespace() {
        let Some((name, value)) = item.split_once(':').filter(|(n, v)| !n.is_empty() && !v.is_empty())
        else {
            errors.push(CoreError::ValidationError(format!(
                "malformed cue setting '{}'",
                item
            )));
            continue;
        };

        if let Err(e) = apply_setting(name, value, settings) {
            errors.push(e);
        }
    }

    errors
}

fn apply_setting(name: &str, value: &str, settings: &mut CueSettings) -> CoreResult<()> {
    match name {
        "vertical" => settings.writing_direction = value.parse()?,
        "line" => {
            let (line, align) = split_alignment(value);
            if let Some(align) = align {
                settings.line_align = align.parse()?;
            }
            if value_is_line_number(line) {
                return Err(CoreError::ValidationError(format!(
                    "line number '{}' is not supported, keeping auto",
                    line
                )));
            }
            settings.line = Some(parse_percentage(line)?);
            settings.snap_to_lines = false;
        }
        "position" => {
            let (position, align) = split_alignment(value);
            let align: Option<PosAlign> = align.map(str::parse).transpose()?;
            settings.position = Some(parse_percentage(position)?);
            if let Some(align) = align {
                settings.pos_align = align;
            }
        }
        "size" => settings.size = parse_percentage(value)?,
        "align" => settings.text_align = value.parse()?,
        "region" => debug!("Ignoring region setting '{}'", value),
        _ => {
            return Err(CoreError::ValidationError(format!(
                "unknown cue setting '{}'",
                name
            )))
        }
    }
    Ok(())
}

fn split_alignment(value: &str) -> (&str, Option<&str>) {
    match value.split_once(',') {
        Some((v, align)) => (v, Some(align)),
        None => (value, None),
    }
}

fn value_is_line_number(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parses `NN%` / `NN.N%` into a fraction in `[0, 1]`
fn parse_percentage(value: &str) -> CoreResult<f64> {
    let invalid = || CoreError::ValidationError(format!("invalid percentage '{}'", value));

    let number = value.strip_suffix('%').ok_or_else(invalid)?;
    let well_formed = !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && number.bytes().filter(|&b| b == b'.').count() <= 1
        && number.bytes().any(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(invalid());
    }

    let percent: f64 = number.parse().map_err(|_| invalid())?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(invalid());
    }
    Ok(percent / 100.0)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::{TextAlign, WritingDirection};
    use crate::cuetext::RubyPosition;

    // -------------------------------------------------------------------------
    // Timestamp Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_timestamps() {
        assert_eq!(parse_timestamp_ms("00:01.500").unwrap(), 1500);
        assert_eq!(parse_timestamp_ms("01:02:03.004").unwrap(), 3_723_004);
        assert_eq!(parse_timestamp_ms("100:00:00.000").unwrap(), 360_000_000);
    }

    #[test]
    fn test_parse_invalid_timestamps() {
        for ts in ["1:02.000", "00:60.000", "00:01,000", "00:01.50", "aa:bb.ccc", ""] {
            assert!(parse_timestamp_ms(ts).is_err(), "{} should be rejected", ts);
        }
    }

    #[test]
    fn test_overflowing_timestamp_rejected() {
        let ts = "9999999999999999:00:00.000";
        assert_eq!(
            parse_timestamp_ms(ts),
            Err(ParseError::InvalidTimestamp(ts.to_string()))
        );
        // Largest hour count that fits, then one past it
        assert_eq!(
            parse_timestamp_ms("2562047788015:00:00.000").unwrap(),
            9_223_372_036_854_000_000
        );
        assert!(parse_timestamp_ms("2562047788016:00:00.000").is_err());
        assert!(parse_timestamp_ms("2562047788015:59:59.999").is_err());

        let vtt = "WEBVTT\n\n9999999999999999:00:00.000 --> 00:01.000\nhuge\n\n00:01.000 --> 00:02.000\nkept\n";
        let doc = parse_vtt(vtt).unwrap();
        assert_eq!(doc.cues.len(), 1);
        assert_eq!(doc.cues[0].text.plain_text(), "kept");
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].kind, crate::DiagnosticKind::Skipped);
    }

    // -------------------------------------------------------------------------
    // Cue Setting Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_all_settings() {
        let mut s = CueSettings::default();
        let errors = parse_cue_settings(
            "vertical:rl line:80%,end position:10%,line-left size:35.5% align:left",
            &mut s,
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(s.writing_direction, WritingDirection::VerticalGrowLeft);
        assert_eq!(s.line, Some(0.8));
        assert!(!s.snap_to_lines);
        assert_eq!(s.line_align, LineAlign::End);
        assert_eq!(s.position, Some(0.1));
        assert_eq!(s.pos_align, PosAlign::LineLeft);
        assert!((s.size - 0.355).abs() < 1e-9);
        assert_eq!(s.text_align, TextAlign::Left);
    }

    #[test]
    fn test_invalid_settings_keep_defaults() {
        let mut s = CueSettings::default();
        let errors = parse_cue_settings(
            "size:150% align:justify position:50%,sideways bogus:1 line:-1 nocolon",
            &mut s,
        );
        assert_eq!(errors.len(), 6);
        assert!(errors.iter().all(|e| matches!(e, CoreError::ValidationError(_))));
        assert_eq!(s, CueSettings::default());
    }

    #[test]
    fn test_line_number_still_sets_alignment() {
        let mut s = CueSettings::default();
        let errors = parse_cue_settings("line:3,end", &mut s);
        assert_eq!(errors.len(), 1);
        assert_eq!(s.line_align, LineAlign::End);
        assert_eq!(s.line, None);
        assert!(s.snap_to_lines);
    }

    #[test]
    fn test_percentage_forms() {
        assert_eq!(parse_percentage("0%").unwrap(), 0.0);
        assert_eq!(parse_percentage("100%").unwrap(), 1.0);
        assert!(parse_percentage("50").is_err());
        assert!(parse_percentage("1.2.3%").is_err());
        assert!(parse_percentage(".%").is_err());
        assert!(parse_percentage("-5%").is_err());
    }

    // -------------------------------------------------------------------------
    // File Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_vtt_file() {
        let vtt = "\u{feff}WEBVTT - episode 1\nKind: captions\n\n\
            STYLE\n::cue(.under) { ruby-position: under; }\n\n\
            NOTE this is\na comment\n\n\
            intro\n00:00:01.000 --> 00:00:04.000 align:start line:10%\n\
            <c.under><ruby>漢<rt>かん</rt></ruby></c>字\nsecond line\n\n\
            00:05.000 --> 00:08.000\nNo id\n";

        let doc = parse_vtt(vtt).unwrap();
        assert_eq!(doc.cues.len(), 2);
        assert!(doc.diagnostics.is_empty());
        assert_eq!(
            doc.styles.for_class("under").unwrap().ruby_position,
            Some(RubyPosition::Under)
        );

        let first = &doc.cues[0];
        assert_eq!(first.id, "intro");
        assert_eq!((first.start_ms, first.end_ms), (1000, 4000));
        assert_eq!(first.settings.text_align, TextAlign::Start);
        assert_eq!(first.settings.line, Some(0.1));
        assert_eq!(first.text.plain_text(), "漢字\nsecond line");

        let second = &doc.cues[1];
        assert_eq!(second.id, "");
        assert_eq!((second.start_ms, second.end_ms), (5000, 8000));
        assert_eq!(second.settings, CueSettings::default());
    }

    #[test]
    fn test_parse_vtt_requires_header() {
        assert_eq!(parse_vtt(""), Err(ParseError::MissingHeader));
        assert_eq!(
            parse_vtt("WEBVTTX\n\n00:01.000 --> 00:02.000\nx"),
            Err(ParseError::MissingHeader)
        );
    }

    #[test]
    fn test_bad_cues_are_reported_not_fatal() {
        let vtt = "WEBVTT\n\n\
            00:01.000 --> 00:xx.000\nbroken\n\n\
            00:02.000 --> 00:03.000 size:abc\nkept\n\n\
            orphan text\nwithout timing\n";

        let doc = parse_vtt(vtt).unwrap();
        assert_eq!(doc.cues.len(), 1);
        assert_eq!(doc.cues[0].text.plain_text(), "kept");
        assert_eq!(doc.diagnostics.len(), 2);
        assert_eq!(doc.diagnostics[0].kind, crate::DiagnosticKind::Skipped);
        assert_eq!(doc.diagnostics[1].kind, crate::DiagnosticKind::Recovered);
    }

    #[test]
    fn test_style_after_cue_is_ignored() {
        let vtt = "WEBVTT\n\n00:01.000 --> 00:02.000\nx\n\nSTYLE\n::cue(.a) { font-style: italic; }\n";
        let doc = parse_vtt(vtt).unwrap();
        assert!(doc.styles.is_empty());
        assert_eq!(doc.cues.len(), 1);
    }

    #[test]
    fn test_cue_without_text() {
        let vtt = "WEBVTT\n\n00:01.000 --> 00:02.000\n\n00:03.000 --> 00:04.000\nx\n";
        let doc = parse_vtt(vtt).unwrap();
        assert_eq!(doc.cues.len(), 2);
        assert!(doc.cues[0].text.is_empty());
    }
}
