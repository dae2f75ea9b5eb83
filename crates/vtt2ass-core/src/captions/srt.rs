//! SRT (SubRip) Export
//!
//! Writes cues as SubRip blocks. Styling is reduced to what SRT players
//! understand: `<i>`, `<b>`, `<u>` and a leading `{\anN}` for left or
//! right aligned cues. Ruby annotations are kept inline in parentheses.

use super::models::{BaseDirection, Cue, TextAlign};
use crate::cuetext::{CueText, NodeId, NodeKind, StyleSheet};
use crate::TimeMs;

/// Exports cues to SRT format
///
/// Cues without text are left out; blocks are numbered consecutively.
pub fn export_srt(cues: &[Cue], styles: &StyleSheet) -> String {
    let mut output = String::new();

    for (index, cue) in cues.iter().filter(|c| !c.text.is_empty()).enumerate() {
        // Sequence number
        output.push_str(&format!("{}\n", index + 1));

        // Timestamps
        let start = format_srt_timestamp(cue.start_ms);
        let end = format_srt_timestamp(cue.end_ms);
        output.push_str(&format!("{} --> {}\n", start, end));

        // Text
        if let Some(an) = srt_alignment(cue) {
            output.push_str(&format!("{{\\an{}}}", an));
        }
        write_node(&cue.text, cue.text.root(), styles, &mut output);
        output.push_str("\n\n");
    }

    let mut output = output.trim_end().to_string();
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

/// Formats milliseconds as SRT timestamp (00:00:00,000)
pub fn format_srt_timestamp(ms: TimeMs) -> String {
    let total_ms = ms.max(0);
    let millis = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Bottom-row numpad alignment for non-centered cues
fn srt_alignment(cue: &Cue) -> Option<u8> {
    let rtl = cue.settings.base_direction == BaseDirection::Rtl;
    match cue.settings.text_align {
        TextAlign::Left => Some(1),
        TextAlign::Right => Some(3),
        TextAlign::Start => Some(if rtl { 3 } else { 1 }),
        TextAlign::End => Some(if rtl { 1 } else { 3 }),
        TextAlign::Center => None,
    }
}

fn write_node(tree: &CueText, id: NodeId, styles: &StyleSheet, out: &mut String) {
    let (open, close) = match tree.kind(id) {
        NodeKind::Text(text) => {
            out.push_str(text);
            return;
        }
        NodeKind::Timestamp(_) => return,
        NodeKind::RubyText => ("(".to_string(), ")".to_string()),
        _ => style_tags(tree, id, styles),
    };

    out.push_str(&open);
    for &child in tree.children(id) {
        write_node(tree, child, styles, out);
    }
    out.push_str(&close);
}

fn style_tags(tree: &CueText, id: NodeId, styles: &StyleSheet) -> (String, String) {
    let attrs = styles.node_style(tree, id);
    let mut open = String::new();
    let mut close = String::new();

    for (set, tag) in [
        (attrs.italic, "i"),
        (attrs.bold, "b"),
        (attrs.underline, "u"),
    ] {
        if set == Some(true) {
            open.push_str(&format!("<{}>", tag));
            close.insert_str(0, &format!("</{}>", tag));
        }
    }

    (open, close)
}
