//! End-to-end WebVTT to ASS/SRT tests

use crate::ass::TEXT_LAYER;
use crate::captions::{export_srt, parse_vtt};
use crate::convert::Converter;
use crate::settings::ConvertSettings;
use crate::text::FixedAdvanceMetrics;
use crate::{CoreError, VideoInfo};

const SAMPLE: &str = "\u{feff}WEBVTT
Kind: captions

NOTE written by hand

STYLE
::cue(.under) { ruby-position: under; }
::cue(.loud) { font-weight: bold; text-shadow: 3px 3px #ff0000; }

intro
00:00:01.000 --> 00:00:03.500
<ruby>漢<rt>かん</rt>字<rt>じ</rt></ruby>です

00:00:04.000 --> 00:00:06.000 line:10%,start align:left position:10%
<c.loud>Top</c> line

00:00:07.000 --> 00:00:08.000 size:200%
<ruby.under>ab<rt>x</rt></ruby>

00:00:09.000 --> 00:00:10.000
<ruby>a
b<rt>broken</rt></ruby>
";

fn settings() -> ConvertSettings {
    ConvertSettings {
        video: VideoInfo::new(1280, 720),
        font_size: Some(40.0),
        ..Default::default()
    }
}

fn dialogue_lines(ass: &str) -> Vec<&str> {
    ass.lines().filter(|l| l.starts_with("Dialogue:")).collect()
}

// -----------------------------------------------------------------------------
// ASS Conversion Tests
// -----------------------------------------------------------------------------

#[test]
fn test_sample_converts_with_diagnostics() {
    let metrics = FixedAdvanceMetrics::default();
    let converter = Converter::new(settings(), &metrics);
    let (ass, report) = converter.convert_str(SAMPLE).unwrap();

    assert_eq!(report.converted, 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].cue_index, 3);
    assert!(report.skipped[0].message.contains("line break"));
    assert_eq!(report.recovered.len(), 1);
    assert_eq!(report.recovered[0].cue_index, 2);

    let out = ass.to_string();
    assert!(out.contains("PlayResX: 1280\nPlayResY: 720"));
    assert!(out.contains("Style: Default,sans-serif,40,"));
    assert_eq!(dialogue_lines(&out).len(), 6);
    assert!(ass.events.iter().all(|e| e.layer == TEXT_LAYER));
}

#[test]
fn test_ruby_cue_events() {
    let metrics = FixedAdvanceMetrics::default();
    let (ass, _) = Converter::new(settings(), &metrics).convert_str(SAMPLE).unwrap();

    // 漢 (40px) is stretched to かん (44px); じ (22px) is spread over 字
    // with 9px on both sides. Block 164 × 40 anchored bottom-center at
    // (640, 700) puts the origin at (558, 660)
    assert_eq!(
        ass.events[0].text,
        "{\\an2\\pos(640,700)\\fs40}{\\fsp4}漢{\\fsp0}字{\\fsp0}です"
    );
    assert_eq!(ass.events[1].text, "{\\an1\\pos(558,660)\\fs22}かん");
    assert_eq!(ass.events[2].text, "{\\an1\\pos(611,660)\\fs22\\fsp9}じ");
    assert_eq!((ass.events[0].start_ms, ass.events[0].end_ms), (1_000, 3_500));
}

#[test]
fn test_positioned_cue_with_class_style() {
    let metrics = FixedAdvanceMetrics::default();
    let (ass, _) = Converter::new(settings(), &metrics).convert_str(SAMPLE).unwrap();

    // line:10%,start puts the text top 72px from the top edge; align:left
    // with position:10% starts it at x = 128
    assert_eq!(
        ass.events[3].text,
        "{\\an7\\pos(128,72)\\fs40}{\\b1\\bord3\\3c&H0000FF&}{\\fsp0}Top{\\b0\\bord2\\3c&H000000&}{\\fsp0} line"
    );
}

#[test]
fn test_recovered_size_and_ruby_under() {
    let metrics = FixedAdvanceMetrics::default();
    let (ass, report) = Converter::new(settings(), &metrics).convert_str(SAMPLE).unwrap();

    assert!(report.recovered[0].message.contains("200%"));
    // x (22px) is spread over ab (80px) with 29px per gap and hangs
    // below the base line
    assert_eq!(ass.events[4].text, "{\\an2\\pos(640,700)\\fs40}{\\fsp0}ab");
    assert_eq!(ass.events[5].text, "{\\an7\\pos(629,700)\\fs22\\fsp29}x");
}

#[test]
fn test_conversion_is_deterministic() {
    let metrics = FixedAdvanceMetrics::default();
    let first = Converter::new(settings(), &metrics).convert_str(SAMPLE).unwrap();
    let parallel = Converter::new(
        ConvertSettings {
            jobs: 3,
            ..settings()
        },
        &metrics,
    )
    .convert_str(SAMPLE)
    .unwrap();
    assert_eq!(first.0.to_string(), parallel.0.to_string());
    assert_eq!(first.1, parallel.1);
}

#[test]
fn test_debug_boxes_on_lower_layer() {
    let metrics = FixedAdvanceMetrics::default();
    let (ass, _) = Converter::new(
        ConvertSettings {
            debug_boxes: true,
            ..settings()
        },
        &metrics,
    )
    .convert_str(SAMPLE)
    .unwrap();

    let out = ass.to_string();
    assert!(out.contains("Dialogue: 0,"));
    assert!(out.contains("\\p1}m 0 0 l"));
}

#[test]
fn test_missing_header_is_run_error() {
    let metrics = FixedAdvanceMetrics::default();
    let err = Converter::new(settings(), &metrics)
        .convert_str("00:00:01.000 --> 00:00:02.000\nhi\n")
        .unwrap_err();
    assert!(matches!(err, CoreError::ParseError(_)));
}

// -----------------------------------------------------------------------------
// SRT Tests
// -----------------------------------------------------------------------------

#[test]
fn test_sample_to_srt() {
    let doc = parse_vtt(SAMPLE).unwrap();
    let srt = export_srt(&doc.cues, &doc.styles);

    assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:03,500\n漢(かん)字(じ)です\n\n2\n"));
    assert!(srt.contains("{\\an1}<b>Top</b> line"));
    assert!(srt.ends_with('\n'));
}
