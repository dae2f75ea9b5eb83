//! Conversion Driver
//!
//! Runs every cue of a document through sanitization, positioning, ruby
//! layout and rendering. Problems confined to one cue never abort the
//! run: invalid settings fall back to defaults and cues that cannot be
//! laid out are skipped, both with a [`Diagnostic`].
//!
//! With more than one job, cues are split into contiguous chunks laid out
//! on scoped threads; results are reassembled in input order, so the
//! output matches a sequential run byte for byte.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ass::{AssDocument, AssEvent, AssStyle, CueRenderer, DEFAULT_OUTLINE};
use crate::captions::{parse_vtt, Cue, VttDocument};
use crate::layout::{CuePositioner, RubyLayoutEngine, StyleAttributes, StyleStack};
use crate::settings::ConvertSettings;
use crate::text::{FontStore, TextMetrics};
use crate::{CoreError, CoreResult, Diagnostic, DiagnosticKind};

// =============================================================================
// Report
// =============================================================================

/// Outcome of a conversion run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReport {
    /// Cues that produced output
    pub converted: usize,
    /// Cues left out of the output
    pub skipped: Vec<Diagnostic>,
    /// Fields replaced by their defaults
    pub recovered: Vec<Diagnostic>,
}

impl ConversionReport {
    /// True when every cue converted without a diagnostic
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.recovered.is_empty()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::Recovered => self.recovered.push(diagnostic),
            DiagnosticKind::Skipped => self.skipped.push(diagnostic),
        }
    }

    /// Diagnostics of both kinds ordered by cue
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self.recovered.iter().chain(&self.skipped).collect();
        all.sort_by_key(|d| d.cue_index);
        all
    }
}

/// Result of converting a single cue
struct CueOutcome {
    recovered: Vec<Diagnostic>,
    events: CoreResult<Vec<AssEvent>>,
}

// =============================================================================
// Converter
// =============================================================================

/// Converts parsed WebVTT documents to ASS
pub struct Converter<'a> {
    settings: ConvertSettings,
    metrics: &'a dyn TextMetrics,
    font: String,
    style: AssStyle,
}

impl<'a> Converter<'a> {
    pub fn new(settings: ConvertSettings, metrics: &'a dyn TextMetrics) -> Self {
        let font = settings
            .font_path
            .as_deref()
            .map(FontStore::key_for)
            .unwrap_or_default();
        let style = AssStyle {
            font_name: metrics
                .family_name(&font)
                .unwrap_or_else(|| "sans-serif".to_string()),
            font_size: settings.resolved_font_size(),
            spacing: settings.letter_spacing,
            outline: settings.border_size.unwrap_or(DEFAULT_OUTLINE),
            ..AssStyle::default()
        };

        Self {
            settings,
            metrics,
            font,
            style,
        }
    }

    pub fn settings(&self) -> &ConvertSettings {
        &self.settings
    }

    /// Style every event refers to
    pub fn style(&self) -> &AssStyle {
        &self.style
    }

    /// Parses WebVTT content and converts it
    pub fn convert_str(&self, content: &str) -> CoreResult<(AssDocument, ConversionReport)> {
        let doc = parse_vtt(content)?;
        self.convert_ass(&doc)
    }

    /// Converts every cue of `doc`.
    ///
    /// Fails only on run-level problems (unusable settings); cue-level
    /// problems end up in the report.
    pub fn convert_ass(&self, doc: &VttDocument) -> CoreResult<(AssDocument, ConversionReport)> {
        self.settings.validate()?;

        let mut report = ConversionReport::default();
        for diagnostic in &doc.diagnostics {
            report.push(diagnostic.clone());
        }

        let engine = RubyLayoutEngine::new(self.metrics, &self.font, &doc.styles)
            .with_ruby_scale(self.settings.ruby_scale)
            .with_limits(self.settings.limits);
        let renderer = CueRenderer::new(&self.style, self.settings.video)
            .with_debug_boxes(self.settings.debug_boxes);

        let outcomes = self.convert_cues(&doc.cues, &engine, &renderer);

        let mut ass = AssDocument::new(self.settings.video, self.style.clone());
        for ((index, cue), outcome) in doc.cues.iter().enumerate().zip(outcomes) {
            report.recovered.extend(outcome.recovered);
            match outcome.events {
                Ok(events) => {
                    report.converted += 1;
                    ass.push_events(events);
                }
                Err(e) if e.is_cue_local() => {
                    let diagnostic = Diagnostic::skipped(index, &cue.id, e.to_string());
                    warn!("{}", diagnostic);
                    report.skipped.push(diagnostic);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Converted {} of {} cue(s): {} skipped, {} recovered field(s), {} event(s)",
            report.converted,
            doc.cues.len(),
            report.skipped.len(),
            report.recovered.len(),
            ass.events.len()
        );
        Ok((ass, report))
    }

    fn convert_cues(
        &self,
        cues: &[Cue],
        engine: &RubyLayoutEngine<'_>,
        renderer: &CueRenderer<'_>,
    ) -> Vec<CueOutcome> {
        let jobs = self.settings.effective_jobs().min(cues.len()).max(1);
        if jobs == 1 {
            return cues
                .iter()
                .enumerate()
                .map(|(index, cue)| self.convert_cue(index, cue, engine, renderer))
                .collect();
        }

        let chunk_size = cues.len().div_ceil(jobs);
        debug!("Laying out {} cues on {} threads", cues.len(), jobs);

        std::thread::scope(|scope| {
            let handles: Vec<_> = cues
                .chunks(chunk_size)
                .enumerate()
                .map(|(chunk_index, chunk)| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(i, cue)| {
                                self.convert_cue(chunk_index * chunk_size + i, cue, engine, renderer)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    }

    fn convert_cue(
        &self,
        index: usize,
        cue: &Cue,
        engine: &RubyLayoutEngine<'_>,
        renderer: &CueRenderer<'_>,
    ) -> CueOutcome {
        let (settings, errors) = cue.settings.sanitized();
        let recovered: Vec<Diagnostic> = errors
            .iter()
            .map(|e| {
                let diagnostic = Diagnostic::recovered(index, &cue.id, e.to_string());
                warn!("{}", diagnostic);
                diagnostic
            })
            .collect();

        let cue = if errors.is_empty() {
            Cow::Borrowed(cue)
        } else {
            Cow::Owned(Cue {
                settings,
                ..cue.clone()
            })
        };

        let events = self.layout_and_render(&cue, engine, renderer);
        CueOutcome { recovered, events }
    }

    fn layout_and_render(
        &self,
        cue: &Cue,
        engine: &RubyLayoutEngine<'_>,
        renderer: &CueRenderer<'_>,
    ) -> CoreResult<Vec<AssEvent>> {
        let cue_box = CuePositioner::apply(&cue.settings, &self.settings.video)?;
        if !cue_box.fits_within(&self.settings.video) {
            return Err(CoreError::ValidationError(format!(
                "cue box {:?} lies outside the video frame",
                cue_box
            )));
        }

        let stack = StyleStack::new(self.base_style(), self.settings.limits.max_style_depth);
        let layout = engine.layout(&cue.text, stack, self.settings.resolved_font_size())?;
        Ok(renderer.render(cue, &cue_box, &layout))
    }

    fn base_style(&self) -> StyleAttributes {
        StyleAttributes {
            letter_spacing: Some(self.settings.letter_spacing),
            ..StyleAttributes::default()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
