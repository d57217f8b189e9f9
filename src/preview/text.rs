//! Text measurement and line wrapping for the preview.
//!
//! Widths come from per-glyph advances in the [`FontContext`]. Lines break
//! at UAX #14 opportunities, so spaces, hyphens and CJK ideographs all
//! offer breaks.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::FontContext;
use crate::model::FontFamily;

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.45;

/// Text settings that affect measurement.
#[derive(Debug, Clone, Copy)]
pub struct Metrics<'a> {
    fonts: &'a FontContext,
    pub family: FontFamily,
    pub size: f32,
    pub bold: bool,
    /// Extra space after every character, in ems.
    pub tracking: f32,
}

impl<'a> Metrics<'a> {
    pub fn new(fonts: &'a FontContext, family: FontFamily, size: f32) -> Self {
        Self {
            fonts,
            family,
            size,
            bold: false,
            tracking: 0.0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn tracking(mut self, ems: f32) -> Self {
        self.tracking = ems;
        self
    }

    pub fn measure(&self, text: &str) -> f32 {
        self.fonts
            .measure_string(text, self.family, self.bold, self.size, self.tracking * self.size)
    }

    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT
    }

    /// Distance from the top of a line box to the baseline.
    pub fn baseline_offset(&self) -> f32 {
        (self.line_height() - self.size) / 2.0 + self.size * 0.8
    }

    /// Wrap `text` into lines no wider than `width`.
    pub fn wrap(&self, text: &str, width: f32) -> Vec<String> {
        break_lines(text, width, |s| self.measure(s))
    }
}

/// Wrap with pre-wrap semantics: newlines always break, runs of spaces
/// inside a line are kept, lines break at the last opportunity that fits,
/// and a run with no opportunity wider than a whole line is broken between
/// characters.
pub fn break_lines(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        break_paragraph(paragraph, max_width, &measure, &mut lines);
    }
    lines
}

fn break_paragraph(
    paragraph: &str,
    max_width: f32,
    measure: &impl Fn(&str) -> f32,
    lines: &mut Vec<String>,
) {
    let mut start = 0;
    // Furthest opportunity reached from `start` whose line still fits.
    let mut fitted: Option<usize> = None;
    let mut breaks = linebreaks(paragraph).peekable();

    while let Some(&(end, opportunity)) = breaks.peek() {
        if fits(paragraph[start..end].trim_end(), max_width, measure) {
            breaks.next();
            if opportunity == BreakOpportunity::Mandatory && end < paragraph.len() {
                lines.push(paragraph[start..end].trim_end().to_string());
                start = end;
                fitted = None;
            } else {
                fitted = Some(end);
            }
            continue;
        }

        match fitted.take() {
            Some(at) => {
                lines.push(paragraph[start..at].trim_end().to_string());
                start = at;
            }
            None => start = split_overlong(paragraph, start, end, max_width, measure, lines),
        }
    }

    lines.push(paragraph[start..].trim_end().to_string());
}

/// A single character always fits; it cannot be broken further.
fn fits(line: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> bool {
    line.chars().nth(1).is_none() || measure(line) <= max_width
}

/// Emit character-broken lines from `paragraph[start..end]` until the rest
/// fits. Returns where the rest begins. Every line takes at least one
/// character.
fn split_overlong(
    paragraph: &str,
    mut start: usize,
    end: usize,
    max_width: f32,
    measure: &impl Fn(&str) -> f32,
    lines: &mut Vec<String>,
) -> usize {
    while !fits(paragraph[start..end].trim_end(), max_width, measure) {
        let mut cut = start;
        for (offset, ch) in paragraph[start..end].char_indices() {
            let next = start + offset + ch.len_utf8();
            if cut > start && measure(&paragraph[start..next]) > max_width {
                break;
            }
            cut = next;
        }
        lines.push(paragraph[start..cut].to_string());
        start = cut;
    }
    start
}
