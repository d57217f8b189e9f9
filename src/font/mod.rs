//! # Font Metrics
//!
//! Advance widths for measuring preview text.
//!
//! A [`FontContext`] built from the rasterizer's font database measures each
//! family with the face resvg will draw it with: the named family when it is
//! installed, the generic serif or sans-serif face otherwise. Families with
//! no face fall back to the standard Times and Helvetica width tables.

pub mod metrics;

use std::collections::HashMap;

use tracing::debug;
use usvg::fontdb;

use crate::model::FontFamily;
pub use metrics::StandardFontMetrics;

/// Advance widths parsed from a TrueType/OpenType face via ttf-parser.
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl FaceMetrics {
    /// Advance width of a character in ems.
    pub fn char_width(&self, ch: char) -> f32 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        w as f32 / self.units_per_em as f32
    }

    /// Parse metrics from face `index` of a font file.
    pub fn from_font_data(data: &[u8], index: u32) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, index).ok()?;
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return None;
        }

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;
        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(FaceMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }
}

/// Measures text per family and weight.
#[derive(Debug, Clone, Default)]
pub struct FontContext {
    faces: HashMap<(FontFamily, bool), FaceMetrics>,
}

impl FontContext {
    /// A context with no faces: every family uses the standard tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every family, regular and bold, against `db` the way the
    /// preview's CSS font stacks resolve.
    pub fn from_database(db: &fontdb::Database) -> Self {
        let mut faces = HashMap::new();
        for family in FontFamily::ALL {
            let generic = if family.is_serif() {
                fontdb::Family::Serif
            } else {
                fontdb::Family::SansSerif
            };
            let families = [fontdb::Family::Name(family.name()), generic];

            for bold in [false, true] {
                let query = fontdb::Query {
                    families: &families,
                    weight: if bold {
                        fontdb::Weight::BOLD
                    } else {
                        fontdb::Weight::NORMAL
                    },
                    stretch: fontdb::Stretch::Normal,
                    style: fontdb::Style::Normal,
                };
                let metrics = db
                    .query(&query)
                    .and_then(|id| db.with_face_data(id, FaceMetrics::from_font_data))
                    .flatten();
                match metrics {
                    Some(metrics) => {
                        faces.insert((family, bold), metrics);
                    }
                    None => debug!(%family, bold, "no face found; using standard widths"),
                }
            }
        }
        Self { faces }
    }

    /// Whether `family` is measured with a real face.
    pub fn has_face(&self, family: FontFamily, bold: bool) -> bool {
        self.faces.contains_key(&(family, bold))
    }

    /// Advance width of a single character in px at `size`.
    pub fn char_width(&self, ch: char, family: FontFamily, bold: bool, size: f32) -> f32 {
        let ems = match self.faces.get(&(family, bold)) {
            Some(face) => face.char_width(ch),
            None => standard_metrics(family, bold).char_width(ch),
        };
        ems * size
    }

    /// Width of `text` in px, with `letter_spacing` px after every character.
    pub fn measure_string(
        &self,
        text: &str,
        family: FontFamily,
        bold: bool,
        size: f32,
        letter_spacing: f32,
    ) -> f32 {
        text.chars()
            .map(|ch| self.char_width(ch, family, bold, size) + letter_spacing)
            .sum()
    }
}

fn standard_metrics(family: FontFamily, bold: bool) -> &'static StandardFontMetrics {
    match (family.is_serif(), bold) {
        (true, false) => &metrics::TIMES_ROMAN,
        (true, true) => &metrics::TIMES_BOLD,
        (false, false) => &metrics::HELVETICA,
        (false, true) => &metrics::HELVETICA_BOLD,
    }
}
