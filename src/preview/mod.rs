//! # Preview Renderer
//!
//! Maps the quotation and its style options to a [`Scene`]: a flat list of
//! positioned rectangles, rules, text runs, and images over a background.
//! The scene has the fixed width of an A4 page at 96 CSS px per inch and
//! grows downward to fit its content; it is never shorter than one page.
//! Nothing here knows about pages beyond that minimum height. Pagination
//! happens later, from the rasterized pixel height.
//!
//! The same inputs always produce the same scene.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ COMPANY NAME                      [logo] │  header
//! │ address / phone | email                  │
//! ├══════════════════════════════════════════┤  accent rule
//! │ QUOTATION FOR:              QUOTATION    │
//! │ client block            # / date / valid │
//! │ ▓▓ DESCRIPTION ▓▓ QTY ▓▓ PRICE ▓▓ TOTAL ▓ │  accent band
//! │ rows ...                                 │
//! │                          Subtotal / Tax  │
//! │                          TOTAL           │
//! │ NOTES / TERMS & CONDITIONS               │
//! │ notes ...                                │
//! │            footer (anchored to bottom)   │
//! └──────────────────────────────────────────┘
//! ```

pub mod svg;
pub mod text;

use crate::color::{text_color_for_background, Rgb, TextTone};
use crate::currency::format_currency;
use crate::font::FontContext;
use crate::image_loader;
use crate::model::{FontFamily, Quotation, StyleOptions};
use crate::totals::Totals;
use text::Metrics;

/// A4 width at 96 px/inch (210 mm).
pub const PAGE_WIDTH_PX: f32 = 794.0;
/// One A4 page at [`PAGE_WIDTH_PX`], rounded down so a document that fits
/// one page rasterizes to one page. Minimum scene height.
pub const PAGE_HEIGHT_PX: f32 = 1122.0;
/// Inner padding on every side of the document.
pub const PADDING_PX: f32 = 48.0;
/// Tallest the logo is ever drawn.
pub const LOGO_MAX_HEIGHT_PX: f32 = 96.0;

const COMPANY_NAME_PX: f32 = 36.0;
const TITLE_PX: f32 = 30.0;
const LARGE_PX: f32 = 18.0;
const SMALL_PX: f32 = 12.0;
const CELL_PADDING_PX: f32 = 8.0;
const SEPARATOR: Rgb = Rgb::new(128, 128, 128);
const SEPARATOR_OPACITY: f32 = 0.3;

/// What a text run is, for styling and for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    CompanyName,
    Title,
    Label,
    Body,
    TableHeader,
    Cell,
    TotalsLabel,
    TotalsValue,
    Notes,
    Footer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub role: TextRole,
    pub x: f32,
    /// Baseline position.
    pub y: f32,
    pub content: String,
    pub size: f32,
    pub bold: bool,
    pub color: Rgb,
    pub anchor: Anchor,
    /// Extra space after every character, in ems.
    pub tracking: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Rgb,
    },
    /// A horizontal line `thickness` tall with its top edge at `y`.
    Rule {
        x: f32,
        y: f32,
        width: f32,
        thickness: f32,
        color: Rgb,
        opacity: f32,
    },
    Text(TextRun),
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        href: String,
    },
}

/// The rendered preview: one continuous document.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub font_family: FontFamily,
    /// Tone of body text against the background.
    pub body_tone: TextTone,
    /// Tone of text drawn on the accent band.
    pub accent_tone: TextTone,
    pub elements: Vec<Element>,
}

impl Scene {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(run) => Some(run),
            _ => None,
        })
    }

    pub fn texts_with_role(&self, role: TextRole) -> impl Iterator<Item = &TextRun> {
        self.texts().filter(move |run| run.role == role)
    }

    pub fn images(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Image { .. }))
    }
}

/// Render the preview scene for a quotation, measuring text with `fonts`.
pub fn render_preview(
    fonts: &FontContext,
    quotation: &Quotation,
    totals: &Totals,
    style: &StyleOptions,
) -> Scene {
    let body_tone = text_color_for_background(&style.background_color);
    let accent_tone = text_color_for_background(&style.accent_color);
    let background = Rgb::from_hex_or(&style.background_color, Rgb::WHITE);
    let accent = Rgb::from_hex_or(&style.accent_color, body_tone.color());

    let mut layout = Layout {
        fonts,
        family: style.font_family,
        base: style.font_size.px(),
        body: body_tone.color(),
        heading: body_tone.heading_color(),
        muted: muted_color(body_tone),
        accent,
        accent_text: accent_tone.color(),
        elements: Vec::new(),
    };

    let mut y = PADDING_PX;
    y = layout.header(quotation, y);
    y = layout.sub_header(quotation, y + 32.0);
    y = layout.line_items(quotation, y + 40.0);
    y = layout.totals(quotation, totals, y + 24.0);
    y = layout.notes(quotation, y + 40.0);

    let height = (y + PADDING_PX).max(PAGE_HEIGHT_PX).ceil();
    layout.footer(quotation, height);

    Scene {
        width: PAGE_WIDTH_PX,
        height,
        background,
        font_family: style.font_family,
        body_tone,
        accent_tone,
        elements: layout.elements,
    }
}

fn muted_color(tone: TextTone) -> Rgb {
    match tone {
        TextTone::Dark => Rgb::new(0x6b, 0x72, 0x80),
        TextTone::Light => Rgb::new(0x9c, 0xa3, 0xaf),
    }
}

/// Number display: integral values without a fraction, others as-is.
fn format_number(value: f64) -> String {
    format!("{}", value)
}

struct Layout<'a> {
    fonts: &'a FontContext,
    family: FontFamily,
    base: f32,
    body: Rgb,
    heading: Rgb,
    muted: Rgb,
    accent: Rgb,
    accent_text: Rgb,
    elements: Vec<Element>,
}

impl<'a> Layout<'a> {
    fn content_left(&self) -> f32 {
        PADDING_PX
    }

    fn content_width(&self) -> f32 {
        PAGE_WIDTH_PX - 2.0 * PADDING_PX
    }

    fn content_right(&self) -> f32 {
        PAGE_WIDTH_PX - PADDING_PX
    }

    fn metrics(&self, size: f32) -> Metrics<'a> {
        Metrics::new(self.fonts, self.family, size)
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        role: TextRole,
        metrics: Metrics<'_>,
        x: f32,
        top: f32,
        content: impl Into<String>,
        color: Rgb,
        anchor: Anchor,
    ) {
        self.elements.push(Element::Text(TextRun {
            role,
            x,
            y: top + metrics.baseline_offset(),
            content: content.into(),
            size: metrics.size,
            bold: metrics.bold,
            color,
            anchor,
            tracking: metrics.tracking,
        }));
    }

    /// Wrap and emit a block of text. Returns the y below the block.
    #[allow(clippy::too_many_arguments)]
    fn paragraph(
        &mut self,
        role: TextRole,
        metrics: Metrics<'_>,
        x: f32,
        top: f32,
        width: f32,
        content: &str,
        color: Rgb,
        anchor: Anchor,
    ) -> f32 {
        let mut y = top;
        for line in metrics.wrap(content, width) {
            self.text(role, metrics, x, y, line, color, anchor);
            y += metrics.line_height();
        }
        y
    }

    fn rule(&mut self, y: f32, x: f32, width: f32, thickness: f32, color: Rgb, opacity: f32) {
        self.elements.push(Element::Rule {
            x,
            y,
            width,
            thickness,
            color,
            opacity,
        });
    }

    fn header(&mut self, q: &Quotation, top: f32) -> f32 {
        let left = self.content_left();
        let column = self.content_width() * 2.0 / 3.0;
        let body = self.metrics(self.base);
        let name = self.metrics(COMPANY_NAME_PX).bold().tracking(0.05);

        let mut y = self.paragraph(
            TextRole::CompanyName,
            name,
            left,
            top,
            column,
            &q.company.name.to_uppercase(),
            self.accent,
            Anchor::Start,
        );
        y += 8.0;
        y = self.paragraph(TextRole::Body, body, left, y, column, &q.company.address, self.body, Anchor::Start);
        let contact = format!("{} | {}", q.company.phone, q.company.email);
        y = self.paragraph(TextRole::Body, body, left, y, column, &contact, self.body, Anchor::Start);

        let logo_bottom = match q.company.logo.as_deref() {
            Some(href) => self.logo(href, top),
            None => top,
        };

        let bottom = y.max(logo_bottom) + 32.0;
        self.rule(bottom, left, self.content_width(), 2.0, self.accent, 1.0);
        bottom + 2.0
    }

    /// Right-aligned logo bounded by the max height and a third of the
    /// content width, never upscaled. Returns its bottom edge.
    fn logo(&mut self, href: &str, top: f32) -> f32 {
        let (w, h) = match image_loader::data_url_dimensions(href) {
            Ok((w, h)) if w > 0 && h > 0 => (w as f32, h as f32),
            Ok(_) => return top,
            Err(e) => {
                tracing::warn!(error = %e, "logo could not be read; omitting it from the preview");
                return top;
            }
        };
        let max_width = self.content_width() / 3.0;
        let scale = (LOGO_MAX_HEIGHT_PX / h).min(max_width / w).min(1.0);
        let (width, height) = (w * scale, h * scale);
        self.elements.push(Element::Image {
            x: self.content_right() - width,
            y: top,
            width,
            height,
            href: href.to_string(),
        });
        top + height
    }

    fn sub_header(&mut self, q: &Quotation, top: f32) -> f32 {
        let left = self.content_left();
        let right = self.content_right();
        let half = self.content_width() / 2.0;
        let body = self.metrics(self.base);
        let label = body.bold();

        // Client block.
        self.text(TextRole::Label, label, left, top, "QUOTATION FOR:", self.muted, Anchor::Start);
        let mut y = top + label.line_height() + 4.0;
        let client_name = self.metrics(LARGE_PX).bold();
        y = self.paragraph(TextRole::Body, client_name, left, y, half, &q.client.name, self.body, Anchor::Start);
        y = self.paragraph(TextRole::Body, body, left, y, half, &q.client.address, self.body, Anchor::Start);
        let contact = format!("{} | {}", q.client.phone, q.client.email);
        let left_bottom = self.paragraph(TextRole::Body, body, left, y, half, &contact, self.body, Anchor::Start);

        // Title and details table.
        let title = self.metrics(TITLE_PX).bold();
        self.text(TextRole::Title, title, right, top, "QUOTATION", self.heading, Anchor::End);
        let mut y = top + title.line_height() + 8.0;

        let rows = [
            ("Quotation #:", q.quotation_number.as_str()),
            ("Date:", q.date.as_str()),
            ("Valid Until:", q.valid_until.as_str()),
        ];
        let value_width = rows
            .iter()
            .map(|(_, value)| body.measure(value))
            .fold(0.0f32, f32::max);
        let label_right = right - value_width - 16.0;
        for (name, value) in rows {
            self.text(TextRole::Label, label, label_right, y, name, self.body, Anchor::End);
            self.text(TextRole::Body, body, right, y, value, self.body, Anchor::End);
            y += body.line_height();
        }

        left_bottom.max(y)
    }

    fn line_items(&mut self, q: &Quotation, top: f32) -> f32 {
        let left = self.content_left();
        let width = self.content_width();
        let desc_width = width / 2.0;
        let col = width / 6.0;
        let qty_center = left + desc_width + col / 2.0;
        let price_right = left + desc_width + 2.0 * col - CELL_PADDING_PX;
        let total_right = left + width - CELL_PADDING_PX;

        let header = self.metrics(self.base).bold().tracking(0.05);
        let band_height = header.line_height() + 2.0 * CELL_PADDING_PX;
        self.elements.push(Element::Rect {
            x: left,
            y: top,
            width,
            height: band_height,
            fill: self.accent,
        });
        let text_top = top + CELL_PADDING_PX;
        let color = self.accent_text;
        self.text(TextRole::TableHeader, header, left + CELL_PADDING_PX, text_top, "DESCRIPTION", color, Anchor::Start);
        self.text(TextRole::TableHeader, header, qty_center, text_top, "QTY", color, Anchor::Middle);
        self.text(TextRole::TableHeader, header, price_right, text_top, "UNIT PRICE", color, Anchor::End);
        self.text(TextRole::TableHeader, header, total_right, text_top, "TOTAL", color, Anchor::End);

        let cell = self.metrics(self.base);
        let mut y = top + band_height;
        for item in &q.line_items {
            let row_top = y + CELL_PADDING_PX;
            let desc_bottom = self.paragraph(
                TextRole::Cell,
                cell,
                left + CELL_PADDING_PX,
                row_top,
                desc_width - 2.0 * CELL_PADDING_PX,
                &item.description,
                self.body,
                Anchor::Start,
            );
            self.text(TextRole::Cell, cell, qty_center, row_top, format_number(item.quantity), self.body, Anchor::Middle);
            self.text(TextRole::Cell, cell, price_right, row_top, format_currency(item.unit_price), self.body, Anchor::End);
            self.text(TextRole::Cell, cell, total_right, row_top, format_currency(item.line_total()), self.body, Anchor::End);

            y = desc_bottom + CELL_PADDING_PX;
            self.rule(y, left, width, 1.0, SEPARATOR, SEPARATOR_OPACITY);
            y += 1.0;
        }
        y
    }

    fn totals(&mut self, q: &Quotation, totals: &Totals, top: f32) -> f32 {
        let right = self.content_right();
        let block_width = self.content_width() / 3.0;
        let left = right - block_width;
        let value_right = right;
        let label = self.metrics(self.base).bold();
        let value = self.metrics(self.base);

        let mut y = top + 4.0;
        let tax_label = format!("Tax ({}%):", format_number(q.tax_rate));
        for (name, amount) in [("Subtotal:", totals.subtotal), (tax_label.as_str(), totals.tax_amount)] {
            self.text(TextRole::TotalsLabel, label, left, y, name, self.body, Anchor::Start);
            self.text(TextRole::TotalsValue, value, value_right, y, format_currency(amount), self.body, Anchor::End);
            y += label.line_height() + 8.0;
        }

        y -= 4.0;
        self.rule(y, left, block_width, 2.0, self.accent, 1.0);
        let grand = self.metrics(LARGE_PX).bold();
        y += 2.0 + 8.0;
        self.text(TextRole::TotalsLabel, grand, left, y, "TOTAL:", self.body, Anchor::Start);
        self.text(TextRole::TotalsValue, grand, value_right, y, format_currency(totals.total), self.body, Anchor::End);
        y + grand.line_height() + 8.0
    }

    fn notes(&mut self, q: &Quotation, top: f32) -> f32 {
        let left = self.content_left();
        let label = self.metrics(self.base).bold();
        self.text(TextRole::Label, label, left, top, "NOTES / TERMS & CONDITIONS", self.muted, Anchor::Start);
        let y = top + label.line_height() + 8.0;
        let notes = self.metrics(SMALL_PX);
        let bottom = self.paragraph(TextRole::Notes, notes, left, y, self.content_width(), &q.notes, self.body, Anchor::Start);
        bottom + 96.0
    }

    /// Anchored to the bottom of the document regardless of content.
    fn footer(&mut self, q: &Quotation, doc_height: f32) {
        let left = self.content_left();
        let width = self.content_width();
        let center = left + width / 2.0;
        let small = self.metrics(SMALL_PX);
        let contact = format!(
            "If you have any questions concerning this quotation, contact {} at {}.",
            q.company.name, q.company.phone
        );
        let contact_lines = small.wrap(&contact, width);
        let height = 1.0 + 16.0 + contact_lines.len() as f32 * small.line_height() + 8.0 + small.line_height();
        let top = doc_height - PADDING_PX - height;

        self.rule(top, left, width, 1.0, SEPARATOR, SEPARATOR_OPACITY);
        let mut y = top + 1.0 + 16.0;
        for line in contact_lines {
            self.text(TextRole::Footer, small, center, y, line, self.muted, Anchor::Middle);
            y += small.line_height();
        }
        y += 8.0;
        self.text(TextRole::Footer, small.bold(), center, y, "Thank you for your business!", self.muted, Anchor::Middle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineItem;
    use crate::totals::compute_totals;
    use chrono::NaiveDate;

    fn sample() -> Quotation {
        Quotation::sample(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap())
    }

    fn render(q: &Quotation, style: &StyleOptions) -> Scene {
        render_preview(&FontContext::new(), q, &compute_totals(&q.line_items, q.tax_rate), style)
    }

    fn tiny_png_url(width: u32, height: u32) -> String {
        use image::ImageEncoder;
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
        let mut buf = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buf)
            .write_image(img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        image_loader::to_data_url(&buf).unwrap()
    }

    #[test]
    fn test_fixed_width_min_height() {
        let scene = render(&sample(), &StyleOptions::default());
        assert_eq!(scene.width, PAGE_WIDTH_PX);
        assert_eq!(scene.height, PAGE_HEIGHT_PX);
    }

    #[test]
    fn test_deterministic() {
        let q = sample();
        let style = StyleOptions::default();
        assert_eq!(render(&q, &style), render(&q, &style));
    }

    #[test]
    fn test_many_items_grow_height() {
        let mut q = sample();
        for i in 0..80 {
            q.line_items.push(LineItem {
                id: format!("x{}", i),
                description: format!("Item {}", i),
                quantity: 1.0,
                unit_price: 10.0,
            });
        }
        let scene = render(&q, &StyleOptions::default());
        assert!(scene.height > PAGE_HEIGHT_PX * 2.0);
    }

    #[test]
    fn test_dark_background_uses_light_body_text() {
        let q = sample();
        let mut style = StyleOptions::default();
        style.background_color = "#111111".to_string();
        let scene = render(&q, &style);
        assert_eq!(scene.body_tone, TextTone::Light);
        assert!(scene
            .texts_with_role(TextRole::Body)
            .all(|run| run.color == TextTone::Light.color()));

        style.background_color = "#ffffff".to_string();
        let scene = render(&q, &style);
        assert_eq!(scene.body_tone, TextTone::Dark);
        assert!(scene
            .texts_with_role(TextRole::Body)
            .all(|run| run.color == TextTone::Dark.color()));
    }

    #[test]
    fn test_accent_band_contrast_is_independent() {
        let q = sample();
        let mut style = StyleOptions::default();
        style.accent_color = "#fde047".to_string();
        let scene = render(&q, &style);
        assert_eq!(scene.body_tone, TextTone::Dark);
        assert_eq!(scene.accent_tone, TextTone::Dark);

        style.accent_color = "#1e3a8a".to_string();
        let scene = render(&q, &style);
        assert!(scene
            .texts_with_role(TextRole::TableHeader)
            .all(|run| run.color == Rgb::WHITE));
    }

    #[test]
    fn test_malformed_colors_do_not_panic() {
        let q = sample();
        let style = StyleOptions {
            background_color: "notacolor".to_string(),
            accent_color: "#zz".to_string(),
            ..StyleOptions::default()
        };
        let scene = render(&q, &style);
        assert_eq!(scene.background, Rgb::WHITE);
        assert_eq!(scene.body_tone, TextTone::Dark);
    }

    #[test]
    fn test_no_logo_no_image_slot() {
        let scene = render(&sample(), &StyleOptions::default());
        assert_eq!(scene.images().count(), 0);
    }

    #[test]
    fn test_logo_right_aligned_and_bounded() {
        let mut q = sample();
        q.company.logo = Some(tiny_png_url(400, 200));
        let scene = render(&q, &StyleOptions::default());
        let images: Vec<&Element> = scene.images().collect();
        assert_eq!(images.len(), 1);
        match images[0] {
            Element::Image { x, width, height, .. } => {
                assert!(*height <= LOGO_MAX_HEIGHT_PX + 1e-3);
                assert!((x + width - (PAGE_WIDTH_PX - PADDING_PX)).abs() < 1e-3);
                assert!((width / height - 2.0).abs() < 1e-3);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_small_logo_not_upscaled() {
        let mut q = sample();
        q.company.logo = Some(tiny_png_url(20, 10));
        let scene = render(&q, &StyleOptions::default());
        match scene.images().next() {
            Some(Element::Image { width, height, .. }) => {
                assert_eq!((*width, *height), (20.0, 10.0));
            }
            _ => panic!("expected a logo image"),
        };
    }

    #[test]
    fn test_unreadable_logo_is_omitted() {
        let mut q = sample();
        q.company.logo = Some("data:image/png;base64,not-base64!".to_string());
        let scene = render(&q, &StyleOptions::default());
        assert_eq!(scene.images().count(), 0);
    }

    #[test]
    fn test_totals_and_rows_are_formatted() {
        let scene = render(&sample(), &StyleOptions::default());
        let values: Vec<&str> = scene
            .texts_with_role(TextRole::TotalsValue)
            .map(|run| run.content.as_str())
            .collect();
        assert_eq!(values, vec!["₹2,800.00", "₹224.00", "₹3,024.00"]);
        assert!(scene
            .texts_with_role(TextRole::TotalsLabel)
            .any(|run| run.content == "Tax (8%):"));
        assert!(scene
            .texts_with_role(TextRole::Cell)
            .any(|run| run.content == "₹2,500.00"));
    }

    #[test]
    fn test_wide_description_stays_in_its_column() {
        let mut q = sample();
        q.line_items[0].description = format!("{}{}", "WIDE-WORDS ".repeat(12), "W".repeat(40));
        let style = StyleOptions::default();
        let fonts = FontContext::new();
        let scene = render_preview(&fonts, &q, &compute_totals(&q.line_items, q.tax_rate), &style);

        let column = (PAGE_WIDTH_PX - 2.0 * PADDING_PX) / 2.0 - 2.0 * CELL_PADDING_PX;
        let metrics = Metrics::new(&fonts, style.font_family, style.font_size.px());
        let descriptions: Vec<&TextRun> = scene
            .texts_with_role(TextRole::Cell)
            .filter(|run| run.anchor == Anchor::Start)
            .collect();
        assert!(descriptions.len() > q.line_items.len());
        for run in descriptions {
            assert!(metrics.measure(&run.content) <= column + 1e-3, "{:?}", run.content);
        }
    }

    #[test]
    fn test_notes_keep_line_breaks() {
        let scene = render(&sample(), &StyleOptions::default());
        let notes: Vec<&str> = scene
            .texts_with_role(TextRole::Notes)
            .map(|run| run.content.as_str())
            .collect();
        assert_eq!(notes[0], "Thank you for your business.");
        assert_eq!(notes[1], "");
        assert_eq!(notes[2], "Terms & Conditions:");
    }

    #[test]
    fn test_footer_sits_at_bottom() {
        let scene = render(&sample(), &StyleOptions::default());
        let last_footer = scene.texts_with_role(TextRole::Footer).last().unwrap();
        assert_eq!(last_footer.content, "Thank you for your business!");
        assert!(last_footer.y < scene.height - PADDING_PX);
        assert!(last_footer.y > scene.height - PADDING_PX - 40.0);
    }
}
