//! # Form Editor
//!
//! Field-by-field mutation of the quotation and its style options. The
//! editor owns the document and keeps the derived totals next to it: every
//! mutating method recomputes them before returning, so [`Editor::totals`]
//! always matches the current line items and tax rate.
//!
//! [`FormEvent`] mirrors the inputs of the form one to one. Values arrive as
//! strings, the way a form delivers them; numeric fields are parsed
//! leniently and never fail.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::EditError;
use crate::image_loader;
use crate::model::{FontFamily, FontSize, LineItem, Quotation, StyleOptions};
use crate::totals::{compute_totals, parse_number, Totals};

/// Text fields shared by the company and the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyField {
    Name,
    Address,
    Phone,
    Email,
}

/// Editable columns of a line item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemField {
    Description,
    Quantity,
    UnitPrice,
}

/// One input event from the quotation form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Company { field: PartyField, value: String },
    Client { field: PartyField, value: String },
    QuotationNumber(String),
    Date(String),
    ValidUntil(String),
    TaxRate(String),
    Notes(String),
    AddLineItem,
    RemoveLineItem { id: String },
    LineItem { id: String, field: LineItemField, value: String },
    UploadLogo(PathBuf),
    ClearLogo,
    BackgroundColor(String),
    AccentColor(String),
    FontFamily(String),
    FontSize(String),
}

/// Generates line item ids from the creation time in milliseconds.
///
/// Two items created within the same millisecond, or an id that would
/// collide with one already in the document, get bumped forward. Ids only
/// ever increase, so a removed item's id is never handed out again.
#[derive(Debug, Default)]
pub struct LineItemIds {
    last: i64,
}

impl LineItemIds {
    pub fn next(&mut self, existing: &[LineItem]) -> String {
        self.next_at(Utc::now().timestamp_millis(), existing)
    }

    fn next_at(&mut self, now_ms: i64, existing: &[LineItem]) -> String {
        let mut candidate = now_ms.max(self.last + 1);
        while existing.iter().any(|item| item.id == candidate.to_string()) {
            candidate += 1;
        }
        self.last = candidate;
        candidate.to_string()
    }
}

/// Owns the quotation being edited.
#[derive(Debug)]
pub struct Editor {
    quotation: Quotation,
    style: StyleOptions,
    totals: Totals,
    ids: LineItemIds,
}

impl Editor {
    pub fn new(quotation: Quotation, style: StyleOptions) -> Self {
        let totals = compute_totals(&quotation.line_items, quotation.tax_rate);
        Self {
            quotation,
            style,
            totals,
            ids: LineItemIds::default(),
        }
    }

    /// The sample document dated today, with default styling.
    pub fn with_sample() -> Self {
        Self::new(
            Quotation::sample(Utc::now().date_naive()),
            StyleOptions::default(),
        )
    }

    pub fn quotation(&self) -> &Quotation {
        &self.quotation
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    fn recompute(&mut self) {
        self.totals = compute_totals(&self.quotation.line_items, self.quotation.tax_rate);
    }

    // ── Parties ────────────────────────────────────────────────

    pub fn set_company(&mut self, field: PartyField, value: impl Into<String>) {
        let company = &mut self.quotation.company;
        let slot = match field {
            PartyField::Name => &mut company.name,
            PartyField::Address => &mut company.address,
            PartyField::Phone => &mut company.phone,
            PartyField::Email => &mut company.email,
        };
        *slot = value.into();
    }

    pub fn set_client(&mut self, field: PartyField, value: impl Into<String>) {
        let client = &mut self.quotation.client;
        let slot = match field {
            PartyField::Name => &mut client.name,
            PartyField::Address => &mut client.address,
            PartyField::Phone => &mut client.phone,
            PartyField::Email => &mut client.email,
        };
        *slot = value.into();
    }

    /// Read an image file and store it as the company logo.
    ///
    /// On failure the current logo is left untouched.
    pub fn upload_logo(&mut self, path: &Path) -> Result<(), EditError> {
        let data_url = image_loader::read_logo_file(path)?;
        tracing::debug!(path = %path.display(), bytes = data_url.len(), "logo uploaded");
        self.quotation.company.logo = Some(data_url);
        Ok(())
    }

    pub fn clear_logo(&mut self) {
        self.quotation.company.logo = None;
    }

    // ── Quotation details ──────────────────────────────────────

    pub fn set_quotation_number(&mut self, value: impl Into<String>) {
        self.quotation.quotation_number = value.into();
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.quotation.date = value.into();
    }

    pub fn set_valid_until(&mut self, value: impl Into<String>) {
        self.quotation.valid_until = value.into();
    }

    /// Unparsable input sets the rate to 0.
    pub fn set_tax_rate(&mut self, input: &str) {
        self.quotation.tax_rate = parse_number(input);
        self.recompute();
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        self.quotation.notes = value.into();
    }

    // ── Line items ─────────────────────────────────────────────

    /// Append an empty row and return its id.
    pub fn add_line_item(&mut self) -> String {
        let id = self.ids.next(&self.quotation.line_items);
        self.quotation.line_items.push(LineItem::new(id.clone()));
        self.recompute();
        id
    }

    /// Remove the row with this id. Returns `false` if there was none.
    pub fn remove_line_item(&mut self, id: &str) -> bool {
        let before = self.quotation.line_items.len();
        self.quotation.line_items.retain(|item| item.id != id);
        let removed = self.quotation.line_items.len() != before;
        if removed {
            self.recompute();
        }
        removed
    }

    /// Update one column of a row. Returns `false` if the id is unknown.
    pub fn update_line_item(&mut self, id: &str, field: LineItemField, input: &str) -> bool {
        let Some(item) = self.quotation.line_items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        match field {
            LineItemField::Description => item.description = input.to_string(),
            LineItemField::Quantity => item.quantity = parse_number(input),
            LineItemField::UnitPrice => item.unit_price = parse_number(input),
        }
        self.recompute();
        true
    }

    // ── Appearance ─────────────────────────────────────────────

    pub fn set_background_color(&mut self, value: impl Into<String>) {
        self.style.background_color = value.into();
    }

    pub fn set_accent_color(&mut self, value: impl Into<String>) {
        self.style.accent_color = value.into();
    }

    pub fn set_font_family(&mut self, family: FontFamily) {
        self.style.font_family = family;
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.style.font_size = size;
    }

    /// Apply one form event. Only font choices and logo uploads can fail;
    /// a failed event leaves the state unchanged.
    pub fn apply(&mut self, event: FormEvent) -> Result<(), EditError> {
        match event {
            FormEvent::Company { field, value } => self.set_company(field, value),
            FormEvent::Client { field, value } => self.set_client(field, value),
            FormEvent::QuotationNumber(value) => self.set_quotation_number(value),
            FormEvent::Date(value) => self.set_date(value),
            FormEvent::ValidUntil(value) => self.set_valid_until(value),
            FormEvent::TaxRate(value) => self.set_tax_rate(&value),
            FormEvent::Notes(value) => self.set_notes(value),
            FormEvent::AddLineItem => {
                self.add_line_item();
            }
            FormEvent::RemoveLineItem { id } => {
                if !self.remove_line_item(&id) {
                    tracing::debug!(%id, "remove ignored: no such line item");
                }
            }
            FormEvent::LineItem { id, field, value } => {
                if !self.update_line_item(&id, field, &value) {
                    tracing::debug!(%id, "update ignored: no such line item");
                }
            }
            FormEvent::UploadLogo(path) => self.upload_logo(&path)?,
            FormEvent::ClearLogo => self.clear_logo(),
            FormEvent::BackgroundColor(value) => self.set_background_color(value),
            FormEvent::AccentColor(value) => self.set_accent_color(value),
            FormEvent::FontFamily(value) => self.set_font_family(value.parse()?),
            FormEvent::FontSize(value) => self.set_font_size(value.parse()?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn editor() -> Editor {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        Editor::new(Quotation::sample(today), StyleOptions::default())
    }

    fn assert_totals_current(editor: &Editor) {
        let q = editor.quotation();
        assert_eq!(editor.totals(), compute_totals(&q.line_items, q.tax_rate));
    }

    #[test]
    fn test_initial_totals() {
        let e = editor();
        let t = e.totals();
        assert!((t.subtotal - 2800.0).abs() < 1e-9);
        assert!((t.tax_amount - 224.0).abs() < 1e-9);
        assert!((t.total - 3024.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_line_item_assigns_fresh_id() {
        let mut e = editor();
        let before: Vec<String> = e.quotation().line_items.iter().map(|i| i.id.clone()).collect();
        let id = e.add_line_item();
        assert_eq!(e.quotation().line_items.len(), before.len() + 1);
        assert!(!before.contains(&id));
        let added = e.quotation().line_items.last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.quantity, 1.0);
        assert_eq!(added.unit_price, 0.0);
        assert_totals_current(&e);
    }

    #[test]
    fn test_rapid_adds_never_collide() {
        let mut e = editor();
        let ids: Vec<String> = (0..50).map(|_| e.add_line_item()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_ids_bump_past_collisions() {
        let mut ids = LineItemIds::default();
        let existing = vec![LineItem::new("1000"), LineItem::new("1001")];
        assert_eq!(ids.next_at(1000, &existing), "1002");
        // Clock went backwards: still strictly increasing.
        assert_eq!(ids.next_at(900, &existing), "1003");
    }

    #[test]
    fn test_remove_only_targeted_item() {
        let mut e = editor();
        let id = e.add_line_item();
        assert!(e.remove_line_item("1"));
        let ids: Vec<&str> = e.quotation().line_items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2", id.as_str()]);
        assert_totals_current(&e);
        assert!((e.totals().subtotal - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut e = editor();
        assert!(!e.remove_line_item("nope"));
        assert_eq!(e.quotation().line_items.len(), 2);
    }

    #[test]
    fn test_update_line_item_recomputes() {
        let mut e = editor();
        assert!(e.update_line_item("2", LineItemField::Quantity, "3"));
        assert!((e.totals().subtotal - 3400.0).abs() < 1e-9);
        assert!(e.update_line_item("2", LineItemField::UnitPrice, "garbage"));
        assert_eq!(e.quotation().line_items[1].unit_price, 0.0);
        assert!((e.totals().subtotal - 2500.0).abs() < 1e-9);
        assert_totals_current(&e);
    }

    #[test]
    fn test_description_is_verbatim() {
        let mut e = editor();
        e.update_line_item("1", LineItemField::Description, "  spaced  ");
        assert_eq!(e.quotation().line_items[0].description, "  spaced  ");
    }

    #[test]
    fn test_tax_rate_coerces() {
        let mut e = editor();
        e.set_tax_rate("18");
        assert!((e.totals().tax_amount - 504.0).abs() < 1e-9);
        e.set_tax_rate("");
        assert_eq!(e.quotation().tax_rate, 0.0);
        assert!((e.totals().total - 2800.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_party_and_details() {
        let mut e = editor();
        e.apply(FormEvent::Company {
            field: PartyField::Name,
            value: "Acme".to_string(),
        })
        .unwrap();
        e.apply(FormEvent::Client {
            field: PartyField::Email,
            value: "buyer@example.com".to_string(),
        })
        .unwrap();
        e.apply(FormEvent::QuotationNumber("Q-7".to_string())).unwrap();
        e.apply(FormEvent::Notes("line one\nline two".to_string())).unwrap();
        let q = e.quotation();
        assert_eq!(q.company.name, "Acme");
        assert_eq!(q.client.email, "buyer@example.com");
        assert_eq!(q.quotation_number, "Q-7");
        assert_eq!(q.notes, "line one\nline two");
    }

    #[test]
    fn test_apply_style_events() {
        let mut e = editor();
        e.apply(FormEvent::BackgroundColor("#111111".to_string())).unwrap();
        e.apply(FormEvent::FontFamily("'Lato', sans-serif".to_string())).unwrap();
        e.apply(FormEvent::FontSize("text-base".to_string())).unwrap();
        assert_eq!(e.style().background_color, "#111111");
        assert_eq!(e.style().font_family, FontFamily::Lato);
        assert_eq!(e.style().font_size, FontSize::Large);
    }

    #[test]
    fn test_unknown_font_leaves_state() {
        let mut e = editor();
        let result = e.apply(FormEvent::FontFamily("Papyrus".to_string()));
        assert!(matches!(result, Err(EditError::UnknownFontFamily(_))));
        assert_eq!(e.style().font_family, FontFamily::Tinos);
    }

    #[test]
    fn test_failed_logo_upload_keeps_previous() {
        let mut e = editor();
        e.quotation.company.logo = Some("data:image/png;base64,AAAA".to_string());
        let result = e.apply(FormEvent::UploadLogo(PathBuf::from("/no/such/logo.png")));
        assert!(matches!(result, Err(EditError::Logo(_))));
        assert!(e.quotation().company.logo.is_some());
        e.apply(FormEvent::ClearLogo).unwrap();
        assert!(e.quotation().company.logo.is_none());
    }
}
