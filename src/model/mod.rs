//! # Document Model
//!
//! The in-memory quotation: who is quoting, who is being quoted, what is
//! being sold, and how the printed document should look. Pure data; all
//! behavior lives in [`crate::editor`], [`crate::totals`], and
//! [`crate::preview`].
//!
//! Field names serialize in camelCase so a snapshot reads the same as the
//! form that produced it.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// The quoting party. The only party that may carry a logo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Self-contained `data:image/...;base64,...` URL, or `None`.
    #[serde(default)]
    pub logo: Option<String>,
}

/// The party receiving the quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// One billable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Unique within the document, never reused.
    pub id: String,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl LineItem {
    /// A fresh, empty row: quantity 1, unit price 0.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            quantity: 1.0,
            unit_price: 0.0,
        }
    }

    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// The aggregate root: everything printed on the quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub company: Company,
    pub client: Client,
    pub quotation_number: String,
    /// Issue date, `YYYY-MM-DD`.
    pub date: String,
    /// `YYYY-MM-DD`.
    pub valid_until: String,
    /// Display and print order.
    pub line_items: Vec<LineItem>,
    /// Percentage, e.g. `8.0` for 8%.
    pub tax_rate: f64,
    pub notes: String,
}

const SAMPLE_NOTES: &str = "Thank you for your business.

Terms & Conditions:
1. All payments are due within 15 days of the invoice date.
2. A deposit of 50% is required before any work begins.
3. This quotation is valid for a period of 30 days from the date of issue.";

/// How long a fresh quotation stays valid.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

impl Quotation {
    /// The sample document every session starts from, dated `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let valid_until = today + Duration::days(DEFAULT_VALIDITY_DAYS);
        Self {
            company: Company {
                name: "Your Company".to_string(),
                address: "123 Business Rd, Suite 100, City, State 54321".to_string(),
                phone: "(123) 456-7890".to_string(),
                email: "contact@yourcompany.com".to_string(),
                logo: None,
            },
            client: Client {
                name: "Client Name".to_string(),
                address: "456 Client Ave, Apt 2, City, State 12345".to_string(),
                phone: "(987) 654-3210".to_string(),
                email: "client@email.com".to_string(),
            },
            quotation_number: format!("QUO-{}-001", today.year()),
            date: today.format("%Y-%m-%d").to_string(),
            valid_until: valid_until.format("%Y-%m-%d").to_string(),
            line_items: vec![
                LineItem {
                    id: "1".to_string(),
                    description: "Website Design & Development".to_string(),
                    quantity: 1.0,
                    unit_price: 2500.0,
                },
                LineItem {
                    id: "2".to_string(),
                    description: "Hosting (1 Year)".to_string(),
                    quantity: 1.0,
                    unit_price: 300.0,
                },
            ],
            tax_rate: 8.0,
            notes: SAMPLE_NOTES.to_string(),
        }
    }

    /// Name of the exported file.
    pub fn file_name(&self) -> String {
        quotation_file_name(&self.quotation_number)
    }
}

/// `Quotation-<number>.pdf`
pub fn quotation_file_name(quotation_number: &str) -> String {
    format!("Quotation-{}.pdf", quotation_number)
}

/// Visual options for the preview and the exported PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    /// Hex color, e.g. `#ffffff`. Malformed values are tolerated.
    pub background_color: String,
    pub accent_color: String,
    pub font_family: FontFamily,
    pub font_size: FontSize,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            accent_color: "#2563eb".to_string(),
            font_family: FontFamily::Tinos,
            font_size: FontSize::Medium,
        }
    }
}

/// The fixed set of font stacks offered by the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Tinos,
    Roboto,
    Lato,
    Merriweather,
}

impl FontFamily {
    pub const ALL: [FontFamily; 4] = [
        FontFamily::Tinos,
        FontFamily::Roboto,
        FontFamily::Lato,
        FontFamily::Merriweather,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Tinos => "Tinos",
            FontFamily::Roboto => "Roboto",
            FontFamily::Lato => "Lato",
            FontFamily::Merriweather => "Merriweather",
        }
    }

    /// CSS font stack, as written into the preview.
    pub fn css_stack(&self) -> &'static str {
        match self {
            FontFamily::Tinos => "'Tinos', serif",
            FontFamily::Roboto => "'Roboto', sans-serif",
            FontFamily::Lato => "'Lato', sans-serif",
            FontFamily::Merriweather => "'Merriweather', serif",
        }
    }

    pub fn is_serif(&self) -> bool {
        matches!(self, FontFamily::Tinos | FontFamily::Merriweather)
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontFamily {
    type Err = EditError;

    /// Accepts either the family name (`"Roboto"`, any case) or its CSS
    /// stack (`"'Roboto', sans-serif"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FontFamily::ALL
            .into_iter()
            .find(|family| {
                family.name().eq_ignore_ascii_case(trimmed) || family.css_stack() == trimmed
            })
            .ok_or_else(|| EditError::UnknownFontFamily(s.to_string()))
    }
}

/// The fixed size tiers offered by the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub const ALL: [FontSize; 3] = [FontSize::Small, FontSize::Medium, FontSize::Large];

    /// Utility class name of the tier (`text-xs` etc.).
    pub fn tier(&self) -> &'static str {
        match self {
            FontSize::Small => "text-xs",
            FontSize::Medium => "text-sm",
            FontSize::Large => "text-base",
        }
    }

    /// Base body text size in CSS pixels.
    pub fn px(&self) -> f32 {
        match self {
            FontSize::Small => 12.0,
            FontSize::Medium => 14.0,
            FontSize::Large => 16.0,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

impl FromStr for FontSize {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FontSize::ALL
            .into_iter()
            .find(|size| size.tier() == trimmed || size.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| EditError::UnknownFontSize(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn test_sample_dates_and_number() {
        let q = Quotation::sample(today());
        assert_eq!(q.quotation_number, "QUO-2026-001");
        assert_eq!(q.date, "2026-10-15");
        assert_eq!(q.valid_until, "2026-11-14");
        assert_eq!(q.line_items.len(), 2);
        assert!(q.company.logo.is_none());
    }

    #[test]
    fn test_file_name() {
        let q = Quotation::sample(today());
        assert_eq!(q.file_name(), "Quotation-QUO-2026-001.pdf");
    }

    #[test]
    fn test_new_line_item_defaults() {
        let item = LineItem::new("42");
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.unit_price, 0.0);
        assert!(item.description.is_empty());
        assert_eq!(item.line_total(), 0.0);
    }

    #[test]
    fn test_font_family_parses_name_and_stack() {
        assert_eq!("roboto".parse::<FontFamily>().unwrap(), FontFamily::Roboto);
        assert_eq!(
            "'Merriweather', serif".parse::<FontFamily>().unwrap(),
            FontFamily::Merriweather
        );
        assert!(matches!(
            "Comic Sans".parse::<FontFamily>(),
            Err(EditError::UnknownFontFamily(name)) if name == "Comic Sans"
        ));
    }

    #[test]
    fn test_font_size_parses_tier_and_name() {
        assert_eq!("text-xs".parse::<FontSize>().unwrap(), FontSize::Small);
        assert_eq!("Large".parse::<FontSize>().unwrap(), FontSize::Large);
        assert!("huge".parse::<FontSize>().is_err());
    }

    #[test]
    fn test_snapshot_uses_camel_case() {
        let q = Quotation::sample(today());
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"quotationNumber\""));
        assert!(json.contains("\"unitPrice\""));
        assert!(json.contains("\"validUntil\""));
    }
}
