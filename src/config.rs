//! # Configuration
//!
//! Optional TOML settings. Every field has a default, so an empty file (or
//! no file) is a valid configuration:
//!
//! ```toml
//! output_dir = "out"
//!
//! [export]
//! scale = 2.0
//! page_format = "A4"
//! orientation = "portrait"
//! image_encoding = "png"          # or { jpeg = { quality = 85 } }
//! last_page = "pad"               # or "stretch"
//! author = "Acme Ltd"
//!
//! [company]                       # replaces the sample sender details
//! name = "Acme Ltd"
//! email = "sales@acme.test"
//! logo = "assets/logo.png"
//!
//! [style]
//! background_color = "#ffffff"
//! accent_color = "#2563eb"
//! font_family = "Roboto"
//! font_size = "Large"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::{Editor, PartyField};
use crate::error::{ConfigError, EditError};
use crate::export::ExportOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory exported PDFs are saved into.
    pub output_dir: PathBuf,
    pub export: ExportOptions,
    pub company: Option<CompanyConfig>,
    pub style: StyleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            export: ExportOptions::default(),
            company: None,
            style: StyleConfig::default(),
        }
    }
}

/// Sender details. Unset fields keep the sample values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyConfig {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Image file uploaded as the logo.
    pub logo: Option<PathBuf>,
}

/// Initial style choices, as a form would deliver them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub background_color: Option<String>,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply the company and style sections to a fresh editor. Relative
    /// logo paths resolve against `base_dir`.
    pub fn apply_to(&self, editor: &mut Editor, base_dir: &Path) -> Result<(), EditError> {
        if let Some(company) = &self.company {
            let fields = [
                (PartyField::Name, &company.name),
                (PartyField::Address, &company.address),
                (PartyField::Phone, &company.phone),
                (PartyField::Email, &company.email),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    editor.set_company(field, value.as_str());
                }
            }
            if let Some(logo) = &company.logo {
                editor.upload_logo(&base_dir.join(logo))?;
            }
        }

        let style = &self.style;
        if let Some(color) = &style.background_color {
            editor.set_background_color(color.as_str());
        }
        if let Some(color) = &style.accent_color {
            editor.set_accent_color(color.as_str());
        }
        if let Some(family) = &style.font_family {
            editor.set_font_family(family.parse()?);
        }
        if let Some(size) = &style.font_size {
            editor.set_font_size(size.parse()?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::LastPageFit;
    use crate::image_loader::ImageEncoding;
    use crate::model::{FontFamily, FontSize, Quotation, StyleOptions};
    use crate::pagination::PageFormat;
    use chrono::NaiveDate;

    fn editor() -> Editor {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        Editor::new(Quotation::sample(today), StyleOptions::default())
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.export.scale, 2.0);
        assert_eq!(config.export.page_format, PageFormat::A4);
        assert_eq!(config.export.last_page, LastPageFit::Pad);
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r##"
            output_dir = "out"

            [export]
            image_encoding = { jpeg = { quality = 85 } }
            last_page = "stretch"
            author = "Acme Ltd"

            [company]
            name = "Acme Ltd"

            [style]
            accent_color = "#000000"
            font_family = "Lato"
            "##,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.export.image_encoding, ImageEncoding::Jpeg { quality: 85 });
        assert_eq!(config.export.author.as_deref(), Some("Acme Ltd"));
        assert_eq!(config.company.unwrap().name.as_deref(), Some("Acme Ltd"));
        assert_eq!(config.style.font_family.as_deref(), Some("Lato"));
    }

    #[test]
    fn test_apply_to_editor() {
        let config = Config {
            company: Some(CompanyConfig {
                name: Some("Acme Ltd".to_string()),
                ..CompanyConfig::default()
            }),
            style: StyleConfig {
                background_color: Some("#000000".to_string()),
                font_family: Some("Merriweather".to_string()),
                font_size: Some("Large".to_string()),
                ..StyleConfig::default()
            },
            ..Config::default()
        };
        let mut e = editor();
        config.apply_to(&mut e, Path::new(".")).unwrap();
        assert_eq!(e.quotation().company.name, "Acme Ltd");
        assert_eq!(e.quotation().company.email, "contact@yourcompany.com");
        assert_eq!(e.style().background_color, "#000000");
        assert_eq!(e.style().font_family, FontFamily::Merriweather);
        assert_eq!(e.style().font_size, FontSize::Large);
    }

    #[test]
    fn test_unknown_font_is_rejected() {
        let config = Config {
            style: StyleConfig {
                font_family: Some("Papyrus".to_string()),
                ..StyleConfig::default()
            },
            ..Config::default()
        };
        let err = config.apply_to(&mut editor(), Path::new(".")).unwrap_err();
        assert!(matches!(err, EditError::UnknownFontFamily(_)));
    }

    #[test]
    fn test_load_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(&missing),
            Err(ConfigError::Io { path, .. }) if path == missing
        ));

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "output_dir = [").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }
}
