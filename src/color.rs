//! # Color and Contrast
//!
//! Hex color parsing and the YIQ rule that picks dark or light text for a
//! given background. Malformed colors never error: the contrast rule falls
//! back to dark text and renderers fall back to a neutral color.

use std::fmt;

/// An opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived brightness, 0..=255.
    pub fn yiq(&self) -> f64 {
        (self.r as f64 * 299.0 + self.g as f64 * 587.0 + self.b as f64 * 114.0) / 1000.0
    }

    /// Parse a hex color, falling back to `fallback` when malformed.
    pub fn from_hex_or(hex: &str, fallback: Rgb) -> Rgb {
        parse_hex_color(hex).unwrap_or(fallback)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse `#rrggbb`, `rrggbb`, or `#rgb`. Anything else is `None`.
pub fn parse_hex_color(input: &str) -> Option<Rgb> {
    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Rgb { r, g, b })
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb { r, g, b })
        }
        _ => None,
    }
}

/// Which text variant reads well on a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTone {
    Dark,
    Light,
}

impl TextTone {
    /// Main text color for this tone.
    pub fn color(&self) -> Rgb {
        match self {
            TextTone::Dark => Rgb::new(0x11, 0x18, 0x27),
            TextTone::Light => Rgb::WHITE,
        }
    }

    /// Secondary color for labels and the "QUOTATION" title.
    pub fn heading_color(&self) -> Rgb {
        match self {
            TextTone::Dark => Rgb::new(0x37, 0x41, 0x51),
            TextTone::Light => Rgb::WHITE,
        }
    }
}

/// YIQ contrast rule: dark text when Y >= 128, light text otherwise, dark
/// text for anything that does not parse as a hex color.
pub fn text_color_for_background(hex: &str) -> TextTone {
    match parse_hex_color(hex) {
        Some(rgb) if rgb.yiq() >= 128.0 => TextTone::Dark,
        Some(_) => TextTone::Light,
        None => {
            tracing::warn!(color = hex, "unparsable background color; using dark text");
            TextTone::Dark
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_gets_dark_text() {
        assert_eq!(text_color_for_background("#FFFFFF"), TextTone::Dark);
    }

    #[test]
    fn test_black_gets_light_text() {
        assert_eq!(text_color_for_background("#000000"), TextTone::Light);
    }

    #[test]
    fn test_malformed_falls_back_to_dark() {
        assert_eq!(text_color_for_background("notacolor"), TextTone::Dark);
        assert_eq!(text_color_for_background(""), TextTone::Dark);
        assert_eq!(text_color_for_background("#12"), TextTone::Dark);
        assert_eq!(text_color_for_background("#gggggg"), TextTone::Dark);
    }

    #[test]
    fn test_threshold() {
        // 128 exactly on every channel sits on the dark-text side.
        assert_eq!(text_color_for_background("#808080"), TextTone::Dark);
        assert_eq!(text_color_for_background("#7f7f7f"), TextTone::Light);
        assert_eq!(text_color_for_background("#111111"), TextTone::Light);
        // Default accent blue.
        assert_eq!(text_color_for_background("#2563eb"), TextTone::Light);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(parse_hex_color("#fff"), Some(Rgb::WHITE));
        assert_eq!(parse_hex_color("2563EB"), Some(Rgb::new(0x25, 0x63, 0xeb)));
        assert_eq!(parse_hex_color("#2563eb80"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(Rgb::new(0x25, 0x63, 0xeb).to_string(), "#2563eb");
        assert_eq!(Rgb::from_hex_or("junk", Rgb::BLACK), Rgb::BLACK);
    }
}
