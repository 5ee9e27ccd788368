//! Annotation colors
//!
//! Colors travel in the value as CSS strings. The overlay accepts `#rgb`,
//! `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and `rgba(r, g, b, a)` forms; any
//! string it cannot read falls back to the default for the annotation kind.

use crate::annotation::AnnotationKind;

/// Default color string written into text drafts.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
/// Default color string written into highlight drafts.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "rgba(255, 255, 0, 0.3)";
/// Default color string written into drawing drafts.
pub const DEFAULT_DRAWING_COLOR: &str = "#000000";

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const HIGHLIGHT_YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 77 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS color string. Unsupported or malformed input yields `None`.
    pub fn parse_css(input: &str) -> Option<Color> {
        let input = input.trim();

        if let Some(hex) = input.strip_prefix('#') {
            return Self::parse_hex(hex);
        }

        let body = input
            .strip_prefix("rgba(")
            .or_else(|| input.strip_prefix("rgb("))?
            .strip_suffix(')')?;

        let mut parts = body.split(',').map(str::trim);
        let r = parse_channel(parts.next()?)?;
        let g = parse_channel(parts.next()?)?;
        let b = parse_channel(parts.next()?)?;
        let a = match parts.next() {
            Some(raw) => parse_alpha(raw)?,
            None => 255,
        };

        if parts.next().is_some() {
            return None;
        }

        Some(Self { r, g, b, a })
    }

    /// Color painted when an annotation carries no readable color.
    pub fn fallback(kind: AnnotationKind) -> Color {
        match kind {
            AnnotationKind::Highlight => Color::HIGHLIGHT_YELLOW,
            AnnotationKind::Text | AnnotationKind::Drawing | AnnotationKind::Stamp => Color::BLACK,
        }
    }

    fn parse_hex(hex: &str) -> Option<Color> {
        if !hex.is_ascii() {
            return None;
        }

        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Color::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::new(r, g, b, a))
            }
            _ => None,
        }
    }
}

fn parse_channel(raw: &str) -> Option<u8> {
    let value: f32 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(value.clamp(0.0, 255.0).round() as u8)
}

fn parse_alpha(raw: &str) -> Option<u8> {
    let value: f32 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some((value.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_hex() {
        assert_eq!(Color::parse_css("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::parse_css("#000000"), Some(Color::BLACK));
    }

    #[test]
    fn parses_three_digit_hex() {
        assert_eq!(Color::parse_css("#fa0"), Some(Color::rgb(255, 170, 0)));
    }

    #[test]
    fn parses_default_highlight_string() {
        assert_eq!(Color::parse_css("rgba(255, 255, 0, 0.3)"), Some(Color::HIGHLIGHT_YELLOW));
    }

    #[test]
    fn rgb_form_is_opaque() {
        assert_eq!(Color::parse_css("rgb(10, 20, 30)"), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Color::parse_css(""), None);
        assert_eq!(Color::parse_css("#zzz"), None);
        assert_eq!(Color::parse_css("#12345"), None);
        assert_eq!(Color::parse_css("rgba(1, 2)"), None);
        assert_eq!(Color::parse_css("rgba(1, 2, 3, 4, 5)"), None);
        assert_eq!(Color::parse_css("hsl(10, 50%, 50%)"), None);
        assert_eq!(Color::parse_css("#é1"), None);
    }

    #[test]
    fn out_of_range_channels_are_clamped() {
        assert_eq!(Color::parse_css("rgba(300, -5, 0, 2.0)"), Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn fallback_matches_tool_defaults() {
        assert_eq!(Color::fallback(AnnotationKind::Text), Color::BLACK);
        assert_eq!(Color::fallback(AnnotationKind::Drawing), Color::BLACK);
        assert_eq!(Color::fallback(AnnotationKind::Highlight), Color::HIGHLIGHT_YELLOW);

        let parsed = Color::parse_css(DEFAULT_HIGHLIGHT_COLOR).expect("default parses");
        assert_eq!(parsed, Color::fallback(AnnotationKind::Highlight));
    }
}
