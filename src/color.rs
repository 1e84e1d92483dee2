//! Hex color strings for the settings file.
//!
//! Supports both 6-digit (RRGGBB) and 8-digit (AARRGGBB) formats; the
//! 6-digit form gets full opacity. A leading '#' is accepted but optional.

use egui::Color32;

pub fn parse_hex_color(text: &str) -> Option<Color32> {
    let hex = text.trim().trim_start_matches('#');
    match hex.len() {
        6 => {
            let value = u32::from_str_radix(hex, 16).ok()?;
            Some(Color32::from_rgb(
                (value >> 16) as u8,
                (value >> 8) as u8,
                value as u8,
            ))
        }
        8 => {
            let value = u32::from_str_radix(hex, 16).ok()?;
            Some(Color32::from_rgba_unmultiplied(
                (value >> 16) as u8,
                (value >> 8) as u8,
                value as u8,
                (value >> 24) as u8,
            ))
        }
        _ => None,
    }
}

/// Opaque colors only; the overlay never persists alpha.
pub fn to_hex_string(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_six_digit() {
        assert_eq!(parse_hex_color("#ff0000"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_hex_color("00ff7f"), Some(Color32::from_rgb(0, 255, 127)));
    }

    #[test]
    fn test_parse_eight_digit_keeps_alpha() {
        let color = parse_hex_color("#80FF0000").unwrap();
        assert_eq!(color, Color32::from_rgba_unmultiplied(255, 0, 0, 128));
    }

    #[test]
    fn test_invalid_input_is_none() {
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#ff00"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn test_round_trip() {
        let color = Color32::from_rgb(18, 52, 86);
        assert_eq!(parse_hex_color(&to_hex_string(color)), Some(color));
    }
}
