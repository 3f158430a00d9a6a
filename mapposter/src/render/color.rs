//! Hex color parsing for theme slots and overrides.

use thiserror::Error;
use tiny_skia::Color;

/// Color parse failure; surfaced as a configuration error by callers.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid hex color '{0}'")]
pub struct ColorParseError(pub String);

/// Parses `#RRGGBB` or `#RGB` into an opaque color.
pub fn parse_hex(input: &str) -> Result<Color, ColorParseError> {
    let hex = input.trim().strip_prefix('#').unwrap_or(input.trim());
    let (r, g, b) = match hex.len() {
        6 => (
            byte_at(hex, 0).ok_or_else(|| ColorParseError(input.to_string()))?,
            byte_at(hex, 2).ok_or_else(|| ColorParseError(input.to_string()))?,
            byte_at(hex, 4).ok_or_else(|| ColorParseError(input.to_string()))?,
        ),
        3 => {
            let nibble = |i| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .ok()
                    .map(|n| n * 17)
            };
            (
                nibble(0).ok_or_else(|| ColorParseError(input.to_string()))?,
                nibble(1).ok_or_else(|| ColorParseError(input.to_string()))?,
                nibble(2).ok_or_else(|| ColorParseError(input.to_string()))?,
            )
        }
        _ => return Err(ColorParseError(input.to_string())),
    };
    Ok(Color::from_rgba8(r, g, b, 255))
}

/// Parses a hex color and applies an opacity in [0, 1].
pub fn parse_hex_with_alpha(input: &str, alpha: f32) -> Result<Color, ColorParseError> {
    let mut color = parse_hex(input)?;
    color.apply_opacity(alpha.clamp(0.0, 1.0));
    Ok(color)
}

fn byte_at(hex: &str, index: usize) -> Option<u8> {
    u8::from_str_radix(hex.get(index..index + 2)?, 16).ok()
}
