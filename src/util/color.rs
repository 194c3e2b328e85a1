// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! `#RRGGBB` color strings as stored on annotations.

/// Fill used when an annotation has no usable color.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Parse `#RRGGBB` (or the `#RGB` shorthand). Case-insensitive.
pub fn parse_hex(value: &str) -> Option<[u8; 3]> {
    let digits = value.trim().strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match digits.len() {
        6 => {
            let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
            let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
            let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
            Some([r, g, b])
        }
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(digits.chars()) {
                let nibble = c.to_digit(16)? as u8;
                *slot = nibble << 4 | nibble;
            }
            Some(rgb)
        }
        _ => None,
    }
}

/// Parse a fill color, falling back to white for empty or malformed input.
pub fn fill_or_white(value: &str) -> [u8; 3] {
    parse_hex(value).unwrap_or(WHITE)
}

/// Format as lowercase `#rrggbb`, the form color pickers emit.
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_hex("#ff5722"), Some([0xff, 0x57, 0x22]));
        assert_eq!(parse_hex("#FFFFFF"), Some(WHITE));
        assert_eq!(parse_hex("#0f0"), Some([0, 255, 0]));
        assert_eq!(parse_hex("ff5722"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }

    #[test]
    fn test_fill_defaults_to_white() {
        assert_eq!(fill_or_white(""), WHITE);
        assert_eq!(fill_or_white("red"), WHITE);
        assert_eq!(fill_or_white("#000000"), [0, 0, 0]);
    }

    #[test]
    fn test_to_hex_is_lowercase() {
        assert_eq!(to_hex([0xAB, 0x01, 0xFF]), "#ab01ff");
    }
}
