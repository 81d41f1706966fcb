//! # Colors
//!
//! Color arguments accepted by `color()`: `[r, g, b]`, `[r, g, b, a]`,
//! CSS names (case-insensitive) and hex strings `#rgb`, `#rgba`,
//! `#rrggbb`, `#rrggbbaa`.

/// CSS color names with their 8-bit RGB components.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("lightgray", [211, 211, 211]),
    ("lightgrey", [211, 211, 211]),
    ("darkgray", [169, 169, 169]),
    ("darkgrey", [169, 169, 169]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("navy", [0, 0, 128]),
    ("purple", [128, 0, 128]),
    ("teal", [0, 128, 128]),
    ("orange", [255, 165, 0]),
    ("gold", [255, 215, 0]),
    ("pink", [255, 192, 203]),
    ("brown", [165, 42, 42]),
    ("tan", [210, 180, 140]),
    ("violet", [238, 130, 238]),
    ("indigo", [75, 0, 130]),
    ("coral", [255, 127, 80]),
    ("salmon", [250, 128, 114]),
    ("khaki", [240, 230, 140]),
    ("crimson", [220, 20, 60]),
    ("turquoise", [64, 224, 208]),
    ("skyblue", [135, 206, 235]),
    ("steelblue", [70, 130, 180]),
    ("darkgreen", [0, 100, 0]),
    ("forestgreen", [34, 139, 34]),
    ("lightblue", [173, 216, 230]),
    ("lightgreen", [144, 238, 144]),
    ("darkblue", [0, 0, 139]),
    ("darkred", [139, 0, 0]),
    ("beige", [245, 245, 220]),
    ("ivory", [255, 255, 240]),
    ("chocolate", [210, 105, 30]),
    ("sienna", [160, 82, 45]),
    ("slategray", [112, 128, 144]),
    ("slategrey", [112, 128, 144]),
];

/// Parse a color name or hex string into RGBA in `[0, 1]`.
///
/// Returns `None` for unknown names and malformed hex strings.
pub(super) fn parse_color_string(text: &str) -> Option<[f32; 4]> {
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = text.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, [r, g, b])| [channel(*r), channel(*g), channel(*b), 1.0])
}

fn channel(value: u8) -> f32 {
    f32::from(value) / 255.0
}

fn parse_hex(hex: &str) -> Option<[f32; 4]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digits: Vec<u8> = hex
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    let components: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        _ => return None,
    };
    let alpha = components.get(3).copied().map_or(1.0, channel);
    Some([
        channel(components[0]),
        channel(components[1]),
        channel(components[2]),
        alpha,
    ])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_named_colors_ignore_case() {
        assert_eq!(parse_color_string("Red"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_color_string("BLUE"), Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(parse_color_string("notacolor"), None);
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color_string("#f00"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_color_string("#00ff00"), Some([0.0, 1.0, 0.0, 1.0]));
        let rgba = parse_color_string("#0000ff80").unwrap();
        assert_relative_eq!(rgba[3], 128.0 / 255.0);
        assert_eq!(parse_color_string("#12345"), None);
        assert_eq!(parse_color_string("#ggg"), None);
    }
}
