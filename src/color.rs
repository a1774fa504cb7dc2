use palette::Srgb;

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// The fixed categorical palette, cycled by rank.
pub const PALETTE: [Srgb<u8>; 10] = [
    Srgb::new(0x25, 0x63, 0xeb),
    Srgb::new(0x06, 0xb6, 0xd4),
    Srgb::new(0xf9, 0x73, 0x16),
    Srgb::new(0x10, 0xb9, 0x81),
    Srgb::new(0x7c, 0x3a, 0xed),
    Srgb::new(0xef, 0x44, 0x44),
    Srgb::new(0xf5, 0x9e, 0x0b),
    Srgb::new(0x0e, 0xa5, 0xa4),
    Srgb::new(0x8b, 0x5c, 0xf6),
    Srgb::new(0xe1, 0x1d, 0x48),
];

/// Colour for the item at `index` in a ranked list.
pub fn palette_color(index: usize) -> Srgb<u8> {
    PALETTE[index % PALETTE.len()]
}

/// `#rrggbb` form used in chart specs.
pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{color:x}")
}

/// Hex colours for `n` ranked items.
pub fn ranked_colors(n: usize) -> Vec<String> {
    (0..n).map(|i| to_hex(palette_color(i))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_zero_padded() {
        assert_eq!(
            ranked_colors(10),
            vec![
                "#2563eb", "#06b6d4", "#f97316", "#10b981", "#7c3aed", "#ef4444", "#f59e0b", "#0ea5a4",
                "#8b5cf6", "#e11d48",
            ]
        );
    }

    #[test]
    fn hex_parses_back_to_the_palette() {
        for (i, hex) in ranked_colors(10).iter().enumerate() {
            let parsed: Srgb<u8> = hex.parse().unwrap();
            assert_eq!(parsed, PALETTE[i]);
        }
    }

    #[test]
    fn palette_cycles_every_ten() {
        assert_eq!(palette_color(0), palette_color(10));
        assert_eq!(palette_color(3), palette_color(23));
        assert_eq!(ranked_colors(12)[11], to_hex(PALETTE[1]));
    }
}
