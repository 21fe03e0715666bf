//! Color space identification for KRA documents and layers.
//!
//! The manifest names a color space per document and, optionally, per layer.
//! Only the token matters to this crate: it determines bytes per channel and
//! whether the historical red/blue slot swap applies to decoded tiles.
//! Unknown tokens map to [`ColorSpace::Other`] and pass through undecoded,
//! matching how the format has grown new spaces over time.

use std::fmt;

/// Color space of a document or layer, parsed from a manifest token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// 8-bit integer RGBA, 4 bytes per pixel
    #[default]
    Rgba,
    /// 16-bit integer RGBA, 8 bytes per pixel
    Rgba16,
    /// 16-bit float RGBA, 8 bytes per pixel
    RgbaF16,
    /// 32-bit float RGBA, 16 bytes per pixel
    RgbaF32,
    /// 8-bit CMYK
    Cmyk,
    /// Anything else: opaque passthrough, no channel handling, not exportable
    Other,
}

impl ColorSpace {
    /// Match a manifest `colorspacename` token. Unknown tokens are `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "RGBA" => Self::Rgba,
            "RGBA16" => Self::Rgba16,
            "RGBAF16" => Self::RgbaF16,
            "RGBAF32" => Self::RgbaF32,
            "CMYK" => Self::Cmyk,
            _ => Self::Other,
        }
    }

    /// Human-readable name matching the manifest tokens.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgba => "RGBA",
            Self::Rgba16 => "RGBA16",
            Self::RgbaF16 => "RGBAF16",
            Self::RgbaF32 => "RGBAF32",
            Self::Cmyk => "CMYK",
            Self::Other => "not supported",
        }
    }

    /// Bytes per channel, or `None` when the layout is unknown.
    pub fn bytes_per_channel(&self) -> Option<usize> {
        match self {
            Self::Rgba | Self::Cmyk => Some(1),
            Self::Rgba16 | Self::RgbaF16 => Some(2),
            Self::RgbaF32 => Some(4),
            Self::Other => None,
        }
    }

    /// Whether decoded tiles carry the red and blue planes swapped.
    ///
    /// A historical quirk of the integer RGBA spaces that must be preserved
    /// exactly; float and CMYK tiles use the stored plane order as-is.
    pub fn swaps_red_blue(&self) -> bool {
        matches!(self, Self::Rgba | Self::Rgba16)
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for cs in [
            ColorSpace::Rgba,
            ColorSpace::Rgba16,
            ColorSpace::RgbaF16,
            ColorSpace::RgbaF32,
            ColorSpace::Cmyk,
        ] {
            assert_eq!(ColorSpace::from_name(cs.name()), cs);
        }
    }

    #[test]
    fn test_unknown_token_is_other() {
        assert_eq!(ColorSpace::from_name("LABA"), ColorSpace::Other);
        assert_eq!(ColorSpace::from_name(""), ColorSpace::Other);
        assert_eq!(ColorSpace::Other.bytes_per_channel(), None);
    }

    #[test]
    fn test_swap_only_integer_rgba() {
        assert!(ColorSpace::Rgba.swaps_red_blue());
        assert!(ColorSpace::Rgba16.swaps_red_blue());
        assert!(!ColorSpace::RgbaF16.swaps_red_blue());
        assert!(!ColorSpace::RgbaF32.swaps_red_blue());
        assert!(!ColorSpace::Cmyk.swaps_red_blue());
        assert!(!ColorSpace::Other.swaps_red_blue());
    }
}
