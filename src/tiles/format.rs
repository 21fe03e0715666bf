//! Layer-blob wire format constants.

/// Keyword prefix of the first header line (format version).
pub const VERSION_KEYWORD: &str = "VERSION ";

/// Keyword prefix of the tile-width header line.
pub const TILE_WIDTH_KEYWORD: &str = "TILEWIDTH ";

/// Keyword prefix of the tile-height header line.
pub const TILE_HEIGHT_KEYWORD: &str = "TILEHEIGHT ";

/// Keyword prefix of the bytes-per-pixel header line.
pub const PIXEL_SIZE_KEYWORD: &str = "PIXELSIZE ";

/// Keyword prefix of the tile-count header line.
pub const TILE_COUNT_KEYWORD: &str = "DATA ";

/// Header lines are terminated by a bare line feed.
pub const LINE_FEED: u8 = 0x0A;

/// Compression tag: payload is raw, uncompressed pixel data.
/// Defined by the format but not observed in real files.
pub const COMPRESSION_RAW: u8 = 0;

/// Compression tag: payload is LZF-compressed.
pub const COMPRESSION_LZF: u8 = 1;

/// Tile dimension observed in every known Krita file.
pub const DEFAULT_TILE_DIM: u32 = 64;

/// Upper bound accepted for a tile's decompressed size. Real files top out
/// at 64x64 tiles with 16 bytes per pixel (64 KiB); a header multiplying
/// out near this bound is corrupt or hostile.
pub const MAX_TILE_BYTES: usize = 1 << 24;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_carry_separator() {
        // The trailing space is part of the prefix stripped from each line.
        for kw in [
            VERSION_KEYWORD,
            TILE_WIDTH_KEYWORD,
            TILE_HEIGHT_KEYWORD,
            PIXEL_SIZE_KEYWORD,
            TILE_COUNT_KEYWORD,
        ] {
            assert!(kw.ends_with(' '));
        }
    }
}
