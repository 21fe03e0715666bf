//! Sequential layer-blob parser.
//!
//! Reads the five keyword header lines, then the per-tile records. Tiles are
//! decoded eagerly: tag byte, LZF decompression into a zeroed buffer of the
//! exact decompressed size, then planar-to-interleaved conversion with the
//! red/blue plane swap where the color space calls for it.
//!
//! Failure handling follows the format's blast radius. A bad keyword header
//! makes the whole blob unusable (every later size would be undefined), so
//! it is an error for the caller. A bad tile record or payload desynchronizes
//! the read cursor, so parsing stops there: the already-decoded tiles are
//! kept and a diagnostic records the abandonment.

use tracing::{trace, warn};

use super::compose::{compose, Extent};
use super::format::*;
use super::lzf;
use crate::util::{ColorSpace, Diagnostics, Error, Result};

/// A single decoded tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Left edge in layer space, a multiple of the tile width; may be negative.
    pub left: i32,
    /// Top edge in layer space, a multiple of the tile height; may be negative.
    pub top: i32,
    /// Length of the stored payload, tag byte included.
    pub compressed_length: usize,
    /// Decoded pixel data, `pixel_size * tile_width * tile_height` bytes,
    /// interleaved per pixel (or raw planar for unrecognized color spaces).
    pub data: Vec<u8>,
}

/// Decoded pixel data for one paint layer: format constants plus the sparse
/// tile set. Fully transparent tiles are absent, not stored as zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerData {
    pub version: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    /// Bytes per pixel (4 for 8-bit RGBA/CMYK, 8 for RGBA16, 16 for RGBAF32).
    pub pixel_size: u32,
    pub tiles: Vec<Tile>,
}

impl LayerData {
    /// Tile-aligned bounding box of the present tiles.
    pub fn extent(&self) -> Extent {
        Extent::of_tiles(&self.tiles, self.tile_width, self.tile_height)
    }

    /// Assemble the tiles into one contiguous raster covering [`Self::extent`].
    /// Empty tile set yields an empty buffer.
    pub fn composed(&self) -> Vec<u8> {
        compose(
            &self.tiles,
            self.tile_width,
            self.tile_height,
            self.pixel_size,
            self.extent(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Parse one layer's blob. Keyword-header failures are returned as errors;
/// a mid-stream tile failure keeps the decoded prefix and records into `diags`.
pub fn parse_layer_blob(
    content: &[u8],
    color_space: ColorSpace,
    diags: &mut Diagnostics,
) -> Result<LayerData> {
    let mut cursor = BlobCursor::new(content);

    let version = keyword_value(&mut cursor, VERSION_KEYWORD)?;
    let tile_width = keyword_value(&mut cursor, TILE_WIDTH_KEYWORD)?;
    let tile_height = keyword_value(&mut cursor, TILE_HEIGHT_KEYWORD)?;
    let pixel_size = keyword_value(&mut cursor, PIXEL_SIZE_KEYWORD)?;
    let tile_count = keyword_value(&mut cursor, TILE_COUNT_KEYWORD)?;

    // All three dimensions are untrusted; a zero or a product past any
    // plausible tile size makes every later buffer size undefined.
    let decompressed_length = (pixel_size as usize)
        .checked_mul(tile_width as usize)
        .and_then(|n| n.checked_mul(tile_height as usize))
        .filter(|n| (1..=MAX_TILE_BYTES).contains(n))
        .ok_or(Error::TileGeometry {
            width: tile_width,
            height: tile_height,
            pixel_size,
        })?;
    trace!(
        version,
        tile_width,
        tile_height,
        pixel_size,
        tile_count,
        "layer blob header"
    );

    // Every record needs at least 8 bytes of input, so the remaining blob
    // length bounds the reservation regardless of what DATA claims.
    let reserve = (tile_count as usize).min(cursor.remaining() / 8);
    let mut data = LayerData {
        version,
        tile_width,
        tile_height,
        pixel_size,
        tiles: Vec::with_capacity(reserve),
    };

    for index in 0..tile_count {
        match parse_tile(
            &mut cursor,
            tile_width,
            tile_height,
            pixel_size,
            decompressed_length,
            color_space,
        ) {
            Ok(tile) => data.tiles.push(tile),
            Err(e) => {
                // The cursor position is no longer trustworthy; every later
                // tile offset depends on it, so stop here.
                warn!(tile = index, error = %e, "abandoning remaining tiles");
                diags.error(
                    Some(format!("tile {index}")),
                    format!("{e}; {} of {tile_count} tiles kept", data.tiles.len()),
                );
                break;
            }
        }
    }

    Ok(data)
}

/// Parse one tile record and decode its payload.
fn parse_tile(
    cursor: &mut BlobCursor<'_>,
    tile_width: u32,
    tile_height: u32,
    pixel_size: u32,
    decompressed_length: usize,
    color_space: ColorSpace,
) -> Result<Tile> {
    let line = cursor.line()?;
    let (left, top, compressed_length) = parse_tile_record(line)?;
    // Tile origins are grid-aligned by construction; a misaligned origin
    // would land row copies outside the composed raster.
    if left.rem_euclid(tile_width as i32) != 0 || top.rem_euclid(tile_height as i32) != 0 {
        return Err(Error::MisalignedTile { left, top });
    }
    let payload = cursor.take(compressed_length)?;

    let mut planar = decode_payload(payload, decompressed_length)?;

    let area = (tile_width * tile_height) as usize;
    let ps = pixel_size as usize;
    let data = match color_space.bytes_per_channel() {
        Some(bpc) if bpc > 0 && ps % bpc == 0 => {
            if color_space.swaps_red_blue() {
                swap_red_blue_planes(&mut planar, area, bpc);
            }
            interleave_planar(&planar, area, ps / bpc, bpc)
        }
        // Unknown layout: opaque planar passthrough.
        _ => planar,
    };

    Ok(Tile {
        left,
        top,
        compressed_length,
        data,
    })
}

/// Split a `left,top,METHOD,byteCount` record. The method token is accepted
/// and ignored; only the byte count is structurally load-bearing.
fn parse_tile_record(line: &str) -> Result<(i32, i32, usize)> {
    let syntax = || Error::HeaderSyntax(line.to_string());
    let mut fields = line.split(',');

    let left = fields
        .next()
        .and_then(|f| f.parse::<i32>().ok())
        .ok_or_else(syntax)?;
    let top = fields
        .next()
        .and_then(|f| f.parse::<i32>().ok())
        .ok_or_else(syntax)?;
    let _method = fields.next().ok_or_else(syntax)?;
    let byte_count = fields
        .next()
        .and_then(|f| f.parse::<usize>().ok())
        .ok_or_else(syntax)?;
    if fields.next().is_some() {
        return Err(syntax());
    }

    Ok((left, top, byte_count))
}

/// Consume the compression tag and decompress into a zeroed buffer of the
/// exact decompressed tile size.
fn decode_payload(payload: &[u8], decompressed_length: usize) -> Result<Vec<u8>> {
    let (&tag, body) = payload.split_first().ok_or(Error::TruncatedBlob {
        offset: 0,
        needed: 1,
    })?;
    if tag != COMPRESSION_LZF {
        // Tag 0 (raw) is defined by the format but has never been observed;
        // fail cleanly rather than guess at an unvalidated layout.
        return Err(Error::UnsupportedCompression(tag));
    }
    let mut output = vec![0u8; decompressed_length];
    lzf::decompress(body, &mut output)?;
    Ok(output)
}

/// Swap the first and third channel planes in place. Self-inverse.
///
/// Krita stores the integer RGBA spaces with red and blue exchanged; the
/// quirk is preserved by the format and must be undone on read.
pub fn swap_red_blue_planes(planar: &mut [u8], area: usize, bytes_per_channel: usize) {
    let plane = area * bytes_per_channel;
    if planar.len() < 3 * plane {
        return;
    }
    let (head, tail) = planar.split_at_mut(2 * plane);
    head[..plane].swap_with_slice(&mut tail[..plane]);
}

/// Convert planar channel layout (all of channel 0, then channel 1, ...) to
/// interleaved per-pixel order.
pub fn interleave_planar(
    planar: &[u8],
    area: usize,
    channels: usize,
    bytes_per_channel: usize,
) -> Vec<u8> {
    let pixel_size = channels * bytes_per_channel;
    let mut out = vec![0u8; planar.len()];
    for px in 0..area {
        for ch in 0..channels {
            let src = (ch * area + px) * bytes_per_channel;
            let dst = px * pixel_size + ch * bytes_per_channel;
            out[dst..dst + bytes_per_channel]
                .copy_from_slice(&planar[src..src + bytes_per_channel]);
        }
    }
    out
}

/// Cursor over a layer blob: line scanning plus exact byte consumption.
struct BlobCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BlobCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Scan to the next line feed and return the line without it.
    fn line(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while self.pos < self.buf.len() && self.buf[self.pos] != LINE_FEED {
            self.pos += 1;
        }
        if self.pos == self.buf.len() {
            return Err(Error::TruncatedBlob {
                offset: start,
                needed: 1,
            });
        }
        let line = std::str::from_utf8(&self.buf[start..self.pos])?;
        self.pos += 1; // skip the line feed
        Ok(line)
    }

    /// Consume exactly `len` bytes. `len` is untrusted and may be huge.
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::TruncatedBlob {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Read one keyword header line as an unsigned integer.
fn keyword_value(cursor: &mut BlobCursor<'_>, keyword: &'static str) -> Result<u32> {
    let line = cursor.line()?;
    let value = line
        .strip_prefix(keyword)
        .ok_or(Error::HeaderKeyword { keyword })?;
    value
        .trim_end()
        .parse()
        .map_err(|_| Error::HeaderSyntax(line.to_string()))
}
