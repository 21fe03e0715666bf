//! Sparse-tile to contiguous-raster assembly.

use super::reader::Tile;

/// Tile-aligned bounding box covering every tile present in a layer.
///
/// `right` and `bottom` are exclusive. An empty tile set yields the
/// degenerate `0,0,0,0` box, which callers must check before dividing by
/// tile dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Extent {
    /// Minimal bounding box of `tiles`. Width and height come out as exact
    /// multiples of the tile dimensions because tile coordinates are
    /// grid-aligned.
    pub fn of_tiles(tiles: &[Tile], tile_width: u32, tile_height: u32) -> Self {
        let mut iter = tiles.iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        let mut extent = Self {
            left: first.left,
            top: first.top,
            right: first.left + tile_width as i32,
            bottom: first.top + tile_height as i32,
        };
        for tile in iter {
            extent.left = extent.left.min(tile.left);
            extent.right = extent.right.max(tile.left + tile_width as i32);
            extent.top = extent.top.min(tile.top);
            extent.bottom = extent.bottom.max(tile.top + tile_height as i32);
        }
        extent
    }

    #[inline]
    pub fn width(&self) -> u32 {
        (self.right - self.left) as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        (self.bottom - self.top) as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right == self.left || self.bottom == self.top
    }
}

/// Assemble decoded tiles into one zero-initialized interleaved raster of
/// `extent.width() * extent.height() * pixel_size` bytes.
///
/// Tiles are copied row by row at their offsets relative to the extent
/// origin; positions with no tile stay zero (fully transparent). An empty
/// tile set returns an empty buffer outright; there is no "reference tile".
pub fn compose(
    tiles: &[Tile],
    tile_width: u32,
    tile_height: u32,
    pixel_size: u32,
    extent: Extent,
) -> Vec<u8> {
    if tiles.is_empty() || extent.is_empty() {
        return Vec::new();
    }

    let tw = tile_width as usize;
    let th = tile_height as usize;
    let ps = pixel_size as usize;
    let columns = extent.width() as usize / tw;
    let rows = extent.height() as usize / th;
    let row_stride = columns * tw * ps;
    let tile_row = tw * ps;

    let mut out = vec![0u8; columns * rows * tw * th * ps];
    for tile in tiles {
        let rel_left = (tile.left - extent.left) as usize;
        let rel_top = (tile.top - extent.top) as usize;
        for row in 0..th {
            let dst = (rel_top + row) * row_stride + rel_left * ps;
            let src = row * tile_row;
            out[dst..dst + tile_row].copy_from_slice(&tile.data[src..src + tile_row]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(left: i32, top: i32, fill: u8, tw: usize, th: usize, ps: usize) -> Tile {
        Tile {
            left,
            top,
            compressed_length: 0,
            data: vec![fill; tw * th * ps],
        }
    }

    #[test]
    fn test_empty_tile_set() {
        let extent = Extent::of_tiles(&[], 64, 64);
        assert_eq!(extent, Extent::default());
        assert!(extent.is_empty());
        assert!(compose(&[], 64, 64, 4, extent).is_empty());
    }

    #[test]
    fn test_negative_coordinates() {
        let tiles = [tile(-64, 0, 1, 64, 64, 4)];
        let extent = Extent::of_tiles(&tiles, 64, 64);
        assert_eq!(
            (extent.left, extent.top, extent.right, extent.bottom),
            (-64, 0, 0, 64)
        );
        assert_eq!(extent.width(), 64);
        assert_eq!(extent.height(), 64);

        let out = compose(&tiles, 64, 64, 4, extent);
        assert_eq!(out.len(), 64 * 64 * 4);
        assert!(out.iter().all(|&b| b == 1));
    }

    #[test]
    fn test_all_tiles_left_of_origin() {
        let tiles = [tile(-128, -64, 1, 64, 64, 1), tile(-64, -64, 2, 64, 64, 1)];
        let extent = Extent::of_tiles(&tiles, 64, 64);
        assert_eq!(
            (extent.left, extent.top, extent.right, extent.bottom),
            (-128, -64, 0, 0)
        );
    }

    #[test]
    fn test_exact_tiling_sources_every_byte() {
        // 2x2 grid of 4x4 single-channel tiles, each with a distinct fill.
        let tw = 4;
        let th = 4;
        let tiles = [
            tile(0, 0, 1, tw, th, 1),
            tile(4, 0, 2, tw, th, 1),
            tile(0, 4, 3, tw, th, 1),
            tile(4, 4, 4, tw, th, 1),
        ];
        let extent = Extent::of_tiles(&tiles, tw as u32, th as u32);
        let out = compose(&tiles, tw as u32, th as u32, 1, extent);
        assert_eq!(out.len(), 8 * 8);

        // No byte is left at its zero-initialized value and each quadrant
        // holds exactly its tile's fill.
        assert!(out.iter().all(|&b| b != 0));
        for y in 0..8 {
            for x in 0..8 {
                let expected = match (x < 4, y < 4) {
                    (true, true) => 1,
                    (false, true) => 2,
                    (true, false) => 3,
                    (false, false) => 4,
                };
                assert_eq!(out[y * 8 + x], expected, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_gap_stays_transparent() {
        // Two tiles on a diagonal: the other two grid cells stay zero.
        let tiles = [tile(0, 0, 9, 4, 4, 1), tile(4, 4, 9, 4, 4, 1)];
        let extent = Extent::of_tiles(&tiles, 4, 4);
        let out = compose(&tiles, 4, 4, 1, extent);
        assert_eq!(out.len(), 64);
        assert_eq!(out[0], 9); // top-left quadrant populated
        assert_eq!(out[7], 0); // top-right quadrant absent
        assert_eq!(out[8 * 4], 0); // bottom-left quadrant absent
        assert_eq!(out[8 * 7 + 7], 9); // bottom-right quadrant populated
    }
}
