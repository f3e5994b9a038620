use crate::framebuffer::Framebuffer;
use crate::pixel::{Rgba, TileFormat};
use crate::points::{Dims2u, Point2u};
use serde::{Deserialize, Serialize};

/// Shared description of a related group of tiles (all the tiles of one
/// framebuffer): pixel format, tile extent and the distance in bytes
/// between scanlines in the backing buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    pub format: TileFormat,
    /// Width of a tile in pixels.
    pub w: u16,
    /// Height of a tile in pixels.
    pub h: u16,
    /// Distance in bytes between scanlines of a tile in the framebuffer.
    pub stride: usize,
}

impl TileSpec {
    pub fn new(format: TileFormat, w: u16, h: u16, stride: usize) -> Self {
        assert!(w > 0 && h > 0, "tile extent must be non-zero");
        assert!(
            stride >= w as usize * Rgba::BYTES,
            "stride shorter than a tile row"
        );
        Self { format, w, h, stride }
    }
}

/// Size in pixels of a framebuffer that uses every tile of a grid.
pub fn pixel_dims(spec: &TileSpec, grid_dims: Dims2u) -> Dims2u {
    Dims2u::new(spec.w as u32 * grid_dims.w, spec.h as u32 * grid_dims.h)
}

/// Where a tile's pixels live.
pub enum TileBacking {
    /// View into a framebuffer shared by the whole tile grid. The offset
    /// addresses the tile's upper-left pixel.
    Shared {
        framebuffer: Framebuffer,
        offset: usize,
    },
    /// Per-tile allocation with tightly packed rows, for tiles whose
    /// lifetime differs from any framebuffer's.
    Owned { pixels: Box<[u8]> },
}

/// A rectangular unit of parallel work: grid coordinates plus a bounded
/// view of its pixels.
///
/// Tiles built from distinct grid cells of one `from_grid` tiling alias
/// disjoint byte ranges of the shared framebuffer (provided the spec's
/// stride covers a full grid row), which is what makes handing each tile
/// to its own compute task sound.
pub struct Tile {
    /// Logical x position of the tile in the grid.
    pub x: u16,
    /// Logical y position of the tile in the grid.
    pub y: u16,
    backing: TileBacking,
}

impl Tile {
    /// View of grid cell (x, y) inside a shared framebuffer.
    pub fn from_grid(framebuffer: &Framebuffer, spec: &TileSpec, x: u16, y: u16) -> Self {
        let offset =
            y as usize * spec.h as usize * spec.stride + x as usize * spec.w as usize * Rgba::BYTES;
        Self {
            x,
            y,
            backing: TileBacking::Shared {
                framebuffer: framebuffer.clone(),
                offset,
            },
        }
    }

    /// Tile owning its own zeroed pixels.
    pub fn owned(spec: &TileSpec, x: u16, y: u16) -> Self {
        let len = spec.w as usize * spec.h as usize * Rgba::BYTES;
        Self {
            x,
            y,
            backing: TileBacking::Owned {
                pixels: vec![0u8; len].into_boxed_slice(),
            },
        }
    }

    /// Position of the tile's upper-left pixel in the framebuffer.
    pub fn pixel_position(&self, spec: &TileSpec) -> Point2u {
        Point2u::new(spec.w as u32 * self.x as u32, spec.h as u32 * self.y as u32)
    }

    /// Byte offset of the tile's upper-left pixel within a shared
    /// backing, if any.
    pub fn shared_offset(&self) -> Option<usize> {
        match &self.backing {
            TileBacking::Shared { offset, .. } => Some(*offset),
            TileBacking::Owned { .. } => None,
        }
    }

    fn row_len(spec: &TileSpec) -> usize {
        spec.w as usize * Rgba::BYTES
    }

    /// Scanline `y` of the tile, read-only.
    pub fn row(&self, spec: &TileSpec, y: u16) -> &[Rgba] {
        debug_assert!(y < spec.h, "row outside tile");
        let len = Self::row_len(spec);
        let bytes = match &self.backing {
            TileBacking::Shared {
                framebuffer,
                offset,
            } => {
                let start = offset + y as usize * spec.stride;
                &framebuffer.bytes()[start..start + len]
            }
            TileBacking::Owned { pixels } => {
                let start = y as usize * len;
                &pixels[start..start + len]
            }
        };
        bytemuck::cast_slice(bytes)
    }

    /// Scanline `y` of the tile, writable.
    pub fn row_mut(&mut self, spec: &TileSpec, y: u16) -> &mut [Rgba] {
        debug_assert!(y < spec.h, "row outside tile");
        let len = Self::row_len(spec);
        let bytes = match &mut self.backing {
            TileBacking::Shared {
                framebuffer,
                offset,
            } => {
                let start = *offset + y as usize * spec.stride;
                // Safety: rows of one tile are disjoint from every other
                // tile of the same tiling; &mut self keeps this tile's
                // own rows exclusive.
                unsafe { framebuffer.byte_range_mut(start, len) }
            }
            TileBacking::Owned { pixels } => {
                let start = y as usize * len;
                &mut pixels[start..start + len]
            }
        };
        bytemuck::cast_slice_mut(bytes)
    }

    /// Extract the tile's pixels into a buffer with contiguous scanlines.
    pub fn copy_pixels(&self, spec: &TileSpec) -> Vec<Rgba> {
        let mut out = Vec::with_capacity(spec.w as usize * spec.h as usize);
        for y in 0..spec.h {
            out.extend_from_slice(self.row(spec, y));
        }
        out
    }

    /// As `copy_pixels`, emitting scanlines bottom-up for upload to a
    /// texture whose row order is the reverse of image order.
    pub fn copy_pixels_flipped(&self, spec: &TileSpec) -> Vec<Rgba> {
        let mut out = Vec::with_capacity(spec.w as usize * spec.h as usize);
        for y in (0..spec.h).rev() {
            out.extend_from_slice(self.row(spec, y));
        }
        out
    }

    /// Take ownership of the pixels of an owned tile. Returns `None` for
    /// a shared view, whose pixels belong to the framebuffer.
    pub fn take_pixels(self) -> Option<Box<[u8]>> {
        match self.backing {
            TileBacking::Owned { pixels } => Some(pixels),
            TileBacking::Shared { .. } => None,
        }
    }
}
