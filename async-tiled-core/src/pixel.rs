use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Pixel formats a tile can carry. Only one is in use today; the format
/// travels in `TileSpec` so kernels can dispatch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileFormat {
    Rgba8888,
}

/// A byte-per-component RGBA pixel, the only in-memory pixel format.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Size of one pixel in bytes.
    pub const BYTES: usize = 4;

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque grey: all colour channels equal, alpha 255.
    pub const fn grey(level: u8) -> Self {
        Self::new(level, level, level, 255)
    }
}
