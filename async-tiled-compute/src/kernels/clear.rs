use crate::executor::TaskPool;
use crate::launcher::{launch_tiles, LaunchError, TileLaunch};
use async_tiled_core::{Dims2u, Framebuffer, Rgba, Tile, TileSpec};

/// Fill every pixel of a tile with one colour.
pub fn clear_tile(spec: &TileSpec, tile: &mut Tile, colour: Rgba) {
    for y in 0..spec.h {
        tile.row_mut(spec, y).fill(colour);
    }
}

/// Tiled clear of a shared framebuffer: one fill task per tile.
pub fn clear_async_tiled(
    pool: &TaskPool,
    colour: Rgba,
    grid_dims: Dims2u,
    spec: TileSpec,
    framebuffer: &Framebuffer,
) -> Result<TileLaunch, LaunchError> {
    launch_tiles(pool, spec, grid_dims, framebuffer, move |spec, tile| {
        clear_tile(spec, tile, colour)
    })
}
