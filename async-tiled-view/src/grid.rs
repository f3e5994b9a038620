//! Sprite-grid construction and world-space placement.

use crate::presenter::{GridHandle, Presenter, SpriteHandle};
use async_tiled_core::{Dims2u, Region2D, Rgba};

/// A presenter grid node plus its sprites, one per tile cell, row-major.
/// Cells whose sprite creation failed hold `None` and stay blank.
pub struct SpriteGrid {
    pub handle: GridHandle,
    pub tiles_x: u32,
    pub tiles_y: u32,
    sprites: Vec<Option<SpriteHandle>>,
}

impl SpriteGrid {
    pub fn dims(&self) -> Dims2u {
        Dims2u::new(self.tiles_x, self.tiles_y)
    }

    pub fn tile_count(&self) -> usize {
        self.sprites.len()
    }

    pub fn sprite(&self, x: u16, y: u16) -> Option<SpriteHandle> {
        let (x, y) = (x as u32, y as u32);
        if x >= self.tiles_x || y >= self.tiles_y {
            return None;
        }
        self.sprites[(y * self.tiles_x + x) as usize]
    }

    pub fn sprites(&self) -> impl Iterator<Item = SpriteHandle> + '_ {
        self.sprites.iter().flatten().copied()
    }
}

/// How many tiles cover the visible area: tiles are `tile_dims` physical
/// pixels, so their logical footprint shrinks with the content scale and
/// the grid rounds up to cover the far edges.
pub fn grid_dims_for_view(visible: (f64, f64), content_scale: f64, tile_dims: u16) -> Dims2u {
    let tile_w_logical = tile_dims as f64 / content_scale;
    let tile_h_logical = tile_dims as f64 / content_scale;
    Dims2u::new(
        (visible.0 / tile_w_logical).ceil() as u32,
        (visible.1 / tile_h_logical).ceil() as u32,
    )
}

/// Placeholder colour for cell (x, y): both-odd and both-even cells red,
/// the rest green.
pub fn checkerboard_colour(x: u32, y: u32) -> Rgba {
    if ((x & 1) & (y & 1)) != 0 || ((x & 1) == 0 && (y & 1) == 0) {
        Rgba::new(255, 0, 0, 255)
    } else {
        Rgba::new(0, 255, 0, 255)
    }
}

/// Build a screen-covering grid of tile sprites, each carrying a
/// checkerboard placeholder texture and starting hidden.
pub fn build_tile_grid(presenter: &dyn Presenter, tile_dims: u16, region: &Region2D) -> SpriteGrid {
    let visible = presenter.visible_size();
    let scale = presenter.content_scale();
    let dims = grid_dims_for_view(visible, scale, tile_dims);

    let handle = presenter.create_grid();
    let mut sprites = Vec::with_capacity(dims.area() as usize);
    let placement = GridPlacement::new(region, dims);

    for grid_y in 0..dims.h {
        for grid_x in 0..dims.w {
            let colour = checkerboard_colour(grid_x, grid_y);
            let pixels = vec![colour; tile_dims as usize * tile_dims as usize];
            let sprite = presenter.create_tile_sprite(handle, &pixels, tile_dims, tile_dims);
            match sprite {
                Some(sprite) => placement.position(presenter, sprite, grid_x, grid_y, false),
                None => log::error!("failed to create tile sprite at ({grid_x}, {grid_y})"),
            }
            sprites.push(sprite);
        }
    }
    presenter.set_grid_visible(handle, false);

    SpriteGrid {
        handle,
        tiles_x: dims.w,
        tiles_y: dims.h,
        sprites,
    }
}

/// Reposition an existing grid's sprites to cover a region of interest.
/// The grid must have been built for the current view dimensions.
pub fn fit_grid_to_region(
    presenter: &dyn Presenter,
    grid: &SpriteGrid,
    tile_dims: u16,
    region: &Region2D,
    visible: bool,
) {
    let computed = grid_dims_for_view(presenter.visible_size(), presenter.content_scale(), tile_dims);
    assert_eq!(
        computed,
        grid.dims(),
        "tile grid no longer matches the view"
    );

    let placement = GridPlacement::new(region, grid.dims());
    for grid_y in 0..grid.tiles_y {
        for grid_x in 0..grid.tiles_x {
            if let Some(sprite) = grid.sprite(grid_x as u16, grid_y as u16) {
                placement.position(presenter, sprite, grid_x, grid_y, visible);
            }
        }
    }
}

/// World-space footprint of a tile grid covering a region.
struct GridPlacement {
    origin: (f64, f64),
    tile_world: (f64, f64),
}

impl GridPlacement {
    fn new(region: &Region2D, dims: Dims2u) -> Self {
        Self {
            origin: (region.left(), region.bottom()),
            tile_world: (
                region.width / dims.w as f64,
                region.height / dims.h as f64,
            ),
        }
    }

    fn position(
        &self,
        presenter: &dyn Presenter,
        sprite: SpriteHandle,
        grid_x: u32,
        grid_y: u32,
        visible: bool,
    ) {
        presenter.position_sprite(
            sprite,
            (
                self.origin.0 + grid_x as f64 * self.tile_world.0,
                self.origin.1 + grid_y as f64 * self.tile_world.1,
            ),
            self.tile_world,
            visible,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_the_view_with_rounding_up() {
        assert_eq!(
            grid_dims_for_view((900.0, 600.0), 1.0, 32),
            Dims2u::new(29, 19)
        );
        assert_eq!(
            grid_dims_for_view((1024.0, 512.0), 1.0, 32),
            Dims2u::new(32, 16)
        );
    }

    #[test]
    fn content_scale_shrinks_logical_tiles() {
        // Retina: a 32px tile is 16 logical points, so twice as many fit.
        assert_eq!(
            grid_dims_for_view((640.0, 480.0), 2.0, 32),
            Dims2u::new(40, 30)
        );
    }

    #[test]
    fn checkerboard_alternates_by_parity() {
        let red = Rgba::new(255, 0, 0, 255);
        let green = Rgba::new(0, 255, 0, 255);
        assert_eq!(checkerboard_colour(0, 0), red);
        assert_eq!(checkerboard_colour(1, 1), red);
        assert_eq!(checkerboard_colour(2, 2), red);
        assert_eq!(checkerboard_colour(1, 0), green);
        assert_eq!(checkerboard_colour(0, 1), green);
        assert_eq!(checkerboard_colour(2, 1), green);
    }
}
