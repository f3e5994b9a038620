//! The narrow interface the zoom coordinator needs from a graphics
//! toolkit: sprite grids, a camera, and a way onto the UI thread.

use async_tiled_core::Rgba;

/// Opaque handle to a tile-grid node owned by the presenter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridHandle(pub u32);

/// Opaque handle to one tile sprite owned by the presenter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(pub u32);

/// Closure to be run on the presenter's single UI thread.
pub type UiClosure = Box<dyn FnOnce() + Send + 'static>;

/// One touch sample in logical (screen) pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchEvent {
    pub current: (f64, f64),
    pub previous: (f64, f64),
    pub start: (f64, f64),
    pub delta: (f64, f64),
}

impl TouchEvent {
    /// Event carrying only a movement delta.
    pub fn with_delta(dx: f64, dy: f64) -> Self {
        Self {
            delta: (dx, dy),
            ..Self::default()
        }
    }
}

/// External graphics adapter. Implementations own the scene graph,
/// textures and camera; the coordinator only talks in terms of these
/// calls.
///
/// `dispatch_on_ui` closures run serially on the presenter's one UI
/// thread, in dispatch order. All other methods touching sprites or
/// grids must only be called from that thread (the coordinator does so
/// from inside dispatched closures, and during construction before any
/// background work exists).
pub trait Presenter: Send + Sync {
    /// Visible view size in logical pixels.
    fn visible_size(&self) -> (f64, f64);

    /// Physical pixels per logical pixel.
    fn content_scale(&self) -> f64;

    /// Queue a closure for the UI thread.
    fn dispatch_on_ui(&self, closure: UiClosure);

    fn create_grid(&self) -> GridHandle;

    /// Create one tile sprite under a grid with its initial texture.
    /// `None` signals creation failure; the cell is skipped from then on.
    fn create_tile_sprite(
        &self,
        grid: GridHandle,
        initial_pixels: &[Rgba],
        w: u16,
        h: u16,
    ) -> Option<SpriteHandle>;

    /// Place a sprite: world-space position of its (0,0) anchor, world
    /// extent, and visibility.
    fn position_sprite(
        &self,
        sprite: SpriteHandle,
        world_xy: (f64, f64),
        world_wh: (f64, f64),
        visible: bool,
    );

    /// Replace a sprite's texture. Scanlines arrive bottom-up (already
    /// flipped for texture orientation).
    fn upload_tile_texture(&self, sprite: SpriteHandle, pixels: &[Rgba], w: u16, h: u16);

    fn set_sprite_visible(&self, sprite: SpriteHandle, visible: bool);

    fn set_grid_visible(&self, grid: GridHandle, visible: bool);

    /// Draw order between grids; larger is in front.
    fn set_grid_z_order(&self, grid: GridHandle, z: i32);

    /// Reconfigure the zoom camera's orthographic projection.
    fn set_orthographic(&self, width: f64, height: f64, near: f64, far: f64);

    /// Move the zoom camera; `world_xy` is the bottom-left of the view.
    fn set_camera_position(&self, world_xy: (f64, f64));
}
