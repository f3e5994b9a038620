//! In-memory presenter for exercising the coordinator without a
//! graphics toolkit. UI closures queue on a channel and run serially
//! when the test thread pumps them, which makes the test thread the "UI
//! thread".

use crate::presenter::{GridHandle, Presenter, SpriteHandle, UiClosure};
use async_tiled_core::Rgba;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Clone, Debug, Default)]
pub struct GridState {
    pub visible: bool,
    pub z_order: i32,
    pub sprite_count: usize,
}

#[derive(Clone, Debug)]
pub struct SpriteState {
    pub grid: GridHandle,
    pub visible: bool,
    pub size: (u16, u16),
    pub world_xy: (f64, f64),
    pub world_wh: (f64, f64),
    /// Most recent texture contents, scanlines as uploaded (bottom-up).
    pub pixels: Vec<Rgba>,
    pub uploads: u32,
}

#[derive(Default)]
struct SceneState {
    next_handle: u32,
    sprites_created: usize,
    grids: HashMap<u32, GridState>,
    sprites: HashMap<u32, SpriteState>,
    camera_position: (f64, f64),
    orthographic: (f64, f64),
    failing_sprite_creations: HashSet<usize>,
}

/// Records every presenter call and lets tests inspect the scene.
pub struct RecordingPresenter {
    visible: (f64, f64),
    scale: f64,
    ui_send: Sender<UiClosure>,
    ui_pending: Receiver<UiClosure>,
    state: Mutex<SceneState>,
}

impl RecordingPresenter {
    pub fn new(visible: (f64, f64), scale: f64) -> Self {
        let (ui_send, ui_pending) = unbounded();
        Self {
            visible,
            scale,
            ui_send,
            ui_pending,
            state: Mutex::new(SceneState::default()),
        }
    }

    /// Make the n-th `create_tile_sprite` calls fail (0-based, counted
    /// across all grids). Configure before building the coordinator.
    pub fn fail_sprite_creations(&self, indices: impl IntoIterator<Item = usize>) {
        let mut state = self.state.lock().expect("scene state");
        state.failing_sprite_creations.extend(indices);
    }

    /// Run queued UI closures serially; returns how many ran.
    pub fn run_pending_ui(&self) -> usize {
        let mut ran = 0;
        while let Ok(closure) = self.ui_pending.try_recv() {
            closure();
            ran += 1;
        }
        ran
    }

    pub fn grid_state(&self, grid: GridHandle) -> GridState {
        self.state.lock().expect("scene state").grids[&grid.0].clone()
    }

    pub fn sprite_state(&self, sprite: SpriteHandle) -> SpriteState {
        self.state.lock().expect("scene state").sprites[&sprite.0].clone()
    }

    pub fn visible_sprite_count(&self, grid: GridHandle) -> usize {
        let state = self.state.lock().expect("scene state");
        state
            .sprites
            .values()
            .filter(|s| s.grid == grid && s.visible)
            .count()
    }

    pub fn upload_count(&self, grid: GridHandle) -> u32 {
        let state = self.state.lock().expect("scene state");
        state
            .sprites
            .values()
            .filter(|s| s.grid == grid)
            .map(|s| s.uploads)
            .sum()
    }

    pub fn camera_position(&self) -> (f64, f64) {
        self.state.lock().expect("scene state").camera_position
    }

    pub fn orthographic(&self) -> (f64, f64) {
        self.state.lock().expect("scene state").orthographic
    }
}

impl Presenter for RecordingPresenter {
    fn visible_size(&self) -> (f64, f64) {
        self.visible
    }

    fn content_scale(&self) -> f64 {
        self.scale
    }

    fn dispatch_on_ui(&self, closure: UiClosure) {
        let _ = self.ui_send.send(closure);
    }

    fn create_grid(&self) -> GridHandle {
        let mut state = self.state.lock().expect("scene state");
        state.next_handle += 1;
        let handle = state.next_handle;
        state.grids.insert(handle, GridState::default());
        GridHandle(handle)
    }

    fn create_tile_sprite(
        &self,
        grid: GridHandle,
        initial_pixels: &[Rgba],
        w: u16,
        h: u16,
    ) -> Option<SpriteHandle> {
        assert_eq!(initial_pixels.len(), w as usize * h as usize);
        let mut state = self.state.lock().expect("scene state");

        let creation_index = state.sprites_created;
        state.sprites_created += 1;
        if state.failing_sprite_creations.contains(&creation_index) {
            return None;
        }

        state.next_handle += 1;
        let handle = state.next_handle;
        state.sprites.insert(
            handle,
            SpriteState {
                grid,
                visible: false,
                size: (w, h),
                world_xy: (0.0, 0.0),
                world_wh: (0.0, 0.0),
                pixels: initial_pixels.to_vec(),
                uploads: 0,
            },
        );
        state
            .grids
            .get_mut(&grid.0)
            .expect("unknown grid")
            .sprite_count += 1;
        Some(SpriteHandle(handle))
    }

    fn position_sprite(
        &self,
        sprite: SpriteHandle,
        world_xy: (f64, f64),
        world_wh: (f64, f64),
        visible: bool,
    ) {
        let mut state = self.state.lock().expect("scene state");
        let sprite = state.sprites.get_mut(&sprite.0).expect("unknown sprite");
        sprite.world_xy = world_xy;
        sprite.world_wh = world_wh;
        sprite.visible = visible;
    }

    fn upload_tile_texture(&self, sprite: SpriteHandle, pixels: &[Rgba], w: u16, h: u16) {
        assert_eq!(pixels.len(), w as usize * h as usize);
        let mut state = self.state.lock().expect("scene state");
        let sprite = state.sprites.get_mut(&sprite.0).expect("unknown sprite");
        assert_eq!(sprite.size, (w, h), "texture upload with mismatched size");
        sprite.pixels = pixels.to_vec();
        sprite.uploads += 1;
    }

    fn set_sprite_visible(&self, sprite: SpriteHandle, visible: bool) {
        let mut state = self.state.lock().expect("scene state");
        state
            .sprites
            .get_mut(&sprite.0)
            .expect("unknown sprite")
            .visible = visible;
    }

    fn set_grid_visible(&self, grid: GridHandle, visible: bool) {
        let mut state = self.state.lock().expect("scene state");
        state.grids.get_mut(&grid.0).expect("unknown grid").visible = visible;
    }

    fn set_grid_z_order(&self, grid: GridHandle, z: i32) {
        let mut state = self.state.lock().expect("scene state");
        state.grids.get_mut(&grid.0).expect("unknown grid").z_order = z;
    }

    fn set_orthographic(&self, width: f64, height: f64, _near: f64, _far: f64) {
        let mut state = self.state.lock().expect("scene state");
        state.orthographic = (width, height);
    }

    fn set_camera_position(&self, world_xy: (f64, f64)) {
        let mut state = self.state.lock().expect("scene state");
        state.camera_position = world_xy;
    }
}
