//! Double-buffered zoom coordinator: serves pan/zoom intents, runs one
//! launcher-waiter task per generation and marshals per-tile completions
//! onto the UI thread.

use crate::grid::{build_tile_grid, fit_grid_to_region};
use crate::presenter::{Presenter, TouchEvent};
use crate::zoom_level::ZoomLevel;
use async_tiled_compute::{
    mandelbrot_async_tiled, spawn_thread, MandelbrotParams, NewestTransaction, TaskPool, Tile,
    TransactionId,
};
use async_tiled_core::{Dims2u, Framebuffer, Region2D, Rgba, TileFormat, TileSpec};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Edge length of a tile in physical pixels.
pub const TILE_DIMS: u16 = 32;

/// Iteration budget for interactive generations.
pub const MAX_ITERATIONS: u32 = 64;

fn slot_of(transaction: TransactionId) -> usize {
    (transaction & 1) as usize
}

fn previous_slot(transaction: TransactionId) -> usize {
    (transaction.wrapping_sub(1) & 1) as usize
}

/// Owns the two zoom slots, the newest-transaction counter and the task
/// pool, and drives the presenter.
pub struct ZoomCoordinator {
    presenter: Arc<dyn Presenter>,
    pool: Arc<TaskPool>,
    newest_transaction: NewestTransaction,
    levels: [Arc<ZoomLevel>; 2],
    visible_size: (f64, f64),
}

impl ZoomCoordinator {
    /// Build both sprite grids, aim the camera at the initial region and
    /// kick off generation 0 on slot 0. Slot 1 starts hidden.
    pub fn new(presenter: Arc<dyn Presenter>, pool: Arc<TaskPool>) -> Self {
        let visible_size = presenter.visible_size();
        let region = Region2D::fit_to_aspect(visible_size.0, visible_size.1);
        apply_zoom(presenter.as_ref(), &region);

        let levels = [
            Arc::new(ZoomLevel::new(
                region,
                build_tile_grid(presenter.as_ref(), TILE_DIMS, &region),
            )),
            Arc::new(ZoomLevel::new(
                region,
                build_tile_grid(presenter.as_ref(), TILE_DIMS, &region),
            )),
        ];

        let coordinator = Self {
            presenter,
            pool,
            newest_transaction: NewestTransaction::new(),
            levels,
            visible_size,
        };
        coordinator.update_tiles_for_region(0);
        coordinator
    }

    pub fn newest_transaction(&self) -> &NewestTransaction {
        &self.newest_transaction
    }

    pub fn current_slot(&self) -> usize {
        slot_of(self.newest_transaction.current())
    }

    pub fn level(&self, slot: usize) -> &Arc<ZoomLevel> {
        &self.levels[slot]
    }

    pub fn touch_began(&self, event: &TouchEvent) {
        log::debug!("touch began at {:?}", event.current);
    }

    /// Drag in progress: move the current slot's region and the camera,
    /// without bumping the transaction. Tiles already in flight keep
    /// rendering against the old region, so the dragged view can show
    /// misaligned tiles until the touch ends and triggers a refresh.
    pub fn touch_moved(&self, event: &TouchEvent) {
        if event.delta == (0.0, 0.0) {
            return;
        }
        let level = &self.levels[self.current_slot()];
        let mut region = level.region.lock().expect("region");
        region.pan_by_screen_delta(event.delta, self.visible_size);
        self.presenter
            .set_camera_position((region.left(), region.bottom()));
    }

    /// Drag released: start a generation at the panned region.
    pub fn touch_ended(&self, event: &TouchEvent) {
        log::debug!("touch ended with delta {:?}", event.delta);
        let transaction = self.newest_transaction.bump();

        let mut region = *self.levels[previous_slot(transaction)]
            .region
            .lock()
            .expect("region");
        region.pan_by_screen_delta(event.delta, self.visible_size);
        *self.levels[slot_of(transaction)]
            .region
            .lock()
            .expect("region") = region;

        self.presenter
            .set_camera_position((region.left(), region.bottom()));
        self.update_tiles_for_region(transaction);
        self.reorder_grids(transaction);
    }

    /// Halve the region extents around the same centre.
    pub fn zoom_in(&self) {
        log::debug!("zoom in");
        self.zoom_by(0.5);
    }

    /// Double the region extents around the same centre.
    pub fn zoom_out(&self) {
        log::debug!("zoom out");
        self.zoom_by(2.0);
    }

    fn zoom_by(&self, factor: f64) {
        let transaction = self.newest_transaction.bump();

        let region = self.levels[previous_slot(transaction)]
            .region
            .lock()
            .expect("region")
            .scaled(factor);
        *self.levels[slot_of(transaction)]
            .region
            .lock()
            .expect("region") = region;

        apply_zoom(self.presenter.as_ref(), &region);
        self.update_tiles_for_region(transaction);
        self.reorder_grids(transaction);
    }

    /// Position the slot's sprites over its region (independent of pixel
    /// production), then start a new generation.
    fn update_tiles_for_region(&self, transaction: TransactionId) {
        let level = &self.levels[slot_of(transaction)];
        let region = *level.region.lock().expect("region");
        fit_grid_to_region(self.presenter.as_ref(), &level.grid, TILE_DIMS, &region, false);
        self.generate_tiles(transaction);
    }

    /// New tiles draw over the previous generation's.
    fn reorder_grids(&self, transaction: TransactionId) {
        self.presenter
            .set_grid_z_order(self.levels[previous_slot(transaction)].grid.handle, -1);
        self.presenter
            .set_grid_z_order(self.levels[slot_of(transaction)].grid.handle, 1);
    }

    /// Stamp the slot and hand the rest of the generation to a
    /// launcher-waiter task on a background thread.
    fn generate_tiles(&self, transaction: TransactionId) {
        let level = &self.levels[slot_of(transaction)];
        let last = &self.levels[previous_slot(transaction)];

        // Stamping the slot lets any background task still working this
        // slot notice it is out of date.
        level.zoom_transaction.store(transaction, Ordering::Release);
        level.tiles_updated.store(0, Ordering::Relaxed);

        let presenter = Arc::clone(&self.presenter);
        let pool = Arc::clone(&self.pool);
        let newest = self.newest_transaction.clone();
        let waiter_level = Arc::clone(level);
        let waiter_last = Arc::clone(last);

        let waiter = spawn_thread("tile-launcher", move || {
            launcher_waiter(
                presenter,
                pool,
                newest,
                waiter_level,
                waiter_last,
                transaction,
            )
        });
        match waiter {
            // Keep the handle so a blocking handle destructor could
            // never stall the UI thread on user input.
            Ok(handle) => level.retain_launch_status(handle),
            Err(err) => {
                // The UI keeps showing the previous slot.
                log::error!("failed to start launcher-waiter for transaction {transaction}: {err}");
            }
        }
    }
}

fn apply_zoom(presenter: &dyn Presenter, region: &Region2D) {
    presenter.set_orthographic(region.width, region.height, -1024.0, 1024.0);
    presenter.set_camera_position((region.left(), region.bottom()));
}

/// One launcher-waiter: drain the slot, relaunch its tiles, await each
/// completion in launch order and hand it to the UI thread. Returns
/// false when the generation was abandoned before launch.
fn launcher_waiter(
    presenter: Arc<dyn Presenter>,
    pool: Arc<TaskPool>,
    newest: NewestTransaction,
    level: Arc<ZoomLevel>,
    last: Arc<ZoomLevel>,
    transaction: TransactionId,
) -> bool {
    // Only one launcher-waiter may work this slot at a time.
    let _serialised = level.launcher_lock.lock().expect("launcher lock");

    // Drain: wait until the UI thread has finished drawing sprites from
    // the tile pixels this generation is about to overwrite.
    loop {
        if !newest.is_current(transaction) {
            return false;
        }
        if level.tiles_in_flight.load(Ordering::Acquire) > 0 {
            thread::sleep(Duration::from_millis(1));
        } else {
            break;
        }
    }

    let grid_dims = level.grid.dims();
    let fb_dims = Dims2u::new(
        grid_dims.w * TILE_DIMS as u32,
        grid_dims.h * TILE_DIMS as u32,
    );
    let framebuffer = Framebuffer::with_pixel_count((fb_dims.w * fb_dims.h) as usize);
    *level.framebuffer.lock().expect("framebuffer") = framebuffer.clone();

    let spec = TileSpec::new(
        TileFormat::Rgba8888,
        TILE_DIMS,
        TILE_DIMS,
        fb_dims.w as usize * Rgba::BYTES,
    );
    let region = *level.region.lock().expect("region");
    // Image row 0 carries the world-bottom edge; the flipped upload
    // restores orientation on the texture.
    let params = MandelbrotParams {
        left: region.left() as f32,
        right: region.right() as f32,
        top: region.bottom() as f32,
        bottom: region.top() as f32,
        max_iterations: MAX_ITERATIONS,
    };

    let launch = match mandelbrot_async_tiled(
        &pool,
        params,
        transaction,
        newest.clone(),
        grid_dims,
        spec,
        &framebuffer,
    ) {
        Ok(launch) => launch,
        Err(err) => {
            log::error!("abandoning generation {transaction}: {err}");
            return false;
        }
    };
    let total = launch.tile_count() as u32;
    level.tiles_in_flight.store(total, Ordering::Release);
    log::info!(
        "transaction {transaction}: launched {} x {} ({total}) tiles",
        grid_dims.w,
        grid_dims.h
    );

    let mut handles = launch.handles.into_iter();
    while let Some(handle) = handles.next() {
        // Once superseded, the rest either abort themselves quickly or
        // run to completion; wait them all out, then release the slot.
        if !newest.is_current(transaction) {
            log::debug!(
                "transaction {transaction} superseded by {}; draining pending tiles",
                newest.current()
            );
            let _ = handle.wait();
            for pending in handles.by_ref() {
                let _ = pending.wait();
            }
            level.tiles_in_flight.store(0, Ordering::Release);
            break;
        }

        // Wait for the tile here, off the UI thread.
        let tile = match handle.wait() {
            Ok(tile) => tile,
            Err(err) => {
                log::error!("tile task died in transaction {transaction}: {err}");
                level.decrement_in_flight();
                continue;
            }
        };

        let ui_presenter = Arc::clone(&presenter);
        let ui_level = Arc::clone(&level);
        let ui_last = Arc::clone(&last);
        let ui_newest = newest.clone();
        presenter.dispatch_on_ui(Box::new(move || {
            finish_tile(
                &ui_presenter,
                &ui_level,
                &ui_last,
                &spec,
                &tile,
                transaction,
                &ui_newest,
                total,
            );
        }));
    }
    true
}

/// End-of-tile hand-off, on the UI thread: upload the pixels if the
/// generation is still current, and account for the tile either way.
#[allow(clippy::too_many_arguments)]
fn finish_tile(
    presenter: &Arc<dyn Presenter>,
    level: &ZoomLevel,
    last: &ZoomLevel,
    spec: &TileSpec,
    tile: &Tile,
    transaction: TransactionId,
    newest: &NewestTransaction,
    total: u32,
) {
    if newest.is_current(transaction) {
        presenter.set_grid_visible(level.grid.handle, true);
        if let Some(sprite) = level.grid.sprite(tile.x, tile.y) {
            let pixels = tile.copy_pixels_flipped(spec);
            presenter.upload_tile_texture(sprite, &pixels, spec.w, spec.h);
            presenter.set_sprite_visible(sprite, true);
        }
        let updated = level.tiles_updated.fetch_add(1, Ordering::Relaxed) + 1;
        // Hide the previous grid, children included, once the last tile
        // of this generation lands.
        if updated == total {
            presenter.set_grid_visible(last.grid.handle, false);
            for sprite in last.grid.sprites() {
                presenter.set_sprite_visible(sprite, false);
            }
        }
    } else {
        log::debug!(
            "skipped updating tile ({}, {}): transaction changed from {transaction} to {}",
            tile.x,
            tile.y,
            newest.current()
        );
    }
    level.decrement_in_flight();
}
