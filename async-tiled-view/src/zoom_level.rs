//! Per-generation state for one of the two double-buffered zoom slots.

use crate::grid::SpriteGrid;
use async_tiled_compute::TaskHandle;
use async_tiled_core::{Framebuffer, Region2D};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::Mutex;

/// How many launcher-waiter completion handles to keep alive. Some task
/// runtimes block in a handle's destructor until the task completes;
/// retaining the most recent few means dropping the oldest can only
/// block on a task that is all but certain to have finished.
const LAUNCH_STATUS_DEPTH: usize = 4;

/// All the state of one zoom generation. Two of these are kept: one for
/// the previous level, which continues to be drawn scaled, and one for
/// the level currently being generated.
pub struct ZoomLevel {
    /// Region of interest in world coordinates. Written by the UI thread
    /// (pan updates), snapshotted by a launcher-waiter on entry.
    pub region: Mutex<Region2D>,
    /// Backing pixels for the current generation; replaced by the
    /// launcher-waiter once the previous generation has drained.
    pub framebuffer: Mutex<Framebuffer>,
    /// Transaction stamped on the generation this slot is producing.
    pub zoom_transaction: AtomicU16,
    /// Tiles whose pixels may still be touched: set to the tile count at
    /// launch, decremented as each tile's UI hand-off runs. A new
    /// launcher-waiter for this slot must not touch the framebuffer
    /// until this reaches zero.
    pub tiles_in_flight: AtomicU32,
    /// Tiles of this generation already pushed to the presenter.
    pub tiles_updated: AtomicU32,
    /// Serialises launcher-waiters targeting this slot.
    pub launcher_lock: Mutex<()>,
    launch_statuses: Mutex<VecDeque<TaskHandle<bool>>>,
    /// This slot's sprite grid.
    pub grid: SpriteGrid,
}

impl ZoomLevel {
    pub fn new(region: Region2D, grid: SpriteGrid) -> Self {
        Self {
            region: Mutex::new(region),
            framebuffer: Mutex::new(Framebuffer::default()),
            zoom_transaction: AtomicU16::new(0),
            tiles_in_flight: AtomicU32::new(0),
            tiles_updated: AtomicU32::new(0),
            launcher_lock: Mutex::new(()),
            launch_statuses: Mutex::new(VecDeque::new()),
            grid,
        }
    }

    /// Keep a launcher-waiter handle alive, displacing the oldest once
    /// the ring is full.
    pub fn retain_launch_status(&self, handle: TaskHandle<bool>) {
        let mut ring = self.launch_statuses.lock().expect("launch status ring");
        ring.push_back(handle);
        while ring.len() > LAUNCH_STATUS_DEPTH {
            ring.pop_front();
        }
    }

    /// Decrement the in-flight count if it is still positive. A
    /// superseded waiter may already have reset the counter to zero
    /// while late UI closures were queued, so underflow is tolerated.
    pub fn decrement_in_flight(&self) {
        let _ = self
            .tiles_in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}
