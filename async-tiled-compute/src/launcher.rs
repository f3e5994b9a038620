//! Tiled work launcher: partition a framebuffer into a grid of tiles and
//! spawn one compute task per tile.

use crate::executor::{SpawnError, TaskHandle, TaskPool};
use async_tiled_core::{Dims2u, Framebuffer, Rgba, Tile, TileSpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to launch tile task: {0}")]
    Spawn(#[from] SpawnError),
}

/// Result of launching a tile grid: the tile views and one completion
/// handle per tile, both in row-major launch order.
///
/// `tiles[i]` and the tile yielded by `handles[i]` view the same grid
/// cell; the caller-side view is for geometry queries and for reading
/// pixels after the matching handle has resolved, while the task writes
/// through its own view.
pub struct TileLaunch {
    pub tiles: Vec<Tile>,
    pub handles: Vec<TaskHandle<Tile>>,
}

impl TileLaunch {
    pub fn tile_count(&self) -> usize {
        self.handles.len()
    }
}

/// Launch a kernel asynchronously on each tile of a framebuffer, where
/// the tiles point into the common framebuffer.
///
/// Tiles alias disjoint byte ranges provided the spec's stride spans a
/// full grid row of tiles, so each task may write its own tile freely. A
/// kernel that writes outside its tile corrupts its neighbours; staying
/// in bounds is the kernel's obligation.
///
/// If any spawn fails the already-started handles are joined before the
/// error is returned, so no task is left writing into the framebuffer.
pub fn launch_tiles<K>(
    pool: &TaskPool,
    spec: TileSpec,
    grid_dims: Dims2u,
    framebuffer: &Framebuffer,
    kernel: K,
) -> Result<TileLaunch, LaunchError>
where
    K: FnOnce(&TileSpec, &mut Tile) + Clone + Send + 'static,
{
    assert!(
        spec.stride >= grid_dims.w as usize * spec.w as usize * Rgba::BYTES,
        "stride does not span a grid row"
    );
    assert!(
        grid_dims.h as usize * spec.h as usize * spec.stride <= framebuffer.byte_len(),
        "tile grid exceeds the framebuffer"
    );

    let count = grid_dims.area() as usize;
    let mut tiles = Vec::with_capacity(count);
    let mut handles = Vec::with_capacity(count);

    for y in 0..grid_dims.h {
        for x in 0..grid_dims.w {
            let (x, y) = (x as u16, y as u16);
            tiles.push(Tile::from_grid(framebuffer, &spec, x, y));
            let mut task_tile = Tile::from_grid(framebuffer, &spec, x, y);
            let task_kernel = kernel.clone();
            let spawned = pool.spawn(move || {
                task_kernel(&spec, &mut task_tile);
                task_tile
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    log::error!("tile launch failed at ({x}, {y}): {err}");
                    join_started(handles);
                    return Err(err.into());
                }
            }
        }
    }

    Ok(TileLaunch { tiles, handles })
}

/// Launch a kernel asynchronously on each tile of a grid, where every
/// tile owns its own small framebuffer. The completed tiles carry their
/// pixels, so only completion handles are returned (in row-major launch
/// order); extract pixels as each handle resolves.
pub fn launch_owning_tiles<K>(
    pool: &TaskPool,
    spec: TileSpec,
    grid_dims: Dims2u,
    kernel: K,
) -> Result<Vec<TaskHandle<Tile>>, LaunchError>
where
    K: FnOnce(&TileSpec, &mut Tile) + Clone + Send + 'static,
{
    let mut handles = Vec::with_capacity(grid_dims.area() as usize);

    for y in 0..grid_dims.h {
        for x in 0..grid_dims.w {
            let mut task_tile = Tile::owned(&spec, x as u16, y as u16);
            let task_kernel = kernel.clone();
            let spawned = pool.spawn(move || {
                task_kernel(&spec, &mut task_tile);
                task_tile
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    log::error!("owning tile launch failed at ({x}, {y}): {err}");
                    join_started(handles);
                    return Err(err.into());
                }
            }
        }
    }

    Ok(handles)
}

fn join_started(handles: Vec<TaskHandle<Tile>>) {
    for handle in handles.into_iter().rev() {
        let _ = handle.wait();
    }
}
