//! Escape-time Mandelbrot kernel for the tiled launcher.

use crate::executor::TaskPool;
use crate::launcher::{launch_tiles, LaunchError, TileLaunch};
use crate::transaction::{NewestTransaction, TransactionId};
use async_tiled_core::{pixel_dims, Dims2u, Framebuffer, Rgba, TileSpec};

/// Input parameters for one Mandelbrot generation: the real bounds of
/// the region to render and the iteration budget.
///
/// f32 arithmetic matches the kernel's precision; the divergence test is
/// `|re · im| >= 4.0` applied after each `z <- z² + c` step. That test is
/// not the classical `|z|² >= 4` — it is kept as-is to reproduce the
/// established output exactly.
#[derive(Clone, Copy, Debug)]
pub struct MandelbrotParams {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub max_iterations: u32,
}

/// Iterate `z <- z² + c` from zero; returns the iteration at which the
/// divergence test fired, or `max_iterations` for interior points.
fn escape_iterations(c_re: f32, c_im: f32, max_iterations: u32) -> u32 {
    let mut z_re = 0.0f32;
    let mut z_im = 0.0f32;
    let mut iter = 0;
    while iter < max_iterations {
        let new_re = z_re * z_re - z_im * z_im + c_re;
        let new_im = 2.0 * z_re * z_im + c_im;
        z_re = new_re;
        z_im = new_im;
        if (z_re * z_im).abs() >= 4.0 {
            break;
        }
        iter += 1;
    }
    iter
}

/// Render the Mandelbrot set across a shared framebuffer, one task per
/// tile.
///
/// Each task polls the newest-transaction counter before every scanline
/// and returns early once `origin_transaction` is stale, leaving the
/// rest of its tile untouched. Pixels are greyscale,
/// `255 · (max_iterations − iter) / max_iterations`, alpha 255, in
/// image order (top scanline first).
pub fn mandelbrot_async_tiled(
    pool: &TaskPool,
    params: MandelbrotParams,
    origin_transaction: TransactionId,
    newest: NewestTransaction,
    grid_dims: Dims2u,
    spec: TileSpec,
    framebuffer: &Framebuffer,
) -> Result<TileLaunch, LaunchError> {
    let fb_dims = pixel_dims(&spec, grid_dims);

    launch_tiles(pool, spec, grid_dims, framebuffer, move |spec, tile| {
        let position = tile.pixel_position(spec);
        let grey_step = 255.0 / params.max_iterations as f32;

        for y in 0..spec.h {
            // Cancellation check per scanline, so a tile that went stale
            // mid-render stops burning cycles.
            if !newest.is_current(origin_transaction) {
                break;
            }
            let fb_y = position.y + y as u32;
            let c_im =
                params.top + (params.bottom - params.top) / fb_dims.h as f32 * fb_y as f32;
            let row = tile.row_mut(spec, y);
            for x in 0..spec.w {
                let fb_x = position.x + x as u32;
                let c_re =
                    params.left + (params.right - params.left) / fb_dims.w as f32 * fb_x as f32;
                let iter = escape_iterations(c_re, c_im, params.max_iterations);
                let grey = (grey_step * (params.max_iterations - iter) as f32) as u8;
                row[x as usize] = Rgba::grey(grey);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_never_escapes() {
        assert_eq!(escape_iterations(0.0, 0.0, 100), 100);
    }

    #[test]
    fn main_cardioid_point_never_escapes() {
        assert_eq!(escape_iterations(-0.5, 0.0, 500), 500);
    }

    #[test]
    fn point_far_outside_escapes_quickly() {
        // c = (2, 2): z1 = c, |re·im| = 4 already.
        assert_eq!(escape_iterations(2.0, 2.0, 100), 0);
    }

    #[test]
    fn divergence_test_is_product_not_magnitude() {
        // c = (3, 0): classical |z|² escapes immediately, but the
        // product test needs an imaginary part. z1 = 3, z2 = 12, ...
        // stays on the real axis, so the product never fires.
        assert_eq!(escape_iterations(3.0, 0.0, 8), 8);
    }

    #[test]
    fn upper_left_corner_of_reference_bounds_escapes_at_two() {
        // c = (-2, 1.5001): |re·im| reaches 4.0 on the third z update.
        assert_eq!(escape_iterations(-2.0, 1.5001, 32), 2);
    }
}
