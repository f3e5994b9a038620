//! Offline entry point: render a tiled clear and a tiled Mandelbrot set
//! at 2048x1536 and write both as PNGs.

use anyhow::Context;
use async_tiled_compute::{
    clear_async_tiled, mandelbrot_async_tiled, wait_all, MandelbrotParams, NewestTransaction,
    TaskPool,
};
use async_tiled_core::{
    round_up_to_cacheline, Dims2u, Framebuffer, Rgba, TileFormat, TileSpec,
};

const OUTPUT_PATH_CLEAR: &str = "/tmp/async_tiled-clear.png";
const OUTPUT_PATH_MANDELBROT: &str = "/tmp/async_tiled-mandelbrot.png";

const WIDTH: u32 = 2048;
const HEIGHT: u32 = 1536;
const TILE_DIMS: u16 = 32;
// Should come from the OS, really.
const CACHELINE_LEN: usize = 128;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let clear_colour = Rgba::new(192, 224, 255, 255); // Light blue.
    let row_bytes = round_up_to_cacheline(WIDTH as usize * Rgba::BYTES, CACHELINE_LEN);
    let padded_width = (row_bytes / Rgba::BYTES) as u32;
    let grid_dims = Dims2u::new(WIDTH / TILE_DIMS as u32, HEIGHT / TILE_DIMS as u32);
    assert!(WIDTH % TILE_DIMS as u32 == 0 && HEIGHT % TILE_DIMS as u32 == 0);

    let pool = TaskPool::new();
    let framebuffer = Framebuffer::with_pixel_count((padded_width * HEIGHT) as usize);
    let spec = TileSpec::new(TileFormat::Rgba8888, TILE_DIMS, TILE_DIMS, row_bytes);

    let launch = clear_async_tiled(&pool, clear_colour, grid_dims, spec, &framebuffer)?;
    wait_all(launch.handles)?;

    let cleared = framebuffer
        .pixels()
        .iter()
        .filter(|&&p| p == clear_colour)
        .count();
    log::info!("cleared pixel count: {cleared}");
    log::info!("missed pixel count: {}", framebuffer.pixel_count() - cleared);

    log::info!("saving image as PNG at {OUTPUT_PATH_CLEAR:?}");
    save_png(OUTPUT_PATH_CLEAR, &framebuffer, padded_width, HEIGHT)?;

    log::info!(
        "launching {} * {} ({}) tiles computing mandelbrot set",
        grid_dims.w,
        grid_dims.h,
        grid_dims.area()
    );
    let transaction = NewestTransaction::new();
    let launch = mandelbrot_async_tiled(
        &pool,
        MandelbrotParams {
            left: -2.0,
            right: 1.0,
            top: 1.5001,
            bottom: -1.4999,
            max_iterations: 32,
        },
        0,
        transaction,
        grid_dims,
        spec,
        &framebuffer,
    )?;
    wait_all(launch.handles)?;
    log::info!("mandelbrot tiles completed");

    log::info!("saving image as PNG at {OUTPUT_PATH_MANDELBROT:?}");
    save_png(OUTPUT_PATH_MANDELBROT, &framebuffer, padded_width, HEIGHT)?;

    Ok(())
}

fn save_png(path: &str, framebuffer: &Framebuffer, width: u32, height: u32) -> anyhow::Result<()> {
    image::save_buffer(
        path,
        framebuffer.bytes(),
        width,
        height,
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("writing {path}"))
}
