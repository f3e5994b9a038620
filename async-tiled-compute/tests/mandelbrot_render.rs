use async_tiled_compute::{
    mandelbrot_async_tiled, wait_all, Dims2u, Framebuffer, MandelbrotParams, NewestTransaction,
    Rgba, TaskPool, TileFormat, TileSpec,
};
use std::time::Instant;

/// Bounds of the classical region of interest.
fn reference_params(max_iterations: u32) -> MandelbrotParams {
    MandelbrotParams {
        left: -2.0,
        right: 1.0,
        top: 1.5001,
        bottom: -1.4999,
        max_iterations,
    }
}

#[test]
fn full_frame_render_has_interior_and_exterior() {
    let pool = TaskPool::new();
    let grid = Dims2u::new(64, 48);
    let spec = TileSpec::new(TileFormat::Rgba8888, 32, 32, 2048 * Rgba::BYTES);
    let framebuffer = Framebuffer::with_pixel_count(2048 * 1536);

    let launch = mandelbrot_async_tiled(
        &pool,
        reference_params(32),
        0,
        NewestTransaction::new(),
        grid,
        spec,
        &framebuffer,
    )
    .expect("launch mandelbrot");
    assert_eq!(launch.tile_count(), 64 * 48);
    wait_all(launch.handles).expect("mandelbrot tasks");

    let pixels = framebuffer.pixels();

    // The framebuffer centre maps to c = (-0.5, 0.0001), inside the main
    // cardioid: full iteration budget, grey 0.
    let centre = pixels[768 * 2048 + 1024];
    assert_eq!(centre, Rgba::grey(0));

    // The upper-left corner maps to c = (-2, 1.5001), which trips the
    // divergence test on its third update: grey 255/32 * 30 = 239.
    assert_eq!(pixels[0], Rgba::grey(239));

    // With the |re·im| divergence test nothing inside these bounds can
    // escape on the very first iteration, so grey 239 is the brightest
    // band. Interior, brightest band and the rest all non-empty.
    let interior = pixels.iter().filter(|&&p| p == Rgba::grey(0)).count();
    let brightest = pixels.iter().filter(|&&p| p == Rgba::grey(239)).count();
    let escaped = pixels.iter().filter(|&&p| p != Rgba::grey(0)).count();
    assert!(interior > 0, "no interior pixels");
    assert!(brightest > 0, "no fast-escape pixels");
    assert!(escaped > 0 && escaped < pixels.len(), "degenerate image");
    assert!(
        pixels.iter().all(|&p| p.a == 255),
        "kernel must emit opaque pixels"
    );
}

#[test]
fn render_is_deterministic() {
    let pool = TaskPool::with_workers(4);
    let grid = Dims2u::new(8, 8);
    let spec = TileSpec::new(TileFormat::Rgba8888, 16, 16, 128 * Rgba::BYTES);

    let render = || {
        let framebuffer = Framebuffer::with_pixel_count(128 * 128);
        let launch = mandelbrot_async_tiled(
            &pool,
            reference_params(64),
            0,
            NewestTransaction::new(),
            grid,
            spec,
            &framebuffer,
        )
        .expect("launch mandelbrot");
        wait_all(launch.handles).expect("mandelbrot tasks");
        framebuffer.bytes().to_vec()
    };

    assert_eq!(render(), render());
}

#[test]
fn stale_transaction_prevents_any_pixel_writes() {
    let pool = TaskPool::with_workers(4);
    let grid = Dims2u::new(4, 4);
    let spec = TileSpec::new(TileFormat::Rgba8888, 16, 16, 64 * Rgba::BYTES);
    let framebuffer = Framebuffer::with_pixel_count(64 * 64);

    // Superseded before any kernel can begin: every task sees a stale
    // transaction at its first scanline and writes nothing.
    let newest = NewestTransaction::new();
    let origin = newest.current();
    newest.bump();

    let launch = mandelbrot_async_tiled(
        &pool,
        reference_params(1024),
        origin,
        newest,
        grid,
        spec,
        &framebuffer,
    )
    .expect("launch mandelbrot");
    wait_all(launch.handles).expect("mandelbrot tasks");

    assert!(
        framebuffer.bytes().iter().all(|&b| b == 0),
        "cancelled generation must leave the framebuffer untouched"
    );
}

#[test]
fn supersession_mid_flight_abandons_pending_tiles_quickly() {
    // Two workers chew through a 16-tile generation with a heavy
    // iteration budget; as soon as the first tile completes, the
    // transaction moves on. Tiles that never started stay entirely
    // blank, and the join returns promptly because the rest self-abort.
    let pool = TaskPool::with_workers(2);
    let grid = Dims2u::new(4, 4);
    let spec = TileSpec::new(TileFormat::Rgba8888, 64, 64, 256 * Rgba::BYTES);
    let framebuffer = Framebuffer::with_pixel_count(256 * 256);

    let newest = NewestTransaction::new();
    let launch = mandelbrot_async_tiled(
        &pool,
        reference_params(1024),
        0,
        newest.clone(),
        grid,
        spec,
        &framebuffer,
    )
    .expect("launch mandelbrot");

    let mut handles = launch.handles.into_iter();
    let first = handles.next().expect("sixteen handles");
    first.wait().expect("first tile");
    newest.bump();

    let join_started = Instant::now();
    for handle in handles {
        handle.wait().expect("remaining tiles");
    }
    assert!(
        join_started.elapsed().as_secs() < 10,
        "abandoned tiles should drain quickly"
    );

    // At least one scanline somewhere was never touched. Alpha is 255 on
    // every written pixel, so an all-zero row is proof of abandonment.
    let pixels = framebuffer.pixels();
    let untouched_rows = (0..256)
        .filter(|&y| (0..256).all(|x| pixels[y * 256 + x] == Rgba::default()))
        .count();
    assert!(
        untouched_rows > 0,
        "expected at least one fully-untouched scanline after supersession"
    );
}
