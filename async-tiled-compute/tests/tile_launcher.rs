use async_tiled_compute::{
    clear_async_tiled, launch_owning_tiles, launch_tiles, wait_all, Dims2u, Framebuffer, Rgba,
    TaskPool, TileFormat, TileSpec,
};
use async_tiled_core::round_up_to_cacheline;

fn rgba_spec(w: u16, h: u16, stride: usize) -> TileSpec {
    TileSpec::new(TileFormat::Rgba8888, w, h, stride)
}

#[test]
fn single_tile_clear_fills_the_whole_framebuffer() {
    let pool = TaskPool::with_workers(2);
    let spec = rgba_spec(32, 32, 32 * Rgba::BYTES);
    let framebuffer = Framebuffer::with_pixel_count(32 * 32);
    let colour = Rgba::new(192, 224, 255, 255);

    let launch = clear_async_tiled(&pool, colour, Dims2u::new(1, 1), spec, &framebuffer)
        .expect("launch clear");
    assert_eq!(launch.tile_count(), 1);
    wait_all(launch.handles).expect("clear tasks");

    assert!(framebuffer.pixels().iter().all(|&p| p == colour));
}

#[test]
fn every_framebuffer_pixel_belongs_to_exactly_one_tile() {
    // Each tile stamps its grid coordinates into its pixels; afterwards
    // every framebuffer pixel must carry the stamp of the one tile whose
    // slice covers it.
    let pool = TaskPool::with_workers(4);
    let grid = Dims2u::new(3, 2);
    let spec = rgba_spec(4, 4, 3 * 4 * Rgba::BYTES);
    let framebuffer = Framebuffer::with_pixel_count(12 * 8);

    let launch = launch_tiles(&pool, spec, grid, &framebuffer, |spec, tile| {
        let stamp = Rgba::new(tile.x as u8, tile.y as u8, 0xAB, 255);
        for y in 0..spec.h {
            tile.row_mut(spec, y).fill(stamp);
        }
    })
    .expect("launch");
    wait_all(launch.handles).expect("stamp tasks");

    let pixels = framebuffer.pixels();
    for py in 0..8u32 {
        for px in 0..12u32 {
            let expected = Rgba::new((px / 4) as u8, (py / 4) as u8, 0xAB, 255);
            assert_eq!(
                pixels[(py * 12 + px) as usize],
                expected,
                "pixel ({px}, {py}) written by the wrong tile"
            );
        }
    }
}

#[test]
fn padded_stride_leaves_padding_untouched() {
    let pool = TaskPool::with_workers(2);
    let grid = Dims2u::new(2, 2);
    let row_bytes = 2 * 4 * Rgba::BYTES; // 32
    let stride = round_up_to_cacheline(row_bytes, 64);
    assert_eq!(stride, 64);
    let spec = rgba_spec(4, 4, stride);
    let framebuffer = Framebuffer::with_byte_len(2 * 4 * stride);
    let colour = Rgba::grey(200);

    let launch =
        clear_async_tiled(&pool, colour, grid, spec, &framebuffer).expect("launch clear");
    wait_all(launch.handles).expect("clear tasks");

    let colour_bytes = [colour.r, colour.g, colour.b, colour.a];
    for (row_index, row) in framebuffer.bytes().chunks(stride).enumerate() {
        let (pixels, padding) = row.split_at(row_bytes);
        assert!(
            pixels.chunks(Rgba::BYTES).all(|p| p == colour_bytes),
            "row {row_index} pixels not cleared"
        );
        assert!(
            padding.iter().all(|&b| b == 0),
            "row {row_index} padding written"
        );
    }
}

#[test]
fn handles_resolve_in_tile_vector_order() {
    let pool = TaskPool::with_workers(4);
    let grid = Dims2u::new(4, 3);
    let spec = rgba_spec(2, 2, 8 * Rgba::BYTES);
    let framebuffer = Framebuffer::with_pixel_count(8 * 6);

    let launch = launch_tiles(&pool, spec, grid, &framebuffer, |_, _| {}).expect("launch");

    let expected: Vec<(u16, u16)> = launch.tiles.iter().map(|t| (t.x, t.y)).collect();
    let row_major: Vec<(u16, u16)> = (0..3)
        .flat_map(|y| (0..4).map(move |x| (x as u16, y as u16)))
        .collect();
    assert_eq!(expected, row_major);

    let completed = wait_all(launch.handles).expect("tasks");
    let completed_coords: Vec<(u16, u16)> = completed.iter().map(|t| (t.x, t.y)).collect();
    assert_eq!(completed_coords, expected);
}

#[test]
fn owning_tiles_carry_their_own_pixels() {
    let pool = TaskPool::with_workers(2);
    let grid = Dims2u::new(2, 2);
    let spec = rgba_spec(4, 4, 4 * Rgba::BYTES);
    let colour = Rgba::new(10, 20, 30, 255);

    let handles = launch_owning_tiles(&pool, spec, grid, move |spec, tile| {
        for y in 0..spec.h {
            tile.row_mut(spec, y).fill(colour);
        }
    })
    .expect("launch owning");

    let tiles = wait_all(handles).expect("owning tasks");
    assert_eq!(tiles.len(), 4);
    for tile in tiles {
        assert_eq!(tile.shared_offset(), None);
        let pixels = tile.copy_pixels(&spec);
        assert!(pixels.iter().all(|&p| p == colour));
    }
}

#[test]
fn owning_tiles_assemble_into_a_framebuffer() {
    // The copy-out path: gather owned tiles into one contiguous image as
    // each completes.
    let pool = TaskPool::with_workers(2);
    let grid = Dims2u::new(2, 2);
    let spec = rgba_spec(2, 2, 2 * Rgba::BYTES);
    let width = 4usize;

    let handles = launch_owning_tiles(&pool, spec, grid, |spec, tile| {
        let stamp = Rgba::new(tile.x as u8, tile.y as u8, 0, 255);
        for y in 0..spec.h {
            tile.row_mut(spec, y).fill(stamp);
        }
    })
    .expect("launch owning");

    let mut assembled = vec![Rgba::default(); width * 4];
    for handle in handles {
        let tile = handle.wait().expect("tile");
        for y in 0..spec.h {
            let dest_y = tile.y as usize * spec.h as usize + y as usize;
            let dest_x = tile.x as usize * spec.w as usize;
            let dest = &mut assembled[dest_y * width + dest_x..][..spec.w as usize];
            dest.copy_from_slice(tile.row(&spec, y));
        }
    }

    for py in 0..4 {
        for px in 0..4 {
            let expected = Rgba::new((px / 2) as u8, (py / 2) as u8, 0, 255);
            assert_eq!(assembled[py * width + px], expected);
        }
    }
}
