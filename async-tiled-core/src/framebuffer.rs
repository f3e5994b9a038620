use crate::pixel::Rgba;
use std::cell::UnsafeCell;
use std::sync::Arc;

/// Round up a byte count to a multiple of the platform cacheline length,
/// so adjacent tile rows do not share a cacheline.
pub const fn round_up_to_cacheline(bytes: usize, cacheline_len: usize) -> usize {
    (bytes / cacheline_len + (bytes % cacheline_len > 0) as usize) * cacheline_len
}

/// Contiguous pixel storage backing one generation of tiles.
///
/// The handle is cheap to clone; clones share the same bytes. Mutation
/// happens only through disjoint row views handed out by tiles built from
/// a tiling function, while compute tasks for that generation are in
/// flight. Whole-buffer reads are valid only once no tile task is writing
/// (after `wait_all`, or once the generation's in-flight count is zero).
#[derive(Clone, Default)]
pub struct Framebuffer {
    storage: Arc<Storage>,
}

#[derive(Default)]
struct Storage {
    bytes: UnsafeCell<Box<[u8]>>,
}

// The storage is shared between the launching thread, tile tasks and the
// UI thread. Disjointness of tile views plus the in-flight hand-off
// protocol keep writers from overlapping each other or any reader.
unsafe impl Sync for Storage {}

impl Framebuffer {
    /// Zero-initialised buffer holding `count` RGBA pixels.
    pub fn with_pixel_count(count: usize) -> Self {
        Self::with_byte_len(count * Rgba::BYTES)
    }

    /// Zero-initialised buffer of `len` bytes.
    pub fn with_byte_len(len: usize) -> Self {
        Self {
            storage: Arc::new(Storage {
                bytes: UnsafeCell::new(vec![0u8; len].into_boxed_slice()),
            }),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes().len()
    }

    pub fn pixel_count(&self) -> usize {
        self.byte_len() / Rgba::BYTES
    }

    /// Read view of the whole buffer. Only valid while no tile task is
    /// writing into it.
    pub fn bytes(&self) -> &[u8] {
        // Safety: shared read; callers hold off until in-flight writers
        // have drained.
        unsafe { &*self.storage.bytes.get() }
    }

    /// Read view of the whole buffer as pixels.
    pub fn pixels(&self) -> &[Rgba] {
        bytemuck::cast_slice(self.bytes())
    }

    /// Mutable view of `len` bytes starting at `offset`.
    ///
    /// # Safety
    /// The caller must guarantee the range is disjoint from every other
    /// live view of this buffer, mutable or shared. Tiles built by a
    /// tiling function uphold this for one another.
    pub unsafe fn byte_range_mut(&self, offset: usize, len: usize) -> &mut [u8] {
        let all = &mut *self.storage.bytes.get();
        debug_assert!(offset + len <= all.len(), "tile view out of bounds");
        &mut all[offset..offset + len]
    }

    /// True when both handles share the same storage.
    pub fn ptr_eq(&self, other: &Framebuffer) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}
