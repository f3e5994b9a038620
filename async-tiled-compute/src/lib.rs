pub mod executor;
pub mod kernels;
pub mod launcher;
pub mod transaction;

pub use executor::{spawn_thread, wait_all, SpawnError, TaskError, TaskHandle, TaskPool};
pub use kernels::clear::{clear_async_tiled, clear_tile};
pub use kernels::mandelbrot::{mandelbrot_async_tiled, MandelbrotParams};
pub use launcher::{launch_owning_tiles, launch_tiles, LaunchError, TileLaunch};
pub use transaction::{NewestTransaction, TransactionId};

// Re-export core types for convenience
pub use async_tiled_core::*;
