pub mod coordinator;
pub mod grid;
pub mod presenter;
pub mod testing;
pub mod zoom_level;

pub use coordinator::{ZoomCoordinator, MAX_ITERATIONS, TILE_DIMS};
pub use grid::{checkerboard_colour, grid_dims_for_view, SpriteGrid};
pub use presenter::{GridHandle, Presenter, SpriteHandle, TouchEvent, UiClosure};
pub use testing::RecordingPresenter;
pub use zoom_level::ZoomLevel;
