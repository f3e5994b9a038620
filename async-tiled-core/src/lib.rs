pub mod framebuffer;
pub mod pixel;
pub mod points;
pub mod region;
pub mod tile;

pub use framebuffer::{round_up_to_cacheline, Framebuffer};
pub use pixel::{Rgba, TileFormat};
pub use points::{Dims2u, Point2u};
pub use region::Region2D;
pub use tile::{pixel_dims, Tile, TileBacking, TileSpec};
