use serde::{Deserialize, Serialize};

/// Width/height pair in pixel or tile units (always u32 coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dims2u {
    pub w: u32,
    pub h: u32,
}

impl Dims2u {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u32 {
        self.w * self.h
    }
}

/// A point in pixel or tile-grid space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point2u {
    pub x: u32,
    pub y: u32,
}

impl Point2u {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}
