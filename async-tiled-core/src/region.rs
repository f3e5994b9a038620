use serde::{Deserialize, Serialize};

/// View rectangle in world (complex-plane) coordinates: a centre plus
/// extents. Y is up — `top()` is the greater Y edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region2D {
    pub centre_x: f64,
    pub centre_y: f64,
    pub width: f64,
    pub height: f64,
    /// Reserved; always 0 today.
    pub rotation: f64,
}

impl Region2D {
    pub fn new(centre_x: f64, centre_y: f64, width: f64, height: f64) -> Self {
        Self {
            centre_x,
            centre_y,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Initial region of interest around the classical Mandelbrot area:
    /// centred at (-0.5, 0), aspect-corrected to the visible size with
    /// each dimension at least 3.0.
    pub fn fit_to_aspect(visible_w: f64, visible_h: f64) -> Self {
        let ratio = visible_w / visible_h;
        let mut height = 3.0;
        let mut width = height * ratio;
        if width < 3.0 {
            width = 3.0;
            height = width / ratio;
        }
        Self::new((-2.0 + 1.0) * 0.5, 0.0, width, height)
    }

    pub fn left(&self) -> f64 {
        self.centre_x - self.width * 0.5
    }

    pub fn right(&self) -> f64 {
        self.centre_x + self.width * 0.5
    }

    pub fn bottom(&self) -> f64 {
        self.centre_y - self.height * 0.5
    }

    pub fn top(&self) -> f64 {
        self.centre_y + self.height * 0.5
    }

    /// Move the centre by a screen-space drag: world delta is the screen
    /// delta scaled by region-extent-per-visible-pixel, and the region
    /// moves against the drag.
    pub fn pan_by_screen_delta(&mut self, delta: (f64, f64), visible: (f64, f64)) {
        let scale_x = self.width / visible.0;
        let scale_y = self.height / visible.1;
        self.centre_x -= delta.0 * scale_x;
        self.centre_y -= delta.1 * scale_y;
    }

    /// Same centre, extents multiplied by `factor` (0.5 zooms in, 2.0
    /// zooms out).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
            ..*self
        }
    }
}
