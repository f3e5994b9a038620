pub mod clear;
pub mod mandelbrot;
