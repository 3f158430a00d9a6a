//! Raster rendering: canvas, layer compositing and typography.

pub mod canvas;
pub mod color;
pub mod compositor;
pub mod typography;

pub use canvas::{Canvas, Projection, CANVAS_HEIGHT_PX, CANVAS_WIDTH_PX, POSTER_DPI};
pub use compositor::LayerCompositor;
pub use typography::{FontLibrary, TypographyRenderer};
