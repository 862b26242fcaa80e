mod canvas;
mod rasterizer;
mod renderer;

pub use rasterizer::{
    outline_for, DrawCommand, HeadlessRasterizer, OutlineShape, Rasterizer, TextureHandle,
};
pub use renderer::PixelsRasterizer;

/// Fixed pixel size of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}
