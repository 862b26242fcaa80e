use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::geometry::Vec2;
use crate::image_names::validate_image_name;

use super::canvas::{self, LoadedSprite};
use super::rasterizer::{DrawCommand, Rasterizer, TextureHandle};
use super::Viewport;

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];

/// PNG sprites loaded on demand from `<asset root>/sprites/<name>.png`.
pub(crate) struct SpriteStore {
    asset_root: PathBuf,
    sprites: Vec<LoadedSprite>,
    handles_by_name: HashMap<String, Option<TextureHandle>>,
    warned_names: HashSet<String>,
}

impl SpriteStore {
    pub(crate) fn new(asset_root: PathBuf) -> Self {
        Self {
            asset_root,
            sprites: Vec::new(),
            handles_by_name: HashMap::new(),
            warned_names: HashSet::new(),
        }
    }

    pub(crate) fn load(&mut self, name: &str) -> Option<TextureHandle> {
        if let Some(cached) = self.handles_by_name.get(name) {
            return *cached;
        }
        let handle = match resolve_sprite_image_path(&self.asset_root, name) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => {
                    self.sprites.push(sprite);
                    Some(TextureHandle(self.sprites.len() as u32 - 1))
                }
                Err(reason) => {
                    warn_sprite_load_once(&mut self.warned_names, name, Some(&path), &reason);
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(&mut self.warned_names, name, None, &reason);
                None
            }
        };
        self.handles_by_name.insert(name.to_string(), handle);
        handle
    }

    pub(crate) fn get(&self, handle: TextureHandle) -> Option<&LoadedSprite> {
        self.sprites.get(handle.0 as usize)
    }
}

/// Software rasterizer presenting through `pixels` into a `winit` window.
///
/// The frame buffer keeps the scene's fixed screen size; the window surface
/// may differ and `pixels` scales between them.
pub struct PixelsRasterizer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer: Viewport,
    store: SpriteStore,
    frame: Vec<DrawCommand>,
}

impl PixelsRasterizer {
    pub fn new(window: Arc<Window>, buffer: Viewport, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), buffer, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            buffer,
            store: SpriteStore::new(asset_root),
            frame: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), self.buffer, width, height)?;
        Ok(())
    }

    /// Maps a window position (physical pixels) onto the frame buffer, clamped to its edges.
    pub fn window_to_buffer(&self, x: f32, y: f32) -> Vec2 {
        let (px, py) = match self.pixels.window_pos_to_pixel((x, y)) {
            Ok((px, py)) => (px as f32, py as f32),
            Err((px, py)) => (
                px.clamp(0, self.buffer.width as isize - 1) as f32,
                py.clamp(0, self.buffer.height as isize - 1) as f32,
            ),
        };
        Vec2::new(px, py)
    }

    pub fn present(&mut self) -> Result<(), Error> {
        let (width, height) = (self.buffer.width, self.buffer.height);
        let frame = self.pixels.frame_mut();
        canvas::clear(frame, CLEAR_COLOR);
        for command in &self.frame {
            match command {
                DrawCommand::Sprite {
                    texture,
                    rect,
                    rotation_radians,
                    ..
                } => {
                    let Some(sprite) = texture.and_then(|handle| self.store.get(handle)) else {
                        continue;
                    };
                    canvas::draw_sprite_transformed(
                        frame,
                        width,
                        height,
                        sprite,
                        *rect,
                        *rotation_radians,
                    );
                }
                DrawCommand::Outline { shape, color } => {
                    canvas::draw_outline(frame, width, height, shape, *color);
                }
            }
        }
        self.pixels.render()
    }

    fn build_pixels(
        window: Arc<Window>,
        buffer: Viewport,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(buffer.width, buffer.height, surface)
    }
}

impl Rasterizer for PixelsRasterizer {
    fn load_texture(&mut self, name: &str) -> Option<TextureHandle> {
        self.store.load(name)
    }

    fn submit(&mut self, frame: &[DrawCommand]) {
        self.frame.clear();
        self.frame.extend_from_slice(frame);
    }
}

fn resolve_sprite_image_path(asset_root: &Path, name: &str) -> Result<PathBuf, String> {
    validate_image_name(name).map_err(|error| format!("invalid_name:{error}"))?;
    Ok(asset_root.join("sprites").join(format!("{name}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_names: &mut HashSet<String>,
    name: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_names.insert(name.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        image = name,
        path = %path_display,
        reason = reason,
        "sprite_load_failed_drawing_blank"
    );
}
