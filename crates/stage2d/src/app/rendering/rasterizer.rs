use std::collections::HashMap;

use crate::app::camera::Camera2D;
use crate::app::geometry::{Rect, Vec2};
use crate::app::physics::BodyShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum OutlineShape {
    /// Closed loop of screen points.
    Polygon(Vec<Vec2>),
    Circle { center: Vec2, radius: f32 },
}

/// One screen-space draw, emitted in z-order.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Sprite {
        /// `None` draws nothing: the image name did not resolve to a texture.
        texture: Option<TextureHandle>,
        image: String,
        rect: Rect,
        rotation_radians: f32,
    },
    Outline {
        shape: OutlineShape,
        color: [u8; 4],
    },
}

/// The drawing backend the scene renders through.
pub trait Rasterizer {
    fn load_texture(&mut self, name: &str) -> Option<TextureHandle>;
    /// Receives the complete frame, back to front.
    fn submit(&mut self, frame: &[DrawCommand]);
}

/// Keeps submitted frames in memory; textures resolve only for registered names.
#[derive(Debug, Default)]
pub struct HeadlessRasterizer {
    textures: HashMap<String, TextureHandle>,
    load_requests: Vec<String>,
    last_frame: Vec<DrawCommand>,
    frames_submitted: u64,
}

impl HeadlessRasterizer {
    pub fn with_textures<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut rasterizer = Self::default();
        for name in names {
            rasterizer.register(name);
        }
        rasterizer
    }

    pub fn register(&mut self, name: &str) -> TextureHandle {
        let next = TextureHandle(self.textures.len() as u32);
        *self.textures.entry(name.to_string()).or_insert(next)
    }

    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    pub fn load_requests(&self) -> &[String] {
        &self.load_requests
    }

    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

impl Rasterizer for HeadlessRasterizer {
    fn load_texture(&mut self, name: &str) -> Option<TextureHandle> {
        self.load_requests.push(name.to_string());
        self.texture(name)
    }

    fn submit(&mut self, frame: &[DrawCommand]) {
        self.last_frame = frame.to_vec();
        self.frames_submitted = self.frames_submitted.saturating_add(1);
    }
}

/// Debug outline of a body shape, projected to the screen.
pub fn outline_for(shape: &BodyShape, center: Vec2, angle: f32, camera: &Camera2D) -> OutlineShape {
    let project = |local: Vec2| {
        let world = center + local.rotated(angle);
        camera.to_screen(world.x, world.y)
    };
    match shape {
        BodyShape::Rectangle { width, height } => {
            let (hw, hh) = (width * 0.5, height * 0.5);
            OutlineShape::Polygon(
                [
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                ]
                .into_iter()
                .map(project)
                .collect(),
            )
        }
        BodyShape::Circle { radius } => OutlineShape::Circle {
            center: camera.to_screen(center.x, center.y),
            radius: radius * camera.scale(),
        },
        BodyShape::Polygon { points } => {
            OutlineShape::Polygon(points.iter().copied().map(project).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::diagnostics::Diagnostics;
    use crate::app::rendering::Viewport;

    fn camera() -> Camera2D {
        Camera2D::new(
            Vec2::new(100.0, 100.0),
            Viewport {
                width: 200,
                height: 100,
            },
            10.0,
            Diagnostics::silent(),
        )
    }

    #[test]
    fn headless_rasterizer_resolves_registered_names_only() {
        let mut rasterizer = HeadlessRasterizer::with_textures(["hero", "coin"]);
        assert_eq!(rasterizer.load_texture("coin"), Some(TextureHandle(1)));
        assert_eq!(rasterizer.load_texture("ghost"), None);
        assert_eq!(rasterizer.load_requests(), ["coin", "ghost"]);
        assert_eq!(rasterizer.register("hero"), TextureHandle(0));
    }

    #[test]
    fn rectangle_outline_has_four_projected_corners() {
        let outline = outline_for(
            &BodyShape::Rectangle {
                width: 2.0,
                height: 1.0,
            },
            Vec2::new(5.0, 5.0),
            0.0,
            &camera(),
        );
        assert_eq!(
            outline,
            OutlineShape::Polygon(vec![
                Vec2::new(40.0, 45.0),
                Vec2::new(60.0, 45.0),
                Vec2::new(60.0, 55.0),
                Vec2::new(40.0, 55.0),
            ])
        );
    }

    #[test]
    fn circle_outline_scales_radius() {
        let outline = outline_for(
            &BodyShape::Circle { radius: 1.5 },
            Vec2::new(2.0, 3.0),
            0.7,
            &camera(),
        );
        assert_eq!(
            outline,
            OutlineShape::Circle {
                center: Vec2::new(20.0, 30.0),
                radius: 15.0,
            }
        );
    }

    #[test]
    fn polygon_outline_keeps_vertex_count() {
        let outline = outline_for(
            &BodyShape::Polygon {
                points: vec![
                    Vec2::new(0.0, -1.0),
                    Vec2::new(1.0, 1.0),
                    Vec2::new(-1.0, 1.0),
                ],
            },
            Vec2::new(5.0, 5.0),
            0.0,
            &camera(),
        );
        match outline {
            OutlineShape::Polygon(points) => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0], Vec2::new(50.0, 40.0));
            }
            OutlineShape::Circle { .. } => panic!("expected polygon"),
        }
    }
}
