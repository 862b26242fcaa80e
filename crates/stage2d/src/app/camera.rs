use super::diagnostics::Diagnostics;
use super::geometry::{Rect, Vec2};
use super::rendering::Viewport;

/// Maps between world meters and screen pixels over a bounded world.
///
/// The world rectangle always starts at the origin. `focus` is the world
/// point at the centre of the screen and is clamped per axis so the visible
/// rectangle never leaves the world on an axis where it fits.
#[derive(Debug, Clone)]
pub struct Camera2D {
    min: Vec2,
    max: Vec2,
    focus: Vec2,
    scale: f32,
    screen: Viewport,
    visible_extent: Vec2,
    diagnostics: Diagnostics,
}

impl Camera2D {
    pub fn new(world_size: Vec2, screen: Viewport, scale: f32, diagnostics: Diagnostics) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            diagnostics.urgent("camera_scale_rejected", format_args!("scale={scale}"));
            1.0
        };
        let visible_extent = extent_for(screen, scale);
        let camera = Self {
            min: Vec2::ZERO,
            max: world_size,
            focus: visible_extent * 0.5,
            scale,
            screen,
            visible_extent,
            diagnostics,
        };
        camera.validate_extent();
        camera
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn focus(&self) -> Vec2 {
        self.focus
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.min, self.max)
    }

    pub fn screen(&self) -> Viewport {
        self.screen
    }

    pub fn visible_extent(&self) -> Vec2 {
        self.visible_extent
    }

    /// World position of the screen's top-left pixel.
    pub fn offset(&self) -> Vec2 {
        self.focus - self.visible_extent * 0.5
    }

    pub fn visible_rect(&self) -> Rect {
        let offset = self.offset();
        Rect::new(
            offset.x,
            offset.y,
            self.visible_extent.x,
            self.visible_extent.y,
        )
    }

    pub fn set_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            self.diagnostics
                .urgent("camera_scale_rejected", format_args!("scale={scale}"));
            return;
        }
        self.scale = scale;
        self.visible_extent = extent_for(self.screen, scale);
        self.validate_extent();
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_scale(self.scale * factor);
    }

    /// Resizes the world; a non-positive or non-finite size is reported and ignored.
    pub fn set_bounds(&mut self, max_x: f32, max_y: f32) {
        let valid = |edge: f32| edge.is_finite() && edge > 0.0;
        if !valid(max_x) || !valid(max_y) {
            self.diagnostics.urgent(
                "camera_bounds_rejected",
                format_args!("max={max_x}x{max_y}"),
            );
            return;
        }
        self.max = Vec2::new(max_x, max_y);
        self.validate_extent();
    }

    /// Moves the focus; each axis only moves if the visible rectangle stays in bounds.
    pub fn set_focus(&mut self, x: f32, y: f32) {
        let half = self.visible_extent * 0.5;
        if axis_fits(x, half.x, self.min.x, self.max.x) {
            self.focus.x = x;
        }
        if axis_fits(y, half.y, self.min.y, self.max.y) {
            self.focus.y = y;
        }
    }

    pub fn to_world(&self, screen_x: f32, screen_y: f32) -> Vec2 {
        let offset = self.offset();
        Vec2::new(
            screen_x / self.scale + offset.x,
            screen_y / self.scale + offset.y,
        )
    }

    pub fn to_screen(&self, world_x: f32, world_y: f32) -> Vec2 {
        let offset = self.offset();
        Vec2::new(
            (world_x - offset.x) * self.scale,
            (world_y - offset.y) * self.scale,
        )
    }

    /// Draw culling only; simulation never consults this.
    pub fn is_visible(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        self.visible_rect()
            .overlaps(&Rect::new(x, y, width, height))
    }

    fn validate_extent(&self) {
        let world = self.max - self.min;
        if self.visible_extent.x > world.x || self.visible_extent.y > world.y {
            self.diagnostics.urgent(
                "camera_visible_area_exceeds_world",
                format_args!(
                    "visible={}x{} world={}x{}",
                    self.visible_extent.x, self.visible_extent.y, world.x, world.y
                ),
            );
        }
    }
}

fn extent_for(screen: Viewport, scale: f32) -> Vec2 {
    Vec2::new(screen.width as f32 / scale, screen.height as f32 / scale)
}

fn axis_fits(center: f32, half_extent: f32, min: f32, max: f32) -> bool {
    center.is_finite() && center - half_extent >= min && center + half_extent <= max
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::app::diagnostics::{MemorySink, Verbosity};

    fn camera_with_sink(world: Vec2, scale: f32) -> (Camera2D, Rc<MemorySink>) {
        let sink = Rc::new(MemorySink::default());
        let camera = Camera2D::new(
            world,
            Viewport {
                width: 480,
                height: 320,
            },
            scale,
            Diagnostics::new(sink.clone(), Verbosity::All),
        );
        (camera, sink)
    }

    fn approx_eq_vec2(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 0.001 && (a.y - b.y).abs() < 0.001
    }

    #[test]
    fn visible_extent_follows_scale() {
        let (mut camera, _) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        assert_eq!(camera.visible_extent(), Vec2::new(24.0, 16.0));

        camera.set_scale(40.0);
        assert_eq!(camera.visible_extent(), Vec2::new(12.0, 8.0));
    }

    #[test]
    fn initial_focus_anchors_visible_rect_at_origin() {
        let (camera, _) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        assert_eq!(camera.offset(), Vec2::ZERO);
        assert_eq!(camera.focus(), Vec2::new(12.0, 8.0));
    }

    #[test]
    fn screen_world_round_trip_for_several_scales() {
        for scale in [0.5_f32, 1.0, 7.25, 20.0, 64.0] {
            let (mut camera, _) = camera_with_sink(Vec2::new(2000.0, 2000.0), scale);
            let extent = camera.visible_extent();
            camera.set_focus(extent.x * 0.5 + 3.0, extent.y * 0.5 + 1.5);
            for (x, y) in [(0.0, 0.0), (4.5, 9.25), (17.0, 3.0), (123.4, 56.7)] {
                let screen = camera.to_screen(x, y);
                let back = camera.to_world(screen.x, screen.y);
                assert!(
                    approx_eq_vec2(back, Vec2::new(x, y)),
                    "scale={scale} x={x} y={y}"
                );
            }
        }
    }

    #[test]
    fn to_world_applies_focus_offset() {
        let (mut camera, _) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        camera.set_focus(30.0, 20.0);
        // offset = focus - extent / 2 = (18, 12)
        let world = camera.to_world(40.0, 60.0);
        assert!(approx_eq_vec2(world, Vec2::new(20.0, 15.0)));
    }

    #[test]
    fn focus_rejected_axis_leaves_other_axis_free() {
        let (mut camera, _) = camera_with_sink(Vec2::new(100.0, 20.0), 20.0);
        let before = camera.focus();

        // y=19 would push the bottom edge to 27 > 20; x=50 is fine.
        camera.set_focus(50.0, 19.0);
        assert_eq!(camera.focus().x, 50.0);
        assert_eq!(camera.focus().y, before.y);

        // x=5 would push the left edge below zero; y=10 is fine.
        camera.set_focus(5.0, 10.0);
        assert_eq!(camera.focus().x, 50.0);
        assert_eq!(camera.focus().y, 10.0);
    }

    #[test]
    fn focus_exactly_at_bounds_is_accepted() {
        let (mut camera, _) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        camera.set_focus(100.0 - 12.0, 100.0 - 8.0);
        assert_eq!(camera.focus(), Vec2::new(88.0, 92.0));
        assert_eq!(camera.offset(), Vec2::new(76.0, 84.0));
    }

    #[test]
    fn oversized_visible_area_warns_without_clamping() {
        let (mut camera, sink) = camera_with_sink(Vec2::new(10.0, 10.0), 20.0);
        assert_eq!(sink.count("camera_visible_area_exceeds_world"), 1);
        assert_eq!(camera.visible_extent(), Vec2::new(24.0, 16.0));

        camera.set_bounds(50.0, 50.0);
        assert_eq!(sink.count("camera_visible_area_exceeds_world"), 1);

        camera.set_scale(5.0);
        assert_eq!(sink.count("camera_visible_area_exceeds_world"), 2);
        assert_eq!(camera.scale(), 5.0);
    }

    #[test]
    fn invalid_scale_is_ignored() {
        let (mut camera, sink) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        camera.set_scale(0.0);
        camera.set_scale(f32::NAN);
        assert_eq!(camera.scale(), 20.0);
        assert_eq!(sink.count("camera_scale_rejected"), 2);
    }

    #[test]
    fn invalid_bounds_are_ignored() {
        let (mut camera, sink) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        camera.set_bounds(-5.0, 50.0);
        camera.set_bounds(50.0, f32::INFINITY);
        camera.set_bounds(f32::NAN, 0.0);
        assert_eq!(camera.bounds(), (Vec2::ZERO, Vec2::new(100.0, 100.0)));
        assert_eq!(sink.count("camera_bounds_rejected"), 3);

        camera.set_bounds(60.0, 40.0);
        assert_eq!(camera.bounds().1, Vec2::new(60.0, 40.0));
        assert_eq!(sink.count("camera_bounds_rejected"), 3);
    }

    #[test]
    fn visibility_boundary_is_inclusive() {
        let (camera, _) = camera_with_sink(Vec2::new(100.0, 100.0), 20.0);
        // Visible rect is (0,0)-(24,16).
        assert!(camera.is_visible(24.0, 0.0, 2.0, 2.0));
        assert!(camera.is_visible(-2.0, -2.0, 2.0, 2.0));
        assert!(camera.is_visible(0.0, 0.0, 24.0, 16.0));
        assert!(!camera.is_visible(24.5, 0.0, 2.0, 2.0));
        assert!(!camera.is_visible(0.0, 40.0, 2.0, 2.0));
    }
}
