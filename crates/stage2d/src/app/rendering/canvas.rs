use crate::app::geometry::{Rect, Vec2};

use super::rasterizer::OutlineShape;

pub(crate) struct LoadedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

pub(crate) fn clear(frame: &mut [u8], color: [u8; 4]) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&color);
    }
}

pub(crate) fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width as usize)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

/// Liang-Barsky clip of a segment against the pixel centres of a `width` x `height`
/// frame, widened by half a pixel so rounding stays inside. `None` when nothing is left.
fn clip_segment(from: Vec2, to: Vec2, width: u32, height: u32) -> Option<((i32, i32), (i32, i32))> {
    let (x0, y0) = (f64::from(from.x), f64::from(from.y));
    let (dx, dy) = (f64::from(to.x) - x0, f64::from(to.y) - y0);
    let (min, max_x, max_y) = (-0.5, f64::from(width) - 0.5, f64::from(height) - 0.5);

    let mut enter = 0.0_f64;
    let mut exit = 1.0_f64;
    for (p, q) in [
        (-dx, x0 - min),
        (dx, max_x - x0),
        (-dy, y0 - min),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }

    let pixel = |t: f64| {
        let x = (x0 + dx * t).round().clamp(0.0, f64::from(width) - 1.0);
        let y = (y0 + dy * t).round().clamp(0.0, f64::from(height) - 1.0);
        (x as i32, y as i32)
    };
    Some((pixel(enter), pixel(exit)))
}

/// Bresenham line, clipped to the frame first so the walk is at most one frame across.
pub(crate) fn draw_line_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    from: Vec2,
    to: Vec2,
    color: [u8; 4],
) {
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return;
    }
    if !from.is_finite() || !to.is_finite() {
        return;
    }
    let Some(((mut x0, mut y0), (x1, y1))) = clip_segment(from, to, width, height) else {
        return;
    };
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let step_x = if x0 < x1 { 1 } else { -1 };
    let step_y = if y0 < y1 { 1 } else { -1 };
    let mut error = dx + dy;
    let max_steps = (dx - dy) as usize + 1;

    for _ in 0..max_steps {
        write_pixel_rgba_clipped(frame, width, height, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x0 += step_x;
        }
        if doubled <= dx {
            error += dx;
            y0 += step_y;
        }
    }
}

pub(crate) fn draw_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    shape: &OutlineShape,
    color: [u8; 4],
) {
    match shape {
        OutlineShape::Polygon(points) => {
            if points.len() < 2 {
                return;
            }
            for (index, from) in points.iter().enumerate() {
                let to = points[(index + 1) % points.len()];
                draw_line_clipped(frame, width, height, *from, to, color);
            }
        }
        OutlineShape::Circle { center, radius } => {
            if !radius.is_finite() || *radius <= 0.0 {
                return;
            }
            let segments = ((radius * std::f32::consts::TAU).ceil() as usize).clamp(12, 256);
            let point_at = |index: usize| {
                let theta = index as f32 / segments as f32 * std::f32::consts::TAU;
                *center + Vec2::new(theta.cos(), theta.sin()) * *radius
            };
            for index in 0..segments {
                draw_line_clipped(
                    frame,
                    width,
                    height,
                    point_at(index),
                    point_at(index + 1),
                    color,
                );
            }
        }
    }
}

/// Nearest-neighbour blit of `sprite` stretched over `dest`, rotated about its centre.
pub(crate) fn draw_sprite_transformed(
    frame: &mut [u8],
    width: u32,
    height: u32,
    sprite: &LoadedSprite,
    dest: Rect,
    rotation_radians: f32,
) {
    if sprite.width == 0 || sprite.height == 0 || width == 0 || height == 0 {
        return;
    }
    if dest.width <= 0.0 || dest.height <= 0.0 || !dest.width.is_finite() {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }

    let center = Vec2::new(dest.x + dest.width * 0.5, dest.y + dest.height * 0.5);
    let (sin, cos) = rotation_radians.sin_cos();
    let half_w = dest.width * 0.5;
    let half_h = dest.height * 0.5;
    let bound_w = half_w * cos.abs() + half_h * sin.abs();
    let bound_h = half_w * sin.abs() + half_h * cos.abs();

    let draw_left = ((center.x - bound_w).floor() as i32).max(0);
    let draw_top = ((center.y - bound_h).floor() as i32).max(0);
    let draw_right = ((center.x + bound_w).ceil() as i32).min(width as i32);
    let draw_bottom = ((center.y + bound_h).ceil() as i32).min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let sprite_width = sprite.width as usize;
    let frame_width = width as usize;
    for out_y in draw_top..draw_bottom {
        for out_x in draw_left..draw_right {
            let sample = Vec2::new(out_x as f32 + 0.5, out_y as f32 + 0.5) - center;
            let local = sample.rotated(-rotation_radians);
            let u = (local.x + half_w) / dest.width;
            let v = (local.y + half_h) / dest.height;
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                continue;
            }
            let src_x = ((u * sprite.width as f32) as usize).min(sprite_width - 1);
            let src_y = ((v * sprite.height as f32) as usize).min(sprite.height as usize - 1);
            let src_offset = (src_y * sprite_width + src_x) * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let dst_offset = (out_y as usize * frame_width + out_x as usize) * 4;
            frame[dst_offset..dst_offset + 4]
                .copy_from_slice(&sprite.rgba[src_offset..src_offset + 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::camera::Camera2D;
    use crate::app::diagnostics::Diagnostics;
    use crate::app::physics::BodyShape;
    use crate::app::rendering::{outline_for, Viewport};

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn two_tone_sprite() -> LoadedSprite {
        // 2x1: red on the left, blue on the right.
        LoadedSprite {
            width: 2,
            height: 1,
            rgba: [RED, BLUE].concat(),
        }
    }

    #[test]
    fn clipped_writes_ignore_out_of_bounds() {
        let mut frame = vec![0; 4 * 4 * 4];
        write_pixel_rgba_clipped(&mut frame, 4, 4, -1, 0, RED);
        write_pixel_rgba_clipped(&mut frame, 4, 4, 4, 0, RED);
        write_pixel_rgba_clipped(&mut frame, 4, 4, 0, 4, RED);
        assert!(frame.iter().all(|byte| *byte == 0));

        write_pixel_rgba_clipped(&mut frame, 4, 4, 3, 3, RED);
        assert_eq!(pixel(&frame, 4, 3, 3), RED);
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut frame = vec![0; 10 * 10 * 4];
        draw_line_clipped(
            &mut frame,
            10,
            10,
            Vec2::new(1.0, 1.0),
            Vec2::new(8.0, 5.0),
            RED,
        );
        assert_eq!(pixel(&frame, 10, 1, 1), RED);
        assert_eq!(pixel(&frame, 10, 8, 5), RED);
    }

    #[test]
    fn line_through_the_frame_is_clipped_to_it() {
        let mut frame = vec![0; 10 * 10 * 4];
        draw_line_clipped(
            &mut frame,
            10,
            10,
            Vec2::new(-1.5e9, 5.0),
            Vec2::new(1.5e9, 5.0),
            RED,
        );
        assert!((0..10).all(|x| pixel(&frame, 10, x, 5) == RED));
        assert_eq!(pixel(&frame, 10, 0, 4), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 10, 9, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn line_outside_the_frame_draws_nothing() {
        let mut frame = vec![0; 10 * 10 * 4];
        draw_line_clipped(
            &mut frame,
            10,
            10,
            Vec2::new(-1.5e9, -1.5e9),
            Vec2::new(1.5e9, -1.5e9),
            RED,
        );
        draw_line_clipped(
            &mut frame,
            10,
            10,
            Vec2::new(-1.5e9, 20.0),
            Vec2::new(30.0, 1.5e9),
            RED,
        );
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn outline_at_extreme_zoom_stays_outside_a_small_frame() {
        let mut camera = Camera2D::new(
            Vec2::new(100.0, 100.0),
            Viewport {
                width: 10,
                height: 10,
            },
            1.0,
            Diagnostics::silent(),
        );
        camera.set_focus(50.0, 50.0);
        camera.set_scale(1.5e9);
        let shape = BodyShape::Rectangle {
            width: 2.0,
            height: 2.0,
        };
        let outline = outline_for(&shape, camera.focus(), 0.0, &camera);

        let mut frame = vec![0; 10 * 10 * 4];
        draw_outline(&mut frame, 10, 10, &outline, RED);
        assert!(frame.iter().all(|byte| *byte == 0));

        let circle = outline_for(&BodyShape::Circle { radius: 1.0 }, camera.focus(), 0.0, &camera);
        draw_outline(&mut frame, 10, 10, &circle, RED);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn sprite_stretches_over_destination() {
        let mut frame = vec![0; 8 * 4 * 4];
        draw_sprite_transformed(
            &mut frame,
            8,
            4,
            &two_tone_sprite(),
            Rect::new(0.0, 0.0, 8.0, 4.0),
            0.0,
        );
        assert_eq!(pixel(&frame, 8, 0, 0), RED);
        assert_eq!(pixel(&frame, 8, 3, 3), RED);
        assert_eq!(pixel(&frame, 8, 4, 0), BLUE);
        assert_eq!(pixel(&frame, 8, 7, 3), BLUE);
    }

    #[test]
    fn half_turn_mirrors_sprite() {
        let mut frame = vec![0; 8 * 4 * 4];
        draw_sprite_transformed(
            &mut frame,
            8,
            4,
            &two_tone_sprite(),
            Rect::new(0.0, 0.0, 8.0, 4.0),
            std::f32::consts::PI,
        );
        assert_eq!(pixel(&frame, 8, 0, 1), BLUE);
        assert_eq!(pixel(&frame, 8, 7, 1), RED);
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let mut frame = vec![9; 2 * 2 * 4];
        let sprite = LoadedSprite {
            width: 1,
            height: 1,
            rgba: vec![255, 255, 255, 0],
        };
        draw_sprite_transformed(&mut frame, 2, 2, &sprite, Rect::new(0.0, 0.0, 2.0, 2.0), 0.0);
        assert!(frame.iter().all(|byte| *byte == 9));
    }

    #[test]
    fn offscreen_sprite_is_a_no_op() {
        let mut frame = vec![0; 4 * 4 * 4];
        draw_sprite_transformed(
            &mut frame,
            4,
            4,
            &two_tone_sprite(),
            Rect::new(100.0, 100.0, 4.0, 4.0),
            0.3,
        );
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn circle_outline_touches_its_rightmost_point() {
        let mut frame = vec![0; 20 * 20 * 4];
        draw_outline(
            &mut frame,
            20,
            20,
            &OutlineShape::Circle {
                center: Vec2::new(10.0, 10.0),
                radius: 5.0,
            },
            RED,
        );
        assert_eq!(pixel(&frame, 20, 15, 10), RED);
        assert_eq!(pixel(&frame, 20, 0, 0), [0, 0, 0, 0]);
    }
}
