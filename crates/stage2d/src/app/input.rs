use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    PanStart,
    PanMove,
    PanStop,
    TouchDown,
    TouchUp,
    Swipe,
}

/// A recognised pointer interaction in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Tap(Vec2),
    PanStart(Vec2),
    PanMove(Vec2),
    PanStop(Vec2),
    TouchDown(Vec2),
    TouchUp(Vec2),
    Swipe { from: Vec2, to: Vec2 },
}

impl Gesture {
    pub fn kind(&self) -> GestureKind {
        match self {
            Gesture::Tap(_) => GestureKind::Tap,
            Gesture::PanStart(_) => GestureKind::PanStart,
            Gesture::PanMove(_) => GestureKind::PanMove,
            Gesture::PanStop(_) => GestureKind::PanStop,
            Gesture::TouchDown(_) => GestureKind::TouchDown,
            Gesture::TouchUp(_) => GestureKind::TouchUp,
            Gesture::Swipe { .. } => GestureKind::Swipe,
        }
    }

    /// The point used to resolve the target actor.
    pub fn anchor(&self) -> Vec2 {
        match *self {
            Gesture::Tap(point)
            | Gesture::PanStart(point)
            | Gesture::PanMove(point)
            | Gesture::PanStop(point)
            | Gesture::TouchDown(point)
            | Gesture::TouchUp(point) => point,
            Gesture::Swipe { from, .. } => from,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Movement in pixels before a press turns into a pan.
    pub touch_slop_px: f32,
    /// Release speed in pixels per second at which a pan also reports a swipe.
    pub swipe_min_speed_px_per_sec: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            touch_slop_px: 8.0,
            swipe_min_speed_px_per_sec: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    origin: Vec2,
    origin_ms: u64,
    last: Vec2,
    panning: bool,
}

/// Turns raw pointer samples into gestures, one press at a time.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    config: GestureConfig,
    press: Option<Press>,
}

impl GestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            press: None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn pointer_down(&mut self, position: Vec2, time_ms: u64) -> Vec<Gesture> {
        self.press = Some(Press {
            origin: position,
            origin_ms: time_ms,
            last: position,
            panning: false,
        });
        vec![Gesture::TouchDown(position)]
    }

    pub fn pointer_moved(&mut self, position: Vec2) -> Vec<Gesture> {
        let Some(press) = self.press.as_mut() else {
            return Vec::new();
        };
        if position == press.last {
            return Vec::new();
        }
        press.last = position;

        if press.panning {
            return vec![Gesture::PanMove(position)];
        }
        if (position - press.origin).length() < self.config.touch_slop_px {
            return Vec::new();
        }
        press.panning = true;
        vec![Gesture::PanStart(press.origin), Gesture::PanMove(position)]
    }

    pub fn pointer_up(&mut self, position: Vec2, time_ms: u64) -> Vec<Gesture> {
        let Some(press) = self.press.take() else {
            return Vec::new();
        };
        let mut gestures = vec![Gesture::TouchUp(position)];
        if !press.panning {
            gestures.push(Gesture::Tap(press.origin));
            return gestures;
        }

        gestures.push(Gesture::PanStop(position));
        let elapsed_sec = time_ms.saturating_sub(press.origin_ms).max(1) as f32 / 1000.0;
        let speed = (position - press.origin).length() / elapsed_sec;
        if speed >= self.config.swipe_min_speed_px_per_sec {
            gestures.push(Gesture::Swipe {
                from: press.origin,
                to: position,
            });
        }
        gestures
    }

    /// Drops an in-flight press, e.g. when the pointer leaves the window.
    pub fn cancel(&mut self) {
        self.press = None;
    }
}
