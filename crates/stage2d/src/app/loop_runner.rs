use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::config::{ConfigError, SceneConfig};
use crate::paths::{resolve_app_paths, StartupError};

use super::diagnostics::{Diagnostics, TracingSink};
use super::geometry::Vec2;
use super::input::{Gesture, GestureConfig, GestureTracker};
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::rendering::PixelsRasterizer;
use super::scene::Scene;

/// Content and behaviour plugged into the window loop.
pub trait Level {
    fn load(&mut self, scene: &mut Scene);
    /// Runs before `Scene::tick` with the same elapsed milliseconds.
    fn update(&mut self, elapsed_ms: u64, scene: &mut Scene);
    fn unload(&mut self, scene: &mut Scene);
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    pub gestures: GestureConfig,
    pub scene: SceneConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        let scene = SceneConfig::default();
        Self {
            window_title: "stage2d".to_string(),
            window_width: scene.screen_width,
            window_height: scene.screen_height,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: Some(60),
            gestures: GestureConfig::default(),
            scene,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, level: Box<dyn Level>) -> Result<(), AppError> {
    run_app_with_metrics(config, level, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    mut level: Box<dyn Level>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    config.scene.validate()?;
    let app_paths = resolve_app_paths()?;
    info!(
        root = %app_paths.root.display(),
        source = %app_paths.source,
        "asset_root_resolved"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut rasterizer =
        PixelsRasterizer::new(Arc::clone(&window), config.scene.viewport(), app_paths.assets_dir)
            .map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let diagnostics = Diagnostics::new(Rc::new(TracingSink), config.scene.verbosity);
    let mut scene = Scene::from_config(&config.scene, diagnostics);
    level.load(&mut scene);
    info!(actor_count = scene.actor_count(), "scene_loaded");

    let mut clock = FrameClock::new(
        non_zero_or(config.max_frame_delta, Duration::from_millis(250)),
        config.max_render_fps.filter(|fps| *fps > 0),
    );
    let metrics_log_interval = non_zero_or(config.metrics_log_interval, Duration::from_secs(1));
    info!(
        max_frame_delta_ms = clock.max_frame_delta.as_millis() as u64,
        max_render_fps = config.max_render_fps.unwrap_or(0),
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        physics_step_seconds = config.scene.physics.step_seconds,
        "loop_config"
    );

    let input_epoch = Instant::now();
    let mut pointer = PointerRouter::new(config.gestures);
    let mut debug_shapes = config.scene.debug_shapes;
    let mut metrics = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = rasterizer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let screen = rasterizer.window_to_buffer(position.x as f32, position.y as f32);
                    dispatch_all(&mut scene, pointer.moved(screen));
                }
                WindowEvent::CursorLeft { .. } => pointer.left(),
                WindowEvent::MouseInput { state, button, .. } => {
                    let now_ms = input_epoch.elapsed().as_millis() as u64;
                    dispatch_all(&mut scene, pointer.button(button, state, now_ms));
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.state != ElementState::Pressed || event.repeat {
                        return;
                    }
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::Escape) => {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                        PhysicalKey::Code(KeyCode::F3) => {
                            debug_shapes = !debug_shapes;
                            scene.set_debug_shapes(debug_shapes);
                            info!(debug_shapes, "debug_shapes_toggled");
                        }
                        _ => {}
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let (raw_dt, elapsed_ms) = clock.begin_frame(now);
                    level.update(elapsed_ms, &mut scene);
                    let stats = scene.tick(elapsed_ms, &mut rasterizer);

                    let pause = clock.cap_sleep(Instant::now());
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                    if let Err(error) = rasterizer.present() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    clock.presented(Instant::now());

                    metrics.record_frame(raw_dt, &stats);
                    if let Some(snapshot) = metrics.maybe_snapshot(now) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            frame_time_ms = snapshot.frame_time_ms,
                            worst_frame_ms = snapshot.worst_frame_ms,
                            drawn_per_frame = snapshot.drawn_per_frame,
                            culled_per_frame = snapshot.culled_per_frame,
                            actor_count = scene.actor_count(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                level.unload(&mut scene);
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn dispatch_all(scene: &mut Scene, gestures: Vec<Gesture>) {
    for gesture in gestures {
        scene.dispatch(gesture);
    }
}

/// Left-button pointer samples in frame-buffer pixels, fed through a [`GestureTracker`].
#[derive(Debug, Default)]
struct PointerRouter {
    tracker: GestureTracker,
    cursor: Option<Vec2>,
}

impl PointerRouter {
    fn new(config: GestureConfig) -> Self {
        Self {
            tracker: GestureTracker::new(config),
            cursor: None,
        }
    }

    fn moved(&mut self, screen: Vec2) -> Vec<Gesture> {
        self.cursor = Some(screen);
        self.tracker.pointer_moved(screen)
    }

    fn left(&mut self) {
        self.cursor = None;
        self.tracker.cancel();
    }

    fn button(&mut self, button: MouseButton, state: ElementState, now_ms: u64) -> Vec<Gesture> {
        let (MouseButton::Left, Some(cursor)) = (button, self.cursor) else {
            return Vec::new();
        };
        match state {
            ElementState::Pressed => self.tracker.pointer_down(cursor, now_ms),
            ElementState::Released => self.tracker.pointer_up(cursor, now_ms),
        }
    }
}

/// Turns wall-clock redraws into whole-millisecond scene ticks.
///
/// Deltas are clamped to `max_frame_delta`; the sub-millisecond remainder is
/// carried into the next frame so no time is lost to truncation.
#[derive(Debug)]
struct FrameClock {
    max_frame_delta: Duration,
    frame_target: Option<Duration>,
    carry: Duration,
    last_frame: Instant,
    last_present: Instant,
}

impl FrameClock {
    fn new(max_frame_delta: Duration, max_render_fps: Option<u32>) -> Self {
        let now = Instant::now();
        Self {
            max_frame_delta,
            frame_target: max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            carry: Duration::ZERO,
            last_frame: now,
            last_present: now,
        }
    }

    /// Returns the raw frame time and the milliseconds to feed the scene.
    fn begin_frame(&mut self, now: Instant) -> (Duration, u64) {
        let raw = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        let pending = self.carry.saturating_add(raw.min(self.max_frame_delta));
        let whole_ms = pending.as_millis() as u64;
        self.carry = pending.saturating_sub(Duration::from_millis(whole_ms));
        (raw, whole_ms)
    }

    /// How long to wait before presenting to stay under the FPS cap.
    fn cap_sleep(&self, now: Instant) -> Duration {
        let Some(target) = self.frame_target else {
            return Duration::ZERO;
        };
        target.saturating_sub(now.saturating_duration_since(self.last_present))
    }

    fn presented(&mut self, now: Instant) {
        self.last_present = now;
    }
}

fn non_zero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::GestureKind;

    fn kinds(gestures: &[Gesture]) -> Vec<GestureKind> {
        gestures.iter().map(Gesture::kind).collect()
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut clock = FrameClock::new(Duration::from_millis(250), None);
        let start = clock.last_frame;
        let (raw, elapsed_ms) = clock.begin_frame(start + Duration::from_millis(600));
        assert_eq!(raw, Duration::from_millis(600));
        assert_eq!(elapsed_ms, 250);
    }

    #[test]
    fn sub_millisecond_remainder_carries_over() {
        let mut clock = FrameClock::new(Duration::from_millis(250), None);
        let start = clock.last_frame;
        let first = start + Duration::from_micros(16_700);
        assert_eq!(clock.begin_frame(first).1, 16);
        assert_eq!(clock.carry, Duration::from_micros(700));

        let second = first + Duration::from_micros(16_700);
        assert_eq!(clock.begin_frame(second).1, 17);
        assert_eq!(clock.carry, Duration::from_micros(400));
    }

    #[test]
    fn cap_sleep_fills_the_rest_of_the_frame() {
        let mut clock = FrameClock::new(Duration::from_millis(250), Some(50));
        let presented = Instant::now();
        clock.presented(presented);
        assert_eq!(
            clock.cap_sleep(presented + Duration::from_millis(5)),
            Duration::from_millis(15)
        );
        assert_eq!(
            clock.cap_sleep(presented + Duration::from_millis(25)),
            Duration::ZERO
        );

        let uncapped = FrameClock::new(Duration::from_millis(250), None);
        assert_eq!(uncapped.cap_sleep(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn zero_durations_fall_back() {
        let fallback = Duration::from_secs(1);
        assert_eq!(non_zero_or(Duration::ZERO, fallback), fallback);
        assert_eq!(
            non_zero_or(Duration::from_millis(5), fallback),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn pointer_router_turns_left_clicks_into_taps() {
        let mut pointer = PointerRouter::new(GestureConfig::default());
        assert!(pointer
            .button(MouseButton::Left, ElementState::Pressed, 0)
            .is_empty());

        assert!(pointer.moved(Vec2::new(40.0, 30.0)).is_empty());
        let down = pointer.button(MouseButton::Left, ElementState::Pressed, 10);
        assert_eq!(kinds(&down), vec![GestureKind::TouchDown]);
        let up = pointer.button(MouseButton::Left, ElementState::Released, 90);
        assert_eq!(kinds(&up), vec![GestureKind::TouchUp, GestureKind::Tap]);
    }

    #[test]
    fn pointer_router_ignores_other_buttons_and_cancels_on_leave() {
        let mut pointer = PointerRouter::new(GestureConfig::default());
        pointer.moved(Vec2::new(40.0, 30.0));
        assert!(pointer
            .button(MouseButton::Right, ElementState::Pressed, 0)
            .is_empty());

        pointer.button(MouseButton::Left, ElementState::Pressed, 0);
        pointer.left();
        pointer.moved(Vec2::new(41.0, 30.0));
        assert!(pointer
            .button(MouseButton::Left, ElementState::Released, 50)
            .is_empty());
    }
}
