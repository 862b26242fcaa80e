//! Presentation and interaction layer for 2D scenes: a bounded camera over a
//! physics world, z-layered actors with scripted routes and sprite animation,
//! gesture dispatch, and a reference window loop.

pub mod app;
pub mod config;
mod image_names;
mod paths;

pub use app::{
    outline_for, run_app, run_app_with_metrics, Actor, ActorDesc, ActorId, Animation,
    AnimationDriver, AnimationFrame, AppError, BodyDef, BodyId, BodyShape, BodyType, Camera2D,
    CapturedDiagnostic, DiagnosticSink, Diagnostics, DrawCommand, FrameStats, Gesture,
    GestureConfig, GestureEvent, GestureKind, GestureTracker, HeadlessRasterizer, InputHandler,
    InputHandlers, KinematicWorld, Level, LoopConfig, LoopMetricsSnapshot, MemorySink,
    MetricsHandle, OneTimeEvent, OutlineShape, PhysicsWorld, PixelsRasterizer, Rasterizer, Rect,
    RepeatEvent, Route, RouteDriver, RouteError, RouteState, Scene, Severity, ShapeKind,
    TextureHandle, Timer, TracingSink, Vec2, Verbosity, Viewport, MAX_Z, MIN_Z,
    MIN_ROUTE_WAYPOINTS,
};
pub use config::{ConfigError, PhysicsStepConfig, SceneConfig};
pub use image_names::ImageNameError;
pub use paths::{resolve_app_paths, AppPaths, RootSource, StartupError, ROOT_ENV_VAR};
