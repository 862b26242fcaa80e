mod actor;
mod animation;
mod camera;
mod diagnostics;
mod geometry;
mod input;
mod loop_runner;
mod metrics;
mod physics;
mod rendering;
mod route;
mod scene;
mod timer;

pub use actor::{Actor, ActorDesc, ActorId, GestureEvent, InputHandler, InputHandlers, ShapeKind};
pub use animation::{Animation, AnimationDriver, AnimationFrame};
pub use camera::Camera2D;
pub use diagnostics::{
    CapturedDiagnostic, DiagnosticSink, Diagnostics, MemorySink, Severity, TracingSink, Verbosity,
};
pub use geometry::{Rect, Vec2};
pub use input::{Gesture, GestureConfig, GestureKind, GestureTracker};
pub use loop_runner::{run_app, run_app_with_metrics, AppError, Level, LoopConfig};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use physics::{BodyDef, BodyId, BodyShape, BodyType, KinematicWorld, PhysicsWorld};
pub use rendering::{
    outline_for, DrawCommand, HeadlessRasterizer, OutlineShape, PixelsRasterizer, Rasterizer,
    TextureHandle, Viewport,
};
pub use route::{Route, RouteDriver, RouteError, RouteState, MIN_ROUTE_WAYPOINTS};
pub use scene::{FrameStats, OneTimeEvent, RepeatEvent, Scene, MAX_Z, MIN_Z};
pub use timer::Timer;
