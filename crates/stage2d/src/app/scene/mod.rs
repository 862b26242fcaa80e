use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{PhysicsStepConfig, SceneConfig};

use super::actor::{Actor, ActorDesc, ActorId, GestureEvent};
use super::animation::Animation;
use super::camera::Camera2D;
use super::diagnostics::Diagnostics;
use super::geometry::Rect;
use super::input::Gesture;
use super::physics::{BodyDef, KinematicWorld, PhysicsWorld};
use super::rendering::{outline_for, DrawCommand, Rasterizer, TextureHandle};
use super::route::{Route, RouteDriver};
use super::timer::Timer;

pub const MIN_Z: i32 = -2;
pub const MAX_Z: i32 = 2;
const LAYER_COUNT: usize = (MAX_Z - MIN_Z + 1) as usize;
const DEBUG_OUTLINE_COLOR: [u8; 4] = [64, 255, 128, 255];

/// What one `tick` did, for loop metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub culled: usize,
    /// Disabled actors passed over in their layer.
    pub skipped: usize,
    pub events_run: usize,
    pub timers_fired: usize,
}

pub type OneTimeEvent = Box<dyn FnOnce()>;
pub type RepeatEvent = Box<dyn FnMut()>;

/// Owns the physics world, the actor registry and the z-layers, and runs one frame per `tick`.
pub struct Scene<W: PhysicsWorld = KinematicWorld> {
    world: W,
    camera: Camera2D,
    actors: HashMap<ActorId, Actor>,
    layers: [Vec<ActorId>; LAYER_COUNT],
    one_time_events: Vec<OneTimeEvent>,
    repeat_events: Vec<RepeatEvent>,
    timer: Timer,
    textures: HashMap<String, Option<TextureHandle>>,
    rng: StdRng,
    diagnostics: Diagnostics,
    physics_step: PhysicsStepConfig,
    debug_shapes: bool,
    frame: Vec<DrawCommand>,
}

impl<W: PhysicsWorld> fmt::Debug for Scene<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("camera", &self.camera)
            .field("actors", &self.actors.len())
            .field("layers", &self.layers)
            .field("one_time_events", &self.one_time_events.len())
            .field("repeat_events", &self.repeat_events.len())
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl Scene<KinematicWorld> {
    pub fn from_config(config: &SceneConfig, diagnostics: Diagnostics) -> Self {
        Self::new(KinematicWorld::new(config.gravity), config, diagnostics)
    }
}

impl<W: PhysicsWorld> Scene<W> {
    pub fn new(world: W, config: &SceneConfig, diagnostics: Diagnostics) -> Self {
        let camera = Camera2D::new(
            config.world_size,
            config.viewport(),
            config.pixels_per_meter,
            diagnostics.clone(),
        );
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            world,
            camera,
            actors: HashMap::new(),
            layers: Default::default(),
            one_time_events: Vec::new(),
            repeat_events: Vec::new(),
            timer: Timer::default(),
            textures: HashMap::new(),
            rng,
            diagnostics,
            physics_step: config.physics,
            debug_shapes: config.debug_shapes,
            frame: Vec::new(),
        }
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn set_debug_shapes(&mut self, enabled: bool) {
        self.debug_shapes = enabled;
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Draw order of one bucket; `z` is clamped like every other layer call.
    pub fn layer_ids(&self, z: i32) -> &[ActorId] {
        &self.layers[layer_index(z)]
    }

    /// Creates the body, registers the actor and places it in the layer for `desc.z`.
    pub fn spawn_actor(&mut self, desc: ActorDesc) -> ActorId {
        let extent = desc.shape.extent();
        let center = desc.position + extent * 0.5;
        let mut body = BodyDef::new(desc.body_type, desc.shape.clone(), center);
        body.angle = desc.angle;
        let id = self.world.create_body(body);
        self.actors.insert(id, Actor::new(id, &desc));
        self.add_renderable(id, desc.z);
        self.diagnostics.info(
            "actor_spawned",
            format_args!("id={} name={} z={}", id.0, desc.debug_name, desc.z),
        );
        id
    }

    /// Appends a registered actor to the bucket for `z`, leaving any bucket it was in.
    pub fn add_renderable(&mut self, id: ActorId, z: i32) {
        let Some(current) = self.actors.get(&id).map(|actor| actor.layer) else {
            return;
        };
        if let Some(current_z) = current {
            self.remove_renderable(id, current_z);
        }
        let clamped = z.clamp(MIN_Z, MAX_Z);
        self.layers[layer_index(clamped)].push(id);
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.layer = Some(clamped);
        }
    }

    /// Removes by identity from the bucket for `z`; a miss is a no-op.
    pub fn remove_renderable(&mut self, id: ActorId, z: i32) {
        let bucket = &mut self.layers[layer_index(z)];
        let Some(position) = bucket.iter().position(|candidate| *candidate == id) else {
            return;
        };
        bucket.remove(position);
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.layer = None;
        }
    }

    pub fn change_z(&mut self, id: ActorId, z: i32) {
        if let Some(current_z) = self.actors.get(&id).and_then(|actor| actor.layer) {
            self.remove_renderable(id, current_z);
        }
        self.add_renderable(id, z);
    }

    /// Halts the actor's route, unregisters it and destroys its body.
    pub fn destroy_actor(&mut self, id: ActorId) -> bool {
        let Some(current_z) = self.actors.get(&id).map(|actor| actor.layer) else {
            return false;
        };
        if let Some(z) = current_z {
            self.remove_renderable(id, z);
        }
        let Some(mut actor) = self.actors.remove(&id) else {
            return false;
        };
        if let Some(route) = actor.route.as_mut() {
            route.halt(&mut self.world, id);
        }
        self.world.destroy_body(id);
        self.diagnostics.info(
            "actor_destroyed",
            format_args!("id={} name={}", id.0, actor.debug_name),
        );
        true
    }

    pub fn set_enabled(&mut self, id: ActorId, enabled: bool) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        actor.enabled = enabled;
        self.world.set_active(id, enabled);
    }

    /// Starts the actor on `route`; the body must be kinematic or dynamic to move.
    pub fn set_route(&mut self, id: ActorId, route: Route, speed: f32, looping: bool) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let mut driver = RouteDriver::new(
            route,
            speed,
            looping,
            actor.extent,
            &mut self.world,
            id,
            &self.diagnostics,
        );
        if !driver.is_done() {
            driver.start(&mut self.world, id);
        }
        actor.route = Some(driver);
    }

    pub fn halt_route(&mut self, id: ActorId) {
        let Some(route) = self
            .actors
            .get_mut(&id)
            .and_then(|actor| actor.route.as_mut())
        else {
            return;
        };
        route.halt(&mut self.world, id);
    }

    pub fn set_animation(&mut self, id: ActorId, animation: Animation) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.animator.set_animation(animation);
        }
    }

    pub fn pick_random_static(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get_mut(&id) {
            actor.animator.pick_random_static(&mut self.rng);
        }
    }

    /// Reshapes the body to a new bounding box with the top-left corner held in place.
    pub fn resize_actor(&mut self, id: ActorId, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            self.diagnostics.urgent(
                "actor_resize_rejected",
                format_args!("id={} size={width}x{height}", id.0),
            );
            return;
        }
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        let (Some(shape), Some(center)) = (self.world.shape(id), self.world.position(id)) else {
            return;
        };
        let top_left = center - actor.extent * 0.5;
        let resized = shape.resized(width, height);
        actor.extent = resized.extent();
        self.world.set_shape(id, resized);
        self.world.set_position(id, top_left + actor.extent * 0.5);
        if let Some(route) = actor.route.as_mut() {
            route.set_extent(actor.extent);
        }
    }

    pub fn add_one_time_event(&mut self, event: impl FnOnce() + 'static) {
        self.one_time_events.push(Box::new(event));
    }

    pub fn add_repeat_event(&mut self, event: impl FnMut() + 'static) {
        self.repeat_events.push(Box::new(event));
    }

    pub fn clear_repeat_events(&mut self) {
        self.repeat_events.clear();
    }

    pub fn pending_one_time_events(&self) -> usize {
        self.one_time_events.len()
    }

    pub fn repeat_event_count(&self) -> usize {
        self.repeat_events.len()
    }

    /// The registered actor owning the first body under a screen point.
    /// Registered actor under a screen point. Overlaps resolve to the highest
    /// z-layer, actors outside any layer rank last, and ties go to the oldest body.
    pub fn point_query(&self, screen_x: f32, screen_y: f32) -> Option<ActorId> {
        let point = self.camera.to_world(screen_x, screen_y);
        self.world
            .query_point_all(point)
            .into_iter()
            .filter_map(|id| self.actors.get(&id).map(|actor| (id, actor.layer)))
            .rev()
            .max_by_key(|(_, layer)| (layer.is_some(), layer.unwrap_or(MIN_Z)))
            .map(|(id, _)| id)
    }

    /// Routes a gesture to the handler of the actor under it; returns whether it was consumed.
    ///
    /// The target is picked by [`Scene::point_query`]; it must be enabled and in
    /// a layer. A swipe only counts when both of its endpoints land on the same actor.
    pub fn dispatch(&mut self, gesture: Gesture) -> bool {
        let anchor = gesture.anchor();
        let Some(id) = self.point_query(anchor.x, anchor.y) else {
            return false;
        };
        let world = self.camera.to_world(anchor.x, anchor.y);
        let world_end = match gesture {
            Gesture::Swipe { to, .. } => {
                if self.point_query(to.x, to.y) != Some(id) {
                    return false;
                }
                self.camera.to_world(to.x, to.y)
            }
            _ => world,
        };
        let Some(actor) = self.actors.get_mut(&id) else {
            return false;
        };
        if !actor.enabled || actor.layer.is_none() {
            return false;
        }
        let event = GestureEvent {
            kind: gesture.kind(),
            actor: id,
            world,
            world_end,
        };
        actor.handlers.invoke(&event).unwrap_or(false)
    }

    /// Runs one frame: timers, one physics step, per-actor motion and animation
    /// in z-order, draw submission, then the event queues.
    pub fn tick(&mut self, elapsed_ms: u64, rasterizer: &mut dyn Rasterizer) -> FrameStats {
        let mut stats = FrameStats {
            timers_fired: self.timer.advance(elapsed_ms),
            ..FrameStats::default()
        };
        self.world.step(
            self.physics_step.step_seconds,
            self.physics_step.velocity_iterations,
            self.physics_step.position_iterations,
        );

        let Self {
            world,
            camera,
            actors,
            layers,
            textures,
            diagnostics,
            debug_shapes,
            frame,
            ..
        } = self;
        frame.clear();
        for id in layers.iter().flatten() {
            let Some(actor) = actors.get_mut(id) else {
                continue;
            };
            if !actor.enabled {
                stats.skipped += 1;
                continue;
            }
            if let Some(route) = actor.route.as_mut() {
                route.advance(world, *id);
            }
            actor.animator.advance(elapsed_ms);

            let Some(center) = world.position(*id) else {
                continue;
            };
            let extent = actor.extent;
            let top_left = center - extent * 0.5;
            if !camera.is_visible(top_left.x, top_left.y, extent.x, extent.y) {
                stats.culled += 1;
                continue;
            }

            let image = actor.animator.current_frame();
            let texture = resolve_texture(textures, diagnostics, rasterizer, image);
            let angle = world.angle(*id).unwrap_or(0.0);
            let screen = camera.to_screen(top_left.x, top_left.y);
            let scale = camera.scale();
            frame.push(DrawCommand::Sprite {
                texture,
                image: image.to_string(),
                rect: Rect::new(screen.x, screen.y, extent.x * scale, extent.y * scale),
                rotation_radians: angle,
            });
            if *debug_shapes {
                if let Some(shape) = world.shape(*id) {
                    frame.push(DrawCommand::Outline {
                        shape: outline_for(shape, center, angle, camera),
                        color: DEBUG_OUTLINE_COLOR,
                    });
                }
            }
            stats.drawn += 1;
        }

        for event in std::mem::take(&mut self.one_time_events) {
            event();
            stats.events_run += 1;
        }
        for event in self.repeat_events.iter_mut() {
            event();
            stats.events_run += 1;
        }

        rasterizer.submit(&self.frame);
        stats
    }

    /// Empties every layer, both event queues and the timer; the world instance is kept.
    pub fn reset(&mut self) {
        for id in self.layers.iter().flatten() {
            if let Some(actor) = self.actors.get_mut(id) {
                actor.layer = None;
            }
        }
        for bucket in &mut self.layers {
            bucket.clear();
        }
        self.one_time_events.clear();
        self.repeat_events.clear();
        self.timer.clear();
        self.diagnostics
            .info("scene_reset", format_args!("actors={}", self.actors.len()));
    }
}

fn layer_index(z: i32) -> usize {
    (z.clamp(MIN_Z, MAX_Z) - MIN_Z) as usize
}

/// Cached per image name; a name the rasterizer cannot load is reported once and drawn blank.
fn resolve_texture(
    textures: &mut HashMap<String, Option<TextureHandle>>,
    diagnostics: &Diagnostics,
    rasterizer: &mut dyn Rasterizer,
    image: &str,
) -> Option<TextureHandle> {
    if let Some(cached) = textures.get(image) {
        return *cached;
    }
    let handle = rasterizer.load_texture(image);
    if handle.is_none() {
        diagnostics.urgent("texture_missing", format_args!("image={image}"));
    }
    textures.insert(image.to_string(), handle);
    handle
}
