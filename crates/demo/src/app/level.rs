use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use stage2d::{ActorDesc, ActorId, GestureKind, Level, Route, Scene, Vec2};
use tracing::info;

use super::layout::{Behavior, LevelLayout, RouteLayout};

#[derive(Debug, Clone, Copy, PartialEq)]
enum LevelCommand {
    Reroll(ActorId),
    ToggleRoute(ActorId),
    PanStart(Vec2),
    PanMove(Vec2),
    PanStop,
}

type CommandQueue = Rc<RefCell<Vec<LevelCommand>>>;

/// Spawns a [`LevelLayout`] and applies what its input handlers queue up.
///
/// Handlers run during dispatch without scene access, so they only record
/// commands; `update` applies them before the next tick.
pub(crate) struct DemoLevel {
    layout: LevelLayout,
    commands: CommandQueue,
    names: HashMap<ActorId, String>,
    routes: HashMap<ActorId, RouteLayout>,
    pan_anchor: Option<Vec2>,
    frames: Rc<Cell<u64>>,
}

impl DemoLevel {
    pub(crate) fn new(layout: LevelLayout) -> Self {
        Self {
            layout,
            commands: Rc::new(RefCell::new(Vec::new())),
            names: HashMap::new(),
            routes: HashMap::new(),
            pan_anchor: None,
            frames: Rc::new(Cell::new(0)),
        }
    }

    fn name(&self, id: ActorId) -> &str {
        self.names.get(&id).map(String::as_str).unwrap_or("?")
    }

    fn start_route(scene: &mut Scene, id: ActorId, route: &RouteLayout) {
        scene.set_route(
            id,
            Route::new(route.waypoints.clone()),
            route.speed,
            route.looping,
        );
    }

    /// `dispatch_focus` is the camera focus the queued world points were resolved against.
    fn apply(&mut self, command: LevelCommand, dispatch_focus: Vec2, scene: &mut Scene) {
        match command {
            LevelCommand::Reroll(id) => {
                scene.pick_random_static(id);
                let image = scene
                    .actor(id)
                    .map(|actor| actor.animator().current_frame().to_string())
                    .unwrap_or_default();
                info!(actor = self.name(id), image = image.as_str(), "image_rerolled");
            }
            LevelCommand::ToggleRoute(id) => {
                let running = scene
                    .actor(id)
                    .and_then(|actor| actor.route())
                    .is_some_and(|route| !route.is_done());
                if running {
                    scene.halt_route(id);
                } else if let Some(route) = self.routes.get(&id) {
                    Self::start_route(scene, id, route);
                }
                info!(actor = self.name(id), running = !running, "route_toggled");
            }
            LevelCommand::PanStart(world) => self.pan_anchor = Some(world),
            LevelCommand::PanMove(world) => {
                let Some(anchor) = self.pan_anchor else {
                    return;
                };
                // Keep the grabbed world point under the pointer.
                let focus = dispatch_focus + (anchor - world);
                scene.camera_mut().set_focus(focus.x, focus.y);
            }
            LevelCommand::PanStop => self.pan_anchor = None,
        }
    }
}

impl Level for DemoLevel {
    fn load(&mut self, scene: &mut Scene) {
        let mut rerollable = Vec::new();
        for actor in &self.layout.actors {
            let desc = ActorDesc::new(actor.shape.clone(), actor.position, actor.image.clone())
                .with_body_type(actor.body_type)
                .with_z(actor.z)
                .with_angle(actor.angle)
                .with_debug_name("layout_actor");
            let id = scene.spawn_actor(desc);
            self.names.insert(id, actor.name.clone());

            if let Some(animation) = &actor.animation {
                scene.set_animation(id, animation.clone());
            }
            if let Some(route) = &actor.route {
                Self::start_route(scene, id, route);
                self.routes.insert(id, route.clone());
            }
            let Some(handle) = scene.actor_mut(id) else {
                continue;
            };
            if !actor.alternatives.is_empty() {
                handle
                    .animator_mut()
                    .set_static_alternatives(actor.alternatives.clone());
                rerollable.push(id);
            }
            for behavior in &actor.behaviors {
                let commands = self.commands.clone();
                match behavior {
                    Behavior::RerollOnTap => {
                        handle.on(GestureKind::Tap, move |event| {
                            commands.borrow_mut().push(LevelCommand::Reroll(event.actor));
                            true
                        });
                    }
                    Behavior::ToggleRouteOnSwipe => {
                        handle.on(GestureKind::Swipe, move |event| {
                            commands
                                .borrow_mut()
                                .push(LevelCommand::ToggleRoute(event.actor));
                            true
                        });
                    }
                    Behavior::PanCamera => {
                        let start = commands.clone();
                        let stop = commands.clone();
                        handle
                            .on(GestureKind::PanStart, move |event| {
                                start.borrow_mut().push(LevelCommand::PanStart(event.world));
                                true
                            })
                            .on(GestureKind::PanMove, move |event| {
                                commands.borrow_mut().push(LevelCommand::PanMove(event.world));
                                true
                            })
                            .on(GestureKind::PanStop, move |_| {
                                stop.borrow_mut().push(LevelCommand::PanStop);
                                true
                            });
                    }
                }
            }
        }

        if let Some(interval_ms) = self.layout.reroll_interval_ms {
            let commands = self.commands.clone();
            scene.timer_mut().every(interval_ms, move || {
                let mut queue = commands.borrow_mut();
                queue.extend(rerollable.iter().copied().map(LevelCommand::Reroll));
            });
        }
        let frames = self.frames.clone();
        scene.add_repeat_event(move || frames.set(frames.get() + 1));
        let actor_count = scene.actor_count();
        scene.add_one_time_event(move || info!(actor_count, "level_ready"));
    }

    fn update(&mut self, _elapsed_ms: u64, scene: &mut Scene) {
        let pending = std::mem::take(&mut *self.commands.borrow_mut());
        let dispatch_focus = scene.camera().focus();
        for command in pending {
            self.apply(command, dispatch_focus, scene);
        }
    }

    fn unload(&mut self, scene: &mut Scene) {
        info!(frames = self.frames.get(), "level_unloaded");
        scene.reset();
        self.commands.borrow_mut().clear();
        self.pan_anchor = None;
    }
}
