use std::collections::HashMap;
use std::fmt;

use super::animation::AnimationDriver;
use super::geometry::Vec2;
use super::input::GestureKind;
use super::physics::{BodyId, BodyShape, BodyType, PhysicsWorld};
use super::route::RouteDriver;

/// Actors are keyed by the body they own.
pub type ActorId = BodyId;

/// What a handler sees: the gesture kind and its points in world meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub actor: ActorId,
    pub world: Vec2,
    /// End point for swipes; equal to `world` for every other kind.
    pub world_end: Vec2,
}

/// Returns whether the gesture was consumed.
pub type InputHandler = Box<dyn FnMut(&GestureEvent) -> bool>;

/// Optional-capability map: a missing entry means the actor ignores that gesture.
#[derive(Default)]
pub struct InputHandlers {
    handlers: HashMap<GestureKind, InputHandler>,
}

impl fmt::Debug for InputHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

impl InputHandlers {
    pub fn set(&mut self, kind: GestureKind, handler: impl FnMut(&GestureEvent) -> bool + 'static) {
        self.handlers.insert(kind, Box::new(handler));
    }

    pub fn remove(&mut self, kind: GestureKind) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    pub fn has(&self, kind: GestureKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// `None` when no handler is registered for the event's kind.
    pub fn invoke(&mut self, event: &GestureEvent) -> Option<bool> {
        self.handlers
            .get_mut(&event.kind)
            .map(|handler| handler(event))
    }
}

#[derive(Debug, Clone)]
pub struct ActorDesc {
    pub shape: BodyShape,
    pub body_type: BodyType,
    /// Top-left corner in world meters.
    pub position: Vec2,
    pub angle: f32,
    pub image: String,
    pub z: i32,
    pub debug_name: &'static str,
}

impl ActorDesc {
    pub fn new(shape: BodyShape, position: Vec2, image: impl Into<String>) -> Self {
        Self {
            shape,
            body_type: BodyType::Static,
            position,
            angle: 0.0,
            image: image.into(),
            z: 0,
            debug_name: "actor",
        }
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_debug_name(mut self, debug_name: &'static str) -> Self {
        self.debug_name = debug_name;
        self
    }
}

/// A drawable, touchable object whose transform lives in its physics body.
#[derive(Debug)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) extent: Vec2,
    pub(crate) shape_kind: ShapeKind,
    pub(crate) enabled: bool,
    pub(crate) layer: Option<i32>,
    pub(crate) route: Option<RouteDriver>,
    pub(crate) animator: AnimationDriver,
    pub(crate) handlers: InputHandlers,
    pub debug_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
}

impl ShapeKind {
    pub fn of(shape: &BodyShape) -> Self {
        match shape {
            BodyShape::Rectangle { .. } => ShapeKind::Rectangle,
            BodyShape::Circle { .. } => ShapeKind::Circle,
            BodyShape::Polygon { .. } => ShapeKind::Polygon,
        }
    }
}

impl Actor {
    pub(crate) fn new(id: ActorId, desc: &ActorDesc) -> Self {
        Self {
            id,
            extent: desc.shape.extent(),
            shape_kind: ShapeKind::of(&desc.shape),
            enabled: true,
            layer: None,
            route: None,
            animator: AnimationDriver::new(desc.image.clone()),
            handlers: InputHandlers::default(),
            debug_name: desc.debug_name,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn extent(&self) -> Vec2 {
        self.extent
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape_kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The z bucket the actor is drawn in, if it is in one.
    pub fn layer(&self) -> Option<i32> {
        self.layer
    }

    pub fn route(&self) -> Option<&RouteDriver> {
        self.route.as_ref()
    }

    pub fn animator(&self) -> &AnimationDriver {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut AnimationDriver {
        &mut self.animator
    }

    pub fn handlers(&self) -> &InputHandlers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut InputHandlers {
        &mut self.handlers
    }

    pub fn on(
        &mut self,
        kind: GestureKind,
        handler: impl FnMut(&GestureEvent) -> bool + 'static,
    ) -> &mut Self {
        self.handlers.set(kind, handler);
        self
    }

    /// Top-left corner: body centre minus half the extent.
    pub fn position(&self, world: &dyn PhysicsWorld) -> Option<Vec2> {
        world
            .position(self.id)
            .map(|center| center - self.extent * 0.5)
    }

    pub fn rotation(&self, world: &dyn PhysicsWorld) -> f32 {
        world.angle(self.id).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::app::physics::{BodyDef, KinematicWorld};

    fn event(kind: GestureKind) -> GestureEvent {
        GestureEvent {
            kind,
            actor: BodyId(0),
            world: Vec2::new(1.0, 2.0),
            world_end: Vec2::new(1.0, 2.0),
        }
    }

    #[test]
    fn missing_handler_is_reported_as_absent() {
        let mut handlers = InputHandlers::default();
        assert!(handlers.is_empty());
        assert_eq!(handlers.invoke(&event(GestureKind::Tap)), None);
    }

    #[test]
    fn handler_receives_world_coordinates() {
        let seen = Rc::new(Cell::new(Vec2::ZERO));
        let mut handlers = InputHandlers::default();
        let sink = seen.clone();
        handlers.set(GestureKind::Tap, move |event| {
            sink.set(event.world);
            true
        });

        assert!(handlers.has(GestureKind::Tap));
        assert!(!handlers.has(GestureKind::Swipe));
        assert_eq!(handlers.invoke(&event(GestureKind::Tap)), Some(true));
        assert_eq!(seen.get(), Vec2::new(1.0, 2.0));

        assert!(handlers.remove(GestureKind::Tap));
        assert_eq!(handlers.invoke(&event(GestureKind::Tap)), None);
    }

    #[test]
    fn position_is_derived_from_body_centre() {
        let mut world = KinematicWorld::default();
        let shape = BodyShape::Rectangle {
            width: 2.0,
            height: 4.0,
        };
        let desc = ActorDesc::new(shape.clone(), Vec2::new(3.0, 3.0), "crate");
        let id = world.create_body(BodyDef::new(BodyType::Static, shape, Vec2::new(4.0, 5.0)));
        let actor = Actor::new(id, &desc);

        assert_eq!(actor.position(&world), Some(Vec2::new(3.0, 3.0)));
        world.set_position(id, Vec2::new(10.0, 10.0));
        assert_eq!(actor.position(&world), Some(Vec2::new(9.0, 8.0)));
        world.set_angle(id, 1.5);
        assert_eq!(actor.rotation(&world), 1.5);
    }

    #[test]
    fn shape_kind_tracks_variant() {
        assert_eq!(
            ShapeKind::of(&BodyShape::Circle { radius: 1.0 }),
            ShapeKind::Circle
        );
        assert_eq!(
            ShapeKind::of(&BodyShape::Polygon { points: Vec::new() }),
            ShapeKind::Polygon
        );
    }
}
