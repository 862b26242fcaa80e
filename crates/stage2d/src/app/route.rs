use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::diagnostics::Diagnostics;
use super::geometry::Vec2;
use super::physics::{BodyId, PhysicsWorld};

pub const MIN_ROUTE_WAYPOINTS: usize = 2;

/// Waypoints denote the actor's top-left corner in world meters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub waypoints: Vec<Vec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route needs at least {MIN_ROUTE_WAYPOINTS} waypoints, got {count}")]
    TooFewWaypoints { count: usize },
}

impl Route {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self { waypoints }
    }

    pub fn to(mut self, x: f32, y: f32) -> Self {
        self.waypoints.push(Vec2::new(x, y));
        self
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn validate(&self) -> Result<(), RouteError> {
        if self.waypoints.len() < MIN_ROUTE_WAYPOINTS {
            return Err(RouteError::TooFewWaypoints {
                count: self.waypoints.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteState {
    Running,
    Done,
}

/// Drives a body's linear velocity along a route at constant speed.
#[derive(Debug, Clone)]
pub struct RouteDriver {
    route: Route,
    speed: f32,
    looping: bool,
    half_extent: Vec2,
    next_index: usize,
    state: RouteState,
}

impl RouteDriver {
    /// An invalid route yields an inert driver that has already stopped the body.
    pub fn new(
        route: Route,
        speed: f32,
        looping: bool,
        extent: Vec2,
        world: &mut dyn PhysicsWorld,
        body: BodyId,
        diagnostics: &Diagnostics,
    ) -> Self {
        let mut driver = Self {
            route,
            speed,
            looping,
            half_extent: extent * 0.5,
            next_index: 1,
            state: RouteState::Running,
        };
        if let Err(error) = driver.route.validate() {
            diagnostics.urgent("route_rejected", format_args!("body={} {error}", body.0));
            driver.halt(world, body);
        }
        driver
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == RouteState::Done
    }

    pub fn target_index(&self) -> usize {
        self.next_index
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Waypoints name the actor's top-left, so the driver tracks the actor's size.
    pub fn set_extent(&mut self, extent: Vec2) {
        self.half_extent = extent * 0.5;
    }

    pub fn start(&mut self, world: &mut dyn PhysicsWorld, body: BodyId) {
        if self.route.validate().is_err() {
            self.halt(world, body);
            return;
        }
        self.state = RouteState::Running;
        let origin = self.route.waypoints[0];
        world.set_position(body, origin + self.half_extent);
        self.next_index = 1;
        self.aim(world, body, origin);
    }

    pub fn advance(&mut self, world: &mut dyn PhysicsWorld, body: BodyId) {
        if self.state != RouteState::Running {
            return;
        }
        let Some(center) = world.position(body) else {
            return;
        };
        let position = center - self.half_extent;
        let to_prev = self.route.waypoints[self.next_index - 1] - position;
        let to_next = self.route.waypoints[self.next_index] - position;

        let reached = to_next == Vec2::ZERO
            || (same_sign(to_prev.x, to_next.x) && same_sign(to_prev.y, to_next.y));
        if !reached {
            return;
        }

        self.next_index += 1;
        if self.next_index == self.route.len() {
            if self.looping {
                self.start(world, body);
            } else {
                self.halt(world, body);
            }
            return;
        }
        self.aim(world, body, position);
    }

    pub fn halt(&mut self, world: &mut dyn PhysicsWorld, body: BodyId) {
        self.state = RouteState::Done;
        world.set_linear_velocity(body, Vec2::ZERO);
    }

    fn aim(&self, world: &mut dyn PhysicsWorld, body: BodyId, from: Vec2) {
        let direction = (self.route.waypoints[self.next_index] - from).normalized_or_zero();
        world.set_linear_velocity(body, direction * self.speed);
    }
}

/// Zero is its own sign, so a point sitting on a waypoint's axis differs from one off it.
fn same_sign(a: f32, b: f32) -> bool {
    sign(a) == sign(b)
}

fn sign(value: f32) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}
