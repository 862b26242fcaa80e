use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

/// Stable identifier of a physics body; also keys the scene's actor registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    #[default]
    Static,
    Kinematic,
    Dynamic,
}

/// Collision shape in body-local meters, centred on the body position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyShape {
    Rectangle { width: f32, height: f32 },
    Circle { radius: f32 },
    Polygon { points: Vec<Vec2> },
}

impl BodyShape {
    /// Width and height of the shape's local bounding box.
    pub fn extent(&self) -> Vec2 {
        match self {
            BodyShape::Rectangle { width, height } => Vec2::new(*width, *height),
            BodyShape::Circle { radius } => Vec2::new(radius * 2.0, radius * 2.0),
            BodyShape::Polygon { points } => {
                let mut max_x = 0.0_f32;
                let mut max_y = 0.0_f32;
                for point in points {
                    max_x = max_x.max(point.x.abs());
                    max_y = max_y.max(point.y.abs());
                }
                Vec2::new(max_x * 2.0, max_y * 2.0)
            }
        }
    }

    /// Reshapes to a new bounding box, keeping the variant.
    pub fn resized(&self, width: f32, height: f32) -> BodyShape {
        match self {
            BodyShape::Rectangle { .. } => BodyShape::Rectangle { width, height },
            BodyShape::Circle { .. } => BodyShape::Circle {
                radius: width.min(height) * 0.5,
            },
            BodyShape::Polygon { points } => {
                let current = self.extent();
                let sx = if current.x > 0.0 { width / current.x } else { 1.0 };
                let sy = if current.y > 0.0 { height / current.y } else { 1.0 };
                BodyShape::Polygon {
                    points: points
                        .iter()
                        .map(|point| Vec2::new(point.x * sx, point.y * sy))
                        .collect(),
                }
            }
        }
    }

    /// Point containment in body-local coordinates; edges count as inside.
    pub fn contains_local(&self, point: Vec2) -> bool {
        match self {
            BodyShape::Rectangle { width, height } => {
                point.x.abs() <= width * 0.5 && point.y.abs() <= height * 0.5
            }
            BodyShape::Circle { radius } => point.length() <= *radius,
            BodyShape::Polygon { points } => polygon_contains(points, point),
        }
    }
}

fn polygon_contains(points: &[Vec2], point: Vec2) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x <= cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[derive(Debug, Clone, PartialEq)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub shape: BodyShape,
    /// Centre of the body in world meters.
    pub position: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
}

impl BodyDef {
    pub fn new(body_type: BodyType, shape: BodyShape, position: Vec2) -> Self {
        Self {
            body_type,
            shape,
            position,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }
}

/// The slice of a physics engine the scene layer drives.
pub trait PhysicsWorld {
    fn step(&mut self, dt_seconds: f32, velocity_iterations: u32, position_iterations: u32);
    fn create_body(&mut self, def: BodyDef) -> BodyId;
    fn destroy_body(&mut self, id: BodyId) -> bool;
    /// Every active body whose shape contains the world point, in creation order.
    fn query_point_all(&self, point: Vec2) -> Vec<BodyId>;

    fn query_point(&self, point: Vec2) -> Option<BodyId> {
        self.query_point_all(point).first().copied()
    }

    fn position(&self, id: BodyId) -> Option<Vec2>;
    fn set_position(&mut self, id: BodyId, position: Vec2);
    fn angle(&self, id: BodyId) -> Option<f32>;
    fn set_angle(&mut self, id: BodyId, angle: f32);
    fn linear_velocity(&self, id: BodyId) -> Option<Vec2>;
    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2);
    fn body_type(&self, id: BodyId) -> Option<BodyType>;
    fn set_body_type(&mut self, id: BodyId, body_type: BodyType);
    fn is_active(&self, id: BodyId) -> bool;
    fn set_active(&mut self, id: BodyId, active: bool);
    fn shape(&self, id: BodyId) -> Option<&BodyShape>;
    fn set_shape(&mut self, id: BodyId, shape: BodyShape);
}

#[derive(Debug, Clone)]
struct KinematicBody {
    body_type: BodyType,
    shape: BodyShape,
    position: Vec2,
    angle: f32,
    velocity: Vec2,
    angular_velocity: f32,
    active: bool,
}

/// Velocity integrator with shape point queries and no collision response.
#[derive(Debug, Default)]
pub struct KinematicWorld {
    bodies: BTreeMap<BodyId, KinematicBody>,
    next_id: u64,
    gravity: Vec2,
}

impl KinematicWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_angular_velocity(&mut self, id: BodyId, angular_velocity: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.angular_velocity = angular_velocity;
        }
    }
}

impl PhysicsWorld for KinematicWorld {
    fn step(&mut self, dt_seconds: f32, _velocity_iterations: u32, _position_iterations: u32) {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return;
        }
        for body in self.bodies.values_mut() {
            if !body.active || body.body_type == BodyType::Static {
                continue;
            }
            if body.body_type == BodyType::Dynamic {
                body.velocity += self.gravity * dt_seconds;
            }
            body.position += body.velocity * dt_seconds;
            body.angle += body.angular_velocity * dt_seconds;
        }
    }

    fn create_body(&mut self, def: BodyDef) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.bodies.insert(
            id,
            KinematicBody {
                body_type: def.body_type,
                shape: def.shape,
                position: def.position,
                angle: def.angle,
                velocity: Vec2::ZERO,
                angular_velocity: def.angular_velocity,
                active: true,
            },
        );
        id
    }

    fn destroy_body(&mut self, id: BodyId) -> bool {
        self.bodies.remove(&id).is_some()
    }

    fn query_point_all(&self, point: Vec2) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.active)
            .filter(|(_, body)| {
                let local = (point - body.position).rotated(-body.angle);
                body.shape.contains_local(local)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn position(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|body| body.position)
    }

    fn set_position(&mut self, id: BodyId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
    }

    fn angle(&self, id: BodyId) -> Option<f32> {
        self.bodies.get(&id).map(|body| body.angle)
    }

    fn set_angle(&mut self, id: BodyId, angle: f32) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.angle = angle;
        }
    }

    fn linear_velocity(&self, id: BodyId) -> Option<Vec2> {
        self.bodies.get(&id).map(|body| body.velocity)
    }

    fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn body_type(&self, id: BodyId) -> Option<BodyType> {
        self.bodies.get(&id).map(|body| body.body_type)
    }

    fn set_body_type(&mut self, id: BodyId, body_type: BodyType) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.body_type = body_type;
        }
    }

    fn is_active(&self, id: BodyId) -> bool {
        self.bodies.get(&id).is_some_and(|body| body.active)
    }

    fn set_active(&mut self, id: BodyId, active: bool) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.active = active;
        }
    }

    fn shape(&self, id: BodyId) -> Option<&BodyShape> {
        self.bodies.get(&id).map(|body| &body.shape)
    }

    fn set_shape(&mut self, id: BodyId, shape: BodyShape) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.shape = shape;
        }
    }
}
