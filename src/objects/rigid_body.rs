use crate::collision::aabb::AABB;
use crate::common::material::Material;
use crate::math::vec2::Vec2;
use crate::shapes::Shape;

/// A simulated body: shape, surface material, kinematic state and the
/// force/torque accumulators consumed by the integration pipeline.
///
/// A body with `inv_mass == 0.0` is static: it is never integrated and
/// contact resolution never displaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub shape: Shape,
    pub material: Material,
    /// Offset from the shape's local origin to its center of mass.
    pub local_center_of_mass: Vec2,

    /// World position of the center of mass.
    pub position: Vec2,
    /// Orientation in radians.
    pub rotation: f64,
    pub linear_velocity: Vec2,
    pub angular_velocity: f64,

    /// Force accumulator, consumed once per frame.
    pub force: Vec2,
    /// Torque accumulator, consumed once per frame.
    pub torque: f64,

    pub mass: f64,
    pub inv_mass: f64,
    pub inertia: f64,
    pub inv_inertia: f64,

    // World-space vertices, refreshed by `update`. Empty for circles.
    world_vertices: Vec<Vec2>,
    pub(crate) id: u64,
}

impl RigidBody {
    /// Creates a dynamic body from a shape and a uniform density
    /// (mass = area * density). A non-positive density produces a static
    /// body. The center of mass starts at the world origin.
    pub fn new(shape: Shape, density: f64) -> Self {
        let (mass, inv_mass, inertia, inv_inertia, local_com) = if density <= 0.0 {
            (0.0, 0.0, f64::INFINITY, 0.0, Self::local_com_of(&shape))
        } else {
            match &shape {
                Shape::Circle(circle) => {
                    let mass = circle.area() * density;
                    let inertia = circle.inertia(mass);
                    (mass, 1.0 / mass, inertia, 1.0 / inertia, Vec2::ZERO)
                }
                Shape::Polygon(polygon) => {
                    let mass = polygon.area() * density;
                    if mass < 1e-10 {
                        (0.0, 0.0, f64::INFINITY, 0.0, polygon.centroid())
                    } else {
                        let inertia = polygon.inertia(density);
                        let inv_inertia = if inertia.is_finite() && inertia > 0.0 {
                            1.0 / inertia
                        } else {
                            0.0
                        };
                        (mass, 1.0 / mass, inertia, inv_inertia, polygon.centroid())
                    }
                }
            }
        };

        let mut body = Self {
            shape,
            material: Material::default(),
            local_center_of_mass: local_com,
            position: Vec2::ZERO,
            rotation: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            world_vertices: Vec::new(),
            id: 0,
        };
        body.update();
        body
    }

    /// Creates a static body (infinite mass and inertia). `position` places
    /// the shape's local origin; the body's `position` field stores the
    /// resulting world center of mass.
    pub fn new_static(shape: Shape, position: Vec2, rotation: f64) -> Self {
        let local_com = Self::local_com_of(&shape);
        let mut body = Self {
            shape,
            material: Material::default(),
            local_center_of_mass: local_com,
            position: position + local_com.rotate(rotation),
            rotation,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: f64::INFINITY,
            inv_inertia: 0.0,
            world_vertices: Vec::new(),
            id: 0,
        };
        body.update();
        body
    }

    /// Builder-style material override.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    fn local_com_of(shape: &Shape) -> Vec2 {
        match shape {
            Shape::Circle(_) => Vec2::ZERO,
            Shape::Polygon(polygon) => polygon.centroid(),
        }
    }

    /// Accumulates a force through the center of mass (no torque).
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Accumulates a force applied at a world-space point, generating both
    /// linear force and torque.
    pub fn apply_force_at_point(&mut self, force: Vec2, point: Vec2) {
        self.force += force;
        self.torque += (point - self.position).cross(force);
    }

    /// First integration phase: accumulated force and gravity into
    /// velocity. Applies half of the acceleration; `integrate_velocity`
    /// applies the other half after the position update, so one sub-step
    /// integrates the acceleration exactly once.
    ///
    /// Does not consume the accumulators; they are cleared once per frame
    /// by `clear_forces`.
    pub fn integrate_forces(&mut self, dt: f64, gravity: Vec2) {
        if self.inv_mass == 0.0 {
            return;
        }
        let half_dt = dt * 0.5;
        self.linear_velocity += (self.force * self.inv_mass + gravity) * half_dt;
        self.angular_velocity += self.torque * self.inv_inertia * half_dt;
    }

    /// Second integration phase: velocity into position, then the
    /// remaining half of the acceleration.
    pub fn integrate_velocity(&mut self, dt: f64, gravity: Vec2) {
        if self.inv_mass == 0.0 {
            return;
        }
        self.position += self.linear_velocity * dt;
        self.rotation = wrap_angle(self.rotation + self.angular_velocity * dt);
        self.integrate_forces(dt, gravity);
    }

    /// Zeroes the force and torque accumulators. Called by the world once
    /// per frame after all sub-steps have consumed them.
    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Refreshes the cached world-space geometry from the current position
    /// and rotation. The pipeline calls this after each sub-step; callers
    /// mutating `position`/`rotation` directly must call it themselves
    /// before the next contact pass.
    pub fn update(&mut self) {
        let position = self.position;
        let rotation = self.rotation;
        let local_com = self.local_center_of_mass;
        if let Shape::Polygon(polygon) = &self.shape {
            self.world_vertices.clear();
            for &v in &polygon.vertices {
                self.world_vertices
                    .push(position + (v - local_com).rotate(rotation));
            }
        }
    }

    /// Cached world-space vertices. Empty for circles.
    pub fn world_vertices(&self) -> &[Vec2] {
        &self.world_vertices
    }

    /// World-space bounding box from the current cached geometry.
    pub fn aabb(&self) -> AABB {
        match &self.shape {
            Shape::Circle(circle) => {
                let r = Vec2::new(circle.radius, circle.radius);
                AABB::new(self.position - r, self.position + r)
            }
            Shape::Polygon(_) => AABB::from_points(&self.world_vertices)
                .unwrap_or_else(|| AABB::new(self.position, self.position)),
        }
    }
}

/// Wraps an angle in radians to [-PI, PI].
fn wrap_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}
