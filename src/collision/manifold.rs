//! Pooled contact manifolds and the sequential-impulse resolution they own.

use crate::collision::contact;
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;
use crate::world::World;

/// Fraction of the remaining penetration removed per positional pass.
/// Under-correcting avoids oscillation across sub-steps.
const CORRECTION_PERCENT: f64 = 0.2;
/// Penetration below this is tolerated rather than corrected.
const PENETRATION_SLOP: f64 = 0.01;

/// Where a bound body lives inside the world: which list, which index.
/// Only meaningful for the sub-step that bound it; contact discovery
/// rebinds every active manifold each sub-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySlot {
    Static(usize),
    Dynamic(usize),
}

/// One contact point with its accumulated impulses and precomputed
/// effective masses.
#[derive(Debug, Clone, Copy, Default)]
struct Contact {
    position: Vec2,
    /// Lever arm from body A's center of mass to the contact.
    r_a: Vec2,
    /// Lever arm from body B's center of mass to the contact.
    r_b: Vec2,
    normal_mass: f64,
    tangent_mass: f64,
    normal_impulse: f64,
    tangent_impulse: f64,
}

/// The resolved contact between one pair of bodies for one sub-step.
///
/// Manifold objects live in the world's pool and are rebound to a new pair
/// every discovery pass; impulse accumulators are only valid between the
/// `setup` call and the end of the sub-step that made it.
#[derive(Debug, Clone)]
pub struct Manifold {
    a: BodySlot,
    b: BodySlot,
    /// Unit contact normal, pointing from body A towards body B.
    normal: Vec2,
    penetration: f64,
    contacts: [Contact; 2],
    contact_count: usize,
    restitution: f64,
    friction: f64,
}

impl Manifold {
    /// A fresh, unbound pool slot.
    pub(crate) fn new() -> Self {
        Manifold {
            a: BodySlot::Dynamic(0),
            b: BodySlot::Dynamic(0),
            normal: Vec2::ZERO,
            penetration: 0.0,
            contacts: [Contact::default(); 2],
            contact_count: 0,
            restitution: 0.0,
            friction: 0.0,
        }
    }

    pub fn body_a(&self) -> BodySlot {
        self.a
    }

    pub fn body_b(&self) -> BodySlot {
        self.b
    }

    /// Contact normal, pointing from body A towards body B.
    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    pub fn penetration(&self) -> f64 {
        self.penetration
    }

    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    /// World-space position of contact point `index`.
    pub fn contact_point(&self, index: usize) -> Vec2 {
        assert!(index < self.contact_count);
        self.contacts[index].position
    }

    /// Binds this slot to a candidate pair and computes the authoritative
    /// contact geometry. Returns false, leaving the slot unbound, for
    /// pairs that do not actually touch, for two immovable bodies, and for
    /// degenerate geometry that would feed NaN into the solver.
    ///
    /// Impulse accumulators are reset here; bindings never survive a
    /// discovery pass, so there is nothing to warm-start from.
    pub(crate) fn initialize_with_bodies(
        &mut self,
        slot_a: BodySlot,
        slot_b: BodySlot,
        body_a: &RigidBody,
        body_b: &RigidBody,
    ) -> bool {
        if body_a.inv_mass + body_b.inv_mass == 0.0 {
            return false;
        }

        let geometry = match contact::compute(body_a, body_b) {
            Some(g) => g,
            None => return false,
        };
        if geometry.depth < World::EPSILON
            || geometry.normal.length_squared() < World::EPSILON * World::EPSILON
        {
            return false;
        }

        self.a = slot_a;
        self.b = slot_b;
        self.normal = geometry.normal;
        self.penetration = geometry.depth;
        self.contact_count = geometry.count;
        for i in 0..geometry.count {
            self.contacts[i] = Contact {
                position: geometry.points[i],
                ..Contact::default()
            };
        }
        true
    }

    /// Precomputes everything the iterative passes need: mixed surface
    /// coefficients, lever arms and effective masses per contact point.
    ///
    /// A contact whose approach speed is within what one gravity tick can
    /// produce is a resting contact and gets zero restitution, so stacks
    /// settle instead of accumulating bounce energy.
    pub(crate) fn setup(&mut self, dt: f64, gravity: Vec2, body_a: &RigidBody, body_b: &RigidBody) {
        self.restitution = body_a
            .material
            .restitution
            .min(body_b.material.restitution);
        self.friction = (body_a.material.friction * body_b.material.friction).sqrt();

        let normal = self.normal;
        let tangent = normal.perp();
        let resting_limit = (gravity * dt).length() + World::EPSILON;
        let mut fastest_approach = 0.0_f64;

        for contact in self.contacts[..self.contact_count].iter_mut() {
            contact.r_a = contact.position - body_a.position;
            contact.r_b = contact.position - body_b.position;

            let ra_cross_n = contact.r_a.cross(normal);
            let rb_cross_n = contact.r_b.cross(normal);
            let k_normal = body_a.inv_mass
                + body_b.inv_mass
                + ra_cross_n * ra_cross_n * body_a.inv_inertia
                + rb_cross_n * rb_cross_n * body_b.inv_inertia;
            contact.normal_mass = if k_normal > World::EPSILON {
                1.0 / k_normal
            } else {
                0.0
            };

            let ra_cross_t = contact.r_a.cross(tangent);
            let rb_cross_t = contact.r_b.cross(tangent);
            let k_tangent = body_a.inv_mass
                + body_b.inv_mass
                + ra_cross_t * ra_cross_t * body_a.inv_inertia
                + rb_cross_t * rb_cross_t * body_b.inv_inertia;
            contact.tangent_mass = if k_tangent > World::EPSILON {
                1.0 / k_tangent
            } else {
                0.0
            };

            let approach =
                -relative_velocity(body_a, body_b, contact.r_a, contact.r_b).dot(normal);
            fastest_approach = fastest_approach.max(approach);
        }

        if fastest_approach < resting_limit {
            self.restitution = 0.0;
        }
    }

    /// One sequential-impulse pass over all contact points: a normal
    /// impulse with the accumulator clamped to pushing-only, then a
    /// friction impulse clamped to the Coulomb cone.
    pub(crate) fn resolve_all_contacts(&mut self, body_a: &mut RigidBody, body_b: &mut RigidBody) {
        let normal = self.normal;
        let tangent = normal.perp();
        let restitution = self.restitution;
        let friction = self.friction;

        for contact in self.contacts[..self.contact_count].iter_mut() {
            let velocity = relative_velocity(body_a, body_b, contact.r_a, contact.r_b);
            let velocity_normal = velocity.dot(normal);
            if velocity_normal > 0.0 {
                // Already separating; contacts only push
                continue;
            }

            let lambda = -(1.0 + restitution) * velocity_normal * contact.normal_mass;
            let total = (contact.normal_impulse + lambda).max(0.0);
            let applied = total - contact.normal_impulse;
            contact.normal_impulse = total;
            apply_impulse(body_a, body_b, contact.r_a, contact.r_b, normal * applied);

            // Friction sees the velocity left after the normal impulse
            let velocity = relative_velocity(body_a, body_b, contact.r_a, contact.r_b);
            let lambda_t = -velocity.dot(tangent) * contact.tangent_mass;
            let max_tangent = friction * contact.normal_impulse;
            let total_t = (contact.tangent_impulse + lambda_t).clamp(-max_tangent, max_tangent);
            let applied_t = total_t - contact.tangent_impulse;
            contact.tangent_impulse = total_t;
            apply_impulse(body_a, body_b, contact.r_a, contact.r_b, tangent * applied_t);
        }
    }

    /// Displaces the bodies apart along the normal to remove part of the
    /// penetration the velocity solve leaves behind. Pure position change,
    /// weighted by inverse mass: it never injects kinetic energy and never
    /// overshoots past separation.
    pub(crate) fn correct_positions(&mut self, body_a: &mut RigidBody, body_b: &mut RigidBody) {
        let magnitude = (self.penetration - PENETRATION_SLOP).max(0.0);
        if magnitude < World::EPSILON {
            return;
        }
        let total_inv_mass = body_a.inv_mass + body_b.inv_mass;
        if total_inv_mass < World::EPSILON {
            return;
        }

        let correction = self.normal * (magnitude / total_inv_mass * CORRECTION_PERCENT);
        body_a.position -= correction * body_a.inv_mass;
        body_b.position += correction * body_b.inv_mass;
    }
}

/// Velocity of body B relative to body A at a contact, including the
/// contribution of both angular velocities.
fn relative_velocity(body_a: &RigidBody, body_b: &RigidBody, r_a: Vec2, r_b: Vec2) -> Vec2 {
    body_b.linear_velocity + r_b.perp() * body_b.angular_velocity
        - body_a.linear_velocity
        - r_a.perp() * body_a.angular_velocity
}

/// Applies an equal-and-opposite impulse at the given lever arms.
fn apply_impulse(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    r_a: Vec2,
    r_b: Vec2,
    impulse: Vec2,
) {
    body_a.linear_velocity -= impulse * body_a.inv_mass;
    body_a.angular_velocity -= r_a.cross(impulse) * body_a.inv_inertia;
    body_b.linear_velocity += impulse * body_b.inv_mass;
    body_b.angular_velocity += r_b.cross(impulse) * body_b.inv_inertia;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::material::Material;
    use crate::shapes::{Circle, Polygon, Shape};

    const EPSILON: f64 = 1e-9;

    fn circle_at(position: Vec2, radius: f64, density: f64) -> RigidBody {
        let mut body = RigidBody::new(Shape::Circle(Circle::new(radius)), density);
        body.position = position;
        body.update();
        body
    }

    fn static_rect_at(position: Vec2, width: f64, height: f64) -> RigidBody {
        RigidBody::new_static(Shape::Polygon(Polygon::rect(width, height)), position, 0.0)
    }

    fn slots() -> (BodySlot, BodySlot) {
        (BodySlot::Dynamic(0), BodySlot::Dynamic(1))
    }

    #[test]
    fn test_initialize_rejects_static_pair() {
        let a = static_rect_at(Vec2::new(0.0, 0.0), 2.0, 2.0);
        let b = static_rect_at(Vec2::new(0.5, 0.0), 2.0, 2.0);
        let mut manifold = Manifold::new();
        assert!(!manifold.initialize_with_bodies(
            BodySlot::Static(0),
            BodySlot::Static(1),
            &a,
            &b
        ));
    }

    #[test]
    fn test_initialize_rejects_separated_pair() {
        let a = circle_at(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle_at(Vec2::new(5.0, 0.0), 1.0, 1.0);
        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(!manifold.initialize_with_bodies(sa, sb, &a, &b));
    }

    #[test]
    fn test_initialize_rejects_coincident_circles() {
        let a = circle_at(Vec2::new(1.0, 1.0), 1.0, 1.0);
        let b = circle_at(Vec2::new(1.0, 1.0), 1.0, 1.0);
        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(!manifold.initialize_with_bodies(sa, sb, &a, &b));
    }

    #[test]
    fn test_initialize_binds_overlapping_pair() {
        let a = circle_at(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle_at(Vec2::new(1.5, 0.0), 1.0, 1.0);
        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        assert_eq!(manifold.body_a(), sa);
        assert_eq!(manifold.body_b(), sb);
        assert!((manifold.penetration() - 0.5).abs() < EPSILON);
        assert_eq!(manifold.contact_count(), 1);
        assert!((manifold.normal().x - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_initialize_resets_accumulators() {
        let a = circle_at(Vec2::new(0.0, 0.0), 1.0, 1.0);
        let b = circle_at(Vec2::new(1.5, 0.0), 1.0, 1.0);
        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        manifold.contacts[0].normal_impulse = 42.0;
        manifold.contacts[0].tangent_impulse = -7.0;
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        assert_eq!(manifold.contacts[0].normal_impulse, 0.0);
        assert_eq!(manifold.contacts[0].tangent_impulse, 0.0);
    }

    #[test]
    fn test_head_on_impulse() {
        // Equal bodies closing head-on; with e = 0.2 they must leave with
        // a fifth of the approach speed each.
        let density = 1.0 / std::f64::consts::PI; // unit mass for r = 1
        let mut a = circle_at(Vec2::new(-0.95, 0.0), 1.0, density);
        let mut b = circle_at(Vec2::new(0.95, 0.0), 1.0, density);
        a.linear_velocity = Vec2::new(10.0, 0.0);
        b.linear_velocity = Vec2::new(-10.0, 0.0);

        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        manifold.setup(0.01, Vec2::ZERO, &mut a, &mut b);
        manifold.resolve_all_contacts(&mut a, &mut b);

        // v_rel = -20 along the normal, effective mass 1/2:
        // lambda = 1.2 * 20 / 2 = 12, each body changes by 12 * inv_mass
        assert!((a.linear_velocity.x - (-2.0)).abs() < 1e-6);
        assert!((b.linear_velocity.x - 2.0).abs() < 1e-6);
        assert!(a.linear_velocity.y.abs() < EPSILON);
        assert!(a.angular_velocity.abs() < EPSILON);
    }

    #[test]
    fn test_resolve_skips_separating_contact() {
        let mut a = circle_at(Vec2::new(-0.95, 0.0), 1.0, 1.0);
        let mut b = circle_at(Vec2::new(0.95, 0.0), 1.0, 1.0);
        a.linear_velocity = Vec2::new(-5.0, 0.0);
        b.linear_velocity = Vec2::new(5.0, 0.0);

        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        manifold.setup(0.01, Vec2::ZERO, &mut a, &mut b);
        manifold.resolve_all_contacts(&mut a, &mut b);

        // Already separating: no impulse applied
        assert_eq!(a.linear_velocity, Vec2::new(-5.0, 0.0));
        assert_eq!(b.linear_velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_resting_contact_loses_restitution() {
        // A slow approach (one gravity tick's worth) must resolve dead,
        // a fast approach must keep its bounce.
        let gravity = Vec2::new(0.0, 50.0);
        let dt = 1.0 / 600.0;
        let bouncy = Material::new(0.8, 0.5);

        let mut a = circle_at(Vec2::new(0.0, 0.0), 1.0, 1.0).with_material(bouncy);
        let mut b = circle_at(Vec2::new(0.0, 1.9), 1.0, 1.0).with_material(bouncy);
        a.linear_velocity = Vec2::new(0.0, gravity.y * dt * 0.5);

        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        manifold.setup(dt, gravity, &mut a, &mut b);
        assert_eq!(manifold.restitution, 0.0);

        a.linear_velocity = Vec2::new(0.0, 10.0);
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        manifold.setup(dt, gravity, &mut a, &mut b);
        assert!((manifold.restitution - 0.8).abs() < EPSILON);
    }

    #[test]
    fn test_correct_positions_separates_bodies() {
        let mut a = circle_at(Vec2::new(-0.5, 0.0), 1.0, 1.0);
        let mut b = circle_at(Vec2::new(0.5, 0.0), 1.0, 1.0);
        let inv_mass = a.inv_mass;

        let (sa, sb) = slots();
        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(sa, sb, &a, &b));
        assert!((manifold.penetration() - 1.0).abs() < EPSILON);
        manifold.correct_positions(&mut a, &mut b);

        // correction = (depth - slop) * percent / total_inv_mass, split by
        // inverse mass
        let expected_shift = (1.0 - PENETRATION_SLOP) * CORRECTION_PERCENT
            / (2.0 * inv_mass)
            * inv_mass;
        assert!((a.position.x - (-0.5 - expected_shift)).abs() < EPSILON);
        assert!((b.position.x - (0.5 + expected_shift)).abs() < EPSILON);
        assert_eq!(a.linear_velocity, Vec2::ZERO);
        assert_eq!(b.linear_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_correct_positions_monotonic() {
        // Repeated correction passes shrink penetration and never push the
        // bodies past separation
        let mut a = circle_at(Vec2::new(-0.7, 0.0), 1.0, 1.0);
        let mut b = circle_at(Vec2::new(0.7, 0.0), 1.0, 1.0);
        let (sa, sb) = slots();

        let mut previous_depth = f64::MAX;
        for _ in 0..50 {
            let mut manifold = Manifold::new();
            if !manifold.initialize_with_bodies(sa, sb, &a, &b) {
                break;
            }
            let depth = manifold.penetration();
            assert!(depth <= previous_depth + EPSILON);
            previous_depth = depth;
            manifold.correct_positions(&mut a, &mut b);
            a.update();
            b.update();
        }
        // Converged to at most the slop, not flung apart
        assert!(a.position.distance(b.position) <= 2.0 + PENETRATION_SLOP + EPSILON);
    }

    #[test]
    fn test_correct_positions_leaves_static_in_place() {
        let mut floor = static_rect_at(Vec2::new(0.0, 1.0), 10.0, 2.0);
        let mut ball = circle_at(Vec2::new(0.0, -0.9), 1.0, 1.0);
        let floor_position = floor.position;

        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(
            BodySlot::Dynamic(0),
            BodySlot::Static(0),
            &ball,
            &floor
        ));
        manifold.correct_positions(&mut ball, &mut floor);

        assert_eq!(floor.position, floor_position);
        // The ball moved up and out (-y is away from the floor)
        assert!(ball.position.y < -0.9);
    }

    #[test]
    fn test_friction_slows_sliding() {
        // A ball pressed onto a static floor while sliding sideways: the
        // friction impulse must reduce the tangential speed.
        let gravity = Vec2::new(0.0, 50.0);
        let dt = 1.0 / 600.0;
        let mut floor = static_rect_at(Vec2::new(0.0, 1.0), 10.0, 2.0);
        let mut ball = circle_at(Vec2::new(0.0, -0.95), 1.0, 1.0);
        ball.linear_velocity = Vec2::new(3.0, 0.5);

        let mut manifold = Manifold::new();
        assert!(manifold.initialize_with_bodies(
            BodySlot::Dynamic(0),
            BodySlot::Static(0),
            &ball,
            &floor
        ));
        manifold.setup(dt, gravity, &mut ball, &mut floor);
        for _ in 0..10 {
            manifold.resolve_all_contacts(&mut ball, &mut floor);
        }

        // Normal motion resolved, tangential motion reduced but not
        // reversed
        assert!(ball.linear_velocity.y <= EPSILON);
        assert!(ball.linear_velocity.x < 3.0);
        assert!(ball.linear_velocity.x >= 0.0);
    }
}
