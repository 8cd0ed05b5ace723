pub mod aabb;
pub mod contact;
pub mod manifold;

pub use aabb::AABB;
pub use manifold::{BodySlot, Manifold};

use crate::objects::rigid_body::RigidBody;

/// Broad-phase overlap test: cheap world-space AABB check. A true result
/// is an over-approximation; `Manifold::initialize_with_bodies` is the
/// authoritative narrow-phase commit.
pub fn test_collision(a: &RigidBody, b: &RigidBody) -> bool {
    a.aabb().overlaps(&b.aabb())
}
