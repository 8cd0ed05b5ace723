//! A small 2D rigid-body physics engine built around a sub-stepped
//! sequential-impulse pipeline.
//!
//! A [`World`] owns its bodies and is driven with one [`World::update`]
//! call per frame. Each frame is split into fixed sub-steps; every
//! sub-step rediscovers contacts into a pooled manifold set, runs an
//! iterative impulse solver over them and finishes with a positional
//! correction pass so resting stacks neither sink nor jitter.
//!
//! ```
//! use rigid2d::{Material, Polygon, RigidBody, Shape, Vec2, World};
//!
//! let mut world = World::new();
//! world.add(RigidBody::new_static(
//!     Shape::Polygon(Polygon::rect(20.0, 2.0)),
//!     Vec2::new(0.0, 10.0),
//!     0.0,
//! ));
//!
//! let mut crate_body = RigidBody::new(Shape::Polygon(Polygon::rect(2.0, 2.0)), 1.0)
//!     .with_material(Material::new(0.1, 0.6));
//! crate_body.position = Vec2::new(0.0, 0.0);
//! let handle = world.add(crate_body);
//!
//! for _ in 0..60 {
//!     world.update(1.0 / 60.0);
//! }
//! let body = world.body(handle).unwrap();
//! assert!(body.position.y < 10.0);
//! ```

pub mod collision;
pub mod common;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

pub use collision::{test_collision, BodySlot, Manifold, AABB};
pub use common::Material;
pub use math::Vec2;
pub use objects::RigidBody;
pub use shapes::{Circle, Polygon, Shape};
pub use world::{BodyHandle, World};
