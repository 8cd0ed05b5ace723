//! The simulation world: body lists, the pooled contact set and the
//! sub-stepped update pipeline.

use crate::collision::manifold::{BodySlot, Manifold};
use crate::collision::test_collision;
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;

/// Stable reference to a body owned by a [`World`], returned by
/// [`World::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u64);

/// Owns the static and dynamic body lists plus the manifold pool, and
/// advances the simulation one frame at a time.
///
/// Manifolds are pooled: the pool grows until it reaches the peak number
/// of simultaneous contacts the scene has ever had, then every frame
/// reuses the same slots. `contact_count` is the only length that matters;
/// slots beyond it hold stale bindings and are never read.
#[derive(Debug)]
pub struct World {
    gravity: Vec2,
    steps: usize,
    iterations: usize,
    interp: f64,
    statics: Vec<RigidBody>,
    dynamics: Vec<RigidBody>,
    contacts: Vec<Manifold>,
    contact_count: usize,
    next_id: u64,
}

impl World {
    /// Shared "close enough to zero" tolerance for collision and
    /// resolution code.
    pub const EPSILON: f64 = 0.0001;

    /// A world with default configuration: gravity (0, 50), 10 sub-steps
    /// per frame, 10 solver iterations per sub-step.
    pub fn new() -> Self {
        Self::with_config(Vec2::new(0.0, 50.0), 10, 10)
    }

    /// A world with explicit configuration, fixed for its lifetime.
    /// `steps` and `iterations` are clamped to a minimum of 1.
    pub fn with_config(gravity: Vec2, steps: usize, iterations: usize) -> Self {
        let steps = steps.max(1);
        World {
            gravity,
            steps,
            iterations: iterations.max(1),
            interp: 1.0 / steps as f64,
            statics: Vec::new(),
            dynamics: Vec::new(),
            contacts: Vec::new(),
            contact_count: 0,
            next_id: 1,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Hands a body to the world. A body with zero inverse mass joins the
    /// statics list, any other the dynamics list. The classification is
    /// fixed here: changing the body's mass afterwards does not move it
    /// between lists (remove and re-add to reclassify).
    pub fn add(&mut self, mut body: RigidBody) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        body.id = handle.0;
        body.update();
        if body.inv_mass != 0.0 {
            self.dynamics.push(body);
        } else {
            self.statics.push(body);
        }
        handle
    }

    /// Removes a body, searching the statics then the dynamics list.
    /// Returns the body, or None (a silent no-op) if the handle is not
    /// present in either list.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        if let Some(index) = self.statics.iter().position(|b| b.id == handle.0) {
            return Some(self.statics.remove(index));
        }
        if let Some(index) = self.dynamics.iter().position(|b| b.id == handle.0) {
            return Some(self.dynamics.remove(index));
        }
        None
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.statics
            .iter()
            .chain(self.dynamics.iter())
            .find(|b| b.id == handle.0)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.statics
            .iter_mut()
            .chain(self.dynamics.iter_mut())
            .find(|b| b.id == handle.0)
    }

    pub fn statics(&self) -> &[RigidBody] {
        &self.statics
    }

    pub fn dynamics(&self) -> &[RigidBody] {
        &self.dynamics
    }

    /// Number of contacts active in the most recent sub-step.
    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    /// Current size of the manifold pool (its historical peak of
    /// simultaneous contacts).
    pub fn pool_size(&self) -> usize {
        self.contacts.len()
    }

    /// The manifolds bound in the most recent sub-step. Slots beyond the
    /// active count are stale and deliberately not exposed.
    pub fn active_contacts(&self) -> &[Manifold] {
        &self.contacts[..self.contact_count]
    }

    /// Advances the simulation by one frame.
    ///
    /// The frame is divided into equal sub-steps: resolving contacts at a
    /// finer time granularity is what keeps stacked and resting bodies
    /// from jittering, while the per-sub-step solver iterations refine
    /// constraint convergence within one time sample. Forces accumulated
    /// on dynamic bodies are consumed across the sub-steps and cleared
    /// exactly once after the last one.
    pub fn update(&mut self, dt: f64) {
        let sub_dt = dt * self.interp;
        for _ in 0..self.steps {
            self.step(sub_dt);
        }
        for body in self.dynamics.iter_mut() {
            body.clear_forces();
        }
    }

    /// One sub-step of the pipeline. The stage order matters: contacts are
    /// discovered at the current positions, forces reach velocities before
    /// the solver sees them, and positional correction runs after the
    /// positions it corrects were written.
    fn step(&mut self, dt: f64) {
        self.find_contacts();

        let gravity = self.gravity;
        for body in self.dynamics.iter_mut() {
            body.integrate_forces(dt, gravity);
        }

        let World {
            statics,
            dynamics,
            contacts,
            contact_count,
            iterations,
            ..
        } = self;
        let active = &mut contacts[..*contact_count];

        for manifold in active.iter_mut() {
            let (a, b) = slot_pair_mut(statics, dynamics, manifold.body_a(), manifold.body_b());
            manifold.setup(dt, gravity, a, b);
        }

        for _ in 0..*iterations {
            for manifold in active.iter_mut() {
                let (a, b) =
                    slot_pair_mut(statics, dynamics, manifold.body_a(), manifold.body_b());
                manifold.resolve_all_contacts(a, b);
            }
        }

        for body in dynamics.iter_mut() {
            body.integrate_velocity(dt, gravity);
        }

        for manifold in active.iter_mut() {
            let (a, b) = slot_pair_mut(statics, dynamics, manifold.body_a(), manifold.body_b());
            manifold.correct_positions(a, b);
        }

        for body in dynamics.iter_mut() {
            body.update();
        }
    }

    /// Rebuilds the active contact set for the current body positions:
    /// every dynamic against every static, and every dynamic pair (i, j)
    /// with i < j. Two statics are never tested against each other.
    fn find_contacts(&mut self) {
        self.contact_count = 0;
        let World {
            statics,
            dynamics,
            contacts,
            contact_count,
            ..
        } = self;

        for i in 0..dynamics.len() {
            for j in 0..statics.len() {
                Self::check_and_solve_collision(
                    contacts,
                    contact_count,
                    &dynamics[i],
                    &statics[j],
                    BodySlot::Dynamic(i),
                    BodySlot::Static(j),
                );
            }
            for j in (i + 1)..dynamics.len() {
                Self::check_and_solve_collision(
                    contacts,
                    contact_count,
                    &dynamics[i],
                    &dynamics[j],
                    BodySlot::Dynamic(i),
                    BodySlot::Dynamic(j),
                );
            }
        }
    }

    /// Two-stage contact commit: the broad predicate may over-approximate,
    /// so a pool slot is prepared but `contact_count` only advances when
    /// the narrow phase confirms a valid contact. Reuses the slot at
    /// `contact_count` when the pool already has one, growing the pool
    /// otherwise.
    fn check_and_solve_collision(
        pool: &mut Vec<Manifold>,
        count: &mut usize,
        body_a: &RigidBody,
        body_b: &RigidBody,
        slot_a: BodySlot,
        slot_b: BodySlot,
    ) {
        if !test_collision(body_a, body_b) {
            return;
        }

        if pool.len() == *count {
            pool.push(Manifold::new());
        }

        if pool[*count].initialize_with_bodies(slot_a, slot_b, body_a, body_b) {
            *count += 1;
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a pair of body slots to simultaneous mutable references.
/// Dynamic pairs come out of discovery with i < j, so `split_at_mut`
/// always has a valid split point.
fn slot_pair_mut<'a>(
    statics: &'a mut [RigidBody],
    dynamics: &'a mut [RigidBody],
    a: BodySlot,
    b: BodySlot,
) -> (&'a mut RigidBody, &'a mut RigidBody) {
    match (a, b) {
        (BodySlot::Dynamic(i), BodySlot::Static(j)) => (&mut dynamics[i], &mut statics[j]),
        (BodySlot::Static(i), BodySlot::Dynamic(j)) => (&mut statics[i], &mut dynamics[j]),
        (BodySlot::Dynamic(i), BodySlot::Dynamic(j)) => {
            debug_assert!(i < j);
            let (head, tail) = dynamics.split_at_mut(j);
            (&mut head[i], &mut tail[0])
        }
        (BodySlot::Static(_), BodySlot::Static(_)) => {
            unreachable!("discovery never pairs two static bodies")
        }
    }
}
