//! Physical surface properties used when resolving contacts.

/// Restitution and friction coefficients of a body's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Coefficient of restitution (bounciness), clamped to [0, 1].
    pub restitution: f64,
    /// Coulomb friction coefficient, >= 0.
    pub friction: f64,
}

impl Material {
    pub fn new(restitution: f64, friction: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
        }
    }

    /// A frictionless, perfectly inelastic surface.
    pub fn frictionless() -> Self {
        Material {
            restitution: 0.0,
            friction: 0.0,
        }
    }
}

impl Default for Material {
    /// Moderate bounce, moderate friction.
    fn default() -> Self {
        Material {
            restitution: 0.2,
            friction: 0.5,
        }
    }
}
