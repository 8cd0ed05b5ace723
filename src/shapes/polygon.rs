use crate::math::vec2::Vec2;

/// A convex polygon defined by its vertices in local space, ordered
/// counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon from a vertex list.
    ///
    /// Panics if fewer than 3 vertices are provided. Convexity is not
    /// validated; the narrow phase assumes it.
    pub fn new(vertices: Vec<Vec2>) -> Self {
        assert!(vertices.len() >= 3, "Polygon must have at least 3 vertices");
        Polygon { vertices }
    }

    /// An axis-aligned `width` x `height` rectangle centered on the local
    /// origin. The usual way to build box bodies.
    pub fn rect(width: f64, height: f64) -> Self {
        assert!(
            width > 0.0 && height > 0.0,
            "Rectangle dimensions must be positive"
        );
        let hw = width / 2.0;
        let hh = height / 2.0;
        Polygon {
            vertices: vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
        }
    }

    /// Area by the Shoelace formula.
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        let mut twice_area = 0.0;
        for i in 0..n {
            twice_area += self.vertices[i].cross(self.vertices[(i + 1) % n]);
        }
        (twice_area / 2.0).abs()
    }

    /// Centroid (center of mass for uniform density), by triangle-fan
    /// decomposition from the first vertex.
    pub fn centroid(&self) -> Vec2 {
        let n = self.vertices.len();
        let origin = self.vertices[0];
        let mut centroid = Vec2::ZERO;
        let mut signed_area = 0.0;

        for i in 1..(n - 1) {
            let b = self.vertices[i];
            let c = self.vertices[i + 1];
            let tri_area = (b - origin).cross(c - origin) / 2.0;
            signed_area += tri_area;
            centroid += (origin + b + c) / 3.0 * tri_area;
        }

        if signed_area.abs() < 1e-10 {
            // Collinear vertices; fall back to the vertex average
            let mut avg = Vec2::ZERO;
            for v in &self.vertices {
                avg += *v;
            }
            avg / (n as f64)
        } else {
            centroid / signed_area
        }
    }

    /// Moment of inertia about the centroid for the given density.
    /// Returns infinity for degenerate geometry.
    pub fn inertia(&self, density: f64) -> f64 {
        if density <= 0.0 {
            return f64::INFINITY;
        }
        let area = self.area();
        if area < 1e-10 {
            return f64::INFINITY;
        }

        // Inertia about the local origin, then shift to the centroid with
        // the parallel axis theorem.
        let n = self.vertices.len();
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            sum += a.cross(b) * (a.length_squared() + a.dot(b) + b.length_squared());
        }
        let inertia_origin = (sum / 12.0).abs() * density;

        let mass = area * density;
        let d_squared = self.centroid().length_squared();
        (inertia_origin - mass * d_squared).max(0.0)
    }
}
