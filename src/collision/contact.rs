//! Narrow-phase contact geometry.
//!
//! Given two bodies whose bounding boxes overlap, these routines decide
//! whether the shapes actually intersect and, if so, produce the contact
//! normal (pointing from the first body towards the second), the
//! penetration depth and up to two world-space contact points.

use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;
use crate::shapes::Shape;
use crate::world::World;

/// Result of a narrow-phase test between two overlapping shapes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContactGeometry {
    /// Unit normal pointing from body A towards body B.
    pub normal: Vec2,
    pub depth: f64,
    pub points: [Vec2; 2],
    pub count: usize,
}

/// Computes contact geometry for a body pair, or None when the shapes do
/// not intersect or the configuration is degenerate (coincident centers,
/// non-finite results).
pub(crate) fn compute(a: &RigidBody, b: &RigidBody) -> Option<ContactGeometry> {
    let geometry = match (&a.shape, &b.shape) {
        (Shape::Circle(ca), Shape::Circle(cb)) => {
            circle_circle(a.position, ca.radius, b.position, cb.radius)
        }
        (Shape::Circle(ca), Shape::Polygon(_)) => {
            circle_polygon(a.position, ca.radius, b.world_vertices(), b.position)
        }
        (Shape::Polygon(_), Shape::Circle(cb)) => {
            circle_polygon(b.position, cb.radius, a.world_vertices(), a.position)
                .map(ContactGeometry::flipped)
        }
        (Shape::Polygon(_), Shape::Polygon(_)) => {
            polygon_polygon(a.world_vertices(), a.position, b.world_vertices(), b.position)
        }
    }?;

    if !geometry.normal.is_finite() || !geometry.depth.is_finite() || geometry.count == 0 {
        return None;
    }
    Some(geometry)
}

impl ContactGeometry {
    /// The same contact seen from the other body: normal reversed,
    /// points unchanged.
    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

fn circle_circle(
    center_a: Vec2,
    radius_a: f64,
    center_b: Vec2,
    radius_b: f64,
) -> Option<ContactGeometry> {
    let delta = center_b - center_a;
    let dist_sq = delta.length_squared();
    let radii = radius_a + radius_b;
    if dist_sq >= radii * radii {
        return None;
    }

    let distance = dist_sq.sqrt();
    if distance < World::EPSILON {
        // Coincident centers leave the normal undefined
        return None;
    }

    let normal = delta * (1.0 / distance);
    Some(ContactGeometry {
        normal,
        depth: radii - distance,
        points: [center_a + normal * radius_a, Vec2::ZERO],
        count: 1,
    })
}

fn circle_polygon(
    center: Vec2,
    radius: f64,
    vertices: &[Vec2],
    polygon_center: Vec2,
) -> Option<ContactGeometry> {
    let mut normal = Vec2::ZERO;
    let mut depth = f64::MAX;
    let n = vertices.len();

    // Separating-axis test over the polygon's edge normals
    for i in 0..n {
        let edge = vertices[(i + 1) % n] - vertices[i];
        let axis = edge.perp().normalize();
        let (min_p, max_p) = project_vertices(axis, vertices);
        let (min_c, max_c) = project_circle(axis, center, radius);
        if min_p >= max_c || min_c >= max_p {
            return None;
        }
        let axis_depth = (max_c - min_p).min(max_p - min_c);
        if axis_depth < depth {
            depth = axis_depth;
            normal = axis;
        }
    }

    // One more axis: from the circle center to the closest vertex. This is
    // the potential separating direction SAT over edges alone misses.
    let closest = closest_vertex(center, vertices);
    let axis = (closest - center).normalize();
    if axis.length_squared() > 0.0 {
        let (min_p, max_p) = project_vertices(axis, vertices);
        let (min_c, max_c) = project_circle(axis, center, radius);
        if min_p >= max_c || min_c >= max_p {
            return None;
        }
        let axis_depth = (max_c - min_p).min(max_p - min_c);
        if axis_depth < depth {
            depth = axis_depth;
            normal = axis;
        }
    }

    if normal.length_squared() < World::EPSILON * World::EPSILON {
        return None;
    }

    // Orient the normal from the circle towards the polygon
    if (polygon_center - center).dot(normal) < 0.0 {
        normal = -normal;
    }

    // Contact point: closest point on the polygon's boundary to the center
    let mut best_dist = f64::MAX;
    let mut point = Vec2::ZERO;
    for i in 0..n {
        let (dist_sq, candidate) =
            closest_point_on_segment(center, vertices[i], vertices[(i + 1) % n]);
        if dist_sq < best_dist {
            best_dist = dist_sq;
            point = candidate;
        }
    }

    Some(ContactGeometry {
        normal,
        depth,
        points: [point, Vec2::ZERO],
        count: 1,
    })
}

fn polygon_polygon(
    vertices_a: &[Vec2],
    center_a: Vec2,
    vertices_b: &[Vec2],
    center_b: Vec2,
) -> Option<ContactGeometry> {
    let mut normal = Vec2::ZERO;
    let mut depth = f64::MAX;

    for vertices in [vertices_a, vertices_b] {
        let n = vertices.len();
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            let axis = edge.perp().normalize();
            let (min_a, max_a) = project_vertices(axis, vertices_a);
            let (min_b, max_b) = project_vertices(axis, vertices_b);
            if min_a >= max_b || min_b >= max_a {
                return None;
            }
            let axis_depth = (max_b - min_a).min(max_a - min_b);
            if axis_depth < depth {
                depth = axis_depth;
                normal = axis;
            }
        }
    }

    if normal.length_squared() < World::EPSILON * World::EPSILON {
        return None;
    }

    // Orient the normal from A towards B
    if (center_b - center_a).dot(normal) < 0.0 {
        normal = -normal;
    }

    let (points, count) = polygon_contact_points(vertices_a, vertices_b);
    Some(ContactGeometry {
        normal,
        depth,
        points,
        count,
    })
}

/// Finds up to two contact points between two convex polygons: the vertex /
/// edge pairings at minimal distance, deduplicated when two candidates land
/// on the same spot (a face-face contact produces two distinct points).
fn polygon_contact_points(vertices_a: &[Vec2], vertices_b: &[Vec2]) -> ([Vec2; 2], usize) {
    let mut first = Vec2::ZERO;
    let mut second = Vec2::ZERO;
    let mut count = 0;
    let mut min_dist = f64::MAX;

    for (verts, others) in [(vertices_a, vertices_b), (vertices_b, vertices_a)] {
        for &p in verts {
            let n = others.len();
            for i in 0..n {
                let (dist_sq, candidate) =
                    closest_point_on_segment(p, others[i], others[(i + 1) % n]);

                if nearly_equal(dist_sq, min_dist) {
                    if !nearly_equal_vec(candidate, first) && count < 2 {
                        second = candidate;
                        count = 2;
                    }
                } else if dist_sq < min_dist {
                    min_dist = dist_sq;
                    first = candidate;
                    count = 1;
                }
            }
        }
    }

    ([first, second], count)
}

/// Closest point to `point` on the segment [a, b] and the squared distance
/// to it.
fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> (f64, Vec2) {
    let ab = b - a;
    let length_sq = ab.length_squared();
    let closest = if length_sq < 1e-12 {
        a
    } else {
        let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
        a + ab * t
    };
    (point.distance_squared(closest), closest)
}

fn project_vertices(axis: Vec2, vertices: &[Vec2]) -> (f64, f64) {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for &v in vertices {
        let projection = v.dot(axis);
        min = min.min(projection);
        max = max.max(projection);
    }
    (min, max)
}

fn project_circle(axis: Vec2, center: Vec2, radius: f64) -> (f64, f64) {
    let center_projection = center.dot(axis);
    (center_projection - radius, center_projection + radius)
}

fn closest_vertex(point: Vec2, vertices: &[Vec2]) -> Vec2 {
    let mut best = vertices[0];
    let mut best_dist = f64::MAX;
    for &v in vertices {
        let dist = point.distance_squared(v);
        if dist < best_dist {
            best_dist = dist;
            best = v;
        }
    }
    best
}

fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < World::EPSILON
}

fn nearly_equal_vec(a: Vec2, b: Vec2) -> bool {
    nearly_equal(a.x, b.x) && nearly_equal(a.y, b.y)
}
