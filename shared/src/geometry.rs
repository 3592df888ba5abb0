//! Pure geometric primitives shared by the simulator and the gadget model.
//!
//! Every function here is a pure function of its arguments: no state, no
//! allocation, no I/O. `engine` is the only consumer, but the types live here
//! because the wire protocol also needs to talk about positions and
//! velocities without depending on the whole simulator.

use std::ops::{Add, Mul, Sub};

/// Clustered numerical tolerances, grouped by what they guard against rather
/// than by magnitude alone. Keeping them in one place means a retune only
/// ever touches this module.
pub mod eps {
    /// Below this, a time-to-collision is treated as "now".
    pub const EPS_NOW: f64 = 1e-14;
    /// Tangential offsets below this are considered coincident.
    pub const EPS_TANGENT: f64 = 1e-12;
    /// Distance comparisons (containment, overlap) below this are "touching".
    pub const EPS_DIST: f64 = 1e-9;
    /// Degenerate geometry (zero-length segment, zero relative speed).
    pub const EPS_DEGENERATE: f64 = 1e-16;
    /// Velocity magnitudes below this are treated as stationary.
    pub const EPS_VELOCITY: f64 = 1e-7;
    /// Angle comparisons (cardinal snapping, endpoint clamping).
    pub const EPS_ANGLE: f64 = 1e-3;
}

/// A point or a displacement in board units.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vector2 { x, y }
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn scale(self, k: f64) -> Vector2 {
        Vector2::new(self.x * k, self.y * k)
    }

    pub fn normalize(self) -> Vector2 {
        let len = self.length();
        if len < eps::EPS_DEGENERATE {
            Vector2::ZERO
        } else {
            self.scale(1.0 / len)
        }
    }

    /// Perpendicular vector, rotated 90° counter-clockwise.
    pub fn perpendicular(self) -> Vector2 {
        Vector2::new(-self.y, self.x)
    }

    /// Scales `self` down to `max` length if it exceeds it; leaves shorter
    /// vectors untouched.
    pub fn clamp_length(self, max: f64) -> Vector2 {
        let len = self.length();
        if len > max && len > eps::EPS_DEGENERATE {
            self.scale(max / len)
        } else {
            self
        }
    }

    /// Rotates `self` about `pivot` by `angle` radians, counter-clockwise.
    pub fn rotate_around(self, pivot: Vector2, angle: f64) -> Vector2 {
        let (sin, cos) = angle.sin_cos();
        let rel = self - pivot;
        pivot
            + Vector2::new(
                rel.x * cos - rel.y * sin,
                rel.x * sin + rel.y * cos,
            )
    }

    /// The instantaneous velocity of a point rigidly rotating about `pivot`
    /// with angular speed `omega` (rad/s), evaluated at `self`.
    pub fn tangential_velocity(self, pivot: Vector2, omega: f64) -> Vector2 {
        let rel = self - pivot;
        Vector2::new(-omega * rel.y, omega * rel.x)
    }
}

impl Add for Vector2 {
    type Output = Vector2;
    fn add(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;
    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;
    fn mul(self, k: f64) -> Vector2 {
        self.scale(k)
    }
}

/// A signed radian value, canonicalised for comparison against the four
/// cardinal orientations rather than stored canonically itself — callers
/// that need the raw value (e.g. to accumulate a sweep) keep using `f64`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Angle(pub f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);
    const CARDINALS: [f64; 4] = [0.0, std::f64::consts::FRAC_PI_2, std::f64::consts::PI, 3.0 * std::f64::consts::FRAC_PI_2];

    pub fn from_degrees(deg: f64) -> Self {
        Angle(deg.to_radians())
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Wraps into `[0, 2π)`.
    pub fn normalize(self) -> Angle {
        let two_pi = std::f64::consts::TAU;
        let mut r = self.0 % two_pi;
        if r < 0.0 {
            r += two_pi;
        }
        Angle(r)
    }

    /// The cardinal orientation this angle is closest to, within
    /// `eps::EPS_ANGLE`. Returns `None` if no cardinal is within tolerance.
    pub fn nearest_cardinal(self) -> Option<Angle> {
        let normalized = self.normalize().0;
        Self::CARDINALS
            .iter()
            .copied()
            .find(|c| (c - normalized).abs() < eps::EPS_ANGLE || (c - normalized).abs() > std::f64::consts::TAU - eps::EPS_ANGLE)
            .map(Angle)
    }
}

/// A circle. Radius 0 represents a corner point used for smooth-corner
/// reflection off a bumper's vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vector2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Vector2, radius: f64) -> Self {
        Circle { center, radius }
    }

    pub fn rotate_around(self, pivot: Vector2, angle: f64) -> Circle {
        Circle::new(self.center.rotate_around(pivot, angle), self.radius)
    }

    pub fn contains(self, point: Vector2) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius + eps::EPS_DIST
    }
}

/// A line segment with an implicit two-sided normal — which side is "outside"
/// is a property of the gadget that owns the segment, not of the segment
/// itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub p1: Vector2,
    pub p2: Vector2,
}

impl Segment {
    pub fn new(p1: Vector2, p2: Vector2) -> Self {
        Segment { p1, p2 }
    }

    pub fn direction(self) -> Vector2 {
        (self.p2 - self.p1).normalize()
    }

    pub fn length(self) -> f64 {
        (self.p2 - self.p1).length()
    }

    /// Unit normal, 90° counter-clockwise from the segment direction.
    pub fn normal(self) -> Vector2 {
        self.direction().perpendicular()
    }

    pub fn rotate_around(self, pivot: Vector2, angle: f64) -> Segment {
        Segment::new(
            self.p1.rotate_around(pivot, angle),
            self.p2.rotate_around(pivot, angle),
        )
    }

    fn offset(self, n: Vector2, distance: f64) -> Segment {
        let d = n.scale(distance);
        Segment::new(self.p1 + d, self.p2 + d)
    }
}

/// Earliest non-negative time at which the moving ball's disc (circle swept
/// along `ball_vel`) first touches `static_circle`, or `f64::INFINITY` if it
/// never does within the forward half-line.
pub fn time_to_circle(static_circle: Circle, ball_circle: Circle, ball_vel: Vector2) -> f64 {
    let combined_radius = static_circle.radius + ball_circle.radius;
    let rel = ball_circle.center - static_circle.center;

    let a = ball_vel.length_squared();
    if a < eps::EPS_DEGENERATE {
        tracing::debug!("time_to_circle: degenerate relative velocity");
        return f64::INFINITY;
    }

    let b = 2.0 * rel.dot(ball_vel);
    let c = rel.length_squared() - combined_radius * combined_radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return f64::INFINITY;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    let chosen = if t1 >= -eps::EPS_NOW {
        t1
    } else if t2 >= -eps::EPS_NOW {
        t2
    } else {
        return f64::INFINITY;
    };

    if chosen.is_nan() {
        tracing::debug!("time_to_circle: NaN time-to-collision");
        return f64::INFINITY;
    }

    chosen.max(0.0)
}

/// Earliest non-negative time at which the moving ball's disc first touches
/// `seg`, treating the segment as the Minkowski sum of two offset rails and
/// two corner circles of radius `ball_circle.radius`.
pub fn time_to_segment(seg: Segment, ball_circle: Circle, ball_vel: Vector2) -> f64 {
    if seg.length() < eps::EPS_DEGENERATE {
        tracing::debug!("time_to_segment: degenerate zero-length segment");
        return f64::INFINITY;
    }

    let n = seg.normal();
    let d = seg.direction();
    let len = seg.length();
    let r = ball_circle.radius;

    let rail_time = |rail: Segment| -> f64 {
        let denom = ball_vel.dot(n);
        if denom.abs() < eps::EPS_DEGENERATE {
            return f64::INFINITY;
        }
        let t = -(ball_circle.center - rail.p1).dot(n) / denom;
        if !t.is_finite() || t < -eps::EPS_NOW {
            return f64::INFINITY;
        }
        let t = t.max(0.0);
        let contact = ball_circle.center + ball_vel.scale(t);
        let s = (contact - rail.p1).dot(d);
        if s < -eps::EPS_TANGENT || s > len + eps::EPS_TANGENT {
            return f64::INFINITY;
        }
        t
    };

    let edge_plus = seg.offset(n, r);
    let edge_minus = seg.offset(n, -r);
    let corner1 = Circle::new(seg.p1, 0.0);
    let corner2 = Circle::new(seg.p2, 0.0);

    let t1 = rail_time(edge_plus);
    let t2 = rail_time(edge_minus);
    let t3 = time_to_circle(corner1, ball_circle, ball_vel);
    let t4 = time_to_circle(corner2, ball_circle, ball_vel);

    t1.min(t2).min(t3).min(t4)
}

/// Earliest time at which a segment rigidly rotating about `pivot` with
/// angular speed `omega` meets the ball. Computed via the standard
/// co-rotating-frame approximation: the wall's instantaneous velocity at the
/// ball's current location is subtracted from the ball's velocity, and the
/// ordinary static formula is applied to the segment at its current
/// orientation. Exact for the constant-omega, short-lookahead case this is
/// used in (one simulator frame, ≈20 ms).
pub fn time_to_rotating_segment(
    seg: Segment,
    pivot: Vector2,
    omega: f64,
    ball_circle: Circle,
    ball_vel: Vector2,
) -> f64 {
    let wall_velocity = ball_circle.center.tangential_velocity(pivot, omega);
    time_to_segment(seg, ball_circle, ball_vel - wall_velocity)
}

/// Analogous to [`time_to_rotating_segment`] for a flipper endpoint circle.
pub fn time_to_rotating_circle(
    circle: Circle,
    pivot: Vector2,
    omega: f64,
    ball_circle: Circle,
    ball_vel: Vector2,
) -> f64 {
    let wall_velocity = circle.center.tangential_velocity(pivot, omega);
    time_to_circle(circle, ball_circle, ball_vel - wall_velocity)
}

/// Specular reflection of `v` about `seg`'s normal.
pub fn reflect_segment(seg: Segment, v: Vector2) -> Vector2 {
    let n = seg.normal();
    v - n.scale(2.0 * v.dot(n))
}

/// Specular reflection of `v` about the line joining `center` and `ball_pos`.
pub fn reflect_circle(center: Vector2, ball_pos: Vector2, v: Vector2) -> Vector2 {
    let n = (ball_pos - center).normalize();
    if n == Vector2::ZERO {
        return v;
    }
    v - n.scale(2.0 * v.dot(n))
}

/// Elastic reflection off a rotating segment: reflect as if static, then add
/// the wall's tangential velocity at the ball's contact position, scaled by
/// the restitution coefficient `k`.
pub fn reflect_rotating_segment(
    seg: Segment,
    pivot: Vector2,
    omega: f64,
    ball_circle: Circle,
    v: Vector2,
    k: f64,
) -> Vector2 {
    let reflected = reflect_segment(seg, v);
    let wall_velocity = ball_circle.center.tangential_velocity(pivot, omega);
    reflected + wall_velocity.scale(k)
}

/// Analogous to [`reflect_rotating_segment`] for a flipper endpoint circle.
pub fn reflect_rotating_circle(
    center: Vector2,
    pivot: Vector2,
    omega: f64,
    ball_pos: Vector2,
    v: Vector2,
    k: f64,
) -> Vector2 {
    let reflected = reflect_circle(center, ball_pos, v);
    let wall_velocity = center.tangential_velocity(pivot, omega);
    reflected + wall_velocity.scale(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{a} vs {b}, diff {}", (a - b).abs());
    }

    fn assert_vec_close(a: Vector2, b: Vector2, tol: f64) {
        assert_close(a.x, b.x, tol);
        assert_close(a.y, b.y, tol);
    }

    #[test]
    fn vector_add_sub_scale() {
        let a = Vector2::new(1.0, 2.0);
        let b = Vector2::new(3.0, -1.0);
        assert_vec_close(a + b, Vector2::new(4.0, 1.0), 1e-12);
        assert_vec_close(a - b, Vector2::new(-2.0, 3.0), 1e-12);
        assert_vec_close(a.scale(2.0), Vector2::new(2.0, 4.0), 1e-12);
    }

    #[test]
    fn clamp_length_shortens_an_overlong_vector() {
        let v = Vector2::new(600.0, 0.0).clamp_length(500.0);
        assert_vec_close(v, Vector2::new(500.0, 0.0), 1e-9);
    }

    #[test]
    fn clamp_length_leaves_shorter_vectors_alone() {
        let v = Vector2::new(3.0, 4.0);
        assert_eq!(v.clamp_length(500.0), v);
    }

    #[test]
    fn rotate_around_quarter_turn() {
        let p = Vector2::new(1.0, 0.0);
        let pivot = Vector2::ZERO;
        let rotated = p.rotate_around(pivot, std::f64::consts::FRAC_PI_2);
        assert_vec_close(rotated, Vector2::new(0.0, 1.0), 1e-9);
    }

    #[test]
    fn angle_nearest_cardinal_exact() {
        let a = Angle::from_degrees(90.0);
        assert_eq!(a.nearest_cardinal(), Some(Angle(std::f64::consts::FRAC_PI_2)));
    }

    #[test]
    fn angle_nearest_cardinal_none_when_far() {
        let a = Angle::from_degrees(45.0);
        assert_eq!(a.nearest_cardinal(), None);
    }

    #[test]
    fn time_to_circle_head_on_approach() {
        let static_circle = Circle::new(Vector2::new(10.0, 0.0), 1.0);
        let ball = Circle::new(Vector2::new(0.0, 0.0), 0.25);
        let t = time_to_circle(static_circle, ball, Vector2::new(1.0, 0.0));
        assert_close(t, 10.0 - 1.25, 1e-9);
    }

    #[test]
    fn time_to_circle_moving_away_is_infinite() {
        let static_circle = Circle::new(Vector2::new(10.0, 0.0), 1.0);
        let ball = Circle::new(Vector2::new(0.0, 0.0), 0.25);
        let t = time_to_circle(static_circle, ball, Vector2::new(-1.0, 0.0));
        assert!(t.is_infinite());
    }

    #[test]
    fn time_to_circle_already_tangent_is_now() {
        let static_circle = Circle::new(Vector2::new(1.25, 0.0), 1.0);
        let ball = Circle::new(Vector2::new(0.0, 0.0), 0.25);
        let t = time_to_circle(static_circle, ball, Vector2::new(1.0, 0.0));
        assert!(t < 1e-9);
    }

    #[test]
    fn time_to_segment_perpendicular_approach() {
        let seg = Segment::new(Vector2::new(-5.0, 5.0), Vector2::new(5.0, 5.0));
        let ball = Circle::new(Vector2::new(0.0, 0.0), 0.25);
        let t = time_to_segment(seg, ball, Vector2::new(0.0, 1.0));
        assert_close(t, 4.75, 1e-9);
    }

    #[test]
    fn time_to_segment_misses_beyond_endpoints() {
        let seg = Segment::new(Vector2::new(-5.0, 5.0), Vector2::new(5.0, 5.0));
        let ball = Circle::new(Vector2::new(20.0, 0.0), 0.25);
        let t = time_to_segment(seg, ball, Vector2::new(0.0, 1.0));
        assert!(t.is_infinite());
    }

    #[test]
    fn time_to_segment_hits_corner() {
        let seg = Segment::new(Vector2::new(0.0, 5.0), Vector2::new(5.0, 5.0));
        let ball = Circle::new(Vector2::new(-3.0, 5.0), 0.25);
        let t = time_to_segment(seg, ball, Vector2::new(1.0, 0.0));
        assert_close(t, 3.0 - 0.25, 1e-9);
    }

    #[test]
    fn reflect_segment_vertical_wall() {
        let seg = Segment::new(Vector2::new(5.0, -5.0), Vector2::new(5.0, 5.0));
        let v = Vector2::new(1.0, 2.0);
        let reflected = reflect_segment(seg, v);
        assert_close(reflected.y, 2.0, 1e-9);
        assert_close(reflected.x.abs(), 1.0, 1e-9);
    }

    #[test]
    fn reflect_circle_head_on_reverses() {
        let center = Vector2::new(10.0, 0.0);
        let pos = Vector2::new(9.0, 0.0);
        let v = Vector2::new(1.0, 0.0);
        let reflected = reflect_circle(center, pos, v);
        assert_vec_close(reflected, Vector2::new(-1.0, 0.0), 1e-9);
    }

    #[test]
    fn rotating_segment_adds_tangential_velocity() {
        let seg = Segment::new(Vector2::new(9.0, 10.0), Vector2::new(11.0, 10.0));
        let pivot = Vector2::new(9.0, 10.0);
        let ball_circle = Circle::new(Vector2::new(10.0, 9.75), 0.25);
        let v = Vector2::new(0.0, 1.0);
        let reflected = reflect_rotating_segment(seg, pivot, 10.0, ball_circle, v, 0.95);
        let wall_velocity = ball_circle.center.tangential_velocity(pivot, 10.0);
        assert!(wall_velocity.length() > 0.0);
        assert!(reflected.length() > reflect_segment(seg, v).length() - 1e-6);
    }

    #[test]
    fn tangential_velocity_perpendicular_to_radius() {
        let pivot = Vector2::new(0.0, 0.0);
        let point = Vector2::new(2.0, 0.0);
        let vel = point.tangential_velocity(pivot, 1.0);
        assert_close(vel.dot(point - pivot), 0.0, 1e-9);
    }
}
