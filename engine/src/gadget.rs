//! Immutable descriptors for the static/flipper gadget kinds, plus the
//! tagged-variant `Gadget` that the board arena stores. Per the design
//! notes, dispatch is a single match on the tag rather than a trait object
//! — this keeps the simulator's inner loop branch-predictable.

use pinball_shared::config::{BALL_RADIUS, FLIPPER_ANGULAR_VELOCITY, PORTAL_RADIUS};
use pinball_shared::geometry::{
    eps, reflect_circle, reflect_rotating_circle, reflect_rotating_segment, reflect_segment,
    time_to_circle, time_to_rotating_circle, time_to_rotating_segment, time_to_segment, Angle,
    Circle, Segment, Vector2,
};

const FLIPPER_LENGTH: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BumperShape {
    Square,
    Circle,
    Triangle { orientation: Angle },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bumper {
    pub name: String,
    pub shape: BumperShape,
    pub x: i64,
    pub y: i64,
}

impl Bumper {
    fn cell_center(&self) -> Vector2 {
        Vector2::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }

    /// Surfaces making up the bumper's boundary. Circle bumpers have none —
    /// they're handled directly as a circle — square and triangle bumpers
    /// decompose into segments whose own endpoints already behave as
    /// corner circles inside [`time_to_segment`].
    fn segments(&self) -> Vec<Segment> {
        let x0 = self.x as f64;
        let y0 = self.y as f64;
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;
        let tl = Vector2::new(x0, y0);
        let tr = Vector2::new(x1, y0);
        let bl = Vector2::new(x0, y1);
        let br = Vector2::new(x1, y1);
        match self.shape {
            BumperShape::Square => vec![
                Segment::new(tl, tr),
                Segment::new(tr, br),
                Segment::new(br, bl),
                Segment::new(bl, tl),
            ],
            BumperShape::Circle => vec![],
            BumperShape::Triangle { orientation } => {
                // Rest pose (orientation 0): right angle at the top-left
                // corner, hypotenuse from top-right to bottom-left.
                let rest = [tl, tr, bl];
                let center = self.cell_center();
                let rotated: Vec<Vector2> = rest
                    .iter()
                    .map(|p| p.rotate_around(center, orientation.radians()))
                    .collect();
                vec![
                    Segment::new(rotated[0], rotated[1]),
                    Segment::new(rotated[1], rotated[2]),
                    Segment::new(rotated[2], rotated[0]),
                ]
            }
        }
    }

    fn circle(&self) -> Circle {
        Circle::new(self.cell_center(), 0.5)
    }

    pub fn time_to_hit(&self, ball: Circle, vel: Vector2) -> f64 {
        match self.shape {
            BumperShape::Circle => time_to_circle(self.circle(), ball, vel),
            _ => self
                .segments()
                .iter()
                .map(|s| time_to_segment(*s, ball, vel))
                .fold(f64::INFINITY, f64::min),
        }
    }

    pub fn resolve_velocity(&self, ball: Circle, vel: Vector2) -> Vector2 {
        match self.shape {
            BumperShape::Circle => reflect_circle(self.circle().center, ball.center, vel),
            _ => {
                let segments = self.segments();
                let hit = segments
                    .iter()
                    .min_by(|a, b| {
                        time_to_segment(**a, ball, vel)
                            .partial_cmp(&time_to_segment(**b, ball, vel))
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .copied()
                    .unwrap_or(segments[0]);
                reflect_segment(hit, vel)
            }
        }
    }

    pub fn rejects(&self, point: Vector2) -> bool {
        match self.shape {
            BumperShape::Circle => self.circle().contains(point),
            _ => {
                let x0 = self.x as f64;
                let y0 = self.y as f64;
                point.x >= x0 && point.x <= x0 + 1.0 && point.y >= y0 && point.y <= y0 + 1.0
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Absorber {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub queue: Vec<String>,
}

impl Absorber {
    fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.x as f64,
            self.y as f64,
            self.x as f64 + self.width as f64,
            self.y as f64 + self.height as f64,
        )
    }

    pub fn contains(&self, point: Vector2) -> bool {
        let (x0, y0, x1, y1) = self.bounds();
        point.x >= x0 - eps::EPS_DIST
            && point.x <= x1 + eps::EPS_DIST
            && point.y >= y0 - eps::EPS_DIST
            && point.y <= y1 + eps::EPS_DIST
    }

    fn segments(&self) -> [Segment; 4] {
        let (x0, y0, x1, y1) = self.bounds();
        let tl = Vector2::new(x0, y0);
        let tr = Vector2::new(x1, y0);
        let bl = Vector2::new(x0, y1);
        let br = Vector2::new(x1, y1);
        [
            Segment::new(tl, tr),
            Segment::new(tr, br),
            Segment::new(br, bl),
            Segment::new(bl, tl),
        ]
    }

    /// Excludes balls already inside, per §4.2.
    pub fn time_to_hit(&self, ball: Circle, vel: Vector2) -> f64 {
        if self.contains(ball.center) {
            return f64::INFINITY;
        }
        self.segments()
            .iter()
            .map(|s| time_to_segment(*s, ball, vel))
            .fold(f64::INFINITY, f64::min)
    }

    /// Position the next emitted ball appears at: right edge minus the ball
    /// radius, bottom edge minus the ball radius.
    pub fn emit_position(&self) -> Vector2 {
        let (_, _, x1, y1) = self.bounds();
        Vector2::new(x1 - BALL_RADIUS, y1 - BALL_RADIUS)
    }

    pub fn emit_velocity() -> Vector2 {
        Vector2::new(0.0, -50.0)
    }

    pub fn rejects(&self, point: Vector2) -> bool {
        self.contains(point)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Portal {
    pub name: String,
    pub position: Vector2,
    /// Absent for a portal whose peer is guaranteed local; `Some(board)` may
    /// equal this board's own name (still "local") or a genuinely remote
    /// board name.
    pub remote_board: Option<String>,
    pub peer_portal_name: String,
    /// Tracks `connectPortal=`/`disconnectPortal=` liveness for a remote
    /// peer. Irrelevant for local portals.
    pub remote_connected: bool,
}

impl Portal {
    pub fn circle(&self) -> Circle {
        Circle::new(self.position, PORTAL_RADIUS)
    }

    pub fn contains(&self, point: Vector2) -> bool {
        // Resolves the spec's open question about the containment test:
        // a plain squared-distance comparison, not `distanceSquared^RADIUS`.
        self.circle().contains(point)
    }

    pub fn time_to_hit(&self, ball: Circle, vel: Vector2) -> f64 {
        if self.contains(ball.center) {
            return f64::INFINITY;
        }
        time_to_circle(self.circle(), ball, vel)
    }

    pub fn is_local(&self, own_board_name: &str) -> bool {
        match &self.remote_board {
            None => true,
            Some(board) => board == own_board_name,
        }
    }

    /// Eligible as an obstacle this frame: local portals always are; remote
    /// ones only while their peer is known connected, or while a ball is
    /// already sitting inside them (so it can still be excluded correctly
    /// next frame rather than causing a phantom re-entry).
    pub fn eligible(&self, own_board_name: &str, any_ball_inside: bool) -> bool {
        self.is_local(own_board_name) || self.remote_connected || any_ball_inside
    }

    pub fn rejects(&self, point: Vector2) -> bool {
        self.contains(point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    fn sign(self) -> f64 {
        match self {
            Handedness::Left => 1.0,
            Handedness::Right => -1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Flipper {
    pub name: String,
    pub pivot: Vector2,
    pub handedness: Handedness,
    pub base_orientation: Angle,
    /// Magnitude of rotation away from rest, in `[0, PI/2]`.
    pub rotation: f64,
    pub is_moving: bool,
    /// +1.0 while sweeping toward 90°, -1.0 while sweeping back to 0°.
    pub direction: f64,
}

impl Flipper {
    pub fn new(name: impl Into<String>, pivot: Vector2, handedness: Handedness, base_orientation: Angle) -> Self {
        Flipper {
            name: name.into(),
            pivot,
            handedness,
            base_orientation,
            rotation: 0.0,
            is_moving: false,
            direction: 1.0,
        }
    }

    fn rest_segment(&self) -> Segment {
        let tip = self.pivot + Vector2::new(FLIPPER_LENGTH, 0.0).rotate_around(Vector2::ZERO, self.base_orientation.radians());
        Segment::new(self.pivot, tip)
    }

    pub fn current_segment(&self) -> Segment {
        let signed_rotation = self.handedness.sign() * self.rotation;
        self.rest_segment().rotate_around(self.pivot, signed_rotation)
    }

    pub fn tip(&self) -> Vector2 {
        self.current_segment().p2
    }

    pub fn omega(&self) -> f64 {
        if self.is_moving {
            self.handedness.sign() * self.direction * FLIPPER_ANGULAR_VELOCITY
        } else {
            0.0
        }
    }

    pub fn time_to_hit(&self, ball: Circle, vel: Vector2) -> f64 {
        let seg = self.current_segment();
        let tip_circle = Circle::new(self.tip(), 0.0);
        if self.is_moving {
            let omega = self.omega();
            time_to_rotating_segment(seg, self.pivot, omega, ball, vel)
                .min(time_to_rotating_circle(tip_circle, self.pivot, omega, ball, vel))
        } else {
            time_to_segment(seg, ball, vel)
        }
    }

    pub fn resolve_velocity(&self, ball: Circle, vel: Vector2) -> Vector2 {
        let seg = self.current_segment();
        let tip_circle = Circle::new(self.tip(), 0.0);
        if self.is_moving {
            let omega = self.omega();
            let t_seg = time_to_rotating_segment(seg, self.pivot, omega, ball, vel);
            let t_tip = time_to_rotating_circle(tip_circle, self.pivot, omega, ball, vel);
            if t_tip < t_seg {
                reflect_rotating_circle(tip_circle.center, self.pivot, omega, ball.center, vel, 0.95)
            } else {
                reflect_rotating_segment(seg, self.pivot, omega, ball, vel, 0.95)
            }
        } else {
            reflect_segment(seg, vel)
        }
    }

    pub fn rejects(&self, point: Vector2) -> bool {
        // A flipper never blocks placement; it sweeps through its own area.
        let _ = point;
        false
    }

    /// Starts the flipper sweeping toward the opposite endpoint. A no-op
    /// while already in motion.
    pub fn trigger(&mut self) {
        if !self.is_moving {
            self.is_moving = true;
        }
    }

    /// Advances the sweep by `dt`, clamping and flipping direction at
    /// either endpoint.
    pub fn step(&mut self, dt: f64) {
        if !self.is_moving {
            return;
        }
        self.rotation += FLIPPER_ANGULAR_VELOCITY * dt * self.direction;
        let half_pi = std::f64::consts::FRAC_PI_2;
        if self.rotation >= half_pi {
            self.rotation = half_pi;
            self.is_moving = false;
            self.direction = -1.0;
        } else if self.rotation <= 0.0 {
            self.rotation = 0.0;
            self.is_moving = false;
            self.direction = 1.0;
        }
    }
}

/// Tagged variant over the four gadget kinds, per the design notes: a
/// single dispatch point rather than a trait object.
#[derive(Clone, Debug, PartialEq)]
pub enum Gadget {
    Bumper(Bumper),
    Absorber(Absorber),
    Portal(Portal),
    Flipper(Flipper),
}

impl Gadget {
    pub fn name(&self) -> &str {
        match self {
            Gadget::Bumper(g) => &g.name,
            Gadget::Absorber(g) => &g.name,
            Gadget::Portal(g) => &g.name,
            Gadget::Flipper(g) => &g.name,
        }
    }

    pub fn time_to_hit(&self, ball: Circle, vel: Vector2) -> f64 {
        match self {
            Gadget::Bumper(g) => g.time_to_hit(ball, vel),
            Gadget::Absorber(g) => g.time_to_hit(ball, vel),
            Gadget::Portal(g) => g.time_to_hit(ball, vel),
            Gadget::Flipper(g) => g.time_to_hit(ball, vel),
        }
    }

    pub fn rejects(&self, point: Vector2) -> bool {
        match self {
            Gadget::Bumper(g) => g.rejects(point),
            Gadget::Absorber(g) => g.rejects(point),
            Gadget::Portal(g) => g.rejects(point),
            Gadget::Flipper(g) => g.rejects(point),
        }
    }
}
