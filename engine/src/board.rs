//! The board aggregate: gadget arena, balls, walls, join/trigger state, and
//! the simulator loop (§4.4). Balls and flippers are treated as values and
//! the board rebuilds its lists each step rather than mutating through
//! shared references, per the design notes.

use std::collections::{HashMap, HashSet};

use pinball_shared::config::{BALL_RADIUS, BOARD_SIZE, MAX_BALL_SPEED};
use pinball_shared::geometry::{eps, reflect_segment, time_to_circle, time_to_segment, Circle, Segment, Vector2};
use pinball_shared::protocol::{ClientMessage, Wall};

use crate::ball::Ball;
use crate::error::BoardError;
use crate::gadget::{Absorber, Bumper, Flipper, Gadget, Portal};

/// An index into the gadget arena. Trigger edges are modelled as handles
/// rather than back-pointers, per the design notes — this avoids cycles and
/// keeps the gadget values themselves free of board-shaped references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GadgetHandle(usize);

fn wall_segment(wall: Wall) -> Segment {
    match wall {
        Wall::Left => Segment::new(Vector2::new(0.0, 0.0), Vector2::new(0.0, BOARD_SIZE)),
        Wall::Right => Segment::new(Vector2::new(BOARD_SIZE, 0.0), Vector2::new(BOARD_SIZE, BOARD_SIZE)),
        Wall::Top => Segment::new(Vector2::new(0.0, 0.0), Vector2::new(BOARD_SIZE, 0.0)),
        Wall::Bottom => Segment::new(Vector2::new(0.0, BOARD_SIZE), Vector2::new(BOARD_SIZE, BOARD_SIZE)),
    }
}

#[derive(Clone, Copy, Debug)]
enum CollisionPair {
    BallBall(usize, usize),
    Bumper(usize, GadgetHandle),
    Wall(usize, Wall),
    Absorber(usize, GadgetHandle),
    Portal(usize, GadgetHandle),
    Flipper(usize, GadgetHandle),
}

impl CollisionPair {
    fn priority(self) -> u8 {
        match self {
            CollisionPair::BallBall(..) => 0,
            CollisionPair::Bumper(..) => 1,
            CollisionPair::Wall(..) => 2,
            CollisionPair::Absorber(..) => 3,
            CollisionPair::Portal(..) => 4,
            CollisionPair::Flipper(..) => 5,
        }
    }
}

struct Candidate {
    time: f64,
    priority: u8,
    ball_name: String,
    obstacle_name: String,
    pair: CollisionPair,
}

/// Read-only view handed to a renderer.
pub struct BoardSnapshot<'a> {
    pub name: &'a str,
    pub balls: &'a [Ball],
    pub gadgets: &'a [Gadget],
    pub join_state: &'a HashMap<Wall, Option<String>>,
}

pub struct Board {
    name: String,
    balls: Vec<Ball>,
    gadgets: Vec<Gadget>,
    gadget_index: HashMap<String, GadgetHandle>,
    gravity: f64,
    friction1: f64,
    friction2: f64,
    join_map: HashMap<Wall, Option<String>>,
    trigger_map: Vec<(GadgetHandle, Vec<GadgetHandle>)>,
    pending_triggers: Vec<(String, String)>,
    started: bool,
    outgoing: Vec<ClientMessage>,
}

impl Board {
    pub fn new(name: impl Into<String>) -> Self {
        let mut join_map = HashMap::new();
        for wall in Wall::ALL {
            join_map.insert(wall, None);
        }
        Board {
            name: name.into(),
            balls: Vec::new(),
            gadgets: Vec::new(),
            gadget_index: HashMap::new(),
            gravity: 25.0,
            friction1: 0.025,
            friction2: 0.025,
            join_map,
            trigger_map: Vec::new(),
            pending_triggers: Vec::new(),
            started: false,
            outgoing: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- construction-time mutators -----------------------------------

    pub fn add_ball(&mut self, ball: Ball) -> Result<(), BoardError> {
        if self.balls.iter().any(|b| b.name == ball.name) {
            return Err(BoardError::DuplicateBall(ball.name));
        }
        self.balls.push(ball);
        Ok(())
    }

    fn insert_gadget(&mut self, name: String, gadget: Gadget) -> Result<GadgetHandle, BoardError> {
        if self.gadget_index.contains_key(&name) {
            return Err(BoardError::DuplicateName(name));
        }
        let handle = GadgetHandle(self.gadgets.len());
        self.gadgets.push(gadget);
        self.gadget_index.insert(name, handle);
        self.resolve_pending_triggers();
        Ok(handle)
    }

    pub fn add_bumper(&mut self, bumper: Bumper) -> Result<GadgetHandle, BoardError> {
        if bumper.x < 0 || bumper.y < 0 {
            return Err(BoardError::OutOfBounds { kind: "bumper", name: bumper.name });
        }
        let name = bumper.name.clone();
        self.insert_gadget(name, Gadget::Bumper(bumper))
    }

    pub fn add_absorber(&mut self, absorber: Absorber) -> Result<GadgetHandle, BoardError> {
        if absorber.width < 1 || absorber.height < 1 {
            return Err(BoardError::DegenerateAbsorber(absorber.name));
        }
        if absorber.x < 0 || absorber.y < 0 {
            return Err(BoardError::OutOfBounds { kind: "absorber", name: absorber.name });
        }
        let name = absorber.name.clone();
        self.insert_gadget(name, Gadget::Absorber(absorber))
    }

    pub fn add_portal(&mut self, portal: Portal) -> Result<GadgetHandle, BoardError> {
        let name = portal.name.clone();
        self.insert_gadget(name, Gadget::Portal(portal))
    }

    pub fn add_flipper(&mut self, flipper: Flipper) -> Result<GadgetHandle, BoardError> {
        let name = flipper.name.clone();
        self.insert_gadget(name, Gadget::Flipper(flipper))
    }

    pub fn set_gravity(&mut self, gravity: f64) {
        if self.started {
            tracing::warn!("set_gravity ignored after first simulation step");
            return;
        }
        self.gravity = gravity;
    }

    pub fn set_friction1(&mut self, friction1: f64) {
        if self.started {
            tracing::warn!("set_friction1 ignored after first simulation step");
            return;
        }
        self.friction1 = friction1;
    }

    pub fn set_friction2(&mut self, friction2: f64) {
        if self.started {
            tracing::warn!("set_friction2 ignored after first simulation step");
            return;
        }
        self.friction2 = friction2;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        if self.started {
            tracing::warn!("set_name ignored after first simulation step");
            return;
        }
        self.name = name.into();
    }

    // -- trigger wiring --------------------------------------------------

    pub fn handle_of(&self, name: &str) -> Option<GadgetHandle> {
        self.gadget_index.get(name).copied()
    }

    /// Records that `trigger` firing should fire `action`. Unresolvable
    /// names are queued for a second pass rather than rejected, since the
    /// board file parser may forward-reference a gadget defined later.
    pub fn set_trigger(&mut self, trigger: &str, action: &str) {
        match (self.handle_of(trigger), self.handle_of(action)) {
            (Some(t), Some(a)) => self.link_trigger(t, a),
            _ => self.pending_triggers.push((trigger.to_string(), action.to_string())),
        }
    }

    fn link_trigger(&mut self, trigger: GadgetHandle, action: GadgetHandle) {
        if let Some(entry) = self.trigger_map.iter_mut().find(|(h, _)| *h == trigger) {
            entry.1.push(action);
        } else {
            self.trigger_map.push((trigger, vec![action]));
        }
    }

    fn resolve_pending_triggers(&mut self) {
        let mut still_pending = Vec::new();
        for (trigger, action) in std::mem::take(&mut self.pending_triggers) {
            match (self.handle_of(&trigger), self.handle_of(&action)) {
                (Some(t), Some(a)) => self.link_trigger(t, a),
                _ => still_pending.push((trigger, action)),
            }
        }
        self.pending_triggers = still_pending;
    }

    /// Fires an absorber (emit a ball) or a flipper (start flipping) by
    /// name, regardless of what caused it. A no-op for an unknown name.
    pub fn trigger_by_name(&mut self, name: &str) {
        if let Some(handle) = self.handle_of(name) {
            let mut visited = HashSet::new();
            self.fire_action(handle, &mut visited);
        }
    }

    fn fire_action(&mut self, handle: GadgetHandle, visited: &mut HashSet<GadgetHandle>) {
        if !visited.insert(handle) {
            return;
        }
        let emitted = match &mut self.gadgets[handle.0] {
            Gadget::Absorber(a) if !a.queue.is_empty() => {
                let name = a.queue.remove(0);
                Some((name, a.emit_position()))
            }
            Gadget::Flipper(f) => {
                f.trigger();
                None
            }
            _ => None,
        };
        if let Some((name, pos)) = emitted {
            self.balls.push(Ball::new(name, pos, Absorber::emit_velocity()));
        }
        self.cascade(handle, visited);
    }

    fn cascade(&mut self, handle: GadgetHandle, visited: &mut HashSet<GadgetHandle>) {
        let actions = self
            .trigger_map
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, v)| v.clone());
        if let Some(actions) = actions {
            for action in actions {
                self.fire_action(action, visited);
            }
        }
    }

    // -- join / relay interop --------------------------------------------

    pub fn join_state(&self) -> &HashMap<Wall, Option<String>> {
        &self.join_map
    }

    pub fn apply_wall_join(&mut self, wall: Wall, remote: Option<String>) {
        self.join_map.insert(wall, remote);
    }

    pub fn set_portal_connected(&mut self, portal_name: &str, connected: bool) {
        if let Some(handle) = self.handle_of(portal_name) {
            if let Gadget::Portal(p) = &mut self.gadgets[handle.0] {
                p.remote_connected = connected;
            }
        }
    }

    /// Injects a ball arriving via `teleportWall=`. `sender_wall` is the
    /// wall the ball crossed *on the sending board*; `sender_position` is
    /// its position there verbatim. The receiving board places it just
    /// inside the topologically matching wall on its own side, preserving
    /// whichever coordinate is tangential to that wall and clamping it into
    /// range when a corner crossing would otherwise put it outside the
    /// playfield (§9(c)).
    pub fn inject_ball_from_wall(&mut self, ball_name: String, velocity: Vector2, sender_position: Vector2, sender_wall: Wall) {
        let local_wall = sender_wall.opposite();
        let tangent = match sender_wall {
            Wall::Left | Wall::Right => sender_position.y,
            Wall::Top | Wall::Bottom => sender_position.x,
        };
        let clamped = tangent.clamp(BALL_RADIUS, BOARD_SIZE - BALL_RADIUS);
        if (clamped - tangent).abs() > eps::EPS_DIST {
            tracing::debug!("inject_ball_from_wall: clamped out-of-range tangent {tangent} to {clamped}");
        }
        let normal_offset = BALL_RADIUS / 2.0;
        let position = match local_wall {
            Wall::Left => Vector2::new(normal_offset, clamped),
            Wall::Right => Vector2::new(BOARD_SIZE - normal_offset, clamped),
            Wall::Top => Vector2::new(clamped, normal_offset),
            Wall::Bottom => Vector2::new(clamped, BOARD_SIZE - normal_offset),
        };
        self.balls.push(Ball::new(ball_name, position, velocity));
    }

    pub fn inject_ball_from_portal(&mut self, portal_name: &str, ball_name: String, velocity: Vector2) {
        if let Some(handle) = self.handle_of(portal_name) {
            if let Gadget::Portal(p) = &self.gadgets[handle.0] {
                let position = p.position;
                self.balls.push(Ball::new(ball_name, position, velocity));
                return;
            }
        }
        tracing::warn!("inject_ball_from_portal: unknown portal {portal_name:?}, dropping ball");
    }

    /// Drops any wall join referencing `lost_board`, matching the
    /// peer/transport error policy: the client continues in standalone mode
    /// for the affected walls.
    pub fn drop_peer(&mut self, lost_board: &str) {
        for remote in self.join_map.values_mut() {
            if remote.as_deref() == Some(lost_board) {
                *remote = None;
            }
        }
        for gadget in &mut self.gadgets {
            if let Gadget::Portal(p) = gadget {
                if p.remote_board.as_deref() == Some(lost_board) {
                    p.remote_connected = false;
                }
            }
        }
    }

    // -- snapshot ----------------------------------------------------------

    pub fn snapshot(&self) -> BoardSnapshot<'_> {
        BoardSnapshot {
            name: &self.name,
            balls: &self.balls,
            gadgets: &self.gadgets,
            join_state: &self.join_map,
        }
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    // -- simulator loop (§4.4) --------------------------------------------

    /// Advances the board by one frame, returning any messages that must be
    /// forwarded to the relay (teleport hand-offs).
    pub fn step(&mut self, frame_budget: f64) -> Vec<ClientMessage> {
        self.started = true;
        self.outgoing.clear();
        let mut remaining = frame_budget;
        while remaining > eps::EPS_NOW {
            match self.earliest_collision(remaining) {
                None => {
                    self.advance(remaining);
                    remaining = 0.0;
                }
                Some((tau, pair)) => {
                    if tau >= remaining {
                        self.advance(remaining);
                        remaining = 0.0;
                    } else {
                        self.advance(tau);
                        self.resolve(pair);
                        remaining -= tau;
                    }
                }
            }
        }
        self.integrate_friction_gravity(frame_budget);
        std::mem::take(&mut self.outgoing)
    }

    fn ball_ball_time(&self, i: usize, j: usize) -> f64 {
        let bi = &self.balls[i];
        let bj = &self.balls[j];
        let static_circle = Circle::new(bj.position, BALL_RADIUS);
        let moving_circle = Circle::new(bi.position, BALL_RADIUS);
        time_to_circle(static_circle, moving_circle, bi.velocity - bj.velocity)
    }

    fn earliest_collision(&self, delta: f64) -> Option<(f64, CollisionPair)> {
        let mut candidates: Vec<Candidate> = Vec::new();
        let n = self.balls.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let t = self.ball_ball_time(i, j);
                if t.is_finite() && t <= delta + eps::EPS_NOW {
                    let (a, b) = if self.balls[i].name <= self.balls[j].name { (i, j) } else { (j, i) };
                    candidates.push(Candidate {
                        time: t,
                        priority: CollisionPair::BallBall(a, b).priority(),
                        ball_name: self.balls[a].name.clone(),
                        obstacle_name: self.balls[b].name.clone(),
                        pair: CollisionPair::BallBall(a, b),
                    });
                }
            }
        }

        for (i, ball) in self.balls.iter().enumerate() {
            let ball_circle = Circle::new(ball.position, BALL_RADIUS);

            for wall in Wall::ALL {
                let t = time_to_segment(wall_segment(wall), ball_circle, ball.velocity);
                if t.is_finite() && t <= delta + eps::EPS_NOW {
                    candidates.push(Candidate {
                        time: t,
                        priority: CollisionPair::Wall(i, wall).priority(),
                        ball_name: ball.name.clone(),
                        obstacle_name: wall.as_str().to_string(),
                        pair: CollisionPair::Wall(i, wall),
                    });
                }
            }

            for (gi, gadget) in self.gadgets.iter().enumerate() {
                let handle = GadgetHandle(gi);
                if let Gadget::Portal(p) = gadget {
                    if !p.eligible(&self.name, p.contains(ball.position)) {
                        continue;
                    }
                }
                let t = gadget.time_to_hit(ball_circle, ball.velocity);
                if !t.is_finite() || t > delta + eps::EPS_NOW {
                    continue;
                }
                let pair = match gadget {
                    Gadget::Bumper(_) => CollisionPair::Bumper(i, handle),
                    Gadget::Absorber(_) => CollisionPair::Absorber(i, handle),
                    Gadget::Portal(_) => CollisionPair::Portal(i, handle),
                    Gadget::Flipper(_) => CollisionPair::Flipper(i, handle),
                };
                candidates.push(Candidate {
                    time: t,
                    priority: pair.priority(),
                    ball_name: ball.name.clone(),
                    obstacle_name: gadget.name().to_string(),
                    pair,
                });
            }
        }

        if candidates.is_empty() {
            return None;
        }
        let tau_min = candidates.iter().map(|c| c.time).fold(f64::INFINITY, f64::min);
        let mut tied: Vec<Candidate> = candidates.into_iter().filter(|c| c.time <= tau_min + eps::EPS_NOW).collect();
        tied.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.ball_name.cmp(&b.ball_name))
                .then_with(|| a.obstacle_name.cmp(&b.obstacle_name))
        });
        tied.into_iter().next().map(|c| (tau_min, c.pair))
    }

    fn advance(&mut self, dt: f64) {
        for ball in &mut self.balls {
            ball.position = ball.position + ball.velocity * dt;
        }
        for gadget in &mut self.gadgets {
            if let Gadget::Flipper(f) = gadget {
                f.step(dt);
            }
        }
    }

    fn resolve(&mut self, pair: CollisionPair) {
        match pair {
            CollisionPair::BallBall(i, j) => self.resolve_ball_ball(i, j),
            CollisionPair::Bumper(i, handle) => self.resolve_bumper(i, handle),
            CollisionPair::Wall(i, wall) => self.resolve_wall(i, wall),
            CollisionPair::Absorber(i, handle) => self.resolve_absorber(i, handle),
            CollisionPair::Portal(i, handle) => self.resolve_portal(i, handle),
            CollisionPair::Flipper(i, handle) => self.resolve_flipper(i, handle),
        }
    }

    fn resolve_ball_ball(&mut self, i: usize, j: usize) {
        let normal = (self.balls[j].position - self.balls[i].position).normalize();
        let vi_n = self.balls[i].velocity.dot(normal);
        let vj_n = self.balls[j].velocity.dot(normal);
        let vi = self.balls[i].velocity - normal * vi_n + normal * vj_n;
        let vj = self.balls[j].velocity - normal * vj_n + normal * vi_n;
        self.balls[i].velocity = vi.clamp_length(MAX_BALL_SPEED);
        self.balls[j].velocity = vj.clamp_length(MAX_BALL_SPEED);
    }

    fn resolve_bumper(&mut self, i: usize, handle: GadgetHandle) {
        let ball_circle = Circle::new(self.balls[i].position, BALL_RADIUS);
        let new_vel = match &self.gadgets[handle.0] {
            Gadget::Bumper(b) => b.resolve_velocity(ball_circle, self.balls[i].velocity),
            _ => unreachable!(),
        };
        self.balls[i].velocity = new_vel.clamp_length(MAX_BALL_SPEED);
        let mut visited = HashSet::new();
        visited.insert(handle);
        self.cascade(handle, &mut visited);
    }

    fn resolve_wall(&mut self, i: usize, wall: Wall) {
        let remote = self.join_map.get(&wall).cloned().flatten();
        if let Some(dest_board) = remote {
            let ball = self.balls.remove(i);
            self.outgoing.push(ClientMessage::TeleportWall {
                dest_board,
                ball_name: ball.name,
                velocity: ball.velocity,
                position: ball.position,
                wall,
            });
        } else {
            let reflected = reflect_segment(wall_segment(wall), self.balls[i].velocity);
            self.balls[i].velocity = reflected.clamp_length(MAX_BALL_SPEED);
        }
    }

    fn resolve_absorber(&mut self, i: usize, handle: GadgetHandle) {
        let ball = self.balls.remove(i);
        if let Gadget::Absorber(a) = &mut self.gadgets[handle.0] {
            a.queue.push(ball.name);
        }
        let mut visited = HashSet::new();
        visited.insert(handle);
        self.cascade(handle, &mut visited);
    }

    fn resolve_portal(&mut self, i: usize, handle: GadgetHandle) {
        let (peer_name, is_local, remote_board, remote_connected) = match &self.gadgets[handle.0] {
            Gadget::Portal(p) => (p.peer_portal_name.clone(), p.is_local(&self.name), p.remote_board.clone(), p.remote_connected),
            _ => unreachable!(),
        };
        if is_local {
            if let Some(peer_handle) = self.handle_of(&peer_name) {
                if let Gadget::Portal(peer) = &self.gadgets[peer_handle.0] {
                    let dest = peer.position;
                    self.balls[i].position = dest;
                } else {
                    return;
                }
            }
            // peer missing entirely: ball passes over unchanged, per §4.2.
        } else if remote_connected {
            let ball = self.balls.remove(i);
            self.outgoing.push(ClientMessage::TeleportPortal {
                dest_board: remote_board.expect("remote portal always carries a board name"),
                ball_name: ball.name,
                velocity: ball.velocity,
                portal_name: peer_name,
            });
            return;
        }
        // disconnected remote: pass over, no state change.
        let mut visited = HashSet::new();
        visited.insert(handle);
        self.cascade(handle, &mut visited);
    }

    fn resolve_flipper(&mut self, i: usize, handle: GadgetHandle) {
        let ball_circle = Circle::new(self.balls[i].position, BALL_RADIUS);
        let new_vel = match &self.gadgets[handle.0] {
            Gadget::Flipper(f) => f.resolve_velocity(ball_circle, self.balls[i].velocity),
            _ => unreachable!(),
        };
        self.balls[i].velocity = new_vel.clamp_length(MAX_BALL_SPEED);
        let mut visited = HashSet::new();
        visited.insert(handle);
        self.cascade(handle, &mut visited);
    }

    fn integrate_friction_gravity(&mut self, dt: f64) {
        let gravity = Vector2::new(0.0, self.gravity * dt);
        for ball in &mut self.balls {
            let speed = ball.velocity.length();
            let factor = (1.0 - self.friction1 * dt - self.friction2 * speed * dt).max(0.0);
            ball.velocity = (ball.velocity * factor + gravity).clamp_length(MAX_BALL_SPEED);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gadget::{BumperShape, Handedness};
    use pinball_shared::geometry::Angle;

    #[test]
    fn duplicate_ball_name_rejected() {
        let mut board = Board::new("b");
        board.add_ball(Ball::new("ball1", Vector2::new(1.0, 1.0), Vector2::ZERO)).unwrap();
        let err = board.add_ball(Ball::new("ball1", Vector2::new(2.0, 2.0), Vector2::ZERO)).unwrap_err();
        assert_eq!(err, BoardError::DuplicateBall("ball1".to_string()));
    }

    #[test]
    fn ball_ball_collision_keeps_result_within_max_speed() {
        let mut board = Board::new("b");
        board.set_gravity(0.0);
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.add_ball(Ball::new("a", Vector2::new(10.0, 10.0), Vector2::new(MAX_BALL_SPEED, 0.0))).unwrap();
        board.add_ball(Ball::new("b", Vector2::new(10.4, 10.0), Vector2::new(-MAX_BALL_SPEED, 0.0))).unwrap();
        board.step(0.01);
        for ball in board.balls() {
            assert!(ball.velocity.length() <= MAX_BALL_SPEED + 1e-6);
        }
    }

    #[test]
    fn set_trigger_defers_forward_reference() {
        let mut board = Board::new("b");
        board.set_trigger("later", "also_later");
        board.add_absorber(Absorber { name: "later".into(), x: 0, y: 18, width: 10, height: 2, queue: vec![] }).unwrap();
        board.add_absorber(Absorber { name: "also_later".into(), x: 0, y: 0, width: 10, height: 2, queue: vec!["seed".to_string()] }).unwrap();
        // "later" firing should cascade into "also_later" which emits its queued ball.
        board.trigger_by_name("later");
        assert_eq!(board.balls().len(), 1);
    }

    #[test]
    fn single_ball_falls_under_gravity_with_no_friction() {
        let mut board = Board::new("b");
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.add_ball(Ball::new("ball1", Vector2::new(5.0, 5.0), Vector2::ZERO)).unwrap();
        for _ in 0..50 {
            board.step(0.02);
        }
        let ball = &board.balls()[0];
        assert!(ball.velocity.y > 0.0);
        assert!(ball.position.y > 5.0);
    }

    #[test]
    fn two_balls_head_on_exchange_velocities() {
        let mut board = Board::new("b");
        board.set_gravity(0.0);
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.add_ball(Ball::new("ball1", Vector2::new(10.0, 10.0), Vector2::new(0.0, 1.0))).unwrap();
        board.add_ball(Ball::new("ball2", Vector2::new(10.0, 10.5), Vector2::new(0.0, -1.0))).unwrap();
        board.step(0.01);
        let b1 = board.balls().iter().find(|b| b.name == "ball1").unwrap();
        let b2 = board.balls().iter().find(|b| b.name == "ball2").unwrap();
        assert!((b1.velocity.y - -1.0).abs() < 1e-6);
        assert!((b2.velocity.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn absorber_self_trigger_queues_without_emitting_same_frame() {
        let mut board = Board::new("b");
        board.set_gravity(0.0);
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.add_absorber(Absorber { name: "abs".into(), x: 0, y: 18, width: 10, height: 2, queue: vec![] }).unwrap();
        board.set_trigger("abs", "abs");
        board.add_ball(Ball::new("ball1", Vector2::new(5.0, 17.8), Vector2::new(0.0, 5.0))).unwrap();
        board.step(0.02);
        // the ball was absorbed; the self-trigger link exists but cannot
        // refire "abs" within the same frame, so the queue still holds it.
        assert_eq!(board.balls().len(), 0);
        board.trigger_by_name("abs");
        assert_eq!(board.balls().len(), 1);
        let emitted = &board.balls()[0];
        assert!((emitted.position.x - 9.75).abs() < 1e-9);
        assert!((emitted.position.y - 19.75).abs() < 1e-9);
    }

    #[test]
    fn portal_self_peer_round_trips_in_place() {
        let mut board = Board::new("b");
        board.set_gravity(0.0);
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.add_portal(Portal {
            name: "p1".into(),
            position: Vector2::new(5.0, 5.0),
            remote_board: None,
            peer_portal_name: "p1".into(),
            remote_connected: false,
        }).unwrap();
        board.add_ball(Ball::new("ball1", Vector2::new(4.0, 5.0), Vector2::new(1.0, 0.0))).unwrap();
        board.step(2.0);
        let ball = &board.balls()[0];
        assert!((ball.position - Vector2::new(5.0, 5.0)).length() < 1e-6);
    }

    #[test]
    fn wall_join_emits_teleport_message_and_drops_ball() {
        let mut board = Board::new("A");
        board.set_gravity(0.0);
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.apply_wall_join(Wall::Right, Some("B".to_string()));
        board.add_ball(Ball::new("ballA", Vector2::new(19.0, 10.0), Vector2::new(10.0, 0.0))).unwrap();
        let messages = board.step(2.0);
        assert!(board.balls().is_empty());
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            ClientMessage::TeleportWall { dest_board, wall, .. } => {
                assert_eq!(dest_board, "B");
                assert_eq!(*wall, Wall::Right);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn inject_ball_from_wall_clamps_corner_tangent() {
        let mut board = Board::new("B");
        board.inject_ball_from_wall("ballA".to_string(), Vector2::new(10.0, 0.0), Vector2::new(20.0, 25.0), Wall::Right);
        let ball = &board.balls()[0];
        assert!(ball.position.y <= BOARD_SIZE - BALL_RADIUS + 1e-9);
    }

    #[test]
    fn bumper_reflects_ball() {
        let mut board = Board::new("b");
        board.set_gravity(0.0);
        board.set_friction1(0.0);
        board.set_friction2(0.0);
        board.add_bumper(Bumper { name: "bump".into(), shape: BumperShape::Circle, x: 10, y: 10 }).unwrap();
        board.add_ball(Ball::new("ball1", Vector2::new(9.0, 10.5), Vector2::new(1.0, 0.0))).unwrap();
        board.step(2.0);
        let ball = &board.balls()[0];
        assert!(ball.velocity.x < 0.0);
    }

    #[test]
    fn flipper_trigger_by_name_starts_sweep() {
        let mut board = Board::new("b");
        board.add_flipper(Flipper::new("flip", Vector2::new(10.0, 10.0), Handedness::Left, Angle::ZERO)).unwrap();
        board.trigger_by_name("flip");
        board.step(0.01);
        let handle = board.handle_of("flip").unwrap();
        match &board.gadgets[handle.0] {
            Gadget::Flipper(f) => assert!(f.rotation > 0.0),
            _ => panic!("expected flipper"),
        }
    }
}
