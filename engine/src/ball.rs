use pinball_shared::config::MAX_BALL_SPEED;
use pinball_shared::geometry::Vector2;

/// A ball is an immutable value; the board rebuilds its ball list each
/// frame rather than mutating balls in place, which keeps collision
/// resolution free of aliasing concerns.
#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
    pub name: String,
    pub position: Vector2,
    pub velocity: Vector2,
}

impl Ball {
    /// Velocity is clamped to [`MAX_BALL_SPEED`] here, the single
    /// construction point every collision resolver and the board-file
    /// parser funnel through, so the bound holds everywhere a ball's
    /// velocity can change.
    pub fn new(name: impl Into<String>, position: Vector2, velocity: Vector2) -> Self {
        Ball { name: name.into(), position, velocity: velocity.clamp_length(MAX_BALL_SPEED) }
    }

    pub fn with_velocity(&self, velocity: Vector2) -> Ball {
        Ball { velocity: velocity.clamp_length(MAX_BALL_SPEED), ..self.clone() }
    }

    pub fn with_position(&self, position: Vector2) -> Ball {
        Ball { position, ..self.clone() }
    }
}
