use thiserror::Error;

/// Errors a [`crate::board::Board`] can raise from its construction-time
/// entry points. Everything past construction (trigger firing, message
/// ingestion) no-ops defensively instead of returning an error, per the
/// propagation policy: the simulator never aborts mid-frame.
#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("duplicate gadget name {0:?}")]
    DuplicateName(String),
    #[error("duplicate ball name {0:?}")]
    DuplicateBall(String),
    #[error("{kind} {name:?} position is out of bounds")]
    OutOfBounds { kind: &'static str, name: String },
    #[error("absorber {0:?} has width or height below 1")]
    DegenerateAbsorber(String),
}
