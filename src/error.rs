//! Errors reported by the simulation runtime and its primitives.

use crate::actor::ActorId;

use thiserror::Error;

/// Result type used throughout `simsync`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced synchronously to the caller of the failing operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument was outside of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The operation is not permitted in the current state.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// The handle refers to a disposed object, or to an object belonging to
    /// another simulation run.
    #[error("invalid handle: {0}")]
    InvalidHandle(&'static str),

    /// Spawning would exceed the configured maximum number of actors.
    #[error("cannot spawn more than {max} actors")]
    ActorLimit {
        /// The configured limit.
        max: usize,
    },

    /// No actor can make progress, yet not all actors have terminated.
    #[error("deadlock; blocked actors = {blocked:?}")]
    Deadlock {
        /// Actors that were still suspended when the run stalled.
        blocked: Vec<ActorId>,
    },
}
