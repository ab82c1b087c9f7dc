use crate::error::{Error, Result};
use crate::rt;

use std::convert::TryFrom;

/// A reusable rendezvous point for a fixed number of actors.
///
/// Every call to [`enter`](Barrier::enter) but the last one of a round
/// suspends the calling actor. The last arrival marks all suspended actors
/// runnable again, in the order they arrived, and continues without
/// suspending. The barrier is then immediately ready for the next round.
///
/// The barrier is meant to be shared between its participants, typically
/// behind an `Rc`.
///
/// # Examples
///
/// ```
/// use simsync::actor;
/// use simsync::sync::Barrier;
///
/// use std::rc::Rc;
///
/// simsync::sim::simulate(|| {
///     let barrier = Rc::new(Barrier::new(2).unwrap());
///
///     let th = {
///         let barrier = barrier.clone();
///         actor::spawn(move || barrier.enter().unwrap().is_leader())
///     };
///
///     let leader = barrier.enter().unwrap().is_leader();
///     assert_ne!(leader, th.join());
/// })
/// .unwrap();
/// ```
#[derive(Debug)]
pub struct Barrier {
    object: rt::Barrier,
}

/// Returned by [`Barrier::enter`] once the actor passed the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult(bool);

impl Barrier {
    /// Creates a barrier requiring `capacity` participants per round.
    ///
    /// Fails with [`Error::InvalidArgument`] when `capacity` is zero, and with
    /// [`Error::IllegalState`] outside of a running simulation.
    pub fn new(capacity: usize) -> Result<Barrier> {
        Ok(Barrier {
            object: rt::Barrier::new(capacity)?,
        })
    }

    /// Creates a barrier from a signed participant count, rejecting zero and
    /// negative counts with [`Error::InvalidArgument`].
    pub fn try_from_count(count: i64) -> Result<Barrier> {
        let capacity = usize::try_from(count)
            .map_err(|_| Error::InvalidArgument("barrier capacity must be positive"))?;

        Barrier::new(capacity)
    }

    /// Waits until `capacity` actors have entered the barrier.
    ///
    /// Fails with [`Error::InvalidHandle`] once the barrier was closed.
    pub fn enter(&self) -> Result<BarrierWaitResult> {
        self.object.enter().map(BarrierWaitResult)
    }

    /// Disposes of the barrier.
    ///
    /// Fails with [`Error::IllegalState`] while actors are suspended on the
    /// barrier; abandoning them would stall the simulation forever. Any use
    /// of the barrier after a successful close fails with
    /// [`Error::InvalidHandle`].
    pub fn close(&self) -> Result<()> {
        self.object.close()
    }

    /// Number of participants required per round.
    pub fn capacity(&self) -> Result<usize> {
        self.object.with_state(|state| state.capacity())
    }

    /// Number of actors waiting in the current round.
    pub fn arrived(&self) -> Result<usize> {
        self.object.with_state(|state| state.arrived())
    }

    /// Number of rounds completed so far.
    pub fn round(&self) -> Result<usize> {
        self.object.with_state(|state| state.round())
    }
}

impl Drop for Barrier {
    fn drop(&mut self) {
        self.object.release_on_drop();
    }
}

impl BarrierWaitResult {
    /// Returns `true` for the actor whose arrival released the round.
    pub fn is_leader(&self) -> bool {
        self.0
    }
}
