use crate::error::{Error, Result};
use crate::rt::{self, actor, object};
use crate::sim::Event;

use std::collections::VecDeque;

use tracing::{trace, warn};

#[derive(Debug, Copy, Clone)]
pub(crate) struct Barrier {
    state: object::Ref<State>,
}

#[derive(Debug)]
pub(crate) struct State {
    /// Participants required per round
    capacity: usize,

    /// Actors that entered the current round and were not released yet
    arrived: usize,

    /// Actors suspended on the barrier, in arrival order
    waiting: VecDeque<actor::Id>,

    /// Completed rounds
    round: usize,
}

impl Barrier {
    pub(crate) fn new(capacity: usize) -> Result<Barrier> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("barrier capacity must be positive"));
        }

        rt::try_execution(|execution| {
            let state = execution.objects.insert(State {
                capacity,
                arrived: 0,
                waiting: VecDeque::new(),
                round: 0,
            });

            trace!(?state, capacity, "Barrier::new");

            Barrier { state }
        })
    }

    /// Record the active actor's arrival.
    ///
    /// Returns `true` if this call released the round. Otherwise the caller
    /// is suspended until the releasing call resumes it.
    pub(crate) fn enter(&self) -> Result<bool> {
        let (release, round) = rt::try_execution(|execution| -> Result<(bool, usize)> {
            let actor = execution.actors.active_id();
            let state = self.state.get_mut(&mut execution.objects)?;

            if state.waiting.contains(&actor) {
                return Err(Error::IllegalState("actor already waiting on this barrier"));
            }

            state.waiting.push_back(actor);
            state.arrived += 1;

            debug_assert!(state.arrived <= state.capacity);

            trace!(state = ?self.state, ?actor, arrived = state.arrived, "Barrier::enter");

            let round = state.round;

            if state.arrived < state.capacity {
                return Ok((false, round));
            }

            // Last arrival. Everything below runs within the caller's step,
            // so no actor can observe a partially released round.
            let waiting: Vec<_> = state.waiting.drain(..).collect();

            state.arrived = 0;
            state.round += 1;

            trace!(state = ?self.state, ?waiting, round, "Barrier::release");

            for id in waiting {
                // The releasing actor is running, never suspended.
                if id != actor {
                    execution.unpark(id);
                }
            }

            execution.record(|at| Event::Release {
                at,
                actor: actor.into(),
                round,
            });

            Ok((true, round))
        })??;

        if release {
            return Ok(true);
        }

        // Only the release of our round may let us through; an unrelated
        // `unpark` puts the actor straight back to sleep. A barrier closed
        // after our release has no waiters left, so we were let through.
        loop {
            rt::park();

            match self.with_state(State::round) {
                Ok(current) if current == round => continue,
                _ => return Ok(false),
            }
        }
    }

    /// Dispose of the barrier. Fails while actors are suspended on it.
    pub(crate) fn close(&self) -> Result<()> {
        rt::try_execution(|execution| -> Result<()> {
            let state = self.state.get(&execution.objects)?;

            if !state.waiting.is_empty() {
                return Err(Error::IllegalState(
                    "cannot dispose a barrier while actors are waiting on it",
                ));
            }

            trace!(state = ?self.state, "Barrier::close");

            self.state.dispose(&mut execution.objects)
        })?
    }

    /// Last-resort cleanup for a barrier that was never closed.
    pub(crate) fn release_on_drop(&self) {
        let _ = rt::try_execution(|execution| {
            let waiting = match self.state.get(&execution.objects) {
                Ok(state) => state.waiting.len(),
                // Already closed, or the run this barrier belongs to is gone.
                Err(_) => return,
            };

            if waiting > 0 {
                warn!(state = ?self.state, waiting, "barrier dropped while actors are waiting on it");
                return;
            }

            let _ = self.state.dispose(&mut execution.objects);
        });
    }

    pub(crate) fn with_state<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&State) -> R,
    {
        rt::try_execution(|execution| self.state.get(&execution.objects).map(f))?
    }
}

impl State {
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn arrived(&self) -> usize {
        self.arrived
    }

    pub(crate) fn round(&self) -> usize {
        self.round
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor;
    use crate::sim::Builder;

    fn live() -> usize {
        rt::execution(|execution| execution.objects.live())
    }

    #[test]
    fn drop_disposes_idle_barrier() {
        Builder::new()
            .run(|| {
                let barrier = Barrier::new(2).unwrap();
                assert_eq!(1, live());

                barrier.release_on_drop();
                assert_eq!(0, live());

                // Already gone; dropping again is a no-op.
                barrier.release_on_drop();
                assert!(matches!(barrier.close(), Err(Error::InvalidHandle(_))));
            })
            .unwrap();
    }

    #[test]
    fn drop_with_waiters_keeps_barrier() {
        Builder::new()
            .run(|| {
                let barrier = Barrier::new(2).unwrap();
                let worker = actor::spawn(move || barrier.enter().unwrap());

                actor::yield_now();
                assert_eq!(1, barrier.with_state(State::arrived).unwrap());

                barrier.release_on_drop();
                assert_eq!(1, live());
                assert!(!worker.is_finished());

                // The waiter is still released by a later arrival.
                assert!(barrier.enter().unwrap());
                assert!(!worker.join());

                barrier.release_on_drop();
                assert_eq!(0, live());
            })
            .unwrap();
    }
}
