pub(crate) mod actor;

mod barrier;
pub(crate) use self::barrier::Barrier;

mod execution;
pub(crate) use self::execution::Execution;

pub(crate) mod object;

mod scheduler;
pub(crate) use self::scheduler::Scheduler;

use crate::error::{Error, Result};
use crate::sim::Event;

use std::time::Duration;

use tracing::trace;

/// Register a new actor and queue its body. The spawning actor keeps running.
pub(crate) fn spawn<F>(name: Option<String>, stack_size: Option<usize>, f: F) -> Result<actor::Id>
where
    F: FnOnce() + 'static,
{
    let id = try_execution(|execution| {
        if execution.actors.is_full() {
            return Err(Error::ActorLimit {
                max: execution.actors.max_actors(),
            });
        }

        Ok(execution.new_actor(name))
    })??;

    trace!(actor = ?id, "spawn");

    Scheduler::spawn(
        stack_size,
        Box::new(move || {
            f();
            actor_done();
        }),
    );

    Ok(id)
}

/// Marks the current actor as blocked and hands control to the scheduler.
///
/// Returns once another actor made this one runnable again.
pub(crate) fn park() {
    let switch = execution(|execution| {
        let id = execution.actors.active_id();

        execution.actors.active_mut().set_blocked();
        execution.record(|at| Event::Suspend {
            at,
            actor: id.into(),
        });

        execution.schedule()
    });

    if switch {
        Scheduler::switch();
    }
}

/// Yield the actor.
///
/// The actor goes to the back of the run queue.
pub(crate) fn yield_now() {
    let switch = execution(|execution| {
        execution.actors.active_mut().set_yield();
        execution.schedule()
    });

    if switch {
        Scheduler::switch();
    }
}

/// Block the current actor for `duration` of simulated time.
///
/// An `unpark` before the deadline does not end the sleep. A deadline past
/// the range of the clock is never reached, so the actor stays blocked.
pub(crate) fn sleep(duration: Duration) {
    if duration == Duration::from_secs(0) {
        return yield_now();
    }

    let until = match execution(|execution| execution.clock.checked_add(duration)) {
        Some(until) => until,
        None => {
            trace!(?duration, "sleep past the end of time");

            loop {
                park();
            }
        }
    };

    loop {
        let switch = execution(|execution| {
            if execution.clock >= until {
                return None;
            }

            execution.sleep_until(until);
            Some(execution.schedule())
        });

        match switch {
            None => return,
            Some(true) => Scheduler::switch(),
            Some(false) => {}
        }
    }
}

pub(crate) fn execution<F, R>(f: F) -> R
where
    F: FnOnce(&mut Execution) -> R,
{
    match Scheduler::try_with_execution(f) {
        Some(ret) => ret,
        None => panic!(
            "cannot access the simulation state from outside a simulation. \
             are you calling into `simsync` from outside `sim::simulate` or `Builder::run`?"
        ),
    }
}

/// Like `execution`, but reports use outside of a simulation as an error.
pub(crate) fn try_execution<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut Execution) -> R,
{
    Scheduler::try_with_execution(f)
        .ok_or(Error::IllegalState("not called from within a running simulation"))
}

pub(crate) fn actor_done() {
    execution(|execution| {
        let id = execution.actors.active_id();
        let joiners = std::mem::take(&mut execution.actors.active_mut().joiners);

        execution.actors.active_mut().set_terminated();
        execution.record(|at| Event::Terminate {
            at,
            actor: id.into(),
        });

        for joiner in joiners {
            execution.unpark(joiner);
        }

        execution.schedule();
    });
}
