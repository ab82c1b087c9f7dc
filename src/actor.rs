//! Simulated actors.
//!
//! Actors are cooperative units of execution. Exactly one actor runs at a
//! time, and control only moves to another actor when the running one
//! suspends: entering a barrier, joining, sleeping, yielding or terminating.

use crate::error::Result;
use crate::rt;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Identifies an actor within a simulation run.
///
/// Identifiers are handed out densely in spawn order; the root actor is `0`.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ActorId(usize);

impl ActorId {
    /// Returns the identifier as an integer.
    pub fn as_usize(self) -> usize {
        self.0
    }

    fn rt(self) -> rt::actor::Id {
        rt::actor::Id::from_usize(self.0)
    }
}

impl From<rt::actor::Id> for ActorId {
    fn from(id: rt::actor::Id) -> ActorId {
        ActorId(id.as_usize())
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to a simulated actor.
#[derive(Clone, Debug)]
pub struct Actor {
    id: ActorId,
    name: Option<String>,
}

impl Actor {
    /// Returns the actor's identifier.
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Returns the (optional) name of this actor.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Makes the actor runnable again if it is suspended.
    ///
    /// Has no effect on a runnable or terminated actor.
    pub fn unpark(&self) {
        rt::execution(|execution| execution.unpark(self.id.rt()));
    }
}

/// Returns a handle to the running actor.
///
/// # Panics
///
/// Panics when called from outside of a simulation.
pub fn current() -> Actor {
    rt::execution(|execution| {
        let id = execution.actors.active_id();

        Actor {
            id: id.into(),
            name: execution.actors[id].name.clone(),
        }
    })
}

/// Suspends the running actor until another actor unparks it.
pub fn suspend() {
    rt::park();
}

/// Moves the running actor to the back of the run queue.
pub fn yield_now() {
    rt::yield_now();
}

/// Spawns a new actor.
///
/// The new actor becomes runnable behind every actor that is already
/// runnable; the caller keeps running.
///
/// # Panics
///
/// Panics when called outside of a simulation or when the actor limit is
/// reached. Use [`Builder::spawn`] to handle those cases.
pub fn spawn<F, T>(f: F) -> JoinHandle<T>
where
    F: FnOnce() -> T + 'static,
    T: 'static,
{
    match Builder::new().spawn(f) {
        Ok(handle) => handle,
        Err(e) => panic!("failed to spawn actor: {}", e),
    }
}

/// Actor factory, which can be used in order to configure the properties of
/// a new actor.
#[derive(Debug)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    /// Generates the base configuration for spawning an actor.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Builder {
        Builder {
            name: None,
            stack_size: None,
        }
    }

    /// Names the actor-to-be.
    pub fn name(mut self, name: impl Into<String>) -> Builder {
        self.name = Some(name.into());
        self
    }

    /// Sets the size of the coroutine stack for the new actor.
    pub fn stack_size(mut self, size: usize) -> Builder {
        self.stack_size = Some(size);
        self
    }

    /// Spawns a new actor with this configuration.
    pub fn spawn<F, T>(self, f: F) -> Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + 'static,
        T: 'static,
    {
        let result = Rc::new(RefCell::new(None));
        let name = self.name.clone();

        let id = {
            let result = result.clone();

            rt::spawn(self.name, self.stack_size, move || {
                let ret = f();
                *result.borrow_mut() = Some(ret);
            })?
        };

        Ok(JoinHandle {
            actor: Actor {
                id: id.into(),
                name,
            },
            result,
        })
    }
}

/// An owned permission to join on an actor (block on its termination).
pub struct JoinHandle<T> {
    actor: Actor,
    result: Rc<RefCell<Option<T>>>,
}

impl<T> JoinHandle<T> {
    /// Suspends the running actor until the joined actor terminates and
    /// returns its result.
    ///
    /// # Panics
    ///
    /// Panics if an actor tries to join itself.
    pub fn join(self) -> T {
        let target = self.actor.id.rt();

        loop {
            if let Some(ret) = self.result.borrow_mut().take() {
                return ret;
            }

            rt::execution(|execution| {
                let me = execution.actors.active_id();
                assert_ne!(me, target, "an actor cannot join itself");

                let joiners = &mut execution.actors[target].joiners;

                if !joiners.contains(&me) {
                    joiners.push(me);
                }
            });

            rt::park();
        }
    }

    /// Returns `true` once the actor has produced its result.
    pub fn is_finished(&self) -> bool {
        self.result.borrow().is_some()
    }

    /// Returns a handle to the underlying actor.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}

impl<T> fmt::Debug for JoinHandle<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("JoinHandle")
            .field("actor", &self.actor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn joiner_is_registered_once() {
        sim::Builder::new()
            .run(|| {
                let main = current();
                let th = spawn(suspend);

                let target = th.actor().clone();
                let poker = spawn(move || {
                    for _ in 0..2 {
                        main.unpark();
                        yield_now();
                    }

                    let joiners =
                        rt::execution(|execution| execution.actors[target.id.rt()].joiners.len());
                    target.unpark();
                    joiners
                });

                th.join();
                assert_eq!(1, poker.join());
            })
            .unwrap();
    }
}
