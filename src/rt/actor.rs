use std::collections::VecDeque;
use std::fmt;
use std::ops;

#[derive(Debug)]
pub(crate) struct Actor {
    /// If the actor is runnable, blocked, sleeping or terminated.
    pub(crate) state: State,

    /// Name given at spawn time
    pub(crate) name: Option<String>,

    /// Actors blocked in `join` on this actor
    pub(crate) joiners: Vec<Id>,

    /// Sequence number of the timer armed by the current sleep. Cleared once
    /// the actor is woken, so timers left behind by an earlier wake-up are
    /// ignored.
    pub(crate) timer: Option<u64>,
}

#[derive(Debug)]
pub(crate) struct Set {
    actors: Vec<Actor>,

    /// Runnable actors, in the order they became eligible.
    queue: VecDeque<Id>,

    /// Currently scheduled actor.
    ///
    /// `None` signifies that no actor is runnable.
    active: Option<usize>,

    max_actors: usize,
}

#[derive(Eq, PartialEq, Hash, Copy, Clone, PartialOrd, Ord)]
pub(crate) struct Id {
    id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum State {
    Runnable,
    Blocked,
    Sleeping,
    Yield,
    Terminated,
}

impl Actor {
    fn new(name: Option<String>) -> Actor {
        Actor {
            state: State::Runnable,
            name,
            joiners: vec![],
            timer: None,
        }
    }

    pub(crate) fn is_runnable(&self) -> bool {
        matches!(self.state, State::Runnable)
    }

    pub(crate) fn is_yield(&self) -> bool {
        matches!(self.state, State::Yield)
    }

    pub(crate) fn is_terminated(&self) -> bool {
        matches!(self.state, State::Terminated)
    }

    pub(crate) fn set_blocked(&mut self) {
        self.state = State::Blocked;
    }

    pub(crate) fn set_yield(&mut self) {
        self.state = State::Yield;
    }

    pub(crate) fn set_sleeping(&mut self, timer: u64) {
        self.state = State::Sleeping;
        self.timer = Some(timer);
    }

    pub(crate) fn set_terminated(&mut self) {
        self.state = State::Terminated;
    }
}

impl Set {
    /// Create an empty actor set.
    ///
    /// The set may contain up to `max_actors` actors.
    pub(crate) fn new(max_actors: usize) -> Set {
        Set {
            actors: Vec::with_capacity(max_actors),
            queue: VecDeque::new(),
            active: None,
            max_actors,
        }
    }

    /// Create a new actor. The first actor becomes active, later ones are
    /// queued behind the actors that are already runnable.
    pub(crate) fn new_actor(&mut self, name: Option<String>) -> Id {
        assert!(
            self.actors.len() < self.max_actors,
            "actor limit of {} reached",
            self.max_actors
        );

        let id = Id::from_usize(self.actors.len());
        self.actors.push(Actor::new(name));

        if self.active.is_none() {
            self.active = Some(id.id);
        } else {
            self.queue.push_back(id);
        }

        id
    }

    pub(crate) fn len(&self) -> usize {
        self.actors.len()
    }

    pub(crate) fn is_full(&self) -> bool {
        self.actors.len() >= self.max_actors
    }

    pub(crate) fn max_actors(&self) -> usize {
        self.max_actors
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub(crate) fn active_id(&self) -> Id {
        Id::from_usize(self.active.expect("no active actor"))
    }

    pub(crate) fn active(&self) -> &Actor {
        &self.actors[self.active_id().id]
    }

    pub(crate) fn active_mut(&mut self) -> &mut Actor {
        let id = self.active_id();
        &mut self.actors[id.id]
    }

    pub(crate) fn set_active(&mut self, id: Option<Id>) {
        self.active = id.map(Id::as_usize);
    }

    /// Make a suspended actor eligible to run again.
    ///
    /// Blocked, sleeping and yielded actors are appended to the run queue.
    /// Actors that are already runnable or have terminated are left alone.
    /// Returns `true` if the actor changed state.
    pub(crate) fn unpark(&mut self, id: Id) -> bool {
        let actor = &mut self.actors[id.id];

        match actor.state {
            State::Blocked | State::Sleeping | State::Yield => {
                actor.state = State::Runnable;
                actor.timer = None;
                self.queue.push_back(id);
                true
            }
            State::Runnable | State::Terminated => false,
        }
    }

    /// Pop the next eligible actor off the run queue.
    pub(crate) fn pop_runnable(&mut self) -> Option<Id> {
        self.queue.pop_front()
    }

    /// Actors that have not terminated yet.
    pub(crate) fn live(&self) -> impl Iterator<Item = Id> + '_ {
        self.iter()
            .filter(|(_, actor)| !actor.is_terminated())
            .map(|(id, _)| id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Id, &Actor)> + '_ {
        self.actors
            .iter()
            .enumerate()
            .map(|(id, actor)| (Id::from_usize(id), actor))
    }
}

impl ops::Index<Id> for Set {
    type Output = Actor;

    fn index(&self, index: Id) -> &Actor {
        &self.actors[index.id]
    }
}

impl ops::IndexMut<Id> for Set {
    fn index_mut(&mut self, index: Id) -> &mut Actor {
        &mut self.actors[index.id]
    }
}

impl Id {
    pub(crate) fn from_usize(id: usize) -> Id {
        Id { id }
    }

    pub(crate) fn as_usize(self) -> usize {
        self.id
    }
}

impl fmt::Display for Id {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(fmt)
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "Id({})", self.id)
    }
}
