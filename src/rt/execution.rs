use crate::actor::ActorId;
use crate::rt::{actor, object};
use crate::sim::Event;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use tracing::debug;

pub(crate) struct Execution {
    /// Uniquely identifies an execution
    pub(crate) id: Id,

    pub(crate) actors: actor::Set,

    pub(crate) objects: object::Store,

    /// Simulated time elapsed since the start of the run
    pub(crate) clock: Duration,

    /// Sleeping actors, earliest wake-up first. Ties are broken by the order
    /// the timers were armed.
    timers: BinaryHeap<Reverse<(Duration, u64, actor::Id)>>,

    next_timer: u64,

    /// Number of context switches performed so far
    pub(crate) switches: usize,

    /// Scheduler visible transitions, when recording is enabled
    pub(crate) events: Option<Vec<Event>>,

    /// Log actor switches
    pub(crate) log: bool,
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub(crate) struct Id(usize);

impl Execution {
    /// Create a new execution containing only the root actor.
    pub(crate) fn new(max_actors: usize, record_events: bool) -> Execution {
        let id = Id::new();
        let mut actors = actor::Set::new(max_actors);

        // Create the root actor
        actors.new_actor(Some("main".to_string()));

        let mut execution = Execution {
            id,
            actors,
            objects: object::Store::new(id),
            clock: Duration::from_secs(0),
            timers: BinaryHeap::new(),
            next_timer: 0,
            switches: 0,
            events: if record_events { Some(vec![]) } else { None },
            log: false,
        };

        execution.record(|at| Event::Spawn {
            at,
            actor: ActorId::from(actor::Id::from_usize(0)),
            parent: None,
        });

        execution
    }

    /// Create state to track a new actor
    pub(crate) fn new_actor(&mut self, name: Option<String>) -> actor::Id {
        let parent = self.actors.active_id();
        let id = self.actors.new_actor(name);

        self.record(|at| Event::Spawn {
            at,
            actor: id.into(),
            parent: Some(parent.into()),
        });

        id
    }

    /// Mark a suspended actor as runnable again.
    pub(crate) fn unpark(&mut self, id: actor::Id) {
        if self.actors.unpark(id) {
            self.record(|at| Event::MarkRunnable {
                at,
                actor: id.into(),
            });
        }
    }

    /// Suspend the active actor until the clock reaches `until`.
    pub(crate) fn sleep_until(&mut self, until: Duration) {
        let id = self.actors.active_id();
        let seq = self.next_timer;

        self.next_timer += 1;
        self.actors.active_mut().set_sleeping(seq);
        self.timers.push(Reverse((until, seq, id)));

        self.record(|at| Event::Sleep {
            at,
            actor: id.into(),
            until,
        });
    }

    pub(crate) fn record<F>(&mut self, f: F)
    where
        F: FnOnce(Duration) -> Event,
    {
        let at = self.clock;

        if let Some(events) = self.events.as_mut() {
            events.push(f(at));
        }
    }

    /// Picks the actor to run next. Returns `true` if a switch is required.
    ///
    /// The active actor keeps running for as long as it is runnable. A
    /// yielding actor goes to the back of the run queue. When the run queue
    /// is empty, the clock jumps to the next armed timer.
    pub(crate) fn schedule(&mut self) -> bool {
        let curr = self.actors.active_id();

        if self.actors.active().is_runnable() {
            return false;
        }

        if self.actors.active().is_yield() {
            self.actors.unpark(curr);
        }

        let next = loop {
            if let Some(next) = self.actors.pop_runnable() {
                break Some(next);
            }

            if !self.fire_timers() {
                break None;
            }
        };

        self.actors.set_active(next);

        let next = match next {
            Some(next) => next,
            // Either every actor terminated or the run has stalled. The
            // caller inspects the actor set to tell which.
            None => return true,
        };

        if next == curr {
            return false;
        }

        self.switches += 1;

        if self.log {
            debug!(actor = %next, clock = ?self.clock, "~~~~~~~~ ACTOR {} ~~~~~~~~", next);
        }

        self.record(|at| Event::Run {
            at,
            actor: next.into(),
        });

        true
    }

    /// Advance the clock to the earliest armed timer and wake every actor due
    /// at that instant. Returns `false` when no timer is armed.
    fn fire_timers(&mut self) -> bool {
        // Drop timers whose actor was woken by other means.
        while let Some(Reverse((_, seq, id))) = self.timers.peek() {
            if self.is_armed(*id, *seq) {
                break;
            }

            self.timers.pop();
        }

        let until = match self.timers.peek() {
            Some(Reverse((until, _, _))) => *until,
            None => return false,
        };

        debug_assert!(until >= self.clock);
        self.clock = until;

        while let Some(Reverse((at, _, _))) = self.timers.peek() {
            if *at != until {
                break;
            }

            if let Some(Reverse((_, seq, id))) = self.timers.pop() {
                if self.is_armed(id, seq) {
                    self.unpark(id);
                }
            }
        }

        true
    }

    fn is_armed(&self, id: actor::Id, seq: u64) -> bool {
        self.actors[id].timer == Some(seq)
    }

    /// Actors that have not terminated. Non-empty once the run stalls means
    /// the simulation deadlocked.
    pub(crate) fn stalled(&self) -> Vec<ActorId> {
        self.actors.live().map(ActorId::from).collect()
    }
}

impl fmt::Debug for Execution {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Execution")
            .field("id", &self.id)
            .field("clock", &self.clock)
            .field("actors", &self.actors)
            .finish()
    }
}

impl Id {
    pub(crate) fn new() -> Id {
        use std::sync::atomic::AtomicUsize;
        use std::sync::atomic::Ordering::Relaxed;

        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

        let next = NEXT_ID.fetch_add(1, Relaxed);

        Id(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(execution: &Execution) -> Vec<usize> {
        execution
            .events
            .as_ref()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                Event::Run { actor, .. } => Some(actor.as_usize()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn runnable_actor_keeps_running() {
        let mut execution = Execution::new(4, true);
        execution.new_actor(None);

        assert!(!execution.schedule());
        assert_eq!(0, execution.actors.active_id().as_usize());
    }

    #[test]
    fn blocked_actor_hands_over_in_fifo_order() {
        let mut execution = Execution::new(4, true);
        let a = execution.new_actor(None);
        let b = execution.new_actor(None);

        execution.actors.active_mut().set_blocked();
        assert!(execution.schedule());
        assert_eq!(a, execution.actors.active_id());

        execution.actors.active_mut().set_blocked();
        assert!(execution.schedule());
        assert_eq!(b, execution.actors.active_id());

        assert_eq!(vec![1, 2], ids(&execution));
    }

    #[test]
    fn yield_requeues_behind_others() {
        let mut execution = Execution::new(4, true);
        let a = execution.new_actor(None);

        execution.actors.active_mut().set_yield();
        assert!(execution.schedule());
        assert_eq!(a, execution.actors.active_id());

        execution.actors.active_mut().set_yield();
        assert!(execution.schedule());
        assert_eq!(0, execution.actors.active_id().as_usize());
    }

    #[test]
    fn lone_yield_does_not_switch() {
        let mut execution = Execution::new(1, false);

        execution.actors.active_mut().set_yield();
        assert!(!execution.schedule());
        assert!(execution.actors.active().is_runnable());
    }

    #[test]
    fn timers_advance_clock() {
        let mut execution = Execution::new(4, false);
        let a = execution.new_actor(None);

        execution.sleep_until(Duration::from_secs(5));
        assert!(execution.schedule());
        assert_eq!(a, execution.actors.active_id());

        // The only pending timer belongs to `a`, so it resumes in place.
        execution.sleep_until(Duration::from_secs(2));
        assert!(!execution.schedule());
        assert_eq!(Duration::from_secs(2), execution.clock);
        assert_eq!(a, execution.actors.active_id());

        execution.actors.active_mut().set_terminated();
        assert!(execution.schedule());
        assert_eq!(Duration::from_secs(5), execution.clock);
        assert_eq!(0, execution.actors.active_id().as_usize());
    }

    #[test]
    fn early_wake_disarms_timer() {
        let mut execution = Execution::new(2, false);
        let root = execution.actors.active_id();
        let a = execution.new_actor(None);

        execution.sleep_until(Duration::from_secs(10));
        assert!(execution.schedule());
        assert_eq!(a, execution.actors.active_id());

        // `a` wakes the sleeper before its deadline, then suspends.
        execution.unpark(root);
        execution.actors.active_mut().set_blocked();
        assert!(execution.schedule());
        assert_eq!(root, execution.actors.active_id());

        // The leftover timer neither wakes the root actor nor moves the clock.
        execution.actors.active_mut().set_blocked();
        execution.schedule();

        assert!(!execution.actors.is_active());
        assert_eq!(Duration::from_secs(0), execution.clock);
    }

    #[test]
    fn stall_leaves_no_active_actor() {
        let mut execution = Execution::new(2, false);
        let a = execution.new_actor(None);

        execution.actors.active_mut().set_blocked();
        execution.schedule();
        execution.actors.active_mut().set_blocked();
        execution.schedule();

        assert!(!execution.actors.is_active());
        assert_eq!(
            vec![ActorId::from(actor::Id::from_usize(0)), ActorId::from(a)],
            execution.stalled()
        );
    }
}
