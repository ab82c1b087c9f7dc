//! Run simulations.

use crate::actor::ActorId;
use crate::error::{Error, Result};
use crate::rt::{self, Execution, Scheduler};

use std::time::Duration;

use tracing::{info, subscriber, warn};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_MAX_ACTORS: usize = 64;
const DEFAULT_STACK_SIZE: usize = 1 << 20;

/// Configure a simulation
#[derive(Debug)]
#[non_exhaustive] // Support adding more fields in the future
pub struct Builder {
    /// Max number of actors, including the root actor.
    ///
    /// Defaults to `SIMSYNC_MAX_ACTORS` environment variable.
    pub max_actors: usize,

    /// Coroutine stack size of actors that do not set their own.
    ///
    /// Defaults to `SIMSYNC_STACK_SIZE` environment variable.
    pub stack_size: usize,

    /// When `true`, scheduler transitions are collected into
    /// [`Report::events`].
    pub record_events: bool,

    /// Log actor switches.
    ///
    /// Defaults to existence of `SIMSYNC_LOG` environment variable.
    pub log: bool,
}

/// Outcome of a simulation that ran to completion.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub struct Report {
    /// Simulated time at which the last actor terminated.
    pub clock: Duration,

    /// Number of actors that took part, including the root actor.
    pub actors: usize,

    /// Number of context switches between actors.
    pub switches: usize,

    /// Scheduler transitions in the order they happened. Empty unless
    /// [`Builder::record_events`] is set.
    pub events: Vec<Event>,
}

/// A scheduler visible transition. `at` is the simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Event {
    /// An actor was created. The root actor has no parent.
    Spawn {
        /// Simulated time
        at: Duration,
        /// The new actor
        actor: ActorId,
        /// The spawning actor
        parent: Option<ActorId>,
    },

    /// The scheduler switched to `actor`.
    Run {
        /// Simulated time
        at: Duration,
        /// Actor now running
        actor: ActorId,
    },

    /// The running actor suspended itself.
    Suspend {
        /// Simulated time
        at: Duration,
        /// Suspended actor
        actor: ActorId,
    },

    /// A suspended actor became eligible to run.
    MarkRunnable {
        /// Simulated time
        at: Duration,
        /// Actor made runnable
        actor: ActorId,
    },

    /// A barrier round completed.
    Release {
        /// Simulated time
        at: Duration,
        /// Actor whose arrival released the round
        actor: ActorId,
        /// Index of the completed round, starting at zero
        round: usize,
    },

    /// The running actor went to sleep.
    Sleep {
        /// Simulated time
        at: Duration,
        /// Sleeping actor
        actor: ActorId,
        /// Wake-up time
        until: Duration,
    },

    /// An actor terminated.
    Terminate {
        /// Simulated time
        at: Duration,
        /// Terminated actor
        actor: ActorId,
    },
}

impl Builder {
    /// Create a new `Builder` instance with default values.
    pub fn new() -> Builder {
        use std::env;

        let max_actors = env::var("SIMSYNC_MAX_ACTORS")
            .map(|v| v.parse().expect("invalid value for `SIMSYNC_MAX_ACTORS`"))
            .unwrap_or(DEFAULT_MAX_ACTORS);

        let stack_size = env::var("SIMSYNC_STACK_SIZE")
            .map(|v| v.parse().expect("invalid value for `SIMSYNC_STACK_SIZE`"))
            .unwrap_or(DEFAULT_STACK_SIZE);

        let log = env::var("SIMSYNC_LOG").is_ok();

        Builder {
            max_actors,
            stack_size,
            record_events: true,
            log,
        }
    }

    /// Set the maximum number of actors.
    pub fn max_actors(&mut self, max_actors: usize) -> &mut Self {
        self.max_actors = max_actors;
        self
    }

    /// Run `f` as the root actor, named `main`, until every actor has
    /// terminated.
    ///
    /// Returns [`Error::Deadlock`] if the run stalls: no actor is runnable,
    /// no actor is sleeping, yet some actors have not terminated. A panic
    /// inside any actor propagates to the caller.
    pub fn run<F>(&self, f: F) -> Result<Report>
    where
        F: FnOnce() + 'static,
    {
        assert!(self.max_actors > 0, "`max_actors` must be at least 1");

        let _span = tracing::info_span!("sim").entered();

        let mut execution = Execution::new(self.max_actors, self.record_events);
        let mut scheduler = Scheduler::new(self.stack_size);

        execution.log = self.log;

        scheduler.run(&mut execution, move || {
            f();
            rt::actor_done();
        });

        let blocked = execution.stalled();

        if !blocked.is_empty() {
            warn!(?blocked, clock = ?execution.clock, "simulation deadlocked");
            return Err(Error::Deadlock { blocked });
        }

        info!(
            clock = ?execution.clock,
            actors = execution.actors.len(),
            switches = execution.switches,
            live_objects = execution.objects.live(),
            "simulation completed"
        );

        Ok(Report {
            clock: execution.clock,
            actors: execution.actors.len(),
            switches: execution.switches,
            events: execution.events.take().unwrap_or_default(),
        })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a simulation with the default [`Builder`], logging through `tracing`.
///
/// Log output is filtered with the `SIMSYNC_LOG` environment variable, using
/// the `EnvFilter` directive syntax (for example `SIMSYNC_LOG=trace`).
pub fn simulate<F>(f: F) -> Result<Report>
where
    F: FnOnce() + 'static,
{
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_env("SIMSYNC_LOG"))
        .with_test_writer()
        .without_time()
        .finish();

    subscriber::with_default(subscriber, || Builder::new().run(f))
}
