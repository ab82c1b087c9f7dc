#![doc(html_root_url = "https://docs.rs/simsync/0.1.0")]
#![deny(missing_debug_implementations, missing_docs, rust_2018_idioms)]

//! Simsync is a deterministic, cooperative actor scheduler with a reusable
//! process barrier.
//!
//! # Background
//!
//! Discrete-event simulations model many concurrent processes, yet need runs
//! to be reproducible: the same program must produce the same interleaving
//! every time. Simsync runs every simulated actor as a coroutine on a single
//! OS thread. Exactly one actor executes at any instant and control only
//! changes hands at explicit suspension points, so the order of events is a
//! pure function of the program.
//!
//! # Barriers
//!
//! A [`Barrier`](sync::Barrier) makes a fixed number of actors rendezvous
//! before any of them proceeds:
//!
//! ```
//! use simsync::actor;
//! use simsync::sync::Barrier;
//!
//! use std::rc::Rc;
//!
//! let report = simsync::sim::simulate(|| {
//!     let barrier = Rc::new(Barrier::new(3).unwrap());
//!
//!     let workers: Vec<_> = (0..2)
//!         .map(|_| {
//!             let barrier = barrier.clone();
//!             actor::spawn(move || {
//!                 barrier.enter().unwrap();
//!             })
//!         })
//!         .collect();
//!
//!     barrier.enter().unwrap();
//!
//!     for worker in workers {
//!         worker.join();
//!     }
//! })
//! .unwrap();
//!
//! assert_eq!(report.actors, 3);
//! ```
//!
//! The release of a round happens within the step of the last arriving
//! actor: every waiter is marked runnable, in arrival order, before that
//! actor's `enter` returns. No other actor can observe a half released
//! round.
//!
//! # Time
//!
//! Actors may [`sleep`](time::sleep) on a simulated clock. The clock jumps
//! forward only when no actor is runnable. A barrier release takes no
//! simulated time.
//!
//! # Deadlocks
//!
//! A barrier that never gathers enough participants leaves its waiters
//! suspended forever. The barrier itself does not detect this; the run does,
//! once nothing is left to schedule, and reports it as
//! [`Error::Deadlock`].

pub mod actor;
mod error;
mod rt;
pub mod sim;
pub mod sync;
pub mod time;

pub use crate::error::{Error, Result};

#[doc(inline)]
pub use crate::sim::simulate;
