//! Synchronization primitives for simulated actors.

mod barrier;

pub use self::barrier::{Barrier, BarrierWaitResult};
