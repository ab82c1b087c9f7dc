#![allow(deprecated)]

use crate::rt::Execution;

use generator::{self, Generator, Gn};
use scoped_tls::scoped_thread_local;
use std::cell::RefCell;
use std::collections::VecDeque;

pub(crate) struct Scheduler {
    /// Coroutine stack size for actors that do not set their own
    stack_size: usize,
}

type Actor = Generator<'static, Option<Box<dyn FnOnce()>>, ()>;

scoped_thread_local! {
    static STATE: RefCell<State<'_>>
}

struct QueuedSpawn {
    f: Box<dyn FnOnce()>,
    stack_size: Option<usize>,
}

struct State<'a> {
    execution: &'a mut Execution,
    queued_spawn: &'a mut VecDeque<QueuedSpawn>,
}

impl Scheduler {
    /// Create a scheduler
    pub(crate) fn new(stack_size: usize) -> Scheduler {
        Scheduler { stack_size }
    }

    /// Access the execution, if called from within a running simulation.
    pub(crate) fn try_with_execution<F, R>(f: F) -> Option<R>
    where
        F: FnOnce(&mut Execution) -> R,
    {
        if !STATE.is_set() {
            return None;
        }

        Some(STATE.with(|state| f(&mut *state.borrow_mut().execution)))
    }

    /// Perform a context switch
    pub(crate) fn switch() {
        use std::future::Future;
        use std::pin::Pin;
        use std::ptr;
        use std::task::{Context, RawWaker, RawWakerVTable, Waker};

        unsafe fn noop_clone(_: *const ()) -> RawWaker {
            unreachable!()
        }
        unsafe fn noop(_: *const ()) {}

        // Wrapping with an async block deals with the thread-local context
        // `std` uses to manage async blocks
        let mut switch = async { generator::yield_with(()) };
        let switch = unsafe { Pin::new_unchecked(&mut switch) };

        let raw_waker = RawWaker::new(
            ptr::null(),
            &RawWakerVTable::new(noop_clone, noop, noop, noop),
        );
        let waker = unsafe { Waker::from_raw(raw_waker) };
        let mut cx = Context::from_waker(&waker);

        assert!(switch.poll(&mut cx).is_ready());
    }

    /// Queue an actor body. It is turned into a coroutine once the spawning
    /// actor hands control back to the run loop.
    pub(crate) fn spawn(stack_size: Option<usize>, f: Box<dyn FnOnce()>) {
        STATE.with(|state| {
            state
                .borrow_mut()
                .queued_spawn
                .push_back(QueuedSpawn { stack_size, f })
        });
    }

    /// Drive `execution` until no actor is active.
    pub(crate) fn run<F>(&mut self, execution: &mut Execution, f: F)
    where
        F: FnOnce() + 'static,
    {
        let mut actors = Vec::new();
        actors.push(spawn_actor(Box::new(f), self.stack_size));
        actors[0].resume();

        loop {
            if !execution.actors.is_active() {
                return;
            }

            let active = execution.actors.active_id();

            let mut queued_spawn = Self::tick(&mut actors[active.as_usize()], execution);

            while let Some(spawn) = queued_spawn.pop_front() {
                let QueuedSpawn { f, stack_size } = spawn;
                let actor_id = actors.len();

                actors.push(spawn_actor(f, stack_size.unwrap_or(self.stack_size)));
                actors[actor_id].resume();
            }
        }
    }

    fn tick(actor: &mut Actor, execution: &mut Execution) -> VecDeque<QueuedSpawn> {
        let mut queued_spawn = VecDeque::new();
        let state = RefCell::new(State {
            execution,
            queued_spawn: &mut queued_spawn,
        });

        STATE.set(unsafe { transmute_lt(&state) }, || {
            actor.resume();
        });
        queued_spawn
    }
}

fn spawn_actor(f: Box<dyn FnOnce()>, stack_size: usize) -> Actor {
    let body = move || loop {
        let f: Option<Box<dyn FnOnce()>> = generator::yield_(()).unwrap();
        generator::yield_with(());
        f.unwrap()();
    };
    let mut g = Gn::new_opt(stack_size, body);
    g.resume();
    g.set_para(Some(f));
    g
}

unsafe fn transmute_lt<'a, 'b>(state: &'a RefCell<State<'b>>) -> &'a RefCell<State<'static>> {
    ::std::mem::transmute(state)
}
