#![deny(warnings, rust_2018_idioms)]

use simsync::actor;
use simsync::sim;
use simsync::sync::Barrier;
use simsync::Error;

use std::rc::Rc;

fn blocked(err: Error) -> Vec<usize> {
    match err {
        Error::Deadlock { blocked } => blocked.iter().map(|id| id.as_usize()).collect(),
        err => panic!("unexpected error: {:?}", err),
    }
}

#[test]
fn missing_participant() {
    let err = sim::simulate(|| {
        let barrier = Rc::new(Barrier::new(3).unwrap());

        {
            let barrier = barrier.clone();
            actor::spawn(move || {
                barrier.enter().unwrap();
            });
        }

        barrier.enter().unwrap();
        unreachable!();
    })
    .unwrap_err();

    assert_eq!(vec![0, 1], blocked(err));
}

#[test]
fn two_barriers_crossed() {
    let err = sim::simulate(|| {
        let a = Rc::new(Barrier::new(2).unwrap());
        let b = Rc::new(Barrier::new(2).unwrap());

        let th = {
            let a = a.clone();
            let b = b.clone();

            actor::spawn(move || {
                b.enter().unwrap();
                a.enter().unwrap();
            })
        };

        a.enter().unwrap();
        b.enter().unwrap();
        th.join();
    })
    .unwrap_err();

    assert_eq!(vec![0, 1], blocked(err));
}

#[test]
fn terminated_actors_are_not_reported() {
    let err = sim::simulate(|| {
        let barrier = Rc::new(Barrier::new(2).unwrap());

        actor::spawn(|| {}).join();

        {
            let barrier = barrier.clone();
            actor::spawn(move || {
                barrier.enter().unwrap();
            });
        }
    })
    .unwrap_err();

    assert_eq!(vec![2], blocked(err));
}

#[test]
fn barrier_dropped_while_actor_waits() {
    let err = sim::simulate(|| {
        let barrier = Rc::new(Barrier::new(2).unwrap());

        {
            let barrier = barrier.clone();
            actor::spawn(move || {
                barrier.enter().unwrap();
            });
        }

        actor::yield_now();
        assert_eq!(1, barrier.arrived().unwrap());

        drop(barrier);
    })
    .unwrap_err();

    assert_eq!(vec![1], blocked(err));
}
