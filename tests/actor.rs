#![deny(warnings, rust_2018_idioms)]

use simsync::actor;
use simsync::sim::{self, Event};
use simsync::Error;

use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn root_actor() {
    sim::simulate(|| {
        let me = actor::current();
        assert_eq!(0, me.id().as_usize());
        assert_eq!(Some("main"), me.name());
    })
    .unwrap();
}

#[test]
fn actor_names_and_ids() {
    sim::simulate(|| {
        let th = actor::spawn(|| actor::current());
        assert_eq!(None, th.actor().name());
        let id = th.actor().id();
        assert_eq!(id, th.join().id());

        let th = actor::Builder::new()
            .name("foobar")
            .spawn(|| actor::current().name().map(|s| s.to_string()))
            .unwrap();
        assert_eq!(Some("foobar"), th.actor().name());
        assert_eq!(Some("foobar".to_string()), th.join());

        assert_ne!(id, actor::current().id());
    })
    .unwrap();
}

#[test]
fn spawned_actors_run_in_spawn_order() {
    let log = Rc::new(RefCell::new(vec![]));

    {
        let log = log.clone();

        sim::simulate(move || {
            let handles: Vec<_> = (0..3)
                .map(|i| {
                    let log = log.clone();
                    actor::spawn(move || log.borrow_mut().push(i))
                })
                .collect();

            // The spawner keeps running until it suspends.
            log.borrow_mut().push(-1);

            for handle in handles {
                handle.join();
            }
        })
        .unwrap();
    }

    assert_eq!(vec![-1, 0, 1, 2], *log.borrow());
}

#[test]
fn yield_goes_to_the_back_of_the_queue() {
    let log = Rc::new(RefCell::new(vec![]));

    {
        let log = log.clone();

        sim::simulate(move || {
            let handles: Vec<_> = ["a", "b"]
                .iter()
                .map(|&name| {
                    let log = log.clone();
                    actor::spawn(move || {
                        for _ in 0..2 {
                            log.borrow_mut().push(name);
                            actor::yield_now();
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join();
            }
        })
        .unwrap();
    }

    assert_eq!(vec!["a", "b", "a", "b"], *log.borrow());
}

#[test]
fn suspend_and_unpark() {
    sim::simulate(|| {
        let main = actor::current();
        let woken = Rc::new(RefCell::new(false));

        let th = {
            let woken = woken.clone();
            actor::spawn(move || {
                *woken.borrow_mut() = true;
                main.unpark();
            })
        };

        actor::suspend();
        assert!(*woken.borrow());

        th.join();
    })
    .unwrap();
}

#[test]
fn unpark_of_runnable_actor_is_a_noop() {
    let report = sim::simulate(|| {
        actor::current().unpark();
    })
    .unwrap();

    assert!(!report
        .events
        .iter()
        .any(|event| matches!(event, Event::MarkRunnable { .. })));
}

#[test]
fn actor_limit() {
    let mut builder = sim::Builder::new();
    builder.max_actors(2);

    builder
        .run(|| {
            let th = actor::spawn(|| {});

            let err = actor::Builder::new().spawn(|| {}).unwrap_err();
            assert_eq!(Error::ActorLimit { max: 2 }, err);

            th.join();
        })
        .unwrap();
}

#[test]
fn report_counts() {
    let report = sim::simulate(|| {
        let th = actor::spawn(|| 1 + 1);
        assert_eq!(2, th.join());
    })
    .unwrap();

    assert_eq!(2, report.actors);
    // main -> spawned -> main
    assert_eq!(2, report.switches);
}

#[test]
fn events_can_be_disabled() {
    let mut builder = sim::Builder::new();
    builder.record_events = false;

    let report = builder.run(|| actor::spawn(|| {}).join()).unwrap();
    assert!(report.events.is_empty());
}

#[test]
#[should_panic]
fn panic_in_actor_propagates() {
    let _ = sim::simulate(|| {
        actor::spawn(|| panic!("boom")).join();
    });
}

#[test]
#[should_panic]
fn current_outside_of_simulation() {
    actor::current();
}

#[cfg(feature = "serde")]
#[test]
fn report_serializes() {
    let report = sim::simulate(|| actor::spawn(|| {}).join()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(2, json["actors"]);
    assert!(json["events"].as_array().unwrap().len() > 0);
}
