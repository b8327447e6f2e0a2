//! Timestamp-ordered delivery and clean-drain termination.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use prosim::client::Interrupt;
use prosim::simulation::{SimInit, Termination};

/// Two sequential delays resume at their scheduled timestamps and the run
/// drains cleanly before the horizon.
#[test]
fn two_tick_ping() {
    let mut simu = SimInit::new().init(0.0);
    let client = simu.register();

    let resumed = Arc::new(Mutex::new(Vec::new()));
    let log = resumed.clone();
    let worker = thread::spawn(move || -> Result<(), Interrupt> {
        let t = client.delay(1.0)?;
        log.lock().unwrap().push((t, client.now()));

        let t = client.delay(2.5)?;
        log.lock().unwrap().push((t, client.now()));

        Ok(())
    });

    let report = simu.simulate(5.0, true).unwrap();
    worker.join().unwrap().unwrap();

    assert_eq!(*resumed.lock().unwrap(), vec![(1.0, 1.0), (3.5, 3.5)]);
    assert_eq!(report.termination, Termination::Unset);
    assert_eq!(report.events, 2);
    assert_eq!(simu.now(), 5.0);
}

/// Clients sharing a timestamp resume in submission order, and each resumed
/// client runs to completion before the next one is woken.
#[test]
fn fifo_within_a_timestamp() {
    let mut simu = SimInit::new().init(0.0);
    let first = simu.register();
    let second = simu.register();

    let order = Arc::new(Mutex::new(Vec::new()));
    let log_first = order.clone();
    let log_second = order.clone();

    let worker_first = thread::spawn(move || {
        first.delay(2.0).unwrap();
        log_first.lock().unwrap().push("first");
    });
    let worker_second = thread::spawn(move || {
        // Stagger submission so that the other request reaches the bus first.
        thread::sleep(Duration::from_millis(50));
        second.delay(2.0).unwrap();
        log_second.lock().unwrap().push("second");
    });

    simu.simulate(5.0, true).unwrap();
    worker_first.join().unwrap();
    worker_second.join().unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    assert_eq!(simu.now(), 5.0);
}

type SimTimePair = (f64, f64);

/// `delay` resumes with `now() == t0 + delta`.
#[test]
fn delay_advances_by_delta() {
    let mut simu = SimInit::new().init(10.0);
    let client = simu.register();

    let worker = thread::spawn(move || -> Result<(SimTimePair, SimTimePair), Interrupt> {
        let t0 = client.now();
        let t = client.delay(2.25)?;
        let first = (t0, t);

        let t0 = client.now();
        let t = client.delay(0.75)?;
        let second = (t0, t);

        Ok((first, second))
    });

    simu.simulate(100.0, true).unwrap();
    let (first, second) = worker.join().unwrap().unwrap();

    assert_eq!(first, (10.0, 12.25));
    assert_eq!(second, (12.25, 13.0));
}

/// A custom payload is handed over in place of the timestamp.
#[test]
fn custom_payload_is_delivered() {
    let mut simu = SimInit::new().init(0.0);
    let client = simu.register();

    let worker = thread::spawn(move || client.delay_until_with(2.0, 42.0));

    simu.simulate(5.0, true).unwrap();
    assert_eq!(worker.join().unwrap(), Ok(42.0));
}

/// An empty bench with no pending requests exits immediately.
#[test]
fn empty_bench_exits_immediately() {
    let mut simu = SimInit::new().init(0.0);

    let report = simu.simulate(1.0, true).unwrap();

    assert_eq!(report.termination, Termination::Unset);
    assert_eq!(report.events, 0);
    assert_eq!(simu.now(), 1.0);
}

/// A client registered from inside a running simulation participates in the
/// same run.
#[test]
fn forked_client_participates() {
    let mut simu = SimInit::new().init(0.0);
    let parent = simu.register();

    let worker = thread::spawn(move || {
        let child = parent.fork();
        let child_worker = thread::spawn(move || child.delay(1.0));

        let parent_resumed = parent.delay(2.0);
        (parent_resumed, child_worker.join().unwrap())
    });

    let report = simu.simulate(5.0, true).unwrap();
    let (parent_resumed, child_resumed) = worker.join().unwrap();

    assert_eq!(parent_resumed, Ok(2.0));
    assert_eq!(child_resumed, Ok(1.0));
    assert_eq!(report.events, 2);
}
