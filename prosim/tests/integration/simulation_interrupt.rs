//! Interruption semantics and error events.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use prosim::client::Interrupt;
use prosim::simulation::{SimInit, Termination};

/// An interrupt issued before the run fails the pending delay and leaves the
/// queue structures empty.
#[test]
fn interrupt_cleans_up_pending_delay() {
    let mut simu = SimInit::new().init(0.0);
    let client = simu.register();
    let id = client.id();

    let worker = thread::spawn(move || client.delay(10.0));

    // Let the delay request reach the bus before interrupting.
    thread::sleep(Duration::from_millis(50));
    simu.interrupt(id, Interrupt::Failure);
    assert_eq!(worker.join().unwrap(), Err(Interrupt::Failure));

    let report = simu.simulate(20.0, true).unwrap();

    assert_eq!(report.termination, Termination::Unset);
    assert_eq!(report.events, 0);
    assert_eq!(simu.now(), 20.0);
}

/// An error event resumes its owner with `Failure` at the scheduled time and
/// the run records the failure while draining normally.
#[test]
fn error_event_resumes_with_failure() {
    let mut simu = SimInit::new().init(0.0);
    let client = simu.register();

    let observed = Arc::new(Mutex::new(None));
    let slot = observed.clone();
    let worker = thread::spawn(move || {
        let outcome = client.fail_at(3.0);
        *slot.lock().unwrap() = Some((client.now(), outcome));
    });

    let report = simu.simulate(5.0, true).unwrap();
    worker.join().unwrap();

    assert_eq!(
        *observed.lock().unwrap(),
        Some((3.0, Err(Interrupt::Failure)))
    );
    assert_eq!(report.termination, Termination::Failure);
    assert_eq!(report.events, 1);
    assert_eq!(simu.now(), 5.0);
}

/// A client can fail a peer's outstanding delay from inside the run.
#[test]
fn client_interrupts_peer() {
    let mut simu = SimInit::new().init(0.0);
    let victim = simu.register();
    let assassin = simu.register();
    let victim_id = victim.id();

    let victim_worker = thread::spawn(move || victim.delay(5.0));
    let assassin_worker = thread::spawn(move || -> Result<(), Interrupt> {
        assassin.delay(1.0)?;
        // Let the victim's request settle in the queue before striking.
        thread::sleep(Duration::from_millis(50));
        assassin.interrupt(victim_id, Interrupt::Failure);

        Ok(())
    });

    let report = simu.simulate(10.0, true).unwrap();

    assert_eq!(victim_worker.join().unwrap(), Err(Interrupt::Failure));
    assassin_worker.join().unwrap().unwrap();
    assert_eq!(report.events, 2);
    assert_eq!(simu.now(), 10.0);
}

/// Interrupting a client that already completed is a no-op.
#[test]
fn interrupt_after_completion_is_noop() {
    let mut simu = SimInit::new().init(0.0);
    let client = simu.register();
    let id = client.id();

    let worker = thread::spawn(move || client.delay(1.0));
    simu.simulate(2.0, false).unwrap();
    assert_eq!(worker.join().unwrap(), Ok(1.0));

    simu.interrupt(id, Interrupt::Failure);

    let report = simu.simulate(2.0, true).unwrap();
    assert_eq!(report.events, 0);
    assert_eq!(report.termination, Termination::Unset);
}
