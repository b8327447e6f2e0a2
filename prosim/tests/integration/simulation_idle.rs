//! Idleness detection when virtual time cannot advance.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use prosim::simulation::{SimInit, Termination};

/// A registered client suspended outside the kernel (here: on a channel that
/// is never driven) stalls the run; the watchdog reports it as idle.
#[test]
fn idle_when_client_waits_outside_the_kernel() {
    let mut simu = SimInit::new()
        .set_watchdog_period(Duration::from_millis(50))
        .init(0.0);
    let client = simu.register();

    let (release, blocker) = mpsc::channel::<()>();
    let worker = thread::spawn(move || {
        // Hold the handle so the client stays registered while blocked.
        let _client = client;
        let _ = blocker.recv();
    });

    let report = simu.simulate(10.0, true).unwrap();

    assert_eq!(report.termination, Termination::Idle);
    assert_eq!(simu.termination(), Termination::Idle);
    assert_eq!(report.events, 0);

    drop(release);
    worker.join().unwrap();
}

/// Dropping an unused client handle deregisters it; the run is not mistaken
/// for an idle one.
#[test]
fn dropped_client_does_not_stall_the_run() {
    let mut simu = SimInit::new().init(0.0);
    let client = simu.register();
    drop(client);

    let report = simu.simulate(1.0, true).unwrap();

    assert_eq!(report.termination, Termination::Unset);
    assert_eq!(report.events, 0);
}
