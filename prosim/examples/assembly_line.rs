//! A miniature assembly line: jobs arrive staggered in time and pass through
//! three stations of fixed service time. Each job is a client process; the
//! kernel orders all station completions on the shared virtual clock.
//!
//! Run with `cargo run --example assembly_line`.

use std::thread;

use prosim::client::{Client, Interrupt};
use prosim::simulation::SimInit;

const JOBS: usize = 4;
const ARRIVAL_SPACING: f64 = 0.5;
const STATIONS: [(&str, f64); 3] = [("cutting", 1.0), ("welding", 2.5), ("painting", 1.5)];

fn job(client: Client, name: usize) -> Result<(), Interrupt> {
    client.delay(name as f64 * ARRIVAL_SPACING)?;
    println!("[t={:>4.1}] job {} enters the line", client.now(), name);

    for (station, service_time) in STATIONS {
        client.delay(service_time)?;
        println!(
            "[t={:>4.1}] job {} leaves {}",
            client.now(),
            name,
            station
        );
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let mut simu = SimInit::new().init(0.0);

    let workers: Vec<_> = simu
        .register_many(JOBS)
        .into_iter()
        .enumerate()
        .map(|(name, client)| thread::spawn(move || job(client, name)))
        .collect();

    let report = simu.simulate(60.0, true).unwrap();
    for worker in workers {
        let _ = worker.join().unwrap();
    }

    println!(
        "line drained at t={} after {} events ({})",
        simu.now(),
        report.events,
        report.termination
    );
}
