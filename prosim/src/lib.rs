//! A process-oriented, discrete-event simulation kernel.
//!
//! Prosim drives many concurrent *client processes* through simulated time: a
//! client voluntarily suspends itself until a chosen virtual timestamp, and a
//! central scheduler resumes suspended clients in strict timestamp order.
//! Virtual time is pure: it has no relation to wall-clock time and only moves
//! when the scheduler pops the next event.
//!
//! The kernel is the substrate on which application models — workflow and
//! throughput benches, queueing networks, job shops — are built: the
//! application supplies the client processes, the kernel supplies the clock,
//! the event queue and the delivery protocol.
//!
//! # A practical overview
//!
//! Running a simulation involves three activities:
//!
//! 1. initialization of a [`Simulation`](simulation::Simulation) with the
//!    [`SimInit`](simulation::SimInit) builder,
//! 2. registration of client processes, each of which receives a
//!    [`Client`](client::Client) handle and runs on its own thread,
//! 3. execution with [`simulate()`](simulation::Simulation::simulate), which
//!    advances virtual time towards a horizon and reports how the run
//!    terminated.
//!
//! A client interacts with the kernel through its handle only:
//! [`delay()`](client::Client::delay) and
//! [`delay_until()`](client::Client::delay_until) suspend it until the
//! scheduler delivers the wake-up, [`now()`](client::Client::now) reads the
//! virtual clock, and [`interrupt()`](client::Client::interrupt) fails
//! another client's outstanding delay. Scheduling is strictly cooperative:
//! between two suspension points a client has the simulation to itself.
//!
//! # Example
//!
//! ```
//! use prosim::client::Interrupt;
//! use prosim::simulation::{SimInit, Termination};
//!
//! let mut simu = SimInit::new().init(0.0);
//! let client = simu.register();
//!
//! let worker = std::thread::spawn(move || -> Result<(), Interrupt> {
//!     client.delay(1.0)?;
//!     assert_eq!(client.now(), 1.0);
//!
//!     client.delay(2.5)?;
//!     assert_eq!(client.now(), 3.5);
//!
//!     Ok(())
//! });
//!
//! let report = simu.simulate(5.0, true).unwrap();
//! worker.join().unwrap().unwrap();
//!
//! assert_eq!(report.events, 2);
//! assert_eq!(report.termination, Termination::Unset);
//! assert_eq!(simu.now(), 5.0);
//! ```
//!
//! # Termination
//!
//! A run ends in one of four ways, reported in the
//! [`RunReport`](simulation::RunReport) and queryable afterwards with
//! [`termination()`](simulation::Simulation::termination): a clean drain of
//! the event queue, a [`Done`](simulation::Termination::Done) cut at the
//! horizon, an [`Idle`](simulation::Termination::Idle) verdict from the
//! watchdog when virtual time stops advancing, or a recorded
//! [`Failure`](simulation::Termination::Failure) after an explicit error
//! event. With the `finish` flag, clients still suspended at the end of the
//! run are resumed with [`Interrupt::Finished`](client::Interrupt::Finished).

pub mod client;
pub mod simulation;
pub mod time;
mod watchdog;
