//! Discrete-event simulation management.
//!
//! This module contains most notably the [`Simulation`] environment and the
//! [`SimInit`] simulation builder, as well as the types reported back by a
//! run: [`Termination`], [`RunReport`] and [`ExecutionError`].
//!
//! # Simulation lifecycle
//!
//! A simulation bench typically goes through the following stages:
//!
//! 1. initialization of a [`Simulation`] with [`SimInit::init()`],
//! 2. registration of client processes with [`Simulation::register()`] and
//!    hand-off of the returned [`Client`] handles to their threads,
//! 3. one or more calls to [`Simulation::simulate()`], each advancing virtual
//!    time towards a horizon and returning a [`RunReport`] once the run
//!    terminated.
//!
//! # Scheduling model
//!
//! All simulation state is owned by the `Simulation` and only ever mutated
//! from the thread driving it; clients interact with the scheduler solely
//! through an unbounded ingress channel. Within a run the scheduler
//! alternates between two activities:
//!
//! * *ingestion*: every request already published on the ingress channel is
//!   filed into the event queue before the next delivery is considered, so
//!   requests posted before a delivery step are always visible to it;
//! * *delivery*: the slot with the lowest timestamp is popped, virtual time
//!   advances to it, and its events are handed over one at a time. After each
//!   hand-over the scheduler waits until the resumed client suspends again or
//!   deregisters, preserving the cooperative semantics of the process model
//!   even though clients are preemptively scheduled threads.
//!
//! A run ends when the queue drains with no client left running, when the
//! next timestamp reaches the horizon, or when the watchdog reports that no
//! progress was made over a full sampling period.

pub(crate) mod event;
mod event_queue;
mod registry;
mod sim_init;

pub use sim_init::SimInit;

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::client::{Client, ClientId, Interrupt, Request};
use crate::time::{AtomicTime, SimTime};
use crate::watchdog::Watchdog;

use event::Event;
use event_queue::{EventQueue, SlotId};
use registry::ClientRegistry;

/// Reason a simulation run came to an end.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Termination {
    /// No special cause: the queue drained with no client left running.
    #[default]
    Unset,
    /// The next scheduled event lies at or beyond the horizon.
    Done,
    /// The watchdog detected no progress with work still outstanding.
    Idle,
    /// Clients were forcibly terminated at the end of the run.
    Finished,
    /// An explicit error event was delivered.
    Failure,
}

impl fmt::Display for Termination {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(fmt, "no termination cause recorded"),
            Self::Done => write!(fmt, "next event at or beyond the horizon"),
            Self::Idle => write!(fmt, "virtual time stopped advancing"),
            Self::Finished => write!(fmt, "clients terminated at end of run"),
            Self::Failure => write!(fmt, "an error event was delivered"),
        }
    }
}

/// Summary of a completed [`Simulation::simulate()`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Why the run ended.
    pub termination: Termination,
    /// Elapsed wall-clock time, for reporting only.
    pub duration: Duration,
    /// Number of completed rendezvous, including injected interrupts.
    pub events: u64,
}

/// Fatal error aborting a simulation run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExecutionError {
    /// The earliest queued timestamp lies in the past of the current virtual
    /// time.
    TimeRegression {
        /// Timestamp of the offending event.
        scheduled: SimTime,
        /// Virtual time when the event was popped.
        current: SimTime,
    },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeRegression { scheduled, current } => write!(
                fmt,
                "an event scheduled at t={} was popped at t={}; virtual time cannot regress",
                scheduled, current
            ),
        }
    }
}

impl Error for ExecutionError {}

/// Simulation environment.
///
/// A `Simulation` is created by calling [`SimInit::init()`] on a simulation
/// builder. It owns the event queue, the client registry and the virtual
/// clock, and it is the single writer of all of them.
///
/// Client processes are minted with [`register()`](Simulation::register)
/// before (or between) runs, and from inside a run with
/// [`Client::fork()`](crate::client::Client::fork). A run is driven with
/// [`simulate()`](Simulation::simulate), which returns only after
/// termination.
///
/// Dropping the `Simulation` closes the ingress channel and every pending
/// rendezvous; clients still blocked in a `delay` call then resume with
/// [`Interrupt::Finished`].
pub struct Simulation {
    queue: EventQueue,
    registry: ClientRegistry,
    /// Events of the slot currently being delivered, with their slot id.
    batch: VecDeque<(SlotId, Event)>,
    requests: Receiver<Request>,
    ingress: Sender<Request>,
    time: AtomicTime,
    next_client_id: Arc<AtomicUsize>,
    deliveries: Arc<AtomicU64>,
    termination: Termination,
    watchdog_period: Duration,
}

impl Simulation {
    /// Creates a new `Simulation` starting at the specified virtual time.
    pub(crate) fn new(start_time: SimTime, watchdog_period: Duration) -> Self {
        let (ingress, requests) = crossbeam_channel::unbounded();

        Self {
            queue: EventQueue::new(),
            registry: ClientRegistry::new(),
            batch: VecDeque::new(),
            requests,
            ingress,
            time: AtomicTime::new(start_time),
            next_client_id: Arc::new(AtomicUsize::new(0)),
            deliveries: Arc::new(AtomicU64::new(0)),
            termination: Termination::Unset,
            watchdog_period,
        }
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> SimTime {
        self.time.read()
    }

    /// Returns the termination cause recorded by the last run.
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Registers a new client process and returns its handle.
    ///
    /// The handle is meant to be moved into the thread that plays the client;
    /// dropping it deregisters the client.
    pub fn register(&mut self) -> Client {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        self.registry.insert(id);

        Client::new(
            id,
            self.ingress.clone(),
            self.time.reader(),
            self.next_client_id.clone(),
        )
    }

    /// Registers `count` client processes at once.
    pub fn register_many(&mut self, count: usize) -> Vec<Client> {
        (0..count).map(|_| self.register()).collect()
    }

    /// Fails a client's outstanding delay with the given cause.
    ///
    /// Requests already published on the ingress channel are filed first, so
    /// a delay submitted before this call is reliably cleaned up. Unknown or
    /// completed targets are a no-op.
    pub fn interrupt(&mut self, client: ClientId, cause: Interrupt) {
        self.drain_requests(false);
        self.interrupt_client(client, cause);
    }

    /// Advances virtual time by up to `horizon` seconds, delivering events in
    /// timestamp order, and returns only after termination.
    ///
    /// On exit the virtual clock is set to the horizon, whether or not events
    /// were delivered up to it. With `finish` set, every client still
    /// suspended at the end of the run is interrupted with
    /// [`Interrupt::Finished`] and the registry is cleared; with `finish`
    /// unset, pending events beyond the horizon stay queued and a later call
    /// can deliver them.
    pub fn simulate(
        &mut self,
        horizon: SimTime,
        finish: bool,
    ) -> Result<RunReport, ExecutionError> {
        let started = Instant::now();
        let events_before = self.deliveries.load(Ordering::Relaxed);
        let stime = self.time.read() + horizon;
        self.termination = Termination::Unset;

        tracing::debug!(horizon, until = stime, "starting simulation run");

        // An idle verdict left over from a previous run's watchdog is stale.
        self.drain_requests(false);

        let watchdog = Watchdog::spawn(
            self.watchdog_period,
            self.time.reader(),
            self.deliveries.clone(),
            self.ingress.clone(),
        );
        let outcome = self.run_to(stime);
        watchdog.stop();
        outcome?;

        self.time.write(stime);
        if finish {
            self.finish_clients();
        }

        let report = RunReport {
            termination: self.termination,
            duration: started.elapsed(),
            events: self.deliveries.load(Ordering::Relaxed) - events_before,
        };
        tracing::debug!(
            termination = %report.termination,
            events = report.events,
            pending = self.queue.len(),
            elapsed_ms = report.duration.as_millis() as u64,
            "simulation run ended"
        );

        Ok(report)
    }

    /// Main scheduler loop, up to the absolute virtual time `stime`.
    fn run_to(&mut self, stime: SimTime) -> Result<(), ExecutionError> {
        loop {
            // Ingest. Everything already published is filed before the next
            // delivery is considered.
            if let Some(halt) = self.drain_requests(true) {
                self.termination = halt;
                return Ok(());
            }

            if self.registry.running() > 0 {
                // Some resumed client still holds the logical token; progress
                // must come from it or from the watchdog.
                match self.requests.recv() {
                    Ok(request) => {
                        if let Some(halt) = self.ingest(request, true) {
                            self.termination = halt;
                            return Ok(());
                        }
                    }
                    Err(_) => return Ok(()),
                }
                continue;
            }

            if let Some((slot, event)) = self.batch.pop_front() {
                self.deliver(slot, event);
                continue;
            }

            let Some((slot, time)) = self.queue.peek_min() else {
                // Nothing outstanding: the run drained cleanly.
                return Ok(());
            };

            if time >= stime {
                self.termination = Termination::Done;
                tracing::debug!(next = time, horizon = stime, "next event reaches the horizon");
                return Ok(());
            }

            let current = self.time.read();
            if time < current {
                return Err(ExecutionError::TimeRegression {
                    scheduled: time,
                    current,
                });
            }

            self.time.write(time);
            tracing::trace!(time, "advancing virtual time");
            for event in self.queue.pop_slot(slot) {
                self.batch.push_back((slot, event));
            }
        }
    }

    /// Hands one event over to its owner.
    fn deliver(&mut self, slot: SlotId, event: Event) {
        self.registry.detach_slot(event.owner, slot);

        if event.error {
            let owner = event.owner;
            tracing::trace!(%owner, time = event.time, "delivering failure event");
            event.deliver(Err(Interrupt::Failure));
            self.deliveries.fetch_add(1, Ordering::Relaxed);
            // An error event also clears any other slot its owner occupies.
            self.interrupt_client(owner, Interrupt::Failure);
            self.termination = Termination::Failure;
        } else {
            let value = event.value;
            tracing::trace!(owner = %event.owner, time = event.time, "delivering wake-up");
            event.deliver(Ok(value));
            self.deliveries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Removes every pending event of `client` and fails its rendezvous with
    /// the given cause. Returns the number of events so delivered.
    fn interrupt_client(&mut self, client: ClientId, cause: Interrupt) -> usize {
        let mut delivered = 0;

        // Events already popped for delivery but not yet handed over.
        let mut index = 0;
        while index < self.batch.len() {
            if self.batch[index].1.owner == client {
                if let Some((_, event)) = self.batch.remove(index) {
                    event.deliver(Err(cause));
                    delivered += 1;
                }
            } else {
                index += 1;
            }
        }

        for slot in self.registry.take_slots(client) {
            for event in self.queue.remove_events_of_owner(slot, client) {
                event.deliver(Err(cause));
                delivered += 1;
            }
        }

        if delivered > 0 {
            self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
            tracing::trace!(%client, %cause, "interrupted client");
        }

        delivered
    }

    /// Interrupts every still-suspended client with `Finished` and clears the
    /// registry.
    fn finish_clients(&mut self) {
        self.drain_requests(false);

        let mut finished = 0;
        while let Some((_, event)) = self.batch.pop_front() {
            event.deliver(Err(Interrupt::Finished));
            self.deliveries.fetch_add(1, Ordering::Relaxed);
            finished += 1;
        }
        for client in self.registry.suspended_clients() {
            finished += self.interrupt_client(client, Interrupt::Finished);
        }

        if finished > 0 && self.termination == Termination::Unset {
            self.termination = Termination::Finished;
        }
        self.registry.clear();
    }

    /// Files every request already published on the ingress channel.
    ///
    /// Returns the termination cause when an accepted idle verdict was
    /// ingested.
    fn drain_requests(&mut self, accept_idle: bool) -> Option<Termination> {
        while let Ok(request) = self.requests.try_recv() {
            if let Some(halt) = self.ingest(request, accept_idle) {
                return Some(halt);
            }
        }

        None
    }

    /// Files a single request.
    fn ingest(&mut self, request: Request, accept_idle: bool) -> Option<Termination> {
        match request {
            Request::Schedule(event) => {
                if !self.registry.contains(event.owner) {
                    // Deregistered owner: dropping the event closes its
                    // rendezvous and unblocks any stranded caller.
                    return None;
                }
                let owner = event.owner;
                tracing::trace!(%owner, time = event.time, "filing delay request");
                let slot = self.queue.insert(event);
                self.registry.suspend(owner, slot);
            }
            Request::Interrupt { client, cause } => {
                self.interrupt_client(client, cause);
            }
            Request::Register(id) => self.registry.insert(id),
            Request::Deregister(id) => {
                for slot in self.registry.remove(id) {
                    self.queue.remove_events_of_owner(slot, id);
                }
            }
            Request::Idle => {
                if accept_idle {
                    return Some(Termination::Idle);
                }
            }
        }

        None
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Simulation")
            .field("time", &self.time.read())
            .field("termination", &self.termination)
            .finish_non_exhaustive()
    }
}
