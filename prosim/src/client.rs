//! Client processes and their interaction with the scheduler.
//!
//! A client process is an ordinary thread holding a [`Client`] handle. Its
//! only permitted suspension points are the handle's `delay` family of
//! methods: each call publishes a request on the simulation's ingress channel
//! and then blocks on a private rendezvous until the scheduler delivers the
//! wake-up — or injects an [`Interrupt`].
//!
//! Between two suspension points a client runs arbitrary code, but the
//! scheduler will not advance virtual time until every resumed client has
//! either suspended again or dropped its handle. A client that never suspends
//! therefore starves the simulation; this is a contract on client authors,
//! not a condition the kernel defends against (the watchdog will eventually
//! report such a run as idle).

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::simulation::event::Event;
use crate::time::{AtomicTimeReader, SimTime};

/// Identifier of a registered client process.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub(crate) usize);

impl fmt::Display for ClientId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "client #{}", self.0)
    }
}

/// Cause injected into a client whose suspended `delay` call is failed rather
/// than resumed with a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Interrupt {
    /// An explicit error event or failure interruption.
    Failure,
    /// The run was terminated because virtual time stopped advancing.
    Idle,
    /// The client was terminated at the end of a finishing run, or the
    /// simulation no longer exists.
    Finished,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure => write!(fmt, "the pending delay was failed"),
            Self::Idle => write!(fmt, "the simulation went idle"),
            Self::Finished => write!(fmt, "the simulation was finished"),
        }
    }
}

impl Error for Interrupt {}

/// A message submitted to the scheduler on the ingress channel.
pub(crate) enum Request {
    /// File a pending wake-up for its owner.
    Schedule(Event),
    /// Fail the target's outstanding delay with the given cause.
    Interrupt { client: ClientId, cause: Interrupt },
    /// A client registered from inside a running simulation.
    Register(ClientId),
    /// End-of-life notice, sent when a `Client` handle is dropped.
    Deregister(ClientId),
    /// Watchdog verdict: no progress over a full sampling period.
    Idle,
}

/// Handle owned by a client process.
///
/// A `Client` is minted by [`Simulation::register`](crate::simulation::Simulation::register)
/// (or by [`Client::fork`]) and moved into the thread that plays the client.
/// Dropping the handle deregisters the client.
///
/// # Examples
///
/// ```
/// use prosim::client::Interrupt;
/// use prosim::simulation::SimInit;
///
/// let mut simu = SimInit::new().init(0.0);
/// let client = simu.register();
///
/// let worker = std::thread::spawn(move || -> Result<(), Interrupt> {
///     let t = client.delay(2.0)?;
///     assert_eq!(t, 2.0);
///     assert_eq!(client.now(), 2.0);
///     Ok(())
/// });
///
/// simu.simulate(10.0, true).unwrap();
/// worker.join().unwrap().unwrap();
/// ```
pub struct Client {
    id: ClientId,
    requests: Sender<Request>,
    time: AtomicTimeReader,
    next_client_id: Arc<AtomicUsize>,
}

impl Client {
    pub(crate) fn new(
        id: ClientId,
        requests: Sender<Request>,
        time: AtomicTimeReader,
        next_client_id: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id,
            requests,
            time,
            next_client_id,
        }
    }

    /// Returns this client's identifier.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> SimTime {
        self.time.read()
    }

    /// Suspends until virtual time has advanced by `delta` seconds.
    ///
    /// Returns the wake-up timestamp, or the interrupt injected while the
    /// client was suspended.
    pub fn delay(&self, delta: SimTime) -> Result<SimTime, Interrupt> {
        let time = self.now() + delta;

        self.suspend(time, time, false)
    }

    /// Suspends until virtual time `time`.
    ///
    /// The timestamp must be finite and must not lie in the past of the
    /// current virtual time; a past timestamp is a fatal scheduling error
    /// that aborts the whole run.
    pub fn delay_until(&self, time: SimTime) -> Result<SimTime, Interrupt> {
        self.suspend(time, time, false)
    }

    /// Suspends until virtual time `time` and resumes with the given payload
    /// instead of the timestamp.
    pub fn delay_until_with(&self, time: SimTime, value: SimTime) -> Result<SimTime, Interrupt> {
        self.suspend(time, value, false)
    }

    /// Schedules this client's own failure: suspends until virtual time
    /// `time`, then resumes with [`Interrupt::Failure`].
    pub fn fail_at(&self, time: SimTime) -> Result<SimTime, Interrupt> {
        self.suspend(time, time, true)
    }

    /// Fails another client's outstanding delay with the given cause.
    ///
    /// Interrupting a client that has no outstanding delay, or that already
    /// completed, is a no-op.
    pub fn interrupt(&self, client: ClientId, cause: Interrupt) {
        let _ = self.requests.send(Request::Interrupt { client, cause });
    }

    /// Registers and returns a new client from inside a running simulation.
    pub fn fork(&self) -> Client {
        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        let _ = self.requests.send(Request::Register(id));

        Client::new(
            id,
            self.requests.clone(),
            self.time.clone(),
            self.next_client_id.clone(),
        )
    }

    fn suspend(&self, time: SimTime, value: SimTime, error: bool) -> Result<SimTime, Interrupt> {
        debug_assert!(time.is_finite());

        let (event, handover) = Event::new(time, value, error, self.id);
        if self.requests.send(Request::Schedule(event)).is_err() {
            // The simulation was dropped.
            return Err(Interrupt::Finished);
        }

        match handover.recv() {
            Ok(outcome) => outcome,
            // The event was discarded without being delivered.
            Err(_) => Err(Interrupt::Finished),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let _ = self.requests.send(Request::Deregister(self.id));
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Client").field("id", &self.id).finish()
    }
}
