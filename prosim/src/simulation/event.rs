//! Pending wake-ups and their rendezvous channels.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::client::{ClientId, Interrupt};
use crate::time::SimTime;

/// Outcome posted on an event's rendezvous channel: the wake-up payload, or
/// the interrupt the owner's suspended call resumes with.
pub(crate) type Delivery = Result<SimTime, Interrupt>;

/// A single pending wake-up, immutable once submitted.
///
/// The rendezvous channel has zero capacity and is written exactly once over
/// the event's lifetime: posting on it hands control back to the owner, which
/// is blocked on the receiving side inside its `delay` call. Dropping an
/// undelivered event closes the channel, which the owner observes as
/// [`Interrupt::Finished`].
pub(crate) struct Event {
    /// Wake-up timestamp.
    pub(crate) time: SimTime,
    /// Payload delivered on wake-up; defaults to `time`.
    pub(crate) value: SimTime,
    /// Resume the owner with `Err(Interrupt::Failure)` instead of the payload.
    pub(crate) error: bool,
    /// Submitting client.
    pub(crate) owner: ClientId,
    rendezvous: Sender<Delivery>,
}

impl Event {
    /// Creates an event together with the receiving side of its rendezvous.
    pub(crate) fn new(
        time: SimTime,
        value: SimTime,
        error: bool,
        owner: ClientId,
    ) -> (Self, Receiver<Delivery>) {
        let (rendezvous, handover) = bounded(0);

        (
            Self {
                time,
                value,
                error,
                owner,
                rendezvous,
            },
            handover,
        )
    }

    /// Posts the delivery outcome, blocking until the owner takes it.
    ///
    /// A departed owner (dropped receiver) makes this a no-op.
    pub(crate) fn deliver(self, outcome: Delivery) {
        let _ = self.rendezvous.send(outcome);
    }
}
