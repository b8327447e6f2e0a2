//! Wall-clock observer detecting a stalled simulation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::client::Request;
use crate::time::AtomicTimeReader;

/// Parallel observer that declares the simulation idle when neither the
/// virtual clock nor the delivery counter advanced over one sampling period.
///
/// Sampling the delivery counter in addition to the clock keeps zero-delay
/// activity (several slots at the same timestamp) from being misread as
/// idleness. The watchdog communicates with the scheduler exclusively through
/// the request bus and never inspects the event queue.
pub(crate) struct Watchdog {
    stop: Sender<()>,
    thread: JoinHandle<()>,
}

impl Watchdog {
    /// Spawns the observer thread with the given sampling period.
    pub(crate) fn spawn(
        period: Duration,
        time: AtomicTimeReader,
        deliveries: Arc<AtomicU64>,
        requests: Sender<Request>,
    ) -> Self {
        let (stop, stopped) = bounded::<()>(1);

        let thread = thread::spawn(move || {
            let mut last = (
                time.read().to_bits(),
                deliveries.load(Ordering::Relaxed),
            );

            loop {
                match stopped.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }

                let sample = (
                    time.read().to_bits(),
                    deliveries.load(Ordering::Relaxed),
                );
                if sample == last {
                    tracing::warn!(
                        period_ms = period.as_millis() as u64,
                        "no progress over a full sampling period, requesting idle termination"
                    );
                    let _ = requests.send(Request::Idle);

                    return;
                }
                last = sample;
            }
        });

        Self { stop, thread }
    }

    /// Stops the observer and waits for its thread to exit.
    pub(crate) fn stop(self) {
        drop(self.stop);
        let _ = self.thread.join();
    }
}
