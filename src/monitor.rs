//! Background refresh scheduling.
//!
//! The scheduler never touches the stores: it only posts a signal over a
//! channel, and the single thread that owns the stores decides when to act
//! on it. Stopping is immediate and does not wait for an interval to elapse.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Message posted to the store-owning thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSignal {
    Rescan,
}

/// Periodic rescan requester.
pub struct RefreshScheduler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawns the timer thread; a `Rescan` signal is sent on `refresh_tx`
    /// every `interval`. The thread exits when the receiver goes away.
    pub fn start(interval: Duration, refresh_tx: Sender<RefreshSignal>) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    if refresh_tx.send(RefreshSignal::Rescan).is_err() {
                        break;
                    }
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Stops the timer immediately. Any refresh already picked up by the
    /// owning thread still runs to completion there.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
