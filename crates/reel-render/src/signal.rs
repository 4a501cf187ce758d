use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Create a connected stop handle / stop signal pair.
///
/// # Example
/// ```
/// use reel_render::signal::stop_channel;
/// use std::time::Duration;
///
/// let (handle, mut signal) = stop_channel();
/// assert!(!signal.wait(Duration::from_millis(1)));
/// handle.stop();
/// assert!(signal.wait(Duration::from_secs(10)));
/// assert!(signal.is_stopped());
/// ```
#[must_use]
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = flume::bounded(1);
    (
        StopHandle { tx },
        StopSignal {
            rx,
            stopped: false,
        },
    )
}

/// Côté émetteur : demande l'arrêt de la lecture (Ctrl-C, tests).
#[derive(Clone, Debug)]
pub struct StopHandle {
    tx: Sender<()>,
}

impl StopHandle {
    /// Request a stop. Repeated requests are harmless.
    pub fn stop(&self) {
        // Canal plein = arrêt déjà demandé ; déconnecté = lecture terminée.
        let _ = self.tx.try_send(());
    }
}

/// Côté lecture : attente interruptible entre deux frames.
///
/// Once a stop has been observed the signal stays stopped.
#[derive(Debug)]
pub struct StopSignal {
    rx: Receiver<()>,
    stopped: bool,
}

impl StopSignal {
    /// Non-blocking check.
    pub fn is_stopped(&mut self) -> bool {
        if !self.stopped {
            match self.rx.try_recv() {
                Ok(()) => self.stopped = true,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
            }
        }
        self.stopped
    }

    /// Sleep for `timeout`, waking early if a stop is requested.
    ///
    /// Returns `true` if playback must stop. When every [`StopHandle`] is
    /// gone the wait degrades to a plain sleep.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        if self.stopped {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.stopped = true;
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(timeout);
                false
            }
        }
    }
}
