// Stop signal for the expiry sweeper
//
// The CLI `sweep` command holds the sender and fires it on Ctrl+C; each
// spawned `ExpirySweeper::run` holds a token and finishes its current sweep
// before returning its removal total.

use tokio::sync::watch;

/// Receiving side, handed to `ExpirySweeper::run`
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop is requested or the sender is gone.
    ///
    /// A token created after the signal resolves immediately.
    pub async fn wait(&mut self) {
        if self.is_shutdown() {
            return;
        }
        let _ = self.rx.changed().await;
    }
}

/// Sending side, owned by whoever spawned the sweepers
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Ask every sweeper to stop after its current pass
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }

    /// Extra token for another sweeper on the same signal
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.tx.subscribe(),
        }
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
