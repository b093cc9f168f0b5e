//! Process-wide shutdown signal.
//!
//! One [`ShutdownTrigger`] is held by `main`; every long-running task holds
//! a cloned [`Shutdown`] and stops once it fires.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Create a connected trigger/listener pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Ask every listener to stop. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested (or the trigger is gone).
    pub async fn wait(&mut self) {
        // wait_for only errors when the sender was dropped, which also
        // means nobody is left to keep us running.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

/// Wait for a task started by `main`. A panicked or cancelled task is
/// logged; returns whether it finished cleanly.
pub async fn join_task(name: &str, handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!("{} ended abnormally: {}", name, e);
            false
        }
    }
}
