//! Coordinated startup and shutdown of the actor group.
//!
//! Shutdown is cooperative: a watch flag shared by every actor, observed at
//! each suspension point. The coordinator reaps vertex tasks as they finish
//! and, once the group is told to stop, waits for all of them before
//! aborting stragglers.

use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Grace period between asking actors to stop and aborting them.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Cooperative cancellation flag handed to every actor.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Completes once shutdown has been requested.
    ///
    /// A dropped coordinator counts as shutdown too, so an actor never waits
    /// on a flag nobody can flip anymore.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Non-blocking check, for use outside `select!`.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Owns the shutdown flag and every vertex task in the group.
pub struct Coordinator {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
    actors: FuturesUnordered<JoinHandle<()>>,
    aborts: Vec<AbortHandle>,
    reaper: Option<JoinHandle<()>>,
}

impl Coordinator {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx,
            rx,
            actors: FuturesUnordered::new(),
            aborts: Vec::new(),
            reaper: None,
        }
    }

    /// Token for an actor to observe group shutdown.
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.rx.clone(),
        }
    }

    /// Track a spawned actor task.
    pub fn adopt(&mut self, handle: JoinHandle<()>) {
        self.aborts.push(handle.abort_handle());
        self.actors.push(handle);
    }

    /// Start the background reaper.
    ///
    /// Reaps each vertex task the moment it exits, so an actor that dies
    /// early never lingers as an unobserved handle. The reaper itself
    /// finishes when the whole group has exited.
    pub fn spawn_reaper(&mut self) {
        let mut actors = std::mem::take(&mut self.actors);
        self.reaper = Some(tokio::spawn(async move {
            while let Some(result) = actors.next().await {
                log_exit(result);
            }
            debug!("all vertex actors exited");
        }));
    }

    /// Ask every actor to stop and wait for the group to drain.
    ///
    /// Actors that ignore the flag past the grace period are aborted so the
    /// process never hangs on a wedged task.
    pub async fn shutdown(mut self) {
        info!("stopping actor group");
        // Every token holder observes the flip at its next suspension point.
        let _ = self.tx.send(true);

        let drained = match self.reaper.take() {
            Some(reaper) => timeout(SHUTDOWN_GRACE, reaper).await.is_ok(),
            None => {
                let mut actors = std::mem::take(&mut self.actors);
                timeout(SHUTDOWN_GRACE, async {
                    while let Some(result) = actors.next().await {
                        log_exit(result);
                    }
                })
                .await
                .is_ok()
            }
        };
        if !drained {
            warn!("grace period elapsed, aborting remaining actors");
            for abort in &self.aborts {
                abort.abort();
            }
        }
        info!("actor group stopped");
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

fn log_exit(result: std::result::Result<(), JoinError>) {
    match result {
        Ok(()) => debug!("vertex actor exited cleanly"),
        Err(e) if e.is_cancelled() => debug!("vertex actor was cancelled"),
        Err(e) => warn!(error = %e, "vertex actor panicked"),
    }
}
