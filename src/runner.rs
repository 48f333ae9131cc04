use crate::context::AppContext;
use crate::notify::Notifier;
use crate::storage::ContractStore;
use crate::worker::Worker;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};

/// Periodically runs the notification checks
pub struct Scheduler<S, N> {
    context: AppContext<S, N>,
    poll_interval: Duration,
    jitter: Duration,
    run_once: bool,
}

impl<S, N> std::fmt::Debug for Scheduler<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("context", &self.context)
            .field("poll_interval", &self.poll_interval)
            .field("jitter", &self.jitter)
            .field("run_once", &self.run_once)
            .finish()
    }
}

impl<S, N> Scheduler<S, N>
where
    S: ContractStore + Clone + 'static,
    N: Notifier + Clone + 'static,
{
    /// Create a scheduler using the interval and jitter of the context's
    /// configuration.
    pub fn new(context: AppContext<S, N>) -> Self {
        let scheduler = context.config.scheduler;
        Self {
            context,
            poll_interval: scheduler.poll_interval,
            jitter: scheduler.jitter,
            run_once: false,
        }
    }

    /// Set the time between two passes.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the maximum random jitter added to the poll interval.
    ///
    /// Keeps several deployments started at the same time from hitting the
    /// database together.
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Stop after the first pass.
    pub fn run_once(mut self) -> Self {
        self.run_once = true;
        self
    }

    /// Start the background task.
    pub fn start(&self) -> RunHandle {
        info!(
            poll_interval = ?self.poll_interval,
            jitter = ?self.jitter,
            "Starting notification scheduler…"
        );

        let worker = Worker {
            context: self.context.clone(),
            poll_interval: self.poll_interval,
            jitter: self.jitter,
            run_once: self.run_once,
        };

        let span = info_span!("scheduler");
        let handle = tokio::spawn(async move { worker.run().instrument(span).await });

        RunHandle { handle }
    }
}

/// Handle to a running scheduler
#[derive(Debug)]
pub struct RunHandle {
    handle: JoinHandle<()>,
}

impl RunHandle {
    /// Wait for the scheduler to stop on its own.
    pub async fn wait_for_shutdown(self) {
        if let Err(error) = self.handle.await {
            warn!(%error, "Scheduler task panicked");
        }
    }

    /// Stop the scheduler, interrupting the current pass if there is one.
    pub async fn shutdown(self) {
        self.handle.abort();
        match self.handle.await {
            Ok(()) => {}
            Err(error) if error.is_cancelled() => info!("Scheduler stopped"),
            Err(error) => warn!(%error, "Scheduler task panicked"),
        }
    }
}
