use crate::checks::{CheckStatus, RunReport, run_all};
use crate::context::AppContext;
use crate::notify::Notifier;
use crate::storage::ContractStore;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Instrument, debug, info, info_span, warn};

pub(crate) struct Worker<S, N> {
    pub(crate) context: AppContext<S, N>,
    pub(crate) poll_interval: Duration,
    pub(crate) jitter: Duration,
    pub(crate) run_once: bool,
}

impl<S: ContractStore, N: Notifier> Worker<S, N> {
    /// Calculate the sleep duration with random jitter applied.
    fn sleep_duration_with_jitter(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.poll_interval;
        }

        let jitter_millis = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let random_jitter = rand::thread_rng().gen_range(0..=jitter_millis);
        self.poll_interval + Duration::from_millis(random_jitter)
    }

    /// Run passes forever, or once if `run_once` is set.
    pub(crate) async fn run(&self) {
        let mut pass: u64 = 0;
        loop {
            pass += 1;
            let span = info_span!("pass", pass);
            let report = run_all(&self.context).instrument(span.clone()).await;
            span.in_scope(|| log_report(&report));

            if self.run_once {
                debug!("Single pass requested. Shutting down the scheduler…");
                break;
            }

            let sleep_duration = self.sleep_duration_with_jitter();
            debug!("Next pass in {sleep_duration:?}…");
            sleep(sleep_duration).await;
        }
    }
}

fn log_report(report: &RunReport) {
    for check in [&report.expiring, &report.overdue] {
        match &check.status {
            CheckStatus::Completed if check.failed() > 0 => warn!(
                kind = %check.kind,
                failed = check.failed(),
                delivered = check.delivered(),
                "Some notifications could not be dispatched"
            ),
            CheckStatus::Completed => info!(
                kind = %check.kind,
                delivered = check.delivered(),
                "Check completed"
            ),
            CheckStatus::Aborted(reason) => warn!(kind = %check.kind, %reason, "Check aborted"),
        }
    }
}
