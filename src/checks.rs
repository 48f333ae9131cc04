use crate::config::MilestonePolicy;
use crate::context::AppContext;
use crate::milestone::{days_overdue, days_until, expiring_milestone, overdue_milestone};
use crate::notify::Notifier;
use crate::schema::{MilestoneKey, NotificationEvent, NotificationKind};
use crate::storage::ContractStore;
use crate::util::try_to_extract_panic_info;
use chrono::{Days, NaiveDate};
use futures_util::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

/// How a check ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Every fetched contract was examined
    Completed,
    /// The check stopped before examining contracts
    Aborted(String),
}

/// Result of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    /// The event handed to the notifier
    pub event: NotificationEvent,
    /// Milestone the event belongs to
    pub milestone: i64,
    /// Error message if the dispatch failed
    pub error: Option<String>,
}

impl DispatchOutcome {
    /// Whether the notifier accepted the event.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Which check produced the report
    pub kind: NotificationKind,
    /// How the check ended
    pub status: CheckStatus,
    /// Number of contracts returned by the store
    pub scanned: usize,
    /// Contracts with no milestone due, or already notified
    pub skipped: usize,
    /// One entry per attempted dispatch, in store order
    pub outcomes: Vec<DispatchOutcome>,
}

impl CheckReport {
    fn new(kind: NotificationKind, scanned: usize) -> Self {
        Self {
            kind,
            status: CheckStatus::Completed,
            scanned,
            skipped: 0,
            outcomes: Vec::new(),
        }
    }

    fn aborted(kind: NotificationKind, reason: String) -> Self {
        Self {
            status: CheckStatus::Aborted(reason),
            ..Self::new(kind, 0)
        }
    }

    /// Number of successful dispatches.
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed dispatches.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

/// Summary of [`run_all`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Expiring contracts check
    pub expiring: CheckReport,
    /// Overdue payments check
    pub overdue: CheckReport,
}

/// Notify active contracts reaching an expiration milestone.
///
/// Fetch errors are logged and reported as [`CheckStatus::Aborted`]; they
/// are never returned to the caller.
#[instrument(name = "checks.expiring", skip_all)]
pub async fn check_expiring_contracts<S: ContractStore, N: Notifier>(
    ctx: &AppContext<S, N>,
) -> CheckReport {
    let kind = NotificationKind::Expiring;
    let config = &ctx.config.notifications;
    let now = ctx.clock.now();
    let today = now.date_naive();
    let horizon = today
        .checked_add_days(Days::new(config.lookahead_days))
        .unwrap_or(NaiveDate::MAX);

    let contracts = match ctx.store.contracts_expiring_between(today, horizon).await {
        Ok(contracts) => contracts,
        Err(error) => {
            error!(%error, "Failed to fetch expiring contracts");
            return CheckReport::aborted(kind, error.to_string());
        }
    };

    let mut report = CheckReport::new(kind, contracts.len());
    for contract in contracts {
        let Some(end_date) = contract.end_date else {
            report.skipped += 1;
            continue;
        };

        let days = days_until(now, end_date);
        let Some(milestone) = expiring_milestone(config.policy, &config.expiring_milestones, days)
        else {
            report.skipped += 1;
            continue;
        };

        let event = NotificationEvent {
            contract_id: contract.id,
            kind,
            days_offset: days,
            timestamp: now,
        };
        let key = MilestoneKey {
            contract_id: contract.id,
            kind,
            reference_date: end_date,
            milestone,
        };
        match dispatch(ctx, event, key).await {
            Some(outcome) => report.outcomes.push(outcome),
            None => report.skipped += 1,
        }
    }

    info!(
        scanned = report.scanned,
        delivered = report.delivered(),
        failed = report.failed(),
        skipped = report.skipped,
        "Expiring contracts checked"
    );
    report
}

/// Notify pending payments that are a multiple of the overdue interval late.
///
/// Fetch errors are logged and reported as [`CheckStatus::Aborted`]; they
/// are never returned to the caller.
#[instrument(name = "checks.overdue", skip_all)]
pub async fn check_overdue_payments<S: ContractStore, N: Notifier>(
    ctx: &AppContext<S, N>,
) -> CheckReport {
    let kind = NotificationKind::Overdue;
    let config = &ctx.config.notifications;
    let now = ctx.clock.now();

    let contracts = match ctx.store.contracts_with_overdue_payments(now.date_naive()).await {
        Ok(contracts) => contracts,
        Err(error) => {
            error!(%error, "Failed to fetch overdue payments");
            return CheckReport::aborted(kind, error.to_string());
        }
    };

    let mut report = CheckReport::new(kind, contracts.len());
    for contract in contracts {
        let Some(due_date) = contract.expected_payment_date else {
            report.skipped += 1;
            continue;
        };

        let days = days_overdue(now, due_date);
        let Some(milestone) = overdue_milestone(config.policy, config.overdue_interval_days, days)
        else {
            report.skipped += 1;
            continue;
        };

        let event = NotificationEvent {
            contract_id: contract.id,
            kind,
            days_offset: days,
            timestamp: now,
        };
        let key = MilestoneKey {
            contract_id: contract.id,
            kind,
            reference_date: due_date,
            milestone,
        };
        match dispatch(ctx, event, key).await {
            Some(outcome) => report.outcomes.push(outcome),
            None => report.skipped += 1,
        }
    }

    info!(
        scanned = report.scanned,
        delivered = report.delivered(),
        failed = report.failed(),
        skipped = report.skipped,
        "Overdue payments checked"
    );
    report
}

/// Run the expiring check, then the overdue check.
///
/// Neither check can keep the other from running, a panic included.
#[instrument(name = "checks.run_all", skip_all)]
pub async fn run_all<S: ContractStore, N: Notifier>(ctx: &AppContext<S, N>) -> RunReport {
    let expiring = guarded(NotificationKind::Expiring, check_expiring_contracts(ctx)).await;
    let overdue = guarded(NotificationKind::Overdue, check_overdue_payments(ctx)).await;
    RunReport { expiring, overdue }
}

async fn guarded(kind: NotificationKind, check: impl Future<Output = CheckReport>) -> CheckReport {
    match AssertUnwindSafe(check).catch_unwind().await {
        Ok(report) => report,
        Err(panic) => {
            let error = try_to_extract_panic_info(&*panic);
            error!(%kind, "Check {error}");
            CheckReport::aborted(kind, error.to_string())
        }
    }
}

/// Dispatch one event, capturing errors and panics from the notifier.
///
/// Returns `None` when the ledger already records the milestone.
async fn dispatch<S: ContractStore, N: Notifier>(
    ctx: &AppContext<S, N>,
    event: NotificationEvent,
    key: MilestoneKey,
) -> Option<DispatchOutcome> {
    let span = info_span!(
        "dispatch",
        contract.id = %event.contract_id,
        kind = %event.kind,
        days = event.days_offset,
    );

    async move {
        let use_ledger = ctx.config.notifications.policy == MilestonePolicy::Ledger;
        if use_ledger {
            match ctx.store.milestone_notified(&key).await {
                Ok(true) => {
                    debug!(milestone = key.milestone, "Milestone already notified");
                    return None;
                }
                Ok(false) => {}
                Err(error) => {
                    warn!(%error, "Failed to read the milestone ledger");
                    return Some(DispatchOutcome {
                        event,
                        milestone: key.milestone,
                        error: Some(format!("ledger lookup failed: {error}")),
                    });
                }
            }
        }

        let notify = async {
            match event.kind {
                NotificationKind::Expiring => {
                    ctx.notifier
                        .notify_contract_expiring(event.contract_id, event.days_offset)
                        .await
                }
                NotificationKind::Overdue => {
                    ctx.notifier
                        .notify_payment_overdue(event.contract_id, event.days_offset)
                        .await
                }
            }
        };

        let result = AssertUnwindSafe(notify)
            .catch_unwind()
            .await
            .map_err(|e| try_to_extract_panic_info(&*e))
            .and_then(std::convert::identity);

        match result {
            Ok(()) => {
                if use_ledger {
                    if let Err(error) = ctx.store.record_milestone(&key).await {
                        warn!(%error, "Failed to record notified milestone");
                    }
                }
                debug!("Notification dispatched");
                Some(DispatchOutcome {
                    event,
                    milestone: key.milestone,
                    error: None,
                })
            }
            Err(error) => {
                warn!("Failed to dispatch notification: {error:#}");
                Some(DispatchOutcome {
                    event,
                    milestone: key.milestone,
                    error: Some(format!("{error:#}")),
                })
            }
        }
    }
    .instrument(span)
    .await
}
