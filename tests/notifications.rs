#![allow(missing_docs)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]

mod common;

use backoffice::config::NotificationConfig;
use backoffice::schema::NotificationKind;
use backoffice::{
    CheckStatus, Config, MilestonePolicy, check_expiring_contracts, check_overdue_payments,
    run_all,
};
use chrono::{TimeDelta, Utc};
use claims::{assert_matches, assert_none, assert_some};
use common::{
    FakeStore, RecordingNotifier, context, context_at, expiring_in, overdue_by, today,
};
use insta::assert_compact_json_snapshot;

fn ledger_config() -> Config {
    Config {
        notifications: NotificationConfig::default().policy(MilestonePolicy::Ledger),
        ..Config::default()
    }
}

#[tokio::test]
async fn expiring_check_notifies_exact_milestones_only() {
    let store = FakeStore::with_contracts(
        [0, 1, 2, 3, 7, 14, 15, 30, 31]
            .into_iter()
            .map(|days| expiring_in(&format!("C-{days}"), days)),
    );
    let notifier = RecordingNotifier::default();

    let report = check_expiring_contracts(&context(&store, &notifier)).await;

    assert_eq!(report.status, CheckStatus::Completed);
    // 31 days out lies beyond the look-ahead window.
    assert_eq!(report.scanned, 8);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.delivered(), 5);
    assert_eq!(report.failed(), 0);
    assert_compact_json_snapshot!(notifier.days(NotificationKind::Expiring), @"[1, 3, 7, 15, 30]");
}

#[tokio::test]
async fn expiring_events_carry_the_clock_instant() {
    let contract = expiring_in("C-1", 7);
    let store = FakeStore::with_contracts([contract.clone()]);
    let notifier = RecordingNotifier::default();

    let report = check_expiring_contracts(&context(&store, &notifier)).await;

    let outcome = &report.outcomes[0];
    assert!(outcome.is_success());
    assert_eq!(outcome.milestone, 7);
    assert_eq!(outcome.event.contract_id, contract.id);
    assert_eq!(outcome.event.kind, NotificationKind::Expiring);
    assert_eq!(outcome.event.days_offset, 7);
    assert_eq!(outcome.event.timestamp, today());
}

#[tokio::test]
async fn inactive_contracts_are_not_notified() {
    let mut suspended = expiring_in("C-1", 7);
    suspended.status = "suspended".into();
    let mut deleted = expiring_in("C-2", 7);
    deleted.is_active = false;

    let store = FakeStore::with_contracts([suspended, deleted]);
    let notifier = RecordingNotifier::default();

    let report = check_expiring_contracts(&context(&store, &notifier)).await;

    assert_eq!(report.scanned, 0);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn custom_milestones_replace_the_defaults() {
    let store = FakeStore::with_contracts([
        expiring_in("C-1", 10),
        expiring_in("C-2", 7),
        expiring_in("C-3", 2),
    ]);
    let notifier = RecordingNotifier::default();
    let config = Config {
        notifications: NotificationConfig::default().expiring_milestones([10, 2]),
        ..Config::default()
    };

    check_expiring_contracts(&context_at(&store, &notifier, config, today())).await;

    assert_eq!(notifier.days(NotificationKind::Expiring), [10, 2]);
}

#[tokio::test]
async fn overdue_check_notifies_every_seventh_day() {
    let store = FakeStore::with_contracts(
        [1, 6, 7, 8, 14, 21, 22]
            .into_iter()
            .map(|days| overdue_by(&format!("C-{days}"), days)),
    );
    let notifier = RecordingNotifier::default();

    let report = check_overdue_payments(&context(&store, &notifier)).await;

    assert_eq!(report.status, CheckStatus::Completed);
    assert_eq!(report.scanned, 7);
    assert_eq!(report.skipped, 4);
    assert_compact_json_snapshot!(notifier.days(NotificationKind::Overdue), @"[7, 14, 21]");
}

#[tokio::test]
async fn overdue_days_round_partial_days_up() {
    let store = FakeStore::with_contracts([overdue_by("C-6", 6), overdue_by("C-7", 7)]);
    let notifier = RecordingNotifier::default();
    let noon = today() + TimeDelta::hours(12);

    check_overdue_payments(&context_at(&store, &notifier, Config::default(), noon)).await;

    // Six and a half days late counts as seven.
    assert_eq!(notifier.days(NotificationKind::Overdue), [7]);
}

#[tokio::test]
async fn paid_and_future_payments_are_not_overdue() {
    let mut paid = overdue_by("C-1", 7);
    paid.payment_status = Some("pago".into());
    let due_today = overdue_by("C-2", 0);

    let store = FakeStore::with_contracts([paid, due_today]);
    let notifier = RecordingNotifier::default();

    let report = check_overdue_payments(&context(&store, &notifier)).await;

    assert_eq!(report.scanned, 0);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn failing_dispatch_does_not_stop_the_others() {
    let failing = expiring_in("C-15", 15);
    let panicking = expiring_in("C-7", 7);
    let store = FakeStore::with_contracts([
        expiring_in("C-30", 30),
        failing.clone(),
        panicking.clone(),
        expiring_in("C-3", 3),
    ]);
    let notifier = RecordingNotifier::default();
    notifier.fail_for(failing.id);
    notifier.panic_for(panicking.id);

    let report = check_expiring_contracts(&context(&store, &notifier)).await;

    assert_eq!(report.status, CheckStatus::Completed);
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.delivered(), 2);
    assert_eq!(report.failed(), 2);
    assert_eq!(notifier.days(NotificationKind::Expiring), [30, 15, 7, 3]);

    let error = assert_some!(&report.outcomes[1].error);
    assert!(error.contains("smtp relay rejected"), "{error}");
    let error = assert_some!(&report.outcomes[2].error);
    assert!(error.starts_with("panicked: notifier exploded"), "{error}");
    assert_none!(&report.outcomes[3].error);
}

#[tokio::test]
async fn fetch_failure_aborts_only_its_own_check() {
    let store = FakeStore::with_contracts([expiring_in("C-1", 7), overdue_by("C-2", 7)]);
    store.fail_expiring_fetch();
    let notifier = RecordingNotifier::default();

    let report = run_all(&context(&store, &notifier)).await;

    assert_matches!(&report.expiring.status, CheckStatus::Aborted(reason) if reason.contains("connection refused"));
    assert!(report.expiring.outcomes.is_empty());
    assert_eq!(report.overdue.status, CheckStatus::Completed);
    assert_eq!(report.overdue.delivered(), 1);
    assert_eq!(notifier.days(NotificationKind::Overdue), [7]);
}

#[tokio::test]
async fn run_all_reports_both_checks() {
    let store = FakeStore::with_contracts([expiring_in("C-1", 30), overdue_by("C-2", 14)]);
    let notifier = RecordingNotifier::default();

    let report = run_all(&context(&store, &notifier)).await;

    assert_compact_json_snapshot!(
        [
            (&report.expiring.kind, &report.expiring.status, report.expiring.delivered()),
            (&report.overdue.kind, &report.overdue.status, report.overdue.delivered()),
        ],
        @r#"[["expiring", "completed", 1], ["overdue", "completed", 1]]"#
    );
}

#[tokio::test]
async fn exact_policy_notifies_again_on_rerun() {
    let store = FakeStore::with_contracts([expiring_in("C-1", 7)]);
    let notifier = RecordingNotifier::default();
    let ctx = context(&store, &notifier);

    run_all(&ctx).await;
    run_all(&ctx).await;

    assert_eq!(notifier.days(NotificationKind::Expiring), [7, 7]);
    assert_eq!(store.ledger_len(), 0);
}

#[tokio::test]
async fn ledger_policy_does_not_notify_twice() {
    let store = FakeStore::with_contracts([expiring_in("C-1", 7), overdue_by("C-2", 7)]);
    let notifier = RecordingNotifier::default();
    let ctx = context_at(&store, &notifier, ledger_config(), today());

    let first = run_all(&ctx).await;
    let second = run_all(&ctx).await;

    assert_eq!(first.expiring.delivered(), 1);
    assert_eq!(first.overdue.delivered(), 1);
    assert_eq!(second.expiring.skipped, 1);
    assert_eq!(second.overdue.skipped, 1);
    assert!(second.expiring.outcomes.is_empty());
    assert_eq!(notifier.sent().len(), 2);
    assert_eq!(store.ledger_len(), 2);
}

#[tokio::test]
async fn ledger_policy_catches_up_missed_milestones() {
    // The run 15 days before the end date did not happen.
    let store = FakeStore::with_contracts([expiring_in("C-1", 14), overdue_by("C-2", 10)]);
    let notifier = RecordingNotifier::default();
    let ctx = context_at(&store, &notifier, ledger_config(), today());

    let report = run_all(&ctx).await;

    assert_eq!(report.expiring.outcomes[0].milestone, 15);
    assert_eq!(report.expiring.outcomes[0].event.days_offset, 14);
    assert_eq!(report.overdue.outcomes[0].milestone, 7);
    assert_eq!(report.overdue.outcomes[0].event.days_offset, 10);

    // The next day has no new milestone to notify.
    let tomorrow = context_at(&store, &notifier, ledger_config(), today() + TimeDelta::days(1));
    let report = run_all(&tomorrow).await;
    assert_eq!(report.expiring.delivered(), 0);
    assert_eq!(report.overdue.delivered(), 0);
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn ledger_is_keyed_by_the_reference_date() {
    let mut contract = expiring_in("C-1", 7);
    let store = FakeStore::with_contracts([contract.clone()]);
    let notifier = RecordingNotifier::default();
    let ctx = context_at(&store, &notifier, ledger_config(), today());

    run_all(&ctx).await;

    // A renewal moves the end date; the same milestone applies again.
    contract.end_date = Some(common::day_offset(3));
    store.set_contracts([contract]);
    run_all(&ctx).await;

    assert_eq!(notifier.days(NotificationKind::Expiring), [7, 3]);
    assert_eq!(store.ledger_len(), 2);
}

#[tokio::test]
async fn ledger_lookup_failure_is_a_failed_dispatch() {
    let store = FakeStore::with_contracts([expiring_in("C-1", 7)]);
    store.fail_ledger();
    let notifier = RecordingNotifier::default();
    let ctx = context_at(&store, &notifier, ledger_config(), today());

    let report = check_expiring_contracts(&ctx).await;

    assert_eq!(report.status, CheckStatus::Completed);
    assert_eq!(report.failed(), 1);
    let error = assert_some!(&report.outcomes[0].error);
    assert!(error.starts_with("ledger lookup failed"), "{error}");
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn system_clock_context_runs() {
    let store = FakeStore::default();
    let notifier = RecordingNotifier::default();
    let ctx = backoffice::AppContext::new(store, notifier, Config::default());

    let before = Utc::now();
    let report = run_all(&ctx).await;

    assert_eq!(report.expiring.scanned, 0);
    assert!(ctx.clock.now() >= before);
}
