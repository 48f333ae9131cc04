//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use backoffice::schema::{
    Contract, ContractReportRow, MilestoneKey, NotificationKind, PAYMENT_PENDING, ReportRequest,
    STATUS_ACTIVE,
};
use backoffice::{AppContext, Config, ContractStore, FixedClock, Notifier, StoreError};
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Midnight UTC of the reference day used by most tests.
pub fn today() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
}

pub fn day_offset(days: i64) -> NaiveDate {
    let today = today().date_naive();
    if days >= 0 {
        today.checked_add_days(Days::new(days.unsigned_abs())).unwrap()
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

pub fn contract(number: &str) -> Contract {
    Contract {
        id: Uuid::new_v4(),
        contract_number: number.into(),
        end_date: None,
        status: STATUS_ACTIVE.into(),
        is_active: true,
        expected_payment_date: None,
        payment_status: None,
    }
}

/// A contract ending `days` days from [`today`].
pub fn expiring_in(number: &str, days: i64) -> Contract {
    Contract {
        end_date: Some(day_offset(days)),
        ..contract(number)
    }
}

/// A contract whose pending payment was due `days` days before [`today`].
pub fn overdue_by(number: &str, days: i64) -> Contract {
    Contract {
        expected_payment_date: Some(day_offset(-days)),
        payment_status: Some(PAYMENT_PENDING.into()),
        ..contract(number)
    }
}

#[derive(Default)]
struct FakeStoreInner {
    contracts: Mutex<Vec<Contract>>,
    report_rows: Mutex<Vec<ContractReportRow>>,
    ledger: Mutex<HashSet<MilestoneKey>>,
    fail_expiring_fetch: AtomicBool,
    fail_ledger: AtomicBool,
    report_requests: AtomicUsize,
}

/// [`ContractStore`] filtering an in-memory list the way the SQL does
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<FakeStoreInner>,
}

impl FakeStore {
    pub fn with_contracts(contracts: impl IntoIterator<Item = Contract>) -> Self {
        let store = Self::default();
        store.inner.contracts.lock().unwrap().extend(contracts);
        store
    }

    pub fn set_contracts(&self, contracts: impl IntoIterator<Item = Contract>) {
        *self.inner.contracts.lock().unwrap() = contracts.into_iter().collect();
    }

    pub fn set_report_rows(&self, rows: Vec<ContractReportRow>) {
        *self.inner.report_rows.lock().unwrap() = rows;
    }

    pub fn fail_expiring_fetch(&self) {
        self.inner.fail_expiring_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fail_ledger(&self) {
        self.inner.fail_ledger.store(true, Ordering::SeqCst);
    }

    pub fn ledger_len(&self) -> usize {
        self.inner.ledger.lock().unwrap().len()
    }

    pub fn report_requests(&self) -> usize {
        self.inner.report_requests.load(Ordering::SeqCst)
    }

    fn eligible(contract: &Contract) -> bool {
        contract.status == STATUS_ACTIVE && contract.is_active
    }
}

impl ContractStore for FakeStore {
    async fn contracts_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError> {
        if self.inner.fail_expiring_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }

        let contracts = self.inner.contracts.lock().unwrap();
        Ok(contracts
            .iter()
            .filter(|c| Self::eligible(c))
            .filter(|c| c.end_date.is_some_and(|d| from <= d && d <= to))
            .cloned()
            .collect())
    }

    async fn contracts_with_overdue_payments(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError> {
        let contracts = self.inner.contracts.lock().unwrap();
        Ok(contracts
            .iter()
            .filter(|c| Self::eligible(c))
            .filter(|c| c.payment_status.as_deref() == Some(PAYMENT_PENDING))
            .filter(|c| c.expected_payment_date.is_some_and(|d| d < today))
            .cloned()
            .collect())
    }

    async fn milestone_notified(&self, key: &MilestoneKey) -> Result<bool, StoreError> {
        if self.inner.fail_ledger.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ledger offline".into()));
        }
        Ok(self.inner.ledger.lock().unwrap().contains(key))
    }

    async fn record_milestone(&self, key: &MilestoneKey) -> Result<(), StoreError> {
        self.inner.ledger.lock().unwrap().insert(key.clone());
        Ok(())
    }

    async fn contract_report_rows(
        &self,
        _request: &ReportRequest,
    ) -> Result<Vec<ContractReportRow>, StoreError> {
        self.inner.report_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.report_rows.lock().unwrap().clone())
    }
}

/// One call received by a [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub kind: NotificationKind,
    pub contract_id: Uuid,
    pub days: i64,
}

#[derive(Default)]
struct RecordingNotifierInner {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<Uuid>>,
    panicking: Mutex<HashSet<Uuid>>,
}

/// [`Notifier`] recording every call, failing or panicking on request
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<RecordingNotifierInner>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, contract_id: Uuid) {
        self.inner.failing.lock().unwrap().insert(contract_id);
    }

    pub fn panic_for(&self, contract_id: Uuid) {
        self.inner.panicking.lock().unwrap().insert(contract_id);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Day counts of the calls of one kind, in call order.
    pub fn days(&self, kind: NotificationKind) -> Vec<i64> {
        self.sent()
            .into_iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.days)
            .collect()
    }

    fn record(&self, kind: NotificationKind, contract_id: Uuid, days: i64) -> anyhow::Result<()> {
        self.inner.sent.lock().unwrap().push(Sent {
            kind,
            contract_id,
            days,
        });

        if self.inner.panicking.lock().unwrap().contains(&contract_id) {
            panic!("notifier exploded for {contract_id}");
        }
        if self.inner.failing.lock().unwrap().contains(&contract_id) {
            anyhow::bail!("smtp relay rejected {contract_id}");
        }
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    async fn notify_contract_expiring(&self, contract_id: Uuid, days: i64) -> anyhow::Result<()> {
        self.record(NotificationKind::Expiring, contract_id, days)
    }

    async fn notify_payment_overdue(&self, contract_id: Uuid, days: i64) -> anyhow::Result<()> {
        self.record(NotificationKind::Overdue, contract_id, days)
    }
}

pub fn context_at(
    store: &FakeStore,
    notifier: &RecordingNotifier,
    config: Config,
    now: DateTime<Utc>,
) -> AppContext<FakeStore, RecordingNotifier> {
    AppContext::new(store.clone(), notifier.clone(), config).with_clock(FixedClock(now))
}

pub fn context(
    store: &FakeStore,
    notifier: &RecordingNotifier,
) -> AppContext<FakeStore, RecordingNotifier> {
    context_at(store, notifier, Config::default(), today())
}
