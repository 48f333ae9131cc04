use crate::errors::StoreError;
use crate::schema::{
    Contract, ContractReportRow, MilestoneKey, PAYMENT_PENDING, ReportRequest, STATUS_ACTIVE,
};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::future::Future;

/// Data access used by the notification checks and the report pipeline.
pub trait ContractStore: Send + Sync {
    /// Active contracts whose end date falls within `from..=to`.
    fn contracts_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Contract>, StoreError>> + Send;

    /// Active contracts with a pending payment expected strictly before `today`.
    fn contracts_with_overdue_payments(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Contract>, StoreError>> + Send;

    /// Whether the ledger already records `key`.
    fn milestone_notified(
        &self,
        key: &MilestoneKey,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Add `key` to the ledger. Recording an existing key is a no-op.
    fn record_milestone(
        &self,
        key: &MilestoneKey,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Rows of the contract report matching the filters of `request`.
    fn contract_report_rows(
        &self,
        request: &ReportRequest,
    ) -> impl Future<Output = Result<Vec<ContractReportRow>, StoreError>> + Send;
}

/// Run the embedded migrations against `pool`.
pub async fn setup_database(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// [`ContractStore`] backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgContractStore {
    pool: PgPool,
}

impl PgContractStore {
    /// Wrap a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ContractStore for PgContractStore {
    async fn contracts_expiring_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError> {
        let contracts = sqlx::query_as::<_, Contract>(
            r"
            SELECT id, contract_number, end_date, status, is_active,
                   expected_payment_date, payment_status
            FROM contracts
            WHERE status = $1
              AND is_active
              AND end_date IS NOT NULL
              AND end_date >= $2
              AND end_date <= $3
            ORDER BY end_date ASC, id ASC
            ",
        )
        .bind(STATUS_ACTIVE)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    async fn contracts_with_overdue_payments(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<Contract>, StoreError> {
        let contracts = sqlx::query_as::<_, Contract>(
            r"
            SELECT id, contract_number, end_date, status, is_active,
                   expected_payment_date, payment_status
            FROM contracts
            WHERE payment_status = $1
              AND status = $2
              AND is_active
              AND expected_payment_date < $3
            ORDER BY expected_payment_date ASC, id ASC
            ",
        )
        .bind(PAYMENT_PENDING)
        .bind(STATUS_ACTIVE)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(contracts)
    }

    async fn milestone_notified(&self, key: &MilestoneKey) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>(
            r"
            SELECT 1::BIGINT FROM contract_notification_milestones
            WHERE contract_id = $1 AND kind = $2 AND reference_date = $3 AND milestone = $4
            ",
        )
        .bind(key.contract_id)
        .bind(key.kind.as_str())
        .bind(key.reference_date)
        .bind(key.milestone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found.is_some())
    }

    async fn record_milestone(&self, key: &MilestoneKey) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO contract_notification_milestones
                (contract_id, kind, reference_date, milestone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(key.contract_id)
        .bind(key.kind.as_str())
        .bind(key.reference_date)
        .bind(key.milestone)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn contract_report_rows(
        &self,
        request: &ReportRequest,
    ) -> Result<Vec<ContractReportRow>, StoreError> {
        let (range_start, range_end) = request
            .date_range
            .map(|range| (Some(range.start), Some(range.end)))
            .unwrap_or_default();

        let rows = sqlx::query_as::<_, ContractReportRow>(
            r"
            SELECT c.contract_number, cl.name AS client_name, s.name AS service_name,
                   c.status, c.start_date, c.end_date, c.total_value, c.payment_status
            FROM contracts c
            LEFT JOIN clients cl ON cl.id = c.client_id
            LEFT JOIN services s ON s.id = c.service_id
            WHERE c.is_active
              AND ($1::UUID IS NULL OR c.client_id = $1)
              AND ($2::UUID IS NULL OR c.service_id = $2)
              AND ($3::UUID IS NULL OR c.id = $3)
              AND ($4::DATE IS NULL OR c.start_date >= $4)
              AND ($5::DATE IS NULL OR c.start_date <= $5)
            ORDER BY c.start_date ASC NULLS LAST, c.contract_number ASC
            ",
        )
        .bind(request.client_id)
        .bind(request.service_id)
        .bind(request.contract_id)
        .bind(range_start)
        .bind(range_end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
