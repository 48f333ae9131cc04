use crate::schema::NotificationKind;
use anyhow::anyhow;
use sqlx::PgPool;
use std::future::Future;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Delivers the notifications produced by the checks.
pub trait Notifier: Send + Sync {
    /// The contract ends in `days` days.
    fn notify_contract_expiring(
        &self,
        contract_id: Uuid,
        days: i64,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// The contract's payment is `days` days late.
    fn notify_payment_overdue(
        &self,
        contract_id: Uuid,
        days: i64,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Stores notifications in the `notifications` table, where the admin UI
/// picks them up.
#[derive(Debug, Clone)]
pub struct PgNotifier {
    pool: PgPool,
}

impl PgNotifier {
    /// Wrap a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(
        &self,
        contract_id: Uuid,
        kind: NotificationKind,
        days: i64,
    ) -> anyhow::Result<()> {
        let (title, template) = match kind {
            NotificationKind::Expiring => ("Contract expiring", "Contract %s expires in %s day(s)"),
            NotificationKind::Overdue => {
                ("Payment overdue", "Payment of contract %s is %s day(s) overdue")
            }
        };

        let result = sqlx::query(
            r"
            INSERT INTO notifications (contract_id, kind, title, message, days_offset)
            SELECT id, $2, $3, format($4, contract_number, $5), $5
            FROM contracts
            WHERE id = $1
            ",
        )
        .bind(contract_id)
        .bind(kind.as_str())
        .bind(title)
        .bind(template)
        .bind(days)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("contract {contract_id} not found"));
        }

        debug!("Notification stored");
        Ok(())
    }
}

impl Notifier for PgNotifier {
    #[instrument(name = "notify.expiring", skip(self))]
    async fn notify_contract_expiring(&self, contract_id: Uuid, days: i64) -> anyhow::Result<()> {
        self.insert(contract_id, NotificationKind::Expiring, days).await
    }

    #[instrument(name = "notify.overdue", skip(self))]
    async fn notify_payment_overdue(&self, contract_id: Uuid, days: i64) -> anyhow::Result<()> {
        self.insert(contract_id, NotificationKind::Overdue, days).await
    }
}
