//! Row and value types shared by the jobs, the store and the reports.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// `contracts.status` value of a running contract.
pub const STATUS_ACTIVE: &str = "active";

/// `contracts.payment_status` value of a payment that has not been received.
pub const PAYMENT_PENDING: &str = "pendente";

/// A contract record as read by the notification checks
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Contract {
    /// Unique identifier of the contract
    pub id: Uuid,
    /// Human facing contract number
    pub contract_number: String,
    /// Last day covered by the contract
    pub end_date: Option<NaiveDate>,
    /// Lifecycle status (`active`, `suspended`, `cancelled`, ...)
    pub status: String,
    /// Soft-delete flag
    pub is_active: bool,
    /// Day the next payment is expected
    pub expected_payment_date: Option<NaiveDate>,
    /// Payment status (`pendente`, `pago`, ...)
    pub payment_status: Option<String>,
}

/// The two notification families produced by the checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The contract reaches its end date soon
    Expiring,
    /// The expected payment date has passed
    Overdue,
}

impl NotificationKind {
    /// Value stored in the `kind` columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expiring => "expiring",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification about to be dispatched for one contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEvent {
    /// Contract the notification is about
    pub contract_id: Uuid,
    /// Notification family
    pub kind: NotificationKind,
    /// Days until expiration, or days overdue
    pub days_offset: i64,
    /// When the event was produced
    pub timestamp: DateTime<Utc>,
}

/// Identifies one milestone of one contract in the de-duplication ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MilestoneKey {
    /// Contract the milestone belongs to
    pub contract_id: Uuid,
    /// Notification family
    pub kind: NotificationKind,
    /// `end_date` or `expected_payment_date` the milestone was computed from
    pub reference_date: NaiveDate,
    /// The milestone day count
    pub milestone: i64,
}

/// Output format of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Paginated PDF document
    Pdf,
    /// `.xlsx` workbook
    Excel,
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range
    pub end: NaiveDate,
}

/// A request for one report document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Restrict to one client
    pub client_id: Option<Uuid>,
    /// Restrict to one service
    pub service_id: Option<Uuid>,
    /// Restrict to one contract
    pub contract_id: Option<Uuid>,
    /// Output format
    pub format: ReportFormat,
    /// Restrict to contracts starting inside this range
    pub date_range: Option<DateRange>,
}

impl ReportRequest {
    /// An unfiltered request for the given format.
    pub fn new(format: ReportFormat) -> Self {
        Self {
            client_id: None,
            service_id: None,
            contract_id: None,
            format,
            date_range: None,
        }
    }
}

/// A contract joined with its client and service, as listed in reports
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ContractReportRow {
    /// Human facing contract number
    pub contract_number: String,
    /// Name of the client
    pub client_name: Option<String>,
    /// Name of the contracted service
    pub service_name: Option<String>,
    /// Lifecycle status
    pub status: String,
    /// First day covered by the contract
    pub start_date: Option<NaiveDate>,
    /// Last day covered by the contract
    pub end_date: Option<NaiveDate>,
    /// Total value of the contract
    pub total_value: Option<Decimal>,
    /// Payment status
    pub payment_status: Option<String>,
}
