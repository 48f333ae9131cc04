#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod checks;
mod clock;
/// Runtime configuration.
pub mod config;
mod context;
mod errors;
/// Day arithmetic and milestone selection.
pub mod milestone;
mod notify;
/// PDF and spreadsheet rendering.
pub mod report;
mod runner;
/// Row and value types.
pub mod schema;
mod storage;
/// Proposal tokens.
pub mod token;
mod util;
mod worker;

/// The notification checks and their reports.
pub use self::checks::{
    CheckReport, CheckStatus, DispatchOutcome, RunReport, check_expiring_contracts,
    check_overdue_payments, run_all,
};
/// Sources of the current instant.
pub use self::clock::{Clock, FixedClock, SystemClock};
/// The most used configuration types.
pub use self::config::{Config, MilestonePolicy};
/// Explicit dependencies of the jobs and reports.
pub use self::context::AppContext;
/// Error types.
pub use self::errors::{ConfigError, RenderError, ReportError, StoreError, TokenError};
/// Notification dispatch.
pub use self::notify::{Notifier, PgNotifier};
/// Report pipeline.
pub use self::report::{ReportDocument, generate_contract_report};
/// Periodic scheduler.
pub use self::runner::{RunHandle, Scheduler};
/// Data access.
pub use self::storage::{ContractStore, PgContractStore, setup_database};
/// Proposal tokens.
pub use self::token::{ProposalToken, generate_proposal_token, is_valid_proposal_token};
