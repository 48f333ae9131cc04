//! Report generation.
//!
//! The renderers in [`pdf`] and [`spreadsheet`] are pure formatting over rows
//! that have already been fetched. [`generate_contract_report`] ties them to
//! the store for one [`ReportRequest`].

pub mod pdf;
pub mod spreadsheet;

use self::pdf::{Align, PdfReport, Table, TableColumn};
use self::spreadsheet::{SheetColumn, SpreadsheetReport};
use crate::config::Branding;
use crate::context::AppContext;
use crate::errors::{RenderError, ReportError};
use crate::schema::{ContractReportRow, ReportFormat, ReportRequest};
use crate::storage::ContractStore;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{info, instrument, warn};

const CONTRACT_REPORT_TITLE: &str = "Contracts Report";

/// A rendered report, ready to be served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    /// Document bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`
    pub content_type: &'static str,
    /// Suggested download name
    pub file_name: String,
}

impl ReportFormat {
    /// MIME type of documents in this format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }
}

/// Fetch the contracts matching `request` and render them.
#[instrument(name = "report.contracts", skip_all, fields(format = ?request.format))]
pub async fn generate_contract_report<S, N>(
    ctx: &AppContext<S, N>,
    request: &ReportRequest,
) -> Result<ReportDocument, ReportError>
where
    S: ContractStore,
{
    if let Some(range) = request.date_range {
        if range.start > range.end {
            return Err(ReportError::InvalidRequest("date range starts after it ends"));
        }
    }

    let rows = ctx.store.contract_report_rows(request).await.inspect_err(|error| {
        warn!(%error, "Failed to fetch report rows");
    })?;

    let now = ctx.clock.now();
    let bytes = render_contract_report(&rows, request, &ctx.config.branding, now)
        .inspect_err(|error| warn!(%error, "Failed to render report"))?;

    info!(rows = rows.len(), bytes = bytes.len(), "Report generated");
    Ok(ReportDocument {
        bytes,
        content_type: request.format.content_type(),
        file_name: format!(
            "contracts-report-{}.{}",
            now.format("%Y%m%d-%H%M%S"),
            request.format.extension()
        ),
    })
}

/// Render contract rows in the requested format.
pub fn render_contract_report(
    rows: &[ContractReportRow],
    request: &ReportRequest,
    branding: &Branding,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, RenderError> {
    let subtitle = describe_filters(request, rows.len());
    match request.format {
        ReportFormat::Excel => {
            let records: Vec<ContractSheetRecord<'_>> =
                rows.iter().map(ContractSheetRecord::from).collect();
            SpreadsheetReport::new(branding, generated_at).render(
                "Contracts",
                CONTRACT_REPORT_TITLE,
                &contract_sheet_columns(),
                &records,
            )
        }
        ReportFormat::Pdf => {
            let mut table = Table::new(contract_table_columns());
            for row in rows {
                table.push_row([
                    row.contract_number.clone(),
                    row.client_name.clone().unwrap_or_default(),
                    row.service_name.clone().unwrap_or_default(),
                    row.status.clone(),
                    format_date(row.start_date),
                    format_date(row.end_date),
                    format_money(row.total_value),
                ]);
            }

            let mut report = PdfReport::create_document(branding);
            report
                .add_header(CONTRACT_REPORT_TITLE, Some(&subtitle), generated_at)?
                .add_table(&table)?;
            report.finish()
        }
    }
}

/// Column layout of the PDF contract table; spans the printable width.
pub fn contract_table_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::new("Contract", 40.0, 70.0),
        TableColumn::new("Client", 110.0, 110.0),
        TableColumn::new("Service", 220.0, 95.0),
        TableColumn::new("Status", 315.0, 55.0).align(Align::Center),
        TableColumn::new("Start", 370.0, 55.0).align(Align::Center),
        TableColumn::new("End", 425.0, 55.0).align(Align::Center),
        TableColumn::new("Value", 480.0, 75.28).align(Align::Right),
    ]
}

/// Column schema of the contract spreadsheet.
pub fn contract_sheet_columns() -> Vec<SheetColumn> {
    vec![
        SheetColumn::new("Contract", "contract_number", 16.0),
        SheetColumn::new("Client", "client_name", 30.0),
        SheetColumn::new("Service", "service_name", 26.0),
        SheetColumn::new("Status", "status", 12.0),
        SheetColumn::new("Start", "start_date", 12.0),
        SheetColumn::new("End", "end_date", 12.0),
        SheetColumn::new("Value", "total_value", 14.0),
        SheetColumn::new("Payment", "payment_status", 12.0),
    ]
}

/// A contract row with dates formatted and the value as a plain number, so
/// the sheet gets numeric cells.
#[derive(Debug, Serialize)]
struct ContractSheetRecord<'a> {
    contract_number: &'a str,
    client_name: Option<&'a str>,
    service_name: Option<&'a str>,
    status: &'a str,
    start_date: String,
    end_date: String,
    total_value: Option<f64>,
    payment_status: Option<&'a str>,
}

impl<'a> From<&'a ContractReportRow> for ContractSheetRecord<'a> {
    fn from(row: &'a ContractReportRow) -> Self {
        Self {
            contract_number: &row.contract_number,
            client_name: row.client_name.as_deref(),
            service_name: row.service_name.as_deref(),
            status: &row.status,
            start_date: format_date(row.start_date),
            end_date: format_date(row.end_date),
            total_value: row.total_value.and_then(|v| v.to_f64()),
            payment_status: row.payment_status.as_deref(),
        }
    }
}

fn describe_filters(request: &ReportRequest, count: usize) -> String {
    let mut parts = vec![format!("{count} contract(s)")];
    if let Some(range) = request.date_range {
        parts.push(format!(
            "starting {} to {}",
            range.start.format("%d/%m/%Y"),
            range.end.format("%d/%m/%Y")
        ));
    }
    if request.client_id.is_some() {
        parts.push("filtered by client".into());
    }
    if request.service_id.is_some() {
        parts.push("filtered by service".into());
    }
    if request.contract_id.is_some() {
        parts.push("single contract".into());
    }
    parts.join(" · ")
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn format_money(value: Option<Decimal>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (units, cents) = text.split_once('.').unwrap_or((&text, "00"));

    let mut grouped = String::new();
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}{grouped}.{cents}", if negative { "-" } else { "" })
}
