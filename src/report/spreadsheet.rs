//! `.xlsx` rendering.
//!
//! Every sheet follows the same layout: a merged title on the first row, the
//! generation timestamp on the second, a blank row, the header row and then
//! the data.

use crate::config::{Branding, Rgb};
use crate::errors::RenderError;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use serde::Serialize;
use serde_json::Value;

/// Row of the merged title.
pub const TITLE_ROW: u32 = 0;
/// Row of the generation timestamp.
pub const SUBTITLE_ROW: u32 = 1;
/// Row of the column headers.
pub const HEADER_ROW: u32 = 3;
/// First data row.
pub const FIRST_DATA_ROW: u32 = 4;

const BORDER_COLOR: u32 = 0xD9D9D9;
const MUTED_COLOR: u32 = 0x737373;

/// A spreadsheet column: header label, record field and width
#[derive(Debug, Clone, PartialEq)]
pub struct SheetColumn {
    /// Header label
    pub header: String,
    /// Field of the serialized record shown in this column
    pub key: String,
    /// Width in characters
    pub width: f64,
}

impl SheetColumn {
    /// A column showing the `key` field.
    pub fn new(header: impl Into<String>, key: impl Into<String>, width: f64) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
            width,
        }
    }
}

/// Writes branded sheets into a workbook
#[derive(Debug, Clone)]
pub struct SpreadsheetReport {
    primary: Color,
    stripe: Color,
    generated_at: DateTime<Utc>,
}

impl SpreadsheetReport {
    /// Sheets will carry the branding colors and `generated_at` as their
    /// timestamp.
    pub fn new(branding: &Branding, generated_at: DateTime<Utc>) -> Self {
        Self {
            primary: color(branding.primary_color),
            stripe: color(branding.stripe_color),
            generated_at,
        }
    }

    /// Add a sheet with the title, timestamp and header rows and the column
    /// widths of `columns`.
    pub fn create_sheet<'a>(
        &self,
        book: &'a mut Workbook,
        name: &str,
        title: &str,
        columns: &[SheetColumn],
    ) -> Result<&'a mut Worksheet, RenderError> {
        if columns.is_empty() {
            return Err(RenderError::EmptySchema);
        }
        let last_col = u16::try_from(columns.len() - 1).unwrap_or(u16::MAX);

        let title_format = Format::new()
            .set_bold()
            .set_font_size(16)
            .set_font_color(self.primary)
            .set_align(FormatAlign::VerticalCenter);
        let subtitle_format = Format::new()
            .set_italic()
            .set_font_size(9)
            .set_font_color(Color::RGB(MUTED_COLOR));
        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(self.primary)
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let sheet = book.add_worksheet();
        sheet.set_name(name)?;

        // A merge needs at least two cells.
        if last_col > 0 {
            sheet.merge_range(TITLE_ROW, 0, TITLE_ROW, last_col, title, &title_format)?;
        } else {
            sheet.write_string_with_format(TITLE_ROW, 0, title, &title_format)?;
        }
        sheet.set_row_height(TITLE_ROW, 28)?;

        let generated = format!("Generated on {}", self.generated_at.format("%d/%m/%Y %H:%M"));
        sheet.write_string_with_format(SUBTITLE_ROW, 0, generated, &subtitle_format)?;

        for (col, column) in (0u16..).zip(columns) {
            sheet.write_string_with_format(HEADER_ROW, col, &column.header, &header_format)?;
            sheet.set_column_width(col, column.width)?;
        }
        sheet.set_row_height(HEADER_ROW, 20)?;

        Ok(sheet)
    }

    /// Write `rows` below the header row, one record per row.
    ///
    /// Numbers stay numeric, booleans become "Yes"/"No" and missing or null
    /// fields leave a blank cell.
    pub fn write_rows<T: Serialize>(
        &self,
        sheet: &mut Worksheet,
        columns: &[SheetColumn],
        rows: &[T],
    ) -> Result<(), RenderError> {
        let plain = Format::new()
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(BORDER_COLOR));
        let striped = plain.clone().set_background_color(self.stripe);

        for (row_num, record) in (FIRST_DATA_ROW..).zip(rows) {
            let record = serde_json::to_value(record)?;
            let base = if (row_num - FIRST_DATA_ROW) % 2 == 1 {
                &striped
            } else {
                &plain
            };
            let number = base.clone().set_num_format("#,##0.00");

            for (col, column) in (0u16..).zip(columns) {
                match record.get(&column.key) {
                    Some(Value::Number(n)) => {
                        let value = n.as_f64().unwrap_or_default();
                        sheet.write_number_with_format(row_num, col, value, &number)?;
                    }
                    Some(Value::String(s)) => {
                        sheet.write_string_with_format(row_num, col, s, base)?;
                    }
                    Some(Value::Bool(b)) => {
                        let text = if *b { "Yes" } else { "No" };
                        sheet.write_string_with_format(row_num, col, text, base)?;
                    }
                    None | Some(Value::Null) => {
                        sheet.write_blank(row_num, col, base)?;
                    }
                    Some(other) => {
                        sheet.write_string_with_format(row_num, col, other.to_string(), base)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// A one-sheet workbook holding `rows`, as `.xlsx` bytes.
    pub fn render<T: Serialize>(
        &self,
        sheet_name: &str,
        title: &str,
        columns: &[SheetColumn],
        rows: &[T],
    ) -> Result<Vec<u8>, RenderError> {
        let mut book = Workbook::new();
        let sheet = self.create_sheet(&mut book, sheet_name, title, columns)?;
        self.write_rows(sheet, columns, rows)?;
        Ok(book.save_to_buffer()?)
    }
}

fn color(rgb: Rgb) -> Color {
    Color::RGB(rgb.to_u32())
}
