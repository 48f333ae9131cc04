//! Paginated PDF tables.
//!
//! Layout happens in two passes. The first one places the header and the
//! table rows on as many pages as needed; once the page count is known,
//! [`PdfReport::add_footer`] stamps "Page X of Y" on every page. Only then is
//! the document serialized.

mod jpeg;
mod layout;
mod metrics;
mod writer;

pub use self::layout::{Align, DrawOp, FontFace, Page};

use self::jpeg::JpegImage;
use self::layout::aligned_x;
use self::metrics::{text_width, to_win_ansi, truncate, wrap};
use crate::config::Branding;
use crate::errors::RenderError;
use chrono::{DateTime, Utc};

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 841.89;
/// Distance from the page edges to the content.
pub const MARGIN: f32 = 40.0;

/// Lowest `y` a table row may reach; below is the footer area.
const CONTENT_BOTTOM: f32 = PAGE_HEIGHT - 60.0;
const FOOTER_BASELINE: f32 = PAGE_HEIGHT - 30.0;

const LOGO_HEIGHT: f32 = 40.0;
const LOGO_MAX_WIDTH: f32 = 120.0;
const HEADER_GAP: f32 = 14.0;

const BAND_HEIGHT: f32 = 22.0;
const BAND_FONT_SIZE: f32 = 9.0;
const BODY_FONT_SIZE: f32 = 8.5;
const LINE_HEIGHT: f32 = 10.0;
const CELL_PADDING: f32 = 5.0;
const MIN_ROW_HEIGHT: f32 = 20.0;
const TABLE_GAP: f32 = 12.0;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const TEXT_COLOR: [f32; 3] = [0.13, 0.13, 0.13];
const MUTED_COLOR: [f32; 3] = [0.45, 0.45, 0.45];

/// Height of a row slice holding `lines` lines of the first cell.
fn row_height(lines: usize) -> f32 {
    (lines as f32 * LINE_HEIGHT + 2.0 * CELL_PADDING).max(MIN_ROW_HEIGHT)
}

/// A table column: where it sits on the page and how its cells align
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    /// Header label
    pub label: String,
    /// Left edge in points from the page's left edge
    pub x: f32,
    /// Width in points
    pub width: f32,
    /// Alignment of the cells
    pub align: Align,
}

impl TableColumn {
    /// A left-aligned column.
    pub fn new(label: impl Into<String>, x: f32, width: f32) -> Self {
        Self {
            label: label.into(),
            x,
            width,
            align: Align::Left,
        }
    }

    /// Set the alignment.
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Headers and rows of a table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column layout
    pub headers: Vec<TableColumn>,
    /// Cells, one `Vec` per row; missing trailing cells render empty
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// An empty table with the given columns.
    pub fn new(headers: Vec<TableColumn>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn row<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.push_row(cells);
        self
    }

    /// Append a row in place.
    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.rows.push(cells.into_iter().map(|c| c.to_string()).collect());
    }

    fn bounds(&self) -> (f32, f32) {
        let left = self.headers.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
        let right = self
            .headers
            .iter()
            .map(|c| c.x + c.width)
            .fold(f32::NEG_INFINITY, f32::max);
        (left, right)
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.headers.is_empty() {
            return Err(RenderError::EmptySchema);
        }
        let printable = PAGE_WIDTH - MARGIN;
        for column in &self.headers {
            let right = column.x + column.width;
            if column.x < MARGIN || column.width <= 0.0 || right > printable + 0.01 {
                return Err(RenderError::ColumnOutOfBounds {
                    label: column.label.clone(),
                    x: column.x,
                    right,
                    printable,
                });
            }
        }
        Ok(())
    }
}

/// A PDF document being laid out
#[derive(Debug)]
pub struct PdfReport {
    branding: Branding,
    pages: Vec<Page>,
    cursor: f32,
    logo: Option<JpegImage>,
    title: Option<String>,
    footers_stamped: bool,
}

impl PdfReport {
    /// Start a document with one empty page.
    pub fn create_document(branding: &Branding) -> Self {
        Self {
            branding: branding.clone(),
            pages: vec![Page::default()],
            cursor: MARGIN,
            logo: None,
            title: None,
            footers_stamped: false,
        }
    }

    /// The pages laid out so far.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Draw the branded header: logo, title, optional subtitle, company name
    /// and generation date.
    ///
    /// Fails if the configured logo cannot be read.
    pub fn add_header(
        &mut self,
        title: &str,
        subtitle: Option<&str>,
        generated_at: DateTime<Utc>,
    ) -> Result<&mut Self, RenderError> {
        if self.logo.is_none() {
            if let Some(path) = &self.branding.logo_path {
                self.logo = Some(JpegImage::load(path)?);
            }
        }

        let top = self.cursor;
        let mut text_x = MARGIN;
        let mut block_height = LOGO_HEIGHT;

        if let Some((pixels_wide, pixels_high)) = self.logo.as_ref().map(|l| (l.width, l.height)) {
            let aspect = f32::from(pixels_wide) / f32::from(pixels_high);
            let width = (LOGO_HEIGHT * aspect).min(LOGO_MAX_WIDTH);
            let height = width / aspect;
            self.current_page().ops.push(DrawOp::Logo {
                x: MARGIN,
                y: top,
                width,
                height,
            });
            text_x += width + 12.0;
            block_height = block_height.max(height);
        }

        let primary = self.branding.primary_color.to_unit();
        self.push_text(text_x, top + 16.0, 16.0, FontFace::Bold, primary, title);
        if let Some(subtitle) = subtitle {
            self.push_text(text_x, top + 32.0, 10.0, FontFace::Regular, MUTED_COLOR, subtitle);
        }

        let right = PAGE_WIDTH - MARGIN;
        let company = to_win_ansi(&self.branding.company_name).into_owned();
        let generated = format!("Generated on {}", generated_at.format("%d/%m/%Y %H:%M"));
        for (baseline, face, text) in [
            (top + 12.0, FontFace::Bold, company),
            (top + 26.0, FontFace::Regular, generated),
        ] {
            let x = right - text_width(&text, face, 8.0);
            self.push_text(x, baseline, 8.0, face, MUTED_COLOR, &text);
        }

        let rule_y = top + block_height + 6.0;
        self.current_page().ops.push(DrawOp::Rect {
            x: MARGIN,
            y: rule_y,
            width: PAGE_WIDTH - 2.0 * MARGIN,
            height: 1.0,
            fill: primary,
        });

        self.cursor = rule_y + HEADER_GAP;
        if self.title.is_none() {
            self.title = Some(title.to_string());
        }
        Ok(self)
    }

    /// Lay out `table` from the current position, breaking pages as needed
    /// and redrawing the header band at the top of each new page.
    pub fn add_table(&mut self, table: &Table) -> Result<&mut Self, RenderError> {
        table.validate()?;
        let (left, right) = table.bounds();

        if self.cursor + BAND_HEIGHT + MIN_ROW_HEIGHT > CONTENT_BOTTOM {
            self.new_page();
        }
        self.draw_band(table, left, right);

        let mut under_fresh_band = true;
        for (index, row) in table.rows.iter().enumerate() {
            let first = &table.headers[0];
            let first_cell = row.first().map(String::as_str).unwrap_or_default();
            let lines = wrap(
                first_cell,
                FontFace::Regular,
                BODY_FONT_SIZE,
                first.width - 2.0 * CELL_PADDING,
            );

            // A row taller than a page continues on the next one, under a
            // redrawn band, with the remaining lines of its first cell.
            let mut pending = lines.as_slice();
            let mut continued = false;
            while !pending.is_empty() {
                if self.cursor + row_height(pending.len()) > CONTENT_BOTTOM && !under_fresh_band {
                    self.new_page();
                    self.draw_band(table, left, right);
                }

                let fitting = ((CONTENT_BOTTOM - self.cursor - 2.0 * CELL_PADDING) / LINE_HEIGHT)
                    .floor()
                    .max(1.0) as usize;
                let (chunk, rest) = pending.split_at(pending.len().min(fitting));
                self.draw_row_part(table, index, row, chunk, continued);

                pending = rest;
                continued = true;
                under_fresh_band = false;
            }
        }

        self.cursor += TABLE_GAP;
        Ok(self)
    }

    /// Stamp "Page X of Y" on every page.
    ///
    /// Must run after all content is laid out; later calls do nothing.
    pub fn add_footer(&mut self) -> &mut Self {
        if self.footers_stamped {
            return self;
        }

        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            let text = format!("Page {} of {total}", index + 1);
            let width = text_width(&text, FontFace::Regular, 8.0);
            page.ops.push(DrawOp::Text {
                x: (PAGE_WIDTH - width) / 2.0,
                y: FOOTER_BASELINE,
                size: 8.0,
                face: FontFace::Regular,
                color: MUTED_COLOR,
                text,
            });
        }

        self.footers_stamped = true;
        self
    }

    /// Stamp the footers if needed and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        self.add_footer();
        writer::write(&self.pages, self.logo.as_ref(), self.title.as_deref())
    }

    fn current_page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = MARGIN;
    }

    fn draw_band(&mut self, table: &Table, left: f32, right: f32) {
        let top = self.cursor;
        let fill = self.branding.primary_color.to_unit();
        self.current_page().ops.push(DrawOp::Rect {
            x: left,
            y: top,
            width: right - left,
            height: BAND_HEIGHT,
            fill,
        });

        let baseline = top + BAND_HEIGHT / 2.0 + BAND_FONT_SIZE / 3.0;
        for column in &table.headers {
            let label = truncate(
                &column.label,
                FontFace::Bold,
                BAND_FONT_SIZE,
                column.width - 2.0 * CELL_PADDING,
            );
            let width = text_width(&label, FontFace::Bold, BAND_FONT_SIZE);
            let x = aligned_x(column.align, column.x, column.width, width, CELL_PADDING);
            self.push_text(x, baseline, BAND_FONT_SIZE, FontFace::Bold, WHITE, &label);
        }

        self.cursor = top + BAND_HEIGHT;
    }

    /// Draw `lines` of the first cell as one row slice at the cursor. The
    /// other cells only appear on the first slice of a row.
    fn draw_row_part(
        &mut self,
        table: &Table,
        index: usize,
        row: &[String],
        lines: &[String],
        continued: bool,
    ) {
        let (left, right) = table.bounds();
        let top = self.cursor;
        let height = row_height(lines.len());
        if index % 2 == 1 {
            let fill = self.branding.stripe_color.to_unit();
            self.current_page().ops.push(DrawOp::Rect {
                x: left,
                y: top,
                width: right - left,
                height,
                fill,
            });
        }

        let first = &table.headers[0];
        let first_baseline = top + CELL_PADDING + LINE_HEIGHT - 2.0;
        for (line_index, line) in lines.iter().enumerate() {
            let width = text_width(line, FontFace::Regular, BODY_FONT_SIZE);
            let x = aligned_x(first.align, first.x, first.width, width, CELL_PADDING);
            let baseline = first_baseline + line_index as f32 * LINE_HEIGHT;
            self.push_text(x, baseline, BODY_FONT_SIZE, FontFace::Regular, TEXT_COLOR, line);
        }

        if !continued {
            for (column, cell) in table.headers.iter().zip(row.iter()).skip(1) {
                let text = truncate(
                    cell,
                    FontFace::Regular,
                    BODY_FONT_SIZE,
                    column.width - 2.0 * CELL_PADDING,
                );
                if text.is_empty() {
                    continue;
                }
                let width = text_width(&text, FontFace::Regular, BODY_FONT_SIZE);
                let x = aligned_x(column.align, column.x, column.width, width, CELL_PADDING);
                self.push_text(x, first_baseline, BODY_FONT_SIZE, FontFace::Regular, TEXT_COLOR, &text);
            }
        }

        self.cursor = top + height;
    }

    fn push_text(
        &mut self,
        x: f32,
        y: f32,
        size: f32,
        face: FontFace,
        color: [f32; 3],
        text: &str,
    ) {
        self.current_page().ops.push(DrawOp::Text {
            x,
            y,
            size,
            face,
            color,
            text: to_win_ansi(text).into_owned(),
        });
    }
}
