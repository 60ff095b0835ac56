use crate::render::rows::{Cell, Table};
use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook};
use std::path::Path;

const HEADER_FILL: u32 = 0x4472C4;
const BAND_FILLS: [u32; 2] = [0xFFFFFF, 0xDDEBF7];

/// Write `table` as the single sheet of a new workbook.
pub fn write_workbook(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(table.name)?;

    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin);

    let text_fmt = BAND_FILLS.map(|fill| {
        Format::new()
            .set_background_color(Color::RGB(fill))
            .set_border(FormatBorder::Thin)
    });
    let number_fmt = text_fmt.clone().map(|f| f.set_num_format("0.00"));
    let count_fmt = text_fmt.clone().map(|f| f.set_num_format("0"));

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.len()).collect();

    for (col, h) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, h, &header)?;
    }

    for ((i, row), shaded) in table.rows.iter().enumerate().zip(table.bands()) {
        let r = (i + 1) as u32;
        let band = usize::from(shaded);
        for (col, cell) in row.cells.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string_with_format(r, c, s, &text_fmt[band])?;
                }
                Cell::Number(v) => {
                    sheet.write_number_with_format(r, c, *v, &number_fmt[band])?;
                }
                Cell::Count(n) => {
                    sheet.write_number_with_format(r, c, *n as f64, &count_fmt[band])?;
                }
            }
            if let Some(w) = widths.get_mut(col) {
                *w = (*w).max(cell.to_text().len());
            }
        }
    }

    for (col, w) in widths.iter().enumerate() {
        sheet.set_column_width(col as u16, (*w).clamp(8, 60) as f64 + 2.0)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    workbook
        .save(path)
        .with_context(|| format!("saving workbook {}", path.display()))?;
    Ok(())
}
