use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use super::parser::ColumnIndex;
use super::SheetImportError;
use crate::workflows::availability::RoomRecord;

pub(crate) fn parse_workbook(
    path: &Path,
    sheet_name: &str,
) -> Result<Vec<RoomRecord>, SheetImportError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range(sheet_name)?;
    let first_row = range.start().map_or(0, |(row, _)| row as usize);

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| SheetImportError::EmptySheet(sheet_name.to_string()))?;
    let header_text: Vec<String> = header
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let columns = ColumnIndex::locate(&header_text)?;

    let mut records = Vec::new();
    for (offset, cells) in rows.enumerate() {
        // Header sits on `first_row`; sheet rows are 1-based.
        let row = first_row + offset + 2;
        let cells: Vec<Option<String>> = cells.iter().map(cell_text).collect();
        if let Some(room) = columns.extract(&cells).into_record(row)? {
            records.push(room);
        }
    }

    Ok(records)
}

/// Renders a cell the way it reads in the sheet. Error cells (`#N/A`) read as
/// blank.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(value) => value.trim().to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        other => other.to_string().trim().to_string(),
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
