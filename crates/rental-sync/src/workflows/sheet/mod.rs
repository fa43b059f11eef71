mod parser;
mod workbook;

use crate::workflows::availability::{AvailabilityError, RoomRecord};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug)]
pub enum SheetImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Workbook(calamine::Error),
    EmptySheet(String),
    MissingColumn(&'static str),
    InvalidPrice { row: usize, value: String },
    Row { row: usize, source: AvailabilityError },
}

impl std::fmt::Display for SheetImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetImportError::Io(err) => write!(f, "failed to read rooms sheet: {}", err),
            SheetImportError::Csv(err) => write!(f, "invalid rooms CSV data: {}", err),
            SheetImportError::Workbook(err) => write!(f, "invalid rooms workbook: {}", err),
            SheetImportError::EmptySheet(name) => write!(f, "sheet '{}' has no header row", name),
            SheetImportError::MissingColumn(name) => {
                write!(f, "rooms sheet is missing the '{}' column", name)
            }
            SheetImportError::InvalidPrice { row, value } => {
                write!(f, "row {}: price '{}' is not a number", row, value)
            }
            SheetImportError::Row { row, source } => write!(f, "row {}: {}", row, source),
        }
    }
}

impl std::error::Error for SheetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetImportError::Io(err) => Some(err),
            SheetImportError::Csv(err) => Some(err),
            SheetImportError::Workbook(err) => Some(err),
            SheetImportError::Row { source, .. } => Some(source),
            SheetImportError::EmptySheet(_)
            | SheetImportError::MissingColumn(_)
            | SheetImportError::InvalidPrice { .. } => None,
        }
    }
}

impl From<std::io::Error> for SheetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SheetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<calamine::Error> for SheetImportError {
    fn from(err: calamine::Error) -> Self {
        Self::Workbook(err)
    }
}

/// Reads the rooms status sheet into validated room records.
pub struct RoomSheetImporter;

impl RoomSheetImporter {
    /// Opens a workbook (`.xlsx`, `.xls`, `.ods`, ...) or a `.csv` export of the
    /// rooms sheet. `sheet_name` is ignored for CSV files.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        sheet_name: &str,
    ) -> Result<Vec<RoomRecord>, SheetImportError> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let records = if is_csv {
            let file = std::fs::File::open(path)?;
            Self::from_reader(file)?
        } else {
            workbook::parse_workbook(path, sheet_name)?
        };

        info!(path = %path.display(), rooms = records.len(), "rooms sheet imported");
        Ok(records)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<RoomRecord>, SheetImportError> {
        parser::parse_csv(reader)
    }
}
