use crate::workflows::availability::{parse_month, RoomRecord, RoomStatus};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::debug;

use super::SheetImportError;

const UNIT_ID_COLUMN: &str = "Wix ID";
const ROOM_COLUMN: &str = "Room";
const PRICE_COLUMN: &str = "Price";
const STATUS_COLUMN: &str = "Status";
const DATE_COLUMN: &str = "Date";

/// Positions of the columns the sync reads, resolved from the header row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnIndex {
    unit_id: usize,
    room: usize,
    price: usize,
    status: usize,
    date: usize,
}

impl ColumnIndex {
    pub(crate) fn locate<I, S>(headers: I) -> Result<Self, SheetImportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|header| header.as_ref().trim().to_string())
            .collect();
        let position = |name: &'static str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or(SheetImportError::MissingColumn(name))
        };

        Ok(Self {
            unit_id: position(UNIT_ID_COLUMN)?,
            room: position(ROOM_COLUMN)?,
            price: position(PRICE_COLUMN)?,
            status: position(STATUS_COLUMN)?,
            date: position(DATE_COLUMN)?,
        })
    }

    /// Picks the sync columns out of a row of already-stringified cells.
    pub(crate) fn extract(&self, cells: &[Option<String>]) -> RawRoomRow {
        let cell = |index: usize| cells.get(index).cloned().flatten();
        RawRoomRow {
            unit_id: cell(self.unit_id),
            room: cell(self.room),
            price: cell(self.price),
            status: cell(self.status),
            date: cell(self.date),
        }
    }
}

/// A sheet row before validation. Blank cells are `None`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawRoomRow {
    #[serde(rename = "Wix ID", default, deserialize_with = "empty_string_as_none")]
    unit_id: Option<String>,
    #[serde(rename = "Room", default, deserialize_with = "empty_string_as_none")]
    room: Option<String>,
    #[serde(rename = "Price", default, deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(rename = "Date", default, deserialize_with = "empty_string_as_none")]
    date: Option<String>,
}

impl RawRoomRow {
    /// Validates the row. Rows without a unit id are dropped (`Ok(None)`).
    pub(crate) fn into_record(self, row: usize) -> Result<Option<RoomRecord>, SheetImportError> {
        let Some(unit_id) = self.unit_id.map(|id| id.trim().to_string()) else {
            debug!(row, "skipping row without unit id");
            return Ok(None);
        };

        let status = self
            .status
            .as_deref()
            .unwrap_or_default()
            .parse::<RoomStatus>()
            .map_err(|source| SheetImportError::Row { row, source })?;

        let available_from = self
            .date
            .as_deref()
            .map(parse_month)
            .transpose()
            .map_err(|source| SheetImportError::Row { row, source })?;

        let price = match self.price.as_deref() {
            Some(raw) => Some(parse_price(raw).ok_or_else(|| SheetImportError::InvalidPrice {
                row,
                value: raw.to_string(),
            })?),
            None => None,
        }
        .filter(|price| price.is_finite());

        Ok(Some(RoomRecord {
            unit_id,
            room: self
                .room
                .map(|room| room.trim().to_string())
                .unwrap_or_default(),
            price,
            status,
            available_from,
            row,
        }))
    }
}

pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<Vec<RoomRecord>, SheetImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    ColumnIndex::locate(headers.iter())?;

    let mut records = Vec::new();
    for (index, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = record
            .position()
            .map_or(index + 2, |position| position.line() as usize);
        let raw: RawRoomRow = record.deserialize(Some(&headers))?;
        if let Some(room) = raw.into_record(row)? {
            records.push(room);
        }
    }

    Ok(records)
}

fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
pub(crate) fn parse_price_for_tests(raw: &str) -> Option<f64> {
    parse_price(raw)
}
