use super::aggregate::UnitSummary;
use super::domain::AvailabilityError;
use serde::Serialize;
use serde_json::{json, Number, Value};

/// Body of a `batchUpdate` request: the whole unit in one payload.
///
/// The three room arrays are index-aligned; position `i` in each describes the
/// same room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPayload {
    pub unit_id: String,
    pub unit_price: Option<Number>,
    pub unit_availability: (bool, String, String),
    pub rooms: Vec<String>,
    pub rooms_price: Vec<Option<Number>>,
    pub rooms_availability: Vec<String>,
}

impl UnitPayload {
    pub fn from_summary(summary: &UnitSummary) -> Self {
        let mut rooms = Vec::with_capacity(summary.rooms.len());
        let mut rooms_price = Vec::with_capacity(summary.rooms.len());
        let mut rooms_availability = Vec::with_capacity(summary.rooms.len());

        for room in &summary.rooms {
            rooms.push(room.room.clone());
            rooms_price.push(json_price(room.listed_price()));
            rooms_availability.push(room.availability().text());
        }

        Self {
            unit_id: summary.unit_id.clone(),
            unit_price: json_price(summary.price),
            unit_availability: (
                summary.is_active(),
                summary.availability.text(),
                summary.occupancy_text(),
            ),
            rooms,
            rooms_price,
            rooms_availability,
        }
    }
}

/// Converts a sheet price into a JSON number. Missing and non-finite values
/// become `None` (JSON `null`); whole amounts serialize without a fraction.
pub fn json_price(value: Option<f64>) -> Option<Number> {
    const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

    let value = value.filter(|price| price.is_finite())?;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Some(Number::from(value as i64))
    } else {
        Number::from_f64(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateField {
    UnitPrice,
    UnitAvailable,
    RoomAvailable,
    RoomPrice,
}

impl UpdateField {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnitPrice => "unitPrice",
            Self::UnitAvailable => "unitAvailable",
            Self::RoomAvailable => "roomAvailable",
            Self::RoomPrice => "roomPrice",
        }
    }
}

/// Body of an `updateRoom` request, which changes a single field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdate {
    pub unit_id: String,
    pub field: UpdateField,
    pub value: Value,
}

/// Builds the incremental updates emitted when one room changes: unit
/// availability, room availability, room price, then unit price.
pub fn room_field_updates(
    summary: &UnitSummary,
    room_label: &str,
) -> Result<Vec<FieldUpdate>, AvailabilityError> {
    let room = summary
        .room(room_label)
        .ok_or_else(|| AvailabilityError::RoomNotFound {
            unit_id: summary.unit_id.clone(),
            room: room_label.trim().to_string(),
        })?;

    let update = |field: UpdateField, value: Value| FieldUpdate {
        unit_id: summary.unit_id.clone(),
        field,
        value,
    };

    Ok(vec![
        update(
            UpdateField::UnitAvailable,
            json!([
                summary.is_active(),
                summary.availability.text(),
                summary.occupancy_text()
            ]),
        ),
        update(
            UpdateField::RoomAvailable,
            json!([room.room, room.availability().text()]),
        ),
        update(
            UpdateField::RoomPrice,
            json!([room.room, json_price(room.listed_price())]),
        ),
        update(UpdateField::UnitPrice, json!(json_price(summary.price))),
    ])
}
