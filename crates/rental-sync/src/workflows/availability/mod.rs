//! Room and unit availability: status classification, month distance, unit
//! roll-ups and the JSON bodies the listing backend accepts.

mod aggregate;
pub mod domain;
mod payload;

pub use aggregate::{summarize_units, UnitSummary};
pub use domain::{
    is_active_status, month_distance, parse_month, Availability, AvailabilityError, RoomRecord,
    RoomStatus,
};
pub use payload::{json_price, room_field_updates, FieldUpdate, UnitPayload, UpdateField};
