use super::domain::{Availability, RoomRecord};
use chrono::Month;
use std::collections::BTreeMap;
use tracing::debug;

/// Availability and pricing rolled up from every room of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub unit_id: String,
    pub availability: Availability,
    pub price: Option<f64>,
    pub active_rooms: usize,
    /// Rooms in sheet order.
    pub rooms: Vec<RoomRecord>,
}

impl UnitSummary {
    pub fn from_rooms(unit_id: String, rooms: Vec<RoomRecord>, current: Month) -> Self {
        let active: Vec<&RoomRecord> = rooms.iter().filter(|room| room.is_active()).collect();
        let available_now: Vec<&RoomRecord> = active
            .iter()
            .copied()
            .filter(|room| !room.is_upcoming())
            .collect();

        let (availability, price) = if active.is_empty() {
            (Availability::NotAvailable, None)
        } else if !available_now.is_empty() {
            (Availability::Now, min_price(&available_now))
        } else {
            (nearest_opening(&active, current), min_price(&active))
        };

        let active_rooms = active.len();
        Self {
            unit_id,
            availability,
            price,
            active_rooms,
            rooms,
        }
    }

    pub fn is_active(&self) -> bool {
        self.availability.is_active()
    }

    pub fn total_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn occupancy_text(&self) -> String {
        format!(
            "{}/{} Rooms Available",
            self.active_rooms,
            self.total_rooms()
        )
    }

    pub fn room(&self, label: &str) -> Option<&RoomRecord> {
        let wanted = label.trim();
        self.rooms.iter().find(|room| room.room == wanted)
    }
}

/// Groups room rows by unit id. Units come back ordered by id and each unit
/// keeps its rooms in the order they were read.
pub fn summarize_units(
    records: impl IntoIterator<Item = RoomRecord>,
    current: Month,
) -> BTreeMap<String, UnitSummary> {
    let mut grouped: BTreeMap<String, Vec<RoomRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.unit_id.clone())
            .or_default()
            .push(record);
    }

    grouped
        .into_iter()
        .map(|(unit_id, rooms)| {
            let summary = UnitSummary::from_rooms(unit_id.clone(), rooms, current);
            debug!(
                unit_id = %summary.unit_id,
                availability = %summary.availability,
                price = ?summary.price,
                occupancy = %summary.occupancy_text(),
                "unit summarized"
            );
            (unit_id, summary)
        })
        .collect()
}

fn min_price(rooms: &[&RoomRecord]) -> Option<f64> {
    rooms
        .iter()
        .filter_map(|room| room.usable_price())
        .fold(None, |lowest: Option<f64>, price| {
            Some(lowest.map_or(price, |current| current.min(price)))
        })
}

// Every active room is an upcoming vacancy here; ties keep the first room.
fn nearest_opening(active: &[&RoomRecord], current: Month) -> Availability {
    active
        .iter()
        .filter_map(|room| {
            let month = room.available_from?;
            room.month_distance(current).map(|distance| (distance, month))
        })
        .min_by_key(|(distance, _)| *distance)
        .map_or(Availability::Now, |(_, month)| Availability::From(month))
}
