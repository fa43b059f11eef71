use chrono::Month;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle stage of a room as tracked in the rooms status sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    UpcomingVacancy,
    Vacant,
    RoommateIntroduction,
    LeaseSent,
    OnBoarding,
    Occupied,
    LeaseSigned,
    DepositsComplete,
    OffBoarding,
}

impl RoomStatus {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::UpcomingVacancy,
            Self::Vacant,
            Self::RoommateIntroduction,
            Self::LeaseSent,
            Self::OnBoarding,
            Self::Occupied,
            Self::LeaseSigned,
            Self::DepositsComplete,
            Self::OffBoarding,
        ]
    }

    /// Label exactly as the sheet spells it.
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpcomingVacancy => "Upcoming Vacancy",
            Self::Vacant => "Vacant",
            Self::RoommateIntroduction => "Roommate Introduction",
            Self::LeaseSent => "Lease Sent",
            Self::OnBoarding => "On-boarding",
            Self::Occupied => "Occupied",
            Self::LeaseSigned => "Lease Signed",
            Self::DepositsComplete => "Deposits Complete",
            Self::OffBoarding => "Off-boarding",
        }
    }

    /// Whether a room in this stage is offered on the listing site.
    pub const fn is_active(self) -> bool {
        match self {
            Self::UpcomingVacancy
            | Self::Vacant
            | Self::RoommateIntroduction
            | Self::LeaseSent
            | Self::OnBoarding => true,
            Self::Occupied | Self::LeaseSigned | Self::DepositsComplete | Self::OffBoarding => {
                false
            }
        }
    }
}

impl FromStr for RoomStatus {
    type Err = AvailabilityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == trimmed)
            .ok_or_else(|| AvailabilityError::UnknownStatus(trimmed.to_string()))
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies a raw status cell. Unknown labels are a data error.
pub fn is_active_status(raw: &str) -> Result<bool, AvailabilityError> {
    raw.parse::<RoomStatus>().map(RoomStatus::is_active)
}

pub fn parse_month(raw: &str) -> Result<Month, AvailabilityError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Month>()
        .map_err(|_| AvailabilityError::UnknownMonth(trimmed.to_string()))
}

/// Months from `current` until `destination`, wrapping into next year when the
/// destination month has already passed. Always in `0..=11`.
pub fn month_distance(destination: Month, current: Month) -> u32 {
    let dest = destination.number_from_month();
    let now = current.number_from_month();
    if dest >= now {
        dest - now
    } else {
        dest + 12 - now
    }
}

/// Availability shown for a room or a whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Now,
    From(Month),
    NotAvailable,
}

impl Availability {
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::NotAvailable)
    }

    pub fn text(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Now => f.write_str("Available Now!"),
            Availability::From(month) => write!(f, "Available {} 1st", month.name()),
            Availability::NotAvailable => f.write_str("Not Available"),
        }
    }
}

/// One row of the rooms status sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomRecord {
    pub unit_id: String,
    pub room: String,
    pub price: Option<f64>,
    pub status: RoomStatus,
    pub available_from: Option<Month>,
    /// 1-based sheet row, kept for diagnostics.
    pub row: usize,
}

impl RoomRecord {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_upcoming(&self) -> bool {
        self.status == RoomStatus::UpcomingVacancy
    }

    pub fn month_distance(&self, current: Month) -> Option<u32> {
        self.available_from
            .map(|month| month_distance(month, current))
    }

    pub fn availability(&self) -> Availability {
        if !self.is_active() {
            return Availability::NotAvailable;
        }

        match self.available_from {
            Some(month) if self.is_upcoming() => Availability::From(month),
            _ => Availability::Now,
        }
    }

    /// Price advertised for the room: only active rooms with a usable price.
    pub fn listed_price(&self) -> Option<f64> {
        if self.is_active() {
            self.usable_price()
        } else {
            None
        }
    }

    pub(crate) fn usable_price(&self) -> Option<f64> {
        self.price.filter(|price| price.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("unrecognized room status '{0}'")]
    UnknownStatus(String),
    #[error("unrecognized month '{0}'")]
    UnknownMonth(String),
    #[error("unit '{0}' not found in the sheet")]
    UnitNotFound(String),
    #[error("room '{room}' not found in unit '{unit_id}'")]
    RoomNotFound { unit_id: String, room: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(status: RoomStatus, available_from: Option<Month>) -> RoomRecord {
        RoomRecord {
            unit_id: "unit-1".to_string(),
            room: "A".to_string(),
            price: Some(650.0),
            status,
            available_from,
            row: 2,
        }
    }

    #[test]
    fn classifier_matches_fixed_table() {
        let expected = [
            ("Upcoming Vacancy", true),
            ("Vacant", true),
            ("Roommate Introduction", true),
            ("Lease Sent", true),
            ("On-boarding", true),
            ("Occupied", false),
            ("Lease Signed", false),
            ("Deposits Complete", false),
            ("Off-boarding", false),
        ];

        for (label, active) in expected {
            assert_eq!(is_active_status(label), Ok(active), "status {label}");
        }
        assert_eq!(RoomStatus::ordered().len(), expected.len());
    }

    #[test]
    fn classifier_rejects_unknown_labels() {
        assert_eq!(
            is_active_status("Pending"),
            Err(AvailabilityError::UnknownStatus("Pending".to_string()))
        );
        assert!(is_active_status("vacant").is_err());
        assert!(is_active_status("").is_err());
        assert_eq!(is_active_status("  Vacant "), Ok(true));
    }

    #[test]
    fn month_distance_wraps_year_boundary() {
        assert_eq!(month_distance(Month::January, Month::December), 1);
        assert_eq!(month_distance(Month::January, Month::January), 0);
        assert_eq!(month_distance(Month::November, Month::March), 8);
        assert_eq!(month_distance(Month::February, Month::March), 11);
    }

    #[test]
    fn month_distance_stays_in_range() {
        for dest in 1u8..=12 {
            for now in 1u8..=12 {
                let dest = Month::try_from(dest).expect("valid month");
                let now = Month::try_from(now).expect("valid month");
                assert!(month_distance(dest, now) <= 11);
            }
        }
    }

    #[test]
    fn parse_month_accepts_sheet_spellings() {
        assert_eq!(parse_month("November"), Ok(Month::November));
        assert_eq!(parse_month(" march "), Ok(Month::March));
        assert_eq!(parse_month("Sep"), Ok(Month::September));
        assert_eq!(
            parse_month("Novembre"),
            Err(AvailabilityError::UnknownMonth("Novembre".to_string()))
        );
    }

    #[test]
    fn room_text_follows_status_and_date() {
        assert_eq!(
            room(RoomStatus::UpcomingVacancy, Some(Month::November))
                .availability()
                .text(),
            "Available November 1st"
        );
        assert_eq!(
            room(RoomStatus::UpcomingVacancy, None).availability(),
            Availability::Now
        );
        assert_eq!(
            room(RoomStatus::Vacant, Some(Month::May)).availability().text(),
            "Available Now!"
        );
        assert_eq!(
            room(RoomStatus::Occupied, Some(Month::May)).availability().text(),
            "Not Available"
        );
    }

    #[test]
    fn listed_price_requires_active_room() {
        assert_eq!(room(RoomStatus::Vacant, None).listed_price(), Some(650.0));
        assert_eq!(room(RoomStatus::LeaseSigned, None).listed_price(), None);

        let mut unpriced = room(RoomStatus::Vacant, None);
        unpriced.price = Some(f64::NAN);
        assert_eq!(unpriced.listed_price(), None);
    }
}
