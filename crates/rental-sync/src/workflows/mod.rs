pub mod availability;
pub mod delivery;
pub mod sheet;
