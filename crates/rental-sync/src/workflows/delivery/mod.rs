//! Delivery of unit payloads to the listing backend's HTTP functions.

mod dispatch;
pub mod gateway;
mod report;
mod retry;

pub use dispatch::SyncDispatcher;
pub use gateway::{GatewayError, HttpListingGateway, HttpReply, ListingGateway};
pub use report::{runtime_label, SyncRunReport, SyncTarget, TargetKind, TargetReport};
pub use retry::{deliver, DeliveryFailure, DeliveryOutcome, FailureReason, RetryPolicy};
