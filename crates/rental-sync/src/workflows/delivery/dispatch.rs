use super::gateway::ListingGateway;
use super::report::{SyncTarget, TargetReport};
use super::retry::{deliver, DeliveryFailure, DeliveryOutcome, FailureReason, RetryPolicy};
use crate::workflows::availability::{FieldUpdate, UnitPayload};
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

/// Pushes payloads to one target at a time, one request after another. A
/// failing unit never stops the rest of the batch.
#[derive(Debug)]
pub struct SyncDispatcher {
    gateway: Box<dyn ListingGateway>,
    policy: RetryPolicy,
}

impl SyncDispatcher {
    pub fn new(gateway: Box<dyn ListingGateway>, policy: RetryPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Sends every unit payload to the target's `batchUpdate` function.
    pub fn push_units(&self, target: &SyncTarget, payloads: &[UnitPayload]) -> TargetReport {
        let url = target.batch_update_url();
        let mut report = TargetReport::new(target.kind);

        for payload in payloads {
            let outcome = self.send(target, &url, &payload.unit_id, payload);
            report.record(payload.unit_id.clone(), outcome.is_success());
        }

        info!(
            backend = target.kind.key(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "unit batch pushed"
        );
        report
    }

    /// Sends single-field updates to the target's `updateRoom` function. Keys in
    /// the report are the field names.
    pub fn push_room_updates(
        &self,
        target: &SyncTarget,
        updates: &[FieldUpdate],
    ) -> TargetReport {
        let url = target.room_update_url();
        let mut report = TargetReport::new(target.kind);

        for update in updates {
            let key = format!("{}:{}", update.unit_id, update.field.label());
            let outcome = self.send(target, &url, &key, update);
            report.record(update.field.label(), outcome.is_success());
        }

        report
    }

    fn send<T: Serialize>(
        &self,
        target: &SyncTarget,
        url: &str,
        key: &str,
        item: &T,
    ) -> DeliveryOutcome {
        let outcome = match serde_json::to_value(item) {
            Ok(body) => deliver(self.gateway.as_ref(), url, &body, self.policy),
            Err(err) => DeliveryOutcome::Failed(DeliveryFailure {
                attempts: 0,
                reason: FailureReason::Transport(format!("payload encoding failed: {err}")),
                request: String::new(),
            }),
        };

        counter!("rental_sync_delivery_attempts_total", "target" => target.kind.key())
            .increment(u64::from(outcome.attempts()));
        counter!(
            "rental_sync_deliveries_total",
            "target" => target.kind.key(),
            "outcome" => outcome.label()
        )
        .increment(1);

        if let DeliveryOutcome::Failed(failure) = &outcome {
            warn!(
                backend = target.kind.key(),
                key,
                attempts = failure.attempts,
                status = ?failure.reason.status(),
                message = failure.reason.message().unwrap_or(""),
                request = %failure.request,
                "delivery failed"
            );
        }

        outcome
    }
}
