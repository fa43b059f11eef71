use super::gateway::ListingGateway;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const STATUS_OK: u16 = 200;
const STATUS_SERVICE_UNAVAILABLE: u16 = 503;

/// How often a request is retried when the backend answers 503.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Rejected {
        status: u16,
        message: Option<String>,
    },
    RetriesExhausted {
        status: u16,
        message: Option<String>,
    },
    Transport(String),
}

impl FailureReason {
    pub fn status(&self) -> Option<u16> {
        match self {
            FailureReason::Rejected { status, .. }
            | FailureReason::RetriesExhausted { status, .. } => Some(*status),
            FailureReason::Transport(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FailureReason::Rejected { message, .. }
            | FailureReason::RetriesExhausted { message, .. } => message.as_deref(),
            FailureReason::Transport(message) => Some(message.as_str()),
        }
    }
}

/// A failed delivery with the request body kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub attempts: u32,
    pub reason: FailureReason,
    pub request: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    Failed(DeliveryFailure),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            DeliveryOutcome::Delivered { attempts } => *attempts,
            DeliveryOutcome::Failed(failure) => failure.attempts,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Failed(DeliveryFailure {
                reason: FailureReason::Rejected { .. },
                ..
            }) => "rejected",
            DeliveryOutcome::Failed(DeliveryFailure {
                reason: FailureReason::RetriesExhausted { .. },
                ..
            }) => "exhausted",
            DeliveryOutcome::Failed(DeliveryFailure {
                reason: FailureReason::Transport(_),
                ..
            }) => "transport",
        }
    }
}

/// POSTs `body` to `url`. Only 200 counts as success; 503 is retried after
/// `retry_delay` until `max_attempts` is reached. Transport faults end the
/// delivery immediately.
pub fn deliver<G>(gateway: &G, url: &str, body: &Value, policy: RetryPolicy) -> DeliveryOutcome
where
    G: ListingGateway + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let reason = match gateway.post_json(url, body) {
            Ok(reply) if reply.status == STATUS_OK => {
                return DeliveryOutcome::Delivered { attempts };
            }
            Ok(reply) if reply.status == STATUS_SERVICE_UNAVAILABLE && attempts < max_attempts => {
                debug!(url, attempts, "backend unavailable; retrying");
                if !policy.retry_delay.is_zero() {
                    std::thread::sleep(policy.retry_delay);
                }
                continue;
            }
            Ok(reply) if reply.status == STATUS_SERVICE_UNAVAILABLE => {
                FailureReason::RetriesExhausted {
                    status: reply.status,
                    message: status_message(&reply.body),
                }
            }
            Ok(reply) => FailureReason::Rejected {
                status: reply.status,
                message: status_message(&reply.body),
            },
            Err(err) => FailureReason::Transport(err.to_string()),
        };

        return DeliveryOutcome::Failed(DeliveryFailure {
            attempts,
            reason,
            request: body.to_string(),
        });
    }
}

/// Best-effort error text from a backend response body: `status_msg`, then
/// `status`.
fn status_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let field = parsed.get("status_msg").or_else(|| parsed.get("status"))?;
    match field {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
