use crate::llm::{FailureKind, GenerationFailure};

const TOO_MANY_REQUESTS: u16 = 429;

/// Why a failure qualifies for the one-shot failover hop, if it does.
///
/// The HTTP status is the primary signal. Message text is only consulted
/// when the transport gave no 429.
pub fn failover_reason(failure: &GenerationFailure) -> Option<FailureKind> {
    match failure.kind {
        FailureKind::RateLimited | FailureKind::QuotaExceeded => return Some(failure.kind),
        // Request-level failures
        FailureKind::ConfigError | FailureKind::ContentBlocked => return None,
        _ => {}
    }

    let message = failure.message.to_lowercase();

    if failure.status == Some(TOO_MANY_REQUESTS) {
        if message.contains("quota") {
            return Some(FailureKind::QuotaExceeded);
        }
        return Some(FailureKind::RateLimited);
    }

    if message.contains("quota") {
        Some(FailureKind::QuotaExceeded)
    } else if message.contains("rate limit") {
        Some(FailureKind::RateLimited)
    } else {
        None
    }
}
