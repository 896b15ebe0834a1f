//! Recognising rate-limited responses.
//!
//! GitHub signals an exhausted quota with `403` (primary limit, remaining
//! count `0`) or `429` (secondary limit). Both carry `X-RateLimit-Reset`, the
//! epoch second at which the quota refills. A `429` without the reset header
//! may carry `Retry-After` instead.

use pipeline::Timestamp;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

pub(crate) const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
pub(crate) const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Returns the reset time if the response is a rate-limit rejection.
pub(crate) fn rate_limit_reset(
    status: StatusCode,
    headers: &HeaderMap,
    now: Timestamp,
) -> Option<Timestamp> {
    let limited = match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => header_i64(headers, RATE_LIMIT_REMAINING) == Some(0),
        _ => false,
    };
    if !limited {
        return None;
    }
    if let Some(reset) = header_i64(headers, RATE_LIMIT_RESET) {
        return Timestamp::from_epoch_seconds(reset);
    }
    let after = header_i64(headers, RETRY_AFTER.as_str())?;
    Timestamp::from_epoch_seconds(now.as_datetime().timestamp() + after.max(0))
}
