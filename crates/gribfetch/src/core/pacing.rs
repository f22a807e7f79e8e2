use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Parse the shared pacing state: a decimal Unix timestamp in seconds.
///
/// Anything unreadable counts as "never pinged".
pub fn parse_instant(raw: &[u8]) -> Option<SystemTime> {
    let text = std::str::from_utf8(raw).ok()?.trim();
    let seconds: f64 = text.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let since_epoch = Duration::try_from_secs_f64(seconds).ok()?;
    UNIX_EPOCH.checked_add(since_epoch)
}

pub fn format_instant(at: SystemTime) -> String {
    let seconds = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    format!("{seconds:.6}")
}

/// How long to wait before the next gated operation may start.
///
/// A recorded instant in the future (clock stepped back) costs at most one
/// full interval.
pub fn pacing_wait(min_interval: Duration, now: SystemTime, last: Option<SystemTime>) -> Duration {
    let Some(last) = last else {
        return Duration::ZERO;
    };
    match now.duration_since(last) {
        Ok(elapsed) => min_interval.saturating_sub(elapsed),
        Err(_) => min_interval,
    }
}

/// Instant to record after a pass; never earlier than what was read.
pub fn next_stamp(now: SystemTime, last: Option<SystemTime>) -> SystemTime {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}
