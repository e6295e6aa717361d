//! Display formatting for the dashboard

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Clock time as shown on queue cards, e.g. `11.05AM`, `12.30PM`
pub fn format_clock_time(at: DateTime<Utc>, tz: Tz) -> String {
    let local = at.with_timezone(&tz);
    let (is_pm, hour) = local.hour12();
    format!(
        "{}.{:02}{}",
        hour,
        local.minute(),
        if is_pm { "PM" } else { "AM" }
    )
}

/// Elapsed wait, e.g. `45s` under a minute, otherwise `3m 5s`
///
/// Negative spans (clock skew against the backend) render as `0s`.
pub fn format_duration(elapsed: chrono::Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let mins = total / 60;
    let secs = total % 60;
    if mins == 0 {
        format!("{}s", secs)
    } else {
        format!("{}m {}s", mins, secs)
    }
}

/// Elapsed wait between `since` and `now`
pub fn format_elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_duration(now - since)
}

/// Hour-of-day label, e.g. `12 AM`, `7 PM`
pub fn format_hour(hour: u32) -> String {
    match hour % 24 {
        0 => "12 AM".to_string(),
        12 => "12 PM".to_string(),
        h if h < 12 => format!("{} AM", h),
        h => format!("{} PM", h - 12),
    }
}
