//! Cleanup delay strings
//!
//! Accepted forms are `<n>s`, `<n>m`, `<n>h` and a bare integer, which is
//! read as minutes for compatibility with older configs. Anything else falls
//! back to [`DEFAULT_DELAY_SECS`].

use std::time::Duration;

/// Delay used when the configured value cannot be parsed
pub const DEFAULT_DELAY_SECS: u64 = 300;

/// Parse a delay string into whole seconds
pub fn parse_delay_secs(delay: &str) -> u64 {
    let delay = delay.trim();

    if let Ok(minutes) = delay.parse::<u64>() {
        return minutes.saturating_mul(60);
    }

    let Some(unit) = delay.chars().last() else {
        return DEFAULT_DELAY_SECS;
    };
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        _ => return DEFAULT_DELAY_SECS,
    };

    delay[..delay.len() - unit.len_utf8()]
        .parse::<u64>()
        .map(|n| n.saturating_mul(multiplier))
        .unwrap_or(DEFAULT_DELAY_SECS)
}

/// Parse a delay string into a [`Duration`]
pub fn parse_delay(delay: &str) -> Duration {
    Duration::from_secs(parse_delay_secs(delay))
}
