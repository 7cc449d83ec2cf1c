//! Duration helpers
//!
//! `hours`, `minutes` and `seconds` split a count of seconds into clock
//! components. [`format_millis`] renders a millisecond duration for humans.

/// Whole hours in `total_secs`
pub fn hours(total_secs: u64) -> u64 {
    total_secs / 3600
}

/// Minutes component (0..60) of `total_secs`
pub fn minutes(total_secs: u64) -> u64 {
    (total_secs % 3600) / 60
}

/// Seconds component (0..60) of `total_secs`
pub fn seconds(total_secs: u64) -> u64 {
    total_secs % 60
}

/// Render `millis` as `"<m>m <s>s"`, `"<m>m"` on a whole minute or `"<s>s"`
/// under a minute. Sub-second remainders are dropped and hours are folded
/// into the minute count.
pub fn format_millis(millis: u64) -> String {
    let total_secs = millis / 1000;
    let mins = hours(total_secs) * 60 + minutes(total_secs);
    let secs = seconds(total_secs);

    match (mins, secs) {
        (0, s) => format!("{}s", s),
        (m, 0) => format!("{}m", m),
        (m, s) => format!("{}m {}s", m, s),
    }
}
