const MS_PER_SECOND: u64 = 1_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// A duration rendered both ways the UI and history show it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDuration {
    /// `HH:MM:SS`, zero padded, floored to the whole second
    pub display: String,
    /// Decimal hours with exactly two fractional digits
    pub hours_decimal: String,
}

/// Format a non-negative millisecond duration.
///
/// The clock face drops any sub-second remainder. The hours figure rounds
/// half up at the second decimal place, computed in integer arithmetic so
/// that e.g. 18 000 ms (0.005 h) reliably renders as `0.01`.
pub fn format_duration(ms: u64) -> FormattedDuration {
    let total_secs = ms / MS_PER_SECOND;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    FormattedDuration {
        display: format!("{hours:02}:{minutes:02}:{seconds:02}"),
        hours_decimal: format_hours(ms),
    }
}

/// Decimal hours with two fractional digits, half rounds up
pub fn format_hours(ms: u64) -> String {
    let hour = u128::from(MS_PER_HOUR);
    let hundredths = (u128::from(ms) * 100 + hour / 2) / hour;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
