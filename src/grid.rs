//! Weekly time grid.
//!
//! Expands the institution's day/time preferences into the ordered list of
//! atomic slots. Periods that would run past the stated end time are not
//! emitted, and any period overlapping the lunch window is flagged as a
//! break so that nothing is ever placed in it.

use log::debug;

use crate::data::{SchedulingPreferences, TimeSlot, day_index};
use crate::error::ConfigError;

/// Parses `"HH:MM"` (or a bare `"HH"`) into minutes after midnight.
pub fn parse_time(text: &str) -> Result<u32, ConfigError> {
    let malformed = || ConfigError::MalformedTime(text.to_string());
    let trimmed = text.trim();
    let (hours, minutes) = match trimmed.split_once(':') {
        Some((h, m)) => (h, m),
        None => (trimmed, "0"),
    };
    let hours: u32 = hours.parse().map_err(|_| malformed())?;
    let minutes: u32 = minutes.parse().map_err(|_| malformed())?;
    if hours > 24 || minutes > 59 || (hours == 24 && minutes > 0) {
        return Err(malformed());
    }
    Ok(hours * 60 + minutes)
}

/// Parses a `"HH:MM-HH:MM"` lunch window into a half-open minute range.
pub fn parse_lunch_window(text: &str) -> Result<(u32, u32), ConfigError> {
    let malformed = || ConfigError::MalformedLunchWindow(text.to_string());
    let (start, end) = text.split_once('-').ok_or_else(malformed)?;
    let start = parse_time(start).map_err(|_| malformed())?;
    let end = parse_time(end).map_err(|_| malformed())?;
    if end < start {
        return Err(malformed());
    }
    Ok((start, end))
}

pub fn format_time(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Builds the ordered slot list: working days in the given order, periods
/// numbered from 0 each day with breaks included in the numbering.
pub fn build_time_grid(prefs: &SchedulingPreferences) -> Result<Vec<TimeSlot>, ConfigError> {
    let start = parse_time(&prefs.start_time)?;
    let end = parse_time(&prefs.end_time)?;
    if end <= start {
        return Err(ConfigError::EmptyWorkingWindow {
            start: prefs.start_time.clone(),
            end: prefs.end_time.clone(),
        });
    }
    if prefs.period_duration == 0 {
        return Err(ConfigError::ZeroPeriodDuration);
    }
    if prefs.period_duration > end - start {
        return Err(ConfigError::PeriodLongerThanDay {
            duration: prefs.period_duration,
            window: end - start,
        });
    }
    let (lunch_start, lunch_end) = parse_lunch_window(&prefs.lunch_break)?;

    let mut slots = Vec::new();
    for day_name in &prefs.working_days {
        let day = day_index(day_name).ok_or_else(|| ConfigError::UnknownDay(day_name.clone()))?;
        let mut current = start;
        let mut period = 0;
        while let Some(period_end) = current
            .checked_add(prefs.period_duration)
            .filter(|&period_end| period_end <= end)
        {
            slots.push(TimeSlot {
                day,
                period,
                start_time: format_time(current),
                end_time: format_time(period_end),
                is_break: current < lunch_end && period_end > lunch_start,
            });
            current = period_end;
            period += 1;
        }
    }

    debug!(
        "Built time grid: {} slots over {} days ({} breaks)",
        slots.len(),
        prefs.working_days.len(),
        slots.iter().filter(|s| s.is_break).count()
    );
    Ok(slots)
}
