use chrono::{Datelike, Timelike};

/// `YYYY-MM-DD` from the wall-clock fields of `date`.
pub fn format_date<D: Datelike>(date: &D) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// `HH:MM`, 24-hour clock.
pub fn format_time<T: Timelike>(time: &T) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
