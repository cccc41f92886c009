//! Matches stored birthday entries against today's date.

use birthday_types::BirthdayRecord;
use chrono::{Datelike, NaiveDate};

/// `DD-MM` key for a date, zero-padded, no year.
pub fn day_month_key(date: NaiveDate) -> String {
    format!("{:02}-{:02}", date.day(), date.month())
}

/// Entries whose `birthday` field string-equals today's `DD-MM` key.
///
/// Pure string comparison — stored values are never parsed or range-checked,
/// so an impossible date like `31-02` simply never matches. Input order is
/// preserved.
pub fn todays_birthdays(records: &[BirthdayRecord], today: NaiveDate) -> Vec<BirthdayRecord> {
    let key = day_month_key(today);
    records
        .iter()
        .filter(|r| r.birthday.as_deref() == Some(key.as_str()))
        .cloned()
        .collect()
}
