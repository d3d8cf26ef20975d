use chrono::{Datelike, Duration, Local, Months, NaiveDate};

use crate::constants::MONTH_ID_FORMAT;

/// Today's date in the local timezone.
///
/// Goals are planned in calendar months as the user experiences them, so the
/// local date (not UTC) decides which month "now" falls into.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the calendar month containing `date`.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.day0()))
}

/// First day of the calendar month following the one containing `date`.
pub fn first_day_of_next_month(date: NaiveDate) -> NaiveDate {
    let first = first_day_of_month(date);
    first.checked_add_months(Months::new(1)).unwrap_or(first)
}

/// Number of whole calendar months from the month of `start` to the month of
/// `end`. Days within the month are ignored; the result is negative when `end`
/// falls in an earlier month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// Adds `months` calendar months to `date`, clamping the day to the length of
/// the resulting month.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Period identifier ("YYYY-MM") for the month containing `date`.
pub fn month_id(date: NaiveDate) -> String {
    date.format(MONTH_ID_FORMAT).to_string()
}
