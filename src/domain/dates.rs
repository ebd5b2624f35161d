use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `date`.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + Duration::days(days)
}

/// The seven columns of the week view, Monday first.
pub fn week_dates(date: NaiveDate) -> [NaiveDate; 7] {
    let start = start_of_week(date);
    std::array::from_fn(|offset| start + Duration::days(offset as i64))
}

/// Calendar-date equality. Events are attributed to a column by the date of
/// their start time only; a block running past midnight still belongs to the
/// day it started.
pub fn is_same_date(left: NaiveDateTime, right: NaiveDateTime) -> bool {
    left.date() == right.date()
}
