use chrono::{NaiveDate, TimeDelta};
use std::mem::replace;

/// A date range iterator that yields each date from the start date
/// through the end date (inclusive).
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.0 <= *date && *date <= self.1
    }
}

impl From<(NaiveDate, NaiveDate)> for DateRange {
    fn from((start, end): (NaiveDate, NaiveDate)) -> Self {
        DateRange(start, end)
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}
