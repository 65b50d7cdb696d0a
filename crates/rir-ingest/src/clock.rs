//! Source of "today" for the dated fallback URLs

use chrono::{Local, NaiveDate};

/// Calendar date provider
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local process clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date, for tests and reruns of a past day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
