use std::fmt;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::query::{set, Fragment};

/// A period that cannot be constructed or split.
///
/// From `split` this means the period does not span at least two days; outside
/// of caller misuse it signals that a single-day query was still rejected as
/// too complex by the analytics provider, leaving the adaptive retry with no
/// narrower window to fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid period [{start}, {end}]")]
pub struct InvalidPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive calendar date range over which metrics are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidPeriod> {
        if start > end {
            return Err(InvalidPeriod { start, end });
        }
        Ok(Period { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Halve the period into two contiguous inclusive sub-periods.
    ///
    /// The day count is divided by two with the remainder going to the first
    /// half, so the union of the halves is exactly the original period with
    /// no gap or overlap. A single-day period cannot be split.
    pub fn split(&self) -> Result<(Period, Period), InvalidPeriod> {
        if self.start >= self.end {
            return Err(InvalidPeriod { start: self.start, end: self.end });
        }

        let mid = self.start + Duration::days((self.end - self.start).num_days() / 2);
        let first = Period { start: self.start, end: mid };
        let second = Period { start: mid + Duration::days(1), end: self.end };
        Ok((first, second))
    }

    /// Query fragment selecting this period, in the provider's wire format.
    pub fn as_fragment(&self) -> Fragment {
        vec![set("date1", self.start), set("date2", self.end)]
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NaiveDate displays as YYYY-MM-DD, same as the wire format
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
