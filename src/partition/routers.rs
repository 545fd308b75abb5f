//! Daily slice generation

use super::types::{DateSlice, StreamCursor};
use chrono::{Days, NaiveDate};
use tracing::debug;

/// Inputs that decide which days a stream reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlicePlan {
    /// Configured first day
    pub start_date: NaiveDate,
    /// Configured last day, if bounded
    pub end_date: Option<NaiveDate>,
    /// Days re-read behind the cursor; `None` for streams without lookback
    pub lookback_days: Option<u32>,
}

impl SlicePlan {
    /// Create a plan without lookback
    pub fn new(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            lookback_days: None,
        }
    }

    /// Re-read `days` days behind the cursor on resumed runs
    #[must_use]
    pub fn with_lookback(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    /// Last day to read given today's date
    pub fn effective_end(&self, today: NaiveDate) -> NaiveDate {
        match self.end_date {
            Some(end) => end.min(today),
            None => today,
        }
    }

    /// First day to read given an optional persisted cursor
    pub fn effective_start(&self, cursor: Option<StreamCursor>) -> NaiveDate {
        let Some(cursor) = cursor else {
            return self.start_date;
        };

        match self.lookback_days {
            None => cursor.date(),
            Some(days) => cursor
                .date()
                .checked_sub_days(Days::new(u64::from(days)))
                .map_or(self.start_date, |rewound| rewound.max(self.start_date)),
        }
    }

    /// Ascending daily slices from the effective start through the effective end
    pub fn slices(&self, cursor: Option<StreamCursor>, today: NaiveDate) -> DailySlices {
        let start = self.effective_start(cursor);
        let end = self.effective_end(today);
        debug!(%start, %end, cursor = ?cursor.map(|c| c.to_string()), "Planned daily slices");
        DailySlices::new(start, end)
    }
}

/// Iterator over every day in an inclusive range
#[derive(Debug, Clone)]
pub struct DailySlices {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DailySlices {
    /// Days from `start` through `end`, empty when `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl Iterator for DailySlices {
    type Item = DateSlice;

    fn next(&mut self) -> Option<DateSlice> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|day| *day <= self.end);
        Some(DateSlice::new(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map_or(0, |day| (self.end - day).num_days() as usize + 1);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailySlices {}
