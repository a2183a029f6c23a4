#![allow(dead_code)]
use chrono::NaiveDate;

/// One contiguous run of days inside a single month of the operating
/// calendar, stored as (year, month, start_day, end_day).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSegment {
    year: i32,
    month: u32,
    start_day: u32,
    end_day: u32,
}

impl DateSegment {
    pub fn new(year: i32, month: u32, start_day: u32, end_day: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("month must be between 1 and 12, got {}", month));
        }

        if start_day > end_day {
            return Err(format!(
                "start_day {} is after end_day {}",
                start_day, end_day
            ));
        }

        if NaiveDate::from_ymd_opt(year, month, start_day).is_none()
            || NaiveDate::from_ymd_opt(year, month, end_day).is_none()
        {
            return Err(format!(
                "days {}..{} do not all exist in {}-{}",
                start_day, end_day, year, month
            ));
        }

        Ok(DateSegment {
            year,
            month,
            start_day,
            end_day,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn start_day(&self) -> u32 {
        self.start_day
    }

    pub fn end_day(&self) -> u32 {
        self.end_day
    }

    pub fn as_tuple(&self) -> (i32, u32, u32, u32) {
        (self.year, self.month, self.start_day, self.end_day)
    }

    /// Number of days dispatched for this segment, both ends inclusive
    pub fn day_count(&self) -> u32 {
        self.end_day - self.start_day + 1
    }

    pub fn days(&self) -> SegmentDays {
        SegmentDays {
            next: NaiveDate::from_ymd_opt(self.year, self.month, self.start_day),
            last: NaiveDate::from_ymd_opt(self.year, self.month, self.end_day),
        }
    }
}

/// Iterator over the calendar days of a segment, in order
pub struct SegmentDays {
    next: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl Iterator for SegmentDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current > self.last? {
            return None;
        }
        self.next = current.succ_opt();
        Some(current)
    }
}

/// The ordered date-range table defining the operating calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTable {
    segments: Vec<DateSegment>,
}

impl DateTable {
    pub fn new(segments: Vec<DateSegment>) -> Self {
        DateTable { segments }
    }

    pub fn segment(&self, index: usize) -> Option<&DateSegment> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DateSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn total_days(&self) -> u32 {
        self.segments.iter().map(|s| s.day_count()).sum()
    }
}

// The 2019-2020 physics run: four month-segments between November 2019
// and February 2020.
impl Default for DateTable {
    fn default() -> Self {
        let segments = [
            (2019, 11, 7, 30),
            (2019, 12, 1, 19),
            (2020, 1, 14, 31),
            (2020, 2, 1, 12),
        ]
        .into_iter()
        .map(|(year, month, start_day, end_day)| {
            DateSegment::new(year, month, start_day, end_day)
                .unwrap_or_else(|e| panic!("invalid built-in date segment: {}", e))
        })
        .collect();

        DateTable::new(segments)
    }
}
