// Booking availability engine
//
// Pure validation over the bookings of one venue. Every comparison happens on
// calendar days; timestamps are truncated to a date before they get here.

use chrono::{FixedOffset, NaiveDate, TimeZone};

use crate::error::ApiError;
use crate::models::{Booking, BookingRequest};

// An inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    // Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    // Every day from start to end inclusive; empty when end < start
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |day| day.succ_opt())
            .take_while(move |day| *day <= end)
    }
}

// Booked day ranges of a single venue, indexed for per-day lookups.
//
// Ranges are kept sorted by start day together with a running maximum of
// their end days, so `is_date_booked` is a binary search instead of a scan
// over every booking. Calendars render dozens of cells per month and call it
// once per cell.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityCalendar {
    ranges: Vec<DayRange>,
    // max_end[i] is the latest end day among ranges[..=i]
    max_end: Vec<NaiveDate>,
}

impl AvailabilityCalendar {
    pub fn new(ranges: impl IntoIterator<Item = DayRange>) -> Self {
        let mut ranges: Vec<DayRange> = ranges.into_iter().collect();
        ranges.sort();

        let mut max_end = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let latest = match max_end.last() {
                Some(previous) if *previous > range.end => *previous,
                _ => range.end,
            };
            max_end.push(latest);
        }

        Self { ranges, max_end }
    }

    pub fn from_bookings(bookings: &[Booking]) -> Self {
        Self::new(bookings.iter().map(Booking::days))
    }

    pub fn from_bookings_in<Tz: TimeZone>(bookings: &[Booking], tz: &Tz) -> Self {
        Self::new(bookings.iter().map(|booking| booking.days_in(tz)))
    }

    pub fn insert(&mut self, range: DayRange) {
        let mut ranges = std::mem::take(&mut self.ranges);
        ranges.push(range);
        *self = Self::new(ranges);
    }

    pub fn ranges(&self) -> &[DayRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    // True when `date` falls inside any booking, both ends included.
    pub fn is_date_booked(&self, date: NaiveDate) -> bool {
        // Ranges starting after `date` cannot contain it
        let candidates = self.ranges.partition_point(|range| range.start <= date);
        candidates > 0 && self.max_end[candidates - 1] >= date
    }

    // True only when both bounds are present and every day from `start` to
    // `end` inclusive is free.
    //
    // A stay that begins on another booking's last day is a conflict: there
    // is no same-day turnover.
    pub fn is_range_valid(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
        match (start, end) {
            (Some(start), Some(end)) => DayRange::new(start, end)
                .days()
                .all(|day| !self.is_date_booked(day)),
            _ => false,
        }
    }

    // Booked days inside a window, for rendering a calendar page
    pub fn blocked_days(&self, window: DayRange) -> Vec<NaiveDate> {
        window.days().filter(|day| self.is_date_booked(*day)).collect()
    }

    // Existing bookings that collide with the stay
    pub fn conflicts(&self, stay: DayRange) -> Vec<DayRange> {
        self.ranges
            .iter()
            .filter(|range| range.overlaps(&stay))
            .copied()
            .collect()
    }

    // Checks every submission precondition that does not need the network.
    pub fn validate(
        &self,
        candidate: &StayCandidate,
        max_guests: u32,
    ) -> Result<ValidatedStay, ApiError> {
        let (start, end) = match (candidate.start, candidate.end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(ApiError::ValidationError(
                    "Select both a check-in and a check-out date".to_string(),
                ))
            }
        };

        if end < start {
            return Err(ApiError::ValidationError(
                "Check-out date cannot be before check-in date".to_string(),
            ));
        }

        if candidate.guests == 0 || candidate.guests > max_guests {
            return Err(ApiError::ValidationError(format!(
                "Number of guests must be between 1 and {}",
                max_guests
            )));
        }

        if !self.is_range_valid(Some(start), Some(end)) {
            let stay = DayRange::new(start, end);
            let first = self.conflicts(stay).into_iter().next();
            let message = match first {
                Some(range) => format!(
                    "The selected dates overlap an existing booking from {} to {}",
                    range.start, range.end
                ),
                None => "The selected dates overlap an existing booking".to_string(),
            };
            return Err(ApiError::ValidationError(message));
        }

        Ok(ValidatedStay {
            days: DayRange::new(start, end),
            guests: candidate.guests,
        })
    }
}

// The stay a user is assembling on the venue page.
//
// `end` stays empty while the user is mid-selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayCandidate {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub guests: u32,
}

impl Default for StayCandidate {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            guests: 1,
        }
    }
}

impl StayCandidate {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>, guests: u32) -> Self {
        Self {
            start: Some(start),
            end,
            guests,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn clear_dates(&mut self) {
        self.start = None;
        self.end = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedStay {
    pub days: DayRange,
    pub guests: u32,
}

impl ValidatedStay {
    pub fn nights(&self) -> i64 {
        (self.days.end - self.days.start).num_days()
    }

    // A single-day stay is charged as one night
    pub fn quote(&self, price_per_night: f64) -> f64 {
        price_per_night * self.nights().max(1) as f64
    }

    pub fn to_request(&self, venue_id: impl Into<String>) -> BookingRequest {
        BookingRequest::for_days(venue_id, self.days, self.guests)
    }

    // Request whose timestamps land on the stay's days as seen from `offset`
    pub fn to_request_in(&self, venue_id: impl Into<String>, offset: &FixedOffset) -> BookingRequest {
        BookingRequest::for_days_in(venue_id, self.days, self.guests, offset)
    }
}
