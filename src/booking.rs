// Venue detail and booking flow
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use tracing::{info, warn};

use crate::api::HolidazeApi;
use crate::availability::{AvailabilityCalendar, StayCandidate, ValidatedStay};
use crate::error::ApiError;
use crate::models::{Booking, Venue};
use crate::session::Session;
use crate::transport::Transport;

// State behind the venue detail screen: the venue, its booked days and the
// stay the user is selecting.
pub struct VenueBookingView<T: Transport> {
    api: Arc<HolidazeApi<T>>,
    venue_id: String,
    venue: Option<Venue>,
    calendar: AvailabilityCalendar,
    candidate: StayCandidate,
    // Zone used to turn booking timestamps into calendar days
    time_zone: FixedOffset,
}

impl<T: Transport> VenueBookingView<T> {
    pub fn new(api: Arc<HolidazeApi<T>>, venue_id: impl Into<String>) -> Self {
        Self {
            api,
            venue_id: venue_id.into(),
            venue: None,
            calendar: AvailabilityCalendar::default(),
            candidate: StayCandidate::default(),
            time_zone: Utc.fix(),
        }
    }

    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    // Loads the venue with its bookings and rebuilds the calendar
    pub async fn load(&mut self) -> Result<&Venue, ApiError> {
        let venue = self.api.get_venue(&self.venue_id, true).await?;
        let bookings = venue.bookings.as_deref().unwrap_or_default();
        self.calendar = AvailabilityCalendar::from_bookings_in(bookings, &self.time_zone);
        Ok(self.venue.insert(venue))
    }

    pub fn venue_id(&self) -> &str {
        &self.venue_id
    }

    pub fn venue(&self) -> Option<&Venue> {
        self.venue.as_ref()
    }

    pub fn calendar(&self) -> &AvailabilityCalendar {
        &self.calendar
    }

    pub fn candidate(&self) -> &StayCandidate {
        &self.candidate
    }

    // Per-cell check for the calendar widget
    pub fn is_date_booked(&self, date: NaiveDate) -> bool {
        self.calendar.is_date_booked(date)
    }

    pub fn select_dates(&mut self, start: NaiveDate, end: Option<NaiveDate>) {
        self.candidate.start = Some(start);
        self.candidate.end = end;
    }

    pub fn set_guests(&mut self, guests: u32) {
        self.candidate.guests = guests;
    }

    pub fn clear_selection(&mut self) {
        self.candidate.clear_dates();
    }

    // Validates the current selection without touching the network
    pub fn check(&self, session: Option<&Session>) -> Result<ValidatedStay, ApiError> {
        login_required(session)?;
        self.validate_stay()
    }

    // Drives the enabled state of the "Book now" button
    pub fn can_submit(&self, session: Option<&Session>) -> bool {
        self.check(session).is_ok()
    }

    // Submits the selected stay.
    //
    // Preconditions are checked first, so an invalid selection never reaches
    // the server. After a confirmed booking the venue is reloaded to pick up
    // the new reservation and the selection is cleared. A rejection is
    // returned with the server's message and the selection is kept.
    pub async fn submit(&mut self, session: Option<&Session>) -> Result<Booking, ApiError> {
        let session = login_required(session)?;
        let stay = self.validate_stay()?;

        let request = stay.to_request_in(self.venue_id.clone(), &self.time_zone);
        let booking = self.api.create_booking(session, &request).await?;
        info!(venue = %self.venue_id, booking = %booking.id, "booking confirmed");

        // Invalidate and reload; the new stay is blocked locally even if the
        // reload fails
        self.calendar.insert(stay.days);
        self.clear_selection();
        if let Err(e) = self.load().await {
            warn!(venue = %self.venue_id, "Failed to reload venue after booking: {}", e);
        }

        Ok(booking)
    }

    fn validate_stay(&self) -> Result<ValidatedStay, ApiError> {
        let venue = self.venue.as_ref().ok_or_else(|| {
            ApiError::ValidationError("Venue details are not loaded".to_string())
        })?;
        self.calendar.validate(&self.candidate, venue.max_guests)
    }
}

fn login_required(session: Option<&Session>) -> Result<&Session, ApiError> {
    session.ok_or_else(|| ApiError::AuthError("You must be logged in to book a venue".to_string()))
}
