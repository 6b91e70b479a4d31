// Owner views: venues a manager owns with their reservations, and a
// customer's own bookings
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::api::HolidazeApi;
use crate::error::ApiError;
use crate::models::{Booking, Venue, VenueInput};
use crate::session::Session;
use crate::transport::Transport;

pub struct MyVenues<T: Transport> {
    api: Arc<HolidazeApi<T>>,
    venues: Vec<Venue>,
    // Reservations per venue id, sorted by start
    bookings: DashMap<String, Vec<Booking>>,
}

impl<T: Transport> MyVenues<T> {
    pub fn new(api: Arc<HolidazeApi<T>>) -> Self {
        Self {
            api,
            venues: Vec::new(),
            bookings: DashMap::new(),
        }
    }

    // Venues owned by the logged-in user
    pub async fn load(&mut self, session: &Session) -> Result<&[Venue], ApiError> {
        let venues = self.api.profile_venues(session, session.name()).await?;
        debug!(name = %session.name(), count = venues.len(), "loaded owned venues");

        self.bookings.retain(|id, _| venues.iter().any(|venue| &venue.id == id));
        self.venues = venues;
        Ok(&self.venues)
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    // Fetches the reservations of every owned venue concurrently.
    //
    // Fails as a whole if any venue fails; reservations already cached for
    // other venues are kept.
    pub async fn load_bookings(&self) -> Result<usize, ApiError> {
        let fetches = self
            .venues
            .iter()
            .map(|venue| self.api.get_venue(&venue.id, true));
        let loaded = try_join_all(fetches).await?;

        let mut total = 0;
        for venue in loaded {
            let mut bookings = venue.bookings.unwrap_or_default();
            bookings.sort_by_key(|booking| booking.date_from);
            total += bookings.len();
            self.bookings.insert(venue.id, bookings);
        }
        Ok(total)
    }

    pub fn bookings_for(&self, venue_id: &str) -> Vec<Booking> {
        self.bookings
            .get(venue_id)
            .map(|bookings| bookings.value().clone())
            .unwrap_or_default()
    }

    // Creates a venue, then reloads the owner list to pick it up
    pub async fn create(&mut self, session: &Session, input: &VenueInput) -> Result<Venue, ApiError> {
        let venue = self.api.create_venue(session, input).await?;
        self.venues.push(venue.clone());
        self.reload_after_write(session).await;
        Ok(venue)
    }

    // Saves edits to an owned venue, then reloads the owner list
    pub async fn update(
        &mut self,
        session: &Session,
        venue_id: &str,
        input: &VenueInput,
    ) -> Result<Venue, ApiError> {
        let venue = self.api.update_venue(session, venue_id, input).await?;
        if let Some(cached) = self.venues.iter_mut().find(|cached| cached.id == venue.id) {
            *cached = venue.clone();
        }
        self.reload_after_write(session).await;
        Ok(venue)
    }

    // Deletes an owned venue.
    //
    // A venue the server no longer knows is treated as already deleted.
    // Any other failure leaves the local list untouched so the caller can
    // reload to learn the real state.
    pub async fn delete(&mut self, session: &Session, venue_id: &str) -> Result<(), ApiError> {
        match self.api.delete_venue(session, venue_id).await {
            Ok(()) => {}
            Err(ApiError::NotFoundError(message)) => {
                warn!(venue = venue_id, "Venue already gone on server: {}", message);
            }
            Err(e) => return Err(e),
        }

        self.venues.retain(|venue| venue.id != venue_id);
        self.bookings.remove(venue_id);
        info!(venue = venue_id, "removed venue from owner list");
        Ok(())
    }

    // The write already succeeded; a failed reload keeps the local copy
    async fn reload_after_write(&mut self, session: &Session) {
        if let Err(e) = self.load(session).await {
            warn!(name = %session.name(), "Failed to reload venues after write: {}", e);
        }
    }
}

pub struct MyBookings<T: Transport> {
    api: Arc<HolidazeApi<T>>,
    bookings: Vec<Booking>,
}

impl<T: Transport> MyBookings<T> {
    pub fn new(api: Arc<HolidazeApi<T>>) -> Self {
        Self {
            api,
            bookings: Vec::new(),
        }
    }

    // The user's bookings with their venues, earliest first
    pub async fn load(&mut self, session: &Session) -> Result<&[Booking], ApiError> {
        let mut bookings = self.api.profile_bookings(session, session.name()).await?;
        bookings.sort_by_key(|booking| booking.date_from);
        self.bookings = bookings;
        Ok(&self.bookings)
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }
}
