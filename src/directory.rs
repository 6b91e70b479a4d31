// Venue directory: the venue collection behind the list view
use std::sync::Arc;

use tracing::debug;

use crate::api::HolidazeApi;
use crate::error::ApiError;
use crate::models::Venue;
use crate::transport::Transport;

pub struct VenueDirectory<T: Transport> {
    api: Arc<HolidazeApi<T>>,
    venues: Vec<Venue>,
}

impl<T: Transport> VenueDirectory<T> {
    pub fn new(api: Arc<HolidazeApi<T>>) -> Self {
        Self {
            api,
            venues: Vec::new(),
        }
    }

    // Fetches the full collection, replacing whatever was cached.
    // On failure the previous collection is kept.
    pub async fn list(&mut self) -> Result<&[Venue], ApiError> {
        let venues = self.api.list_venues().await?;
        debug!(count = venues.len(), "loaded venue directory");
        self.venues = venues;
        Ok(&self.venues)
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    // Venues whose name or description contains `term`, ignoring case.
    //
    // Works on the last fetched collection only and keeps its order; an
    // empty term returns everything.
    pub fn filter(&self, term: &str) -> Vec<&Venue> {
        filter_venues(&self.venues, term)
    }

    pub fn get(&self, id: &str) -> Option<&Venue> {
        self.venues.iter().find(|venue| venue.id == id)
    }

    // Drops a venue from the cached collection
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.venues.len();
        self.venues.retain(|venue| venue.id != id);
        self.venues.len() != before
    }
}

pub fn filter_venues<'a>(venues: &'a [Venue], term: &str) -> Vec<&'a Venue> {
    if term.is_empty() {
        return venues.iter().collect();
    }
    venues.iter().filter(|venue| venue.matches(term)).collect()
}
