// Data structures exchanged with the Holidaze API
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::DayRange;
use crate::error::ApiError;

// Response envelope wrapping every JSON body
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Media {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Media {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: None,
        }
    }
}

// Amenity flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VenueMeta {
    pub wifi: bool,
    pub parking: bool,
    pub breakfast: bool,
    pub pets: bool,
}

impl VenueMeta {
    pub fn amenities(&self) -> Vec<&'static str> {
        [
            (self.wifi, "WiFi"),
            (self.parking, "Parking"),
            (self.breakfast, "Breakfast"),
            (self.pets, "Pets allowed"),
        ]
        .into_iter()
        .filter_map(|(enabled, label)| enabled.then_some(label))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub continent: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileCount {
    pub venues: u32,
    pub bookings: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    #[serde(default)]
    pub venue_manager: bool,
    #[serde(rename = "_count", default, skip_serializing_if = "Option::is_none")]
    pub count: Option<ProfileCount>,
}

impl Profile {
    // Merges the canonical server profile over this cached copy.
    //
    // Server fields win, including a cleared bio or avatar. The venue
    // manager flag is always taken from the server. Values the profile
    // endpoint did not send (an empty email, missing counts) keep the
    // cached value.
    pub fn merge_from(&mut self, server: Profile) {
        if !server.name.is_empty() {
            self.name = server.name;
        }
        if !server.email.is_empty() {
            self.email = server.email;
        }
        self.bio = server.bio;
        self.avatar = server.avatar;
        self.banner = server.banner;
        self.venue_manager = server.venue_manager;
        if server.count.is_some() {
            self.count = server.count;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media: Vec<Media>,
    pub price: f64,
    pub max_guests: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: VenueMeta,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub owner: Option<Profile>,
    // Only present when fetched with _bookings=true
    #[serde(default)]
    pub bookings: Option<Vec<Booking>>,
}

impl Venue {
    // Case-insensitive substring match over name and description
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }

    pub fn cover(&self) -> Option<&Media> {
        self.media.first()
    }

    pub fn is_owned_by(&self, name: &str) -> bool {
        self.owner.as_ref().is_some_and(|owner| owner.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub guests: u32,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub venue: Option<Box<Venue>>,
    #[serde(default)]
    pub customer: Option<Profile>,
}

impl Booking {
    // Calendar days covered by the booking, read in UTC
    pub fn days(&self) -> DayRange {
        self.days_in(&Utc)
    }

    // Calendar days covered by the booking as seen from `tz`
    pub fn days_in<Tz: TimeZone>(&self, tz: &Tz) -> DayRange {
        DayRange::new(
            self.date_from.with_timezone(tz).date_naive(),
            self.date_to.with_timezone(tz).date_naive(),
        )
    }
}

// Login response: the profile plus its bearer token
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub profile: Profile,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_manager: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_manager: Option<bool>,
}

// Payload for creating or updating a venue
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueInput {
    pub name: String,
    pub description: String,
    pub media: Vec<Media>,
    pub price: f64,
    pub max_guests: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub meta: VenueMeta,
    pub location: Location,
}

impl VenueInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            missing.push("price");
        }
        if self.max_guests == 0 {
            missing.push("maxGuests");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(format!(
                "Missing or invalid required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl From<&Venue> for VenueInput {
    fn from(venue: &Venue) -> Self {
        Self {
            name: venue.name.clone(),
            description: venue.description.clone(),
            media: venue.media.clone(),
            price: venue.price,
            max_guests: venue.max_guests,
            rating: Some(venue.rating),
            meta: venue.meta,
            location: venue.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub guests: u32,
    pub venue_id: String,
}

impl BookingRequest {
    // Both days are sent as midnight UTC
    pub fn for_days(venue_id: impl Into<String>, days: DayRange, guests: u32) -> Self {
        Self::for_days_in(venue_id, days, guests, &Utc.fix())
    }

    // Both days are sent as local midnight in `offset`, so reading the
    // booking back in the same offset yields the same days
    pub fn for_days_in(
        venue_id: impl Into<String>,
        days: DayRange,
        guests: u32,
        offset: &FixedOffset,
    ) -> Self {
        Self {
            date_from: local_midnight(days.start, offset),
            date_to: local_midnight(days.end, offset),
            guests,
            venue_id: venue_id.into(),
        }
    }
}

fn local_midnight(date: NaiveDate, offset: &FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset.local_minus_utc()))))
}
