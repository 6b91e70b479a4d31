// Client library for the Holidaze venue booking service

// Export modules
pub mod api;
pub mod availability;
pub mod booking;
pub mod config;
pub mod directory;
pub mod error;
pub mod manage;
pub mod models;
pub mod profile;
pub mod session;
pub mod transport;

// Re-export key types for convenience
pub use api::HolidazeApi;
pub use availability::{AvailabilityCalendar, DayRange, StayCandidate, ValidatedStay};
pub use booking::VenueBookingView;
pub use config::ClientConfig;
pub use directory::{filter_venues, VenueDirectory};
pub use error::{ApiError, ClientError};
pub use manage::{MyBookings, MyVenues};
pub use models::{
    AuthenticatedUser, Booking, BookingRequest, LoginRequest, Media, Profile, ProfileUpdate,
    RegisterRequest, Venue, VenueInput, VenueMeta,
};
pub use profile::ProfileSync;
pub use session::{FileStorage, MemoryStorage, Session, SessionStorage, SessionStore};
pub use transport::{HttpTransport, Transport};
