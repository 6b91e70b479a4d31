// Typed client over the Holidaze venue, booking and profile endpoints
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError, DEFAULT_ERROR_MESSAGE};
use crate::models::{
    AuthenticatedUser, Booking, BookingRequest, Envelope, LoginRequest, Profile, ProfileUpdate,
    RegisterRequest, Venue, VenueInput,
};
use crate::session::Session;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

const VENUE_MANAGER_REQUIRED: &str = "You must be logged in as a venue manager to manage venues";

// Client for the remote API.
// Every call is a single attempt; after a failed write callers re-fetch to
// learn the server state instead of assuming nothing happened.
pub struct HolidazeApi<T = HttpTransport> {
    transport: T,
}

impl HolidazeApi<HttpTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> HolidazeApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    // Authentication

    pub async fn login(&self, request: &LoginRequest) -> Result<AuthenticatedUser, ApiError> {
        let body = to_body(request)?;
        let user = self
            .call(Method::Post, "/auth/login".to_string(), Some(body), None)
            .await
            .and_then(required)?;
        Ok(user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Profile, ApiError> {
        let body = to_body(request)?;
        let profile: Profile = self
            .call(Method::Post, "/auth/register".to_string(), Some(body), None)
            .await
            .and_then(required)?;
        info!(name = %profile.name, "registered profile");
        Ok(profile)
    }

    // Profiles

    pub async fn get_profile(&self, session: &Session, name: &str) -> Result<Profile, ApiError> {
        self.call(
            Method::Get,
            format!("/holidaze/profiles/{}", name),
            None,
            Some(session),
        )
        .await
        .and_then(required)
    }

    // Updates the profile of the session's own user
    pub async fn update_profile(
        &self,
        session: &Session,
        update: &ProfileUpdate,
    ) -> Result<Profile, ApiError> {
        let body = to_body(update)?;
        let profile: Profile = self
            .call(
                Method::Put,
                format!("/holidaze/profiles/{}", session.name()),
                Some(body),
                Some(session),
            )
            .await
            .and_then(required)?;
        info!(name = %profile.name, "updated profile");
        Ok(profile)
    }

    pub async fn profile_venues(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Vec<Venue>, ApiError> {
        let venues = self
            .call(
                Method::Get,
                format!("/holidaze/profiles/{}/venues", name),
                None,
                Some(session),
            )
            .await?;
        Ok(venues.unwrap_or_default())
    }

    // Bookings made by `name`, with nested venue and customer
    pub async fn profile_bookings(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Vec<Booking>, ApiError> {
        let bookings = self
            .call(
                Method::Get,
                format!(
                    "/holidaze/profiles/{}/bookings?_venue=true&_customer=true",
                    name
                ),
                None,
                Some(session),
            )
            .await?;
        Ok(bookings.unwrap_or_default())
    }

    // Venues

    pub async fn list_venues(&self) -> Result<Vec<Venue>, ApiError> {
        let venues = self
            .call(Method::Get, "/holidaze/venues".to_string(), None, None)
            .await?;
        Ok(venues.unwrap_or_default())
    }

    pub async fn get_venue(&self, id: &str, with_bookings: bool) -> Result<Venue, ApiError> {
        let path = if with_bookings {
            format!("/holidaze/venues/{}?_bookings=true", id)
        } else {
            format!("/holidaze/venues/{}", id)
        };
        self.call(Method::Get, path, None, None)
            .await
            .and_then(required)
    }

    pub async fn create_venue(
        &self,
        session: &Session,
        input: &VenueInput,
    ) -> Result<Venue, ApiError> {
        require_venue_manager(session)?;
        input.validate()?;

        let venue: Venue = self
            .call(
                Method::Post,
                "/holidaze/venues".to_string(),
                Some(to_body(input)?),
                Some(session),
            )
            .await
            .and_then(required)?;
        info!(id = %venue.id, name = %venue.name, "created venue");
        Ok(venue)
    }

    pub async fn update_venue(
        &self,
        session: &Session,
        id: &str,
        input: &VenueInput,
    ) -> Result<Venue, ApiError> {
        require_venue_manager(session)?;
        input.validate()?;

        let venue: Venue = self
            .call(
                Method::Put,
                format!("/holidaze/venues/{}", id),
                Some(to_body(input)?),
                Some(session),
            )
            .await
            .and_then(required)?;
        info!(id = %venue.id, "updated venue");
        Ok(venue)
    }

    // Bookings against the venue are left for the server to deal with
    pub async fn delete_venue(&self, session: &Session, id: &str) -> Result<(), ApiError> {
        require_venue_manager(session)?;

        self.call::<Value>(
            Method::Delete,
            format!("/holidaze/venues/{}", id),
            None,
            Some(session),
        )
        .await?;
        info!(id, "deleted venue");
        Ok(())
    }

    // Bookings

    pub async fn create_booking(
        &self,
        session: &Session,
        request: &BookingRequest,
    ) -> Result<Booking, ApiError> {
        let booking: Booking = self
            .call(
                Method::Post,
                "/holidaze/bookings".to_string(),
                Some(to_body(request)?),
                Some(session),
            )
            .await
            .and_then(required)?;
        info!(id = %booking.id, venue = %request.venue_id, "created booking");
        Ok(booking)
    }

    pub async fn list_bookings(&self, session: &Session) -> Result<Vec<Booking>, ApiError> {
        let bookings = self
            .call(
                Method::Get,
                "/holidaze/bookings".to_string(),
                None,
                Some(session),
            )
            .await?;
        Ok(bookings.unwrap_or_default())
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: String,
        body: Option<Value>,
        session: Option<&Session>,
    ) -> Result<Option<R>, ApiError> {
        let request = ApiRequest {
            method,
            path,
            body,
            token: session.map(|session| session.access_token.clone()),
        };
        let response = self.transport.send(request).await?;
        decode_response(response)
    }
}

// Turns a raw response into the envelope's data, or the matching error.
// A 204 (or any empty success body) yields None.
pub fn decode_response<R: DeserializeOwned>(response: ApiResponse) -> Result<Option<R>, ApiError> {
    if response.is_success() {
        if response.status == 204 || response.body.is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<R> = serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::FetchError(format!("Invalid response body: {}", e)))?;
        return Ok(envelope.data);
    }

    let message = serde_json::from_slice::<Envelope<Value>>(&response.body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map(|detail| detail.message)
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
    Err(ApiError::from_status(response.status, message))
}

fn required<R>(data: Option<R>) -> Result<R, ApiError> {
    data.ok_or_else(|| ApiError::FetchError("Invalid response from server".to_string()))
}

fn to_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::ValidationError(format!("Cannot encode request: {}", e)))
}

fn require_venue_manager(session: &Session) -> Result<(), ApiError> {
    if session.is_venue_manager() {
        Ok(())
    } else {
        Err(ApiError::AuthError(VENUE_MANAGER_REQUIRED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock_transport::{
        booking_json, profile_json, session, venue_json, MockTransport,
    };
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn setup() -> (Arc<MockTransport>, HolidazeApi<Arc<MockTransport>>) {
        let transport = Arc::new(MockTransport::new());
        let api = HolidazeApi::new(transport.clone());
        (transport, api)
    }

    fn venue_input() -> VenueInput {
        VenueInput {
            name: "Harbour Loft".to_string(),
            description: "Loft above the harbour".to_string(),
            price: 140.0,
            max_guests: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_no_content_and_errors() {
        let empty: Option<Value> = decode_response(ApiResponse {
            status: 204,
            body: Bytes::new(),
        })
        .unwrap();
        assert!(empty.is_none());

        let error = decode_response::<Value>(ApiResponse {
            status: 409,
            body: Bytes::from(r#"{"errors":[{"message":"Booking overlaps"},{"message":"second"}]}"#),
        })
        .unwrap_err();
        assert_eq!(error, ApiError::ValidationError("Booking overlaps".to_string()));

        let unreadable = decode_response::<Value>(ApiResponse {
            status: 502,
            body: Bytes::from("<html>Bad gateway</html>"),
        })
        .unwrap_err();
        assert_eq!(unreadable, ApiError::FetchError(DEFAULT_ERROR_MESSAGE.to_string()));

        let garbage = decode_response::<Venue>(ApiResponse {
            status: 200,
            body: Bytes::from("not json"),
        });
        assert!(matches!(garbage, Err(ApiError::FetchError(_))));
    }

    #[tokio::test]
    async fn test_list_venues() {
        let (transport, api) = setup();
        transport.respond_data(
            Method::Get,
            "/holidaze/venues",
            json!([
                venue_json("v1", "Cabin", "Woods", 4),
                venue_json("v2", "Loft", "City", 2)
            ]),
        );

        let venues = api.list_venues().await.unwrap();
        assert_eq!(venues.len(), 2);
        assert_eq!(venues[1].name, "Loft");

        let request = &transport.requests()[0];
        assert_eq!(request.token, None);
        assert_eq!(request.body, None);
    }

    #[tokio::test]
    async fn test_get_venue_with_bookings() {
        let (transport, api) = setup();
        let mut venue = venue_json("v1", "Cabin", "Woods", 4);
        venue["bookings"] = json!([booking_json("b1", "2024-06-10", "2024-06-15", 2)]);
        transport.respond_data(Method::Get, "/holidaze/venues/v1?_bookings=true", venue);

        let venue = api.get_venue("v1", true).await.unwrap();
        assert_eq!(venue.bookings.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_venue_is_not_found() {
        let (transport, api) = setup();
        transport.respond_error(Method::Get, "/holidaze/venues/nope", 404, "No venue with such ID");

        let error = api.get_venue("nope", false).await.unwrap_err();
        assert_eq!(error, ApiError::NotFoundError("No venue with such ID".to_string()));
    }

    #[tokio::test]
    async fn test_create_venue_requires_venue_manager() {
        let (transport, api) = setup();
        let guest = session("guest", false);

        let result = api.create_venue(&guest, &venue_input()).await;
        assert!(matches!(result, Err(ApiError::AuthError(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_venue_validates_before_sending() {
        let (transport, api) = setup();
        let manager = session("host", true);
        let input = VenueInput {
            max_guests: 0,
            ..venue_input()
        };

        let result = api.create_venue(&manager, &input).await;
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_venue_sends_token_and_body() {
        let (transport, api) = setup();
        let manager = session("host", true);
        transport.respond(
            Method::Post,
            "/holidaze/venues",
            201,
            json!({ "data": venue_json("new-id", "Harbour Loft", "Loft above the harbour", 3) }),
        );

        let venue = assert_ok!(api.create_venue(&manager, &venue_input()).await);
        assert_eq!(venue.id, "new-id");

        let request = &transport.requests()[0];
        assert_eq!(request.token.as_deref(), Some("token-host"));
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["maxGuests"], 3);
        assert_eq!(body["name"], "Harbour Loft");
    }

    #[tokio::test]
    async fn test_create_venue_without_data_is_fetch_error() {
        let (transport, api) = setup();
        transport.respond(Method::Post, "/holidaze/venues", 201, json!({ "meta": {} }));

        let result = api.create_venue(&session("host", true), &venue_input()).await;
        assert!(matches!(result, Err(ApiError::FetchError(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete_venue() {
        let (transport, api) = setup();
        let manager = session("host", true);
        transport.respond_data(
            Method::Put,
            "/holidaze/venues/v1",
            venue_json("v1", "Harbour Loft", "Renovated", 3),
        );
        transport.respond_no_content(Method::Delete, "/holidaze/venues/v1");
        transport.respond_error(Method::Delete, "/holidaze/venues/v2", 403, "Not the owner");

        let updated = api.update_venue(&manager, "v1", &venue_input()).await.unwrap();
        assert_eq!(updated.description, "Renovated");

        assert_ok!(api.delete_venue(&manager, "v1").await);
        let error = assert_err!(api.delete_venue(&manager, "v2").await);
        assert_eq!(error, ApiError::AuthError("Not the owner".to_string()));
    }

    #[tokio::test]
    async fn test_create_booking_surfaces_server_message() {
        let (transport, api) = setup();
        transport.respond_error(
            Method::Post,
            "/holidaze/bookings",
            400,
            "The venue is already booked for the selected dates",
        );

        let request = BookingRequest {
            date_from: "2024-06-16T00:00:00Z".parse().unwrap(),
            date_to: "2024-06-18T00:00:00Z".parse().unwrap(),
            guests: 2,
            venue_id: "v1".to_string(),
        };
        let error = api
            .create_booking(&session("guest", false), &request)
            .await
            .unwrap_err();
        assert_eq!(
            error.message(),
            "The venue is already booked for the selected dates"
        );
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_profile_endpoints() {
        let (transport, api) = setup();
        let user = session("kari", false);
        transport.respond_data(Method::Get, "/holidaze/profiles/kari", profile_json("kari", true));
        transport.respond_data(
            Method::Put,
            "/holidaze/profiles/kari",
            profile_json("kari", true),
        );
        transport.respond_data(
            Method::Get,
            "/holidaze/profiles/kari/bookings?_venue=true&_customer=true",
            json!([booking_json("b1", "2024-06-10", "2024-06-12", 1)]),
        );
        transport.respond_data(
            Method::Get,
            "/holidaze/profiles/kari/venues",
            json!([venue_json("v1", "Cabin", "Woods", 4)]),
        );

        let profile = api.get_profile(&user, "kari").await.unwrap();
        assert!(profile.venue_manager);

        let update = ProfileUpdate {
            bio: Some("Hello".to_string()),
            ..Default::default()
        };
        assert_ok!(api.update_profile(&user, &update).await);
        let sent = transport.requests()[1].body.clone().unwrap();
        assert_eq!(sent, json!({ "bio": "Hello" }));

        assert_eq!(api.profile_bookings(&user, "kari").await.unwrap().len(), 1);
        assert_eq!(api.profile_venues(&user, "kari").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_and_register() {
        let (transport, api) = setup();
        let mut login_data = profile_json("kari", false);
        login_data["accessToken"] = json!("secret-token");
        transport.respond_data(Method::Post, "/auth/login", login_data);
        transport.respond(
            Method::Post,
            "/auth/register",
            201,
            json!({ "data": profile_json("ola", true) }),
        );

        let user = api
            .login(&LoginRequest {
                email: "kari@stud.noroff.no".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.access_token, "secret-token");
        assert_eq!(transport.requests()[0].token, None);

        let profile = api
            .register(&RegisterRequest {
                name: "ola".to_string(),
                email: "ola@stud.noroff.no".to_string(),
                password: "hunter22".to_string(),
                bio: None,
                avatar: None,
                venue_manager: Some(true),
            })
            .await
            .unwrap();
        assert!(profile.venue_manager);
        assert_eq!(
            transport.requests()[1].body.as_ref().unwrap()["venueManager"],
            true
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_fetch_error() {
        let (transport, api) = setup();
        transport.fail(
            Method::Get,
            "/holidaze/venues",
            ApiError::FetchError("connection reset".to_string()),
        );

        let error = api.list_venues().await.unwrap_err();
        assert_eq!(error, ApiError::FetchError("connection reset".to_string()));
    }

    #[tokio::test]
    async fn test_list_bookings_requires_token() {
        let (transport, api) = setup();
        transport.respond_error(Method::Get, "/holidaze/bookings", 401, "Missing authorization header");
        transport.respond_data(Method::Get, "/holidaze/bookings", json!([]));

        let error = api.list_bookings(&session("kari", false)).await.unwrap_err();
        assert!(matches!(error, ApiError::AuthError(_)));
        assert!(api.list_bookings(&session("kari", false)).await.unwrap().is_empty());
    }
}
