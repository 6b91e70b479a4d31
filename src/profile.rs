// Profile synchronizer: keeps the cached session user in line with the server
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::HolidazeApi;
use crate::error::ApiError;
use crate::models::{LoginRequest, ProfileUpdate};
use crate::session::{Session, SessionStorage, SessionStore};
use crate::transport::Transport;

// Runs once per triggering event (login, profile edit, startup); never polls
pub struct ProfileSync<T: Transport> {
    api: Arc<HolidazeApi<T>>,
}

impl<T: Transport> ProfileSync<T> {
    pub fn new(api: Arc<HolidazeApi<T>>) -> Self {
        Self { api }
    }

    // Re-fetches the canonical profile and merges it over the session.
    //
    // Returns `Ok(None)` when nobody is logged in.
    pub async fn sync<S: SessionStorage>(
        &self,
        store: &mut SessionStore<S>,
    ) -> Result<Option<Session>, ApiError> {
        let Some(session) = store.current().cloned() else {
            return Ok(None);
        };

        let profile = self.api.get_profile(&session, session.name()).await?;
        let refreshed = store.refresh(profile).cloned();
        if let Some(session) = &refreshed {
            info!(
                name = %session.name(),
                venue_manager = session.is_venue_manager(),
                "synchronized profile"
            );
        }
        Ok(refreshed)
    }

    // Best-effort variant used at startup: failures are logged and the
    // cached session is left as it was
    pub async fn sync_in_background<S: SessionStorage>(&self, store: &mut SessionStore<S>) -> bool {
        match self.sync(store).await {
            Ok(refreshed) => refreshed.is_some(),
            Err(e) => {
                warn!("Error fetching user profile: {}", e);
                false
            }
        }
    }

    // Logs in, stores the session, then pulls the full profile
    pub async fn login<S: SessionStorage>(
        &self,
        store: &mut SessionStore<S>,
        request: &LoginRequest,
    ) -> Result<Session, ApiError> {
        let user = self.api.login(request).await?;
        let session = store.login(user).clone();

        match self.sync(store).await {
            Ok(Some(refreshed)) => Ok(refreshed),
            Ok(None) => Ok(session),
            Err(e) => {
                // The login itself succeeded; keep the session from the login response
                warn!("Error fetching user profile after login: {}", e);
                Ok(session)
            }
        }
    }

    // Saves profile edits and re-reads the canonical profile
    pub async fn update_profile<S: SessionStorage>(
        &self,
        store: &mut SessionStore<S>,
        update: &ProfileUpdate,
    ) -> Result<Session, ApiError> {
        let session = store.require()?.clone();
        self.api.update_profile(&session, update).await?;

        match self.sync(store).await? {
            Some(refreshed) => Ok(refreshed),
            None => Err(ApiError::AuthError("Session ended during profile update".to_string())),
        }
    }
}
