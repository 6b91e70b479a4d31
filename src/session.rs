// Session store: the authenticated identity of the running client
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{ApiError, ClientError};
use crate::models::{AuthenticatedUser, Profile};

// Keys of the two persisted values; absence of either means logged out
pub const USER_DATA_KEY: &str = "userData";
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Profile,
    pub access_token: String,
}

impl Session {
    pub fn name(&self) -> &str {
        &self.user.name
    }

    // Cached flag; the server still enforces the real authorization
    pub fn is_venue_manager(&self) -> bool {
        self.user.venue_manager
    }
}

// Durable key-value storage surviving restarts
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove(&self, key: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// Key-value storage backed by a single JSON object on disk.
//
// The whole map is rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let values = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Ignoring unreadable session file: {}", e);
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &HashMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(values)
            .map_err(|e| ClientError::StorageError(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut values = self.values.lock();
        values.remove(key);
        self.flush(&values)
    }
}

// Owned, single-writer session context.
//
// State changes only through `login`, `logout` and `refresh`, which take
// `&mut self`; screens read the current session through shared borrows.
// Persisting is best effort: a failed write is logged and the in-memory
// session stays authoritative for the running process.
pub struct SessionStore<S = FileStorage> {
    storage: S,
    current: Option<Session>,
}

impl<S: SessionStorage> SessionStore<S> {
    // Restores the persisted session; both values must be present and readable
    pub fn restore(storage: S) -> Self {
        let current = match (storage.get(USER_DATA_KEY), storage.get(ACCESS_TOKEN_KEY)) {
            (Some(user_data), Some(access_token)) => {
                match serde_json::from_str::<Profile>(&user_data) {
                    Ok(user) => Some(Session { user, access_token }),
                    Err(e) => {
                        warn!("Discarding unreadable persisted user data: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        if let Some(session) = &current {
            info!(name = %session.name(), "restored session");
        }

        Self { storage, current }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    // The session, or an authorization failure for actions that need one
    pub fn require(&self) -> Result<&Session, ApiError> {
        self.current
            .as_ref()
            .ok_or_else(|| ApiError::AuthError("You must be logged in".to_string()))
    }

    pub fn login(&mut self, user: AuthenticatedUser) -> &Session {
        let session = Session {
            user: user.profile,
            access_token: user.access_token,
        };
        info!(name = %session.name(), "logged in");

        self.persist_user(&session.user);
        if let Err(e) = self.storage.set(ACCESS_TOKEN_KEY, &session.access_token) {
            warn!("Failed to persist access token: {}", e);
        }

        self.current.insert(session)
    }

    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            info!(name = %session.name(), "logged out");
        }
        for key in [ACCESS_TOKEN_KEY, USER_DATA_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to clear {}: {}", key, e);
            }
        }
    }

    // Merges a freshly fetched profile over the cached user.
    // Does nothing when logged out.
    pub fn refresh(&mut self, profile: Profile) -> Option<&Session> {
        let session = self.current.as_mut()?;
        session.user.merge_from(profile);
        let user = session.user.clone();
        self.persist_user(&user);
        self.current.as_ref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist_user(&self, user: &Profile) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(USER_DATA_KEY, &raw) {
                    warn!("Failed to persist user data: {}", e);
                }
            }
            Err(e) => warn!("Failed to encode user data: {}", e),
        }
    }
}
