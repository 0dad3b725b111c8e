//! The session store: current user plus access/refresh tokens, held in
//! memory and mirrored into a `KeyValueStore`.
//!
//! Memory is authoritative. Each mutation assigns the in-memory session
//! first and then brings the mirror in line; if the mirror write fails the
//! error is logged and returned, and memory keeps the new value.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{SessionError, StorageError};
use crate::storage::KeyValueStore;

/// Mirror key holding the JSON-encoded user
pub const USER_KEY: &str = "user";

/// Mirror key holding the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Mirror key holding the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Keys in the order they are written on login
const MIRROR_KEYS: [&str; 3] = [USER_KEY, REFRESH_TOKEN_KEY, ACCESS_TOKEN_KEY];

/// A logged-in session. All three parts are always present together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session<U = Value> {
    pub user: U,
    pub access_token: String,
    pub refresh_token: String,
}

impl<U> Session<U> {
    pub fn new(user: U, access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            user,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedIn,
    LoggedOut,
}

/// What the mirror held at startup
enum Mirror<U> {
    Empty,
    Complete(Session<U>),
    /// Some keys present, some missing
    Partial,
}

pub struct SessionStore<S, U = Value> {
    storage: S,
    session: Option<Session<U>>,
}

impl<S, U> SessionStore<S, U>
where
    S: KeyValueStore,
    U: Serialize + DeserializeOwned,
{
    /// Hydrate a store from whatever the mirror currently holds.
    ///
    /// Missing keys mean logged out. A mirror holding only some of the keys
    /// is purged and also treated as logged out. A `user` value that does
    /// not parse fails with `SessionError::MalformedUser`.
    pub fn open(storage: S) -> Result<Self, SessionError> {
        let mut store = Self {
            storage,
            session: None,
        };
        store.hydrate()?;
        Ok(store)
    }

    /// Like `open`, but an unreadable mirror (malformed persisted user or a
    /// corrupt backing file) is cleared and the store starts logged out.
    pub fn open_or_reset(storage: S) -> Result<Self, SessionError> {
        let mut store = Self {
            storage,
            session: None,
        };
        match store.hydrate() {
            Ok(()) => {}
            Err(e) if e.is_unreadable() => {
                warn!(error = %e, "Discarding unreadable persisted session");
                clear_mirror(&mut store.storage)?;
            }
            Err(e) => return Err(e),
        }
        Ok(store)
    }

    fn hydrate(&mut self) -> Result<(), SessionError> {
        match read_mirror(&self.storage)? {
            Mirror::Empty => {
                debug!("No persisted session found");
            }
            Mirror::Complete(session) => {
                debug!("Persisted session loaded");
                self.session = Some(session);
            }
            Mirror::Partial => {
                warn!("Persisted session is incomplete, clearing it");
                clear_mirror(&mut self.storage)?;
            }
        }
        Ok(())
    }

    /// Record a freshly authenticated user and tokens.
    ///
    /// Argument order is user, then **access** token, then **refresh**
    /// token. Both tokens are plain strings, so a swapped pair compiles;
    /// use [`login_with`](Self::login_with) to pass them by field name.
    ///
    /// Does no authentication itself; the caller supplies credentials it
    /// already obtained. Replaces any existing session.
    pub fn login(
        &mut self,
        user: U,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.login_with(Session::new(user, access_token, refresh_token))
    }

    /// Record a session built with named fields.
    pub fn login_with(&mut self, session: Session<U>) -> Result<(), SessionError> {
        self.commit(Some(session))?;
        info!("Logged in");
        Ok(())
    }

    /// Drop the session from memory and the mirror. Safe to call repeatedly.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let was_logged_in = self.is_logged_in();
        self.commit(None)?;
        if was_logged_in {
            info!("Logged out");
        }
        Ok(())
    }

    /// Replace the in-memory session, then write the mirror to match.
    fn commit(&mut self, next: Option<Session<U>>) -> Result<(), SessionError> {
        // Serialize before touching either layer so a bad user changes nothing
        let user_json = next
            .as_ref()
            .map(|s| serde_json::to_string(&s.user))
            .transpose()
            .map_err(SessionError::Serialize)?;

        self.session = next;

        let result = match (self.session.as_ref(), user_json) {
            (Some(session), Some(user_json)) => {
                write_mirror(&mut self.storage, &user_json, session)
            }
            _ => clear_mirror(&mut self.storage),
        };

        if let Err(ref e) = result {
            warn!(error = %e, "Session mirror write failed; in-memory session kept");
        }
        result.map_err(SessionError::from)
    }
}

impl<S, U> SessionStore<S, U> {
    pub fn user(&self) -> Option<&U> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.refresh_token.as_str())
    }

    pub fn session(&self) -> Option<&Session<U>> {
        self.session.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if self.session.is_some() {
            SessionState::LoggedIn
        } else {
            SessionState::LoggedOut
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state() == SessionState::LoggedIn
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn read_mirror<S, U>(storage: &S) -> Result<Mirror<U>, SessionError>
where
    S: KeyValueStore,
    U: DeserializeOwned,
{
    let user = storage.get(USER_KEY)?;
    let access_token = storage.get(ACCESS_TOKEN_KEY)?;
    let refresh_token = storage.get(REFRESH_TOKEN_KEY)?;

    match (user, access_token, refresh_token) {
        (None, None, None) => Ok(Mirror::Empty),
        (Some(user), Some(access_token), Some(refresh_token)) => {
            let user = serde_json::from_str(&user)
                .map_err(|source| SessionError::MalformedUser { source })?;
            Ok(Mirror::Complete(Session {
                user,
                access_token,
                refresh_token,
            }))
        }
        _ => Ok(Mirror::Partial),
    }
}

fn write_mirror<S, U>(
    storage: &mut S,
    user_json: &str,
    session: &Session<U>,
) -> Result<(), StorageError>
where
    S: KeyValueStore,
{
    storage.set(USER_KEY, user_json)?;
    storage.set(REFRESH_TOKEN_KEY, &session.refresh_token)?;
    storage.set(ACCESS_TOKEN_KEY, &session.access_token)?;
    Ok(())
}

/// Remove every mirror key, continuing past failures. Returns the first error.
fn clear_mirror<S: KeyValueStore>(storage: &mut S) -> Result<(), StorageError> {
    let mut first_error = None;
    for key in MIRROR_KEYS {
        if let Err(e) = storage.remove(key) {
            warn!(key, error = %e, "Failed to remove session key");
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================
