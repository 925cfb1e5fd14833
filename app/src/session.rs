//! Client-local session persistence. The authenticated user and its bearer
//! token survive restarts under the keys `user` and `token`.

use crate::error::SessionError;
use parking_lot::{Mutex, RwLock};
use riego_core::User;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";

/// Durable key-value storage of the session
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: String) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// JSON object in a single file, rewritten on every change
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSessionStore {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, SessionError> {
        match std::fs::read(&self.path) {
            Ok(raw) if raw.is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), SessionError> {
        let raw = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value);
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock();
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.entries.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// Current session, mirrored into a [`SessionStore`]
pub struct Auth {
    store: Box<dyn SessionStore>,
    current: RwLock<Session>,
}

impl Auth {
    /// Loads the persisted session. A corrupt user entry is dropped
    /// instead of failing the startup.
    pub fn restore(store: Box<dyn SessionStore>) -> Result<Self, SessionError> {
        let token = store.get(TOKEN_KEY)?;
        let user = match store.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!("Dropping unreadable session user: {}", err);
                    store.remove(USER_KEY)?;
                    None
                }
            },
            None => None,
        };

        let session = Session { user, token };
        if session.is_authenticated() {
            info!("Restored session");
        } else {
            debug!("No stored session");
        }
        Ok(Auth {
            store,
            current: RwLock::new(session),
        })
    }

    pub fn session(&self) -> Session {
        self.current.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current.read().token.clone()
    }

    pub fn login(&self, user: User, token: String) -> Result<Session, SessionError> {
        let user_id = user.id;
        self.store.set(USER_KEY, serde_json::to_string(&user)?)?;
        self.store.set(TOKEN_KEY, token.clone())?;

        let mut current = self.current.write();
        *current = Session {
            user: Some(user),
            token: Some(token),
        };
        info!(user_id = user_id, "Logged in");
        Ok(current.clone())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.remove(USER_KEY)?;
        self.store.remove(TOKEN_KEY)?;
        *self.current.write() = Session::default();
        info!("Logged out");
        Ok(())
    }
}
