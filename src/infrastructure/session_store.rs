// Persisted session slot and the context object that owns token lifecycle
use crate::infrastructure::navigator::{Navigator, SIGN_IN_ROUTE};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// A persisted string key-value slot
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// JSON file backed slot; every write rewrites the whole file
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    slots: RwLock<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Open or create the slot at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slots = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt session file {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            slots: RwLock::new(slots),
        }
    }

    fn persist(&self, slots: &HashMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(slots)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        self.persist(&slots)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.remove(key).is_some() {
            self.persist(&slots)?;
        }
        Ok(())
    }
}

/// Session state handed to the API client at construction.
///
/// This is the only path to the token slot: the auth interceptor reads the
/// access token and tears the session down on 401, the auth service writes
/// tokens after sign-in.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn store_access_token(&self, access: &str) {
        if let Err(e) = self.store.set(ACCESS_TOKEN_KEY, access) {
            tracing::warn!("Failed to persist access token: {}", e);
        }
    }

    pub fn store_refresh_token(&self, refresh: &str) {
        if let Err(e) = self.store.set(REFRESH_TOKEN_KEY, refresh) {
            tracing::warn!("Failed to persist refresh token: {}", e);
        }
    }

    /// Remove both tokens
    pub fn purge(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("Failed to remove {}: {}", key, e);
            }
        }
    }

    /// Purge the tokens and send the user to the sign-in route
    pub fn expire(&self) {
        tracing::info!("Session rejected by API, signing out");
        self.purge();
        self.navigator.navigate(SIGN_IN_ROUTE);
    }
}
