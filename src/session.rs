use anyhow::{Context, Result};
use log::*;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::model::{AuthResponse, User};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Persisted key-value storage behind the session.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// One file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: &str) -> Result<Self> {
        let path = shellexpand::full(dir)
            .with_context(|| format!("Session directory path {} is invalid", dir))?;
        Ok(FileStorage { dir: Path::new(path.as_ref()).to_owned() })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

fn read_if_found(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(&path) {
        Ok(c) => Ok(Some(c)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        read_if_found(&self.path(key))
            .with_context(|| format!("Error reading session key {}", key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Error ensuring path {:?} exists", self.dir))?;
        std::fs::write(self.path(key), value)
            .with_context(|| format!("Error writing session key {}", key))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Error removing session key {}", key)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// The signed-in user, cached client side.
///
/// This is the only reader and writer of the persisted `token` and `user`
/// keys. Callers that need to know who is logged in get a reference to it
/// passed in explicitly.
pub struct Session<S> {
    storage: S,
    token: Option<String>,
    user: Option<User>,
}

impl<S: Storage> Session<S> {
    /// Rehydrate from storage. An unreadable or corrupt user is treated as
    /// logged out.
    pub fn load(storage: S) -> Result<Self> {
        let token = storage.get(TOKEN_KEY)?;
        let user = match storage.get(USER_KEY)? {
            None => None,
            Some(saved) => match serde_json::from_str::<User>(&saved) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Ignoring unreadable saved user: {}", e);
                    None
                }
            },
        };
        debug!("Loaded session, user present: {}", user.is_some());
        Ok(Session { storage, token, user })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Store what a successful login or signup returned.
    pub fn establish(&mut self, response: AuthResponse) -> Result<&User> {
        let user = serde_json::to_string(&response.user)?;
        let previous_token = self.storage.get(TOKEN_KEY)?;
        match &response.token {
            Some(token) => self.storage.set(TOKEN_KEY, token)?,
            None => self.storage.remove(TOKEN_KEY)?,
        }
        if let Err(e) = self.storage.set(USER_KEY, &user) {
            // Restore the old token, a new one must not outlive a failed user write
            let restored = match &previous_token {
                Some(token) => self.storage.set(TOKEN_KEY, token),
                None => self.storage.remove(TOKEN_KEY),
            };
            if let Err(r) = restored {
                warn!("Could not restore previous token: {:#}", r);
            }
            return Err(e);
        }
        info!("Session established for {}", response.user.email);
        self.token = response.token;
        Ok(&*self.user.insert(response.user))
    }

    pub fn logout(&mut self) -> Result<()> {
        self.token = None;
        self.user = None;
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        info!("Session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn response(token: Option<&str>) -> AuthResponse {
        AuthResponse {
            token: token.map(str::to_owned),
            user: User { fullname: "Ada Lovelace".into(), email: "ada@example.com".into() },
        }
    }

    fn file_storage(dir: &TempDir) -> FileStorage {
        FileStorage::new(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn empty_storage_has_no_user() {
        let session = Session::load(MemoryStorage::default()).unwrap();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(!session.is_logged_in());
    }

    #[test]
    fn establish_persists_and_rehydrates() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(file_storage(&dir)).unwrap();
        session.establish(response(Some("t0k3n"))).unwrap();
        assert_eq!(session.user().unwrap().fullname, "Ada Lovelace");

        let reloaded = Session::load(file_storage(&dir)).unwrap();
        assert_eq!(reloaded.token(), Some("t0k3n"));
        assert_eq!(reloaded.user().unwrap().email, "ada@example.com");
    }

    #[test]
    fn logout_clears_both_keys_and_memory() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(file_storage(&dir)).unwrap();
        session.establish(response(Some("t0k3n"))).unwrap();

        session.logout().unwrap();
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert!(!dir.path().join("token").exists());
        assert!(!dir.path().join("user").exists());

        let reloaded = Session::load(file_storage(&dir)).unwrap();
        assert!(reloaded.user().is_none());
    }

    #[test]
    fn logout_without_session_is_fine() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::load(file_storage(&dir)).unwrap();
        assert!(session.logout().is_ok());
    }

    #[test]
    fn signup_without_token_stores_user_only() {
        let mut storage = MemoryStorage::default();
        storage.set("token", "stale").unwrap();
        let mut session = Session::load(storage).unwrap();
        session.establish(response(None)).unwrap();
        assert!(session.token().is_none());
        assert!(session.is_logged_in());
    }

    /// Refuses to store the user key, everything else works.
    #[derive(Default)]
    struct UserWriteFails(MemoryStorage);

    impl Storage for UserWriteFails {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if key == USER_KEY {
                anyhow::bail!("disk full");
            }
            self.0.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
    }

    #[test]
    fn failed_user_write_restores_previous_token() {
        let mut storage = UserWriteFails::default();
        storage.set(TOKEN_KEY, "old").unwrap();
        let mut session = Session::load(storage).unwrap();

        assert!(session.establish(response(Some("new"))).is_err());
        assert_eq!(session.storage.get(TOKEN_KEY).unwrap().as_deref(), Some("old"));
        assert_eq!(session.token(), Some("old"));
        assert!(!session.is_logged_in());
    }

    #[test]
    fn failed_user_write_without_previous_token_leaves_none() {
        let mut session = Session::load(UserWriteFails::default()).unwrap();
        assert!(session.establish(response(Some("new"))).is_err());
        assert!(session.storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn corrupt_user_is_treated_as_logged_out() {
        let mut storage = MemoryStorage::default();
        storage.set("user", "{not json").unwrap();
        let session = Session::load(storage).unwrap();
        assert!(session.user().is_none());
    }
}
