//! The fixed session identifier and where it is remembered.

/// The client is single-user; every message belongs to this session.
pub const FIXED_SESSION_ID: &str = "single-user";

/// Key under which the session id is kept in client-local storage.
pub const SESSION_STORAGE_KEY: &str = "n8n-chat-session-id";

/// Client-local storage for the session id (browser `localStorage`, a file, ...).
pub trait SessionStorage {
    type Error;

    fn load(&self) -> Result<Option<String>, Self::Error>;
    fn store(&mut self, session_id: &str) -> Result<(), Self::Error>;
}

/// Makes sure the storage holds [`FIXED_SESSION_ID`] and returns it.
///
/// Writes only when the stored value differs, so repeated starts leave the
/// storage untouched.
pub fn establish_session<S: SessionStorage>(storage: &mut S) -> Result<&'static str, S::Error> {
    if storage.load()?.as_deref() != Some(FIXED_SESSION_ID) {
        storage.store(FIXED_SESSION_ID)?;
    }
    Ok(FIXED_SESSION_ID)
}

#[cfg(feature = "client")]
pub use file_store::FileSessionStore;

#[cfg(feature = "client")]
mod file_store {
    use std::path::{Path, PathBuf};

    use super::SessionStorage;
    use crate::errors::ChatError;

    /// Keeps the session id in a small text file.
    #[derive(Debug, Clone)]
    pub struct FileSessionStore {
        path: PathBuf,
    }

    impl FileSessionStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl SessionStorage for FileSessionStore {
        type Error = ChatError;

        fn load(&self) -> Result<Option<String>, ChatError> {
            match std::fs::read_to_string(&self.path) {
                Ok(s) => Ok(Some(s.trim().to_string())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ChatError::storage(&self.path, e)),
            }
        }

        fn store(&mut self, session_id: &str) -> Result<(), ChatError> {
            std::fs::write(&self.path, session_id).map_err(|e| ChatError::storage(&self.path, e))
        }
    }
}
