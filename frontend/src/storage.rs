use web_sys::Storage;

use webhook_chat::session::{SESSION_STORAGE_KEY, SessionStorage};

use crate::media::js_error;

/// The browser's `localStorage`, holding the session id between visits.
pub struct LocalSessionStorage {
    storage: Storage,
}

impl LocalSessionStorage {
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

impl SessionStorage for LocalSessionStorage {
    type Error = String;

    fn load(&self) -> Result<Option<String>, String> {
        self.storage.get_item(SESSION_STORAGE_KEY).map_err(js_error)
    }

    fn store(&mut self, session_id: &str) -> Result<(), String> {
        self.storage
            .set_item(SESSION_STORAGE_KEY, session_id)
            .map_err(js_error)
    }
}
