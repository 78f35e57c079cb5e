use web_sys::Storage;

use crate::game::prefs::{PrefsStore, COINS_KEY, HIGH_SCORE_KEY};

/// Prefs kept in the browser's `localStorage`, one string value per key.
pub struct LocalStoragePrefs {
    storage: Storage,
}

impl LocalStoragePrefs {
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(LocalStoragePrefs { storage })
    }
}

impl PrefsStore for LocalStoragePrefs {
    fn get_int(&self, key: &str) -> Option<i64> {
        let value = self.storage.get_item(key).ok()??;
        match value.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("ignoring malformed pref {}={:?}", key, value);
                None
            }
        }
    }

    fn set_int(&mut self, key: &str, value: i64) {
        if let Err(err) = self.storage.set_item(key, &value.to_string()) {
            log::warn!("failed to store {}: {:?}", key, err);
        }
    }

    fn clear(&mut self) {
        for key in [HIGH_SCORE_KEY, COINS_KEY] {
            if let Err(err) = self.storage.remove_item(key) {
                log::warn!("failed to remove {}: {:?}", key, err);
            }
        }
    }
}
