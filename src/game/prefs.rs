use std::collections::HashMap;

pub const HIGH_SCORE_KEY: &str = "HighScore";
pub const COINS_KEY: &str = "Coins";

/// Small integer key-value store that outlives a session.
pub trait PrefsStore {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64);
    fn clear(&mut self);

    fn get_u32(&self, key: &str) -> u32 {
        self.get_int(key).map_or(0, |v| v.clamp(0, u32::MAX as i64) as u32)
    }
}

#[derive(Default, Debug, Clone)]
pub struct MemoryPrefs {
    values: HashMap<String, i64>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefsStore for MemoryPrefs {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}
