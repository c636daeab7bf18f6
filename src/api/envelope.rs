//! JSON response envelope
//!
//! Every JSON response is shaped `{status, ...meta, data}` where `status` is
//! `0` on success and `1` on failure.

use serde::Serialize;
use serde_json::{Map, Value};

pub const OK: u8 = 0;
pub const ERR: u8 = 1;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u8,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: OK,
            meta: Map::new(),
            data,
        }
    }

    /// Attach a top-level meta field next to `status` and `data`
    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

impl Envelope<Value> {
    pub fn failure(message: String) -> Self {
        Envelope {
            status: ERR,
            meta: Map::new(),
            data: Value::Object(Map::new()),
        }
        .with_meta("message", message)
    }
}
