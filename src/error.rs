//! Error type for the fallible edges of the crate.
//!
//! The HUD core itself never fails: missing or malformed data degrades
//! the display instead. Errors only come from parsing input that crosses
//! the platform boundary (config, events, GPX replays).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GPX parse error: {0}")]
    Gpx(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("JNI error: {0}")]
    Jni(#[from] jni::errors::Error),

    #[error("invalid timestamp: {0}")]
    Time(String),
}

pub type Result<T> = std::result::Result<T, Error>;
