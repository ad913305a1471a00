//! In-trip navigation HUD core.
//!
//! Derives render-ready guidance from route steps and live telemetry,
//! coordinates the overlays competing for the screen, and turns user
//! intents into commands for the routing, reporting, search and map
//! collaborators. Platform-agnostic apart from `android_jni`.

pub mod android_jni;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod guidance;
pub mod overlay;
pub mod presentation;
pub mod replay;
pub mod session;
pub mod share;

pub use config::HudConfig;
pub use error::{Error, Result};
pub use session::{HudEvent, HudFrame, NavSession, Outbound, UserAction};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
