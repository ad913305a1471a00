//! Best-effort place sharing.
//!
//! The platform may or may not offer a native share sheet. When it does,
//! that is tried first; otherwise (or when it fails) a plain-text summary
//! goes to the clipboard. Nothing here can fail the caller.
//!
//! Frontends linking the library directly implement [`NativeShare`] and
//! [`Clipboard`] over their platform APIs and hold one [`Sharer`]. The
//! Android app owns its share intent and clipboard on the Kotlin side, so
//! the bridge hands it a [`SharePayload`] instead.

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::dispatch::Place;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share cancelled")]
    Cancelled,
    #[error("share provider failed: {0}")]
    Provider(String),
}

/// What the native share sheet receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareContent {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl ShareContent {
    pub fn for_place(place: &Place) -> Self {
        let url = place.source_url.clone().unwrap_or_else(|| {
            format!(
                "https://www.google.com/maps/search/?api=1&query={},{}",
                place.coordinates.lat, place.coordinates.lng
            )
        });
        Self {
            title: place.name.clone(),
            text: format!("Check out {} on NavPal", place.name),
            url,
        }
    }
}

/// Text copied when the share sheet is unavailable.
pub fn clipboard_text(place: &Place) -> String {
    format!("{} - {}", place.name, place.address)
}

/// Both share channels' content for a platform that runs the fallback
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub share: ShareContent,
    pub clipboard: String,
}

impl SharePayload {
    pub fn for_place(place: &Place) -> Self {
        Self {
            share: ShareContent::for_place(place),
            clipboard: clipboard_text(place),
        }
    }
}

pub trait NativeShare {
    fn share(&mut self, content: &ShareContent) -> Result<(), ShareError>;
}

pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> Result<(), ShareError>;
}

/// The channel that ended up carrying a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareChannel {
    NativeShare,
    ClipboardFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
    Shared(ShareChannel),
    /// Every channel failed; already logged.
    Dropped,
}

/// Share capabilities discovered once at startup.
pub struct Sharer {
    native: Option<Box<dyn NativeShare>>,
    clipboard: Box<dyn Clipboard>,
}

impl Sharer {
    pub fn new(native: Option<Box<dyn NativeShare>>, clipboard: Box<dyn Clipboard>) -> Self {
        Self { native, clipboard }
    }

    pub fn clipboard_only(clipboard: Box<dyn Clipboard>) -> Self {
        Self::new(None, clipboard)
    }

    pub fn has_native(&self) -> bool {
        self.native.is_some()
    }

    pub fn share_place(&mut self, place: &Place) -> ShareOutcome {
        if let Some(native) = self.native.as_mut() {
            match native.share(&ShareContent::for_place(place)) {
                Ok(()) => return ShareOutcome::Shared(ShareChannel::NativeShare),
                Err(e) => debug!("native share failed, using clipboard: {e}"),
            }
        }

        match self.clipboard.copy_text(&clipboard_text(place)) {
            Ok(()) => ShareOutcome::Shared(ShareChannel::ClipboardFallback),
            Err(e) => {
                warn!("could not share {}: {e}", place.id);
                ShareOutcome::Dropped
            }
        }
    }
}
