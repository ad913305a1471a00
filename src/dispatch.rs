//! User intents to outbound commands.
//!
//! Each handler translates one user action into the command the matching
//! external collaborator expects, and applies the overlay side effect that
//! goes with it. The handlers keep no state of their own.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::overlay::{MapStyle, Overlay, OverlayCoordinator};

/// A search result as shaped by the search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    /// Pre-formatted by the search collaborator, e.g. "1.2 km".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Police,
    Accident,
    Hazard,
    Traffic,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::Police,
        ReportType::Accident,
        ReportType::Hazard,
        ReportType::Traffic,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationStartRequest {
    pub destination: Coordinates,
    /// The search text that led to this destination, unmodified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationEndRequest {}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportSubmission {
    #[serde(rename = "type")]
    pub kind: ReportType,
    pub position: Coordinates,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleChangeCommand {
    pub style: MapStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrafficLayerCommand {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Start navigating to `place` and dismiss the results panel.
pub fn on_select_place(
    overlays: &mut OverlayCoordinator,
    place: &Place,
    query: Option<&str>,
) -> NavigationStartRequest {
    overlays.close_if(Overlay::SearchResults);
    info!("navigation requested to {} ({})", place.name, place.id);
    NavigationStartRequest {
        destination: place.coordinates,
        query: query.map(str::to_owned),
    }
}

/// Build a report for the collaborator and close the report menu.
///
/// Without a known position there is nothing to report; the menu still
/// closes so the user is not left stuck in it.
pub fn on_submit_report(
    overlays: &mut OverlayCoordinator,
    kind: ReportType,
    position: Option<Coordinates>,
    now: DateTime<Utc>,
) -> Option<ReportSubmission> {
    overlays.close_if(Overlay::ReportMenu);
    match position {
        Some(position) => Some(ReportSubmission {
            kind,
            position,
            timestamp: now,
        }),
        None => {
            warn!("dropping {kind:?} report: no position fix yet");
            None
        }
    }
}

/// The layer menu stays open so traffic can be toggled next.
pub fn on_style_change(overlays: &mut OverlayCoordinator, style: MapStyle) -> StyleChangeCommand {
    overlays.set_style(style);
    StyleChangeCommand { style }
}

pub fn on_toggle_traffic(overlays: &mut OverlayCoordinator) -> TrafficLayerCommand {
    TrafficLayerCommand {
        enabled: overlays.toggle_traffic(),
    }
}

/// Stop guidance. Every overlay is closed since the guidance surfaces are
/// meaningless afterwards.
pub fn on_end_navigation(overlays: &mut OverlayCoordinator) -> NavigationEndRequest {
    overlays.begin_exit();
    overlays.finish_exit();
    info!("navigation ended");
    NavigationEndRequest {}
}

/// Forward a search unless the box is blank or a search is in flight.
/// The query goes out exactly as typed.
pub fn on_submit_search(query: &str, is_loading: bool) -> Option<SearchRequest> {
    if query.trim().is_empty() {
        return None;
    }
    if is_loading {
        debug!("search ignored: previous request still loading");
        return None;
    }
    Some(SearchRequest {
        query: query.to_string(),
    })
}

/// Show fresh results, or hide the panel when a search came back empty.
pub fn on_search_results(overlays: &mut OverlayCoordinator, places: &[Place]) -> bool {
    if places.is_empty() {
        overlays.close_if(Overlay::SearchResults)
    } else {
        overlays.open(Overlay::SearchResults)
    }
}
