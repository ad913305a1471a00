//! The HUD event loop.
//!
//! A [`NavSession`] is the single owner of the guidance reducer and the
//! overlay coordinator. The platform feeds it one [`HudEvent`] at a time
//! and gets back the commands to forward to external collaborators; it
//! asks for a [`HudFrame`] whenever it wants to draw.
//!
//! Guidance is derived when a frame is built, never stored, so a reading
//! goes stale on screen even when no further telemetry arrives.

use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::chat::ChatMessage;
use crate::config::HudConfig;
use crate::dispatch::{
    self, NavigationEndRequest, NavigationStartRequest, Place, ReportSubmission, ReportType,
    SearchRequest, StyleChangeCommand, TrafficLayerCommand,
};
use crate::geo::Coordinates;
use crate::guidance::{GuidanceReducer, GuidanceSnapshot, RouteProgress, RouteStep, TelemetrySample};
use crate::overlay::{MapStyle, Overlay, OverlayCoordinator, OverlayState};
use crate::presentation::{self, ChatPanel, GuidanceCard, PlaceCard, ReportOption, ToolbarView};

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    ToggleOverlay { overlay: Overlay },
    CloseOverlay,
    OpenReportMenu,
    SubmitReport { kind: ReportType },
    SelectPlace { place: Place },
    ChangeStyle { style: MapStyle },
    ToggleTraffic,
    Recenter,
    SubmitSearch { query: String },
    /// Empty the search box. Overlays are left as they are.
    ClearSearch,
    EndNavigation,
}

/// Everything the session reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HudEvent {
    Telemetry { sample: TelemetrySample },
    NavigationStarted { step: RouteStep, progress: RouteProgress },
    StepAdvanced { step: RouteStep, progress: RouteProgress },
    ProgressUpdated { progress: RouteProgress },
    SearchResults { places: Vec<Place> },
    /// The search collaborator finished (successfully or not).
    SearchSettled,
    /// The full chat transcript, replacing the previous one.
    ChatMessages { messages: Vec<ChatMessage> },
    User(UserAction),
}

/// A command for an external collaborator. Fire-and-forget.
///
/// Tagged with `command` because payloads such as [`ReportSubmission`]
/// carry a `type` field of their own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Outbound {
    NavigationStart(NavigationStartRequest),
    NavigationEnd(NavigationEndRequest),
    Report(ReportSubmission),
    StyleChange(StyleChangeCommand),
    TrafficLayer(TrafficLayerCommand),
    Recenter,
    Search(SearchRequest),
}

/// One complete render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudFrame {
    pub overlay: OverlayState,
    pub navigating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<GuidanceCard>,
    pub toolbar: ToolbarView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_menu: Option<Vec<ReportOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Vec<PlaceCard>>,
    /// The search box keeps its text after submission.
    pub search_query: String,
    pub search_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<ChatPanel>,
}

#[derive(Debug, Default)]
pub struct NavSession {
    reducer: GuidanceReducer,
    overlays: OverlayCoordinator,
    latest: Option<TelemetrySample>,
    last_position: Option<Coordinates>,
    places: Vec<Place>,
    search_query: String,
    search_loading: bool,
    chat: Vec<ChatMessage>,
}

impl NavSession {
    pub fn new(config: HudConfig) -> Self {
        Self {
            reducer: GuidanceReducer::new(config),
            ..Self::default()
        }
    }

    pub fn overlays(&self) -> &OverlayCoordinator {
        &self.overlays
    }

    /// Guidance as of `now`. `None` unless a route step is active.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<GuidanceSnapshot> {
        self.reducer.update(self.latest.as_ref(), now)
    }

    pub fn is_navigating(&self) -> bool {
        self.overlays.is_navigating()
    }

    pub fn last_position(&self) -> Option<Coordinates> {
        self.last_position
    }

    /// Apply one event and return the resulting outbound commands.
    ///
    /// `now` is the wall clock at dispatch time; it stamps reports.
    pub fn handle(&mut self, event: HudEvent, now: DateTime<Utc>) -> Vec<Outbound> {
        match event {
            HudEvent::Telemetry { sample } => {
                self.accept_telemetry(sample);
                Vec::new()
            }
            HudEvent::NavigationStarted { step, progress } => {
                info!("navigation started: {}", step.instruction);
                self.overlays.start_navigation();
                self.reducer.set_step(step, progress);
                Vec::new()
            }
            HudEvent::StepAdvanced { step, progress } => {
                if self.is_navigating() {
                    self.reducer.set_step(step, progress);
                } else {
                    debug!("step ignored: not navigating");
                }
                Vec::new()
            }
            HudEvent::ProgressUpdated { progress } => {
                if self.is_navigating() && !self.reducer.set_progress(progress) {
                    debug!("progress ignored: no active step");
                }
                Vec::new()
            }
            HudEvent::SearchResults { places } => {
                self.search_loading = false;
                dispatch::on_search_results(&mut self.overlays, &places);
                self.places = places;
                Vec::new()
            }
            HudEvent::SearchSettled => {
                self.search_loading = false;
                Vec::new()
            }
            HudEvent::ChatMessages { messages } => {
                self.chat = messages;
                Vec::new()
            }
            HudEvent::User(action) => self.handle_action(action, now),
        }
    }

    fn handle_action(&mut self, action: UserAction, now: DateTime<Utc>) -> Vec<Outbound> {
        match action {
            UserAction::ToggleOverlay { overlay } => {
                self.overlays.toggle(overlay);
                Vec::new()
            }
            UserAction::CloseOverlay => {
                self.overlays.close();
                Vec::new()
            }
            UserAction::OpenReportMenu => {
                self.overlays.open_report();
                Vec::new()
            }
            UserAction::SubmitReport { kind } => {
                dispatch::on_submit_report(&mut self.overlays, kind, self.last_position, now)
                    .map(Outbound::Report)
                    .into_iter()
                    .collect()
            }
            UserAction::SelectPlace { place } => {
                let query = (!self.search_query.is_empty()).then_some(self.search_query.as_str());
                let request = dispatch::on_select_place(&mut self.overlays, &place, query);
                vec![Outbound::NavigationStart(request)]
            }
            UserAction::ChangeStyle { style } => {
                vec![Outbound::StyleChange(dispatch::on_style_change(&mut self.overlays, style))]
            }
            UserAction::ToggleTraffic => {
                vec![Outbound::TrafficLayer(dispatch::on_toggle_traffic(&mut self.overlays))]
            }
            UserAction::Recenter => vec![Outbound::Recenter],
            UserAction::SubmitSearch { query } => {
                let request = dispatch::on_submit_search(&query, self.search_loading);
                self.search_query = query;
                match request {
                    Some(request) => {
                        self.search_loading = true;
                        vec![Outbound::Search(request)]
                    }
                    None => Vec::new(),
                }
            }
            UserAction::ClearSearch => {
                self.search_query.clear();
                Vec::new()
            }
            UserAction::EndNavigation => self.end_navigation(),
        }
    }

    /// Stop guidance in one step: no step or guidance telemetry survives,
    /// and every overlay is closed.
    fn end_navigation(&mut self) -> Vec<Outbound> {
        let was_navigating = self.is_navigating();

        self.reducer.clear();
        self.latest = None;
        let request = dispatch::on_end_navigation(&mut self.overlays);

        if was_navigating {
            vec![Outbound::NavigationEnd(request)]
        } else {
            Vec::new()
        }
    }

    /// Keep only the newest sample; anything older than what we already
    /// hold is stale and dropped.
    fn accept_telemetry(&mut self, sample: TelemetrySample) {
        if let Some(latest) = &self.latest {
            if sample.timestamp < latest.timestamp {
                debug!("discarding out-of-order telemetry from {}", sample.timestamp);
                return;
            }
        }
        if let Some(position) = sample.position {
            self.last_position = Some(position);
        }
        self.latest = Some(sample);
    }

    /// Build a frame for the given render-time clock. Telemetry staleness
    /// and the ETA are both judged against `now`.
    pub fn frame<Tz>(&self, now: DateTime<Tz>) -> HudFrame
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let overlay = *self.overlays.state();
        let navigating = self.is_navigating();

        HudFrame {
            overlay,
            navigating,
            guidance: self
                .snapshot(now.with_timezone(&Utc))
                .map(|snap| presentation::guidance_card(&snap, self.reducer.config(), now)),
            toolbar: presentation::toolbar(&overlay, navigating),
            report_menu: (overlay.active == Overlay::ReportMenu).then(presentation::report_options),
            search_results: (overlay.active == Overlay::SearchResults)
                .then(|| self.places.iter().map(presentation::place_card).collect()),
            search_query: self.search_query.clone(),
            search_loading: self.search_loading,
            chat: (overlay.active == Overlay::ChatSidebar)
                .then(|| presentation::chat_panel(&self.chat)),
        }
    }
}
