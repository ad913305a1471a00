//! Render-ready values.
//!
//! Pure lookups and formatting on top of the guidance snapshot, the
//! overlay state, search results and the chat transcript. The frontend
//! draws what it gets and makes no decisions of its own.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::chat::{ChatMessage, ChatRole, ChatSource};
use crate::config::HudConfig;
use crate::dispatch::{Place, ReportType};
use crate::guidance::{GuidanceSnapshot, GuidanceState, Maneuver, ManeuverType};
use crate::overlay::{MapStyle, Overlay, OverlayState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManeuverIcon {
    TurnLeft,
    TurnRight,
    StraightAhead,
    Arrived,
}

/// Icon for a maneuver. Anything unrecognised shows as straight ahead.
pub fn maneuver_icon(maneuver: &Maneuver) -> ManeuverIcon {
    match (maneuver.kind, maneuver.modifier) {
        (ManeuverType::Arrive, _) => ManeuverIcon::Arrived,
        (ManeuverType::Turn, Some(m)) if m.is_left() => ManeuverIcon::TurnLeft,
        (ManeuverType::Turn, Some(m)) if m.is_right() => ManeuverIcon::TurnRight,
        _ => ManeuverIcon::StraightAhead,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeedLimitSign {
    pub limit_kph: u32,
    pub label: String,
}

/// Everything the guidance card shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceCard {
    pub state: GuidanceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<&'static str>,
    pub icon: ManeuverIcon,
    pub maneuver_label: String,
    pub step_distance: String,
    pub step_distance_label: String,
    pub instruction: String,
    pub current_speed_kmh: u32,
    pub current_speed_label: String,
    pub over_limit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit_sign: Option<SpeedLimitSign>,
    pub eta: String,
    pub eta_label: String,
    pub time_remaining: String,
    pub time_remaining_label: String,
    pub distance_remaining: String,
    pub distance_remaining_label: String,
}

/// Build the guidance card. `now` is the render-time clock in the zone
/// the ETA should be shown in.
pub fn guidance_card<Tz>(snapshot: &GuidanceSnapshot, config: &HudConfig, now: DateTime<Tz>) -> GuidanceCard
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let near = snapshot.is_near_destination;
    let step = &snapshot.step;

    let icon = if near {
        ManeuverIcon::Arrived
    } else {
        maneuver_icon(&step.maneuver)
    };
    let maneuver_label = if near {
        "Arriving at destination".to_string()
    } else {
        let modifier = step.maneuver.modifier.map(|m| m.as_str()).unwrap_or("");
        format!("Maneuver: {} {}", step.maneuver.kind.as_str(), modifier)
            .trim_end()
            .to_string()
    };

    let step_meters = step.distance_m.max(0.0).round() as u64;
    let speed = snapshot.displayed_speed_kmh();
    let eta = format_clock(&snapshot.eta(now));
    let minutes = snapshot.minutes_remaining();
    let km = format!("{:.1}", snapshot.remaining_distance_m / 1000.0);

    let speed_limit_sign = step
        .speed_limit()
        .filter(|_| config.show_speed_limit)
        .map(|limit| SpeedLimitSign {
            limit_kph: limit,
            label: format!("Speed limit {limit}"),
        });

    GuidanceCard {
        state: snapshot.state(),
        banner: near.then_some("Arriving Soon"),
        icon,
        maneuver_label,
        step_distance: format!("{step_meters} m"),
        step_distance_label: format!("In {step_meters} meters"),
        instruction: step.instruction.clone(),
        current_speed_kmh: speed,
        current_speed_label: format!("Current speed {speed} kilometers per hour"),
        over_limit: snapshot.is_over_limit(),
        speed_limit_sign,
        eta_label: format!("Estimated arrival time {eta}"),
        eta,
        time_remaining: format!("{minutes} min"),
        time_remaining_label: format!("{minutes} minutes remaining"),
        distance_remaining: format!("{km} km"),
        distance_remaining_label: format!("{km} kilometers remaining"),
    }
}

/// 12-hour wall clock, e.g. "2:05 PM".
pub fn format_clock<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format("%-I:%M %p").to_string()
}

pub fn style_label(style: MapStyle) -> &'static str {
    match style {
        MapStyle::Navpal => "Luxury",
        MapStyle::Dark => "Dark",
        MapStyle::Street => "Street",
        MapStyle::Satellite => "Live Map",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleOption {
    pub style: MapStyle,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarView {
    /// Present only while navigating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_list_active: Option<bool>,
    pub layers_active: bool,
    /// Present only while the layer menu is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_menu: Option<LayerMenuView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerMenuView {
    pub styles: Vec<StyleOption>,
    pub traffic_on: bool,
}

pub fn toolbar(state: &OverlayState, navigating: bool) -> ToolbarView {
    let layers_open = state.active == Overlay::LayerMenu;
    ToolbarView {
        route_list_active: navigating.then_some(state.active == Overlay::RouteList),
        layers_active: layers_open || state.traffic_layer_on,
        layer_menu: layers_open.then(|| LayerMenuView {
            styles: MapStyle::ALL
                .iter()
                .map(|&style| StyleOption {
                    style,
                    label: style_label(style),
                    selected: style == state.map_style,
                })
                .collect(),
            traffic_on: state.traffic_layer_on,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportOption {
    pub kind: ReportType,
    pub label: &'static str,
    pub accent: &'static str,
}

pub fn report_option(kind: ReportType) -> ReportOption {
    let (label, accent) = match kind {
        ReportType::Police => ("Police", "blue"),
        ReportType::Accident => ("Accident", "red"),
        ReportType::Hazard => ("Hazard", "orange"),
        ReportType::Traffic => ("Traffic", "yellow"),
    };
    ReportOption { kind, label, accent }
}

pub fn report_options() -> Vec<ReportOption> {
    ReportType::ALL.iter().copied().map(report_option).collect()
}

/// Detail card for a selected place. Lines without data are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceCard {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

pub fn place_card(place: &Place) -> PlaceCard {
    let rating_line = place.rating.filter(|r| *r > 0.0).map(|rating| {
        let reviews = place
            .user_ratings_total
            .map(|n| n.to_string())
            .unwrap_or_else(|| "10+".to_string());
        format!("{rating} ({reviews} reviews)")
    });

    let hours: Vec<String> = [
        place.is_open.map(|open| if open { "Open Now" } else { "Closed" }.to_string()),
        place.closes_at.as_ref().map(|t| format!("Closes {t}")),
    ]
    .into_iter()
    .flatten()
    .collect();

    PlaceCard {
        name: place.name.clone(),
        address: place.address.clone(),
        distance_line: place.distance.as_ref().map(|d| format!("{d} away")),
        rating_line,
        hours_line: (!hours.is_empty()).then(|| hours.join(" • ")),
        phone: place.phone.clone(),
    }
}

/// Source chips shown under one chat message.
pub const MAX_CHAT_SOURCES: usize = 3;

pub const CHAT_EMPTY_PROMPT: &str = "Ask me anything about the map or navigation.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatBubble {
    pub role: ChatRole,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub places: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<ChatSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatPanel {
    pub title: &'static str,
    pub messages: Vec<ChatBubble>,
    /// Only set while the transcript is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_prompt: Option<&'static str>,
}

pub fn chat_panel(messages: &[ChatMessage]) -> ChatPanel {
    let messages: Vec<ChatBubble> = messages
        .iter()
        .map(|msg| ChatBubble {
            role: msg.role,
            text: msg.text.clone(),
            places: msg.places.clone(),
            sources: msg.sources.iter().take(MAX_CHAT_SOURCES).cloned().collect(),
        })
        .collect();

    ChatPanel {
        title: "Chat Assistant",
        empty_prompt: messages.is_empty().then_some(CHAT_EMPTY_PROMPT),
        messages,
    }
}
