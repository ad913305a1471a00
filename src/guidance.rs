//! Guidance state reduction.
//!
//! Turns the active route step, the routing collaborator's progress
//! figures and the latest telemetry sample into a [`GuidanceSnapshot`].
//! The reduction is a pure function: nothing is carried over from one
//! tick to the next, so errors cannot accumulate.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::HudConfig;
use crate::geo::Coordinates;

/// Maneuver categories as reported by the routing collaborator.
///
/// Anything the core does not know deserializes to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManeuverType {
    Turn,
    #[serde(rename = "new name")]
    NewName,
    Depart,
    Arrive,
    Merge,
    #[serde(rename = "on ramp")]
    OnRamp,
    #[serde(rename = "off ramp")]
    OffRamp,
    Fork,
    #[serde(rename = "end of road")]
    EndOfRoad,
    Continue,
    Roundabout,
    Rotary,
    Notification,
    #[serde(other)]
    Other,
}

/// Direction qualifier attached to a maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManeuverModifier {
    Left,
    #[serde(rename = "slight left")]
    SlightLeft,
    #[serde(rename = "sharp left")]
    SharpLeft,
    Right,
    #[serde(rename = "slight right")]
    SlightRight,
    #[serde(rename = "sharp right")]
    SharpRight,
    Straight,
    Uturn,
    #[serde(other)]
    Other,
}

impl ManeuverModifier {
    pub fn is_left(self) -> bool {
        matches!(self, Self::Left | Self::SlightLeft | Self::SharpLeft)
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::Right | Self::SlightRight | Self::SharpRight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::SlightLeft => "slight left",
            Self::SharpLeft => "sharp left",
            Self::Right => "right",
            Self::SlightRight => "slight right",
            Self::SharpRight => "sharp right",
            Self::Straight => "straight",
            Self::Uturn => "uturn",
            Self::Other => "",
        }
    }
}

impl ManeuverType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Turn => "turn",
            Self::NewName => "new name",
            Self::Depart => "depart",
            Self::Arrive => "arrive",
            Self::Merge => "merge",
            Self::OnRamp => "on ramp",
            Self::OffRamp => "off ramp",
            Self::Fork => "fork",
            Self::EndOfRoad => "end of road",
            Self::Continue => "continue",
            Self::Roundabout => "roundabout",
            Self::Rotary => "rotary",
            Self::Notification => "notification",
            Self::Other => "maneuver",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maneuver {
    #[serde(rename = "type")]
    pub kind: ManeuverType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ManeuverModifier>,
}

/// One turn-by-turn step. Replaced wholesale when the route advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub maneuver: Maneuver,
    /// Distance to the maneuver in meters.
    pub distance_m: f64,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_limit_kph: Option<u32>,
}

impl RouteStep {
    /// The posted limit, if the routing data carries a usable one.
    pub fn speed_limit(&self) -> Option<u32> {
        self.speed_limit_kph.filter(|&limit| limit > 0)
    }
}

/// Remaining trip figures reported by the routing collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteProgress {
    pub remaining_distance_m: f64,
    pub remaining_duration_s: f64,
}

/// A timestamped position/speed reading from the location subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Coordinates>,
    /// Absent when the device has no fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mps: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Which of the two mutually exclusive guidance looks applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceState {
    Normal,
    NearDestination,
}

/// Fully derived guidance for one instant.
///
/// The ETA is deliberately not part of the snapshot: it depends on the
/// wall clock at render time, see [`GuidanceSnapshot::eta`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceSnapshot {
    pub step: RouteStep,
    pub remaining_duration_s: f64,
    pub remaining_distance_m: f64,
    pub current_speed_mps: Option<f64>,
    pub is_near_destination: bool,
}

impl GuidanceSnapshot {
    pub fn state(&self) -> GuidanceState {
        if self.is_near_destination {
            GuidanceState::NearDestination
        } else {
            GuidanceState::Normal
        }
    }

    /// Current speed in whole km/h; 0 without a reading.
    pub fn displayed_speed_kmh(&self) -> u32 {
        self.current_speed_mps
            .map(|mps| (mps * 3.6).round() as u32)
            .unwrap_or(0)
    }

    /// True only when a limit is posted and the displayed speed exceeds it.
    pub fn is_over_limit(&self) -> bool {
        self.step
            .speed_limit()
            .is_some_and(|limit| self.displayed_speed_kmh() > limit)
    }

    pub fn minutes_remaining(&self) -> u64 {
        (self.remaining_duration_s / 60.0).floor().max(0.0) as u64
    }

    /// Arrival time as seen from `now`. Not cacheable: two calls a minute
    /// apart give different answers for the same snapshot.
    pub fn eta<Tz: TimeZone>(&self, now: DateTime<Tz>) -> DateTime<Tz> {
        let millis = (self.remaining_duration_s * 1000.0).round() as i64;
        TimeDelta::try_milliseconds(millis)
            .and_then(|delta| now.clone().checked_add_signed(delta))
            .unwrap_or(now)
    }
}

/// Reduce the current inputs to a snapshot.
///
/// `telemetry` is `None` before the first fix. Identical inputs always
/// produce identical snapshots.
pub fn reduce(
    config: &HudConfig,
    step: &RouteStep,
    progress: &RouteProgress,
    telemetry: Option<&TelemetrySample>,
    now: DateTime<Utc>,
) -> GuidanceSnapshot {
    let remaining_distance_m = non_negative(progress.remaining_distance_m);
    let remaining_duration_s = non_negative(progress.remaining_duration_s);

    let is_near_destination = remaining_distance_m < config.near_destination_distance_m
        || remaining_duration_s < config.near_destination_time_s;

    GuidanceSnapshot {
        step: step.clone(),
        remaining_duration_s,
        remaining_distance_m,
        current_speed_mps: telemetry.and_then(|sample| usable_speed(config, sample, now)),
        is_near_destination,
    }
}

/// Speed from a sample, or `None` when it must not be shown.
fn usable_speed(config: &HudConfig, sample: &TelemetrySample, now: DateTime<Utc>) -> Option<f64> {
    let speed = sample.speed_mps.filter(|s| s.is_finite() && *s >= 0.0)?;

    let age_ms = (now - sample.timestamp).num_milliseconds();
    if age_ms as f64 > config.telemetry_stale_after_s * 1000.0 {
        return None;
    }

    Some(speed)
}

fn non_negative(value: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Holds the active step and progress between ticks.
///
/// Only the routing inputs are remembered; every [`update`](Self::update)
/// recomputes the snapshot from scratch.
#[derive(Debug, Clone, Default)]
pub struct GuidanceReducer {
    config: HudConfig,
    route: Option<(RouteStep, RouteProgress)>,
}

impl GuidanceReducer {
    pub fn new(config: HudConfig) -> Self {
        Self { config, route: None }
    }

    pub fn config(&self) -> &HudConfig {
        &self.config
    }

    pub fn step(&self) -> Option<&RouteStep> {
        self.route.as_ref().map(|(step, _)| step)
    }

    /// Accept a new active step. Any previous step is dropped wholesale.
    pub fn set_step(&mut self, step: RouteStep, progress: RouteProgress) {
        self.route = Some((step, progress));
    }

    /// Update the remaining figures for the current step. Ignored when no
    /// step is active.
    pub fn set_progress(&mut self, progress: RouteProgress) -> bool {
        match self.route.as_mut() {
            Some((_, current)) => {
                *current = progress;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.route = None;
    }

    pub fn update(
        &self,
        telemetry: Option<&TelemetrySample>,
        now: DateTime<Utc>,
    ) -> Option<GuidanceSnapshot> {
        self.route
            .as_ref()
            .map(|(step, progress)| reduce(&self.config, step, progress, telemetry, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap()
    }

    fn step(limit: Option<u32>) -> RouteStep {
        RouteStep {
            maneuver: Maneuver {
                kind: ManeuverType::Turn,
                modifier: Some(ManeuverModifier::Left),
            },
            distance_m: 240.0,
            instruction: "Turn left onto Main Street".to_string(),
            speed_limit_kph: limit,
        }
    }

    fn progress(distance: f64, duration: f64) -> RouteProgress {
        RouteProgress {
            remaining_distance_m: distance,
            remaining_duration_s: duration,
        }
    }

    fn sample(speed: Option<f64>) -> TelemetrySample {
        TelemetrySample {
            position: Some(Coordinates::new(48.2, 16.37)),
            speed_mps: speed,
            timestamp: now(),
        }
    }

    fn snapshot(limit: Option<u32>, speed: Option<f64>) -> GuidanceSnapshot {
        reduce(
            &HudConfig::default(),
            &step(limit),
            &progress(5_000.0, 600.0),
            Some(&sample(speed)),
            now(),
        )
    }

    #[test]
    fn speed_is_rounded_to_kmh() {
        assert_eq!(snapshot(None, Some(25.0)).displayed_speed_kmh(), 90);
        assert_eq!(snapshot(None, Some(13.5)).displayed_speed_kmh(), 49);
        assert_eq!(snapshot(None, Some(0.0)).displayed_speed_kmh(), 0);
    }

    #[test]
    fn over_limit_at_90_in_80_zone() {
        let snap = snapshot(Some(80), Some(25.0));
        assert_eq!(snap.displayed_speed_kmh(), 90);
        assert!(snap.is_over_limit());
    }

    #[test]
    fn exactly_at_limit_is_not_over() {
        // 22.2 m/s * 3.6 = 79.92 -> 80
        let snap = snapshot(Some(80), Some(22.2));
        assert_eq!(snap.displayed_speed_kmh(), 80);
        assert!(!snap.is_over_limit());
    }

    #[test]
    fn over_limit_matches_rounded_comparison() {
        for limit in [30_u32, 50, 80, 100, 130] {
            for tenth in 0..500 {
                let mps = tenth as f64 / 10.0;
                let snap = snapshot(Some(limit), Some(mps));
                let expected = (mps * 3.6).round() as u32 > limit;
                assert_eq!(snap.is_over_limit(), expected, "mps={mps} limit={limit}");
            }
        }
    }

    #[test]
    fn no_limit_never_over() {
        assert!(!snapshot(None, Some(60.0)).is_over_limit());
    }

    #[test]
    fn zero_limit_counts_as_absent() {
        let snap = snapshot(Some(0), Some(10.0));
        assert_eq!(snap.step.speed_limit(), None);
        assert!(!snap.is_over_limit());
    }

    #[test]
    fn missing_speed_displays_zero() {
        let snap = snapshot(Some(50), None);
        assert_eq!(snap.current_speed_mps, None);
        assert_eq!(snap.displayed_speed_kmh(), 0);
    }

    #[test]
    fn malformed_speed_is_no_reading() {
        for bad in [-3.0, f64::NAN, f64::INFINITY] {
            let snap = snapshot(Some(50), Some(bad));
            assert_eq!(snap.current_speed_mps, None, "speed {bad}");
            assert_eq!(snap.displayed_speed_kmh(), 0);
        }
    }

    #[test]
    fn stale_sample_is_no_reading() {
        let config = HudConfig::default();
        let mut old = sample(Some(20.0));
        old.timestamp = now() - TimeDelta::seconds(11);
        let snap = reduce(&config, &step(None), &progress(1000.0, 100.0), Some(&old), now());
        assert_eq!(snap.current_speed_mps, None);

        old.timestamp = now() - TimeDelta::seconds(9);
        let snap = reduce(&config, &step(None), &progress(1000.0, 100.0), Some(&old), now());
        assert_eq!(snap.current_speed_mps, Some(20.0));
    }

    #[test]
    fn no_telemetry_yet() {
        let snap = reduce(&HudConfig::default(), &step(None), &progress(1000.0, 100.0), None, now());
        assert_eq!(snap.displayed_speed_kmh(), 0);
    }

    #[test]
    fn near_destination_by_distance() {
        let snap = reduce(&HudConfig::default(), &step(None), &progress(45.0, 300.0), None, now());
        assert!(snap.is_near_destination);
        assert_eq!(snap.state(), GuidanceState::NearDestination);
    }

    #[test]
    fn near_destination_by_time() {
        let snap = reduce(&HudConfig::default(), &step(None), &progress(900.0, 20.0), None, now());
        assert!(snap.is_near_destination);
    }

    #[test]
    fn threshold_is_strict() {
        let snap = reduce(&HudConfig::default(), &step(None), &progress(50.0, 30.0), None, now());
        assert!(!snap.is_near_destination);
        assert_eq!(snap.state(), GuidanceState::Normal);
    }

    #[test]
    fn thresholds_follow_config() {
        let config = HudConfig {
            near_destination_distance_m: 200.0,
            ..HudConfig::default()
        };
        let snap = reduce(&config, &step(None), &progress(150.0, 300.0), None, now());
        assert!(snap.is_near_destination);
    }

    #[test]
    fn minutes_clamp_at_zero() {
        for duration in [0.0, -1.0, -600.0, f64::NAN, f64::NEG_INFINITY] {
            let snap = reduce(&HudConfig::default(), &step(None), &progress(10.0, duration), None, now());
            assert_eq!(snap.minutes_remaining(), 0, "duration {duration}");
            assert!(snap.remaining_duration_s >= 0.0);
        }
    }

    #[test]
    fn minutes_are_floored() {
        let snap = snapshot(None, None);
        assert_eq!(snap.minutes_remaining(), 10);
        let snap = reduce(&HudConfig::default(), &step(None), &progress(5000.0, 119.0), None, now());
        assert_eq!(snap.minutes_remaining(), 1);
    }

    #[test]
    fn negative_distance_is_clamped() {
        let snap = reduce(&HudConfig::default(), &step(None), &progress(-20.0, 300.0), None, now());
        assert_eq!(snap.remaining_distance_m, 0.0);
        assert!(snap.is_near_destination);
    }

    #[test]
    fn eta_tracks_render_clock() {
        let snap = snapshot(None, None);
        let eta = snap.eta(now());
        assert_eq!(eta, now() + TimeDelta::seconds(600));

        let later = now() + TimeDelta::minutes(1);
        assert_eq!(snap.eta(later) - eta, TimeDelta::minutes(1));
    }

    #[test]
    fn eta_keeps_callers_zone() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = now().with_timezone(&offset);
        let eta = snapshot(None, None).eta(local);
        assert_eq!(eta.offset(), &offset);
    }

    #[test]
    fn reduce_is_idempotent() {
        let a = snapshot(Some(80), Some(25.0));
        let b = snapshot(Some(80), Some(25.0));
        assert_eq!(a, b);
    }

    #[test]
    fn reducer_recomputes_after_step_change() {
        let mut reducer = GuidanceReducer::new(HudConfig::default());
        assert!(reducer.update(None, now()).is_none());

        reducer.set_step(step(None), progress(40.0, 20.0));
        assert!(reducer.update(None, now()).unwrap().is_near_destination);

        reducer.set_step(step(Some(50)), progress(4000.0, 400.0));
        let snap = reducer.update(None, now()).unwrap();
        assert!(!snap.is_near_destination);
        assert_eq!(snap.step.speed_limit(), Some(50));
    }

    #[test]
    fn progress_without_step_is_ignored() {
        let mut reducer = GuidanceReducer::default();
        assert!(!reducer.set_progress(progress(1.0, 1.0)));
        assert!(reducer.update(None, now()).is_none());
    }

    #[test]
    fn unknown_maneuver_values_deserialize() {
        let json = r#"{"maneuver":{"type":"exit rotary","modifier":"backwards"},
                       "distance_m":12.0,"instruction":"Exit"}"#;
        let step: RouteStep = serde_json::from_str(json).unwrap();
        assert_eq!(step.maneuver.kind, ManeuverType::Other);
        assert_eq!(step.maneuver.modifier, Some(ManeuverModifier::Other));
        assert_eq!(step.speed_limit_kph, None);
    }

    #[test]
    fn spaced_maneuver_names_deserialize() {
        let json = r#"{"type":"end of road","modifier":"sharp right"}"#;
        let maneuver: Maneuver = serde_json::from_str(json).unwrap();
        assert_eq!(maneuver.kind, ManeuverType::EndOfRoad);
        assert_eq!(maneuver.modifier, Some(ManeuverModifier::SharpRight));
    }
}
