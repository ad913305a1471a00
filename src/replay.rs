//! Telemetry replay from recorded GPX tracks.
//!
//! Wraps the `gpx` crate and turns the first track of a file into the
//! telemetry samples a live location subsystem would have produced. Used
//! to drive the HUD in demos and tests without a device.

use chrono::{DateTime, Utc};
use log::debug;
use std::io::Read;

use crate::error::{Error, Result};
use crate::geo::{haversine, Coordinates};
use crate::guidance::TelemetrySample;

/// Parse a GPX document and return one sample per timed track point.
///
/// Points without a timestamp cannot be placed in the stream and are
/// skipped. Speed comes from the point's `<speed>` element when present,
/// otherwise from the distance to the previous timed point.
pub fn parse<R: Read>(reader: R) -> Result<Vec<TelemetrySample>> {
    let gpx = gpx::read(reader).map_err(|e| Error::Gpx(e.to_string()))?;

    let Some(track) = gpx.tracks.first() else {
        return Ok(Vec::new());
    };

    let mut samples: Vec<TelemetrySample> = Vec::new();
    let mut skipped = 0usize;

    for wp in track.segments.iter().flat_map(|seg| seg.points.iter()) {
        let Some(time) = wp.time.as_ref() else {
            skipped += 1;
            continue;
        };
        let timestamp = to_utc(time)?;
        let position = Coordinates::new(wp.point().y(), wp.point().x());

        let speed_mps = wp.speed.or_else(|| {
            samples
                .last()
                .and_then(|prev| derived_speed(prev, &position, timestamp))
        });

        samples.push(TelemetrySample {
            position: Some(position),
            speed_mps,
            timestamp,
        });
    }

    if skipped > 0 {
        debug!("replay skipped {skipped} track points without time");
    }
    Ok(samples)
}

/// Parse from a byte slice. Convenience wrapper for JNI.
pub fn parse_bytes(data: &[u8]) -> Result<Vec<TelemetrySample>> {
    parse(data)
}

fn to_utc(time: &gpx::Time) -> Result<DateTime<Utc>> {
    let text = time.format().map_err(|e| Error::Time(e.to_string()))?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Time(format!("{text}: {e}")))
}

fn derived_speed(prev: &TelemetrySample, position: &Coordinates, at: DateTime<Utc>) -> Option<f64> {
    let from = prev.position.as_ref()?;
    let elapsed_s = (at - prev.timestamp).num_milliseconds() as f64 / 1000.0;
    if elapsed_s <= 0.0 {
        return None;
    }
    Some(haversine(from, position) / elapsed_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TIMED_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Commute</name>
    <trkseg>
      <trkpt lat="48.0000" lon="16.0000"><time>2024-05-01T08:00:00Z</time></trkpt>
      <trkpt lat="48.0009" lon="16.0000"><time>2024-05-01T08:00:10Z</time></trkpt>
      <trkpt lat="48.0010" lon="16.0000"></trkpt>
      <trkpt lat="48.0018" lon="16.0000"><time>2024-05-01T08:00:20Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn timed_points_become_samples() {
        let samples = parse_bytes(TIMED_GPX.as_bytes()).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );
        let p = samples[1].position.unwrap();
        assert!((p.lat - 48.0009).abs() < 1e-6);
        assert!((p.lng - 16.0).abs() < 1e-6);
    }

    #[test]
    fn first_sample_has_no_speed() {
        let samples = parse_bytes(TIMED_GPX.as_bytes()).unwrap();
        assert_eq!(samples[0].speed_mps, None);
    }

    #[test]
    fn speed_derived_from_distance() {
        // 0.0009 deg of latitude ~100 m in 10 s
        let samples = parse_bytes(TIMED_GPX.as_bytes()).unwrap();
        let speed = samples[1].speed_mps.unwrap();
        assert!((speed - 10.0).abs() < 0.2, "Expected ~10 m/s, got {speed}");
    }

    #[test]
    fn no_tracks_gives_empty_replay() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test"
     xmlns="http://www.topografix.com/GPX/1/1">
</gpx>"#;
        assert!(parse_bytes(empty.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn invalid_xml_returns_error() {
        assert!(matches!(parse_bytes(b"not xml at all"), Err(Error::Gpx(_))));
    }
}
