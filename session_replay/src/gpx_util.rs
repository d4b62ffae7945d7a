use std::{fs::File, io::{BufReader, Read}, path::Path};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use session_tracker_lib::{Coordinate, PositionSample};

/// Reported when the speed is unknown, the tracker keeps its previous speed for these.
const UNKNOWN_SPEED: f64 = -1.0;

pub fn read_gpx_file(path: &Path) -> Result<Vec<PositionSample>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_samples(BufReader::new(file))
}

/// Flattens all tracks and segments into one stream of samples.
pub fn read_samples(reader: impl Read) -> Result<Vec<PositionSample>> {
    let gpx = gpx::read(reader).map_err(|err| anyhow!("Failed to parse GPX: {err}"))?;

    let mut samples: Vec<PositionSample> = Vec::new();
    for track in gpx.tracks {
        for segment in track.segments {
            for point in segment.points {
                let coordinate = Coordinate::from(point.point());

                let previous = samples.last();
                let timestamp = match point.time {
                    Some(time) => {
                        let formatted = time.format().map_err(|err| anyhow!("Bad point time: {err}"))?;
                        DateTime::parse_from_rfc3339(&formatted)
                            .with_context(|| format!("Bad point time {formatted}"))?
                            .with_timezone(&Utc)
                    }
                    // Assume one fix per second when the track has no times
                    None => previous.map(|p| p.timestamp + TimeDelta::seconds(1)).unwrap_or_else(Utc::now),
                };

                let speed = point
                    .speed
                    .or_else(|| previous.and_then(|p| derived_speed(p, &coordinate, timestamp)))
                    .unwrap_or(UNKNOWN_SPEED);

                samples.push(PositionSample::new(coordinate, speed, timestamp));
            }
        }
    }

    Ok(samples)
}

fn derived_speed(previous: &PositionSample, coordinate: &Coordinate, timestamp: DateTime<Utc>) -> Option<f64> {
    let seconds = (timestamp - previous.timestamp).num_milliseconds() as f64 / 1000.0;
    (seconds > 0.0).then(|| previous.coordinate.distance_to(coordinate) / seconds)
}

#[cfg(test)]
pub(crate) const EAST_WALK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="session_replay" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>East walk</name>
    <trkseg>
      <trkpt lat="0.0" lon="0.0"><time>2024-05-01T10:00:00Z</time></trkpt>
      <trkpt lat="0.0" lon="0.001"><time>2024-05-01T10:00:10Z</time></trkpt>
      <trkpt lat="0.0" lon="0.002"><time>2024-05-01T10:00:20Z</time></trkpt>
      <trkpt lat="0.0" lon="0.003"><time>2024-05-01T10:00:30Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

#[test]
fn reads_track_points() {
    let samples = read_samples(EAST_WALK_GPX.as_bytes()).unwrap();
    assert_eq!(samples.len(), 4);

    assert_eq!(samples[1].coordinate, Coordinate::new(0.0, 0.001));
    assert_eq!((samples[3].timestamp - samples[0].timestamp).num_seconds(), 30);

    // No speed in the file, derived from the distance covered in 10 s
    assert_eq!(samples[0].reported_speed_mps, UNKNOWN_SPEED);
    assert!((samples[1].reported_speed_mps - 11.12).abs() < 0.01);
}

#[test]
fn rejects_garbage() {
    assert!(read_samples("not a gpx file".as_bytes()).is_err());
}
