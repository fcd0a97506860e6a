//! Flight telemetry interface.
//!
//! File parsing lives outside this crate; the renderer only consumes a
//! [`TelemetrySource`]: a position/orientation sample per query time plus
//! global summaries (time range, altitude range, lat/lon bounding box).
//! [`RecordedTrack`] is the in-memory implementation adapters hand over once
//! they have decoded their telemetry file.

use anyhow::{Result, ensure};
use cgmath::Vector3;

use crate::terrain::grid::GeoBoundingBox;

/// One interpolated sample: position in local meters, attitude in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub position: Vector3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Default for TrackPoint {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

/// What the renderer needs from a recorded flight.
pub trait TelemetrySource {
    /// Sample the track at `time` (seconds). Times outside the recording
    /// clamp to the first/last sample.
    fn point_at(&self, time: f64) -> TrackPoint;
    fn bounding_box(&self) -> GeoBoundingBox;
    fn start_time(&self) -> f64;
    fn end_time(&self) -> f64;
    fn min_altitude(&self) -> f64;
    fn max_altitude(&self) -> f64;
}

/// A time-sorted sequence of samples with linear interpolation between them.
#[derive(Debug, Clone)]
pub struct RecordedTrack {
    samples: Vec<(f64, TrackPoint)>,
    bbox: GeoBoundingBox,
    min_altitude: f64,
    max_altitude: f64,
}

impl RecordedTrack {
    pub fn new(
        samples: Vec<(f64, TrackPoint)>,
        bbox: GeoBoundingBox,
        min_altitude: f64,
        max_altitude: f64,
    ) -> Result<Self> {
        ensure!(!samples.is_empty(), "a track needs at least one sample");
        ensure!(
            samples.windows(2).all(|w| w[0].0 <= w[1].0),
            "track samples must be sorted by time"
        );
        Ok(Self {
            samples,
            bbox,
            min_altitude,
            max_altitude,
        })
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl TelemetrySource for RecordedTrack {
    fn point_at(&self, time: f64) -> TrackPoint {
        let first = &self.samples[0];
        let last = self.samples.last().unwrap();
        if time <= first.0 {
            return first.1;
        }
        if time >= last.0 {
            return last.1;
        }
        let next = self
            .samples
            .partition_point(|(t, _)| *t <= time)
            .min(self.samples.len() - 1);
        let (t0, p0) = self.samples[next - 1];
        let (t1, p1) = self.samples[next];
        if t1 == t0 {
            return p0;
        }
        let t = ((time - t0) / (t1 - t0)) as f32;
        TrackPoint {
            position: p0.position + (p1.position - p0.position) * t,
            yaw: lerp(p0.yaw, p1.yaw, t),
            pitch: lerp(p0.pitch, p1.pitch, t),
            roll: lerp(p0.roll, p1.roll, t),
        }
    }

    fn bounding_box(&self) -> GeoBoundingBox {
        self.bbox
    }

    fn start_time(&self) -> f64 {
        self.samples[0].0
    }

    fn end_time(&self) -> f64 {
        self.samples.last().unwrap().0
    }

    fn min_altitude(&self) -> f64 {
        self.min_altitude
    }

    fn max_altitude(&self) -> f64 {
        self.max_altitude
    }
}
