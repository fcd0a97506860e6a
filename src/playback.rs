//! Replay clock and HUD readouts.
//!
//! The clock advances replay time by wall-clock delta times scaled with a
//! signed multiplier, clamped to the telemetry's time range. The overlay
//! collaborator reads a [`HudState`] snapshot each frame and feeds control
//! calls back in through the named actions in [`crate::app`].

use cgmath::Vector3;
use instant::Duration;

/// Largest fast-forward factor; doubling stops here.
const MAX_MULTIPLIER: f64 = 16.0;

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    time: f64,
    start: f64,
    end: f64,
    multiplier: f64,
    playing: bool,
}

impl PlaybackClock {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            time: start,
            start,
            end: end.max(start),
            multiplier: 1.0,
            playing: true,
        }
    }

    /// Advance by one frame's wall-clock delta.
    pub fn update(&mut self, dt: Duration) {
        if self.playing {
            self.time =
                (self.time + dt.as_secs_f64() * self.multiplier).clamp(self.start, self.end);
        }
    }

    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
    }

    /// Double the forward speed, capped; also turns a rewind forward again.
    pub fn fast_forward(&mut self) {
        self.multiplier = (self.multiplier.abs() * 2.0).min(MAX_MULTIPLIER);
    }

    /// Play backwards at the current speed.
    pub fn rewind(&mut self) {
        self.multiplier = -self.multiplier.abs();
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Read-only per-frame snapshot for the UI overlay.
#[derive(Debug, Clone, Copy)]
pub struct HudState {
    pub position: Vector3<f32>,
    pub min_altitude: f64,
    pub max_altitude: f64,
    pub time: f64,
    pub multiplier: f64,
    pub playing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_advances_scaled_by_the_multiplier() {
        let mut clock = PlaybackClock::new(0.0, 100.0);
        clock.update(Duration::from_secs(2));
        assert_eq!(clock.time(), 2.0);
        clock.fast_forward();
        clock.update(Duration::from_secs(2));
        assert_eq!(clock.time(), 6.0);
    }

    #[test]
    fn pause_freezes_time() {
        let mut clock = PlaybackClock::new(0.0, 100.0);
        clock.toggle_play();
        clock.update(Duration::from_secs(5));
        assert_eq!(clock.time(), 0.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn time_clamps_to_the_recording_range() {
        let mut clock = PlaybackClock::new(10.0, 12.0);
        clock.update(Duration::from_secs(60));
        assert_eq!(clock.time(), 12.0);
        clock.rewind();
        clock.update(Duration::from_secs(60));
        assert_eq!(clock.time(), 10.0);
    }

    #[test]
    fn fast_forward_caps_and_recovers_from_rewind() {
        let mut clock = PlaybackClock::new(0.0, 1.0);
        clock.rewind();
        assert_eq!(clock.multiplier(), -1.0);
        clock.fast_forward();
        assert_eq!(clock.multiplier(), 2.0);
        for _ in 0..10 {
            clock.fast_forward();
        }
        assert_eq!(clock.multiplier(), MAX_MULTIPLIER);
    }
}
