//! Listen-progress tracking
//!
//! Decides when a listening session has accumulated enough genuine playback
//! time to credit a view. Time is accumulated from the media output's
//! periodic time-advance ticks; jumps that cannot be real-time playback
//! (seeks, skips, stalls followed by a burst) are not credited.
//!
//! Per track the tracker is a two-state machine:
//!
//! ```text
//! NotRegistered --(accumulated >= threshold)--> Registered
//!       ^                                           |
//!       +------ track change / restart-from-zero ---+
//! ```

use serde::{Deserialize, Serialize};

/// Thresholds for crediting a listen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenPolicy {
    /// Seconds of listening that always earn a view on long tracks (default: 30)
    pub full_credit_secs: f64,

    /// Tracks at least this long use `full_credit_secs` (default: 60)
    pub long_track_secs: f64,

    /// Fraction of the duration required on shorter tracks (default: 0.40)
    pub short_track_ratio: f64,

    /// Tick intervals at or above this are treated as seeks (default: 1.5)
    pub max_tick_gap_secs: f64,

    /// A tick below this position may signal a restart (default: 0.5)
    pub restart_window_secs: f64,

    /// ...if the previous tick was past this position (default: 1.0)
    pub restart_min_previous_secs: f64,
}

impl Default for ListenPolicy {
    fn default() -> Self {
        Self {
            full_credit_secs: 30.0,
            long_track_secs: 60.0,
            short_track_ratio: 0.40,
            max_tick_gap_secs: 1.5,
            restart_window_secs: 0.5,
            restart_min_previous_secs: 1.0,
        }
    }
}

impl ListenPolicy {
    /// Accumulated seconds required before a view is credited
    ///
    /// Returns `None` while the duration is unknown (not finite or not
    /// positive); nothing is credited until metadata supplies one.
    pub fn threshold(&self, duration_secs: f64) -> Option<f64> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return None;
        }

        if duration_secs >= self.long_track_secs {
            Some(self.full_credit_secs)
        } else {
            Some(self.short_track_ratio * duration_secs)
        }
    }
}

/// Listening progress for the current track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenProgress {
    accumulated_secs: f64,
    view_registered: bool,
    last_observed_secs: f64,
}

impl ListenProgress {
    /// Fresh progress for a newly current track
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything (track changed or repeat-one loop)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Seconds of credited listening so far
    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    /// Whether a view has been credited in this session
    pub fn view_registered(&self) -> bool {
        self.view_registered
    }

    /// Playback position seen on the last tick or seek
    pub fn last_observed_secs(&self) -> f64 {
        self.last_observed_secs
    }

    /// Record an explicit position change so the jump is not counted as listening
    pub fn mark_position(&mut self, position_secs: f64) {
        self.last_observed_secs = position_secs;
    }

    /// Feed one time-advance tick
    ///
    /// Returns `true` exactly once per session: on the tick that crosses the
    /// threshold. The latch is set before returning so ticks that arrive while
    /// the registration call is in flight cannot fire it again.
    pub fn observe(&mut self, now_secs: f64, duration_secs: f64, policy: &ListenPolicy) -> bool {
        if now_secs < policy.restart_window_secs
            && self.last_observed_secs > policy.restart_min_previous_secs
        {
            self.accumulated_secs = 0.0;
            self.view_registered = false;
        }

        let delta = now_secs - self.last_observed_secs;
        if delta > 0.0 && delta < policy.max_tick_gap_secs && !self.view_registered {
            self.accumulated_secs += delta;
        }
        self.last_observed_secs = now_secs;

        match policy.threshold(duration_secs) {
            Some(threshold) if !self.view_registered && self.accumulated_secs >= threshold => {
                self.view_registered = true;
                true
            }
            _ => false,
        }
    }
}
