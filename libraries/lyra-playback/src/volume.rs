//! Volume control with mute memory
//!
//! Volume is a linear level in `[0, 1]`. Muting remembers the level it
//! replaced so a second toggle restores it.

/// Level restored when there is no usable mute memory
const DEFAULT_RESTORE_LEVEL: f32 = 0.5;

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Current level (0.0-1.0)
    level: f32,

    /// Level to restore on unmute
    previous: f32,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial level, clamped to 0.0-1.0
    pub fn new(level: f32) -> Self {
        let level = clamp_level(level);
        let previous = if level > 0.0 {
            level
        } else {
            DEFAULT_RESTORE_LEVEL
        };

        Self { level, previous }
    }

    /// Current level (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Level that unmuting would restore
    pub fn previous_level(&self) -> f32 {
        self.previous
    }

    /// Current level as a whole percentage
    pub fn percent(&self) -> u8 {
        (self.level * 100.0).round() as u8
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.level <= 0.0
    }

    /// Toggle mute state, returning the new level
    ///
    /// Muting saves the current level; unmuting restores it, or 0.5 when the
    /// saved level is not positive.
    pub fn toggle_mute(&mut self) -> f32 {
        if self.level > 0.0 {
            self.previous = self.level;
            self.level = 0.0;
        } else {
            self.level = if self.previous > 0.0 {
                self.previous
            } else {
                DEFAULT_RESTORE_LEVEL
            };
        }
        self.level
    }

    /// Set volume from a slider percentage (clamped to 0-100)
    ///
    /// Also overwrites the mute memory, including with zero: dragging the
    /// slider to the bottom forgets the pre-mute level.
    pub fn set_percent(&mut self, percent: f64) -> f32 {
        let percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
        self.level = (percent / 100.0) as f32;
        self.previous = self.level;
        self.level
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
