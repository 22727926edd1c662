use std::time::Duration;

/// Upper bound on a single simulation step, in seconds.
pub const DEFAULT_MAX_FRAME_DT: f32 = 1.0 / 30.0;

/// Turns host frame timestamps into a clamped `deltaTime`.
///
/// A stalled host (backgrounded tab, debugger pause) would otherwise feed
/// one enormous step into the physics.
#[derive(Debug, Clone)]
pub struct FrameClock {
    max_dt: f32,
    last: Option<Duration>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_DT)
    }
}

impl FrameClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            max_dt: if max_dt.is_finite() && max_dt > 0.0 {
                max_dt
            } else {
                DEFAULT_MAX_FRAME_DT
            },
            last: None,
        }
    }

    pub fn max_dt(&self) -> f32 {
        self.max_dt
    }

    /// Clamp a raw delta into `[0, max_dt]`; non-finite input becomes 0.
    pub fn clamp(&self, raw_dt: f32) -> f32 {
        if !raw_dt.is_finite() || raw_dt <= 0.0 {
            return 0.0;
        }
        raw_dt.min(self.max_dt)
    }

    /// Record a frame timestamp and return the clamped delta since the last one.
    /// The first call returns 0.
    pub fn tick(&mut self, now: Duration) -> f32 {
        let dt = match self.last {
            Some(prev) => now.checked_sub(prev).map_or(0.0, |d| d.as_secs_f32()),
            None => 0.0,
        };
        self.last = Some(now);
        self.clamp(dt)
    }
}
