pub const DEFAULT_TICK_RATE: u32 = 60;

pub struct FixedTimestep {
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            dt: 1.0 / tick_rate.max(1) as f32,
            accumulator: 0.0,
        }
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(0.25);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }
}

/// Converts wall-clock seconds to whole ticks at `tick_rate`.
pub fn seconds_to_ticks(seconds: f32, tick_rate: u32) -> u64 {
    (seconds * tick_rate as f32).round().max(0.0) as u64
}
