use instant::Instant;

/// Which phase of the simulation tick is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Steering = 0,
    Movement = 1,
    SpatialRebuild = 2,
    Interaction = 3,
}

impl SystemPhase {
    pub const ALL: [SystemPhase; 4] = [
        Self::Steering,
        Self::Movement,
        Self::SpatialRebuild,
        Self::Interaction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Steering => "Steering",
            Self::Movement => "Movement",
            Self::SpatialRebuild => "Spatial",
            Self::Interaction => "Interaction",
        }
    }
}

/// Per-system timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 4],
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 4],
            start: Instant::now(),
        }
    }

    /// Call before a system runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a system finishes. Folds elapsed time into `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    pub fn get(&self, phase: SystemPhase) -> f64 {
        self.durations_us[phase as usize]
    }

    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }

    /// One-line breakdown for the periodic stats log.
    pub fn summary(&self) -> String {
        SystemPhase::ALL
            .iter()
            .map(|&p| format!("{} {:.1}us", p.label(), self.get(p)))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Default for SystemTimers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_moves_toward_samples() {
        let mut timers = SystemTimers::new();
        timers.begin();
        std::thread::sleep(std::time::Duration::from_millis(2));
        timers.end(SystemPhase::Movement);
        assert!(timers.get(SystemPhase::Movement) > 0.0);
        assert_eq!(timers.get(SystemPhase::Steering), 0.0);
        assert_eq!(timers.total_us(), timers.get(SystemPhase::Movement));
        assert!(timers.summary().contains("Movement"));
    }
}
