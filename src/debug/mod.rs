pub mod ring;
pub mod timer;

use self::ring::RingBuffer;

/// Number of frame times kept for the rolling stats.
const FRAME_HISTORY_LEN: usize = 300;

/// Rolling frame-time statistics for the host loop.
pub struct FrameStats {
    frame_times: RingBuffer<f64>,
    pub frame_count: u64,
    since_log: f64,
}

/// Summary over the rolling window (milliseconds, except `fps`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub fps: f64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: RingBuffer::new(FRAME_HISTORY_LEN),
            frame_count: 0,
            since_log: 0.0,
        }
    }

    pub fn record_frame(&mut self, dt: f64) {
        self.frame_times.push(dt);
        self.frame_count += 1;
        self.since_log += dt;
    }

    pub fn summary(&self) -> Option<FrameSummary> {
        if self.frame_times.is_empty() {
            return None;
        }
        let (mut sum, mut min, mut max) = (0.0, f64::MAX, 0.0f64);
        for &t in self.frame_times.iter() {
            sum += t;
            min = min.min(t);
            max = max.max(t);
        }
        let avg = sum / self.frame_times.len() as f64;
        Some(FrameSummary {
            fps: if avg > 0.0 { 1.0 / avg } else { 0.0 },
            avg_ms: avg * 1000.0,
            min_ms: min * 1000.0,
            max_ms: max * 1000.0,
        })
    }

    /// True once `interval` seconds of frames have gone by since the last
    /// time this returned true.
    pub fn log_due(&mut self, interval: f64) -> bool {
        if self.since_log >= interval {
            self.since_log = 0.0;
            true
        } else {
            false
        }
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_over_window() {
        let mut stats = FrameStats::new();
        assert!(stats.summary().is_none());
        stats.record_frame(0.010);
        stats.record_frame(0.030);
        let s = stats.summary().unwrap();
        assert!((s.avg_ms - 20.0).abs() < 1e-9);
        assert!((s.min_ms - 10.0).abs() < 1e-9);
        assert!((s.max_ms - 30.0).abs() < 1e-9);
        assert!((s.fps - 50.0).abs() < 1e-6);
    }

    #[test]
    fn log_interval_resets() {
        let mut stats = FrameStats::new();
        stats.record_frame(0.6);
        assert!(!stats.log_due(1.0));
        stats.record_frame(0.6);
        assert!(stats.log_due(1.0));
        assert!(!stats.log_due(1.0));
    }
}
