use std::time::{Duration, Instant};

/// Wall-clock stopwatch for `duration_ms` fields.
#[derive(Debug, Clone, Copy)]
pub struct SpanTimer(Instant);

impl SpanTimer {
    /// Starts timing now.
    #[must_use]
    pub fn start() -> Self {
        Self(Instant::now())
    }

    /// Time since [`start`](Self::start).
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Time since [`start`](Self::start), in fractional milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_ms_tracks_elapsed() {
        let timer = SpanTimer::start();
        std::thread::sleep(Duration::from_millis(10));

        let ms = timer.elapsed_ms();
        assert!(ms >= 10.0, "{ms}");
        assert!(timer.elapsed() >= Duration::from_millis(10));
    }
}
