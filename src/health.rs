/// Tracks how long the location stream has been silent, counted in session ticks
#[derive(Clone, Debug)]
pub struct FixHealth {
    silent_ticks: u64,
    lapse_after_ticks: u64,
    timeout_after_ticks: Option<u64>,
    lapsed: bool,
}

/// Assessment after a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixHealthState {
    Healthy,
    /// Crossed the lapse threshold on this tick
    Lapsed,
    /// No fix within the location timeout
    TimedOut,
}

impl FixHealth {
    /// `timeout_after_secs == 0` disables the timeout
    pub fn new(lapse_after_secs: u64, timeout_after_secs: u64) -> Self {
        FixHealth {
            silent_ticks: 0,
            lapse_after_ticks: lapse_after_secs.max(1),
            timeout_after_ticks: (timeout_after_secs > 0).then_some(timeout_after_secs),
            lapsed: false,
        }
    }

    pub fn record_fix(&mut self) {
        self.silent_ticks = 0;
        self.lapsed = false;
    }

    pub fn record_tick(&mut self) -> FixHealthState {
        self.silent_ticks += 1;

        if let Some(timeout) = self.timeout_after_ticks {
            if self.silent_ticks >= timeout {
                return FixHealthState::TimedOut;
            }
        }

        if !self.lapsed && self.silent_ticks >= self.lapse_after_ticks {
            self.lapsed = true;
            return FixHealthState::Lapsed;
        }

        FixHealthState::Healthy
    }

    pub fn silent_seconds(&self) -> u64 {
        self.silent_ticks
    }

    pub fn reset(&mut self) {
        self.record_fix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lapse_reported_once() {
        let mut health = FixHealth::new(3, 0);

        assert_eq!(health.record_tick(), FixHealthState::Healthy);
        assert_eq!(health.record_tick(), FixHealthState::Healthy);
        assert_eq!(health.record_tick(), FixHealthState::Lapsed);
        assert_eq!(health.record_tick(), FixHealthState::Healthy);
        assert_eq!(health.silent_seconds(), 4);

        // A fix re-arms the lapse detector
        health.record_fix();
        for _ in 0..2 {
            assert_eq!(health.record_tick(), FixHealthState::Healthy);
        }
        assert_eq!(health.record_tick(), FixHealthState::Lapsed);
    }

    #[test]
    fn test_timeout() {
        let mut health = FixHealth::new(10, 20);
        for _ in 0..19 {
            assert_ne!(health.record_tick(), FixHealthState::TimedOut);
        }
        assert_eq!(health.record_tick(), FixHealthState::TimedOut);
    }

    #[test]
    fn test_zero_timeout_never_fires() {
        let mut health = FixHealth::new(5, 0);
        for _ in 0..1000 {
            assert_ne!(health.record_tick(), FixHealthState::TimedOut);
        }
    }
}
