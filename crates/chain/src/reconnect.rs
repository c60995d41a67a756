use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ReconnectConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectConfig {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            base: self.base_delay,
            max: self.max_delay,
            current: self.base_delay,
        }
    }
}

/// Exponential backoff: doubles on each step, saturating at `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Delay to sleep before the next attempt; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let next_ms = (self.current.as_millis().saturating_mul(2)) as u64;
        let max_ms = self.max.as_millis() as u64;
        self.current = Duration::from_millis(next_ms.min(max_ms));
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

#[cfg(test)]
mod tests {
    use super::ReconnectConfig;
    use std::time::Duration;

    #[test]
    fn doubles_and_saturates() {
        let mut backoff = ReconnectConfig::new(500, 3_000).backoff();
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(2_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(3_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(3_000));
    }

    #[test]
    fn reset_restores_base() {
        let mut backoff = ReconnectConfig::new(100, 1_000).backoff();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
