use std::time::Duration;

/// Identifies one arming of a periodic timer. A fire carrying a token from an
/// earlier arming is stale and must be ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickToken(pub u64);

/// A periodic timer the owner can arm and disarm. Implementations deliver
/// fires on the caller's thread; they never call back into the owner.
pub trait Scheduler {
    /// Arm (or re-arm) the timer. Any previously issued token becomes stale.
    fn start(&mut self, interval: Duration) -> TickToken;
    /// Disarm. Safe to call when already stopped.
    fn stop(&mut self);
}

/// Scheduler for tests: records arming and lets the test fire ticks by hand.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pub generation: u64,
    pub interval: Option<Duration>,
    pub armed: bool,
    pub starts: usize,
    pub stops: usize,
}

#[cfg(test)]
impl ManualScheduler {
    pub fn current(&self) -> Option<TickToken> {
        self.armed.then_some(TickToken(self.generation))
    }
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
    fn start(&mut self, interval: Duration) -> TickToken {
        self.generation += 1;
        self.interval = Some(interval);
        self.armed = true;
        self.starts += 1;
        TickToken(self.generation)
    }

    fn stop(&mut self) {
        self.armed = false;
        self.stops += 1;
    }
}
