/// Playback position in whole seconds, advanced by a once-per-second timer on
/// the assumption that the player runs in real time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionTracker {
    playing_time: u64,
    duration: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionEvent {
    Advanced(u64),
    Finished,
}

impl PositionTracker {
    pub fn new(duration: u64, playing_time: u64) -> Self {
        Self {
            playing_time: playing_time.min(duration),
            duration,
        }
    }

    pub fn playing_time(&self) -> u64 {
        self.playing_time
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn set(&mut self, secs: u64) {
        self.playing_time = secs.min(self.duration);
    }

    pub fn reset(&mut self) {
        self.playing_time = 0;
    }

    pub fn advance(&mut self) -> PositionEvent {
        if self.playing_time < self.duration {
            self.playing_time += 1;
            PositionEvent::Advanced(self.playing_time)
        } else {
            PositionEvent::Finished
        }
    }

    pub fn label(&self) -> String {
        format_position(self.playing_time, self.duration)
    }
}

/// `m:ss/M:SS`
pub fn format_position(secs: u64, duration: u64) -> String {
    format!(
        "{}:{:02}/{}:{:02}",
        secs / 60,
        secs % 60,
        duration / 60,
        duration % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_until_duration_then_finishes() {
        let mut tracker = PositionTracker::new(2, 0);
        assert_eq!(tracker.advance(), PositionEvent::Advanced(1));
        assert_eq!(tracker.advance(), PositionEvent::Advanced(2));
        assert_eq!(tracker.advance(), PositionEvent::Finished);
        assert_eq!(tracker.playing_time(), 2);
    }

    #[test]
    fn positions_clamp_to_duration() {
        let mut tracker = PositionTracker::new(100, 250);
        assert_eq!(tracker.playing_time(), 100);
        tracker.set(30);
        assert_eq!(tracker.playing_time(), 30);
        tracker.set(101);
        assert_eq!(tracker.playing_time(), 100);
        tracker.reset();
        assert_eq!(tracker.playing_time(), 0);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_position(0, 100), "0:00/1:40");
        assert_eq!(format_position(65, 3600), "1:05/60:00");
        assert_eq!(PositionTracker::new(61, 9).label(), "0:09/1:01");
    }
}
