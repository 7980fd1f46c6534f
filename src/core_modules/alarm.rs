use chrono::{DateTime, Local};
use std::fmt;

/// The two states of the intrusion alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmState {
    #[default]
    Idle,
    Triggered,
}

/// Emitted once, on the frame where the alarm goes from idle to triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmEvent {
    pub at: DateTime<Local>,
}

impl fmt::Display for AlarmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[ALERT] Intruder detected at {}",
            self.at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Per-frame alarm flag. There is no debounce: every frame re-evaluates the
/// state from scratch, so intermittent motion makes it flicker.
#[derive(Debug, Default)]
pub struct Alarm {
    state: AlarmState,
    trigger_count: u64,
}

impl Alarm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    /// Number of idle-to-triggered transitions so far.
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    /// Feeds the outcome of one detection pass. Returns an event only when
    /// the alarm was idle and motion was found.
    pub fn update(&mut self, motion: bool, now: DateTime<Local>) -> Option<AlarmEvent> {
        let (next, event) = transition(self.state, motion, now);
        if event.is_some() {
            self.trigger_count += 1;
        }
        self.state = next;
        event
    }
}

fn transition(
    state: AlarmState,
    motion: bool,
    now: DateTime<Local>,
) -> (AlarmState, Option<AlarmEvent>) {
    match (state, motion) {
        (AlarmState::Idle, true) => (AlarmState::Triggered, Some(AlarmEvent { at: now })),
        (AlarmState::Triggered, true) => (AlarmState::Triggered, None),
        (_, false) => (AlarmState::Idle, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap()
    }

    #[test]
    fn idle_to_triggered_emits_event() {
        let (next, event) = transition(AlarmState::Idle, true, noon());
        assert_eq!(next, AlarmState::Triggered);
        assert_eq!(event, Some(AlarmEvent { at: noon() }));
    }

    #[test]
    fn staying_triggered_is_silent() {
        let (next, event) = transition(AlarmState::Triggered, true, noon());
        assert_eq!(next, AlarmState::Triggered);
        assert!(event.is_none());
    }

    #[test]
    fn quiet_frame_resets() {
        let (next, event) = transition(AlarmState::Triggered, false, noon());
        assert_eq!(next, AlarmState::Idle);
        assert!(event.is_none());
    }

    #[test]
    fn state_follows_latest_frame() {
        let mut alarm = Alarm::new();
        let pattern = [true, false, true, true, false, false, true];
        for motion in pattern {
            alarm.update(motion, noon());
            assert_eq!(alarm.state() == AlarmState::Triggered, motion);
        }
        assert_eq!(alarm.trigger_count(), 3);
    }

    #[test]
    fn alert_message_carries_timestamp() {
        let event = AlarmEvent { at: noon() };
        assert_eq!(
            event.to_string(),
            "[ALERT] Intruder detected at 2024-03-09 12:30:05"
        );
    }
}
