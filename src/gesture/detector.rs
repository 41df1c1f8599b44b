//! Double-tap state machine.
//!
//! The whole state is one timestamp: `0.0` means IDLE, anything else is the
//! time of an unanswered first tap (ARMED). A second control press landing
//! strictly inside `(debounce, window)` fires and returns to IDLE, so a
//! third tap has to start a fresh pair.

use crate::config::GestureConfig;

/// Taps closer than this are key-repeat noise.
pub const DEFAULT_DEBOUNCE_SECS: f64 = 0.05;

/// Taps further apart than this are two single taps.
pub const DEFAULT_WINDOW_SECS: f64 = 0.5;

/// Keys the detector distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    LeftCtrl,
    RightCtrl,
    Other,
}

impl KeyCode {
    /// Map an X11 keycode (`detail` field of an XI2 key event).
    pub fn from_x11_detail(detail: u32) -> Self {
        match detail {
            37 => Self::LeftCtrl,
            105 => Self::RightCtrl,
            _ => Self::Other,
        }
    }

    pub fn is_ctrl(self) -> bool {
        matches!(self, Self::LeftCtrl | Self::RightCtrl)
    }
}

/// A key press at a monotonic time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub timestamp: f64,
}

impl KeyEvent {
    pub fn new(key: KeyCode, timestamp: f64) -> Self {
        Self { key, timestamp }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureState {
    pub last_ctrl_timestamp: f64,
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        self.last_ctrl_timestamp <= 0.0
    }
}

/// Emitted when a double tap is recognised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    /// Timestamp of the second tap.
    pub at: f64,
    /// Gap between the two taps.
    pub interval: f64,
}

/// Timing thresholds for the double tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleTap {
    debounce: f64,
    window: f64,
}

impl Default for DoubleTap {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_SECS, DEFAULT_WINDOW_SECS)
    }
}

impl DoubleTap {
    pub fn new(debounce: f64, window: f64) -> Self {
        Self { debounce, window }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(config.debounce_secs, config.window_secs)
    }

    /// Pure transition: `(state, event) -> (state, trigger)`.
    ///
    /// Non-control keys leave the state untouched.
    pub fn transition(
        &self,
        state: GestureState,
        event: KeyEvent,
    ) -> (GestureState, Option<Trigger>) {
        if !event.key.is_ctrl() {
            return (state, None);
        }

        let dt = event.timestamp - state.last_ctrl_timestamp;
        if !state.is_idle() && dt > self.debounce && dt < self.window {
            return (
                GestureState::default(),
                Some(Trigger {
                    at: event.timestamp,
                    interval: dt,
                }),
            );
        }

        (
            GestureState {
                last_ctrl_timestamp: event.timestamp,
            },
            None,
        )
    }
}

/// Owns one [`GestureState`] for the lifetime of a listener.
#[derive(Debug, Clone, Default)]
pub struct GestureDetector {
    timing: DoubleTap,
    state: GestureState,
}

impl GestureDetector {
    pub fn new(timing: DoubleTap) -> Self {
        Self {
            timing,
            state: GestureState::default(),
        }
    }

    pub fn on_event(&mut self, event: KeyEvent) -> Option<Trigger> {
        let (next, trigger) = self.timing.transition(self.state, event);
        self.state = next;
        trigger
    }

    pub fn state(&self) -> GestureState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(t: f64) -> KeyEvent {
        KeyEvent::new(KeyCode::LeftCtrl, t)
    }

    fn armed(t: f64) -> GestureState {
        GestureState {
            last_ctrl_timestamp: t,
        }
    }

    #[test]
    fn tap_inside_window_fires_and_resets() {
        let timing = DoubleTap::default();
        for dt in [0.051, 0.1, 0.25, 0.49] {
            let (state, trigger) = timing.transition(armed(100.0), ctrl(100.0 + dt));
            let trigger = trigger.unwrap_or_else(|| panic!("dt={dt} should fire"));
            assert!((trigger.interval - dt).abs() < 1e-9);
            assert!(state.is_idle());
        }
    }

    #[test]
    fn tap_outside_window_arms_at_new_time() {
        let timing = DoubleTap::default();
        for dt in [0.0, 0.01, 0.05, 0.5, 0.9, 30.0] {
            let t = 100.0 + dt;
            let (state, trigger) = timing.transition(armed(100.0), ctrl(t));
            assert!(trigger.is_none(), "dt={dt} should not fire");
            assert_eq!(state, armed(t));
        }
    }

    #[test]
    fn first_tap_from_idle_only_arms() {
        let timing = DoubleTap::default();
        let (state, trigger) = timing.transition(GestureState::default(), ctrl(0.2));
        assert!(trigger.is_none());
        assert_eq!(state, armed(0.2));
    }

    #[test]
    fn triple_tap_fires_once() {
        let mut detector = GestureDetector::default();
        let fired: Vec<_> = [1000.0, 1000.1, 1000.2]
            .into_iter()
            .filter_map(|t| detector.on_event(ctrl(t)))
            .collect();
        assert_eq!(fired.len(), 1);
        assert!((fired[0].at - 1000.1).abs() < 1e-9);
        assert_eq!(detector.state(), armed(1000.2));
    }

    #[test]
    fn four_quick_taps_fire_twice() {
        let mut detector = GestureDetector::default();
        let fired = [50.0, 50.1, 50.2, 50.3]
            .into_iter()
            .filter_map(|t| detector.on_event(ctrl(t)))
            .count();
        assert_eq!(fired, 2);
    }

    #[test]
    fn key_repeat_keeps_rearming() {
        let mut detector = GestureDetector::default();
        // Held key: repeats every 30ms never clear the debounce floor.
        let fired = (0..20)
            .filter_map(|i| detector.on_event(ctrl(10.0 + f64::from(i) * 0.03)))
            .count();
        assert_eq!(fired, 0);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut detector = GestureDetector::default();
        detector.on_event(ctrl(5.0));
        assert!(detector
            .on_event(KeyEvent::new(KeyCode::Other, 5.1))
            .is_none());
        assert_eq!(detector.state(), armed(5.0));
        assert!(detector.on_event(ctrl(5.2)).is_some());
    }

    #[test]
    fn left_and_right_ctrl_pair_up() {
        let mut detector = GestureDetector::default();
        detector.on_event(KeyEvent::new(KeyCode::LeftCtrl, 7.0));
        assert!(detector
            .on_event(KeyEvent::new(KeyCode::RightCtrl, 7.2))
            .is_some());
    }

    #[test]
    fn custom_window_is_respected() {
        let timing = DoubleTap::new(0.05, 1.0);
        let (_, trigger) = timing.transition(armed(1.0), ctrl(1.8));
        assert!(trigger.is_some());
    }

    #[test]
    fn x11_detail_mapping() {
        assert_eq!(KeyCode::from_x11_detail(37), KeyCode::LeftCtrl);
        assert_eq!(KeyCode::from_x11_detail(105), KeyCode::RightCtrl);
        assert_eq!(KeyCode::from_x11_detail(50), KeyCode::Other);
        assert!(!KeyCode::Other.is_ctrl());
    }
}
