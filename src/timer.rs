//! Countdown/stopwatch state for the widget's timer mode.
//!
//! Pure state machine: the GUI owns the clock and calls [`TimerState::tick`]
//! once per elapsed second. Both modes persist their progress so hiding the
//! widget or restarting the app resumes where the timer left off.

use crate::settings::{Section, bool_to_str, get_bool, get_num, get_str};

const MAX_COUNTDOWN_MINUTES: u32 = 99;
const MAX_COUNTDOWN_SECONDS: u32 = 59;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Countdown,
    Stopwatch,
}

impl TimerMode {
    pub fn from_key(key: &str) -> Self {
        if key == "stopwatch" { Self::Stopwatch } else { Self::Countdown }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Countdown => "countdown",
            Self::Stopwatch => "stopwatch",
        }
    }
}

/// Typed view of the timer keys inside the roll-call settings section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub mode: TimerMode,
    pub countdown_minutes: u32,
    pub countdown_seconds: u32,
    pub seconds_left: u32,
    pub stopwatch_seconds: u32,
    pub running: bool,
    pub sound_enabled: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            mode: TimerMode::Countdown,
            countdown_minutes: 5,
            countdown_seconds: 0,
            seconds_left: 300,
            stopwatch_seconds: 0,
            running: false,
            sound_enabled: true,
        }
    }
}

impl TimerConfig {
    pub fn from_section(section: &Section) -> Self {
        let defaults = Self::default();
        Self {
            mode: TimerMode::from_key(get_str(section, "timer_mode", defaults.mode.as_key())),
            countdown_minutes: get_num(section, "timer_countdown_minutes", defaults.countdown_minutes)
                .min(MAX_COUNTDOWN_MINUTES),
            countdown_seconds: get_num(section, "timer_countdown_seconds", defaults.countdown_seconds)
                .min(MAX_COUNTDOWN_SECONDS),
            seconds_left: get_num(section, "timer_seconds_left", defaults.seconds_left),
            stopwatch_seconds: get_num(section, "timer_stopwatch_seconds", defaults.stopwatch_seconds),
            running: get_bool(section, "timer_running", defaults.running),
            sound_enabled: get_bool(section, "timer_sound_enabled", defaults.sound_enabled),
        }
    }

    pub fn apply(&self, section: &mut Section) {
        section.insert("timer_mode".to_string(), self.mode.as_key().to_string());
        section.insert(
            "timer_countdown_minutes".to_string(),
            self.countdown_minutes.to_string(),
        );
        section.insert(
            "timer_countdown_seconds".to_string(),
            self.countdown_seconds.to_string(),
        );
        section.insert("timer_seconds_left".to_string(), self.seconds_left.to_string());
        section.insert(
            "timer_stopwatch_seconds".to_string(),
            self.stopwatch_seconds.to_string(),
        );
        section.insert("timer_running".to_string(), bool_to_str(self.running).to_string());
        section.insert(
            "timer_sound_enabled".to_string(),
            bool_to_str(self.sound_enabled).to_string(),
        );
    }
}

/// Runtime timer. One instance lives as long as the widget window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub mode: TimerMode,
    pub countdown_minutes: u32,
    pub countdown_seconds: u32,
    pub seconds_left: u32,
    pub stopwatch_seconds: u32,
    pub running: bool,
    pub sound_enabled: bool,
}

impl TimerState {
    pub fn from_config(config: TimerConfig) -> Self {
        let mut state = Self {
            mode: config.mode,
            countdown_minutes: config.countdown_minutes,
            countdown_seconds: config.countdown_seconds,
            seconds_left: config.seconds_left,
            stopwatch_seconds: config.stopwatch_seconds,
            running: config.running,
            sound_enabled: config.sound_enabled,
        };
        let full = state.configured_total();
        if state.seconds_left > full {
            state.seconds_left = full;
        }
        state
    }

    pub fn to_config(self) -> TimerConfig {
        TimerConfig {
            mode: self.mode,
            countdown_minutes: self.countdown_minutes,
            countdown_seconds: self.countdown_seconds,
            seconds_left: self.seconds_left,
            stopwatch_seconds: self.stopwatch_seconds,
            running: self.running,
            sound_enabled: self.sound_enabled,
        }
    }

    fn configured_total(&self) -> u32 {
        self.countdown_minutes * 60 + self.countdown_seconds
    }

    /// Switches between countdown and stopwatch, stopping and resetting the
    /// newly selected mode.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            TimerMode::Countdown => TimerMode::Stopwatch,
            TimerMode::Stopwatch => TimerMode::Countdown,
        };
        self.running = false;
        self.reset();
    }

    pub fn start_pause(&mut self) {
        if !self.running && self.mode == TimerMode::Countdown && self.seconds_left == 0 {
            // Starting a finished countdown rewinds it first.
            self.seconds_left = self.configured_total();
        }
        self.running = !self.running;
    }

    pub fn reset(&mut self) {
        self.running = false;
        match self.mode {
            TimerMode::Countdown => self.seconds_left = self.configured_total(),
            TimerMode::Stopwatch => self.stopwatch_seconds = 0,
        }
    }

    /// Applies a new countdown duration and rewinds the countdown.
    pub fn set_countdown(&mut self, minutes: u32, seconds: u32) {
        self.countdown_minutes = minutes.min(MAX_COUNTDOWN_MINUTES);
        self.countdown_seconds = seconds.min(MAX_COUNTDOWN_SECONDS);
        if self.mode == TimerMode::Countdown {
            self.running = false;
            self.seconds_left = self.configured_total();
        }
    }

    /// Advances one second. Returns true on the tick where a running
    /// countdown reaches zero, so the caller can raise its finish cue.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.mode {
            TimerMode::Countdown => {
                self.seconds_left = self.seconds_left.saturating_sub(1);
                if self.seconds_left == 0 {
                    self.running = false;
                    return true;
                }
                false
            }
            TimerMode::Stopwatch => {
                self.stopwatch_seconds = self.stopwatch_seconds.saturating_add(1);
                false
            }
        }
    }

    /// Current reading as `MM:SS` (minutes clamp at 99 for display).
    pub fn display(&self) -> String {
        let total = match self.mode {
            TimerMode::Countdown => self.seconds_left,
            TimerMode::Stopwatch => self.stopwatch_seconds,
        };
        format!("{:02}:{:02}", (total / 60).min(99), total % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_ticks_to_zero_and_stops() {
        let mut timer = TimerState::from_config(TimerConfig {
            mode: TimerMode::Countdown,
            countdown_minutes: 0,
            countdown_seconds: 2,
            seconds_left: 2,
            stopwatch_seconds: 0,
            running: true,
            sound_enabled: true,
        });
        assert!(!timer.tick());
        assert_eq!(timer.seconds_left, 1);
        assert!(timer.tick());
        assert_eq!(timer.seconds_left, 0);
        assert!(!timer.running);
        // Further ticks are inert.
        assert!(!timer.tick());
    }

    #[test]
    fn test_start_after_finish_rewinds_countdown() {
        let mut timer = TimerState::from_config(TimerConfig {
            mode: TimerMode::Countdown,
            countdown_minutes: 0,
            countdown_seconds: 30,
            seconds_left: 0,
            stopwatch_seconds: 0,
            running: false,
            sound_enabled: true,
        });
        timer.start_pause();
        assert!(timer.running);
        assert_eq!(timer.seconds_left, 30);
    }

    #[test]
    fn test_stopwatch_counts_up() {
        let mut timer = TimerState::from_config(TimerConfig {
            mode: TimerMode::Stopwatch,
            ..TimerConfig::default()
        });
        timer.start_pause();
        for _ in 0..65 {
            assert!(!timer.tick());
        }
        assert_eq!(timer.stopwatch_seconds, 65);
        assert_eq!(timer.display(), "01:05");
        timer.reset();
        assert_eq!(timer.stopwatch_seconds, 0);
        assert!(!timer.running);
    }

    #[test]
    fn test_toggle_mode_resets_target_mode() {
        let mut timer = TimerState::from_config(TimerConfig::default());
        timer.start_pause();
        timer.toggle_mode();
        assert_eq!(timer.mode, TimerMode::Stopwatch);
        assert!(!timer.running);
        timer.toggle_mode();
        assert_eq!(timer.mode, TimerMode::Countdown);
        assert_eq!(timer.seconds_left, 300);
    }

    #[test]
    fn test_set_countdown_clamps_and_rewinds() {
        let mut timer = TimerState::from_config(TimerConfig::default());
        timer.set_countdown(120, 75);
        assert_eq!(timer.countdown_minutes, 99);
        assert_eq!(timer.countdown_seconds, 59);
        assert_eq!(timer.seconds_left, 99 * 60 + 59);
    }

    #[test]
    fn test_config_section_round_trip() {
        let config = TimerConfig {
            mode: TimerMode::Stopwatch,
            countdown_minutes: 3,
            countdown_seconds: 15,
            seconds_left: 100,
            stopwatch_seconds: 42,
            running: true,
            sound_enabled: false,
        };
        let mut section = Section::new();
        config.apply(&mut section);
        assert_eq!(get_str(&section, "timer_running", ""), "True");
        assert_eq!(get_str(&section, "timer_mode", ""), "stopwatch");
        assert_eq!(TimerConfig::from_section(&section), config);
    }

    #[test]
    fn test_stale_seconds_left_is_clamped() {
        let state = TimerState::from_config(TimerConfig {
            countdown_minutes: 1,
            countdown_seconds: 0,
            seconds_left: 9999,
            ..TimerConfig::default()
        });
        assert_eq!(state.seconds_left, 60);
    }
}
