//! Timing configuration for the conversational core
//!
//! Every compensation delay the controllers rely on (settling before a new
//! utterance, the start watchdog, the debounce before a transcript submits)
//! is a named duration here so tests can inject zero instead of waiting.

use std::time::Duration;

/// Named durations for all deferred work in the core.
#[derive(Clone, Copy, Debug)]
pub struct Timings {
    /// Pause between a finalized transcript and its submission, so the
    /// visible input can refresh first
    pub submit_debounce: Duration,
    /// Settling delay between cancelling an old utterance and starting the
    /// next, avoiding platform "interrupted" noise
    pub pre_speak_delay: Duration,
    /// Delay between pausing and cancelling synthesis
    pub cancel_pause_delay: Duration,
    /// How long the intentional-cancel flag stays set after a cancel, to
    /// cover trailing error callbacks attributable to it
    pub cancel_flag_hold: Duration,
    /// Watchdog after issuing an utterance; if the platform never started
    /// speaking by then, the request is treated as dropped. Zero disables
    /// the watchdog
    pub speak_watchdog: Duration,
    /// Fallback deadline for voice enumeration when the platform never
    /// fires its change notification
    pub voice_load_timeout: Duration,
    /// How long non-suppressed speech errors stay visible
    pub error_auto_dismiss: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            submit_debounce: Duration::from_millis(100),
            pre_speak_delay: Duration::from_millis(100),
            cancel_pause_delay: Duration::from_millis(50),
            cancel_flag_hold: Duration::from_millis(500),
            speak_watchdog: Duration::from_secs(3),
            voice_load_timeout: Duration::from_secs(2),
            error_auto_dismiss: Duration::from_secs(3),
        }
    }
}

impl Timings {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// All delays zeroed, for tests that drive the machines step by step
    pub fn immediate() -> Self {
        Self {
            submit_debounce: Duration::ZERO,
            pre_speak_delay: Duration::ZERO,
            cancel_pause_delay: Duration::ZERO,
            cancel_flag_hold: Duration::ZERO,
            speak_watchdog: Duration::ZERO,
            voice_load_timeout: Duration::ZERO,
            error_auto_dismiss: Duration::ZERO,
        }
    }

    /// Set the transcript submission debounce
    pub fn with_submit_debounce(mut self, d: Duration) -> Self {
        self.submit_debounce = d;
        self
    }

    /// Set the pre-speak settling delay
    pub fn with_pre_speak_delay(mut self, d: Duration) -> Self {
        self.pre_speak_delay = d;
        self
    }

    /// Set the speak watchdog timeout
    pub fn with_speak_watchdog(mut self, d: Duration) -> Self {
        self.speak_watchdog = d;
        self
    }

    /// Set the voice enumeration fallback deadline
    pub fn with_voice_load_timeout(mut self, d: Duration) -> Self {
        self.voice_load_timeout = d;
        self
    }

    /// Set the error auto-dismiss delay
    pub fn with_error_auto_dismiss(mut self, d: Duration) -> Self {
        self.error_auto_dismiss = d;
        self
    }
}
