//! Canned wellness content
//!
//! Quick-reply prompts and the rotating mindfulness tips shown alongside the
//! conversation. Quick replies go through the same `submit()` path as typed
//! text.

/// Suggested prompts for starting a conversation.
pub const QUICK_REPLIES: &[&str] = &[
    "I'm feeling anxious today",
    "How can I manage stress?",
    "I need motivation",
    "Help me with negative thoughts",
    "Tips for better sleep",
];

/// Short mindfulness tips rotated while a conversation is open.
pub const WELLNESS_TIPS: &[&str] = &[
    "Take a few deep breaths when feeling overwhelmed. Inhale for 4 counts, hold for 4, exhale for 6.",
    "Self-compassion is crucial. Treat yourself with the same kindness you'd offer a good friend.",
    "Name your emotions. Just labeling how you feel can reduce their intensity.",
    "Remember that progress isn't linear. Setbacks are a normal part of growth.",
];

/// Cycles through the wellness tips in order, wrapping around.
#[derive(Clone, Copy, Debug, Default)]
pub struct TipCycle {
    index: usize,
}

impl TipCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tip currently showing.
    pub fn current(&self) -> &'static str {
        WELLNESS_TIPS[self.index]
    }

    /// Move to the next tip and return it.
    pub fn advance(&mut self) -> &'static str {
        self.index = (self.index + 1) % WELLNESS_TIPS.len();
        self.current()
    }
}
