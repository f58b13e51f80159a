//! One-time capability probing and voice enumeration
//!
//! The probe runs once at session start: it records which speech capabilities
//! exist and pre-warms voice enumeration. The voice list the platform hands
//! back is owned here, in a [`VoiceCatalog`] behind a [`SharedVoices`] handle
//! that gets injected into the output controller, instead of living in a
//! module-level global.
//!
//! Voice loading is finite and not restartable: resolve synchronously when
//! voices are already available, otherwise on whichever of the platform's
//! change notification or a bounded fallback deadline fires first. An empty
//! list is a valid terminal outcome; nothing may hang waiting for voices.

use crate::platform::{Platform, SynthesisPort, VoiceInfo};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Which speech capabilities the environment offers. Computed once, read-only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilityFlags {
    pub has_recognition: bool,
    pub has_synthesis: bool,
}

impl CapabilityFlags {
    /// Probe the platform bundle. No side effects beyond the flags.
    pub fn detect(platform: &Platform) -> Self {
        let flags = Self {
            has_recognition: platform.has_recognition(),
            has_synthesis: platform.has_synthesis(),
        };
        debug!(
            recognition = flags.has_recognition,
            synthesis = flags.has_synthesis,
            "capability probe"
        );
        flags
    }
}

/// Voice enumeration state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadState {
    /// `begin_load` has not run yet
    NotStarted,
    /// Waiting for the platform notification or the fallback deadline
    Pending { deadline: Instant },
    /// Terminal; the list (possibly empty) is what we have
    Loaded,
}

/// The session's owned copy of the platform voice list.
#[derive(Debug)]
pub struct VoiceCatalog {
    voices: Vec<VoiceInfo>,
    state: LoadState,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self {
            voices: Vec::new(),
            state: LoadState::NotStarted,
        }
    }

    /// Start loading voices from the port.
    ///
    /// Resolves immediately if the platform already has voices; otherwise
    /// arms the fallback deadline and waits for a `VoicesChanged` signal.
    pub fn begin_load(&mut self, port: &dyn SynthesisPort, now: Instant, fallback: Duration) {
        if self.state != LoadState::NotStarted {
            return;
        }
        let voices = port.voices();
        if !voices.is_empty() {
            debug!(count = voices.len(), "voices loaded immediately");
            self.voices = voices;
            self.state = LoadState::Loaded;
        } else {
            debug!("no voices available yet, waiting for change notification");
            self.state = LoadState::Pending {
                deadline: now + fallback,
            };
        }
    }

    /// Handle the platform's voice change notification.
    pub fn on_voices_changed(&mut self, port: &dyn SynthesisPort) {
        if !matches!(self.state, LoadState::Pending { .. }) {
            return;
        }
        let voices = port.voices();
        debug!(count = voices.len(), "voices changed notification");
        self.voices = voices;
        self.state = LoadState::Loaded;
    }

    /// Advance the fallback deadline. Past it, whatever the platform reports
    /// (possibly nothing) becomes the terminal list.
    pub fn poll(&mut self, port: &dyn SynthesisPort, now: Instant) {
        if let LoadState::Pending { deadline } = self.state {
            if now >= deadline {
                let voices = port.voices();
                debug!(count = voices.len(), "voice load fallback deadline reached");
                self.voices = voices;
                self.state = LoadState::Loaded;
            }
        }
    }

    /// Whether loading has reached its terminal state.
    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    pub fn voices(&self) -> &[VoiceInfo] {
        &self.voices
    }
}

/// Thread-safe handle to the voice catalog.
///
/// Created by the probe at session start and handed to the output controller
/// as a constructor parameter.
#[derive(Clone, Default)]
pub struct SharedVoices {
    inner: Arc<RwLock<VoiceCatalog>>,
}

impl SharedVoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the catalog reached its terminal state (false -> true once).
    pub fn loaded(&self) -> bool {
        self.inner.read().is_loaded()
    }

    /// Snapshot of the current voice list.
    pub fn snapshot(&self) -> Vec<VoiceInfo> {
        self.inner.read().voices().to_vec()
    }

    /// Write access for the load state machine.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, VoiceCatalog> {
        self.inner.write()
    }
}
