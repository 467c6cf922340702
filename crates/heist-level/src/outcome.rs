//! Level outcome flags and the sound-trigger queue.

use bevy_ecs::prelude::Resource;

// ---------------------------------------------------------------------------
// LevelStatus
// ---------------------------------------------------------------------------

/// Terminal outcome of the current level instance.
///
/// Each flag latches once and only [`reset`](Self::reset) clears it. The
/// first outcome wins: a completed level cannot fail afterwards and vice
/// versa.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelStatus {
    complete: bool,
    failure: bool,
}

impl LevelStatus {
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    pub const fn is_failed(&self) -> bool {
        self.failure
    }

    /// Either outcome reached; input no longer moves the avatar.
    pub const fn is_over(&self) -> bool {
        self.complete || self.failure
    }

    /// Returns `true` on the transition.
    pub const fn latch_complete(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        self.complete = true;
        true
    }

    /// Returns `true` on the transition.
    pub const fn latch_failure(&mut self) -> bool {
        if self.is_over() {
            return false;
        }
        self.failure = true;
        true
    }

    pub const fn reset(&mut self) {
        self.complete = false;
        self.failure = false;
    }
}

// ---------------------------------------------------------------------------
// Sound events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Jump,
    Fire,
    Impact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundEvent {
    pub kind: SoundKind,
    pub volume: f32,
}

/// Sound triggers for the audio collaborator, which drains them.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SoundQueue {
    volume: f32,
    pending: Vec<SoundEvent>,
}

impl Default for SoundQueue {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SoundQueue {
    pub const fn new(volume: f32) -> Self {
        Self {
            volume,
            pending: Vec::new(),
        }
    }

    pub const fn volume(&self) -> f32 {
        self.volume
    }

    pub const fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Queue `kind` at the current volume.
    pub fn push(&mut self, kind: SoundKind) {
        self.pending.push(SoundEvent {
            kind,
            volume: self.volume,
        });
    }

    pub fn pending(&self) -> &[SoundEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
