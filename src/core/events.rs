//! Game event queue
//!
//! Double-buffered queue for loose coupling between the simulation and its
//! consumers (audio, rendering, logging). Events pushed during one tick are
//! visible to iterators on the next, after [`Events::swap`], so processing
//! order never depends on system update order.

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;

use crate::ai::StalkerState;
use crate::voxel::GridHandle;

/// Sound cues the simulation can post.
///
/// Cues are identities, not file paths; the audio layer decides what each
/// one sounds like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// A stalker crossed into a new voxel cell
    StalkerMove,
}

/// Things that happened in the simulation this tick
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum GameEvent {
    /// Request to play a positional sound
    Sound {
        /// Which cue to play
        cue: SoundCue,
        /// World-space origin of the sound
        position: Vec3,
    },
    /// A voxel grid was mutated and regenerated
    GridChanged {
        /// The grid that changed
        grid: GridHandle,
    },
    /// A stalker moved between behavioral states
    StalkerStateChanged {
        /// The stalker entity
        entity: Entity,
        /// State before the transition
        from: StalkerState,
        /// State after the transition
        to: StalkerState,
    },
    /// An agent's health reached zero
    AgentKilled {
        /// The killed agent
        entity: Entity,
    },
}

/// Double-buffered event queue.
///
/// Push during tick N, swap at the tick boundary, read during tick N+1.
#[derive(Debug, Default)]
pub struct Events {
    /// Events being written this tick
    pending: VecDeque<GameEvent>,
    /// Events from the previous tick, ready for processing
    processing: VecDeque<GameEvent>,
}

impl Events {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for processing next tick
    #[inline]
    pub fn push(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    /// Swap buffers at the tick boundary.
    ///
    /// After swapping, `iter()` returns the events pushed since the last
    /// swap, and `push()` writes into a fresh buffer.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over the previous tick's events
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.processing.iter()
    }

    /// Number of events awaiting processing
    #[must_use]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    /// Whether no events await processing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_invisible_until_swap() {
        let mut events = Events::new();
        events.push(GameEvent::Sound {
            cue: SoundCue::StalkerMove,
            position: Vec3::ZERO,
        });
        assert!(events.is_empty());

        events.swap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_swap_discards_processed_events() {
        let mut events = Events::new();
        events.push(GameEvent::AgentKilled {
            entity: Entity::DANGLING,
        });
        events.swap();
        events.swap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_events_preserve_push_order() {
        let mut events = Events::new();
        events.push(GameEvent::Sound {
            cue: SoundCue::StalkerMove,
            position: Vec3::X,
        });
        events.push(GameEvent::AgentKilled {
            entity: Entity::DANGLING,
        });
        events.swap();

        let kinds: Vec<_> = events.iter().collect();
        assert!(matches!(kinds[0], GameEvent::Sound { .. }));
        assert!(matches!(kinds[1], GameEvent::AgentKilled { .. }));
    }
}
