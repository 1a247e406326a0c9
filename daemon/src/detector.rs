/// Per-condition transition detection.
///
/// A [`TransitionDetector`] turns a stream of raw samples into transition
/// events. It is pure: the same sample sequence always yields the same events.
///
/// The first known sample is special. If it is `Active` the detector emits a
/// one-shot initial `BecameActive` so the user hears that the condition was
/// already on when monitoring started. If it is `Inactive` nothing is emitted.
use crate::condition::TriState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    BecameActive,
    BecameInactive,
}

impl Direction {
    pub fn is_enabled(self) -> bool {
        self == Direction::BecameActive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub direction: Direction,
    /// Set only for the startup announcement out of `Unknown`.
    pub is_initial: bool,
}

#[derive(Debug, Default)]
pub struct TransitionDetector {
    last: TriState,
}

impl TransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TriState {
        self.last
    }

    /// Advances the state machine by one sample.
    ///
    /// An `Unknown` sample carries no information and leaves the state as is.
    /// Sampling errors never reach this method.
    pub fn observe(&mut self, sample: TriState) -> Option<Transition> {
        if !sample.is_known() {
            return None;
        }
        let event = match (self.last, sample) {
            (TriState::Unknown, TriState::Active) => Some(Transition {
                direction: Direction::BecameActive,
                is_initial: true,
            }),
            (TriState::Inactive, TriState::Active) => Some(Transition {
                direction: Direction::BecameActive,
                is_initial: false,
            }),
            (TriState::Active, TriState::Inactive) => Some(Transition {
                direction: Direction::BecameInactive,
                is_initial: false,
            }),
            _ => None,
        };
        self.last = sample;
        event
    }
}
