//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating state transitions of
//! entity lifecycle statuses.

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions; the terminal check is
/// derived from the transition table so there is exactly one place a
/// status can be declared final.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
