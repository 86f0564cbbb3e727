//! State machine trait for lifecycle status enums.

use super::ValidationError;

/// Status enums that only move along declared transitions.
///
/// Implementors list their edges; `transition_to` then refuses anything else.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if the only way out of this state is back into itself.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().iter().all(|next| next == self)
    }
}
