//! The action-rejection taxonomy the Room Engine speaks to clients (§7).
//! Every entry point that can fail returns one of these instead of a raw
//! [`crate::round::RoundError`]/[`crate::rules::RuleError`], so the engine
//! only has one error shape to turn into a unicast rejection.

use crate::round::RoundError;
use crate::rules::RuleError;
use thiserror::Error;

/// A rejected action never mutates room state; the room stays exactly as it
/// was and the rejection is reported only to the seat that submitted it.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("action is not valid in the current phase, or it isn't this seat's turn")]
    InvalidTiming,

    #[error("action refers to a tile, kind, or meld that doesn't exist in this context")]
    InvalidContent,

    #[error("declared hu does not decompose into a winning hand")]
    FalseHu,

    #[error("seat already submitted an action for this decision point")]
    DuplicateSubmission,

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl From<RoundError> for ActionError {
    fn from(err: RoundError) -> Self {
        match err {
            RoundError::WrongPhase | RoundError::NotEligible | RoundError::WallExhausted => {
                ActionError::InvalidTiming
            }
            RoundError::AlreadyResponded => ActionError::DuplicateSubmission,
            RoundError::IllegalClaim | RoundError::TileNotInHand => ActionError::InvalidContent,
            RoundError::Rule(rule_err) => ActionError::Rule(rule_err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_phase_maps_to_invalid_timing() {
        assert!(matches!(ActionError::from(RoundError::WrongPhase), ActionError::InvalidTiming));
    }

    #[test]
    fn already_responded_maps_to_duplicate_submission() {
        assert!(matches!(
            ActionError::from(RoundError::AlreadyResponded),
            ActionError::DuplicateSubmission
        ));
    }
}
