//! Per-candidate validation state machine.
//!
//! ```text
//! Received -> StructurallyValid -> TransactionsValid -> Applied
//!     \               \                     \
//!      `---------------`---------------------`--> Rejected
//! ```
//!
//! `Applied` and `Rejected` are terminal.

use super::errors::{ConsensusError, ConsensusResult};
use shared_types::{Block, Hash};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationStage {
    Received,
    StructurallyValid,
    TransactionsValid,
    Applied,
    Rejected,
}

impl ValidationStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidationStage::Applied | ValidationStage::Rejected)
    }

    /// The only forward step out of this stage, if any.
    fn successor(&self) -> Option<ValidationStage> {
        match self {
            ValidationStage::Received => Some(ValidationStage::StructurallyValid),
            ValidationStage::StructurallyValid => Some(ValidationStage::TransactionsValid),
            ValidationStage::TransactionsValid => Some(ValidationStage::Applied),
            ValidationStage::Applied | ValidationStage::Rejected => None,
        }
    }

    pub fn can_transition_to(&self, next: ValidationStage) -> bool {
        match next {
            ValidationStage::Rejected => !self.is_terminal(),
            _ => self.successor() == Some(next),
        }
    }
}

/// A block moving through validation.
#[derive(Debug)]
pub struct BlockCandidate {
    pub block: Block,
    pub hash: Hash,
    stage: ValidationStage,
}

impl BlockCandidate {
    pub fn new(block: Block) -> Self {
        Self {
            hash: block.hash(),
            block,
            stage: ValidationStage::Received,
        }
    }

    pub fn stage(&self) -> ValidationStage {
        self.stage
    }

    pub fn advance(&mut self, next: ValidationStage) -> ConsensusResult<()> {
        if !self.stage.can_transition_to(next) {
            return Err(ConsensusError::IllegalTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    /// Moves to `Rejected` unless already terminal.
    pub fn reject(&mut self) {
        if !self.stage.is_terminal() {
            self.stage = ValidationStage::Rejected;
        }
    }
}
