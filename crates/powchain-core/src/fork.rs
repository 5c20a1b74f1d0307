//! Fork resolution: deciding whether a competing chain replaces ours.
//!
//! The rule is "strictly longer and fully valid". It compares lengths, not
//! accumulated work, so a long chain re-mined at a low difficulty wins as
//! long as it passes validation at *our* difficulty. Deployments that face
//! adversarial peers need a cumulative-work comparison instead.

use crate::block::Block;
use crate::error::ValidationError;
use crate::pow::Difficulty;
use crate::validation::validate_chain;

/// Outcome of comparing a candidate chain with the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkChoice {
    /// The candidate should replace the current chain.
    Adopt,
    /// The current chain stays.
    KeepCurrent(Rejection),
}

/// Why a candidate chain was not adopted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The candidate is not strictly longer.
    NotLonger { current: usize, candidate: usize },
    /// The candidate failed validation.
    Invalid(ValidationError),
}

impl ForkChoice {
    /// Check if the candidate should be adopted.
    pub fn is_adopt(&self) -> bool {
        matches!(self, ForkChoice::Adopt)
    }
}

/// Compare `candidate` against `current` under `difficulty`.
///
/// Pure function: neither chain is modified. The length check runs first so
/// that short candidates are rejected without hashing them.
pub fn resolve(current: &[Block], candidate: &[Block], difficulty: Difficulty) -> ForkChoice {
    if candidate.len() <= current.len() {
        return ForkChoice::KeepCurrent(Rejection::NotLonger {
            current: current.len(),
            candidate: candidate.len(),
        });
    }

    match validate_chain(candidate, difficulty) {
        Ok(()) => ForkChoice::Adopt,
        Err(e) => ForkChoice::KeepCurrent(Rejection::Invalid(e)),
    }
}
