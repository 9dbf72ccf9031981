//! Error type for ranch bookkeeping. The per-tick simulation itself never fails.

use thiserror::Error;

use crate::ecs::components::PetId;

#[derive(Debug, Error, PartialEq)]
pub enum RanchError {
    #[error("{0} is already on the ranch")]
    DuplicatePet(PetId),

    #[error("roster is full ({capacity} pets)")]
    RosterFull { capacity: usize },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

pub type RanchResult<T> = Result<T, RanchError>;
