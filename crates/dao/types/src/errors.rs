//! Error types for DAO operations

use crate::{Amount, MemberId, ProposalId, Tier};
use serde::{Deserialize, Serialize};

/// Errors that can occur in DAO operations
///
/// Every failure is a synchronous rejection; no state is retained from a
/// failed operation.
#[derive(Debug, thiserror::Error)]
pub enum DaoError {
    #[error("Unauthorized: {member} does not hold the {required} tier")]
    Unauthorized { member: MemberId, required: Tier },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Voting period over for proposal {0}")]
    VotingPeriodOver(ProposalId),

    #[error("Double voting: {voter} already voted on proposal {proposal}")]
    DuplicateVote { voter: MemberId, proposal: ProposalId },

    #[error("Proposal {0} has already been paid")]
    AlreadyPaid(ProposalId),

    #[error("Insufficient votes: {up} up against {down} down")]
    InsufficientVotes { up: u64, down: u64 },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    #[error("Voting still open for proposal {0}")]
    VotingStillOpen(ProposalId),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Re-entrant call rejected: a disbursement is in progress")]
    ReentrantCall,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Payload-free classification of [`DaoError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    InvalidInput,
    NotFound,
    ExpiredWindow,
    DuplicateVote,
    AlreadyPaid,
    InsufficientVotes,
    InsufficientFunds,
    WindowOpen,
    TransferFailed,
    Reentrancy,
    Config,
}

impl DaoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DaoError::Unauthorized { .. } => ErrorKind::Unauthorized,
            DaoError::InvalidInput(_) => ErrorKind::InvalidInput,
            DaoError::ProposalNotFound(_) => ErrorKind::NotFound,
            DaoError::VotingPeriodOver(_) => ErrorKind::ExpiredWindow,
            DaoError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
            DaoError::AlreadyPaid(_) => ErrorKind::AlreadyPaid,
            DaoError::InsufficientVotes { .. } => ErrorKind::InsufficientVotes,
            DaoError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            DaoError::VotingStillOpen(_) => ErrorKind::WindowOpen,
            DaoError::TransferFailed(_) => ErrorKind::TransferFailed,
            DaoError::ReentrantCall => ErrorKind::Reentrancy,
            DaoError::InvalidConfig(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for DAO operations
pub type DaoResult<T> = Result<T, DaoError>;
