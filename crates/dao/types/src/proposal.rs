//! Proposal and vote records
//!
//! A proposal is a funding request with a fixed voting window, up/down
//! tallies and a one-time payout. Proposals are never deleted.

use crate::{Amount, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dense sequential proposal identifier, starting at 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl ProposalId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProposalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Up/down vote counts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VoteTally {
    pub up: u64,
    pub down: u64,
}

impl VoteTally {
    /// Strict up-vote majority
    pub fn has_majority(&self) -> bool {
        self.up > self.down
    }

    pub fn total(&self) -> u64 {
        self.up + self.down
    }
}

/// Arguments for raising a proposal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub title: String,
    pub description: String,
    pub beneficiary: MemberId,
    pub amount: Amount,
}

impl ProposalRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        beneficiary: MemberId,
        amount: Amount,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            beneficiary,
            amount,
        }
    }
}

/// A funding proposal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    /// Requested payout
    pub amount: Amount,
    pub title: String,
    pub description: String,
    pub beneficiary: MemberId,
    pub proposer: MemberId,
    pub created_at: DateTime<Utc>,
    /// Votes are accepted strictly before this instant
    pub voting_deadline: DateTime<Utc>,
    pub tally: VoteTally,
    /// Set exactly once, by the disbursement that paid the beneficiary
    pub paid: bool,
    /// Set by the first vote attempt that observes an elapsed window
    pub passed: bool,
    /// Stakeholder who triggered the payout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Proposal {
    pub fn new(
        id: ProposalId,
        proposer: MemberId,
        request: ProposalRequest,
        created_at: DateTime<Utc>,
        voting_deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            amount: request.amount,
            title: request.title,
            description: request.description,
            beneficiary: request.beneficiary,
            proposer,
            created_at,
            voting_deadline,
            tally: VoteTally::default(),
            paid: false,
            passed: false,
            executor: None,
            paid_at: None,
        }
    }

    /// Whether the window has elapsed at `now`, evaluated without side effects
    pub fn voting_closed(&self, now: DateTime<Utc>) -> bool {
        self.passed || self.voting_deadline <= now
    }

    pub fn is_voting_open(&self, now: DateTime<Utc>) -> bool {
        !self.voting_closed(now)
    }

    /// Record a payout
    pub fn mark_paid(&mut self, executor: MemberId, at: DateTime<Utc>) {
        self.paid = true;
        self.executor = Some(executor);
        self.paid_at = Some(at);
    }

    /// Undo [`Proposal::mark_paid`] after a failed transfer
    pub fn clear_paid(&mut self) {
        self.paid = false;
        self.executor = None;
        self.paid_at = None;
    }
}

/// A single cast vote; immutable once appended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter: MemberId,
    pub timestamp: DateTime<Utc>,
    /// true = up, false = down
    pub chosen: bool,
}

impl VoteRecord {
    pub fn new(voter: MemberId, timestamp: DateTime<Utc>, chosen: bool) -> Self {
        Self {
            voter,
            timestamp,
            chosen,
        }
    }
}
