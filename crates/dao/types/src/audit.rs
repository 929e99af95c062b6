//! Audit records emitted by every committed operation
//!
//! The journal is append-only. Records carry the action kind, the caller,
//! the beneficiary and the amount; vote records also carry the updated
//! tallies and the chosen direction.

use crate::{Amount, MemberId, ProposalId, Tier, VoteTally};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of action an audit record describes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Funds deposited into the treasury
    ContributionReceived,
    /// A contribution granted a tier to the depositor
    TierGranted(Tier),
    /// A proposal was created
    ProposalRaised,
    /// A vote was recorded
    VoteCast,
    /// A proposal's amount was paid to its beneficiary
    PaymentTransferred,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::ContributionReceived => write!(f, "Contribution Received"),
            ActionKind::TierGranted(tier) => write!(f, "Tier Granted ({})", tier),
            ActionKind::ProposalRaised => write!(f, "Proposal Raised"),
            ActionKind::VoteCast => write!(f, "Vote Cast"),
            ActionKind::PaymentTransferred => write!(f, "Payment Transferred"),
        }
    }
}

/// A single audit record
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub receipt_id: String,
    pub kind: ActionKind,
    /// Caller whose operation produced the record
    pub actor: MemberId,
    pub beneficiary: MemberId,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<ProposalId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<VoteTally>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen: Option<bool>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl AuditRecord {
    pub fn new(
        kind: ActionKind,
        actor: MemberId,
        beneficiary: MemberId,
        amount: Amount,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            receipt_id: uuid::Uuid::new_v4().to_string(),
            kind,
            actor,
            beneficiary,
            amount,
            timestamp,
            proposal: None,
            tally: None,
            chosen: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_proposal(mut self, proposal: ProposalId) -> Self {
        self.proposal = Some(proposal);
        self
    }

    pub fn with_vote(mut self, tally: VoteTally, chosen: bool) -> Self {
        self.tally = Some(tally);
        self.chosen = Some(chosen);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Append-only journal of audit records
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditJournal {
    pub records: Vec<AuditRecord>,
}

impl AuditJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a record
    pub fn log(&mut self, record: AuditRecord) {
        self.records.push(record);
    }

    /// Records appended at or after position `from`
    pub fn since(&self, from: usize) -> &[AuditRecord] {
        self.records.get(from..).unwrap_or_default()
    }

    /// Drop records appended at or after position `len`
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn records_of_kind(&self, kind: &ActionKind) -> Vec<&AuditRecord> {
        self.records.iter().filter(|r| r.kind == *kind).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_and_query() {
        let mut journal = AuditJournal::new();
        let alice = MemberId::new("alice");

        journal.log(AuditRecord::new(
            ActionKind::ContributionReceived,
            alice.clone(),
            MemberId::treasury(),
            Amount::new(100),
            Utc::now(),
        ));
        journal.log(
            AuditRecord::new(
                ActionKind::VoteCast,
                alice.clone(),
                MemberId::new("bob"),
                Amount::new(50),
                Utc::now(),
            )
            .with_proposal(ProposalId::new(0))
            .with_vote(VoteTally { up: 1, down: 0 }, true),
        );

        assert_eq!(journal.len(), 2);
        assert!(journal.records.iter().all(|r| r.actor == alice));

        let votes = journal.records_of_kind(&ActionKind::VoteCast);
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].tally, Some(VoteTally { up: 1, down: 0 }));
        assert_eq!(votes[0].chosen, Some(true));
    }

    #[test]
    fn test_since_and_truncate() {
        let mut journal = AuditJournal::new();
        for i in 0..3 {
            journal.log(AuditRecord::new(
                ActionKind::ContributionReceived,
                MemberId::new(format!("m{}", i)),
                MemberId::treasury(),
                Amount::new(1),
                Utc::now(),
            ));
        }

        assert_eq!(journal.since(1).len(), 2);
        assert!(journal.since(3).is_empty());
        assert!(journal.since(10).is_empty());

        journal.truncate(1);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ActionKind::ProposalRaised.to_string(), "Proposal Raised");
        assert_eq!(
            ActionKind::TierGranted(Tier::Stakeholder).to_string(),
            "Tier Granted (stakeholder)"
        );
    }
}
