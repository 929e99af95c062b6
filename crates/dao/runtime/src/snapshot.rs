//! Snapshots: serializable copies of the complete DAO state
//!
//! A snapshot carries everything needed to rebuild a [`crate::Dao`]: the
//! configuration, the membership ledger, the treasury, every proposal with
//! its vote log, and the audit journal. Voter histories are derived from
//! the vote logs on restore.

use chrono::{DateTime, Utc};
use dao_types::{
    Amount, AuditJournal, DaoConfig, DaoError, DaoResult, MembershipLedger, Proposal, Treasury,
    VoteRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoSnapshot {
    pub snapshot_id: String,
    pub config: DaoConfig,
    pub membership: MembershipLedger,
    pub treasury: Treasury,
    /// All proposals in id order
    pub proposals: Vec<Proposal>,
    /// Vote log per proposal, indexed like `proposals`
    pub votes: Vec<Vec<VoteRecord>>,
    pub audit_journal: AuditJournal,
    pub created_at: DateTime<Utc>,
}

impl DaoSnapshot {
    pub fn new(
        config: DaoConfig,
        membership: MembershipLedger,
        treasury: Treasury,
        proposals: Vec<Proposal>,
        votes: Vec<Vec<VoteRecord>>,
        audit_journal: AuditJournal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot_id: uuid::Uuid::new_v4().to_string(),
            config,
            membership,
            treasury,
            proposals,
            votes,
            audit_journal,
            created_at,
        }
    }

    /// Check the cross-component invariants a live DAO maintains
    pub fn validate(&self) -> DaoResult<()> {
        self.config.validate()?;

        if self.membership.stakeholder_threshold != self.config.stakeholder_threshold {
            return Err(self.corrupt("membership threshold differs from configuration"));
        }
        if !self.treasury.is_balanced() {
            return Err(self.corrupt("treasury balance does not match its totals"));
        }

        let contributed = self
            .membership
            .records
            .values()
            .try_fold(Amount::zero(), |acc, r| acc.checked_add(r.contributed))
            .ok_or_else(|| self.corrupt("member contributions overflow"))?;
        if contributed != self.treasury.total_contributed {
            return Err(self.corrupt("member contributions differ from treasury total"));
        }

        if self.proposals.len() != self.votes.len() {
            return Err(self.corrupt("vote logs do not line up with proposals"));
        }

        let mut disbursed = Amount::zero();
        for (index, (proposal, votes)) in self.proposals.iter().zip(&self.votes).enumerate() {
            if proposal.id.0 != index as u64 {
                return Err(self.corrupt(&format!("proposal ids are not dense at {}", index)));
            }
            let mut voters = HashSet::with_capacity(votes.len());
            if let Some(repeat) = votes.iter().find(|v| !voters.insert(&v.voter)) {
                return Err(self.corrupt(&format!(
                    "{} voted twice on {}",
                    repeat.voter, proposal.id
                )));
            }
            let up = votes.iter().filter(|v| v.chosen).count() as u64;
            let down = votes.len() as u64 - up;
            if proposal.tally.up != up || proposal.tally.down != down {
                return Err(self.corrupt(&format!("tally of {} differs from its votes", proposal.id)));
            }
            if proposal.paid {
                if proposal.executor.is_none() {
                    return Err(self.corrupt(&format!("{} is paid without executor", proposal.id)));
                }
                disbursed = disbursed
                    .checked_add(proposal.amount)
                    .ok_or_else(|| self.corrupt("disbursements overflow"))?;
            }
        }
        if disbursed != self.treasury.total_disbursed {
            return Err(self.corrupt("paid proposals differ from treasury disbursements"));
        }

        Ok(())
    }

    pub fn to_json(&self) -> DaoResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DaoError::InvalidInput(format!("snapshot serialization failed: {}", e)))
    }

    pub fn from_json(json: &str) -> DaoResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DaoError::InvalidInput(format!("snapshot is not readable: {}", e)))
    }

    fn corrupt(&self, reason: &str) -> DaoError {
        warn!(snapshot = %self.snapshot_id, reason, "Snapshot rejected");
        DaoError::InvalidInput(format!("inconsistent snapshot: {}", reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_types::{ErrorKind, MemberId, ProposalId, ProposalRequest};

    fn snapshot() -> DaoSnapshot {
        let config = DaoConfig::default().with_threshold(Amount::new(100));
        let now = Utc::now();
        let alice = MemberId::new("alice");

        let mut membership = MembershipLedger::new(MemberId::new("admin"), Amount::new(100));
        membership.credit(&alice, Amount::new(100), now).unwrap();
        let mut treasury = Treasury::new();
        treasury.deposit(Amount::new(100)).unwrap();

        let mut proposal = Proposal::new(
            ProposalId::new(0),
            alice.clone(),
            ProposalRequest::new("Fund", "", MemberId::new("bob"), Amount::new(40)),
            now,
            now + config.vote_period(),
        );
        proposal.tally.up = 1;

        DaoSnapshot::new(
            config,
            membership,
            treasury,
            vec![proposal],
            vec![vec![VoteRecord::new(alice, now, true)]],
            AuditJournal::new(),
            now,
        )
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_keeps_state() {
        let snap = snapshot();
        let restored = DaoSnapshot::from_json(&snap.to_json().unwrap()).unwrap();

        assert_eq!(restored.snapshot_id, snap.snapshot_id);
        assert_eq!(restored.proposals.len(), 1);
        assert_eq!(restored.treasury.balance, Amount::new(100));
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn test_detects_tampered_tally() {
        let mut snap = snapshot();
        snap.proposals[0].tally.up = 5;
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_detects_duplicate_voter() {
        let mut snap = snapshot();
        let first = snap.votes[0][0].clone();
        snap.votes[0].push(first);
        snap.proposals[0].tally.up = 2;

        let err = snap.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("voted twice"));
    }

    #[test]
    fn test_detects_unbalanced_treasury() {
        let mut snap = snapshot();
        snap.treasury.balance = Amount::new(1);
        assert!(snap.validate().is_err());
    }

    #[test]
    fn test_detects_paid_without_disbursement() {
        let mut snap = snapshot();
        snap.proposals[0].mark_paid(MemberId::new("alice"), Utc::now());
        assert!(snap.validate().is_err());

        snap.treasury.withdraw(Amount::new(40)).unwrap();
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn test_rejects_garbage_json() {
        assert!(DaoSnapshot::from_json("{not json").is_err());
    }
}
