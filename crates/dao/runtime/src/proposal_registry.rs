//! Proposal Registry: creation, lookup and payout bookkeeping
//!
//! Identifiers are dense: the n-th proposal ever created has id `n - 1`.
//! Proposals are never removed, so `id < len` is the only existence check.

use crate::membership_manager::MembershipManager;
use chrono::{DateTime, Duration, Utc};
use dao_types::{
    ActionKind, AuditJournal, AuditRecord, DaoError, DaoResult, MemberId, Proposal, ProposalId,
    ProposalRequest, VoteRecord,
};
use tracing::info;

pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
    /// Votes cast on each proposal, indexed like `proposals`
    votes: Vec<Vec<VoteRecord>>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self {
            proposals: Vec::new(),
            votes: Vec::new(),
        }
    }

    /// Rebuild from stored proposals and their vote logs
    pub fn from_parts(proposals: Vec<Proposal>, votes: Vec<Vec<VoteRecord>>) -> DaoResult<Self> {
        if proposals.len() != votes.len() {
            return Err(DaoError::InvalidInput(format!(
                "{} proposals but {} vote logs",
                proposals.len(),
                votes.len()
            )));
        }
        if let Some((index, p)) = proposals
            .iter()
            .enumerate()
            .find(|(i, p)| p.id.0 != *i as u64)
        {
            return Err(DaoError::InvalidInput(format!(
                "proposal at position {} has id {}",
                index, p.id
            )));
        }
        Ok(Self { proposals, votes })
    }

    /// Create a proposal with a voting window of `vote_period` from `now`
    pub fn create(
        &mut self,
        proposer: &MemberId,
        request: ProposalRequest,
        now: DateTime<Utc>,
        vote_period: Duration,
        membership: &MembershipManager,
        journal: &mut AuditJournal,
    ) -> DaoResult<ProposalId> {
        membership.ensure_stakeholder(proposer)?;

        let deadline = now.checked_add_signed(vote_period).ok_or_else(|| {
            DaoError::InvalidInput("voting deadline is out of range".into())
        })?;

        let id = ProposalId::new(self.proposals.len() as u64);
        let proposal = Proposal::new(id, proposer.clone(), request, now, deadline);

        journal.log(
            AuditRecord::new(
                ActionKind::ProposalRaised,
                proposer.clone(),
                proposal.beneficiary.clone(),
                proposal.amount,
                now,
            )
            .with_proposal(id)
            .with_metadata("title", proposal.title.clone()),
        );

        info!(
            proposal = %id,
            proposer = %proposer,
            beneficiary = %proposal.beneficiary,
            amount = %proposal.amount,
            deadline = %deadline,
            "Proposal raised"
        );

        self.proposals.push(proposal);
        self.votes.push(Vec::new());
        Ok(id)
    }

    pub fn get(&self, id: ProposalId) -> DaoResult<&Proposal> {
        self.proposals
            .get(Self::index(id))
            .ok_or(DaoError::ProposalNotFound(id))
    }

    pub fn get_mut(&mut self, id: ProposalId) -> DaoResult<&mut Proposal> {
        self.proposals
            .get_mut(Self::index(id))
            .ok_or(DaoError::ProposalNotFound(id))
    }

    pub fn votes(&self, id: ProposalId) -> DaoResult<&[VoteRecord]> {
        self.votes
            .get(Self::index(id))
            .map(Vec::as_slice)
            .ok_or(DaoError::ProposalNotFound(id))
    }

    pub fn votes_mut(&mut self, id: ProposalId) -> DaoResult<&mut Vec<VoteRecord>> {
        self.votes
            .get_mut(Self::index(id))
            .ok_or(DaoError::ProposalNotFound(id))
    }

    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Up to `count` proposals starting at id `from`
    pub fn page(&self, from: u64, count: usize) -> &[Proposal] {
        let start = Self::index(ProposalId::new(from)).min(self.proposals.len());
        let end = start.saturating_add(count).min(self.proposals.len());
        &self.proposals[start..end]
    }

    pub fn vote_logs(&self) -> &[Vec<VoteRecord>] {
        &self.votes
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    fn index(id: ProposalId) -> usize {
        usize::try_from(id.0).unwrap_or(usize::MAX)
    }
}

impl Default for ProposalRegistry {
    fn default() -> Self {
        Self::new()
    }
}
