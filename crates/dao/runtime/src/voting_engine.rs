//! Voting Engine: one vote per stakeholder per proposal
//!
//! Preconditions are checked in a fixed order, each with its own error:
//!
//! 1. the voter holds the stakeholder tier
//! 2. the proposal exists
//! 3. the voting window is still open
//! 4. the voter has not voted on this proposal before
//!
//! Expiry is lazy. A proposal's `passed` flag is only set by the first
//! vote attempt that observes the deadline has elapsed, and that attempt
//! still fails. The flag write is kept even though the vote is rejected.

use crate::membership_manager::MembershipManager;
use crate::proposal_registry::ProposalRegistry;
use chrono::{DateTime, Utc};
use dao_types::{
    ActionKind, AuditJournal, AuditRecord, DaoError, DaoResult, MemberId, ProposalId, VoteRecord,
    VoteTally,
};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

pub struct VotingEngine {
    /// Proposals each voter has voted on, in vote order
    history: HashMap<MemberId, Vec<ProposalId>>,
    /// (proposal, voter) pairs that already hold a vote
    cast: HashSet<(ProposalId, MemberId)>,
}

impl VotingEngine {
    pub fn new() -> Self {
        Self {
            history: HashMap::new(),
            cast: HashSet::new(),
        }
    }

    /// Rebuild voter histories from per-proposal vote logs
    pub fn from_registry(registry: &ProposalRegistry) -> Self {
        let mut engine = Self::new();
        let mut entries: Vec<(DateTime<Utc>, ProposalId, &MemberId)> = registry
            .all()
            .iter()
            .zip(registry.vote_logs())
            .flat_map(|(p, votes)| votes.iter().map(move |v| (v.timestamp, p.id, &v.voter)))
            .collect();
        entries.sort_by_key(|(at, id, _)| (*at, *id));

        for (_, id, voter) in entries {
            engine.remember(voter, id);
        }
        engine
    }

    #[allow(clippy::too_many_arguments)]
    pub fn cast_vote(
        &mut self,
        voter: &MemberId,
        proposal_id: ProposalId,
        chosen: bool,
        now: DateTime<Utc>,
        membership: &MembershipManager,
        registry: &mut ProposalRegistry,
        journal: &mut AuditJournal,
    ) -> DaoResult<VoteTally> {
        membership.ensure_stakeholder(voter)?;

        let proposal = registry.get_mut(proposal_id)?;

        if proposal.voting_closed(now) {
            if !proposal.passed {
                proposal.passed = true;
                info!(proposal = %proposal_id, deadline = %proposal.voting_deadline, "Voting window closed");
            }
            warn!(proposal = %proposal_id, voter = %voter, "Vote rejected: voting period over");
            return Err(DaoError::VotingPeriodOver(proposal_id));
        }

        if self.has_voted(voter, proposal_id) {
            warn!(proposal = %proposal_id, voter = %voter, "Vote rejected: double voting");
            return Err(DaoError::DuplicateVote {
                voter: voter.clone(),
                proposal: proposal_id,
            });
        }

        if chosen {
            proposal.tally.up += 1;
        } else {
            proposal.tally.down += 1;
        }
        let tally = proposal.tally;
        let beneficiary = proposal.beneficiary.clone();
        let amount = proposal.amount;

        registry
            .votes_mut(proposal_id)?
            .push(VoteRecord::new(voter.clone(), now, chosen));
        self.remember(voter, proposal_id);

        journal.log(
            AuditRecord::new(ActionKind::VoteCast, voter.clone(), beneficiary, amount, now)
                .with_proposal(proposal_id)
                .with_vote(tally, chosen),
        );

        info!(
            proposal = %proposal_id,
            voter = %voter,
            chosen,
            up = tally.up,
            down = tally.down,
            "Vote cast"
        );

        Ok(tally)
    }

    pub fn has_voted(&self, voter: &MemberId, proposal_id: ProposalId) -> bool {
        self.cast.contains(&(proposal_id, voter.clone()))
    }

    /// Proposals `voter` has voted on, in the order the votes were cast
    pub fn history(&self, voter: &MemberId) -> &[ProposalId] {
        self.history.get(voter).map(Vec::as_slice).unwrap_or_default()
    }

    fn remember(&mut self, voter: &MemberId, proposal_id: ProposalId) {
        if self.cast.insert((proposal_id, voter.clone())) {
            self.history
                .entry(voter.clone())
                .or_default()
                .push(proposal_id);
        }
    }
}

impl Default for VotingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dao_types::{Amount, ProposalRequest};

    struct Fixture {
        engine: VotingEngine,
        members: MembershipManager,
        registry: ProposalRegistry,
        journal: AuditJournal,
        start: DateTime<Utc>,
    }

    fn setup() -> Fixture {
        let start = Utc::now();
        let mut journal = AuditJournal::new();
        let mut members = MembershipManager::new(MemberId::new("admin"), Amount::new(100));
        for name in ["alice", "eve"] {
            members
                .record_contribution(&MemberId::new(name), Amount::new(100), start, &mut journal)
                .unwrap();
        }
        members
            .record_contribution(&MemberId::new("dave"), Amount::new(10), start, &mut journal)
            .unwrap();

        let mut registry = ProposalRegistry::new();
        registry
            .create(
                &MemberId::new("alice"),
                ProposalRequest::new("Fund", "", MemberId::new("bob"), Amount::new(5)),
                start,
                Duration::seconds(300),
                &members,
                &mut journal,
            )
            .unwrap();

        Fixture {
            engine: VotingEngine::new(),
            members,
            registry,
            journal: AuditJournal::new(),
            start,
        }
    }

    impl Fixture {
        fn vote(&mut self, voter: &str, chosen: bool, at: DateTime<Utc>) -> DaoResult<VoteTally> {
            self.engine.cast_vote(
                &MemberId::new(voter),
                ProposalId::new(0),
                chosen,
                at,
                &self.members,
                &mut self.registry,
                &mut self.journal,
            )
        }
    }

    #[test]
    fn test_vote_updates_tally_and_logs() {
        let mut fx = setup();
        let at = fx.start + Duration::seconds(1);

        let tally = fx.vote("alice", true, at).unwrap();
        assert_eq!(tally, VoteTally { up: 1, down: 0 });

        let tally = fx.vote("eve", false, at).unwrap();
        assert_eq!(tally, VoteTally { up: 1, down: 1 });

        let votes = fx.registry.votes(ProposalId::new(0)).unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].voter, MemberId::new("alice"));
        assert!(votes[0].chosen);

        let records = fx.journal.records_of_kind(&ActionKind::VoteCast);
        let record = records[1];
        assert_eq!(record.tally, Some(VoteTally { up: 1, down: 1 }));
        assert_eq!(record.chosen, Some(false));
        assert_eq!(fx.engine.history(&MemberId::new("eve")), &[ProposalId::new(0)]);
    }

    #[test]
    fn test_double_vote_rejected() {
        let mut fx = setup();
        let at = fx.start + Duration::seconds(1);

        fx.vote("eve", true, at).unwrap();
        let err = fx.vote("eve", false, at).unwrap_err();

        assert!(matches!(err, DaoError::DuplicateVote { .. }));
        let proposal = fx.registry.get(ProposalId::new(0)).unwrap();
        assert_eq!(proposal.tally, VoteTally { up: 1, down: 0 });
        assert_eq!(fx.registry.votes(ProposalId::new(0)).unwrap().len(), 1);
    }

    #[test]
    fn test_contributor_cannot_vote() {
        let mut fx = setup();
        let err = fx.vote("dave", true, fx.start).unwrap_err();
        assert!(matches!(err, DaoError::Unauthorized { .. }));
    }

    #[test]
    fn test_unknown_proposal() {
        let mut fx = setup();
        let err = fx
            .engine
            .cast_vote(
                &MemberId::new("alice"),
                ProposalId::new(7),
                true,
                fx.start,
                &fx.members,
                &mut fx.registry,
                &mut fx.journal,
            )
            .unwrap_err();
        assert!(matches!(err, DaoError::ProposalNotFound(id) if id == ProposalId::new(7)));
    }

    #[test]
    fn test_first_late_vote_sets_passed() {
        let mut fx = setup();
        let deadline = fx.start + Duration::seconds(300);

        assert!(!fx.registry.get(ProposalId::new(0)).unwrap().passed);

        // Exactly at the deadline the window is closed
        let err = fx.vote("alice", true, deadline).unwrap_err();
        assert!(matches!(err, DaoError::VotingPeriodOver(_)));
        assert!(fx.registry.get(ProposalId::new(0)).unwrap().passed);
        assert!(fx.journal.is_empty());
    }

    #[test]
    fn test_passed_flag_blocks_later_votes() {
        let mut fx = setup();
        let late = fx.start + Duration::seconds(301);
        fx.vote("alice", true, late).unwrap_err();

        // Even a clock reading inside the window is rejected once passed is set
        let err = fx.vote("eve", true, fx.start).unwrap_err();
        assert!(matches!(err, DaoError::VotingPeriodOver(_)));
    }

    #[test]
    fn test_expiry_checked_before_duplicate() {
        let mut fx = setup();
        fx.vote("alice", true, fx.start).unwrap();

        let err = fx
            .vote("alice", true, fx.start + Duration::seconds(400))
            .unwrap_err();
        assert!(matches!(err, DaoError::VotingPeriodOver(_)));
    }

    #[test]
    fn test_rebuild_from_registry() {
        let mut fx = setup();
        fx.vote("alice", true, fx.start).unwrap();

        let rebuilt = VotingEngine::from_registry(&fx.registry);
        assert!(rebuilt.has_voted(&MemberId::new("alice"), ProposalId::new(0)));
        assert!(!rebuilt.has_voted(&MemberId::new("eve"), ProposalId::new(0)));
        assert_eq!(rebuilt.history(&MemberId::new("alice")), &[ProposalId::new(0)]);
    }
}
