//! The DAO: main entry point composing all managers
//!
//! Every public operation runs as one isolated step against a single state
//! store. Operations from different threads are serialized by a lock that
//! the owning thread may re-acquire, so a value transfer that calls back
//! into the same `Dao` reaches the state instead of deadlocking.
//!
//! Disbursement commits its effects (balance decrease, `paid`, executor)
//! before the external transfer runs and raises an in-flight guard for the
//! duration of the call. Any mutating operation attempted while the guard
//! is up fails with [`DaoError::ReentrantCall`]. Reads are always allowed
//! and observe the committed state. A failed transfer rolls everything
//! back.

use crate::host::DaoHost;
use crate::membership_manager::MembershipManager;
use crate::proposal_registry::ProposalRegistry;
use crate::snapshot::DaoSnapshot;
use crate::treasury_manager::TreasuryManager;
use crate::voting_engine::VotingEngine;
use chrono::{DateTime, Utc};
use dao_types::{
    Amount, AuditJournal, AuditRecord, DaoConfig, DaoError, DaoResult, MemberId, Proposal,
    ProposalId, ProposalRequest, Tier, Treasury, VoteRecord, VoteTally,
};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use tracing::{debug, info, warn};

/// Mutable state behind the lock
struct DaoState {
    membership: MembershipManager,
    treasury: TreasuryManager,
    proposals: ProposalRegistry,
    voting: VotingEngine,
    journal: AuditJournal,
    /// Proposal whose payout transfer is currently running
    in_flight: Option<ProposalId>,
}

impl DaoState {
    fn ensure_idle(&self) -> DaoResult<()> {
        match self.in_flight {
            Some(proposal) => {
                warn!(proposal = %proposal, "Mutating call rejected during disbursement");
                Err(DaoError::ReentrantCall)
            }
            None => Ok(()),
        }
    }

    /// Undo a committed payout and lower the in-flight guard
    fn rollback_payout(&mut self, proposal: ProposalId, amount: Amount) {
        self.in_flight = None;
        self.treasury.release(proposal, amount);
        if let Ok(p) = self.proposals.get_mut(proposal) {
            p.clear_paid();
        }
    }
}

/// Outcome of [`Dao::pay_beneficiary`]'s validation and commit phase
struct PendingPayout {
    beneficiary: MemberId,
    amount: Amount,
}

/// Rolls a committed payout back unless the transfer settled
///
/// Dropped during unwinding when the transfer panics, so the in-flight
/// guard never outlives the call.
struct PayoutGuard<'a> {
    state: &'a RefCell<DaoState>,
    proposal: ProposalId,
    amount: Amount,
    settled: bool,
}

impl PayoutGuard<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PayoutGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        match self.state.try_borrow_mut() {
            Ok(mut state) => {
                state.rollback_payout(self.proposal, self.amount);
                warn!(proposal = %self.proposal, "Disbursement rolled back");
            }
            Err(_) => {
                warn!(proposal = %self.proposal, "Disbursement rollback skipped, state busy")
            }
        }
    }
}

pub struct Dao {
    config: DaoConfig,
    host: DaoHost,
    state: ReentrantMutex<RefCell<DaoState>>,
}

impl Dao {
    /// Instantiate a DAO with `admin` as the holder of the admin tier
    pub fn new(config: DaoConfig, admin: MemberId, host: DaoHost) -> DaoResult<Self> {
        config.validate()?;

        info!(
            dao = %config.name,
            admin = %admin,
            threshold = %config.stakeholder_threshold,
            vote_period_secs = config.min_vote_period_secs,
            "DAO initialized"
        );

        let state = DaoState {
            membership: MembershipManager::new(admin, config.stakeholder_threshold),
            treasury: TreasuryManager::new(),
            proposals: ProposalRegistry::new(),
            voting: VotingEngine::new(),
            journal: AuditJournal::new(),
            in_flight: None,
        };

        Ok(Self {
            config,
            host,
            state: ReentrantMutex::new(RefCell::new(state)),
        })
    }

    /// Rebuild a DAO from a snapshot after checking its invariants
    pub fn restore(snapshot: DaoSnapshot, host: DaoHost) -> DaoResult<Self> {
        snapshot.validate()?;

        let proposals = ProposalRegistry::from_parts(snapshot.proposals, snapshot.votes)?;
        let voting = VotingEngine::from_registry(&proposals);

        info!(
            dao = %snapshot.config.name,
            snapshot = %snapshot.snapshot_id,
            proposals = proposals.len(),
            "DAO restored from snapshot"
        );

        let state = DaoState {
            membership: MembershipManager::from_ledger(snapshot.membership),
            treasury: TreasuryManager::from_treasury(snapshot.treasury),
            proposals,
            voting,
            journal: snapshot.audit_journal,
            in_flight: None,
        };

        Ok(Self {
            config: snapshot.config,
            host,
            state: ReentrantMutex::new(RefCell::new(state)),
        })
    }

    // =====================================================================
    // MUTATING OPERATIONS
    // =====================================================================

    /// Deposit `amount` from `caller`; returns the new treasury balance
    pub fn contribute(&self, caller: &MemberId, amount: Amount) -> DaoResult<Amount> {
        self.mutate(|state, now| {
            let deposit = state.treasury.deposit(
                caller,
                amount,
                now,
                &mut state.membership,
                &mut state.journal,
            )?;
            Ok(deposit.balance)
        })
    }

    /// Raise a funding proposal; stakeholders only
    pub fn create_proposal(
        &self,
        caller: &MemberId,
        request: ProposalRequest,
    ) -> DaoResult<Proposal> {
        let vote_period = self.config.vote_period();
        self.mutate(|state, now| {
            let id = state.proposals.create(
                caller,
                request,
                now,
                vote_period,
                &state.membership,
                &mut state.journal,
            )?;
            Ok(state.proposals.get(id)?.clone())
        })
    }

    /// Cast an up (`true`) or down (`false`) vote; stakeholders only
    ///
    /// The first attempt after the deadline marks the proposal as passed and
    /// still fails with [`DaoError::VotingPeriodOver`]. That flag is kept.
    pub fn perform_vote(
        &self,
        caller: &MemberId,
        proposal: ProposalId,
        chosen: bool,
    ) -> DaoResult<VoteTally> {
        self.mutate(|state, now| {
            state.voting.cast_vote(
                caller,
                proposal,
                chosen,
                now,
                &state.membership,
                &mut state.proposals,
                &mut state.journal,
            )
        })
    }

    /// Pay a proposal's amount to its beneficiary; stakeholders only
    ///
    /// Guards, in order: caller is a stakeholder, the proposal exists, the
    /// treasury covers the amount, the proposal is unpaid, and up-votes
    /// strictly exceed down-votes. With `require_closed_window` set the
    /// voting window must also have closed.
    pub fn pay_beneficiary(&self, caller: &MemberId, proposal: ProposalId) -> DaoResult<()> {
        let lock = self.state.lock();
        let now = self.host.clock.now();

        let pending = {
            let mut cell = lock.borrow_mut();
            let state = &mut *cell;
            state.ensure_idle()?;
            self.commit_payout(state, caller, proposal, now)?
        };

        let guard = PayoutGuard {
            state: &lock,
            proposal,
            amount: pending.amount,
            settled: false,
        };

        if let Err(e) = self
            .host
            .transfer
            .transfer(&pending.beneficiary, pending.amount)
        {
            drop(guard);
            warn!(proposal = %proposal, error = %e, "Value transfer failed");
            return Err(DaoError::TransferFailed(e.to_string()));
        }
        guard.settle();

        let emitted = {
            let mut cell = lock.borrow_mut();
            let state = &mut *cell;
            state.in_flight = None;

            let mark = state.journal.len();
            state.treasury.record_disbursement(
                proposal,
                caller,
                &pending.beneficiary,
                pending.amount,
                now,
                &mut state.journal,
            );
            state.journal.since(mark).to_vec()
        };

        self.emit(&emitted);
        Ok(())
    }

    fn commit_payout(
        &self,
        state: &mut DaoState,
        caller: &MemberId,
        id: ProposalId,
        now: DateTime<Utc>,
    ) -> DaoResult<PendingPayout> {
        state.membership.ensure_stakeholder(caller)?;

        let proposal = state.proposals.get(id)?;
        if !state.treasury.can_afford(proposal.amount) {
            return Err(DaoError::InsufficientFunds {
                required: proposal.amount,
                available: state.treasury.balance(),
            });
        }
        if proposal.paid {
            return Err(DaoError::AlreadyPaid(id));
        }
        if !proposal.tally.has_majority() {
            return Err(DaoError::InsufficientVotes {
                up: proposal.tally.up,
                down: proposal.tally.down,
            });
        }
        if self.config.require_closed_window && proposal.is_voting_open(now) {
            return Err(DaoError::VotingStillOpen(id));
        }

        let pending = PendingPayout {
            beneficiary: proposal.beneficiary.clone(),
            amount: proposal.amount,
        };

        state.treasury.reserve(id, pending.amount)?;
        state.proposals.get_mut(id)?.mark_paid(caller.clone(), now);
        state.in_flight = Some(id);

        debug!(proposal = %id, executor = %caller, "Payout committed, starting transfer");
        Ok(pending)
    }

    // =====================================================================
    // READ OPERATIONS
    // =====================================================================

    pub fn get_proposal(&self, id: ProposalId) -> DaoResult<Proposal> {
        self.read(|state| state.proposals.get(id).cloned())
    }

    /// All proposals in creation order
    pub fn list_proposals(&self) -> Vec<Proposal> {
        self.read(|state| state.proposals.all().to_vec())
    }

    /// Up to `count` proposals starting at id `from`
    pub fn list_proposals_page(&self, from: u64, count: usize) -> Vec<Proposal> {
        self.read(|state| state.proposals.page(from, count).to_vec())
    }

    pub fn proposal_count(&self) -> usize {
        self.read(|state| state.proposals.len())
    }

    pub fn get_votes_for(&self, id: ProposalId) -> DaoResult<Vec<VoteRecord>> {
        self.read(|state| state.proposals.votes(id).map(<[VoteRecord]>::to_vec))
    }

    /// Whether votes would currently be accepted, evaluated against the clock
    pub fn is_voting_open(&self, id: ProposalId) -> DaoResult<bool> {
        let now = self.host.clock.now();
        self.read(|state| Ok(state.proposals.get(id)?.is_voting_open(now)))
    }

    /// Proposals the caller has voted on; stakeholders only
    pub fn my_vote_history(&self, caller: &MemberId) -> DaoResult<Vec<ProposalId>> {
        self.read(|state| {
            state.membership.ensure_stakeholder(caller)?;
            Ok(state.voting.history(caller).to_vec())
        })
    }

    /// Cumulative contribution; zero for identities with no record
    pub fn my_contribution(&self, caller: &MemberId) -> Amount {
        self.read(|state| state.membership.contributed(caller))
    }

    /// Cumulative contribution; contributors only
    pub fn my_contributor_balance(&self, caller: &MemberId) -> DaoResult<Amount> {
        self.read(|state| {
            state.membership.ensure_contributor(caller)?;
            Ok(state.membership.contributed(caller))
        })
    }

    pub fn total_balance(&self) -> Amount {
        self.read(|state| state.treasury.balance())
    }

    pub fn treasury(&self) -> Treasury {
        self.read(|state| state.treasury.treasury().clone())
    }

    pub fn is_stakeholder(&self, caller: &MemberId) -> bool {
        self.read(|state| state.membership.is_stakeholder(caller))
    }

    pub fn is_contributor(&self, caller: &MemberId) -> bool {
        self.read(|state| state.membership.is_contributor(caller))
    }

    pub fn is_admin(&self, caller: &MemberId) -> bool {
        self.read(|state| state.membership.is_admin(caller))
    }

    pub fn tiers(&self, caller: &MemberId) -> Vec<Tier> {
        self.read(|state| state.membership.tiers(caller))
    }

    pub fn stakeholder_count(&self) -> usize {
        self.read(|state| state.membership.stakeholder_count())
    }

    pub fn contributor_count(&self) -> usize {
        self.read(|state| state.membership.contributor_count())
    }

    /// Every audit record emitted so far
    pub fn journal(&self) -> Vec<AuditRecord> {
        self.read(|state| state.journal.records.clone())
    }

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    /// Whether a disbursement transfer is currently running
    pub fn disbursement_in_flight(&self) -> Option<ProposalId> {
        self.read(|state| state.in_flight)
    }

    /// Capture the full state; fails while a disbursement is in flight
    pub fn snapshot(&self) -> DaoResult<DaoSnapshot> {
        let now = self.host.clock.now();
        self.read(|state| {
            state.ensure_idle()?;
            Ok(DaoSnapshot::new(
                self.config.clone(),
                state.membership.ledger().clone(),
                state.treasury.treasury().clone(),
                state.proposals.all().to_vec(),
                state.proposals.vote_logs().to_vec(),
                state.journal.clone(),
                now,
            ))
        })
    }

    // =====================================================================
    // INTERNALS
    // =====================================================================

    /// Run `op` against the state, then forward its audit records
    ///
    /// State changes made by `op` are kept even when it fails; each manager
    /// validates before it writes.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut DaoState, DateTime<Utc>) -> DaoResult<T>,
    ) -> DaoResult<T> {
        let lock = self.state.lock();
        let now = self.host.clock.now();

        let (result, emitted) = {
            let mut cell = lock.borrow_mut();
            let state = &mut *cell;
            state.ensure_idle()?;

            let mark = state.journal.len();
            let result = op(state, now);
            (result, state.journal.since(mark).to_vec())
        };

        self.emit(&emitted);
        result
    }

    fn read<T>(&self, op: impl FnOnce(&DaoState) -> T) -> T {
        let lock = self.state.lock();
        let state = lock.borrow();
        op(&state)
    }

    fn emit(&self, records: &[AuditRecord]) {
        for record in records {
            self.host.sink.emit(record);
        }
    }
}
