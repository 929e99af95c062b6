//! Treasury Manager: pooled deposits and disbursements with audit trail
//!
//! Every movement of funds produces an audit record. Deposits credit the
//! contributor's membership record in the same step, so the sum of member
//! contributions always equals the treasury's total contributed.

use crate::membership_manager::MembershipManager;
use chrono::{DateTime, Utc};
use dao_types::{
    ActionKind, Amount, AuditJournal, AuditRecord, DaoResult, MemberId, ProposalId, TierChange,
    Treasury,
};
use tracing::{info, warn};

/// Outcome of an accepted contribution
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deposit {
    pub balance: Amount,
    pub tier_change: TierChange,
}

pub struct TreasuryManager {
    treasury: Treasury,
}

impl TreasuryManager {
    pub fn new() -> Self {
        Self {
            treasury: Treasury::new(),
        }
    }

    pub fn from_treasury(treasury: Treasury) -> Self {
        Self { treasury }
    }

    /// Accept a contribution from `contributor`
    ///
    /// The treasury is updated first. It holds the larger running total, so
    /// once it accepts the amount the member's credit cannot overflow.
    pub fn deposit(
        &mut self,
        contributor: &MemberId,
        amount: Amount,
        at: DateTime<Utc>,
        membership: &mut MembershipManager,
        journal: &mut AuditJournal,
    ) -> DaoResult<Deposit> {
        let before = self.treasury.clone();
        let mark = journal.len();
        let balance = self.treasury.deposit(amount)?;

        journal.log(AuditRecord::new(
            ActionKind::ContributionReceived,
            contributor.clone(),
            MemberId::treasury(),
            amount,
            at,
        ));

        let tier_change = match membership.record_contribution(contributor, amount, at, journal) {
            Ok(change) => change,
            Err(e) => {
                self.treasury = before;
                journal.truncate(mark);
                return Err(e);
            }
        };

        info!(
            contributor = %contributor,
            amount = %amount,
            balance = %balance,
            "Contribution received"
        );

        Ok(Deposit {
            balance,
            tier_change,
        })
    }

    /// Remove `amount` for a proposal payout; nothing is logged until the
    /// transfer completes
    pub fn reserve(&mut self, proposal: ProposalId, amount: Amount) -> DaoResult<Amount> {
        let balance = self.treasury.withdraw(amount)?;
        info!(proposal = %proposal, amount = %amount, balance = %balance, "Funds reserved for payout");
        Ok(balance)
    }

    /// Return funds taken by [`TreasuryManager::reserve`] after a failed transfer
    pub fn release(&mut self, proposal: ProposalId, amount: Amount) {
        self.treasury.reverse_withdrawal(amount);
        warn!(proposal = %proposal, amount = %amount, "Payout reservation released");
    }

    /// Log a completed disbursement
    pub fn record_disbursement(
        &self,
        proposal: ProposalId,
        executor: &MemberId,
        beneficiary: &MemberId,
        amount: Amount,
        at: DateTime<Utc>,
        journal: &mut AuditJournal,
    ) {
        journal.log(
            AuditRecord::new(
                ActionKind::PaymentTransferred,
                executor.clone(),
                beneficiary.clone(),
                amount,
                at,
            )
            .with_proposal(proposal),
        );
        info!(
            proposal = %proposal,
            executor = %executor,
            beneficiary = %beneficiary,
            amount = %amount,
            "Payment transferred"
        );
    }

    pub fn balance(&self) -> Amount {
        self.treasury.balance
    }

    pub fn can_afford(&self, amount: Amount) -> bool {
        self.treasury.balance >= amount
    }

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }
}

impl Default for TreasuryManager {
    fn default() -> Self {
        Self::new()
    }
}
