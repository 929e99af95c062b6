//! Membership Manager: tier derivation and authorization checks
//!
//! Tiers are never assigned directly. They follow from the cumulative
//! contribution recorded in the [`MembershipLedger`], except for the admin
//! which is fixed at instantiation.

use chrono::{DateTime, Utc};
use dao_types::{
    ActionKind, Amount, AuditJournal, AuditRecord, DaoError, DaoResult, MemberId,
    MembershipLedger, Tier, TierChange,
};
use tracing::{debug, info};

pub struct MembershipManager {
    ledger: MembershipLedger,
}

impl MembershipManager {
    pub fn new(admin: MemberId, stakeholder_threshold: Amount) -> Self {
        Self {
            ledger: MembershipLedger::new(admin, stakeholder_threshold),
        }
    }

    pub fn from_ledger(ledger: MembershipLedger) -> Self {
        Self { ledger }
    }

    /// Record a contribution and log any tier it grants
    pub fn record_contribution(
        &mut self,
        member: &MemberId,
        amount: Amount,
        at: DateTime<Utc>,
        journal: &mut AuditJournal,
    ) -> DaoResult<TierChange> {
        let was_contributor = self.ledger.is_contributor(member);
        let change = self.ledger.credit(member, amount, at)?;

        let granted: &[Tier] = match change {
            TierChange::BecameStakeholder if !was_contributor => {
                &[Tier::Contributor, Tier::Stakeholder]
            }
            TierChange::BecameStakeholder => &[Tier::Stakeholder],
            TierChange::BecameContributor => &[Tier::Contributor],
            TierChange::None => &[],
        };

        let total = self.ledger.contributed(member);
        for tier in granted {
            journal.log(AuditRecord::new(
                ActionKind::TierGranted(*tier),
                member.clone(),
                member.clone(),
                total,
                at,
            ));
            info!(member = %member, tier = %tier, total = total.0, "Tier granted");
        }
        if granted.is_empty() {
            debug!(member = %member, amount = amount.0, "Contribution credited");
        }

        Ok(change)
    }

    /// Fail with `Unauthorized` unless `member` holds the stakeholder tier
    pub fn ensure_stakeholder(&self, member: &MemberId) -> DaoResult<()> {
        self.ensure_tier(member, Tier::Stakeholder)
    }

    pub fn ensure_contributor(&self, member: &MemberId) -> DaoResult<()> {
        self.ensure_tier(member, Tier::Contributor)
    }

    pub fn ensure_tier(&self, member: &MemberId, tier: Tier) -> DaoResult<()> {
        if self.ledger.has_tier(member, tier) {
            Ok(())
        } else {
            Err(DaoError::Unauthorized {
                member: member.clone(),
                required: tier,
            })
        }
    }

    pub fn contributed(&self, member: &MemberId) -> Amount {
        self.ledger.contributed(member)
    }

    pub fn is_stakeholder(&self, member: &MemberId) -> bool {
        self.ledger.is_stakeholder(member)
    }

    pub fn is_contributor(&self, member: &MemberId) -> bool {
        self.ledger.is_contributor(member)
    }

    pub fn is_admin(&self, member: &MemberId) -> bool {
        self.ledger.is_admin(member)
    }

    pub fn tiers(&self, member: &MemberId) -> Vec<Tier> {
        self.ledger.tiers(member)
    }

    pub fn stakeholder_count(&self) -> usize {
        self.ledger.stakeholder_count()
    }

    pub fn contributor_count(&self) -> usize {
        self.ledger.contributor_count()
    }

    pub fn ledger(&self) -> &MembershipLedger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (MembershipManager, AuditJournal) {
        (
            MembershipManager::new(MemberId::new("admin"), Amount::new(100)),
            AuditJournal::new(),
        )
    }

    #[test]
    fn test_first_contribution_grants_contributor() {
        let (mut mgr, mut journal) = setup();
        let alice = MemberId::new("alice");

        let change = mgr
            .record_contribution(&alice, Amount::new(10), Utc::now(), &mut journal)
            .unwrap();
        assert_eq!(change, TierChange::BecameContributor);
        assert!(mgr.is_contributor(&alice));
        assert!(!mgr.is_stakeholder(&alice));
        assert_eq!(
            journal.records_of_kind(&ActionKind::TierGranted(Tier::Contributor)).len(),
            1
        );
    }

    #[test]
    fn test_crossing_threshold_grants_stakeholder() {
        let (mut mgr, mut journal) = setup();
        let alice = MemberId::new("alice");

        mgr.record_contribution(&alice, Amount::new(60), Utc::now(), &mut journal)
            .unwrap();
        let change = mgr
            .record_contribution(&alice, Amount::new(40), Utc::now(), &mut journal)
            .unwrap();
        assert_eq!(change, TierChange::BecameStakeholder);
        assert!(mgr.ensure_stakeholder(&alice).is_ok());

        // Further contributions grant nothing new
        let change = mgr
            .record_contribution(&alice, Amount::new(1), Utc::now(), &mut journal)
            .unwrap();
        assert_eq!(change, TierChange::None);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_single_large_contribution_grants_both_tiers() {
        let (mut mgr, mut journal) = setup();
        let alice = MemberId::new("alice");

        let change = mgr
            .record_contribution(&alice, Amount::new(500), Utc::now(), &mut journal)
            .unwrap();
        assert_eq!(change, TierChange::BecameStakeholder);
        assert_eq!(mgr.tiers(&alice), vec![Tier::Stakeholder, Tier::Contributor]);
        assert_eq!(journal.len(), 2);
    }

    #[test]
    fn test_ensure_stakeholder_rejects() {
        let (mut mgr, mut journal) = setup();
        let dave = MemberId::new("dave");
        mgr.record_contribution(&dave, Amount::new(10), Utc::now(), &mut journal)
            .unwrap();

        let err = mgr.ensure_stakeholder(&dave).unwrap_err();
        assert!(matches!(
            err,
            DaoError::Unauthorized {
                required: Tier::Stakeholder,
                ..
            }
        ));
        assert!(mgr.ensure_contributor(&dave).is_ok());
        assert!(mgr.ensure_contributor(&MemberId::new("nobody")).is_err());
    }

    #[test]
    fn test_admin_is_fixed() {
        let (mgr, _) = setup();
        assert!(mgr.is_admin(&MemberId::new("admin")));
        assert!(!mgr.is_stakeholder(&MemberId::new("admin")));
        assert_eq!(mgr.tiers(&MemberId::new("admin")), vec![Tier::Admin]);
    }
}
