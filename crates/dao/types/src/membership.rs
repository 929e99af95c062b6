//! Membership ledger: who has contributed and which tiers they hold
//!
//! Tiers are derived from the cumulative contribution of each identity.
//! Nothing here ever lowers a contribution, so tiers are never revoked.

use crate::{Amount, DaoError, DaoResult, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Membership tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Initializer of the DAO
    Admin,
    /// Cumulative contribution at or above the stakeholder threshold
    Stakeholder,
    /// Any positive cumulative contribution
    Contributor,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Admin => write!(f, "admin"),
            Tier::Stakeholder => write!(f, "stakeholder"),
            Tier::Contributor => write!(f, "contributor"),
        }
    }
}

/// Tier movement caused by a single contribution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierChange {
    /// No new tier was granted
    None,
    /// First positive contribution, still below the stakeholder threshold
    BecameContributor,
    /// Cumulative total reached the threshold (contributor granted too if new)
    BecameStakeholder,
}

/// Cumulative contribution record for one identity
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub member: MemberId,
    /// Total ever contributed; never decreases
    pub contributed: Amount,
    pub contribution_count: u64,
    pub first_contributed_at: DateTime<Utc>,
    pub last_contributed_at: DateTime<Utc>,
}

impl MembershipRecord {
    pub fn new(member: MemberId, at: DateTime<Utc>) -> Self {
        Self {
            member,
            contributed: Amount::zero(),
            contribution_count: 0,
            first_contributed_at: at,
            last_contributed_at: at,
        }
    }

    pub fn is_contributor(&self) -> bool {
        !self.contributed.is_zero()
    }

    pub fn is_stakeholder(&self, threshold: Amount) -> bool {
        self.contributed >= threshold
    }
}

/// The access and membership ledger
///
/// Stores contribution records only. Authorization decisions built on top
/// of it live in the runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipLedger {
    /// Holder of the admin tier, fixed at initialization
    pub admin: MemberId,
    /// Minimum cumulative contribution for the stakeholder tier
    pub stakeholder_threshold: Amount,
    pub records: HashMap<MemberId, MembershipRecord>,
}

impl MembershipLedger {
    pub fn new(admin: MemberId, stakeholder_threshold: Amount) -> Self {
        Self {
            admin,
            stakeholder_threshold,
            records: HashMap::new(),
        }
    }

    /// Add `amount` to the member's cumulative total, creating the record lazily
    pub fn credit(
        &mut self,
        member: &MemberId,
        amount: Amount,
        at: DateTime<Utc>,
    ) -> DaoResult<TierChange> {
        if amount.is_zero() {
            return Err(DaoError::InvalidInput(
                "contribution amount must be positive".into(),
            ));
        }

        let before = self.contributed(member);
        let after = before.checked_add(amount).ok_or_else(|| {
            DaoError::InvalidInput(format!("contribution of {} overflows member total", amount))
        })?;

        let was_stakeholder = before >= self.stakeholder_threshold;
        let was_contributor = !before.is_zero();

        let record = self
            .records
            .entry(member.clone())
            .or_insert_with(|| MembershipRecord::new(member.clone(), at));
        record.contributed = after;
        record.contribution_count += 1;
        record.last_contributed_at = at;

        let change = if !was_stakeholder && after >= self.stakeholder_threshold {
            TierChange::BecameStakeholder
        } else if !was_contributor {
            TierChange::BecameContributor
        } else {
            TierChange::None
        };
        Ok(change)
    }

    pub fn get(&self, member: &MemberId) -> Option<&MembershipRecord> {
        self.records.get(member)
    }

    /// Cumulative contribution, zero for unknown identities
    pub fn contributed(&self, member: &MemberId) -> Amount {
        self.records
            .get(member)
            .map(|r| r.contributed)
            .unwrap_or_default()
    }

    pub fn is_contributor(&self, member: &MemberId) -> bool {
        self.records
            .get(member)
            .is_some_and(MembershipRecord::is_contributor)
    }

    pub fn is_stakeholder(&self, member: &MemberId) -> bool {
        self.records
            .get(member)
            .is_some_and(|r| r.is_stakeholder(self.stakeholder_threshold))
    }

    pub fn is_admin(&self, member: &MemberId) -> bool {
        self.admin == *member
    }

    pub fn has_tier(&self, member: &MemberId, tier: Tier) -> bool {
        match tier {
            Tier::Admin => self.is_admin(member),
            Tier::Stakeholder => self.is_stakeholder(member),
            Tier::Contributor => self.is_contributor(member),
        }
    }

    /// Tiers currently held by a member
    pub fn tiers(&self, member: &MemberId) -> Vec<Tier> {
        [Tier::Admin, Tier::Stakeholder, Tier::Contributor]
            .into_iter()
            .filter(|t| self.has_tier(member, *t))
            .collect()
    }

    pub fn stakeholder_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.is_stakeholder(self.stakeholder_threshold))
            .count()
    }

    pub fn contributor_count(&self) -> usize {
        self.records.values().filter(|r| r.is_contributor()).count()
    }
}
