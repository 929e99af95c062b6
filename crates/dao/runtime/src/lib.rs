//! DAO Runtime
//!
//! Runtime for a contribution-weighted DAO: members pool funds into a
//! shared treasury, stakeholders raise and vote on funding proposals, and
//! approved proposals are paid out to their beneficiaries.
//!
//! # Architecture
//!
//! The [`Dao`] is the main entry point. It composes specialized managers,
//! each handling one aspect of governance:
//!
//! - [`MembershipManager`]: Tier derivation from cumulative contribution
//! - [`TreasuryManager`]: Deposits and disbursements with audit trail
//! - [`ProposalRegistry`]: Dense proposal ids, lookup and vote logs
//! - [`VotingEngine`]: One vote per stakeholder per proposal, lazy expiry
//!
//! Time, fund custody and audit broadcasting belong to the host and are
//! injected through the traits in [`host`].
//!
//! # Key Invariants
//!
//! 1. Treasury balance equals total contributed minus total disbursed
//! 2. Proposal ids are 0, 1, 2, … with no gaps and no reuse
//! 3. A (voter, proposal) pair holds at most one vote
//! 4. A proposal is paid at most once, even if the transfer re-enters
//! 5. Every committed operation produces an audit record
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use dao_runtime::{Dao, DaoHost, ManualClock, MemoryEventSink, RecordingTransfer};
//! use dao_types::{Amount, DaoConfig, MemberId, ProposalRequest};
//!
//! let host = DaoHost::new(
//!     Arc::new(ManualClock::default()),
//!     Arc::new(RecordingTransfer::new()),
//!     Arc::new(MemoryEventSink::new()),
//! );
//! let dao = Dao::new(DaoConfig::default(), MemberId::new("deployer"), host).unwrap();
//!
//! let alice = MemberId::new("alice");
//! dao.contribute(&alice, Amount::from_millis(100)).unwrap();
//! assert!(dao.is_stakeholder(&alice));
//!
//! let proposal = dao
//!     .create_proposal(
//!         &alice,
//!         ProposalRequest::new("Audit", "Fund the audit", MemberId::new("bob"), Amount::from_millis(50)),
//!     )
//!     .unwrap();
//! assert_eq!(proposal.id.0, 0);
//! ```

#![deny(unsafe_code)]

pub mod dao;
pub mod host;
pub mod membership_manager;
pub mod proposal_registry;
pub mod snapshot;
pub mod treasury_manager;
pub mod voting_engine;

// Re-export main types for convenience
pub use dao::Dao;
pub use host::{
    Clock, DaoHost, EventSink, ManualClock, MemoryEventSink, Payout, RecordingTransfer,
    SystemClock, TracingEventSink, TransferError, ValueTransfer,
};
pub use membership_manager::MembershipManager;
pub use proposal_registry::ProposalRegistry;
pub use snapshot::DaoSnapshot;
pub use treasury_manager::{Deposit, TreasuryManager};
pub use voting_engine::VotingEngine;
