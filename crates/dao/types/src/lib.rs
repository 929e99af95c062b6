//! DAO Domain Types
//!
//! Data types for a contribution-weighted governance engine: a pooled
//! treasury, membership tiers derived from cumulative contribution, and
//! time-boxed funding proposals decided by simple up/down majority.
//!
//! # Key Concepts
//!
//! - **Contributor**: any identity with a positive cumulative contribution.
//! - **Stakeholder**: cumulative contribution at or above the configured
//!   threshold. Stakeholders raise proposals, vote and trigger payouts.
//! - **Proposal**: a funding request with a fixed voting window, up/down
//!   tallies and a one-time payout to its beneficiary.
//! - **Audit Journal**: every committed operation appends a record.
//!
//! This is a pure types crate. Behaviour lives in `dao-runtime`.

#![deny(unsafe_code)]

mod amount;
mod audit;
mod config;
mod errors;
mod identity;
mod membership;
mod proposal;
mod treasury;

pub use amount::*;
pub use audit::*;
pub use config::*;
pub use errors::*;
pub use identity::*;
pub use membership::*;
pub use proposal::*;
pub use treasury::*;
