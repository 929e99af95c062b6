//! Host collaborators: clock, value transfer and audit sink
//!
//! The engine does not own time, custody of funds, or off-system
//! observability. The host supplies each one through these traits.

use chrono::{DateTime, Duration, Utc};
use dao_types::{Amount, AuditRecord, MemberId};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

// =========================================================================
// CLOCK
// =========================================================================

/// Source of the current time for window evaluation
pub trait Clock: Send + Sync {
    /// Must never go backwards between calls
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for simulations and tests
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        if by > Duration::zero() {
            if let Some(next) = current.checked_add_signed(by) {
                *current = next;
            }
        }
    }

    /// Jump to `at`; earlier instants are ignored
    pub fn set(&self, at: DateTime<Utc>) {
        let mut current = self.current.lock();
        if at > *current {
            *current = at;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}

// =========================================================================
// VALUE TRANSFER
// =========================================================================

/// Failure reported by the transfer primitive
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransferError(pub String);

/// Moves funds out of the DAO's custody
///
/// Implementations may run arbitrary logic before returning, including
/// calls back into the same `Dao`.
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, beneficiary: &MemberId, amount: Amount) -> Result<(), TransferError>;
}

/// A completed payout seen by [`RecordingTransfer`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub beneficiary: MemberId,
    pub amount: Amount,
}

/// In-memory transfer primitive that records every payout
#[derive(Debug, Default)]
pub struct RecordingTransfer {
    payouts: RwLock<Vec<Payout>>,
    failing: AtomicBool,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent transfers fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn payouts(&self) -> Vec<Payout> {
        self.payouts.read().clone()
    }

    pub fn total_paid_to(&self, beneficiary: &MemberId) -> Amount {
        self.payouts
            .read()
            .iter()
            .filter(|p| p.beneficiary == *beneficiary)
            .fold(Amount::zero(), |acc, p| acc.saturating_add(p.amount))
    }
}

impl ValueTransfer for RecordingTransfer {
    fn transfer(&self, beneficiary: &MemberId, amount: Amount) -> Result<(), TransferError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransferError(format!(
                "transfer of {} to {} rejected",
                amount, beneficiary
            )));
        }
        self.payouts.write().push(Payout {
            beneficiary: beneficiary.clone(),
            amount,
        });
        Ok(())
    }
}

// =========================================================================
// EVENT SINK
// =========================================================================

/// Append-only broadcast channel for audit records
pub trait EventSink: Send + Sync {
    fn emit(&self, record: &AuditRecord);
}

/// In-memory sink, mainly for tests and simulations
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn emit(&self, record: &AuditRecord) {
        self.records.write().push(record.clone());
    }
}

/// Forwards audit records to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, record: &AuditRecord) {
        info!(
            kind = %record.kind,
            actor = %record.actor,
            beneficiary = %record.beneficiary,
            amount = record.amount.0,
            proposal = ?record.proposal.map(|p| p.0),
            up = ?record.tally.map(|t| t.up),
            down = ?record.tally.map(|t| t.down),
            chosen = ?record.chosen,
            "audit"
        );
    }
}

/// Bundle of host collaborators handed to a `Dao`
#[derive(Clone)]
pub struct DaoHost {
    pub clock: Arc<dyn Clock>,
    pub transfer: Arc<dyn ValueTransfer>,
    pub sink: Arc<dyn EventSink>,
}

impl DaoHost {
    pub fn new(
        clock: Arc<dyn Clock>,
        transfer: Arc<dyn ValueTransfer>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            clock,
            transfer,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_types::ActionKind;

    #[test]
    fn test_manual_clock_is_monotonic() {
        let start = Utc::now();
        let clock = ManualClock::new(start);

        clock.advance(Duration::seconds(10));
        assert_eq!(clock.now(), start + Duration::seconds(10));

        clock.set(start);
        assert_eq!(clock.now(), start + Duration::seconds(10));

        clock.advance(Duration::seconds(-5));
        assert_eq!(clock.now(), start + Duration::seconds(10));
    }

    #[test]
    fn test_recording_transfer() {
        let transfer = RecordingTransfer::new();
        let bob = MemberId::new("bob");

        transfer.transfer(&bob, Amount::new(5)).unwrap();
        transfer.transfer(&bob, Amount::new(7)).unwrap();
        assert_eq!(transfer.total_paid_to(&bob), Amount::new(12));

        transfer.set_failing(true);
        assert!(transfer.transfer(&bob, Amount::new(1)).is_err());
        assert_eq!(transfer.payouts().len(), 2);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemoryEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&AuditRecord::new(
            ActionKind::ContributionReceived,
            MemberId::new("alice"),
            MemberId::treasury(),
            Amount::new(1),
            Utc::now(),
        ));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].kind, ActionKind::ContributionReceived);
    }
}
