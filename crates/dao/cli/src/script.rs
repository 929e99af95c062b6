//! Scenario scripts
//!
//! A script is a TOML file of `[[step]]` tables executed in order against
//! a fresh DAO with a manual clock and an in-memory transfer primitive.
//!
//! ```toml
//! [[step]]
//! action = "contribute"
//! caller = "alice"
//! amount = "0.1"
//!
//! [[step]]
//! action = "propose"
//! caller = "dave"
//! title = "Grant"
//! beneficiary = "dave"
//! amount = "0.01"
//! expect = "Unauthorized"
//! ```
//!
//! A step without `expect` must succeed. A step with `expect` must fail
//! with that error kind.

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use chrono::{DateTime, Duration, Utc};
use dao_runtime::{
    Clock, Dao, DaoHost, DaoSnapshot, ManualClock, Payout, RecordingTransfer, TracingEventSink,
};
use dao_types::{
    Amount, DaoError, DaoResult, ErrorKind, MemberId, Proposal, ProposalId, ProposalRequest,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// One scripted operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Contribute {
        caller: String,
        /// Decimal units, e.g. "0.1"
        amount: String,
    },
    Propose {
        caller: String,
        title: String,
        #[serde(default)]
        description: String,
        beneficiary: String,
        amount: String,
    },
    Vote {
        caller: String,
        proposal: u64,
        chosen: bool,
    },
    Pay {
        caller: String,
        proposal: u64,
    },
    /// Move the manual clock forward
    Advance { secs: u64 },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Contribute { .. } => "contribute",
            Action::Propose { .. } => "propose",
            Action::Vote { .. } => "vote",
            Action::Pay { .. } => "pay",
            Action::Advance { .. } => "advance",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Error kind the step must fail with
    #[serde(default)]
    pub expect: Option<ErrorKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(contents: &str) -> CliResult<Self> {
        toml::from_str(contents).map_err(|e| CliError::Script(e.to_string()))
    }

    pub fn load(path: &std::path::Path) -> CliResult<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }
}

/// What happened at one step
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub action: &'static str,
    pub detail: String,
    pub error: Option<ErrorKind>,
    pub message: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Final state after a script has run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub dao: String,
    pub steps: Vec<StepOutcome>,
    pub balance: Amount,
    pub proposals: Vec<Proposal>,
    pub payouts: Vec<Payout>,
    pub audit_records: usize,
}

/// Executes scripts against an in-memory DAO
pub struct ScenarioRunner {
    dao: Dao,
    clock: Arc<ManualClock>,
    transfer: Arc<RecordingTransfer>,
}

impl ScenarioRunner {
    pub fn new(config: &CliConfig, start: DateTime<Utc>) -> CliResult<Self> {
        let (host, clock, transfer) = Self::host(start);
        let dao = Dao::new(config.dao.clone(), config.admin(), host)?;
        Ok(Self {
            dao,
            clock,
            transfer,
        })
    }

    /// Continue from a snapshot; the clock never starts before it was taken
    pub fn restore(snapshot: DaoSnapshot, start: DateTime<Utc>) -> CliResult<Self> {
        let (host, clock, transfer) = Self::host(start.max(snapshot.created_at));
        let dao = Dao::restore(snapshot, host)?;
        Ok(Self {
            dao,
            clock,
            transfer,
        })
    }

    fn host(start: DateTime<Utc>) -> (DaoHost, Arc<ManualClock>, Arc<RecordingTransfer>) {
        let clock = Arc::new(ManualClock::new(start));
        let transfer = Arc::new(RecordingTransfer::new());
        let host = DaoHost::new(clock.clone(), transfer.clone(), Arc::new(TracingEventSink));
        (host, clock, transfer)
    }

    /// Run every step, stopping at the first unmet expectation
    pub fn run(&self, script: &Script) -> CliResult<Report> {
        let mut outcomes = Vec::with_capacity(script.steps.len());

        for (index, step) in script.steps.iter().enumerate() {
            let number = index + 1;
            let action = step.action.name();
            let outcome = match self.apply(&step.action) {
                Ok(detail) => StepOutcome {
                    step: number,
                    action,
                    detail,
                    error: None,
                    message: None,
                },
                Err(e) => StepOutcome {
                    step: number,
                    action,
                    detail: String::new(),
                    error: Some(e.kind()),
                    message: Some(e.to_string()),
                },
            };

            debug!(step = number, action, error = ?outcome.error, "Step executed");
            if outcome.error != step.expect {
                return Err(CliError::expectation(number, action, step.expect, outcome.error));
            }
            outcomes.push(outcome);
        }

        info!(steps = outcomes.len(), "Script completed");
        Ok(self.report(outcomes))
    }

    pub fn dao(&self) -> &Dao {
        &self.dao
    }

    fn apply(&self, action: &Action) -> DaoResult<String> {
        match action {
            Action::Contribute { caller, amount } => {
                let amount: Amount = amount.parse()?;
                let balance = self.dao.contribute(&MemberId::new(caller.as_str()), amount)?;
                Ok(format!("{} contributed {}, balance {}", caller, amount, balance))
            }
            Action::Propose {
                caller,
                title,
                description,
                beneficiary,
                amount,
            } => {
                let request = ProposalRequest::new(
                    title.as_str(),
                    description.as_str(),
                    MemberId::new(beneficiary.as_str()),
                    amount.parse()?,
                );
                let proposal = self
                    .dao
                    .create_proposal(&MemberId::new(caller.as_str()), request)?;
                Ok(format!(
                    "{} raised {} for {} to {}",
                    caller, proposal.id, proposal.amount, proposal.beneficiary
                ))
            }
            Action::Vote {
                caller,
                proposal,
                chosen,
            } => {
                let id = ProposalId::new(*proposal);
                let tally = self
                    .dao
                    .perform_vote(&MemberId::new(caller.as_str()), id, *chosen)?;
                Ok(format!(
                    "{} voted {} on {}, up {} down {}",
                    caller,
                    if *chosen { "up" } else { "down" },
                    id,
                    tally.up,
                    tally.down
                ))
            }
            Action::Pay { caller, proposal } => {
                let id = ProposalId::new(*proposal);
                self.dao.pay_beneficiary(&MemberId::new(caller.as_str()), id)?;
                Ok(format!(
                    "{} paid out {}, balance {}",
                    caller,
                    id,
                    self.dao.total_balance()
                ))
            }
            Action::Advance { secs } => {
                let secs = i64::try_from(*secs)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .ok_or_else(|| {
                        DaoError::InvalidInput(format!("cannot advance {} seconds", secs))
                    })?;
                self.clock.advance(secs);
                Ok(format!("clock advanced to {}", self.clock.now()))
            }
        }
    }

    fn report(&self, steps: Vec<StepOutcome>) -> Report {
        Report {
            dao: self.dao.config().name.clone(),
            steps,
            balance: self.dao.total_balance(),
            proposals: self.dao.list_proposals(),
            payouts: self.transfer.payouts(),
            audit_records: self.dao.journal().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: &str = r#"
        [[step]]
        action = "contribute"
        caller = "alice"
        amount = "0.1"

        [[step]]
        action = "contribute"
        caller = "carol"
        amount = "0.2"

        [[step]]
        action = "propose"
        caller = "alice"
        title = "Grant"
        beneficiary = "bob"
        amount = "0.05"

        [[step]]
        action = "vote"
        caller = "alice"
        proposal = 0
        chosen = true

        [[step]]
        action = "advance"
        secs = 301

        [[step]]
        action = "pay"
        caller = "carol"
        proposal = 0

        [[step]]
        action = "pay"
        caller = "carol"
        proposal = 0
        expect = "AlreadyPaid"
    "#;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(&CliConfig::default(), Utc::now()).unwrap()
    }

    #[test]
    fn test_parse_script() {
        let script = Script::parse(HAPPY_PATH).unwrap();
        assert_eq!(script.steps.len(), 7);
        assert!(matches!(script.steps[4].action, Action::Advance { secs: 301 }));
        assert_eq!(script.steps[6].expect, Some(ErrorKind::AlreadyPaid));
        assert_eq!(script.steps[0].expect, None);
    }

    #[test]
    fn test_happy_path_report() {
        let script = Script::parse(HAPPY_PATH).unwrap();
        let report = runner().run(&script).unwrap();

        assert_eq!(report.steps.len(), 7);
        assert_eq!(report.balance, Amount::from_millis(250));
        assert_eq!(report.payouts.len(), 1);
        assert_eq!(report.payouts[0].beneficiary, MemberId::new("bob"));
        assert!(report.proposals[0].paid);
        assert_eq!(report.proposals[0].executor, Some(MemberId::new("carol")));
        assert!(!report.steps[6].succeeded());
    }

    #[test]
    fn test_unmet_expectation_stops() {
        let script = Script::parse(
            r#"
            [[step]]
            action = "contribute"
            caller = "dave"
            amount = "0.01"

            [[step]]
            action = "propose"
            caller = "dave"
            title = "Mine"
            beneficiary = "dave"
            amount = "0.01"
            "#,
        )
        .unwrap();

        let err = runner().run(&script).unwrap_err();
        assert!(matches!(err, CliError::Expectation { step: 2, .. }));
    }

    #[test]
    fn test_bad_amount_is_invalid_input() {
        let script = Script::parse(
            r#"
            [[step]]
            action = "contribute"
            caller = "alice"
            amount = "lots"
            expect = "InvalidInput"
            "#,
        )
        .unwrap();

        let report = runner().run(&script).unwrap();
        assert_eq!(report.steps[0].error, Some(ErrorKind::InvalidInput));
        assert_eq!(report.balance, Amount::zero());
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = Script::parse(
            r#"
            [[step]]
            action = "withdraw"
            caller = "alice"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Script(_)));
    }

    #[test]
    fn test_restored_runner_continues_from_snapshot() {
        let first = runner();
        first.run(&Script::parse(HAPPY_PATH).unwrap()).unwrap();
        let json = first.dao().snapshot().unwrap().to_json().unwrap();

        let snapshot = DaoSnapshot::from_json(&json).unwrap();
        let resumed = ScenarioRunner::restore(snapshot, Utc::now()).unwrap();
        let script = Script::parse(
            r#"
            [[step]]
            action = "pay"
            caller = "alice"
            proposal = 0
            expect = "AlreadyPaid"

            [[step]]
            action = "vote"
            caller = "carol"
            proposal = 0
            chosen = true
            expect = "VotingPeriodOver"

            [[step]]
            action = "contribute"
            caller = "bob"
            amount = "0.05"
            "#,
        )
        .unwrap();

        let report = resumed.run(&script).unwrap();
        assert_eq!(report.balance, Amount::from_millis(300));
        assert!(report.proposals[0].paid);
        assert!(report.payouts.is_empty());
        assert!(resumed.dao().is_contributor(&MemberId::new("bob")));
    }

    #[test]
    fn test_grant_round_demo() {
        let config = CliConfig::parse(include_str!("../../../../demos/config.toml")).unwrap();
        let script = Script::parse(include_str!("../../../../demos/grant_round.toml")).unwrap();
        let runner = ScenarioRunner::new(&config, Utc::now()).unwrap();

        let report = runner.run(&script).unwrap();
        assert_eq!(report.dao, "grants");
        assert_eq!(report.balance, Amount::from_millis(310));
        assert!(report.proposals[0].passed);
        assert!(runner.dao().snapshot().unwrap().validate().is_ok());
    }
}
