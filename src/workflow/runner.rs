// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 smokeflow contributors

//! Workflow runner
//!
//! Runs the checks strictly in chain order. The first failure halts the
//! run: later checks are never started, and resources touched by earlier
//! checks are left as-is.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::errors::SmokeflowError;
use crate::probes::Probe;
use crate::workflow::{ChainBuilder, Workflow};

/// Workflow execution options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only show what would be done
    pub dry_run: bool,
    /// Only run specific checks (chain order is preserved)
    pub checks: Vec<String>,
    /// Verbose output
    pub verbose: bool,
}

/// Terminal state of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Never started because an earlier check failed
    Skipped,
}

/// Result of one check
#[derive(Debug)]
pub struct CheckOutcome {
    pub check: String,
    pub status: CheckStatus,
    pub detail: String,
    pub duration: Duration,
}

/// Result of executing a workflow
#[derive(Debug)]
pub struct RunReport {
    /// Outcomes in execution order
    pub outcomes: Vec<CheckOutcome>,
    /// Total execution time
    pub duration: Duration,
    /// Whether every check passed
    pub success: bool,
    /// The error that halted the run, if any
    pub failure: Option<SmokeflowError>,
}

/// Workflow runner
pub struct WorkflowRunner {
    /// Registered probes by check name
    probes: HashMap<String, Box<dyn Probe>>,
}

impl WorkflowRunner {
    /// Create a new workflow runner
    pub fn new() -> Self {
        Self {
            probes: HashMap::new(),
        }
    }

    /// Register a probe for a check
    pub fn register_probe(&mut self, check_name: &str, probe: Box<dyn Probe>) {
        self.probes.insert(check_name.to_string(), probe);
    }

    /// Execute a workflow
    pub async fn execute(
        &self,
        workflow: &Workflow,
        options: &RunOptions,
    ) -> Result<RunReport, SmokeflowError> {
        let start = Instant::now();

        // Build and validate the chain
        let chain = ChainBuilder::build(workflow)?;
        let execution_order = chain.execution_order()?;

        // Requested subsets must name real checks
        for name in &options.checks {
            if workflow.get_check(name).is_none() {
                return Err(SmokeflowError::CheckNotFound { check: name.clone() });
            }
        }

        // Filter checks if specific ones requested
        let checks_to_run: Vec<usize> = if options.checks.is_empty() {
            execution_order
        } else {
            execution_order
                .into_iter()
                .filter(|&idx| options.checks.contains(&workflow.checks[idx].name))
                .collect()
        };

        // Print execution plan
        self.print_execution_plan(workflow, &checks_to_run);

        if options.dry_run {
            return Ok(RunReport {
                outcomes: vec![],
                duration: start.elapsed(),
                success: true,
                failure: None,
            });
        }

        // Execute checks in order, halting on the first failure
        let mut outcomes = Vec::new();
        let mut failure = None;

        let mut remaining = checks_to_run.iter();
        for &idx in remaining.by_ref() {
            let check = &workflow.checks[idx];

            let probe = self.probes.get(&check.name).ok_or_else(|| {
                SmokeflowError::ProbeNotFound {
                    check: check.name.clone(),
                }
            })?;

            print!("  {} {}...", "→".blue(), check.name);

            let check_start = Instant::now();
            let result = probe.run(check).await;
            let duration = check_start.elapsed();

            match result {
                Ok(report) => {
                    println!(
                        "\r  {} {} {} ({:.2}s)",
                        "✓".green(),
                        check.name.bold(),
                        report.detail.dimmed(),
                        duration.as_secs_f64()
                    );

                    outcomes.push(CheckOutcome {
                        check: check.name.clone(),
                        status: CheckStatus::Passed,
                        detail: report.detail,
                        duration,
                    });
                }
                Err(error) => {
                    println!("\r  {} {} failed", "✗".red(), check.name.bold());

                    if options.verbose {
                        eprintln!("{}", error.to_string().dimmed());
                    }

                    outcomes.push(CheckOutcome {
                        check: check.name.clone(),
                        status: CheckStatus::Failed,
                        detail: error.to_string(),
                        duration,
                    });
                    failure = Some(error);
                    break;
                }
            }
        }

        // Checks after the failure never start
        for &idx in remaining {
            let check = &workflow.checks[idx];
            println!("  {} {} {}", "○".dimmed(), check.name.dimmed(), "(skipped)".dimmed());

            outcomes.push(CheckOutcome {
                check: check.name.clone(),
                status: CheckStatus::Skipped,
                detail: String::new(),
                duration: Duration::ZERO,
            });
        }

        let duration = start.elapsed();
        let success = failure.is_none();

        // Print summary
        println!();
        if success {
            println!(
                "{}",
                format!(
                    "All {} checks passed in {:.2}s",
                    outcomes.len(),
                    duration.as_secs_f64()
                )
                .green()
            );
        } else {
            println!(
                "{}",
                format!("Workflow failed after {:.2}s", duration.as_secs_f64()).red()
            );
        }

        Ok(RunReport {
            outcomes,
            duration,
            success,
            failure,
        })
    }

    /// Print the execution plan
    fn print_execution_plan(&self, workflow: &Workflow, checks: &[usize]) {
        println!();
        println!("{}: {}", "Workflow".bold(), workflow.name);
        println!("{}", "═".repeat(50));
        println!(
            "Execution plan ({} check{}):",
            checks.len(),
            if checks.len() == 1 { "" } else { "s" }
        );
        println!();

        for (i, &idx) in checks.iter().enumerate() {
            let check = &workflow.checks[idx];
            println!(
                "  {}. {} ({}) {}",
                i + 1,
                check.name.bold(),
                check.target_name(),
                format!("[profile: {}]", check.profile).dimmed()
            );
        }

        println!();
    }
}

impl Default for WorkflowRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::ProbeReport;
    use crate::workflow::{Check, Target};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct ScriptedProbe {
        calls: Arc<Mutex<Vec<String>>>,
        name: String,
        fail: bool,
    }

    #[async_trait]
    impl Probe for ScriptedProbe {
        async fn run(&self, check: &Check) -> Result<ProbeReport, SmokeflowError> {
            self.calls.lock().unwrap().push(self.name.clone());
            if self.fail {
                Err(SmokeflowError::Network {
                    service: "warehouse".into(),
                    message: "connection refused".into(),
                })
            } else {
                Ok(ProbeReport::new(format!("{} ok", check.name)))
            }
        }

        fn target(&self) -> &'static str {
            "warehouse_ping"
        }
    }

    fn five_check_workflow() -> Workflow {
        let names = ["warehouse", "bucket", "job", "table", "rows"];
        Workflow {
            version: "1".into(),
            name: "connectivity".into(),
            description: None,
            tags: vec![],
            checks: names
                .iter()
                .map(|name| Check {
                    name: (*name).into(),
                    description: None,
                    profile: "default".into(),
                    target: Target::WarehousePing { sql: "SELECT 1".into() },
                    depends_on: vec![],
                })
                .collect(),
        }
    }

    fn runner_with(calls: &Arc<Mutex<Vec<String>>>, failing: &[&str]) -> WorkflowRunner {
        let mut runner = WorkflowRunner::new();
        for name in ["warehouse", "bucket", "job", "table", "rows"] {
            runner.register_probe(
                name,
                Box::new(ScriptedProbe {
                    calls: Arc::clone(calls),
                    name: name.to_string(),
                    fail: failing.contains(&name),
                }),
            );
        }
        runner
    }

    #[tokio::test]
    async fn test_all_checks_run_in_order() {
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();
        let runner = runner_with(&calls, &[]);

        let report = runner
            .execute(&five_check_workflow(), &RunOptions::default())
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.outcomes.len(), 5);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.status == CheckStatus::Passed));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["warehouse", "bucket", "job", "table", "rows"]
        );
    }

    #[tokio::test]
    async fn test_first_failure_short_circuits() {
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();
        let runner = runner_with(&calls, &["warehouse"]);

        let report = runner
            .execute(&five_check_workflow(), &RunOptions::default())
            .await
            .unwrap();

        assert!(!report.success);
        assert!(matches!(report.failure, Some(SmokeflowError::Network { .. })));

        // Only the failing check ran
        assert_eq!(*calls.lock().unwrap(), vec!["warehouse"]);

        assert_eq!(report.outcomes[0].status, CheckStatus::Failed);
        for outcome in &report.outcomes[1..] {
            assert_eq!(outcome.status, CheckStatus::Skipped);
        }
        assert_eq!(report.outcomes.len(), 5);
    }

    #[tokio::test]
    async fn test_mid_chain_failure_skips_remainder() {
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();
        let runner = runner_with(&calls, &["job"]);

        let report = runner
            .execute(&five_check_workflow(), &RunOptions::default())
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(*calls.lock().unwrap(), vec!["warehouse", "bucket", "job"]);
        assert_eq!(report.outcomes[2].status, CheckStatus::Failed);
        assert_eq!(report.outcomes[3].status, CheckStatus::Skipped);
        assert_eq!(report.outcomes[4].status, CheckStatus::Skipped);
    }

    #[tokio::test]
    async fn test_subset_preserves_order() {
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();
        let runner = runner_with(&calls, &[]);

        let options = RunOptions {
            checks: vec!["table".into(), "warehouse".into()],
            ..Default::default()
        };

        let report = runner
            .execute(&five_check_workflow(), &options)
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(*calls.lock().unwrap(), vec!["warehouse", "table"]);
    }

    #[tokio::test]
    async fn test_unknown_subset_check_errors() {
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();
        let runner = runner_with(&calls, &[]);

        let options = RunOptions {
            checks: vec!["nonexistent".into()],
            ..Default::default()
        };

        let err = runner
            .execute(&five_check_workflow(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, SmokeflowError::CheckNotFound { .. }));
    }

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let calls: Arc<Mutex<Vec<String>>> = Arc::default();
        let runner = runner_with(&calls, &[]);

        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = runner
            .execute(&five_check_workflow(), &options)
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.outcomes.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_probe_errors() {
        let runner = WorkflowRunner::new();

        let err = runner
            .execute(&five_check_workflow(), &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SmokeflowError::ProbeNotFound { .. }));
    }
}
