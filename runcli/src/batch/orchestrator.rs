//! Drives a host plan through a [`HostRunner`].

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::stream::{self, StreamExt};
use log::{info, warn};

use super::inventory::HostPlan;
use super::report::RunReport;
use super::runner::{HostOutcome, HostRunner};
use crate::error::{BatchError, Error};
use crate::reporter::Reporter;

/// How many hosts are in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One host at a time, in plan order.
    #[default]
    Sequential,

    /// Up to `limit` hosts at a time. Each outcome is recorded as soon as
    /// its host finishes; results are put back in plan order at the end.
    Concurrent { limit: usize },
}

impl Schedule {
    /// Schedule for a concurrency setting; `0` and `1` mean sequential.
    pub fn with_limit(limit: usize) -> Self {
        if limit <= 1 {
            Self::Sequential
        } else {
            Self::Concurrent { limit }
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Concurrent { limit } => limit.max(1),
        }
    }
}

/// Runs every host of a plan and collects a [`RunReport`].
///
/// One host failing never stops the run; the host is recorded as failed
/// and the next one starts.
pub struct Orchestrator<R> {
    runner: R,
    schedule: Schedule,
    reporter: Arc<dyn Reporter>,
}

impl<R: HostRunner> Orchestrator<R> {
    /// Create an orchestrator that processes hosts sequentially.
    pub fn new(runner: R, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            runner,
            schedule: Schedule::Sequential,
            reporter,
        }
    }

    /// Set the schedule.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Current schedule.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// The host runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every host in `plan`.
    pub async fn run(&self, plan: &HostPlan) -> RunReport {
        self.run_until(plan, std::future::pending::<()>()).await
    }

    /// Run every host in `plan`, stopping early when `shutdown` completes.
    ///
    /// On shutdown, sessions in flight are dropped (which tears them down),
    /// those hosts are recorded as failed with [`BatchError::Interrupted`],
    /// and hosts never started are listed as not attempted.
    pub async fn run_until<F>(&self, plan: &HostPlan, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        let entries = plan.resolve();
        let hosts: Vec<String> = entries.iter().map(|(host, _)| host.clone()).collect();
        info!("Running {} host(s) ({:?})", hosts.len(), self.schedule);

        let started = Mutex::new(Vec::new());
        let mut report = RunReport::default();

        {
            let started = &started;
            let outcomes = stream::iter(entries)
                .map(|(host, resolved)| async move {
                    started
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(host.clone());
                    self.reporter.host_started(&host);
                    let outcome = match resolved {
                        Ok(target) => self.runner.run(target).await,
                        Err(error) => HostOutcome::failed(error),
                    };
                    (host, outcome)
                })
                .buffer_unordered(self.schedule.width());
            tokio::pin!(outcomes);
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    biased;
                    () = &mut shutdown => {
                        warn!("Shutdown requested; abandoning remaining hosts");
                        report.mark_interrupted();
                        break;
                    }
                    next = outcomes.next() => match next {
                        Some((host, outcome)) => self.fold(&mut report, &host, outcome),
                        None => break,
                    },
                }
            }
        }

        if report.interrupted() {
            let started = started.into_inner().unwrap_or_else(PoisonError::into_inner);
            for host in &hosts {
                if report.contains(host) {
                    continue;
                }
                if started.contains(host) {
                    let error: Error = BatchError::Interrupted { host: host.clone() }.into();
                    self.reporter.host_failed(host, &error);
                    report.record_failure(host, &error, None);
                } else {
                    report.record_not_attempted(host.clone());
                }
            }
        }

        report.order_results(&hosts);
        self.reporter.run_finished(&report);
        report
    }

    fn fold(&self, report: &mut RunReport, host: &str, outcome: HostOutcome) {
        match outcome {
            HostOutcome::Succeeded(result) => report.record_success(result),
            HostOutcome::Failed { error, partial } => {
                self.reporter.host_failed(host, &error);
                report.record_failure(host, &error, partial);
            }
        }
    }
}
