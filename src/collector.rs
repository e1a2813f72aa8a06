//! Collection orchestrator
//!
//! One scrape runs one task per account inside a [`JoinSet`], waits for
//! all of them, and folds every report into samples and the fetch tally.
//! Account failures are logged and reported as `mailbox_ok = 0`; they
//! never fail the scrape.

use crate::config::Account;
use crate::error::{Error, Result};
use crate::mailbox::MailboxStatus;
use crate::metrics::{self, FetchResult, FetchTally};
use crate::session::{AccountReport, AccountSession};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// One value produced by a scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sample {
    /// Health of one account: `mailbox_ok`.
    AccountUp {
        server: String,
        user: String,
        ok: bool,
    },
    /// Counters of one mailbox: `total` and `unread_total`.
    Mailbox {
        server: String,
        user: String,
        status: MailboxStatus,
    },
}

/// Every sample of one scrape, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    samples: Vec<Sample>,
}

impl Snapshot {
    #[must_use]
    pub const fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// `mailbox_ok` for `(server, user)`, if the account was collected.
    #[must_use]
    pub fn account_ok(&self, server: &str, user: &str) -> Option<bool> {
        self.samples.iter().find_map(|sample| match sample {
            Sample::AccountUp {
                server: s,
                user: u,
                ok,
            } if s == server && u == user => Some(*ok),
            _ => None,
        })
    }

    /// Mailbox statuses reported for `(server, user)`.
    #[must_use]
    pub fn mailboxes(&self, server: &str, user: &str) -> Vec<&MailboxStatus> {
        self.samples
            .iter()
            .filter_map(|sample| match sample {
                Sample::Mailbox {
                    server: s,
                    user: u,
                    status,
                } if s == server && u == user => Some(status),
                _ => None,
            })
            .collect()
    }

    fn push_report(&mut self, report: AccountReport) {
        let ok = report.is_ok();
        self.samples
            .extend(report.mailboxes.into_iter().map(|status| Sample::Mailbox {
                server: report.server.clone(),
                user: report.user.clone(),
                status,
            }));
        self.samples.push(Sample::AccountUp {
            server: report.server,
            user: report.user,
            ok,
        });
    }
}

/// Collects every configured account on demand.
#[derive(Debug)]
pub struct Collector {
    accounts: Vec<Arc<Account>>,
    tally: Arc<FetchTally>,
}

impl Collector {
    /// `tally` is process-scoped: pass the same one to every collector
    /// that should share the fetch counter.
    #[must_use]
    pub fn new(accounts: Vec<Account>, tally: Arc<FetchTally>) -> Self {
        Self {
            accounts: accounts.into_iter().map(Arc::new).collect(),
            tally,
        }
    }

    #[must_use]
    pub fn accounts(&self) -> &[Arc<Account>] {
        &self.accounts
    }

    #[must_use]
    pub fn tally(&self) -> &FetchTally {
        &self.tally
    }

    /// Collect every account concurrently and wait for all of them.
    ///
    /// Exactly one `AccountUp` sample and one tally increment are
    /// produced per account, whatever happens to its task.
    pub async fn collect(&self) -> Snapshot {
        let started = Instant::now();
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(self.accounts.len());

        for account in &self.accounts {
            let session = AccountSession::new(Arc::clone(account));
            let handle = tasks.spawn(session.run());
            pending.insert(handle.id(), Arc::clone(account));
        }

        let mut snapshot = Snapshot::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            let report = match joined {
                Ok((id, report)) => {
                    pending.remove(&id);
                    report
                }
                Err(e) => {
                    let Some(account) = pending.remove(&e.id()) else {
                        error!("Unknown collection task failed: {}", e);
                        continue;
                    };
                    error!(
                        "Collection task for {}@{} failed: {}",
                        account.username, account.host, e
                    );
                    AccountReport::failed(&account, Error::Task(e.to_string()))
                }
            };
            self.record(&report);
            snapshot.push_report(report);
        }

        info!(
            "Collected {} accounts in {:?}",
            self.accounts.len(),
            started.elapsed()
        );
        snapshot
    }

    /// Collect and render in the Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns an error only if encoding fails; account failures are
    /// part of the output.
    pub async fn scrape(&self) -> Result<String> {
        let snapshot = self.collect().await;
        metrics::encode(&snapshot, &self.tally)
    }

    fn record(&self, report: &AccountReport) {
        let result = match &report.outcome {
            Ok(()) => FetchResult::Ok,
            Err(e) => {
                let stage = e
                    .stage()
                    .map_or_else(|| "task".to_string(), |s| s.to_string());
                warn!(
                    "Error while collecting {}@{} ({}): {}",
                    report.user, report.server, stage, e
                );
                FetchResult::Ko
            }
        };
        self.tally.record(&report.server, result);
    }
}
