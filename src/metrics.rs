//! Prometheus metrics
//!
//! Gauges are rebuilt from scratch on every scrape. Only the fetch
//! counter outlives a scrape, inside the caller-owned [`FetchTally`].

use crate::collector::{Sample, Snapshot};
use crate::error::Result;
use prometheus::core::Collector;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::fmt;

pub const NAMESPACE: &str = "imap_messages";

/// Result label of `imap_messages_fetch_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchResult {
    Ok,
    Ko,
}

impl FetchResult {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Ko => "ko",
        }
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cumulative count of collection attempts per `(host, result)`.
///
/// Series appear the first time they are incremented and never go down.
/// Increments are atomic, so one tally can be shared by every account
/// task of every scrape.
#[derive(Clone)]
pub struct FetchTally {
    counter: IntCounterVec,
}

impl FetchTally {
    /// # Errors
    ///
    /// Returns an error if the counter cannot be created.
    pub fn new() -> Result<Self> {
        let counter = IntCounterVec::new(
            Opts::new("fetch_total", "Number of times the fetch performed.").namespace(NAMESPACE),
            &["host", "result"],
        )?;
        Ok(Self { counter })
    }

    pub fn record(&self, host: &str, result: FetchResult) {
        self.counter
            .with_label_values(&[host, result.as_str()])
            .inc();
    }

    /// Current count for `(host, result)`, without creating the series.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn get(&self, host: &str, result: FetchResult) -> u64 {
        let has = |metric: &prometheus::proto::Metric, name: &str, value: &str| {
            metric
                .get_label()
                .iter()
                .any(|l| l.get_name() == name && l.get_value() == value)
        };
        self.counter
            .collect()
            .iter()
            .flat_map(prometheus::proto::MetricFamily::get_metric)
            .find(|m| has(m, "host", host) && has(m, "result", result.as_str()))
            .map_or(0, |m| m.get_counter().get_value() as u64)
    }
}

impl fmt::Debug for FetchTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTally").finish_non_exhaustive()
    }
}

fn gauge(name: &str, help: &str, labels: &[&str]) -> Result<GaugeVec> {
    Ok(GaugeVec::new(
        Opts::new(name, help).namespace(NAMESPACE),
        labels,
    )?)
}

/// Render one scrape in the Prometheus text format.
///
/// # Errors
///
/// Returns an error if registration or encoding fails.
pub fn encode(snapshot: &Snapshot, tally: &FetchTally) -> Result<String> {
    let server_ok = gauge("mailbox_ok", "1 if the server is OK.", &["server", "user"])?;
    let total = gauge(
        "total",
        "Number of messages",
        &["server", "user", "mailbox"],
    )?;
    let unread = gauge(
        "unread_total",
        "Number of unread messages",
        &["server", "user", "mailbox"],
    )?;

    for sample in snapshot.samples() {
        match sample {
            Sample::AccountUp { server, user, ok } => {
                server_ok
                    .with_label_values(&[server.as_str(), user.as_str()])
                    .set(if *ok { 1.0 } else { 0.0 });
            }
            Sample::Mailbox {
                server,
                user,
                status,
            } => {
                let labels = [server.as_str(), user.as_str(), status.name.as_str()];
                total
                    .with_label_values(&labels)
                    .set(f64::from(status.total));
                unread
                    .with_label_values(&labels)
                    .set(f64::from(status.unseen));
            }
        }
    }

    let registry = Registry::new();
    registry.register(Box::new(server_ok))?;
    registry.register(Box::new(total))?;
    registry.register(Box::new(unread))?;
    registry.register(Box::new(tally.counter.clone()))?;

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
