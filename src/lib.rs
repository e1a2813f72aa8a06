//! IMAP messages exporter
//!
//! Polls a set of IMAP accounts on every Prometheus scrape and reports,
//! per account, whether the server could be queried and, per mailbox,
//! the total and unread message counts.
//!
//! Accounts are collected concurrently. A failing account shows up as
//! `imap_messages_mailbox_ok 0` and an `imap_messages_fetch_total`
//! increment with `result="ko"`; it never fails the scrape or affects
//! other accounts.

mod collector;
mod config;
mod connection;
mod error;
mod mailbox;
mod metrics;
pub mod server;
mod session;
mod tls;

pub use collector::{Collector, Sample, Snapshot};
pub use config::{Account, Config, DEFAULT_FILTER, DEFAULT_LISTEN, DEFAULT_TIMEOUT};
pub use connection::{ImapClient, ImapSession, ImapStream, open};
pub use error::{Error, Result};
pub use mailbox::MailboxStatus;
pub use metrics::{FetchResult, FetchTally, NAMESPACE, encode};
pub use session::{AccountReport, AccountSession, Stage};
pub use tls::{Tls, TrustPolicy};
