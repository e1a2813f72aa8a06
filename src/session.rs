//! Account session
//!
//! Drives one account through the full exchange:
//!
//! ```text
//! Idle -> Connecting -> Authenticating -> Enumerating -> FetchingStatus (xN) -> Closing -> Done
//! ```
//!
//! Any stage may jump straight to `Closing`. Closing always runs once a
//! connection exists: a `LOGOUT` attempt followed by dropping the
//! transport. Every network round trip is bounded by the account timeout.

use crate::config::Account;
use crate::connection::{self, ImapClient, ImapSession};
use crate::error::{Error, Result};
use crate::mailbox::MailboxStatus;
use async_imap::imap_proto::{MailboxDatum, Response, Status};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, warn};

/// Protocol stage of an account session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Connecting,
    Authenticating,
    Enumerating,
    FetchingStatus,
    Closing,
    Done,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Enumerating => "enumerating",
            Self::FetchingStatus => "fetching status",
            Self::Closing => "closing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one account produced during one scrape.
///
/// On a `STATUS` failure, `mailboxes` still holds the statuses gathered
/// for the mailboxes before the failing one.
#[derive(Debug)]
pub struct AccountReport {
    pub server: String,
    pub user: String,
    pub mailboxes: Vec<MailboxStatus>,
    pub outcome: Result<()>,
}

impl AccountReport {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Report for an account whose session never returned.
    #[must_use]
    pub fn failed(account: &Account, error: Error) -> Self {
        Self {
            server: account.host.clone(),
            user: account.username.clone(),
            mailboxes: Vec::new(),
            outcome: Err(error),
        }
    }
}

/// Runs the protocol sequence for one account.
pub struct AccountSession {
    account: Arc<Account>,
}

impl AccountSession {
    #[must_use]
    pub const fn new(account: Arc<Account>) -> Self {
        Self { account }
    }

    /// Collect the account. Never fails: errors end up in the report.
    pub async fn run(self) -> AccountReport {
        let mut mailboxes = Vec::new();
        let outcome = self.drive(&mut mailboxes).await;
        debug!(
            "{}@{}: {}",
            self.account.username,
            self.account.host,
            Stage::Done
        );

        AccountReport {
            server: self.account.host.clone(),
            user: self.account.username.clone(),
            mailboxes,
            outcome,
        }
    }

    async fn drive(&self, mailboxes: &mut Vec<MailboxStatus>) -> Result<()> {
        self.enter(Stage::Connecting);
        let client = connection::open(&self.account).await?;

        self.enter(Stage::Authenticating);
        let mut session = self.login(client).await?;

        let result = self.fetch(&mut session, mailboxes).await;

        self.enter(Stage::Closing);
        self.logout(session).await;
        result
    }

    async fn login(&self, client: ImapClient) -> Result<ImapSession> {
        let account = &self.account;
        match time::timeout(
            account.timeout,
            client.login(&account.username, &account.password),
        )
        .await
        {
            Ok(Ok(session)) => Ok(session),
            Ok(Err((e, mut client))) => {
                self.enter(Stage::Closing);
                match bounded(
                    account.timeout,
                    client.run_command_and_check_ok("LOGOUT", None),
                )
                .await
                {
                    Ok(()) => debug!("Logged out of {} after failed login", account.host),
                    Err(e) => debug!("Could not logout of {}: {}", account.host, e),
                }
                Err(Error::Auth(e.to_string()))
            }
            // The transport went down with the login future.
            Err(_) => Err(Error::Auth(format!(
                "Timed out after {:?}",
                account.timeout
            ))),
        }
    }

    async fn fetch(
        &self,
        session: &mut ImapSession,
        mailboxes: &mut Vec<MailboxStatus>,
    ) -> Result<()> {
        self.enter(Stage::Enumerating);
        let names = self.enumerate(session).await?;
        debug!(
            "{} mailboxes on {} match {}",
            names.len(),
            self.account.host,
            self.account.filter
        );

        if !names.is_empty() {
            self.enter(Stage::FetchingStatus);
        }
        for name in names {
            let status = self.status(session, &name).await?;
            mailboxes.push(status);
        }
        Ok(())
    }

    /// LIST the mailboxes matching the account filter.
    ///
    /// The whole list is discarded unless the server completes the
    /// command with a tagged `OK`.
    async fn enumerate(&self, session: &mut ImapSession) -> Result<Vec<String>> {
        let command = format!("LIST \"\" {}", self.account.filter);
        bounded(self.account.timeout, list_names(session, &command))
            .await
            .map_err(Error::Enumerate)
    }

    async fn status(&self, session: &mut ImapSession, name: &str) -> Result<MailboxStatus> {
        let mailbox = bounded(
            self.account.timeout,
            session.status(name, "(MESSAGES UNSEEN)"),
        )
        .await
        .map_err(|message| Error::Status {
            mailbox: name.to_string(),
            message,
        })?;

        Ok(MailboxStatus::new(
            name,
            mailbox.exists,
            mailbox.unseen.unwrap_or(0),
        ))
    }

    /// The transport closes when `session` is dropped at the end of this
    /// call, whether or not `LOGOUT` went through.
    async fn logout(&self, mut session: ImapSession) {
        if let Err(e) = bounded(self.account.timeout, session.logout()).await {
            warn!("Could not logout of {}: {}", self.account.host, e);
        }
    }

    fn enter(&self, stage: Stage) {
        debug!("{}@{}: {}", self.account.username, self.account.host, stage);
    }
}

/// Run a LIST command and collect the names it returns.
///
/// `Session::list` ends its stream on any tagged completion, so a `NO`
/// or `BAD` would look like a short list. Reading the responses here
/// keeps the tagged status.
async fn list_names(
    session: &mut ImapSession,
    command: &str,
) -> std::result::Result<Vec<String>, async_imap::error::Error> {
    let tag = session.run_command(command).await?;
    let mut names = Vec::new();
    loop {
        let Some(response) = session.read_response().await? else {
            return Err(async_imap::error::Error::ConnectionLost);
        };
        match response.parsed() {
            Response::MailboxData(MailboxDatum::List { name, .. }) => {
                names.push(name.to_string());
            }
            Response::Done {
                tag: done,
                status,
                information,
                ..
            } if *done == tag => {
                let information = information.as_deref().unwrap_or_default();
                return match status {
                    Status::Ok => Ok(names),
                    Status::No => Err(async_imap::error::Error::No(information.to_string())),
                    _ => Err(async_imap::error::Error::Bad(information.to_string())),
                };
            }
            _ => {}
        }
    }
}

/// Await `fut` for at most `timeout`, flattening both failure kinds into
/// a message.
async fn bounded<T, E>(
    timeout: Duration,
    fut: impl Future<Output = std::result::Result<T, E>>,
) -> std::result::Result<T, String>
where
    E: fmt::Display,
{
    match time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("Timed out after {timeout:?}")),
    }
}
