//! Mailbox status data

use serde::Serialize;
use std::fmt;

/// Message counters of one mailbox, as reported by `STATUS`.
///
/// Produced fresh on every scrape and never cached.
///
/// # Examples
///
/// ```
/// use imap_messages_exporter::MailboxStatus;
///
/// let inbox = MailboxStatus::new("INBOX", 10, 3);
/// assert_eq!(inbox.seen(), 7);
/// assert_eq!(inbox.to_string(), "INBOX: 3/10 unread");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MailboxStatus {
    /// Mailbox name as returned by `LIST`.
    pub name: String,
    /// Number of messages (`MESSAGES`).
    pub total: u32,
    /// Number of messages without the `\Seen` flag (`UNSEEN`).
    pub unseen: u32,
}

impl MailboxStatus {
    #[must_use]
    pub fn new(name: impl Into<String>, total: u32, unseen: u32) -> Self {
        Self {
            name: name.into(),
            total,
            unseen,
        }
    }

    /// Messages already read. Saturates if a server reports more unseen
    /// than total messages.
    #[must_use]
    pub const fn seen(&self) -> u32 {
        self.total.saturating_sub(self.unseen)
    }
}

impl fmt::Display for MailboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{} unread", self.name, self.unseen, self.total)
    }
}
