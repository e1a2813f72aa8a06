//! Fake IMAP server for integration testing
//!
//! This module provides an in-process IMAP server that speaks enough
//! of the protocol to test the exporter end-to-end:
//!
//! TCP [-> TLS] -> greeting -> LOGIN -> LIST -> STATUS ... -> LOGOUT
//!
//! ## Module layout
//!
//! - `server` -- TCP listener, optional TLS, and command dispatch
//! - `handlers/` -- one file per IMAP command (LOGIN, LIST, STATUS, LOGOUT)
//! - `mailbox` -- test data model (folders, counters, failure injection)
//! - `io` -- shared write helpers

mod handlers;
mod io;

pub use mailbox::MailboxBuilder;
pub use server::FakeImapServer;
