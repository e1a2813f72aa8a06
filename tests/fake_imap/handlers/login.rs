//! LOGIN command handler.
//!
//! Checks the credentials against the account state after the
//! configured login delay. A rejected LOGIN leaves the connection open,
//! as real servers do, so the client can still send LOGOUT.

use crate::fake_imap::io::write_tagged;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the LOGIN command. Returns `false` if the client went away.
pub async fn handle_login<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    username: &str,
    password: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    if !mailbox.login_delay.is_zero() {
        tokio::time::sleep(mailbox.login_delay).await;
    }

    let written = if mailbox.accepts(username, password) {
        write_tagged(stream, tag, "OK", "LOGIN completed").await
    } else {
        write_tagged(stream, tag, "NO", "LOGIN failed: invalid credentials").await
    };
    written.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::io::capture;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use std::time::{Duration, Instant};

    async fn run(tag: &str, username: &str, password: &str, mailbox: &Mailbox) -> (String, bool) {
        capture(|mut stream| async move {
            let ok = handle_login(tag, username, password, mailbox, &mut stream).await;
            (stream, ok)
        })
        .await
    }

    #[tokio::test]
    async fn accepts_matching_credentials() {
        let mailbox = MailboxBuilder::new().credentials("bob", "secret").build();
        let (output, ok) = run("A0001", "bob", "secret", &mailbox).await;
        assert!(ok);
        assert_eq!(output, "A0001 OK LOGIN completed\r\n");
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let mailbox = MailboxBuilder::new().credentials("bob", "secret").build();
        let (output, ok) = run("A0001", "bob", "guess", &mailbox).await;
        assert!(ok);
        assert!(output.starts_with("A0001 NO "));
    }

    #[tokio::test]
    async fn waits_for_login_delay() {
        let mailbox = MailboxBuilder::new()
            .login_delay(Duration::from_millis(100))
            .build();
        let started = Instant::now();
        let (output, _) = run("T1", "testuser", "testpass", &mailbox).await;
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(output.starts_with("T1 OK"));
    }
}
