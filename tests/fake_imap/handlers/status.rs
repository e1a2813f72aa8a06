//! STATUS command handler.
//!
//! Answers with the folder's message and unseen counts (RFC 3501
//! Section 7.2.4), regardless of which items were requested:
//!
//! ```text
//! * STATUS "INBOX" (MESSAGES 10 UNSEEN 3)
//! A0004 OK STATUS completed
//! ```

use crate::fake_imap::io::{stall, write_line, write_tagged};
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the STATUS command for `folder_name`.
pub async fn handle_status<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = mailbox.get_folder(folder_name) else {
        let _ = write_tagged(stream, tag, "NO", "Folder not found").await;
        return;
    };

    if folder.stall_status {
        stall().await;
    }
    if folder.status_no {
        let _ = write_tagged(stream, tag, "NO", "Mailbox vanished").await;
        return;
    }

    let line = format!(
        "* STATUS \"{}\" (MESSAGES {} UNSEEN {})\r\n",
        folder.name, folder.total, folder.unseen
    );
    if write_line(stream, &line).await.is_err() {
        return;
    }
    let _ = write_tagged(stream, tag, "OK", "STATUS completed").await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::io::capture;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use std::time::Duration;

    async fn run(tag: &str, folder_name: &str, mailbox: &Mailbox) -> String {
        capture(|mut stream| async move {
            handle_status(tag, folder_name, mailbox, &mut stream).await;
            (stream, ())
        })
        .await
        .0
    }

    #[tokio::test]
    async fn reports_counts() {
        let mailbox = MailboxBuilder::new().folder("INBOX", 10, 3).build();
        let output = run("A4", "INBOX", &mailbox).await;

        assert_eq!(
            output,
            "* STATUS \"INBOX\" (MESSAGES 10 UNSEEN 3)\r\nA4 OK STATUS completed\r\n"
        );
    }

    #[tokio::test]
    async fn unknown_folder_is_no() {
        let mailbox = MailboxBuilder::new().folder("INBOX", 1, 0).build();
        let output = run("A5", "Nope", &mailbox).await;

        assert_eq!(output, "A5 NO Folder not found\r\n");
    }

    #[tokio::test]
    async fn refused_folder_is_no() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX", 1, 0)
            .status_no()
            .build();
        let output = run("A7", "INBOX", &mailbox).await;

        assert_eq!(output, "A7 NO Mailbox vanished\r\n");
    }

    #[tokio::test]
    async fn stalled_folder_never_answers() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX", 1, 0)
            .stall_status()
            .build();
        let answered =
            tokio::time::timeout(Duration::from_millis(100), run("A6", "INBOX", &mailbox)).await;

        assert!(answered.is_err());
    }
}
