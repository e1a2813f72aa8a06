//! Shared I/O helpers for the fake IMAP server.
//!
//! Every write is flushed immediately so the client sees each response
//! line as soon as a handler produces it.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Write a string to the stream and flush.
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}

/// Write the tagged completion of a command, e.g. `A0003 OK LIST completed`.
pub async fn write_tagged<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    tag: &str,
    status: &str,
    text: &str,
) -> std::io::Result<()> {
    write_line(stream, &format!("{tag} {status} {text}\r\n")).await
}

/// Park the handler forever, as an unresponsive server would.
pub async fn stall() {
    std::future::pending::<()>().await;
}

/// Run a handler against an in-memory stream and return what it wrote.
#[cfg(test)]
pub async fn capture<F, Fut, T>(handler: F) -> (String, T)
where
    F: FnOnce(BufReader<tokio::io::DuplexStream>) -> Fut,
    Fut: std::future::Future<Output = (BufReader<tokio::io::DuplexStream>, T)>,
{
    let (client, server) = tokio::io::duplex(4096);
    let (stream, value) = handler(BufReader::new(server)).await;
    drop(stream);

    let mut buf = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
        .await
        .unwrap();
    (String::from_utf8(buf).unwrap(), value)
}
