//! Upstream Connection
//!
//! A TCP connection speaking the subset of RESP needed for `PING` and `GET`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::UpstreamError;
use crate::pool::{HandleFactory, PoolHandle};

/// Largest bulk reply accepted (512 MiB)
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Longest reply header line accepted, CRLF included
const MAX_LINE_LEN: u64 = 64 * 1024;

// == Reply ==
#[derive(Debug, PartialEq)]
enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Option<Vec<u8>>),
}

// == Upstream Connection ==
/// One connection to the upstream store.
///
/// An I/O or protocol failure marks the connection broken; the pool then
/// closes it on release instead of handing it out again.
#[derive(Debug)]
pub struct UpstreamConnection {
    id: u64,
    stream: BufStream<TcpStream>,
    broken: bool,
}

impl UpstreamConnection {
    pub fn new(id: u64, stream: TcpStream) -> Self {
        Self {
            id,
            stream: BufStream::new(stream),
            broken: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    // == Ping ==
    pub async fn ping(&mut self) -> Result<(), UpstreamError> {
        match self.command(&[b"PING".as_slice()]).await? {
            Reply::Simple(pong) if pong == "PONG" => Ok(()),
            Reply::Error(msg) => Err(UpstreamError::Server(msg)),
            other => Err(UpstreamError::Protocol(format!(
                "unexpected PING reply: {:?}",
                other
            ))),
        }
    }

    // == Get ==
    /// Reads `key`, returning `None` when the upstream has no such key.
    pub async fn get(&mut self, key: &str) -> Result<Option<String>, UpstreamError> {
        match self.command(&[b"GET".as_slice(), key.as_bytes()]).await? {
            Reply::Bulk(None) => Ok(None),
            Reply::Bulk(Some(bytes)) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| UpstreamError::Protocol(format!("value is not UTF-8: {}", e))),
            Reply::Error(msg) => Err(UpstreamError::Server(msg)),
            other => Err(UpstreamError::Protocol(format!(
                "unexpected GET reply: {:?}",
                other
            ))),
        }
    }

    async fn command(&mut self, args: &[&[u8]]) -> Result<Reply, UpstreamError> {
        let result = self.round_trip(args).await;
        if matches!(
            result,
            Err(UpstreamError::Io(_)) | Err(UpstreamError::Protocol(_))
        ) {
            self.broken = true;
        }
        result
    }

    async fn round_trip(&mut self, args: &[&[u8]]) -> Result<Reply, UpstreamError> {
        let mut frame = format!("*{}\r\n", args.len()).into_bytes();
        for arg in args {
            frame.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
            frame.extend_from_slice(arg);
            frame.extend_from_slice(b"\r\n");
        }
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply, UpstreamError> {
        let mut line = String::new();
        let read = (&mut self.stream)
            .take(MAX_LINE_LEN)
            .read_line(&mut line)
            .await?;
        if read == 0 {
            return Err(UpstreamError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        if read as u64 >= MAX_LINE_LEN && !line.ends_with("\r\n") {
            return Err(UpstreamError::Protocol(format!(
                "reply line exceeds {} bytes",
                MAX_LINE_LEN
            )));
        }
        let line = line
            .strip_suffix("\r\n")
            .ok_or_else(|| UpstreamError::Protocol("reply line not CRLF terminated".into()))?;

        let mut chars = line.chars();
        let kind = chars.next();
        let body = chars.as_str();
        match kind {
            Some('+') => Ok(Reply::Simple(body.to_string())),
            Some('-') => Ok(Reply::Error(body.to_string())),
            Some(':') => body
                .parse()
                .map(Reply::Integer)
                .map_err(|_| UpstreamError::Protocol(format!("bad integer reply: {}", body))),
            Some('$') => {
                let len: i64 = body
                    .parse()
                    .map_err(|_| UpstreamError::Protocol(format!("bad bulk length: {}", body)))?;
                if len == -1 {
                    return Ok(Reply::Bulk(None));
                }
                let len = usize::try_from(len)
                    .ok()
                    .filter(|len| *len <= MAX_BULK_LEN)
                    .ok_or_else(|| {
                        UpstreamError::Protocol(format!(
                            "bulk length {} outside 0..={}",
                            len, MAX_BULK_LEN
                        ))
                    })?;

                let mut data = vec![0u8; len + 2];
                self.stream.read_exact(&mut data).await?;
                if !data.ends_with(b"\r\n") {
                    return Err(UpstreamError::Protocol("bulk reply not CRLF terminated".into()));
                }
                data.truncate(len);
                Ok(Reply::Bulk(Some(data)))
            }
            _ => Err(UpstreamError::Protocol(format!(
                "unsupported reply type: {:?}",
                line
            ))),
        }
    }
}

impl PoolHandle for UpstreamConnection {
    fn is_usable(&self) -> bool {
        !self.broken
    }

    fn close(self) {
        debug!(id = self.id, "Closing upstream connection");
    }
}

// == TCP Connector ==
/// Opens [`UpstreamConnection`]s to a fixed address.
#[derive(Debug)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: Duration,
    next_id: AtomicU64,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl HandleFactory for TcpConnector {
    type Handle = UpstreamConnection;

    async fn create(&self) -> anyhow::Result<UpstreamConnection> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "connect to {} timed out after {:?}",
                    self.addr,
                    self.connect_timeout
                )
            })?
            .with_context(|| format!("connect to {}", self.addr))?;
        stream.set_nodelay(true)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, addr = %self.addr, "Opened upstream connection");
        Ok(UpstreamConnection::new(id, stream))
    }

    async fn is_alive(&self, handle: &mut UpstreamConnection) -> bool {
        match handle.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!(id = handle.id, error = %e, "Upstream liveness check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::BufReader;
    use tokio::net::TcpListener;

    /// Accepts one connection and answers every command with `reply`.
    async fn scripted_upstream(reply: &'static [u8]) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            while read_command(&mut reader).await.is_some() {
                if reader.get_mut().write_all(reply).await.is_err() {
                    return;
                }
            }
        });
        addr
    }

    async fn read_command(reader: &mut BufReader<TcpStream>) -> Option<Vec<String>> {
        let mut line = String::new();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            reader.read_line(&mut line).await.ok()?;
            let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
            let mut data = vec![0u8; len + 2];
            reader.read_exact(&mut data).await.ok()?;
            data.truncate(len);
            args.push(String::from_utf8(data).ok()?);
        }
        Some(args)
    }

    async fn connect(addr: SocketAddr) -> UpstreamConnection {
        TcpConnector::new(addr.to_string(), Duration::from_secs(1))
            .create()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let addr = scripted_upstream(b"+PONG\r\n").await;
        let mut conn = connect(addr).await;

        conn.ping().await.unwrap();
        assert!(conn.is_usable());
    }

    #[tokio::test]
    async fn test_get_bulk_value() {
        let addr = scripted_upstream(b"$5\r\nhello\r\n").await;
        let mut conn = connect(addr).await;

        assert_eq!(conn.get("greeting").await.unwrap(), Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let addr = scripted_upstream(b"$-1\r\n").await;
        let mut conn = connect(addr).await;

        assert_eq!(conn.get("missing").await.unwrap(), None);
        assert!(conn.is_usable());
    }

    #[tokio::test]
    async fn test_error_reply_keeps_connection_usable() {
        let addr = scripted_upstream(b"-ERR wrong kind of value\r\n").await;
        let mut conn = connect(addr).await;

        let err = conn.get("list").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Server(msg) if msg.contains("wrong kind")));
        assert!(conn.is_usable());
    }

    #[tokio::test]
    async fn test_garbage_reply_breaks_connection() {
        let addr = scripted_upstream(b"?what\r\n").await;
        let mut conn = connect(addr).await;

        assert!(matches!(conn.ping().await, Err(UpstreamError::Protocol(_))));
        assert!(!conn.is_usable());
    }

    #[tokio::test]
    async fn test_oversized_bulk_length_breaks_connection() {
        let addr = scripted_upstream(b"$9223372036854775807\r\n").await;
        let mut conn = connect(addr).await;

        let err = conn.get("k").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(msg) if msg.contains("bulk length")));
        assert!(!conn.is_usable());
    }

    #[tokio::test]
    async fn test_negative_bulk_length_is_rejected() {
        let addr = scripted_upstream(b"$-7\r\n").await;
        let mut conn = connect(addr).await;

        assert!(matches!(conn.get("k").await, Err(UpstreamError::Protocol(_))));
        assert!(!conn.is_usable());
    }

    #[tokio::test]
    async fn test_unterminated_reply_line_is_bounded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            if read_command(&mut reader).await.is_some() {
                let junk = vec![b'+'; MAX_LINE_LEN as usize * 2];
                let _ = reader.get_mut().write_all(&junk).await;
            }
            // Hold the socket open so only the length cap can end the read
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        let mut conn = connect(addr).await;

        let err = conn.ping().await.unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(msg) if msg.contains("exceeds")));
        assert!(!conn.is_usable());
    }

    #[tokio::test]
    async fn test_connector_reports_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = TcpConnector::new(addr.to_string(), Duration::from_secs(1));
        let err = connector.create().await.unwrap_err();
        assert!(err.to_string().contains(&addr.to_string()));
    }

    #[tokio::test]
    async fn test_liveness_check() {
        let addr = scripted_upstream(b"+PONG\r\n").await;
        let connector = TcpConnector::new(addr.to_string(), Duration::from_secs(1));
        let mut conn = connector.create().await.unwrap();

        assert!(connector.is_alive(&mut conn).await);
        assert_eq!(conn.id(), 1);
    }
}
