//! One-shot client: send a request line, read the reply line.

use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use powchain_protocol::LineReader;

use crate::error::{NodeError, Result};

/// Send one command line to the node at `addr` and return its raw reply.
///
/// Replies are read without a length limit; a `CHAIN` reply is as large as
/// the chain.
pub async fn request(addr: SocketAddr, line: &str) -> Result<String> {
    let stream = TcpStream::connect(addr).await?;
    let (read, mut write) = stream.into_split();

    write.write_all(line.trim_end().as_bytes()).await?;
    write.write_all(b"\n").await?;
    write.flush().await?;
    debug!(%addr, "request sent");

    let mut reader = LineReader::unbounded(BufReader::new(read));
    reader.next_line().await?.ok_or(NodeError::NoReply)
}
