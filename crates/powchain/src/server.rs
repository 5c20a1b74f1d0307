//! TCP front end speaking the line protocol.
//!
//! Each connection carries any number of request/response exchanges. A
//! connection only ends when the peer closes it, when a line breaks framing,
//! or when the server shuts down.

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use powchain_core::Ledger;
use powchain_protocol::{write_response, Command, LineReader, PayloadPolicy, Response};

use crate::config::NodeConfig;
use crate::error::{NodeError, Result};
use crate::node::LedgerHandle;

/// Run one command against the ledger and build its reply.
///
/// Never fails: every error becomes an error response.
pub async fn execute(handle: &LedgerHandle, command: Command) -> Response {
    let result = match command {
        Command::Add(payload) => handle.stage(payload).await.map(|_| Response::Staged),
        Command::Mine => handle.mine().await.map(|mined| match mined {
            Some(block) => Response::Mined {
                index: block.index,
                hash: block.hash,
            },
            None => Response::NothingToMine,
        }),
        Command::Chain => handle.chain().await.map(Response::Chain),
        Command::Validate => handle.validate().await.map(Response::Valid),
        Command::Length => handle.length().await.map(Response::Length),
    };

    result.unwrap_or_else(Response::error)
}

/// A bound listener plus the ledger it serves.
pub struct Server {
    listener: TcpListener,
    handle: LedgerHandle,
    config: NodeConfig,
}

impl Server {
    /// Start a fresh ledger and bind the configured address.
    pub async fn start(config: NodeConfig) -> Result<Self> {
        let ledger = Ledger::new(config.difficulty);
        let handle = LedgerHandle::spawn(ledger, config.request_buffer);
        Self::bind(config, handle).await
    }

    /// Bind the configured address in front of an existing ledger.
    pub async fn bind(config: NodeConfig, handle: LedgerHandle) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        Ok(Self {
            listener,
            handle,
            config,
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// A handle to the served ledger.
    pub fn handle(&self) -> &LedgerHandle {
        &self.handle
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// On shutdown, open connections are told to stop, the ledger actor is
    /// stopped (cancelling any in-flight mine), and all connection tasks are
    /// awaited.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(%addr, difficulty = %self.config.difficulty, "listening");

        let (stop_tx, stop_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "connection opened");
                        let connection = Connection {
                            handle: self.handle.clone(),
                            policy: self.config.payload_policy,
                            max_line_bytes: self.config.max_line_bytes,
                            stop: stop_rx.clone(),
                        };
                        connections.spawn(async move {
                            if let Err(e) = connection.serve(stream).await {
                                warn!(%peer, error = %e, "connection closed with error");
                            } else {
                                debug!(%peer, "connection closed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        info!("shutting down");
        let _ = stop_tx.send(true);
        match self.handle.shutdown().await {
            Ok(()) | Err(NodeError::ActorGone) => {}
            Err(e) => return Err(e),
        }
        while connections.join_next().await.is_some() {}
        Ok(())
    }
}

struct Connection {
    handle: LedgerHandle,
    policy: PayloadPolicy,
    max_line_bytes: usize,
    stop: watch::Receiver<bool>,
}

impl Connection {
    async fn serve(mut self, stream: TcpStream) -> Result<()> {
        let (read, mut write) = stream.into_split();
        let mut reader = LineReader::new(BufReader::new(read), self.max_line_bytes);

        loop {
            let next = tokio::select! {
                next = reader.next_line() => next,
                _ = self.stop.changed() => return Ok(()),
            };

            let response = match next {
                Ok(None) => return Ok(()),
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match Command::parse(&line, self.policy) {
                    Ok(command) => execute(&self.handle, command).await,
                    Err(e) => {
                        debug!(error = %e, "rejected command");
                        Response::from(e)
                    }
                },
                Err(e) if e.is_recoverable() => Response::from(e),
                Err(e) => {
                    // Best effort: the peer may already be gone.
                    let _ = write_response(&mut write, &Response::error(&e)).await;
                    let _ = write.shutdown().await;
                    return Err(e.into());
                }
            };

            write_response(&mut write, &response).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use powchain_core::Difficulty;
    use serde_json::json;

    fn handle(zeros: u32) -> LedgerHandle {
        LedgerHandle::spawn(Ledger::new_at(Difficulty::new(zeros).unwrap(), 0), 8)
    }

    #[tokio::test]
    async fn test_execute_add_and_mine() {
        let handle = handle(1);

        let staged = execute(&handle, Command::Add(json!({"amount": 50}))).await;
        assert_eq!(staged, Response::Staged);

        match execute(&handle, Command::Mine).await {
            Response::Mined { index, hash } => {
                assert_eq!(index, 1);
                assert!(hash.to_hex().starts_with('0'));
            }
            other => panic!("unexpected response: {other:?}"),
        }

        assert_eq!(execute(&handle, Command::Length).await, Response::Length(2));
        assert_eq!(execute(&handle, Command::Validate).await, Response::Valid(true));
    }

    #[tokio::test]
    async fn test_execute_mine_nothing() {
        let handle = handle(1);
        assert_eq!(execute(&handle, Command::Mine).await, Response::NothingToMine);
    }

    #[tokio::test]
    async fn test_execute_after_shutdown_reports_error() {
        let handle = handle(1);
        handle.shutdown().await.unwrap();
        assert!(execute(&handle, Command::Length).await.is_error());
    }
}
