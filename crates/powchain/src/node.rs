//! The node: a single task that owns the ledger.
//!
//! Callers talk to it through a cloneable [`LedgerHandle`]. Reads and
//! staging are answered right away, even while a block is being mined.
//! Mining and chain replacement are write operations: they queue in arrival
//! order and run one at a time.
//!
//! A mine snapshots the pending queue on the actor, searches for a nonce on
//! the blocking pool, and commits back on the actor. Payloads staged during
//! the search stay pending for the next block.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use powchain_core::{
    mine_cancellable, now_millis, Block, CancelFlag, Candidate, Difficulty, ForkChoice, Ledger,
    Rejection,
};

use crate::error::{NodeError, Result};

/// A point-in-time view of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStatus {
    /// Number of sealed blocks.
    pub length: usize,
    /// Number of staged payloads.
    pub pending: usize,
    /// Difficulty in force.
    pub difficulty: Difficulty,
    /// Whether a nonce search is running.
    pub mining: bool,
    /// Write operations waiting behind the current one.
    pub queued_writes: usize,
}

enum Request {
    Stage {
        payload: Value,
        reply: oneshot::Sender<usize>,
    },
    Mine {
        reply: oneshot::Sender<Result<Option<Block>>>,
    },
    Replace {
        chain: Vec<Block>,
        reply: oneshot::Sender<Result<ForkChoice>>,
    },
    Chain {
        reply: oneshot::Sender<Vec<Block>>,
    },
    Length {
        reply: oneshot::Sender<usize>,
    },
    Validate {
        reply: oneshot::Sender<bool>,
    },
    Status {
        reply: oneshot::Sender<NodeStatus>,
    },
    CancelMining {
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// A queued write operation.
enum WriteOp {
    Mine(oneshot::Sender<Result<Option<Block>>>),
    Replace(Vec<Block>, oneshot::Sender<Result<ForkChoice>>),
}

impl WriteOp {
    fn reject(self, err: impl FnOnce() -> NodeError) {
        match self {
            WriteOp::Mine(reply) => {
                let _ = reply.send(Err(err()));
            }
            WriteOp::Replace(_, reply) => {
                let _ = reply.send(Err(err()));
            }
        }
    }
}

/// The mine currently running on the blocking pool.
struct InFlight {
    candidate: Candidate,
    cancel: CancelFlag,
    task: JoinHandle<Option<Block>>,
    reply: oneshot::Sender<Result<Option<Block>>>,
    started: Instant,
}

enum Event {
    Request(Option<Request>),
    Mined(std::result::Result<Option<Block>, tokio::task::JoinError>),
}

struct LedgerActor {
    ledger: Ledger,
    rx: mpsc::Receiver<Request>,
    queue: VecDeque<WriteOp>,
    in_flight: Option<InFlight>,
}

impl LedgerActor {
    async fn run(mut self) {
        info!(
            difficulty = %self.ledger.difficulty(),
            genesis = %self.ledger.genesis().hash,
            "ledger actor started"
        );

        loop {
            self.start_next_write();

            let event = {
                let rx = &mut self.rx;
                match self.in_flight.as_mut() {
                    Some(job) => tokio::select! {
                        request = rx.recv() => Event::Request(request),
                        joined = &mut job.task => Event::Mined(joined),
                    },
                    None => Event::Request(rx.recv().await),
                }
            };

            match event {
                Event::Request(Some(request)) => {
                    if self.handle(request).is_break() {
                        break;
                    }
                }
                Event::Request(None) => {
                    // Every handle is gone.
                    self.stop();
                    break;
                }
                Event::Mined(joined) => self.finish_mine(joined),
            }
        }

        info!(length = self.ledger.len(), "ledger actor stopped");
    }

    fn handle(&mut self, request: Request) -> ControlFlow<()> {
        match request {
            Request::Stage { payload, reply } => {
                let pending = self.ledger.stage(payload);
                debug!(pending, "payload staged");
                let _ = reply.send(pending);
            }
            Request::Mine { reply } => self.queue.push_back(WriteOp::Mine(reply)),
            Request::Replace { chain, reply } => {
                self.queue.push_back(WriteOp::Replace(chain, reply))
            }
            Request::Chain { reply } => {
                let _ = reply.send(self.ledger.chain().to_vec());
            }
            Request::Length { reply } => {
                let _ = reply.send(self.ledger.len());
            }
            Request::Validate { reply } => {
                let _ = reply.send(self.ledger.validate());
            }
            Request::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Request::CancelMining { reply } => {
                let cancelled = match &self.in_flight {
                    Some(job) => {
                        job.cancel.cancel();
                        true
                    }
                    None => false,
                };
                let _ = reply.send(cancelled);
            }
            Request::Shutdown { reply } => {
                info!("shutdown requested");
                self.stop();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn status(&self) -> NodeStatus {
        NodeStatus {
            length: self.ledger.len(),
            pending: self.ledger.pending().len(),
            difficulty: self.ledger.difficulty(),
            mining: self.in_flight.is_some(),
            queued_writes: self.queue.len(),
        }
    }

    /// Run queued writes until one needs the blocking pool or the queue is empty.
    fn start_next_write(&mut self) {
        while self.in_flight.is_none() {
            let Some(op) = self.queue.pop_front() else {
                return;
            };

            match op {
                WriteOp::Mine(reply) => match self.ledger.prepare_candidate(now_millis()) {
                    None => {
                        debug!("nothing to mine");
                        let _ = reply.send(Ok(None));
                    }
                    Some(candidate) => self.spawn_mine(candidate, reply),
                },
                WriteOp::Replace(chain, reply) => {
                    let choice = self.ledger.replace_chain(chain);
                    match &choice {
                        ForkChoice::Adopt => {
                            info!(length = self.ledger.len(), "adopted longer chain")
                        }
                        ForkChoice::KeepCurrent(Rejection::NotLonger { current, candidate }) => {
                            debug!(current, candidate, "candidate chain not longer")
                        }
                        ForkChoice::KeepCurrent(Rejection::Invalid(e)) => {
                            warn!(error = %e, "candidate chain invalid")
                        }
                    }
                    let _ = reply.send(Ok(choice));
                }
            }
        }
    }

    fn spawn_mine(&mut self, candidate: Candidate, reply: oneshot::Sender<Result<Option<Block>>>) {
        let cancel = CancelFlag::new();
        let difficulty = self.ledger.difficulty();
        let block = candidate.block().clone();
        let flag = cancel.clone();

        debug!(
            index = block.index,
            entries = candidate.taken(),
            %difficulty,
            "mining started"
        );

        let task =
            tokio::task::spawn_blocking(move || mine_cancellable(block, difficulty, &flag));

        self.in_flight = Some(InFlight {
            candidate,
            cancel,
            task,
            reply,
            started: Instant::now(),
        });
    }

    fn finish_mine(&mut self, joined: std::result::Result<Option<Block>, tokio::task::JoinError>) {
        let Some(job) = self.in_flight.take() else {
            return;
        };

        let outcome = match joined {
            Ok(Some(sealed)) => match self.ledger.commit(&job.candidate, sealed) {
                Ok(block) => {
                    info!(
                        index = block.index,
                        hash = %block.hash,
                        nonce = block.nonce,
                        elapsed_ms = job.started.elapsed().as_millis() as u64,
                        "block mined"
                    );
                    Ok(Some(block))
                }
                Err(e) => {
                    warn!(error = %e, "mined block rejected");
                    Err(NodeError::Ledger(e))
                }
            },
            Ok(None) => {
                info!(index = job.candidate.block().index, "mining cancelled");
                Err(NodeError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "mining task failed");
                Err(NodeError::MiningFailed(e.to_string()))
            }
        };

        let _ = job.reply.send(outcome);
    }

    /// Cancel in-flight work and fail everything queued.
    fn stop(&mut self) {
        if let Some(job) = self.in_flight.take() {
            job.cancel.cancel();
            let _ = job.reply.send(Err(NodeError::Cancelled));
        }
        let queued = self.queue.len();
        for op in self.queue.drain(..) {
            op.reject(|| NodeError::ShuttingDown);
        }
        if queued > 0 {
            debug!(queued, "rejected queued writes");
        }
    }
}

/// Cloneable handle to a running ledger actor.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    tx: mpsc::Sender<Request>,
}

impl LedgerHandle {
    /// Move `ledger` into a new actor task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(ledger: Ledger, buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let actor = LedgerActor {
            ledger,
            rx,
            queue: VecDeque::new(),
            in_flight: None,
        };
        tokio::spawn(actor.run());
        Self { tx }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| NodeError::ActorGone)?;
        rx.await.map_err(|_| NodeError::ActorGone)
    }

    /// Stage a payload. Returns the new pending length.
    pub async fn stage(&self, payload: Value) -> Result<usize> {
        self.request(|reply| Request::Stage { payload, reply }).await
    }

    /// Mine all pending payloads into a block.
    ///
    /// Returns `Ok(None)` when nothing is pending. Waits behind earlier
    /// write operations.
    pub async fn mine(&self) -> Result<Option<Block>> {
        self.request(|reply| Request::Mine { reply }).await?
    }

    /// Replace the chain if `chain` is strictly longer and valid.
    pub async fn replace(&self, chain: Vec<Block>) -> Result<bool> {
        Ok(self.replace_chain(chain).await?.is_adopt())
    }

    /// Like [`LedgerHandle::replace`], reporting why a candidate was rejected.
    pub async fn replace_chain(&self, chain: Vec<Block>) -> Result<ForkChoice> {
        self.request(|reply| Request::Replace { chain, reply }).await?
    }

    /// A copy of the sealed chain.
    pub async fn chain(&self) -> Result<Vec<Block>> {
        self.request(|reply| Request::Chain { reply }).await
    }

    /// Number of sealed blocks.
    pub async fn length(&self) -> Result<usize> {
        self.request(|reply| Request::Length { reply }).await
    }

    /// Whether the chain is valid.
    pub async fn validate(&self) -> Result<bool> {
        self.request(|reply| Request::Validate { reply }).await
    }

    /// Current node status.
    pub async fn status(&self) -> Result<NodeStatus> {
        self.request(|reply| Request::Status { reply }).await
    }

    /// Stop the in-flight mine, if any. Its caller gets [`NodeError::Cancelled`].
    ///
    /// Returns whether a mine was running.
    pub async fn cancel_mining(&self) -> Result<bool> {
        self.request(|reply| Request::CancelMining { reply }).await
    }

    /// Stop the actor.
    ///
    /// The in-flight mine is cancelled and queued writes fail with
    /// [`NodeError::ShuttingDown`]. Later calls on any handle fail with
    /// [`NodeError::ActorGone`].
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Request::Shutdown { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    const T0: i64 = 1736870400000;

    fn spawn(zeros: u32) -> LedgerHandle {
        let ledger = Ledger::new_at(Difficulty::new(zeros).unwrap(), T0);
        LedgerHandle::spawn(ledger, 16)
    }

    /// Difficulty 64 never completes, so a mine stays in flight until cancelled.
    async fn wait_until_mining(handle: &LedgerHandle) {
        for _ in 0..400 {
            if handle.status().await.unwrap().mining {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("mine never started");
    }

    #[tokio::test]
    async fn test_stage_and_mine() {
        let handle = spawn(1);
        assert_eq!(handle.stage(json!({"from": "Alice", "to": "Bob", "amount": 50})).await.unwrap(), 1);
        assert_eq!(handle.stage(json!("second")).await.unwrap(), 2);

        let block = handle.mine().await.unwrap().unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(block.payload.as_array().unwrap().len(), 2);
        assert!(block.hash.to_hex().starts_with('0'));

        assert_eq!(handle.length().await.unwrap(), 2);
        assert!(handle.validate().await.unwrap());
        assert_eq!(handle.status().await.unwrap().pending, 0);
    }

    #[tokio::test]
    async fn test_mine_with_nothing_pending() {
        let handle = spawn(1);
        assert!(handle.mine().await.unwrap().is_none());
        assert_eq!(handle.length().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reads_and_stage_during_mine() {
        let handle = spawn(64);
        handle.stage(json!("before")).await.unwrap();

        let miner = handle.clone();
        let mining = tokio::spawn(async move { miner.mine().await });
        wait_until_mining(&handle).await;

        assert_eq!(handle.stage(json!("during")).await.unwrap(), 2);
        assert_eq!(handle.length().await.unwrap(), 1);
        assert_eq!(handle.chain().await.unwrap().len(), 1);
        assert!(handle.validate().await.unwrap());

        assert!(handle.cancel_mining().await.unwrap());
        assert!(matches!(mining.await.unwrap(), Err(NodeError::Cancelled)));

        let status = handle.status().await.unwrap();
        assert!(!status.mining);
        assert_eq!(status.length, 1);
        assert_eq!(status.pending, 2);
    }

    #[tokio::test]
    async fn test_cancel_without_mine() {
        let handle = spawn(1);
        assert!(!handle.cancel_mining().await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_mines_are_serialized() {
        let handle = spawn(1);
        handle.stage(json!("only")).await.unwrap();

        let (first, second) = tokio::join!(handle.mine(), handle.mine());
        let mined: Vec<_> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .flatten()
            .collect();

        assert_eq!(mined.len(), 1);
        assert_eq!(handle.length().await.unwrap(), 2);
        assert!(handle.validate().await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_waits_for_in_flight_mine() {
        let handle = spawn(64);
        handle.stage(json!("x")).await.unwrap();

        let miner = handle.clone();
        let mining = tokio::spawn(async move { miner.mine().await });
        wait_until_mining(&handle).await;

        let replacer = handle.clone();
        let genesis_only = handle.chain().await.unwrap();
        let replacing = tokio::spawn(async move { replacer.replace(genesis_only).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!replacing.is_finished());
        assert_eq!(handle.status().await.unwrap().queued_writes, 1);

        handle.cancel_mining().await.unwrap();
        assert!(matches!(mining.await.unwrap(), Err(NodeError::Cancelled)));
        assert!(!replacing.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_replace_adopts_longer_chain() {
        let handle = spawn(1);

        let mut other = Ledger::new_at(Difficulty::new(1).unwrap(), T0 + 500);
        for i in 0..2 {
            other.stage(json!(i));
            other.mine_pending().unwrap();
        }

        assert!(handle.replace(other.chain().to_vec()).await.unwrap());
        assert_eq!(handle.chain().await.unwrap(), other.chain());

        let shorter = other.chain()[..2].to_vec();
        assert!(matches!(
            handle.replace_chain(shorter).await.unwrap(),
            ForkChoice::KeepCurrent(Rejection::NotLonger { current: 3, candidate: 2 })
        ));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_and_rejects() {
        let handle = spawn(64);
        handle.stage(json!("x")).await.unwrap();

        let miner = handle.clone();
        let mining = tokio::spawn(async move { miner.mine().await });
        wait_until_mining(&handle).await;

        let queued_handle = handle.clone();
        let queued = tokio::spawn(async move { queued_handle.mine().await });
        for _ in 0..400 {
            if handle.status().await.unwrap().queued_writes == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        handle.shutdown().await.unwrap();

        assert!(matches!(mining.await.unwrap(), Err(NodeError::Cancelled)));
        assert!(matches!(queued.await.unwrap(), Err(NodeError::ShuttingDown)));
        assert!(matches!(handle.length().await, Err(NodeError::ActorGone)));
    }
}
