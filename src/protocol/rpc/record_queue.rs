//! Per-connection worker running reassembled RPC records in arrival order.

use std::io::Cursor;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use crate::protocol::rpc::{self, handle_rpc};

/// Initial size of an RPC reply buffer
const REPLY_BUFFER_CAPACITY: usize = 8192;

/// Reply to send on the connection, or the error that ends it
pub type Reply = Result<Vec<u8>, anyhow::Error>;

/// Handle to the worker of one connection.
///
/// Records pushed here run one at a time. Replies leave on the channel given
/// to [`RecordQueue::start`] in the order their records were pushed, and a
/// retransmission of a call that is still running produces no reply at all.
#[derive(Debug, Clone)]
pub struct RecordQueue {
    records: mpsc::UnboundedSender<Vec<u8>>,
}

impl RecordQueue {
    /// Spawns the worker for a connection described by `context`.
    ///
    /// The worker stops once every `RecordQueue` handle is dropped, or once
    /// `replies` is closed.
    pub fn start(context: rpc::Context, replies: mpsc::UnboundedSender<Reply>) -> Self {
        let (records, mut pending) = mpsc::unbounded_channel::<Vec<u8>>();

        tokio::spawn(async move {
            while let Some(record) = pending.recv().await {
                let mut reply = Vec::with_capacity(REPLY_BUFFER_CAPACITY);
                let outcome =
                    match handle_rpc(&mut Cursor::new(record), &mut reply, context.clone()).await {
                        Ok(true) => Ok(reply),
                        Ok(false) => {
                            trace!("No reply for record from {}", context.client_addr);
                            continue;
                        }
                        Err(e) => {
                            error!("RPC error from {}: {:?}", context.client_addr, e);
                            Err(e)
                        }
                    };
                if replies.send(outcome).is_err() {
                    debug!("Reply channel of {} closed", context.client_addr);
                    break;
                }
            }
            debug!("Record worker of {} finished", context.client_addr);
        });

        Self { records }
    }

    /// Queues a complete record. Fails only if the worker has stopped.
    pub fn push(&self, record: Vec<u8>) -> Result<(), anyhow::Error> {
        self.records.send(record).map_err(|_| anyhow!("record worker has stopped"))
    }
}
