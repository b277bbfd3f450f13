//! RPC message framing and dispatch as specified in RFC 5531 (previously RFC 1057 section 10).
//!
//! This module implements the Record Marking Standard for sending RPC messages
//! over TCP connections, and routes each reassembled call to the NFS or MOUNT
//! program. It provides:
//!
//! - Reading fragmentary messages and reassembling them, with a size cap
//! - Writing record-marked fragments with appropriate headers
//! - Replaying cached replies for retransmitted calls
//! - Processing incoming RPC calls in arrival order

use std::io::{Read, Write};

use anyhow::anyhow;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::DuplexStream;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

use crate::protocol::rpc::record_queue::{RecordQueue, Reply};
use crate::protocol::rpc::Transaction;
use crate::protocol::xdr::rpc::{accept_body, rpc_msg};
use crate::protocol::xdr::{self, deserialize, mount, nfs2, Serialize};
use crate::protocol::{nfs, rpc};

/// Initial size of RPC response buffer
const DEFAULT_RESPONSE_BUFFER_CAPACITY: usize = 8192;

/// Processes a single RPC message
///
/// This function forms the core of the RPC message dispatcher. It:
/// 1. Deserializes the incoming RPC message using XDR format
/// 2. Extracts authentication information if provided
/// 3. Validates the RPC version number (must be version 2)
/// 4. Consults the duplicate request cache
/// 5. Routes the call to the appropriate protocol handler (NFS, MOUNT)
/// 6. Records the reply for later retransmissions
///
/// Returns true if a response was written to `output`, false if the call
/// was a duplicate of one that is still being processed.
pub async fn handle_rpc(
    input: &mut impl Read,
    output: &mut impl Write,
    mut context: rpc::Context,
) -> Result<bool, anyhow::Error> {
    let recv = deserialize::<xdr::rpc::rpc_msg>(input)?;
    let xid = recv.xid;
    let xdr::rpc::rpc_body::CALL(call) = recv.body else {
        error!("Unexpectedly received a Reply instead of a Call");
        return Err(anyhow!("Bad RPC Call format"));
    };

    if let Some(cred) = call.unix_credential()? {
        context.auth = cred;
    }
    if call.rpcvers != xdr::rpc::RPC_VERSION {
        warn!("Invalid RPC version {} != {}", call.rpcvers, xdr::rpc::RPC_VERSION);
        rpc_msg::rpc_mismatch(xid).serialize(output)?;
        return Ok(true);
    }

    match context.transaction_tracker.begin(xid, &context.client_addr) {
        Transaction::New => {}
        Transaction::InProgress => {
            debug!(
                "Retransmission of running call, xid: {}, client_addr: {}, call: {:?}",
                xid, context.client_addr, call
            );
            return Ok(false);
        }
        Transaction::Completed(reply) => {
            debug!(
                "Replaying cached reply, xid: {}, client_addr: {}, call: {:?}",
                xid, context.client_addr, call
            );
            output.write_all(&reply)?;
            return Ok(true);
        }
    }

    let mut reply = Vec::with_capacity(DEFAULT_RESPONSE_BUFFER_CAPACITY);
    match dispatch(xid, call, input, &mut reply, &context).await {
        Ok(()) => {
            context.transaction_tracker.complete(xid, &context.client_addr, &reply);
            output.write_all(&reply)?;
            Ok(true)
        }
        Err(e) => {
            context.transaction_tracker.abandon(xid, &context.client_addr);
            Err(e)
        }
    }
}

/// Routes a call to the handler of its program.
async fn dispatch(
    xid: u32,
    call: xdr::rpc::call_body,
    input: &mut impl Read,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    match call.prog {
        nfs2::PROGRAM => nfs::v2::handle_nfs(xid, call, input, output, context).await,
        mount::PROGRAM => nfs::mount::handle_mount(xid, call, input, output, context).await,
        unknown_number => {
            warn!("Unknown RPC Program number {}", unknown_number);
            rpc_msg::accepted(xid, accept_body::PROG_UNAVAIL).serialize(output)?;
            Ok(())
        }
    }
}

/// Reads a single record-marked fragment from a stream
///
/// The fragment header is 4 bytes: the highest bit flags the last fragment
/// of a record and the lower 31 bits give the fragment length. The fragment
/// body is appended to `append_to`. A record growing past
/// [`rpc::MAX_RPC_RECORD_LENGTH`] is rejected before its body is read.
///
/// Returns true if this was the last fragment in the RPC record.
async fn read_fragment(
    socket: &mut DuplexStream,
    append_to: &mut Vec<u8>,
) -> Result<bool, anyhow::Error> {
    let mut header_buf = [0_u8; 4];
    socket.read_exact(&mut header_buf).await?;
    let fragment_header = u32::from_be_bytes(header_buf);
    let is_last = (fragment_header & (1 << 31)) > 0;
    let length = (fragment_header & ((1 << 31) - 1)) as usize;
    trace!("Reading fragment length:{}, last:{}", length, is_last);
    if append_to.len().saturating_add(length) > rpc::MAX_RPC_RECORD_LENGTH {
        return Err(anyhow!(
            "RPC record length {} exceeds max {}",
            append_to.len().saturating_add(length),
            rpc::MAX_RPC_RECORD_LENGTH
        ));
    }
    let start_offset = append_to.len();
    append_to.resize(start_offset + length, 0);
    socket.read_exact(&mut append_to[start_offset..]).await?;
    Ok(is_last)
}

/// Writes data as record-marked fragments to a stream
///
/// Large buffers are split into fragments of at most 2^31 - 1 bytes, each
/// prefixed by a 4-byte header whose highest bit marks the last fragment.
pub async fn write_fragment<S>(socket: &mut S, buf: &[u8]) -> Result<(), anyhow::Error>
where
    S: tokio::io::AsyncWrite + Unpin,
{
    const MAX_FRAGMENT_SIZE: usize = (1 << 31) - 1;

    let mut offset = 0;
    loop {
        let fragment_size = std::cmp::min(buf.len() - offset, MAX_FRAGMENT_SIZE);
        let is_last = offset + fragment_size >= buf.len();
        let fragment_header =
            if is_last { fragment_size as u32 | (1 << 31) } else { fragment_size as u32 };

        socket.write_all(&fragment_header.to_be_bytes()).await?;
        trace!("Writing fragment length:{}, last:{}", fragment_size, is_last);
        socket.write_all(&buf[offset..offset + fragment_size]).await?;

        offset += fragment_size;
        if is_last {
            return Ok(());
        }
    }
}

/// Handles RPC message processing over a TCP connection
///
/// Reassembles record-marked RPC messages from the bytes of a connection and
/// queues each complete record for in-order processing.
#[derive(Debug)]
pub struct SocketMessageHandler {
    /// Record being reassembled
    cur_fragment: Vec<u8>,
    /// Channel for receiving data from socket
    socket_receive_channel: DuplexStream,
    /// Worker running complete records
    records: RecordQueue,
}

impl SocketMessageHandler {
    /// Creates a new `SocketMessageHandler` instance
    ///
    /// Returns the handler itself, a duplex stream the connection writes
    /// received bytes into, and a receiver for the replies to send back.
    pub fn new(context: &rpc::Context) -> (Self, DuplexStream, mpsc::UnboundedReceiver<Reply>) {
        let (socksend, sockrecv) = tokio::io::duplex(256_000);
        let (replies, reply_receiver) = mpsc::unbounded_channel();
        let records = RecordQueue::start(context.clone(), replies);
        (
            Self { cur_fragment: Vec::new(), socket_receive_channel: sockrecv, records },
            socksend,
            reply_receiver,
        )
    }

    /// Reads and processes a fragment from the socket
    ///
    /// Once the last fragment of a record has arrived, the record is queued
    /// for processing. Should be called in a loop.
    pub async fn read(&mut self) -> Result<(), anyhow::Error> {
        let is_last =
            read_fragment(&mut self.socket_receive_channel, &mut self.cur_fragment).await?;
        if is_last {
            self.records.push(std::mem::take(&mut self.cur_fragment))?;
        }
        Ok(())
    }
}
