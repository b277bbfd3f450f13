//! Implementation of the UMNT procedure (procedure 3) for MOUNT version 1 protocol
//! as defined in RFC 1094 Appendix A section A.5.4.

use std::io::{Read, Write};

use tracing::debug;

use super::{client_hostname, read_dirpath};
use crate::protocol::rpc;
use crate::protocol::xdr::{rpc::rpc_msg, Serialize};

/// Handles MOUNTPROC_UMNT procedure.
///
/// Removes the caller's entry for the given directory from the mount list.
/// The reply is void whether or not an entry existed.
///
/// # Arguments
///
/// * `xid` - RPC transaction ID
/// * `input` - Input stream containing the directory path to unmount
/// * `output` - Output stream for writing the response
/// * `context` - Server context containing mount signal information
///
/// # Returns
///
/// * `Result<(), anyhow::Error>` - Ok(()) on success or an error
pub async fn mountproc_umnt(
    xid: u32,
    input: &mut impl Read,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    let Some(path) = read_dirpath(xid, input, output)? else {
        return Ok(());
    };
    debug!("mountproc_umnt({:?},{:?}) ", xid, path);
    if context.mount_table.remove(&client_hostname(context), &path) {
        if let Some(ref chan) = context.mount_signal {
            let _ = chan.send(false).await;
        }
    }
    rpc_msg::success(xid).serialize(output)?;
    Ok(())
}
