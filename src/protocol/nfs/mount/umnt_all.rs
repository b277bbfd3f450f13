//! Implementation of the UMNTALL procedure (procedure 4) for MOUNT version 1 protocol
//! as defined in RFC 1094 Appendix A section A.5.5.

use std::io::Write;

use tracing::debug;

use super::client_hostname;
use crate::protocol::rpc;
use crate::protocol::xdr::{rpc::rpc_msg, Serialize};

/// Handles MOUNTPROC_UMNTALL procedure.
///
/// Removes every mount list entry of the calling client and answers void.
pub async fn mountproc_umnt_all(
    xid: u32,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    let removed = context.mount_table.remove_host(&client_hostname(context));
    debug!("mountproc_umnt_all({:?}) removed {} entries", xid, removed);
    if removed > 0 {
        if let Some(ref chan) = context.mount_signal {
            let _ = chan.send(false).await;
        }
    }
    rpc_msg::success(xid).serialize(output)?;
    Ok(())
}
