//! Implementation of the EXPORT procedure (procedure 5) for MOUNT version 1 protocol
//! as defined in RFC 1094 Appendix A section A.5.6.

use std::io::Write;

use tracing::debug;

use crate::protocol::rpc;
use crate::protocol::xdr::{mount, rpc::rpc_msg, Serialize};

/// Handles MOUNTPROC_EXPORT procedure.
///
/// The server has a single export which every client may mount, so the
/// list holds one entry with no groups.
pub fn mountproc_export(
    xid: u32,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    let exports = mount::exportlist(vec![mount::exportbody {
        filesys: mount::dirpath(context.export_name.as_bytes().to_vec()),
        groups: Vec::new(),
    }]);
    debug!("mountproc_export({:?}) --> {:?}", xid, exports);
    rpc_msg::success(xid).serialize(output)?;
    exports.serialize(output)?;
    Ok(())
}
