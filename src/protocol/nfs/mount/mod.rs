//! MOUNT protocol version 1 as specified in RFC 1094 Appendix A.
//! <https://datatracker.ietf.org/doc/html/rfc1094#appendix-A>
//!
//! The MOUNT protocol hands out the root handle of an export and keeps an
//! informational list of which clients have mounted what. Paths are
//! resolved through the backend, so the handle returned by MNT is the same
//! one LOOKUP would produce.

use std::io::{Read, Write};
use std::sync::{PoisonError, RwLock};

use num_traits::cast::FromPrimitive;
use tracing::{debug, warn};

use crate::protocol::rpc;
use crate::protocol::xdr::rpc::{accept_body, rpc_msg};
use crate::protocol::xdr::{self, deserialize, mount, Serialize};

mod dump;
mod export;
mod mnt;
mod null;
mod umnt;
mod umnt_all;

use dump::mountproc_dump;
use export::mountproc_export;
use mnt::mountproc_mnt;
use null::mountproc_null;
use umnt::mountproc_umnt;
use umnt_all::mountproc_umnt_all;

/// Main handler for MOUNT procedures of version 1 protocol.
///
/// # Arguments
///
/// * `xid` - RPC transaction ID from the client
/// * `call` - The RPC call body containing program, version, and procedure numbers
/// * `input` - Input stream for reading procedure arguments
/// * `output` - Output stream for writing procedure results
/// * `context` - Server context containing exports and VFS information
///
/// # Returns
///
/// * `Result<(), anyhow::Error>` - Ok(()) on success or an error
pub async fn handle_mount(
    xid: u32,
    call: xdr::rpc::call_body,
    input: &mut impl Read,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    if call.vers != mount::VERSION {
        warn!("Invalid Mount Version number {} != {}", call.vers, mount::VERSION);
        rpc_msg::accepted(xid, accept_body::only_version(mount::VERSION)).serialize(output)?;
        return Ok(());
    }

    match mount::MountProgram::from_u32(call.proc) {
        Some(mount::MountProgram::MOUNTPROC_NULL) => mountproc_null(xid, output)?,
        Some(mount::MountProgram::MOUNTPROC_MNT) => {
            mountproc_mnt(xid, input, output, context).await?
        }
        Some(mount::MountProgram::MOUNTPROC_DUMP) => mountproc_dump(xid, output, context)?,
        Some(mount::MountProgram::MOUNTPROC_UMNT) => {
            mountproc_umnt(xid, input, output, context).await?
        }
        Some(mount::MountProgram::MOUNTPROC_UMNTALL) => {
            mountproc_umnt_all(xid, output, context).await?
        }
        Some(mount::MountProgram::MOUNTPROC_EXPORT) => mountproc_export(xid, output, context)?,
        None => {
            warn!("Unknown MOUNT procedure {}", call.proc);
            rpc_msg::accepted(xid, accept_body::PROC_UNAVAIL).serialize(output)?;
        }
    }
    Ok(())
}

/// Decodes the `dirpath` argument of MNT and UMNT, answering `GARBAGE_ARGS`
/// when it cannot be decoded.
fn read_dirpath(
    xid: u32,
    input: &mut impl Read,
    output: &mut impl Write,
) -> Result<Option<mount::dirpath>, anyhow::Error> {
    match deserialize::<mount::dirpath>(input) {
        Ok(path) => Ok(Some(path)),
        Err(e) => {
            warn!("{:?}: undecodable mount path: {}", xid, e);
            rpc_msg::accepted(xid, accept_body::GARBAGE_ARGS).serialize(output)?;
            Ok(None)
        }
    }
}

/// Name under which the calling client is recorded in the mount list
///
/// Prefers the machine name of the AUTH_UNIX credential and falls back to
/// the client's IP address.
fn client_hostname(context: &rpc::Context) -> mount::name {
    let mut hostname = if context.auth.machinename.is_empty() {
        match context.client_addr.rsplit_once(':') {
            Some((ip, _port)) => ip.as_bytes().to_vec(),
            None => context.client_addr.as_bytes().to_vec(),
        }
    } else {
        context.auth.machinename.clone()
    };
    hostname.truncate(mount::MNTNAMLEN);
    mount::name(hostname)
}

/// List of active mounts reported by DUMP
///
/// The list is informational only: nothing in the server depends on a
/// client having mounted before it uses a handle.
#[derive(Debug, Default)]
pub struct MountTable {
    entries: RwLock<Vec<mount::mountbody>>,
}

impl MountTable {
    /// Records that `hostname` mounted `directory`. Repeated mounts are recorded once.
    pub fn add(&self, hostname: mount::name, directory: mount::dirpath) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let body = mount::mountbody { hostname, directory };
        if !entries.contains(&body) {
            entries.push(body);
        }
    }

    /// Removes the entry for `hostname` and `directory`, returning whether one existed
    pub fn remove(&self, hostname: &mount::name, directory: &mount::dirpath) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| !(e.hostname == *hostname && e.directory == *directory));
        before != entries.len()
    }

    /// Removes every entry of `hostname`, returning how many were removed
    pub fn remove_host(&self, hostname: &mount::name) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.hostname != *hostname);
        before - entries.len()
    }

    pub fn list(&self) -> mount::mountlist {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        debug!("mount table holds {} entries", entries.len());
        mount::mountlist(entries.clone())
    }
}
