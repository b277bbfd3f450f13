//! ONC RPC version 2 message shapes (RFC 5531) used by the NFS and MOUNT
//! programs of this server.
//!
//! Only what the server reads or writes is modelled: call headers with their
//! credentials, and the accepted/denied reply headers. Credentials and
//! verifiers stay opaque except for AUTH_UNIX, which is decoded on request.
//! Unknown authentication flavors are carried through untouched so that a
//! client sending, say, RPCSEC_GSS still gets a well-formed reply.

#![allow(non_camel_case_types)]
#![allow(clippy::upper_case_acronyms)]

use std::io::{Cursor, Read, Write};

use num_derive::{FromPrimitive, ToPrimitive};

use super::{
    deserialize, deserialize_bounded, serialize_bounded, Deserialize, DeserializeEnum, Error,
    Result, Serialize, SerializeEnum,
};
use crate::{DeserializeStruct, SerializeStruct};

/// The only RPC protocol version this server speaks
pub const RPC_VERSION: u32 = 2;

/// Largest credential or verifier body, in bytes
pub const MAX_AUTH_BYTES: usize = 400;

/// Longest AUTH_UNIX machine name
pub const MAX_MACHINE_NAME: usize = 255;

/// Most supplementary groups an AUTH_UNIX credential may list
pub const MAX_GIDS: usize = 16;

/// Authentication flavor numbers the server recognizes
pub mod auth_flavor {
    pub const AUTH_NULL: u32 = 0;
    pub const AUTH_UNIX: u32 = 1;
}

/// Credential or verifier: a flavor number and its opaque body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct opaque_auth {
    pub flavor: u32,
    pub body: Vec<u8>,
}

impl Serialize for opaque_auth {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        self.flavor.serialize(dest)?;
        serialize_bounded(&self.body, MAX_AUTH_BYTES, too_large, dest)
    }
}

impl Deserialize for opaque_auth {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.flavor = deserialize(src)?;
        self.body = deserialize_bounded(src, MAX_AUTH_BYTES, too_large)?;
        Ok(())
    }
}

fn too_large(len: usize, max: usize) -> Error {
    Error::ArgumentTooLarge { len, max }
}

/// AUTH_UNIX credential body.
///
/// The machine name is recorded in the MOUNT list; the ids are made available
/// to handlers through the call context.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct auth_unix {
    pub stamp: u32,
    pub machinename: Vec<u8>,
    pub uid: u32,
    pub gid: u32,
    pub gids: Vec<u32>,
}
DeserializeStruct!(auth_unix, stamp, machinename, uid, gid, gids);
SerializeStruct!(auth_unix, stamp, machinename, uid, gid, gids);

/// Discriminant of [`rpc_body`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum msg_type {
    #[default]
    CALL = 0,
    REPLY = 1,
}
impl SerializeEnum for msg_type {}
impl DeserializeEnum for msg_type {}

/// Discriminant of [`reply_body`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum reply_stat {
    #[default]
    MSG_ACCEPTED = 0,
    MSG_DENIED = 1,
}
impl SerializeEnum for reply_stat {}
impl DeserializeEnum for reply_stat {}

/// Discriminant of [`accept_body`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum accept_stat {
    #[default]
    SUCCESS = 0,
    PROG_UNAVAIL = 1,
    PROG_MISMATCH = 2,
    PROC_UNAVAIL = 3,
    GARBAGE_ARGS = 4,
    SYSTEM_ERR = 5,
}
impl SerializeEnum for accept_stat {}
impl DeserializeEnum for accept_stat {}

/// Discriminant of [`rejected_reply`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum reject_stat {
    #[default]
    RPC_MISMATCH = 0,
    AUTH_ERROR = 1,
}
impl SerializeEnum for reject_stat {}
impl DeserializeEnum for reject_stat {}

/// A complete RPC message header. For a call the procedure arguments follow
/// it on the wire, for a successful reply the procedure result does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct rpc_msg {
    pub xid: u32,
    pub body: rpc_body,
}
DeserializeStruct!(rpc_msg, xid, body);
SerializeStruct!(rpc_msg, xid, body);

impl rpc_msg {
    /// Reply header accepting call `xid` with the given outcome
    pub fn accepted(xid: u32, reply_data: accept_body) -> rpc_msg {
        let reply = accepted_reply { verf: opaque_auth::default(), reply_data };
        rpc_msg { xid, body: rpc_body::REPLY(reply_body::MSG_ACCEPTED(reply)) }
    }

    /// Reply header for a call that ran; the procedure result follows it
    pub fn success(xid: u32) -> rpc_msg {
        rpc_msg::accepted(xid, accept_body::SUCCESS)
    }

    /// Reply refusing a call made with an RPC version other than [`RPC_VERSION`]
    pub fn rpc_mismatch(xid: u32) -> rpc_msg {
        let info = mismatch_info { low: RPC_VERSION, high: RPC_VERSION };
        let reply = reply_body::MSG_DENIED(rejected_reply::RPC_MISMATCH(info));
        rpc_msg { xid, body: rpc_body::REPLY(reply) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum rpc_body {
    CALL(call_body),
    REPLY(reply_body),
}

impl Default for rpc_body {
    fn default() -> rpc_body {
        rpc_body::CALL(call_body::default())
    }
}

impl Serialize for rpc_body {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        match self {
            rpc_body::CALL(call) => {
                msg_type::CALL.serialize(dest)?;
                call.serialize(dest)
            }
            rpc_body::REPLY(reply) => {
                msg_type::REPLY.serialize(dest)?;
                reply.serialize(dest)
            }
        }
    }
}

impl Deserialize for rpc_body {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        *self = match deserialize::<msg_type>(src)? {
            msg_type::CALL => rpc_body::CALL(deserialize(src)?),
            msg_type::REPLY => rpc_body::REPLY(deserialize(src)?),
        };
        Ok(())
    }
}

/// Header of a call: which procedure of which program, and who is asking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct call_body {
    pub rpcvers: u32,
    pub prog: u32,
    pub vers: u32,
    pub proc: u32,
    pub cred: opaque_auth,
    pub verf: opaque_auth,
}
DeserializeStruct!(call_body, rpcvers, prog, vers, proc, cred, verf);
SerializeStruct!(call_body, rpcvers, prog, vers, proc, cred, verf);

impl call_body {
    /// Decodes the caller's AUTH_UNIX credential.
    ///
    /// Returns `None` for any other flavor. A machine name or group list over
    /// its protocol limit is an error.
    pub fn unix_credential(&self) -> Result<Option<auth_unix>> {
        if self.cred.flavor != auth_flavor::AUTH_UNIX {
            return Ok(None);
        }
        let cred = deserialize::<auth_unix>(&mut Cursor::new(&self.cred.body))?;
        if cred.machinename.len() > MAX_MACHINE_NAME {
            return Err(too_large(cred.machinename.len(), MAX_MACHINE_NAME));
        }
        if cred.gids.len() > MAX_GIDS {
            return Err(Error::invalid_data(format!(
                "AUTH_UNIX credential lists {} groups, limit is {}",
                cred.gids.len(),
                MAX_GIDS
            )));
        }
        Ok(Some(cred))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum reply_body {
    MSG_ACCEPTED(accepted_reply),
    MSG_DENIED(rejected_reply),
}

impl Default for reply_body {
    fn default() -> reply_body {
        reply_body::MSG_ACCEPTED(accepted_reply::default())
    }
}

impl Serialize for reply_body {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        match self {
            reply_body::MSG_ACCEPTED(reply) => {
                reply_stat::MSG_ACCEPTED.serialize(dest)?;
                reply.serialize(dest)
            }
            reply_body::MSG_DENIED(reply) => {
                reply_stat::MSG_DENIED.serialize(dest)?;
                reply.serialize(dest)
            }
        }
    }
}

impl Deserialize for reply_body {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        *self = match deserialize::<reply_stat>(src)? {
            reply_stat::MSG_ACCEPTED => reply_body::MSG_ACCEPTED(deserialize(src)?),
            reply_stat::MSG_DENIED => reply_body::MSG_DENIED(deserialize(src)?),
        };
        Ok(())
    }
}

/// Lowest and highest version a program or the RPC layer supports
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct mismatch_info {
    pub low: u32,
    pub high: u32,
}
DeserializeStruct!(mismatch_info, low, high);
SerializeStruct!(mismatch_info, low, high);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct accepted_reply {
    pub verf: opaque_auth,
    pub reply_data: accept_body,
}
DeserializeStruct!(accepted_reply, verf, reply_data);
SerializeStruct!(accepted_reply, verf, reply_data);

/// Outcome of a call the server accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum accept_body {
    #[default]
    SUCCESS,
    PROG_UNAVAIL,
    PROG_MISMATCH(mismatch_info),
    PROC_UNAVAIL,
    /// Arguments could not be decoded
    GARBAGE_ARGS,
    /// The server failed while producing the result
    SYSTEM_ERR,
}

impl accept_body {
    /// Version mismatch for a program that serves exactly one `version`
    pub fn only_version(version: u32) -> accept_body {
        accept_body::PROG_MISMATCH(mismatch_info { low: version, high: version })
    }

    fn stat(&self) -> accept_stat {
        match self {
            accept_body::SUCCESS => accept_stat::SUCCESS,
            accept_body::PROG_UNAVAIL => accept_stat::PROG_UNAVAIL,
            accept_body::PROG_MISMATCH(_) => accept_stat::PROG_MISMATCH,
            accept_body::PROC_UNAVAIL => accept_stat::PROC_UNAVAIL,
            accept_body::GARBAGE_ARGS => accept_stat::GARBAGE_ARGS,
            accept_body::SYSTEM_ERR => accept_stat::SYSTEM_ERR,
        }
    }
}

impl Serialize for accept_body {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        self.stat().serialize(dest)?;
        if let accept_body::PROG_MISMATCH(info) = self {
            info.serialize(dest)?;
        }
        Ok(())
    }
}

impl Deserialize for accept_body {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        *self = match deserialize::<accept_stat>(src)? {
            accept_stat::SUCCESS => accept_body::SUCCESS,
            accept_stat::PROG_UNAVAIL => accept_body::PROG_UNAVAIL,
            accept_stat::PROG_MISMATCH => accept_body::PROG_MISMATCH(deserialize(src)?),
            accept_stat::PROC_UNAVAIL => accept_body::PROC_UNAVAIL,
            accept_stat::GARBAGE_ARGS => accept_body::GARBAGE_ARGS,
            accept_stat::SYSTEM_ERR => accept_body::SYSTEM_ERR,
        };
        Ok(())
    }
}

/// Reason a call was refused before reaching any program.
///
/// The server only ever sends `RPC_MISMATCH`; `AUTH_ERROR` keeps its raw
/// `auth_stat` number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum rejected_reply {
    RPC_MISMATCH(mismatch_info),
    AUTH_ERROR(u32),
}

impl Default for rejected_reply {
    fn default() -> rejected_reply {
        rejected_reply::RPC_MISMATCH(mismatch_info::default())
    }
}

impl Serialize for rejected_reply {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        match self {
            rejected_reply::RPC_MISMATCH(info) => {
                reject_stat::RPC_MISMATCH.serialize(dest)?;
                info.serialize(dest)
            }
            rejected_reply::AUTH_ERROR(stat) => {
                reject_stat::AUTH_ERROR.serialize(dest)?;
                stat.serialize(dest)
            }
        }
    }
}

impl Deserialize for rejected_reply {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        *self = match deserialize::<reject_stat>(src)? {
            reject_stat::RPC_MISMATCH => rejected_reply::RPC_MISMATCH(deserialize(src)?),
            reject_stat::AUTH_ERROR => rejected_reply::AUTH_ERROR(deserialize(src)?),
        };
        Ok(())
    }
}
