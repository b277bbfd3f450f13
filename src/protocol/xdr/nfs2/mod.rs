//! The module defines XDR data types and constants for Network File System (NFS)
//! version 2, as defined in RFC 1094.
//!
//! NFS version 2 is a stateless distributed file system protocol
//! that provides transparent remote access to shared file systems over a network.
//! Every object is named by a fixed 32-byte opaque handle, every size and
//! offset is a 32-bit quantity, and every procedure result is a union
//! discriminated by [`nfsstat`]: the payload is present only on `NFS_OK`.
//!
//! This module defines the constants, basic data types, and the structures
//! shared by several procedures. Procedure specific arguments and results
//! live in [`file`], [`dir`] and [`fs`].

// Allow unused code since we're implementing the full NFS2 protocol specification
#![allow(dead_code)]
// Preserve original RFC naming conventions for consistency with the specification
#![allow(non_camel_case_types)]

use std::fmt;
use std::io::{Read, Write};

use num_derive::{FromPrimitive, ToPrimitive};

use super::{
    deserialize, deserialize_bounded, serialize_bounded, Deserialize, DeserializeEnum, Error,
    Result, Serialize, SerializeEnum,
};
use crate::{DeserializeStruct, SerializeStruct};

pub mod dir;
pub mod file;
pub mod fs;

// Section 2.3 Constants
/// The RPC program number for NFS version 2 service.
pub const PROGRAM: u32 = 100003;
/// The version number for NFS version 2 protocol.
pub const VERSION: u32 = 2;

/// The maximum number of bytes of data in a READ or WRITE request.
pub const MAXDATA: usize = 8192;
/// The maximum number of bytes in a pathname argument.
pub const MAXPATHLEN: usize = 1024;
/// The maximum number of bytes in a file name argument.
pub const MAXNAMLEN: usize = 255;
/// The size in bytes of the opaque "cookie" passed by READDIR.
pub const COOKIESIZE: usize = 4;
/// The size in bytes of the opaque file handle.
pub const FHSIZE: usize = 32;

/// Value of a settable attribute word that tells the server to leave the
/// corresponding attribute untouched.
pub const SATTR_IGNORE: u32 = u32::MAX;

/// Procedure numbers for NFS version 2 protocol.
#[allow(non_camel_case_types)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum NFSProgram {
    /// Do nothing - used primarily for server response testing and timing
    NFSPROC_NULL = 0,
    /// Get file attributes
    NFSPROC_GETATTR = 1,
    /// Set file attributes
    NFSPROC_SETATTR = 2,
    /// Get filesystem root (obsolete)
    NFSPROC_ROOT = 3,
    /// Look up file name
    NFSPROC_LOOKUP = 4,
    /// Read from symbolic link
    NFSPROC_READLINK = 5,
    /// Read from file
    NFSPROC_READ = 6,
    /// Write to cache (reserved for a future protocol revision)
    NFSPROC_WRITECACHE = 7,
    /// Write to file
    NFSPROC_WRITE = 8,
    /// Create file
    NFSPROC_CREATE = 9,
    /// Remove file
    NFSPROC_REMOVE = 10,
    /// Rename file
    NFSPROC_RENAME = 11,
    /// Create link to file
    NFSPROC_LINK = 12,
    /// Create symbolic link
    NFSPROC_SYMLINK = 13,
    /// Create directory
    NFSPROC_MKDIR = 14,
    /// Remove directory
    NFSPROC_RMDIR = 15,
    /// Read from directory
    NFSPROC_READDIR = 16,
    /// Get filesystem attributes
    NFSPROC_STATFS = 17,
}

/// Status codes returned by NFS version 2 operations.
///
/// The numeric values are taken from UNIX errno. Every code carries a fixed
/// symbolic name and message, available through [`nfsstat::name`] and
/// [`nfsstat::message`] and combined by its `Display` implementation.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum nfsstat {
    /// The call completed successfully.
    NFS_OK = 0,
    /// Not owner. The caller does not have correct ownership
    /// to perform the requested operation.
    NFSERR_PERM = 1,
    /// No such file or directory.
    NFSERR_NOENT = 2,
    /// Some sort of hard error occurred while processing the operation.
    NFSERR_IO = 5,
    /// No such device or address.
    NFSERR_NXIO = 6,
    /// Permission denied.
    NFSERR_ACCES = 13,
    /// The file specified already exists.
    NFSERR_EXIST = 17,
    /// No such device.
    NFSERR_NODEV = 19,
    /// Not a directory.
    NFSERR_NOTDIR = 20,
    /// Is a directory.
    NFSERR_ISDIR = 21,
    /// File too large.
    NFSERR_FBIG = 27,
    /// No space left on device.
    NFSERR_NOSPC = 28,
    /// Read-only filesystem.
    NFSERR_ROFS = 30,
    /// File name too long.
    NFSERR_NAMETOOLONG = 63,
    /// Directory not empty.
    NFSERR_NOTEMPTY = 66,
    /// Disk quota exceeded.
    NFSERR_DQUOT = 69,
    /// The file handle given in the arguments was invalid.
    NFSERR_STALE = 70,
    /// The server's write cache used in the WRITECACHE call got flushed to disk.
    NFSERR_WFLUSH = 99,
}
impl SerializeEnum for nfsstat {}
impl DeserializeEnum for nfsstat {}

impl nfsstat {
    /// Numeric protocol code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Symbolic name of the status, e.g. `ERR_NOENT`.
    pub fn name(self) -> &'static str {
        match self {
            nfsstat::NFS_OK => "OK",
            nfsstat::NFSERR_PERM => "ERR_PERM",
            nfsstat::NFSERR_NOENT => "ERR_NOENT",
            nfsstat::NFSERR_IO => "ERR_IO",
            nfsstat::NFSERR_NXIO => "ERR_NXIO",
            nfsstat::NFSERR_ACCES => "ERR_ACCES",
            nfsstat::NFSERR_EXIST => "ERR_EXIST",
            nfsstat::NFSERR_NODEV => "ERR_NODEV",
            nfsstat::NFSERR_NOTDIR => "ERR_NOTDIR",
            nfsstat::NFSERR_ISDIR => "ERR_ISDIR",
            nfsstat::NFSERR_FBIG => "ERR_FBIG",
            nfsstat::NFSERR_NOSPC => "ERR_NOSPC",
            nfsstat::NFSERR_ROFS => "ERR_ROFS",
            nfsstat::NFSERR_NAMETOOLONG => "ERR_NAMETOOLONG",
            nfsstat::NFSERR_NOTEMPTY => "ERR_NOTEMPTY",
            nfsstat::NFSERR_DQUOT => "ERR_DQUOT",
            nfsstat::NFSERR_STALE => "ERR_STALE",
            nfsstat::NFSERR_WFLUSH => "ERR_WFLUSH",
        }
    }

    /// Human readable description of the status.
    pub fn message(self) -> &'static str {
        match self {
            nfsstat::NFS_OK => "OK",
            nfsstat::NFSERR_PERM => "Not owner",
            nfsstat::NFSERR_NOENT => "No such file or directory",
            nfsstat::NFSERR_IO => "IO Error",
            nfsstat::NFSERR_NXIO => "No such device or address",
            nfsstat::NFSERR_ACCES => "Permission denied",
            nfsstat::NFSERR_EXIST => "File exists",
            nfsstat::NFSERR_NODEV => "No such device",
            nfsstat::NFSERR_NOTDIR => "Not a directory",
            nfsstat::NFSERR_ISDIR => "Is a directory",
            nfsstat::NFSERR_FBIG => "File too large",
            nfsstat::NFSERR_NOSPC => "No space left on device",
            nfsstat::NFSERR_ROFS => "Read-only filesystem",
            nfsstat::NFSERR_NAMETOOLONG => "File name too long",
            nfsstat::NFSERR_NOTEMPTY => "Directory not empty",
            nfsstat::NFSERR_DQUOT => "Disk quota exceeded",
            nfsstat::NFSERR_STALE => "Invalid file handle",
            nfsstat::NFSERR_WFLUSH => "Cache flushed",
        }
    }
}

impl fmt::Display for nfsstat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.name(), self.code(), self.message())
    }
}

/// File type enumeration as defined in RFC 1094 section 2.3.2.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ftype {
    /// Non-file
    #[default]
    NFNON = 0,
    /// Regular file
    NFREG = 1,
    /// Directory
    NFDIR = 2,
    /// Block-special device
    NFBLK = 3,
    /// Character-special device
    NFCHR = 4,
    /// Symbolic link
    NFLNK = 5,
}
impl SerializeEnum for ftype {}
impl DeserializeEnum for ftype {}

/// The NFS version 2 file handle.
///
/// A handle is exactly [`FHSIZE`] opaque bytes chosen by the server. Two
/// handles denote the same object if and only if their bytes are equal.
/// On the wire it is a fixed-length opaque with no length prefix.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct nfs_fh {
    /// Raw handle bytes
    pub data: [u8; FHSIZE],
}
DeserializeStruct!(nfs_fh, data);
SerializeStruct!(nfs_fh, data);

impl nfs_fh {
    /// Builds a handle from a backend identifier, zero-padding it to [`FHSIZE`].
    ///
    /// Identifiers longer than [`FHSIZE`] cannot be represented and are
    /// rejected with [`Error::MalformedHandle`].
    pub fn new(id: &[u8]) -> Result<nfs_fh> {
        if id.len() > FHSIZE {
            return Err(Error::MalformedHandle { expected: FHSIZE, actual: id.len() });
        }
        let mut data = [0_u8; FHSIZE];
        data[..id.len()].copy_from_slice(id);
        Ok(nfs_fh { data })
    }

    /// Returns the raw handle bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<&[u8]> for nfs_fh {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let data: [u8; FHSIZE] = value
            .try_into()
            .map_err(|_| Error::MalformedHandle { expected: FHSIZE, actual: value.len() })?;
        Ok(nfs_fh { data })
    }
}

/// Time value: seconds and microseconds since midnight January 1, 1970.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct timeval {
    /// Seconds since the epoch
    pub seconds: u32,
    /// Microseconds within the second
    pub useconds: u32,
}
DeserializeStruct!(timeval, seconds, useconds);
SerializeStruct!(timeval, seconds, useconds);

impl timeval {
    /// Current wall clock time, saturating to zero before the epoch.
    pub fn now() -> timeval {
        let since_epoch = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        timeval {
            seconds: since_epoch.as_secs() as u32,
            useconds: since_epoch.subsec_micros(),
        }
    }
}

/// File attributes in NFS version 2 as defined in RFC 1094 section 2.3.5.
///
/// Returned by every procedure that reports on an object. All fields are
/// always populated; the "ignore" convention only exists for [`sattr`].
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct fattr {
    /// Type of the file
    pub ftype: ftype,
    /// Access mode encoded as a set of bits
    pub mode: u32,
    /// Number of hard links to the file
    pub nlink: u32,
    /// User identification number of the owner
    pub uid: u32,
    /// Group identification number of the file
    pub gid: u32,
    /// Size of the file in bytes
    pub size: u32,
    /// Size in bytes of a block of the file
    pub blocksize: u32,
    /// Device number of the file if it is a device special file
    pub rdev: u32,
    /// Number of blocks the file takes up on disk
    pub blocks: u32,
    /// File system identifier for the filesystem containing the file
    pub fsid: u32,
    /// Number that uniquely identifies the file within its filesystem
    pub fileid: u32,
    /// Time when the file was last accessed
    pub atime: timeval,
    /// Time when the file was last modified
    pub mtime: timeval,
    /// Time when the status of the file was last changed
    pub ctime: timeval,
}
DeserializeStruct!(
    fattr, ftype, mode, nlink, uid, gid, size, blocksize, rdev, blocks, fsid, fileid, atime,
    mtime, ctime
);
SerializeStruct!(
    fattr, ftype, mode, nlink, uid, gid, size, blocksize, rdev, blocks, fsid, fileid, atime,
    mtime, ctime
);

/// Settable attributes as defined in RFC 1094 section 2.3.6.
///
/// On the wire a field equal to `0xFFFFFFFF` means "do not change". That
/// sentinel is represented here as `None`, and `None` is always encoded
/// back to the sentinel. A timestamp is ignored when either of its words
/// carries the sentinel.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct sattr {
    /// Access mode
    pub mode: Option<u32>,
    /// Owner user id
    pub uid: Option<u32>,
    /// Owner group id
    pub gid: Option<u32>,
    /// File size, truncating or extending the file
    pub size: Option<u32>,
    /// Last access time
    pub atime: Option<timeval>,
    /// Last modification time
    pub mtime: Option<timeval>,
}

impl sattr {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == sattr::default()
    }
}

fn serialize_settable<W: Write>(value: Option<u32>, dest: &mut W) -> Result<()> {
    value.unwrap_or(SATTR_IGNORE).serialize(dest)
}

fn deserialize_settable<R: Read>(src: &mut R) -> Result<Option<u32>> {
    let value = deserialize::<u32>(src)?;
    Ok((value != SATTR_IGNORE).then_some(value))
}

fn serialize_settable_time<W: Write>(value: Option<timeval>, dest: &mut W) -> Result<()> {
    value
        .unwrap_or(timeval { seconds: SATTR_IGNORE, useconds: SATTR_IGNORE })
        .serialize(dest)
}

fn deserialize_settable_time<R: Read>(src: &mut R) -> Result<Option<timeval>> {
    let value = deserialize::<timeval>(src)?;
    if value.seconds == SATTR_IGNORE || value.useconds == SATTR_IGNORE {
        return Ok(None);
    }
    Ok(Some(value))
}

impl Serialize for sattr {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        serialize_settable(self.mode, dest)?;
        serialize_settable(self.uid, dest)?;
        serialize_settable(self.gid, dest)?;
        serialize_settable(self.size, dest)?;
        serialize_settable_time(self.atime, dest)?;
        serialize_settable_time(self.mtime, dest)
    }
}

impl Deserialize for sattr {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.mode = deserialize_settable(src)?;
        self.uid = deserialize_settable(src)?;
        self.gid = deserialize_settable(src)?;
        self.size = deserialize_settable(src)?;
        self.atime = deserialize_settable_time(src)?;
        self.mtime = deserialize_settable_time(src)?;
        Ok(())
    }
}

/// Declares a variable-length opaque newtype whose length is capped by the
/// protocol, together with its XDR encoding.
macro_rules! bounded_opaque {
    ($(#[$meta:meta])* $t:ident, $max:expr, $err:ident) => {
        $(#[$meta])*
        #[allow(non_camel_case_types)]
        #[derive(Clone, Default, PartialEq, Eq, Hash)]
        pub struct $t(pub Vec<u8>);

        impl $t {
            /// Maximum encoded length in bytes.
            pub const MAX_LEN: usize = $max;

            /// Returns the length in bytes.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Returns true if there are no bytes.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<Vec<u8>> for $t {
            fn from(value: Vec<u8>) -> Self {
                Self(value)
            }
        }

        impl From<&[u8]> for $t {
            fn from(value: &[u8]) -> Self {
                Self(value.into())
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.as_bytes().into())
            }
        }

        impl AsRef<[u8]> for $t {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl std::ops::Deref for $t {
            type Target = [u8];

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:?}", String::from_utf8_lossy(&self.0))
            }
        }

        impl Serialize for $t {
            fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
                serialize_bounded(&self.0, $max, |len, max| Error::$err { len, max }, dest)
            }
        }

        impl Deserialize for $t {
            fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
                self.0 = deserialize_bounded(src, $max, |len, max| Error::$err { len, max })?;
                Ok(())
            }
        }
    };
}

bounded_opaque!(
    /// A single path component, at most [`MAXNAMLEN`] bytes.
    filename,
    MAXNAMLEN,
    NameTooLong
);

bounded_opaque!(
    /// A pathname or symbolic link target, at most [`MAXPATHLEN`] bytes.
    path,
    MAXPATHLEN,
    PathTooLong
);

bounded_opaque!(
    /// File data carried by READ and WRITE, at most [`MAXDATA`] bytes.
    nfsdata,
    MAXDATA,
    ArgumentTooLarge
);

/// Opaque READDIR position.
///
/// The all-zero cookie asks for the start of the directory. Any other value
/// is only meaningful as returned by a previous READDIR of the same directory.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct nfscookie(pub [u8; COOKIESIZE]);

impl nfscookie {
    /// Cookie naming the first entry of a directory.
    pub const START: nfscookie = nfscookie([0; COOKIESIZE]);

    /// Returns true if this cookie requests the start of the directory.
    pub fn is_start(&self) -> bool {
        *self == nfscookie::START
    }
}

impl From<u32> for nfscookie {
    fn from(value: u32) -> Self {
        nfscookie(value.to_be_bytes())
    }
}

impl From<nfscookie> for u32 {
    fn from(value: nfscookie) -> Self {
        u32::from_be_bytes(value.0)
    }
}

impl Serialize for nfscookie {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        self.0.serialize(dest)
    }
}

impl Deserialize for nfscookie {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.0.deserialize(src)
    }
}

/// Procedure result discriminated by [`nfsstat`].
///
/// The payload is only encoded when the status is `NFS_OK`. A `Failure`
/// carrying `NFS_OK` has no valid encoding and is rejected by `serialize`.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum nfsres<T> {
    /// `NFS_OK` with the procedure's payload
    Success(T),
    /// Any non-zero status
    Failure(nfsstat),
}

impl<T> Default for nfsres<T> {
    fn default() -> Self {
        nfsres::Failure(nfsstat::NFSERR_IO)
    }
}

impl<T> nfsres<T> {
    /// Status carried by this result.
    pub fn status(&self) -> nfsstat {
        match self {
            nfsres::Success(_) => nfsstat::NFS_OK,
            nfsres::Failure(stat) => *stat,
        }
    }
}

impl<T> From<std::result::Result<T, nfsstat>> for nfsres<T> {
    fn from(value: std::result::Result<T, nfsstat>) -> Self {
        match value {
            Ok(payload) => nfsres::Success(payload),
            Err(stat) => nfsres::Failure(stat),
        }
    }
}

impl<T: Serialize> Serialize for nfsres<T> {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        match self {
            nfsres::Success(payload) => {
                nfsstat::NFS_OK.serialize(dest)?;
                payload.serialize(dest)
            }
            nfsres::Failure(nfsstat::NFS_OK) => {
                Err(Error::invalid_data("failure result cannot carry NFS_OK"))
            }
            nfsres::Failure(stat) => stat.serialize(dest),
        }
    }
}

impl<T: Deserialize + Default> Deserialize for nfsres<T> {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        *self = match deserialize::<nfsstat>(src)? {
            nfsstat::NFS_OK => nfsres::Success(deserialize::<T>(src)?),
            stat => nfsres::Failure(stat),
        };
        Ok(())
    }
}

impl Default for nfsstat {
    fn default() -> Self {
        nfsstat::NFS_OK
    }
}

/// Object name within a directory.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct diropargs {
    /// Handle of the directory
    pub dir: nfs_fh,
    /// Name within the directory
    pub name: filename,
}
DeserializeStruct!(diropargs, dir, name);
SerializeStruct!(diropargs, dir, name);

/// Successful result of LOOKUP, CREATE and MKDIR.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct diropokres {
    /// Handle of the named object
    pub file: nfs_fh,
    /// Attributes of the named object
    pub attributes: fattr,
}
DeserializeStruct!(diropokres, file, attributes);
SerializeStruct!(diropokres, file, attributes);

/// Attributes of an object, or the failure status.
pub type attrstat = nfsres<fattr>;
/// Handle and attributes of a named object, or the failure status.
pub type diropres = nfsres<diropokres>;
/// Target of a symbolic link, or the failure status.
pub type readlinkres = nfsres<path>;
