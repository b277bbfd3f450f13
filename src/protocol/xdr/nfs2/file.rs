//! Module contains XDR data structures related to files for NFS version 2 protocol
//! as defined in RFC 1094.
//!
//! This module includes data structures for the following operations:
//! - SETATTR: Set file attributes (procedure 2)
//! - READ: Read from file (procedure 6)
//! - WRITE: Write to file (procedure 8)
//! - CREATE: Create file (procedure 9)
//! - RENAME: Rename file (procedure 11)
//! - LINK: Create link to file (procedure 12)
//! - SYMLINK: Create symbolic link (procedure 13)

// Allow unused code warnings since we implement the complete RFC 1094 specification
#![allow(dead_code)]
// Preserve original RFC naming conventions (e.g. sattrargs, readokres)
#![allow(non_camel_case_types)]

use super::*;

/// Arguments for the SETATTR procedure (procedure 2)
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct sattrargs {
    /// Handle of the object to update
    pub file: nfs_fh,
    /// Attributes to change; `None` fields are left untouched
    pub attributes: sattr,
}
DeserializeStruct!(sattrargs, file, attributes);
SerializeStruct!(sattrargs, file, attributes);

/// Arguments for the READ procedure (procedure 6)
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct readargs {
    /// Handle of the file to read
    pub file: nfs_fh,
    /// Byte position to start reading from
    pub offset: u32,
    /// Number of bytes requested, at most [`MAXDATA`]
    pub count: u32,
    /// Unused by the protocol
    pub totalcount: u32,
}
DeserializeStruct!(readargs, file, offset, count, totalcount);
SerializeStruct!(readargs, file, offset, count, totalcount);

/// Successful result of the READ procedure
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct readokres {
    /// Attributes of the file after the read
    pub attributes: fattr,
    /// Data read from the file
    pub data: nfsdata,
}
DeserializeStruct!(readokres, attributes, data);
SerializeStruct!(readokres, attributes, data);

/// READ result, or the failure status.
pub type readres = nfsres<readokres>;

/// Arguments for the WRITE procedure (procedure 8)
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct writeargs {
    /// Handle of the file to write
    pub file: nfs_fh,
    /// Unused by the protocol
    pub beginoffset: u32,
    /// Byte position to start writing at
    pub offset: u32,
    /// Unused by the protocol
    pub totalcount: u32,
    /// Data to write, at most [`MAXDATA`] bytes
    pub data: nfsdata,
}
DeserializeStruct!(writeargs, file, beginoffset, offset, totalcount, data);
SerializeStruct!(writeargs, file, beginoffset, offset, totalcount, data);

/// Arguments for the CREATE (procedure 9) and MKDIR (procedure 14) procedures
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct createargs {
    /// Directory and name of the new object
    pub location: diropargs,
    /// Initial attributes of the new object
    pub attributes: sattr,
}
DeserializeStruct!(createargs, location, attributes);
SerializeStruct!(createargs, location, attributes);

/// Arguments for the RENAME procedure (procedure 11)
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct renameargs {
    /// Current directory and name
    pub from: diropargs,
    /// New directory and name
    pub to: diropargs,
}
DeserializeStruct!(renameargs, from, to);
SerializeStruct!(renameargs, from, to);

/// Arguments for the LINK procedure (procedure 12)
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct linkargs {
    /// Handle of the existing file
    pub from: nfs_fh,
    /// Directory and name of the new link
    pub to: diropargs,
}
DeserializeStruct!(linkargs, from, to);
SerializeStruct!(linkargs, from, to);

/// Arguments for the SYMLINK procedure (procedure 13)
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct symlinkargs {
    /// Directory and name of the new link
    pub from: diropargs,
    /// Target path stored in the link
    pub to: path,
    /// Initial attributes; unused on UNIX servers
    pub attributes: sattr,
}
DeserializeStruct!(symlinkargs, from, to, attributes);
SerializeStruct!(symlinkargs, from, to, attributes);
