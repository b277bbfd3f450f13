//! Virtual File System (VFS) module defines the interface between the NFS server
//! and the underlying file system implementations.
//!
//! This module provides:
//! - The core `NFSFileSystem` trait that must be implemented to create an NFS-exportable file system
//! - `BackendError`, the failure vocabulary of a backend, and its mapping to protocol status codes
//! - `FileIdHandles`, file handle minting with generation numbers for stale handle detection
//! - Support structures for directory listings
//!
//! The VFS layer abstracts the file system operations required by NFS v2 protocol (RFC 1094)
//! and allows different storage backends to be used with the server. Every capability is
//! keyed by the opaque 32-byte file handle the backend itself minted; the protocol engine
//! never looks inside a handle.

use std::io;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::xdr::nfs2::{
    self, fattr, filename, fs::statfsokres, nfs_fh, nfscookie, nfsstat, path, sattr,
};

/// Failure reported by a backend capability.
///
/// Each kind corresponds to exactly one protocol status; see the
/// `From<BackendError> for nfsstat` implementation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The caller is not the owner of the object
    #[error("not owner")]
    NotOwner,
    /// The named object does not exist
    #[error("no such file or directory")]
    NotFound,
    /// A hard error occurred while processing the operation
    #[error("i/o error: {0}")]
    Io(String),
    /// The object refers to a device or address that does not exist
    #[error("no such device or address")]
    NoDeviceOrAddress,
    /// The caller lacks permission for the operation
    #[error("permission denied")]
    PermissionDenied,
    /// The name is already bound
    #[error("file exists")]
    AlreadyExists,
    /// The device does not exist
    #[error("no such device")]
    NoDevice,
    /// A directory operation was applied to a non-directory
    #[error("not a directory")]
    NotADirectory,
    /// A non-directory operation was applied to a directory
    #[error("is a directory")]
    IsADirectory,
    /// The operation would grow a file beyond the backend's limit
    #[error("file too large")]
    FileTooLarge,
    /// The backend has no space left
    #[error("no space left on device")]
    NoSpace,
    /// The backend refuses modifications
    #[error("read-only filesystem")]
    ReadOnly,
    /// The name is too long for the backend
    #[error("file name too long")]
    NameTooLong,
    /// The directory to remove still has entries
    #[error("directory not empty")]
    DirectoryNotEmpty,
    /// The caller's quota is exhausted
    #[error("disk quota exceeded")]
    QuotaExceeded,
    /// The handle no longer names an object
    #[error("stale file handle")]
    StaleHandle,
    /// Generic write-cache failure, reported as `NFSERR_WFLUSH`
    #[error("cache flushed")]
    GenericIo,
}

impl From<BackendError> for nfsstat {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotOwner => nfsstat::NFSERR_PERM,
            BackendError::NotFound => nfsstat::NFSERR_NOENT,
            BackendError::Io(_) => nfsstat::NFSERR_IO,
            BackendError::NoDeviceOrAddress => nfsstat::NFSERR_NXIO,
            BackendError::PermissionDenied => nfsstat::NFSERR_ACCES,
            BackendError::AlreadyExists => nfsstat::NFSERR_EXIST,
            BackendError::NoDevice => nfsstat::NFSERR_NODEV,
            BackendError::NotADirectory => nfsstat::NFSERR_NOTDIR,
            BackendError::IsADirectory => nfsstat::NFSERR_ISDIR,
            BackendError::FileTooLarge => nfsstat::NFSERR_FBIG,
            BackendError::NoSpace => nfsstat::NFSERR_NOSPC,
            BackendError::ReadOnly => nfsstat::NFSERR_ROFS,
            BackendError::NameTooLong => nfsstat::NFSERR_NAMETOOLONG,
            BackendError::DirectoryNotEmpty => nfsstat::NFSERR_NOTEMPTY,
            BackendError::QuotaExceeded => nfsstat::NFSERR_DQUOT,
            BackendError::StaleHandle => nfsstat::NFSERR_STALE,
            BackendError::GenericIo => nfsstat::NFSERR_WFLUSH,
        }
    }
}

/// Backends built on `std::fs` can forward their errors with `?`.
/// Kinds without a protocol counterpart become [`BackendError::Io`].
impl From<io::Error> for BackendError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => BackendError::NotFound,
            io::ErrorKind::PermissionDenied => BackendError::PermissionDenied,
            io::ErrorKind::AlreadyExists => BackendError::AlreadyExists,
            io::ErrorKind::NotADirectory => BackendError::NotADirectory,
            io::ErrorKind::IsADirectory => BackendError::IsADirectory,
            io::ErrorKind::DirectoryNotEmpty => BackendError::DirectoryNotEmpty,
            io::ErrorKind::StorageFull => BackendError::NoSpace,
            io::ErrorKind::ReadOnlyFilesystem => BackendError::ReadOnly,
            io::ErrorKind::FileTooLarge => BackendError::FileTooLarge,
            io::ErrorKind::StaleNetworkFileHandle => BackendError::StaleHandle,
            _ => BackendError::Io(err.to_string()),
        }
    }
}

/// One entry of a directory listing
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirEntry {
    /// Unique file identifier within the file system (similar to inode number)
    pub fileid: u32,
    /// File name (without path components)
    pub name: filename,
    /// Cookie naming the entry that follows this one
    pub cookie: nfscookie,
}

/// Result returned by readdir operations
///
/// Contains a vector of directory entries and an EOF flag
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadDirResult {
    /// Entries in stable backend order
    pub entries: Vec<DirEntry>,
    /// Indicates if the end of directory has been reached
    pub end: bool,
}

/// Defines the access capabilities supported by a file system implementation
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Capabilities {
    /// File system supports read operations only
    ReadOnly,
    /// File system supports both read and write operations
    ReadWrite,
}

/// The basic API to implement to provide an NFS file system
///
/// Opaque FH
/// ---------
/// Every object is named by a 32-byte [`nfs_fh`] minted by the backend. The
/// server hands handles back exactly as received. Backends that identify
/// files by a numeric id can use [`FileIdHandles`] to mint handles that go
/// stale when the backend restarts.
///
/// readdir pagination
/// ------------------
/// Each returned entry carries the cookie of the entry after it. An
/// all-zero cookie asks for the start of the directory. Entries must come in
/// a stable order, and a cookie issued before the directory changed must
/// still yield a valid, possibly empty, continuation. The server trims the
/// listing further so the encoded reply fits the client's byte budget.
///
/// Other requirements
/// ------------------
///  getattr needs to be fast. NFS uses that a lot
///
///  `create` and `mkdir` must refuse names that are already bound with
///  [`BackendError::AlreadyExists`]
#[async_trait]
pub trait NFSFileSystem: Sync {
    /// Returns the set of capabilities supported by this file system implementation
    ///
    /// Mutating procedures are answered with `NFSERR_ROFS` without reaching the
    /// backend when this is [`Capabilities::ReadOnly`].
    fn capabilities(&self) -> Capabilities {
        Capabilities::ReadWrite
    }

    /// Returns the handle of the root directory "/"
    fn root_handle(&self) -> nfs_fh;

    /// Returns the attributes of a file or directory
    async fn getattr(&self, fh: &nfs_fh) -> Result<fattr, BackendError>;

    /// Sets the attributes of a file or directory
    ///
    /// Fields of `attr` that are `None` must be left unchanged.
    /// Returns the attributes after the update.
    async fn setattr(&self, fh: &nfs_fh, attr: sattr) -> Result<fattr, BackendError>;

    /// Looks up `name` within the directory `dir`
    ///
    /// # Returns
    /// * The handle and attributes of the named object
    async fn lookup(&self, dir: &nfs_fh, name: &filename)
        -> Result<(nfs_fh, fattr), BackendError>;

    /// Reads the target of a symbolic link
    async fn readlink(&self, fh: &nfs_fh) -> Result<path, BackendError>;

    /// Reads up to `count` bytes from a file starting at `offset`
    ///
    /// Reading at or past the end of the file returns no data.
    ///
    /// # Returns
    /// * The attributes of the file after the read and the data read
    async fn read(
        &self,
        fh: &nfs_fh,
        offset: u32,
        count: u32,
    ) -> Result<(fattr, Vec<u8>), BackendError>;

    /// Writes `data` to a file starting at `offset`, extending it if needed
    ///
    /// # Returns
    /// * The attributes of the file after the write
    async fn write(&self, fh: &nfs_fh, offset: u32, data: &[u8]) -> Result<fattr, BackendError>;

    /// Creates a new regular file named `name` in `dir`
    async fn create(
        &self,
        dir: &nfs_fh,
        name: &filename,
        attr: sattr,
    ) -> Result<(nfs_fh, fattr), BackendError>;

    /// Removes the non-directory entry `name` from `dir`
    async fn remove(&self, dir: &nfs_fh, name: &filename) -> Result<(), BackendError>;

    /// Renames `from_name` in `from_dir` to `to_name` in `to_dir`
    async fn rename(
        &self,
        from_dir: &nfs_fh,
        from_name: &filename,
        to_dir: &nfs_fh,
        to_name: &filename,
    ) -> Result<(), BackendError>;

    /// Creates a hard link `to_name` in `to_dir` naming the existing object `from`
    async fn link(
        &self,
        from: &nfs_fh,
        to_dir: &nfs_fh,
        to_name: &filename,
    ) -> Result<(), BackendError>;

    /// Creates a symbolic link `name` in `dir` pointing at `target`
    async fn symlink(
        &self,
        dir: &nfs_fh,
        name: &filename,
        target: &path,
        attr: sattr,
    ) -> Result<(), BackendError>;

    /// Creates a new directory named `name` in `dir`
    async fn mkdir(
        &self,
        dir: &nfs_fh,
        name: &filename,
        attr: sattr,
    ) -> Result<(nfs_fh, fattr), BackendError>;

    /// Removes the empty directory `name` from `dir`
    async fn rmdir(&self, dir: &nfs_fh, name: &filename) -> Result<(), BackendError>;

    /// Lists at most `max_entries` entries of `dir` starting at `cookie`
    async fn readdir(
        &self,
        dir: &nfs_fh,
        cookie: nfscookie,
        max_entries: usize,
    ) -> Result<ReadDirResult, BackendError>;

    /// Reports filesystem usage for the filesystem containing `fh`
    ///
    /// The default implementation describes an empty filesystem with
    /// transfers sized to the protocol maximum.
    async fn statfs(&self, fh: &nfs_fh) -> Result<statfsokres, BackendError> {
        self.getattr(fh).await?;
        Ok(statfsokres {
            tsize: nfs2::MAXDATA as u32,
            bsize: 4096,
            blocks: 0,
            bfree: 0,
            bavail: 0,
        })
    }

    /// Converts a path to a handle by walking the directory structure
    ///
    /// The default implementation starts at [`NFSFileSystem::root_handle`]
    /// and calls `lookup` for every non-empty component.
    async fn path_to_handle(&self, export_path: &[u8]) -> Result<nfs_fh, BackendError> {
        let mut fh = self.root_handle();
        for component in export_path.split(|&c| c == b'/') {
            if component.is_empty() {
                continue;
            }
            if component.len() > nfs2::MAXNAMLEN {
                return Err(BackendError::NameTooLong);
            }
            fh = self.lookup(&fh, &component.into()).await?.0;
        }
        Ok(fh)
    }
}

/// File handle minting for backends that identify objects by a numeric id.
///
/// A handle is comprised of
///  - A 64-bit generation number, typically derived from the backend startup time
///    (i.e. so the opaque file handle expires when the NFS server restarts)
///  - The 64-bit file id
///
/// stored little-endian and zero-padded to 32 bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FileIdHandles {
    generation: u64,
}

impl FileIdHandles {
    /// Creates a minter for the given generation number
    pub fn new(generation: u64) -> Self {
        Self { generation }
    }

    /// Creates a minter whose generation is the current time in milliseconds
    pub fn from_startup_time() -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self::new(now as u64)
    }

    /// Returns the generation number embedded in minted handles
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Converts a file ID to an opaque NFS file handle
    pub fn id_to_fh(&self, id: u64) -> nfs_fh {
        let mut data = [0_u8; nfs2::FHSIZE];
        data[0..8].copy_from_slice(&self.generation.to_le_bytes());
        data[8..16].copy_from_slice(&id.to_le_bytes());
        nfs_fh { data }
    }

    /// Converts an opaque NFS file handle back to a file ID
    ///
    /// # Returns
    /// * The file ID, or [`BackendError::StaleHandle`] if the handle was minted
    ///   by another generation or was not minted by this scheme at all
    pub fn fh_to_id(&self, fh: &nfs_fh) -> Result<u64, BackendError> {
        let mut generation = [0_u8; 8];
        let mut id = [0_u8; 8];
        generation.copy_from_slice(&fh.data[0..8]);
        id.copy_from_slice(&fh.data[8..16]);
        if u64::from_le_bytes(generation) != self.generation
            || fh.data[16..].iter().any(|&b| b != 0)
        {
            return Err(BackendError::StaleHandle);
        }
        Ok(u64::from_le_bytes(id))
    }
}
