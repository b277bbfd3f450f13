use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use nfs2_server::vfs::{self, BackendError, DirEntry, FileIdHandles, ReadDirResult};
use nfs2_server::xdr::nfs2::{
    fattr, filename, fs::statfsokres, nfs_fh, nfscookie, path, sattr, timeval,
};

use crate::fs_entry::{
    make_dir, make_file, make_symlink, Children, FSContents, FSEntry, BLOCK_SIZE,
    MAX_FILE_SIZE, TRANSFER_SIZE,
};

/// File id of the root directory. Id 0 is never handed out.
const ROOT_ID: u64 = 1;

/// Blocks reported as the capacity of the file system
const TOTAL_BLOCKS: u32 = 1 << 18;

type Entries = Vec<Option<FSEntry>>;

/// In-memory file system served by the demo.
///
/// Entries live in a table indexed by file id; a removed entry leaves an
/// empty slot so ids are never reused and old handles go stale. Handles are
/// minted by [`FileIdHandles`], so they also go stale when the process
/// restarts.
#[derive(Debug)]
pub struct MemFS {
    entries: Mutex<Entries>,
    handles: FileIdHandles,
}

impl Default for MemFS {
    fn default() -> MemFS {
        MemFS::new(FileIdHandles::from_startup_time())
    }
}

impl MemFS {
    /// Creates a file system holding only an empty root directory.
    pub fn new(handles: FileIdHandles) -> MemFS {
        let root = make_dir(ROOT_ID, ROOT_ID, &sattr::default());
        MemFS { entries: Mutex::new(vec![None, Some(root)]), handles }
    }

    /// Adds a file with the given contents below the root directory.
    pub fn add_file(&self, name: &str, contents: &[u8]) -> Result<(), BackendError> {
        let mut fs = self.lock();
        insert_child(&mut fs, ROOT_ID, &name.into(), |id| {
            make_file(id, ROOT_ID, &sattr::default(), contents)
        })?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id(&self, fh: &nfs_fh) -> Result<u64, BackendError> {
        self.handles.fh_to_id(fh)
    }

    fn handle_and_attr(&self, fs: &Entries, id: u64) -> Result<(nfs_fh, fattr), BackendError> {
        Ok((self.handles.id_to_fh(id), entry(fs, id)?.attr))
    }
}

fn entry(fs: &Entries, id: u64) -> Result<&FSEntry, BackendError> {
    fs.get(id as usize).and_then(Option::as_ref).ok_or(BackendError::StaleHandle)
}

fn entry_mut(fs: &mut Entries, id: u64) -> Result<&mut FSEntry, BackendError> {
    fs.get_mut(id as usize).and_then(Option::as_mut).ok_or(BackendError::StaleHandle)
}

fn children(fs: &Entries, dir: u64) -> Result<&Children, BackendError> {
    match &entry(fs, dir)?.contents {
        FSContents::Directory(children) => Ok(children),
        _ => Err(BackendError::NotADirectory),
    }
}

fn children_mut(fs: &mut Entries, dir: u64) -> Result<&mut Children, BackendError> {
    match &mut entry_mut(fs, dir)?.contents {
        FSContents::Directory(children) => Ok(children),
        _ => Err(BackendError::NotADirectory),
    }
}

fn find_child(fs: &Entries, dir: u64, name: &filename) -> Result<u64, BackendError> {
    let parent = entry(fs, dir)?.parent;
    let children = children(fs, dir)?;
    match name.as_ref() {
        b"." => Ok(dir),
        b".." => Ok(parent),
        name => children.find(name).ok_or(BackendError::NotFound),
    }
}

/// Names that cannot be bound by CREATE, MKDIR, SYMLINK, LINK or RENAME
fn check_new_name(name: &filename) -> Result<(), BackendError> {
    match name.as_ref() {
        b"" => Err(BackendError::NotFound),
        b"." | b".." => Err(BackendError::AlreadyExists),
        name if name.contains(&b'/') => Err(BackendError::PermissionDenied),
        _ => Ok(()),
    }
}

/// Binds `name` in `dir` to a new entry built by `make`, returning its id.
fn insert_child(
    fs: &mut Entries,
    dir: u64,
    name: &filename,
    make: impl FnOnce(u64) -> FSEntry,
) -> Result<u64, BackendError> {
    check_new_name(name)?;
    match find_child(fs, dir, name) {
        Ok(_) => return Err(BackendError::AlreadyExists),
        Err(BackendError::NotFound) => {}
        Err(e) => return Err(e),
    }
    let id = fs.len() as u64;
    fs.push(Some(make(id)));
    bind(fs, dir, name, id)?;
    Ok(id)
}

fn bind(fs: &mut Entries, dir: u64, name: &filename, id: u64) -> Result<(), BackendError> {
    children_mut(fs, dir)?.push(name.clone(), id);
    let dir = entry_mut(fs, dir)?;
    dir.update_size();
    dir.touch();
    Ok(())
}

/// Removes the binding of `name` in `dir` and releases the entry once no
/// name refers to it any more.
fn unbind(fs: &mut Entries, dir: u64, name: &filename) -> Result<(), BackendError> {
    let id = children_mut(fs, dir)?.remove(name).ok_or(BackendError::NotFound)?;
    let dir = entry_mut(fs, dir)?;
    dir.update_size();
    dir.touch();

    let target = entry_mut(fs, id)?;
    target.attr.nlink = target.attr.nlink.saturating_sub(1);
    target.attr.ctime = timeval::now();
    if target.attr.nlink == 0 {
        fs[id as usize] = None;
    }
    Ok(())
}

/// Unbinds the empty directory `id` named `name` in `dir` and frees it.
fn release_dir(fs: &mut Entries, dir: u64, name: &filename, id: u64) -> Result<(), BackendError> {
    // the entry is released by unbind once "." no longer counts
    entry_mut(fs, id)?.attr.nlink = 1;
    unbind(fs, dir, name)?;
    let parent = entry_mut(fs, dir)?;
    parent.attr.nlink = parent.attr.nlink.saturating_sub(1);
    Ok(())
}

/// True if `id` is `ancestor` or lies below it
fn is_within(fs: &Entries, mut id: u64, ancestor: u64) -> bool {
    loop {
        if id == ancestor {
            return true;
        }
        match entry(fs, id) {
            Ok(e) if e.parent != id => id = e.parent,
            _ => return false,
        }
    }
}

#[async_trait]
impl vfs::NFSFileSystem for MemFS {
    fn root_handle(&self) -> nfs_fh {
        self.handles.id_to_fh(ROOT_ID)
    }

    async fn getattr(&self, fh: &nfs_fh) -> Result<fattr, BackendError> {
        let id = self.id(fh)?;
        Ok(entry(&self.lock(), id)?.attr)
    }

    async fn setattr(&self, fh: &nfs_fh, attr: sattr) -> Result<fattr, BackendError> {
        let id = self.id(fh)?;
        let mut fs = self.lock();
        let entry = entry_mut(&mut fs, id)?;
        if !entry.apply(&attr) {
            return Err(BackendError::IsADirectory);
        }
        Ok(entry.attr)
    }

    async fn lookup(
        &self,
        dir: &nfs_fh,
        name: &filename,
    ) -> Result<(nfs_fh, fattr), BackendError> {
        let dir = self.id(dir)?;
        let fs = self.lock();
        let id = find_child(&fs, dir, name)?;
        self.handle_and_attr(&fs, id)
    }

    async fn readlink(&self, fh: &nfs_fh) -> Result<path, BackendError> {
        let id = self.id(fh)?;
        match &entry(&self.lock(), id)?.contents {
            FSContents::Symlink(target) => Ok(target.clone()),
            _ => Err(BackendError::Io("not a symbolic link".to_string())),
        }
    }

    async fn read(
        &self,
        fh: &nfs_fh,
        offset: u32,
        count: u32,
    ) -> Result<(fattr, Vec<u8>), BackendError> {
        let id = self.id(fh)?;
        let mut fs = self.lock();
        let entry = entry_mut(&mut fs, id)?;
        let data = match &entry.contents {
            FSContents::File(bytes) => {
                let start = (offset as usize).min(bytes.len());
                let end = start.saturating_add(count as usize).min(bytes.len());
                bytes[start..end].to_vec()
            }
            FSContents::Directory(_) => return Err(BackendError::IsADirectory),
            FSContents::Symlink(_) => {
                return Err(BackendError::Io("not a regular file".to_string()))
            }
        };
        entry.attr.atime = timeval::now();
        Ok((entry.attr, data))
    }

    async fn write(&self, fh: &nfs_fh, offset: u32, data: &[u8]) -> Result<fattr, BackendError> {
        let id = self.id(fh)?;
        let end = offset as u64 + data.len() as u64;
        if end > MAX_FILE_SIZE {
            return Err(BackendError::FileTooLarge);
        }
        let mut fs = self.lock();
        let entry = entry_mut(&mut fs, id)?;
        let FSContents::File(bytes) = &mut entry.contents else {
            return Err(BackendError::IsADirectory);
        };
        let (offset, end) = (offset as usize, end as usize);
        if end > bytes.len() {
            bytes.resize(end, 0);
        }
        bytes[offset..end].copy_from_slice(data);
        entry.update_size();
        entry.touch();
        Ok(entry.attr)
    }

    async fn create(
        &self,
        dir: &nfs_fh,
        name: &filename,
        attr: sattr,
    ) -> Result<(nfs_fh, fattr), BackendError> {
        let dir = self.id(dir)?;
        let mut fs = self.lock();
        let id = insert_child(&mut fs, dir, name, |id| make_file(id, dir, &attr, &[]))?;
        debug!("created file {:?} as {}", name, id);
        self.handle_and_attr(&fs, id)
    }

    async fn remove(&self, dir: &nfs_fh, name: &filename) -> Result<(), BackendError> {
        let dir = self.id(dir)?;
        let mut fs = self.lock();
        let id = find_child(&fs, dir, name)?;
        if entry(&fs, id)?.is_dir() {
            return Err(BackendError::IsADirectory);
        }
        unbind(&mut fs, dir, name)
    }

    async fn rename(
        &self,
        from_dir: &nfs_fh,
        from_name: &filename,
        to_dir: &nfs_fh,
        to_name: &filename,
    ) -> Result<(), BackendError> {
        let (from_dir, to_dir) = (self.id(from_dir)?, self.id(to_dir)?);
        let mut fs = self.lock();
        let id = find_child(&fs, from_dir, from_name)?;
        check_new_name(to_name)?;
        children(&fs, to_dir)?;
        if from_dir == to_dir && from_name == to_name {
            return Ok(());
        }
        let moving_dir = entry(&fs, id)?.is_dir();
        if moving_dir && is_within(&fs, to_dir, id) {
            return Err(BackendError::Io("cannot move a directory below itself".to_string()));
        }

        match find_child(&fs, to_dir, to_name) {
            Ok(existing) if existing == id => return Ok(()),
            Ok(existing) => {
                let target = entry(&fs, existing)?;
                match (&target.contents, moving_dir) {
                    (FSContents::Directory(c), true) if !c.is_empty() => {
                        return Err(BackendError::DirectoryNotEmpty)
                    }
                    (FSContents::Directory(_), false) => return Err(BackendError::IsADirectory),
                    (_, true) if !target.is_dir() => return Err(BackendError::NotADirectory),
                    _ => {}
                }
                if moving_dir {
                    release_dir(&mut fs, to_dir, to_name, existing)?;
                } else {
                    unbind(&mut fs, to_dir, to_name)?;
                }
            }
            Err(BackendError::NotFound) => {}
            Err(e) => return Err(e),
        }

        // move the binding without touching the link count
        children_mut(&mut fs, from_dir)?.remove(from_name);
        entry_mut(&mut fs, from_dir)?.update_size();
        entry_mut(&mut fs, from_dir)?.touch();
        bind(&mut fs, to_dir, to_name, id)?;
        let moved = entry_mut(&mut fs, id)?;
        moved.parent = to_dir;
        moved.attr.ctime = timeval::now();
        if moving_dir && from_dir != to_dir {
            // ".." of the moved directory now counts against the new parent
            let from = entry_mut(&mut fs, from_dir)?;
            from.attr.nlink = from.attr.nlink.saturating_sub(1);
            entry_mut(&mut fs, to_dir)?.attr.nlink += 1;
        }
        Ok(())
    }

    async fn link(
        &self,
        from: &nfs_fh,
        to_dir: &nfs_fh,
        to_name: &filename,
    ) -> Result<(), BackendError> {
        let (id, to_dir) = (self.id(from)?, self.id(to_dir)?);
        let mut fs = self.lock();
        if entry(&fs, id)?.is_dir() {
            return Err(BackendError::IsADirectory);
        }
        check_new_name(to_name)?;
        match find_child(&fs, to_dir, to_name) {
            Ok(_) => return Err(BackendError::AlreadyExists),
            Err(BackendError::NotFound) => {}
            Err(e) => return Err(e),
        }
        bind(&mut fs, to_dir, to_name, id)?;
        let target = entry_mut(&mut fs, id)?;
        target.attr.nlink += 1;
        target.attr.ctime = timeval::now();
        Ok(())
    }

    async fn symlink(
        &self,
        dir: &nfs_fh,
        name: &filename,
        target: &path,
        attr: sattr,
    ) -> Result<(), BackendError> {
        let dir = self.id(dir)?;
        let mut fs = self.lock();
        insert_child(&mut fs, dir, name, |id| make_symlink(id, dir, &attr, target))?;
        Ok(())
    }

    async fn mkdir(
        &self,
        dir: &nfs_fh,
        name: &filename,
        attr: sattr,
    ) -> Result<(nfs_fh, fattr), BackendError> {
        let dir = self.id(dir)?;
        let mut fs = self.lock();
        let id = insert_child(&mut fs, dir, name, |id| make_dir(id, dir, &attr))?;
        // ".." of the new directory
        entry_mut(&mut fs, dir)?.attr.nlink += 1;
        self.handle_and_attr(&fs, id)
    }

    async fn rmdir(&self, dir: &nfs_fh, name: &filename) -> Result<(), BackendError> {
        let dir = self.id(dir)?;
        let mut fs = self.lock();
        let id = find_child(&fs, dir, name)?;
        match &entry(&fs, id)?.contents {
            FSContents::Directory(c) if !c.is_empty() => {
                return Err(BackendError::DirectoryNotEmpty)
            }
            FSContents::Directory(_) => {}
            _ => return Err(BackendError::NotADirectory),
        }
        release_dir(&mut fs, dir, name, id)
    }

    async fn readdir(
        &self,
        dir: &nfs_fh,
        cookie: nfscookie,
        max_entries: usize,
    ) -> Result<ReadDirResult, BackendError> {
        let dir = self.id(dir)?;
        let fs = self.lock();
        let remaining = children(&fs, dir)?.after(u32::from(cookie));
        let entries: Vec<DirEntry> = remaining
            .iter()
            .take(max_entries)
            .map(|slot| DirEntry {
                fileid: slot.id as u32,
                name: slot.name.clone(),
                cookie: nfscookie::from(slot.cookie),
            })
            .collect();
        let end = entries.len() == remaining.len();
        debug!("readdir {} after {:?}: {} entries, end {}", dir, cookie, entries.len(), end);
        Ok(ReadDirResult { entries, end })
    }

    async fn statfs(&self, fh: &nfs_fh) -> Result<statfsokres, BackendError> {
        let id = self.id(fh)?;
        let fs = self.lock();
        entry(&fs, id)?;
        let used: u32 = fs.iter().flatten().map(|e| e.attr.blocks).sum();
        let free = TOTAL_BLOCKS.saturating_sub(used);
        Ok(statfsokres {
            tsize: TRANSFER_SIZE,
            bsize: BLOCK_SIZE,
            blocks: TOTAL_BLOCKS,
            bfree: free,
            bavail: free,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;
    use std::time::Duration;

    use nfs2_server::protocol::nfs::v2::handle_call;
    use nfs2_server::vfs::NFSFileSystem;
    use nfs2_server::xdr::nfs2::{self, dir, diropargs, file, ftype, nfsres, nfsstat, NFSProgram};
    use nfs2_server::xdr::{self, Deserialize, Serialize};

    use super::*;

    fn memfs() -> MemFS {
        MemFS::new(FileIdHandles::new(3))
    }

    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        let mut buf = Vec::new();
        value.serialize(&mut buf).expect("encode");
        buf
    }

    fn decode<T: Deserialize + Default>(buf: &[u8]) -> T {
        xdr::deserialize::<T>(&mut &buf[..]).expect("decode")
    }

    fn success<T: Debug>(res: nfsres<T>) -> T {
        match res {
            nfsres::Success(ok) => ok,
            other => panic!("unexpected result {other:?}"),
        }
    }

    fn at(dir: nfs_fh, name: &str) -> diropargs {
        diropargs { dir, name: name.into() }
    }

    async fn call<T: Serialize>(fs: &MemFS, proc: NFSProgram, args: &T) -> Vec<u8> {
        handle_call(fs, proc as u32, &encode(args)).await.expect("handle_call")
    }

    async fn getattr(fs: &MemFS, fh: nfs_fh) -> nfs2::attrstat {
        decode(&call(fs, NFSProgram::NFSPROC_GETATTR, &fh).await)
    }

    async fn mkdir(fs: &MemFS, dir: nfs_fh, name: &str) -> nfs2::diropokres {
        let args = file::createargs { location: at(dir, name), attributes: sattr::default() };
        success(decode(&call(fs, NFSProgram::NFSPROC_MKDIR, &args).await))
    }

    async fn readdir(fs: &MemFS, cookie: nfscookie, count: u32) -> dir::readdirok {
        let args = dir::readdirargs { dir: fs.root_handle(), cookie, count };
        success(decode(&call(fs, NFSProgram::NFSPROC_READDIR, &args).await))
    }

    fn names(ok: &dir::readdirok) -> Vec<String> {
        ok.entries.iter().map(|e| String::from_utf8_lossy(&e.name).into_owned()).collect()
    }

    #[tokio::test]
    async fn setattr_without_fields_keeps_ctime() {
        let fs = memfs();
        fs.add_file("a", b"data").expect("add file");
        let (fh, before) = fs.lookup(&fs.root_handle(), &"a".into()).await.expect("lookup");
        tokio::time::sleep(Duration::from_millis(5)).await;

        let args = file::sattrargs { file: fh, attributes: sattr::default() };
        let after = success(decode::<nfs2::attrstat>(
            &call(&fs, NFSProgram::NFSPROC_SETATTR, &args).await,
        ));
        assert_eq!(after, before);

        let chmod = sattr { mode: Some(0o600), ..sattr::default() };
        let args = file::sattrargs { file: fh, attributes: chmod };
        let after = success(decode::<nfs2::attrstat>(
            &call(&fs, NFSProgram::NFSPROC_SETATTR, &args).await,
        ));
        assert_eq!(after.mode & 0o7777, 0o600);
        assert_ne!(after.ctime, before.ctime);
    }

    #[tokio::test]
    async fn mkdir_counts_links() {
        let fs = memfs();
        assert_eq!(success(getattr(&fs, fs.root_handle()).await).nlink, 2);

        let made = mkdir(&fs, fs.root_handle(), "sub").await;
        assert_eq!(made.attributes.ftype, ftype::NFDIR);
        assert_eq!(made.attributes.nlink, 2);
        assert_eq!(success(getattr(&fs, fs.root_handle()).await).nlink, 3);

        let args = at(fs.root_handle(), "sub");
        assert_eq!(call(&fs, NFSProgram::NFSPROC_RMDIR, &args).await, encode(&nfsstat::NFS_OK));
        assert_eq!(success(getattr(&fs, fs.root_handle()).await).nlink, 2);
        assert_eq!(getattr(&fs, made.file).await.status(), nfsstat::NFSERR_STALE);
    }

    #[tokio::test]
    async fn symlink_then_readlink() {
        let fs = memfs();
        let args = file::symlinkargs {
            from: at(fs.root_handle(), "ln"),
            to: path::from("target/file"),
            attributes: sattr::default(),
        };
        assert_eq!(call(&fs, NFSProgram::NFSPROC_SYMLINK, &args).await, encode(&nfsstat::NFS_OK));

        let (fh, attr) = fs.lookup(&fs.root_handle(), &"ln".into()).await.expect("lookup");
        assert_eq!(attr.ftype, ftype::NFLNK);
        let target = success(decode::<nfs2::readlinkres>(
            &call(&fs, NFSProgram::NFSPROC_READLINK, &fh).await,
        ));
        assert_eq!(target, path::from("target/file"));
    }

    #[tokio::test]
    async fn link_shares_data() {
        let fs = memfs();
        fs.add_file("a", b"shared").expect("add file");
        let (fh, _) = fs.lookup(&fs.root_handle(), &"a".into()).await.expect("lookup");

        let args = file::linkargs { from: fh, to: at(fs.root_handle(), "b") };
        assert_eq!(call(&fs, NFSProgram::NFSPROC_LINK, &args).await, encode(&nfsstat::NFS_OK));

        let (linked, attr) = fs.lookup(&fs.root_handle(), &"b".into()).await.expect("lookup");
        assert_eq!(linked, fh);
        assert_eq!(attr.nlink, 2);
        let args = file::readargs { file: linked, offset: 0, count: 100, totalcount: 0 };
        let read =
            success(decode::<file::readres>(&call(&fs, NFSProgram::NFSPROC_READ, &args).await));
        assert_eq!(read.data.as_ref(), &b"shared"[..]);

        // the data outlives the first name
        let args = at(fs.root_handle(), "a");
        assert_eq!(call(&fs, NFSProgram::NFSPROC_REMOVE, &args).await, encode(&nfsstat::NFS_OK));
        assert_eq!(success(getattr(&fs, fh).await).nlink, 1);
    }

    #[tokio::test]
    async fn create_refuses_existing_name() {
        let fs = memfs();
        fs.add_file("a", b"keep").expect("add file");

        let err = fs
            .create(&fs.root_handle(), &"a".into(), sattr::default())
            .await
            .expect_err("name is taken");
        assert!(matches!(err, BackendError::AlreadyExists));

        let args = file::createargs {
            location: at(fs.root_handle(), "a"),
            attributes: sattr { size: Some(0), ..sattr::default() },
        };
        let res = decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_CREATE, &args).await);
        assert_eq!(res.status(), nfsstat::NFSERR_EXIST);
        let (_, attr) = fs.lookup(&fs.root_handle(), &"a".into()).await.expect("lookup");
        assert_eq!(attr.size, 4);
    }

    #[tokio::test]
    async fn removed_file_handle_is_stale() {
        let fs = memfs();
        fs.add_file("a", b"x").expect("add file");
        let (fh, _) = fs.lookup(&fs.root_handle(), &"a".into()).await.expect("lookup");

        let args = at(fs.root_handle(), "a");
        assert_eq!(call(&fs, NFSProgram::NFSPROC_REMOVE, &args).await, encode(&nfsstat::NFS_OK));
        assert_eq!(getattr(&fs, fh).await.status(), nfsstat::NFSERR_STALE);

        // a new file under the same name gets a new handle
        fs.add_file("a", b"y").expect("add file");
        let (again, _) = fs.lookup(&fs.root_handle(), &"a".into()).await.expect("lookup");
        assert_ne!(again, fh);
        assert_eq!(getattr(&fs, fh).await.status(), nfsstat::NFSERR_STALE);
    }

    #[tokio::test]
    async fn readdir_cookie_survives_removal() {
        let fs = memfs();
        for name in ["a", "b", "c"] {
            fs.add_file(name, b"").expect("add file");
        }

        // status and trailer take 12 bytes, one entry with a short name 20
        let first = readdir(&fs, nfscookie::START, 32).await;
        assert_eq!(names(&first), vec!["a"]);
        assert!(!first.eof);

        for name in ["a", "b"] {
            let args = at(fs.root_handle(), name);
            assert_eq!(
                call(&fs, NFSProgram::NFSPROC_REMOVE, &args).await,
                encode(&nfsstat::NFS_OK)
            );
        }
        fs.add_file("d", b"").expect("add file");

        let rest = readdir(&fs, first.entries[0].cookie, 4096).await;
        assert_eq!(names(&rest), vec!["c", "d"]);
        assert!(rest.eof);
    }

    #[tokio::test]
    async fn rename_over_empty_directory() {
        let fs = memfs();
        let moved = mkdir(&fs, fs.root_handle(), "x").await;
        let replaced = mkdir(&fs, fs.root_handle(), "y").await;
        assert_eq!(success(getattr(&fs, fs.root_handle()).await).nlink, 4);

        let args =
            file::renameargs { from: at(fs.root_handle(), "x"), to: at(fs.root_handle(), "y") };
        assert_eq!(call(&fs, NFSProgram::NFSPROC_RENAME, &args).await, encode(&nfsstat::NFS_OK));

        assert_eq!(getattr(&fs, replaced.file).await.status(), nfsstat::NFSERR_STALE);
        assert_eq!(success(getattr(&fs, fs.root_handle()).await).nlink, 3);
        let (fh, attr) = fs.lookup(&fs.root_handle(), &"y".into()).await.expect("lookup");
        assert_eq!(fh, moved.file);
        assert_eq!(attr.nlink, 2);
    }

    #[tokio::test]
    async fn rename_directory_between_parents() {
        let fs = memfs();
        let outer = mkdir(&fs, fs.root_handle(), "outer").await;
        let inner = mkdir(&fs, fs.root_handle(), "inner").await;

        let args =
            file::renameargs { from: at(fs.root_handle(), "inner"), to: at(outer.file, "inner") };
        assert_eq!(call(&fs, NFSProgram::NFSPROC_RENAME, &args).await, encode(&nfsstat::NFS_OK));

        assert_eq!(success(getattr(&fs, fs.root_handle()).await).nlink, 3);
        assert_eq!(success(getattr(&fs, outer.file).await).nlink, 3);
        let (parent, _) = fs.lookup(&inner.file, &"..".into()).await.expect("lookup");
        assert_eq!(parent, outer.file);
    }
}
