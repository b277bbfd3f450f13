mod support;

use nfs2_server::protocol::nfs::v2::{handle_call, DispatchError};
use nfs2_server::vfs::{FileIdHandles, NFSFileSystem};
use nfs2_server::xdr::nfs2::{
    self, dir, file, diropargs, ftype, nfscookie, nfsres, nfsstat, sattr, timeval, NFSProgram,
};
use nfs2_server::xdr::Serialize;

use support::{decode, encode, TestFS};

async fn call(fs: &TestFS, proc: NFSProgram, args: &[u8]) -> Vec<u8> {
    handle_call(fs, proc as u32, args).await.expect("handle_call")
}

async fn readdir(fs: &TestFS, cookie: nfscookie, count: u32) -> Vec<u8> {
    let args = encode(&dir::readdirargs { dir: fs.root_handle(), cookie, count });
    call(fs, NFSProgram::NFSPROC_READDIR, &args).await
}

fn names(ok: &dir::readdirok) -> Vec<String> {
    ok.entries.iter().map(|e| String::from_utf8_lossy(&e.name).into_owned()).collect()
}

#[tokio::test]
async fn obsolete_procedures_have_empty_results() {
    let fs = TestFS::default();
    let obsolete =
        [NFSProgram::NFSPROC_NULL, NFSProgram::NFSPROC_ROOT, NFSProgram::NFSPROC_WRITECACHE];
    for proc in obsolete {
        assert!(call(&fs, proc, &[]).await.is_empty());
    }
    assert!(fs.calls().is_empty());
}

#[tokio::test]
async fn unknown_procedure_is_an_error() {
    let fs = TestFS::default();
    let err = handle_call(&fs, 18, &[]).await.expect_err("procedure 18 does not exist");
    assert!(matches!(err, DispatchError::UnknownProcedure(18)));
}

#[tokio::test]
async fn getattr_and_stale_handles() {
    let fs = TestFS::with_files(&["a"]);

    let body = call(&fs, NFSProgram::NFSPROC_GETATTR, &encode(&fs.root_handle())).await;
    let res = decode::<nfs2::attrstat>(&body);
    match res {
        nfsres::Success(attr) => assert_eq!(attr.ftype, ftype::NFDIR),
        other => panic!("unexpected result {other:?}"),
    }

    // minted by a server that has since restarted
    let stale = FileIdHandles::new(1).id_to_fh(2);
    let body = call(&fs, NFSProgram::NFSPROC_GETATTR, &encode(&stale)).await;
    let res = decode::<nfs2::attrstat>(&body);
    assert_eq!(res.status(), nfsstat::NFSERR_STALE);
}

#[tokio::test]
async fn undecodable_arguments_answer_io_error() {
    let fs = TestFS::default();
    let body = call(&fs, NFSProgram::NFSPROC_GETATTR, &[0u8; 10]).await;
    assert_eq!(body, encode(&nfsstat::NFSERR_IO));
    assert!(fs.calls().is_empty());
}

#[tokio::test]
async fn oversized_write_never_reaches_backend() {
    let fs = TestFS::with_files(&["a"]);

    let mut args = encode(&fs.handle("a"));
    for word in [0u32, 0, 0, 8193] {
        args.extend_from_slice(&word.to_be_bytes());
    }
    args.extend_from_slice(&[0u8; 8196]);

    let body = call(&fs, NFSProgram::NFSPROC_WRITE, &args).await;
    assert_eq!(decode::<nfsstat>(&body), nfsstat::NFSERR_IO);
    assert!(fs.calls().is_empty());
}

#[tokio::test]
async fn lookup_reports_missing_names() {
    let fs = TestFS::with_files(&["a"]);

    let args = encode(&diropargs { dir: fs.root_handle(), name: "a".into() });
    match decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_LOOKUP, &args).await) {
        nfsres::Success(ok) => {
            assert_eq!(ok.file, fs.handle("a"));
            assert_eq!(ok.attributes, fs.attr("a"));
        }
        other => panic!("unexpected result {other:?}"),
    }

    let args = encode(&diropargs { dir: fs.root_handle(), name: "b".into() });
    let res = decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_LOOKUP, &args).await);
    assert_eq!(res.status(), nfsstat::NFSERR_NOENT);

    // looking up inside a regular file
    let args = encode(&diropargs { dir: fs.handle("a"), name: "b".into() });
    let res = decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_LOOKUP, &args).await);
    assert_eq!(res.status(), nfsstat::NFSERR_NOTDIR);
}

#[tokio::test]
async fn create_refuses_bound_names() {
    let fs = TestFS::with_files(&["a"]);

    let args = encode(&file::createargs {
        location: diropargs { dir: fs.root_handle(), name: "a".into() },
        attributes: sattr::default(),
    });
    let res = decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_CREATE, &args).await);
    assert_eq!(res.status(), nfsstat::NFSERR_EXIST);
    assert!(fs.mutating_calls().is_empty());

    let args = encode(&file::createargs {
        location: diropargs { dir: fs.root_handle(), name: "b".into() },
        attributes: sattr::default(),
    });
    match decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_CREATE, &args).await) {
        nfsres::Success(ok) => assert_eq!(ok.file, fs.handle("b")),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(fs.mutating_calls(), vec!["create"]);
}

#[tokio::test]
async fn setattr_leaves_ignored_fields_alone() {
    let fs = TestFS::default();
    let fh = fs.add_file("a", b"0123456789");
    let before = fs.attr("a");

    let args = encode(&file::sattrargs { file: fh, attributes: sattr::default() });
    let res = decode::<nfs2::attrstat>(&call(&fs, NFSProgram::NFSPROC_SETATTR, &args).await);
    assert_eq!(res, nfsres::Success(before));

    let attributes = sattr {
        size: Some(4),
        mtime: Some(timeval { seconds: 1000, useconds: 0 }),
        ..Default::default()
    };
    let args = encode(&file::sattrargs { file: fh, attributes });
    match decode::<nfs2::attrstat>(&call(&fs, NFSProgram::NFSPROC_SETATTR, &args).await) {
        nfsres::Success(attr) => {
            assert_eq!(attr.size, 4);
            assert_eq!(attr.mtime, timeval { seconds: 1000, useconds: 0 });
            assert_eq!(attr.mode, before.mode);
            assert_eq!(attr.atime, before.atime);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn write_then_read() {
    let fs = TestFS::default();
    let fh = fs.add_file("a", b"");

    let args = encode(&file::writeargs {
        file: fh,
        beginoffset: 0,
        offset: 4,
        totalcount: 0,
        data: b"data".to_vec().into(),
    });
    match decode::<nfs2::attrstat>(&call(&fs, NFSProgram::NFSPROC_WRITE, &args).await) {
        nfsres::Success(attr) => assert_eq!(attr.size, 8),
        other => panic!("unexpected result {other:?}"),
    }

    let args = encode(&file::readargs { file: fh, offset: 2, count: 100, totalcount: 0 });
    match decode::<file::readres>(&call(&fs, NFSProgram::NFSPROC_READ, &args).await) {
        nfsres::Success(ok) => assert_eq!(&ok.data[..], b"\0\0data"),
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn read_is_clamped_to_maxdata() {
    let fs = TestFS::default();
    let fh = fs.add_file("big", &vec![7u8; 3 * nfs2::MAXDATA]);

    let args = encode(&file::readargs { file: fh, offset: 0, count: 20_000, totalcount: 0 });
    match decode::<file::readres>(&call(&fs, NFSProgram::NFSPROC_READ, &args).await) {
        nfsres::Success(ok) => assert_eq!(ok.data.len(), nfs2::MAXDATA),
        other => panic!("unexpected result {other:?}"),
    }

    // past the end of the file
    let args = encode(&file::readargs { file: fh, offset: 100_000, count: 10, totalcount: 0 });
    match decode::<file::readres>(&call(&fs, NFSProgram::NFSPROC_READ, &args).await) {
        nfsres::Success(ok) => assert!(ok.data.is_empty()),
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn read_only_backend_refuses_changes() {
    let fs = TestFS::with_files(&["a"]).read_only();
    let root = fs.root_handle();

    let calls: Vec<(NFSProgram, Vec<u8>)> = vec![
        (
            NFSProgram::NFSPROC_SETATTR,
            encode(&file::sattrargs { file: fs.handle("a"), attributes: sattr::default() }),
        ),
        (
            NFSProgram::NFSPROC_WRITE,
            encode(&file::writeargs {
                file: fs.handle("a"),
                data: b"x".to_vec().into(),
                ..Default::default()
            }),
        ),
        (
            NFSProgram::NFSPROC_CREATE,
            encode(&file::createargs {
                location: diropargs { dir: root, name: "b".into() },
                attributes: sattr::default(),
            }),
        ),
        (NFSProgram::NFSPROC_REMOVE, encode(&diropargs { dir: root, name: "a".into() })),
        (NFSProgram::NFSPROC_RMDIR, encode(&diropargs { dir: root, name: "a".into() })),
        (
            NFSProgram::NFSPROC_RENAME,
            encode(&file::renameargs {
                from: diropargs { dir: root, name: "a".into() },
                to: diropargs { dir: root, name: "c".into() },
            }),
        ),
    ];
    for (proc, args) in calls {
        let body = call(&fs, proc, &args).await;
        assert_eq!(decode::<nfsstat>(&body[..4]), nfsstat::NFSERR_ROFS, "{proc:?}");
    }
    assert!(fs.mutating_calls().is_empty());
    assert_eq!(fs.names(), vec!["a"]);
}

#[tokio::test]
async fn status_only_procedures() {
    let fs = TestFS::with_files(&["a", "b"]);
    let root = fs.root_handle();

    let args = encode(&file::renameargs {
        from: diropargs { dir: root, name: "a".into() },
        to: diropargs { dir: root, name: "c".into() },
    });
    let body = call(&fs, NFSProgram::NFSPROC_RENAME, &args).await;
    assert_eq!(body, encode(&nfsstat::NFS_OK));
    assert_eq!(fs.names(), vec!["c", "b"]);

    let args = encode(&diropargs { dir: root, name: "b".into() });
    let body = call(&fs, NFSProgram::NFSPROC_REMOVE, &args).await;
    assert_eq!(body, encode(&nfsstat::NFS_OK));
    let body = call(&fs, NFSProgram::NFSPROC_REMOVE, &args).await;
    assert_eq!(body, encode(&nfsstat::NFSERR_NOENT));

    let args = encode(&file::linkargs {
        from: fs.handle("c"),
        to: diropargs { dir: root, name: "d".into() },
    });
    let body = call(&fs, NFSProgram::NFSPROC_LINK, &args).await;
    assert_eq!(body, encode(&nfsstat::NFSERR_PERM));
}

#[tokio::test]
async fn readdir_continues_from_cookie() {
    let fs = TestFS::with_files(&["a", "b", "c"]);

    let body = readdir(&fs, nfscookie::START, 4096).await;
    let ok = match decode::<dir::readdirres>(&body) {
        nfsres::Success(ok) => ok,
        other => panic!("unexpected result {other:?}"),
    };
    assert_eq!(names(&ok), vec!["a", "b", "c"]);
    assert!(ok.eof);

    let last = ok.entries[2].cookie;
    let body = readdir(&fs, last, 4096).await;
    assert_eq!(
        decode::<dir::readdirres>(&body),
        nfsres::Success(dir::readdirok { entries: vec![], eof: true })
    );
}

#[tokio::test]
async fn readdir_respects_byte_budget() {
    let fs = TestFS::with_files(&["a", "b", "c"]);

    // status, one 20-byte entry and the trailer fit, a second entry does not
    let body = readdir(&fs, nfscookie::START, 50).await;
    assert!(body.len() <= 50);
    let ok = match decode::<dir::readdirres>(&body) {
        nfsres::Success(ok) => ok,
        other => panic!("unexpected result {other:?}"),
    };
    assert_eq!(names(&ok), vec!["a"]);
    assert!(!ok.eof);

    let body = readdir(&fs, ok.entries[0].cookie, 4096).await;
    match decode::<dir::readdirres>(&body) {
        nfsres::Success(ok) => {
            assert_eq!(names(&ok), vec!["b", "c"]);
            assert!(ok.eof);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn readdir_budget_below_one_entry() {
    let fs = TestFS::with_files(&["a", "b"]);

    // status and trailer take 12 bytes, the entry for "a" another 20
    for count in [8, 12, 31] {
        let body = readdir(&fs, nfscookie::START, count).await;
        assert_eq!(body, encode(&nfsstat::NFSERR_IO), "count {count}");
    }

    let body = readdir(&fs, nfscookie::START, 32).await;
    assert_eq!(body.len(), 32);
    let ok = match decode::<dir::readdirres>(&body) {
        nfsres::Success(ok) => ok,
        other => panic!("unexpected result {other:?}"),
    };
    assert_eq!(names(&ok), vec!["a"]);
    assert!(!ok.eof);

    // an exhausted directory still fits in the bare 12 bytes
    let body = readdir(&fs, nfscookie::from(2), 12).await;
    assert_eq!(
        decode::<dir::readdirres>(&body),
        nfsres::Success(dir::readdirok { entries: vec![], eof: true })
    );
}

#[tokio::test]
async fn readdir_skips_names_too_long_to_encode() {
    let long = "x".repeat(nfs2::MAXNAMLEN + 1);
    let fs = TestFS::with_files(&["a", long.as_str(), "b"]);

    let body = readdir(&fs, nfscookie::START, 4096).await;
    match decode::<dir::readdirres>(&body) {
        nfsres::Success(ok) => {
            assert_eq!(names(&ok), vec!["a", "b"]);
            assert!(ok.eof);
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn statfs_defaults_to_protocol_transfer_size() {
    let fs = TestFS::default();
    let body = call(&fs, NFSProgram::NFSPROC_STATFS, &encode(&fs.root_handle())).await;
    match decode::<nfs2::fs::statfsres>(&body) {
        nfsres::Success(ok) => assert_eq!(ok.tsize, nfs2::MAXDATA as u32),
        other => panic!("unexpected result {other:?}"),
    }
}

#[tokio::test]
async fn backend_failures_become_statuses() {
    let fs = TestFS::default();
    let root = fs.root_handle();

    let args = encode(&file::createargs {
        location: diropargs { dir: root, name: "d".into() },
        attributes: sattr::default(),
    });
    let res = decode::<nfs2::diropres>(&call(&fs, NFSProgram::NFSPROC_MKDIR, &args).await);
    assert_eq!(res.status(), nfsstat::NFSERR_NOSPC);

    let body = call(&fs, NFSProgram::NFSPROC_READLINK, &encode(&root)).await;
    let res = decode::<nfs2::readlinkres>(&body);
    assert_eq!(res.status(), nfsstat::NFSERR_IO);

    let mut buf = Vec::new();
    nfsstat::NFSERR_NOENT.serialize(&mut buf).expect("encode");
    let args = encode(&diropargs { dir: root, name: "d".into() });
    assert_eq!(call(&fs, NFSProgram::NFSPROC_RMDIR, &args).await, buf);
}
