use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nfs2_server::tcp::{NFSTcp, NFSTcpListener};

/// In-memory file system implementation
mod fs;
/// File system entries and their attributes
mod fs_entry;

/// Address used when none is given on the command line
const DEFAULT_BIND: &str = "127.0.0.1:11111";

/// Demo NFS version 2 server exporting an in-memory file system.
///
/// Usage: `memfs [ip:port] [export name]`. Logging is controlled with `RUST_LOG`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let bind = args.next().unwrap_or_else(|| DEFAULT_BIND.to_string());
    let export_name = args.next().unwrap_or_else(|| "/".to_string());

    let memfs = fs::MemFS::default();
    memfs
        .add_file("README", b"This file system lives in memory and is gone on restart.\n")
        .context("seeding the file system")?;

    let mut listener =
        NFSTcpListener::bind(&bind, memfs).await.with_context(|| format!("binding {bind}"))?;
    listener.with_export_name(&export_name);

    let port = listener.get_listen_port();
    println!("Serving NFS version 2 on {}:{}", listener.get_listen_ip(), port);
    println!(
        "You can mount it with: sudo mount -t nfs -o vers=2,proto=tcp,port={port},mountport={port},mountvers=1,mountproto=tcp,nolock {}:{} /mnt/nfs",
        listener.get_listen_ip(),
        export_name
    );

    listener.handle_forever().await?;
    Ok(())
}
