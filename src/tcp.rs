//! TCP transport serving the NFS version 2 and MOUNT programs on one port.
//!
//! [`NFSTcpListener`] owns the listening socket and the state every
//! connection shares: the backend, the duplicate request cache and the mount
//! list. Each accepted connection gets its own task, which feeds received
//! bytes to an [`rpc::SocketMessageHandler`] and writes its replies back as
//! record-marked fragments.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::protocol::nfs::mount::MountTable;
use crate::protocol::{rpc, xdr};
use crate::vfs::NFSFileSystem;

/// Default time a completed call stays in the duplicate request cache
pub const DEFAULT_RETRANSMISSION_WINDOW: Duration = Duration::from_secs(60);

/// Loopback addresses tried when binding to `auto`
const AUTO_BIND_ATTEMPTS: u16 = 32;

/// Size of the buffer a connection reads into
const READ_BUFFER_SIZE: usize = 128 * 1024;

/// Where to listen, as parsed from an `ip:port` string
#[derive(Debug, PartialEq, Eq)]
enum BindHost {
    /// First free address of the 127.88.x.y range
    Auto,
    Ip(String),
}

fn parse_bind_address(ipstr: &str) -> io::Result<(BindHost, u16)> {
    let (ip, port) = ipstr.rsplit_once(':').ok_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "IP Address must be of form ip:port")
    })?;
    let port = port.parse::<u16>().map_err(|_| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "Port not in range 0..=65535")
    })?;
    let host = match ip {
        "auto" => BindHost::Auto,
        ip => BindHost::Ip(ip.to_string()),
    };
    Ok((host, port))
}

/// Generates a local loopback IP address from a 16-bit host number
/// in the 127.88.x.y range
pub fn generate_host_ip(hostnum: u16) -> String {
    format!("127.88.{}.{}", ((hostnum >> 8) & 0xFF) as u8, (hostnum & 0xFF) as u8)
}

/// Turns `name`, `/name/` or `name/` into `/name`
fn normalize_export_name(export_name: &str) -> String {
    format!("/{}", export_name.trim_matches('/'))
}

/// State shared by every connection of one listener
struct SharedState<T> {
    vfs: Arc<T>,
    mount_signal: Option<mpsc::Sender<bool>>,
    export_name: Arc<String>,
    transaction_tracker: Arc<rpc::TransactionTracker>,
    mount_table: Arc<MountTable>,
}

impl<T: NFSFileSystem + Send + Sync + 'static> SharedState<T> {
    /// Context a new connection from `peer` starts with
    fn context(&self, local_port: u16, peer: SocketAddr) -> rpc::Context {
        rpc::Context {
            local_port,
            client_addr: peer.to_string(),
            auth: xdr::rpc::auth_unix::default(),
            vfs: self.vfs.clone(),
            mount_signal: self.mount_signal.clone(),
            export_name: self.export_name.clone(),
            transaction_tracker: self.transaction_tracker.clone(),
            mount_table: self.mount_table.clone(),
        }
    }
}

/// Listener accepting NFS clients over TCP.
pub struct NFSTcpListener<T: NFSFileSystem + Send + Sync + 'static> {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: SharedState<T>,
}

/// Serves one client connection until either side closes it
async fn serve_connection(socket: TcpStream, context: rpc::Context) -> Result<(), anyhow::Error> {
    let (mut message_handler, mut to_handler, mut replies) =
        rpc::SocketMessageHandler::new(&context);
    if let Err(e) = socket.set_nodelay(true) {
        warn!("Cannot disable Nagle on {}: {:?}", context.client_addr, e);
    }
    let (mut reader, mut writer) = socket.into_split();

    let client_addr = context.client_addr.clone();
    tokio::spawn(async move {
        while let Ok(()) = message_handler.read().await {}
        debug!("Stopped reading records from {}", client_addr);
    });

    let mut buf = vec![0; READ_BUFFER_SIZE];
    loop {
        tokio::select! {
            received = reader.read(&mut buf) => match received? {
                0 => {
                    debug!("{} closed the connection", context.client_addr);
                    return Ok(());
                }
                n => to_handler.write_all(&buf[..n]).await?,
            },
            reply = replies.recv() => match reply {
                Some(Ok(reply)) => rpc::write_fragment(&mut writer, &reply).await.map_err(|e| {
                    error!("Write error to {}: {:?}", context.client_addr, e);
                    e
                })?,
                Some(Err(e)) => return Err(e),
                None => return Err(anyhow::anyhow!("RPC handler of the connection stopped")),
            },
        }
    }
}

/// Operations of a running NFS TCP server.
#[async_trait]
pub trait NFSTcp: Send + Sync {
    /// Returns the port the server listens on.
    ///
    /// Useful after binding to port 0, to learn which port the OS picked.
    fn get_listen_port(&self) -> u16;

    /// Returns the IP address the server listens on, which matters when it
    /// was bound with `auto`.
    fn get_listen_ip(&self) -> IpAddr;

    /// Registers a channel receiving `true` on every MNT and `false` on every
    /// UMNT or UMNTALL.
    fn set_mount_listener(&mut self, signal: mpsc::Sender<bool>);

    /// Accepts connections and serves each one on its own task.
    ///
    /// Only returns if accepting a connection fails.
    async fn handle_forever(&self) -> io::Result<()>;
}

impl<T: NFSFileSystem + Send + Sync + 'static> NFSTcpListener<T> {
    /// Binds a listener serving `fs`.
    ///
    /// `ipstr` is `ip:port`, for example `127.0.0.1:2049`. An ip of `auto`
    /// picks the first free address of the 127.88.x.y loopback range.
    pub async fn bind(ipstr: &str, fs: T) -> io::Result<NFSTcpListener<T>> {
        let (host, port) = parse_bind_address(ipstr)?;
        let vfs = Arc::new(fs);

        let ip = match host {
            BindHost::Ip(ip) => ip,
            BindHost::Auto => {
                let mut last_error = io::Error::other("Can't bind automatically");
                for hostnum in 1..=AUTO_BIND_ATTEMPTS {
                    let ip = generate_host_ip(hostnum);
                    match TcpListener::bind((ip.as_str(), port)).await {
                        Ok(listener) => return NFSTcpListener::new(listener, vfs),
                        Err(e) => {
                            debug!("Cannot bind {}:{}: {:?}", ip, port, e);
                            last_error = e;
                        }
                    }
                }
                return Err(last_error);
            }
        };
        let listener = TcpListener::bind((ip.as_str(), port)).await?;
        NFSTcpListener::new(listener, vfs)
    }

    fn new(listener: TcpListener, vfs: Arc<T>) -> io::Result<NFSTcpListener<T>> {
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);
        Ok(NFSTcpListener {
            listener,
            local_addr,
            state: SharedState {
                vfs,
                mount_signal: None,
                export_name: Arc::new("/".to_string()),
                transaction_tracker: Arc::new(rpc::TransactionTracker::new(
                    DEFAULT_RETRANSMISSION_WINDOW,
                )),
                mount_table: Arc::new(MountTable::default()),
            },
        })
    }

    /// Sets the path clients pass to MNT. Leading and trailing slashes are
    /// normalized, so `data`, `/data` and `/data/` all export `/data`.
    pub fn with_export_name<S: AsRef<str>>(&mut self, export_name: S) {
        self.state.export_name = Arc::new(normalize_export_name(export_name.as_ref()));
    }

    /// Sets how long replies of completed calls are kept for retransmissions.
    ///
    /// Defaults to [`DEFAULT_RETRANSMISSION_WINDOW`]. Clients retransmitting
    /// later than this see the call executed a second time.
    pub fn with_retransmission_window(&mut self, window: Duration) {
        self.state.transaction_tracker = Arc::new(rpc::TransactionTracker::new(window));
    }
}

#[async_trait]
impl<T: NFSFileSystem + Send + Sync + 'static> NFSTcp for NFSTcpListener<T> {
    fn get_listen_port(&self) -> u16 {
        self.local_addr.port()
    }

    fn get_listen_ip(&self) -> IpAddr {
        self.local_addr.ip()
    }

    fn set_mount_listener(&mut self, signal: mpsc::Sender<bool>) {
        self.state.mount_signal = Some(signal);
    }

    async fn handle_forever(&self) -> io::Result<()> {
        loop {
            let (socket, peer) = self.listener.accept().await?;
            let context = self.state.context(self.local_addr.port(), peer);
            info!("Accepting connection from {}", peer);
            tokio::spawn(async move {
                if let Err(e) = serve_connection(socket, context).await {
                    debug!("Connection from {} closed: {:?}", peer, e);
                }
            });
        }
    }
}
