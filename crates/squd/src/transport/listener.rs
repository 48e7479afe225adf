//! Listener implementation for broker sockets.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tracing::{debug, info, warn};

use squ_config::SocketTarget;

use super::{ConnectionHandler, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// Listener bound to one socket target.
#[derive(Debug)]
pub(crate) struct SocketListener {
    target: SocketTarget,
    listener: TcpListener,
    keepalive: Option<Duration>,
}

impl SocketListener {
    pub(crate) fn bind(target: &SocketTarget) -> Result<Self, ListenerError> {
        let listener = bind_tcp(&target.addr, target.port)?;
        Ok(Self {
            target: target.clone(),
            listener,
            keepalive: None,
        })
    }

    /// Enables TCP keep-alive on accepted connections idle for `idle`.
    #[must_use]
    pub(crate) fn with_keepalive(mut self, idle: Duration) -> Self {
        self.keepalive = (!idle.is_zero()).then_some(idle);
        self
    }

    pub(crate) fn target(&self) -> &SocketTarget {
        &self.target
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.listener
            .set_nonblocking(true)
            .map_err(|source| ListenerError::NonBlocking { source })?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let target = self.target.to_string();
        let handle = thread::Builder::new()
            .name(format!("squ-accept-{}", self.target.role))
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &handler))
            .map_err(|source| ListenerError::Spawn { target, source })?;
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => Ok(()),
                Err(_) => Err(ListenerError::ThreadPanic),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
) {
    info!(
        target: LISTENER_TARGET,
        socket = %listener.target,
        local = ?listener.local_addr(),
        "socket listener active"
    );
    let mut last_error = None::<io::ErrorKind>;
    while !shutdown.load(Ordering::SeqCst) {
        match accept_connection(listener) {
            Ok(Some((stream, peer))) => {
                last_error = None;
                info!(
                    target: LISTENER_TARGET,
                    %peer,
                    role = %listener.target.role,
                    "connection accepted"
                );
                let handler = Arc::clone(handler);
                let spawned = thread::Builder::new()
                    .name(format!("squ-conn-{peer}"))
                    .spawn(move || handler.handle(stream, peer));
                if let Err(error) = spawned {
                    warn!(
                        target: LISTENER_TARGET,
                        %peer,
                        error = %error,
                        "failed to spawn connection thread"
                    );
                }
            }
            Ok(None) => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) => {
                let kind = error.kind();
                if last_error != Some(kind) {
                    warn!(
                        target: LISTENER_TARGET,
                        error = %error,
                        "socket accept error"
                    );
                }
                last_error = Some(kind);
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
    info!(
        target: LISTENER_TARGET,
        socket = %listener.target,
        "socket listener stopped"
    );
}

fn accept_connection(
    listener: &SocketListener,
) -> Result<Option<(TcpStream, SocketAddr)>, io::Error> {
    match listener.listener.accept() {
        Ok((stream, peer)) => {
            stream.set_nonblocking(false)?;
            if let Some(idle) = listener.keepalive {
                apply_keepalive(&stream, idle, peer);
            }
            Ok(Some((stream, peer)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn apply_keepalive(stream: &TcpStream, idle: Duration, peer: SocketAddr) {
    let keepalive = TcpKeepalive::new().with_time(idle);
    if let Err(error) = SockRef::from(stream).set_tcp_keepalive(&keepalive) {
        debug!(
            target: LISTENER_TARGET,
            %peer,
            error = %error,
            "failed to enable TCP keep-alive"
        );
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let mut addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?;
    let addr = addrs
        .find(|addr| matches!(addr, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}
