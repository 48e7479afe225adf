//! Connection handling abstraction for the listeners.

use std::net::{SocketAddr, TcpStream};

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one connection until the peer goes away. Runs on a dedicated
    /// thread; implementations should avoid panicking.
    fn handle(&self, stream: TcpStream, peer: SocketAddr);
}
