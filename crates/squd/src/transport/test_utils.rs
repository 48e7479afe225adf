//! Connection handler that reports what each peer sent first.

use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use super::ConnectionHandler;

/// First line of one accepted connection, tagged with the peer address the
/// listener reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Greeting {
    pub(crate) peer: SocketAddr,
    pub(crate) line: String,
}

/// Reads one newline-terminated line per connection and forwards it.
pub(crate) struct GreetingRecorder {
    greetings: Sender<Greeting>,
}

impl GreetingRecorder {
    pub(crate) fn new() -> (Receiver<Greeting>, Self) {
        let (greetings, received) = channel::unbounded();
        (received, Self { greetings })
    }
}

impl ConnectionHandler for GreetingRecorder {
    fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
        let mut line = String::new();
        if BufReader::new(stream).read_line(&mut line).is_ok() {
            let line = line.trim_end().to_owned();
            let _ = self.greetings.send(Greeting { peer, line });
        }
    }
}
