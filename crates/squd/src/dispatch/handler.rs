//! Connection handler that answers line-delimited commands.
//!
//! Each connection runs on its own thread. Lines are read one at a time,
//! parsed into [`Command`]s, handled according to the socket role and
//! answered with exactly one [`Answer`] line. State updates produced along
//! the way are recorded in a [`StateRecorder`], which rolls them back when the
//! connection ends, however it ends.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use tracing::{debug, info, warn};

use squ_config::ConnectionRole;

use crate::protocol::{Answer, AnswerCode, Command};
use crate::state::StateRecorder;
use crate::transport::ConnectionHandler;

use super::context::{DispatchContext, Handled};
use super::errors::DispatchError;
use super::response::ResponseWriter;
use super::{DISPATCH_TARGET, executer, receiver};

/// Maximum size of a single request line in bytes.
pub(crate) const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Serves one socket role against the shared broker state.
#[derive(Debug)]
pub struct DispatchConnectionHandler {
    role: ConnectionRole,
    context: Arc<DispatchContext>,
}

impl DispatchConnectionHandler {
    /// Creates a handler serving the methods of `role`.
    pub fn new(role: ConnectionRole, context: Arc<DispatchContext>) -> Self {
        Self { role, context }
    }

    /// Role of the socket this handler serves.
    pub fn role(&self) -> ConnectionRole {
        self.role
    }

    /// Routes a parsed command to the handlers of this socket's role.
    pub(crate) fn handle_command(&self, command: Command, peer: &str) -> Handled {
        match self.role {
            ConnectionRole::Receiver => receiver::handle(&self.context, command, peer),
            ConnectionRole::Executer => executer::handle(&self.context, command, peer),
        }
    }

    /// Answers one request line, or returns `None` for a blank line.
    pub(crate) fn answer_line(
        &self,
        line: &[u8],
        peer: &str,
        recorder: &mut StateRecorder,
    ) -> Option<Answer> {
        if line.trim_ascii().is_empty() {
            return None;
        }
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "command parse problem");
                return Some(Answer::error(0, AnswerCode::Format, error.to_string()));
            }
        };
        debug!(target: DISPATCH_TARGET, %peer, %command, role = %self.role, "command received");

        let Handled { answer, update } = self.handle_command(command, peer);
        if let Some(update) = update {
            recorder.record(update);
        }
        Some(answer)
    }

    /// Runs the read loop until the peer disconnects or an IO error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error when reading or writing fails, or when a line exceeds
    /// [`MAX_REQUEST_BYTES`].
    pub(crate) fn serve<R, W>(
        &self,
        mut reader: R,
        writer: W,
        peer: &str,
    ) -> Result<usize, DispatchError>
    where
        R: BufRead,
        W: Write,
    {
        let mut recorder = StateRecorder::new(Arc::clone(&self.context.registry));
        let mut writer = ResponseWriter::new(writer);
        let mut line = Vec::new();
        loop {
            line.clear();
            if read_request_line(&mut reader, &mut line)? == 0 {
                debug!(
                    target: DISPATCH_TARGET,
                    %peer,
                    rollback = recorder.pending(),
                    "peer closed connection"
                );
                return Ok(writer.written());
            }
            if let Some(answer) = self.answer_line(&line, peer, &mut recorder) {
                writer.write_answer(&answer)?;
            }
        }
    }
}

impl ConnectionHandler for DispatchConnectionHandler {
    fn handle(&self, stream: TcpStream, peer: SocketAddr) {
        let peer = peer.to_string();
        let reader = match stream.try_clone() {
            Ok(reader) => BufReader::new(reader),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %peer, %error, "failed to clone stream");
                return;
            }
        };
        match self.serve(reader, stream, &peer) {
            Ok(written) => info!(
                target: DISPATCH_TARGET,
                %peer,
                role = %self.role,
                written,
                "connection closed"
            ),
            Err(error) => warn!(
                target: DISPATCH_TARGET,
                %peer,
                role = %self.role,
                %error,
                "connection terminated"
            ),
        }
    }
}

/// Reads one newline-terminated line into `line`, returning the bytes read.
///
/// Returns `Ok(0)` at end of stream. A final line without a newline is
/// returned as-is.
fn read_request_line<R: BufRead>(
    reader: &mut R,
    line: &mut Vec<u8>,
) -> Result<usize, DispatchError> {
    let limit = u64::try_from(MAX_REQUEST_BYTES + 1).unwrap_or(u64::MAX);
    let read = reader.by_ref().take(limit).read_until(b'\n', line)?;
    if read > MAX_REQUEST_BYTES && line.last() != Some(&b'\n') {
        return Err(DispatchError::RequestTooLarge {
            max_size: MAX_REQUEST_BYTES,
        });
    }
    Ok(read)
}
