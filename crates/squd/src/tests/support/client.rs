//! Minimal line-protocol client.

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::{Value, json};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends one command per line and reads one answer per line.
pub struct LineClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: i64,
}

impl LineClient {
    pub fn connect(addr: SocketAddr) -> Result<Self, String> {
        let stream = TcpStream::connect(addr).map_err(|error| error.to_string())?;
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|error| error.to_string())?;
        let writer = stream.try_clone().map_err(|error| error.to_string())?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            next_id: 1,
        })
    }

    /// Sends `method` with `params` (encoded as params text) and returns the
    /// decoded answer.
    pub fn call(&mut self, method: &str, params: &Value) -> Result<Value, String> {
        let id = self.next_id;
        self.next_id += 1;
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params.to_string(),
        });
        let mut line = request.to_string();
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .map_err(|error| error.to_string())?;
        let mut answer = String::new();
        self.reader
            .read_line(&mut answer)
            .map_err(|error| error.to_string())?;
        if answer.is_empty() {
            return Err("connection closed before an answer arrived".to_owned());
        }
        serde_json::from_str(&answer).map_err(|error| error.to_string())
    }

    pub fn close(self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// Decodes the `result` text of an answer as JSON.
pub fn result_json(answer: &Value) -> Result<Value, String> {
    let text = answer["result"]
        .as_str()
        .ok_or_else(|| format!("answer has no result text: {answer}"))?;
    serde_json::from_str(text).map_err(|error| error.to_string())
}

/// Error code of an answer, if any.
pub fn error_code(answer: &Value) -> Option<i64> {
    answer.get("error")?.get("code")?.as_i64()
}
