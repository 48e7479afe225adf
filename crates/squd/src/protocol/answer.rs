//! Outbound answer envelope.

use serde::{Deserialize, Serialize};

use super::JSONRPC_VERSION;
use super::command::Command;
use super::errors::ProtocolError;

/// Distinguishing codes carried by error answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerCode {
    /// The request line or its params could not be parsed.
    Format,
    /// The broker could not accept the command (store shutting down).
    Internal,
    /// A debug-only method was called with debug mode disabled.
    Access,
    /// A task command could not be serialised.
    Encode,
    /// No connected executer advertises the requested method.
    Unsupported,
    /// The method is not served on this socket role.
    UnknownMethod,
}

impl AnswerCode {
    /// Numeric value placed on the wire.
    pub const fn code(self) -> i32 {
        match self {
            Self::Format => 1,
            Self::Internal => 2,
            Self::Access => 3,
            Self::Encode => 4,
            Self::Unsupported => 5,
            Self::UnknownMethod => 6,
        }
    }
}

/// Error member of a failed answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    /// Numeric [`AnswerCode`].
    pub code: i32,
    /// Human readable explanation.
    pub message: String,
}

/// Reply to exactly one inbound command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Protocol version, always `"2.0"` on answers the broker builds.
    pub jsonrpc: String,
    /// Id of the command being answered.
    pub id: i64,
    /// `"true"`, `"false"` or an encoded task command.
    #[serde(default)]
    pub result: String,
    /// Failure description; absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescription>,
}

impl Answer {
    /// Builds a successful answer.
    pub fn ok(id: i64, result: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: result.into(),
            error: None,
        }
    }

    /// Builds an error answer.
    pub fn error(id: i64, code: AnswerCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: String::new(),
            error: Some(ErrorDescription {
                code: code.code(),
                message: message.into(),
            }),
        }
    }

    /// Builds the `{"ok": <flag>}` acknowledgement used by control methods.
    pub fn flag(id: i64, ok: bool) -> Self {
        Self::ok(id, if ok { r#"{"ok": true}"# } else { r#"{"ok": false}"# })
    }

    /// Wraps a command and its task id into the answer handed to an executer.
    ///
    /// Serialisation failures are reported in-band with [`AnswerCode::Encode`].
    pub fn pack_task(command: &Command, task: &str) -> Self {
        let packed = TaskCommand {
            command: command.clone(),
            task: task.to_owned(),
        };
        match serde_json::to_string(&packed) {
            Ok(result) => Self::ok(command.id, result),
            Err(error) => Self::error(
                command.id,
                AnswerCode::Encode,
                format!("problem with task command: {error}"),
            ),
        }
    }

    /// Returns true when the answer carries an error member.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serialises the answer as one newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialisation fails.
    pub fn to_line(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// A dispatched command tagged with the task id the executer must report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCommand {
    /// The command as the receiver submitted it.
    #[serde(flatten)]
    pub command: Command,
    /// Task id to echo back in `result`.
    pub task: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_answers_omit_error_member() {
        let line = Answer::ok(4, "done").to_line().expect("encode");
        let text = String::from_utf8(line).expect("utf8");
        assert!(text.ends_with('\n'));
        assert!(!text.contains("error"));
        assert!(text.contains(r#""result":"done""#));
    }

    #[test]
    fn error_answers_carry_code_and_message() {
        let answer = Answer::error(9, AnswerCode::Internal, "store closed");
        let text = String::from_utf8(answer.to_line().expect("encode")).expect("utf8");
        assert!(text.contains(r#""code":2"#));
        assert!(text.contains("store closed"));
        assert!(answer.is_error());
    }

    #[test]
    fn packed_task_embeds_command_and_task() {
        let command = Command::new(12, "render").with_params(r#"{"timeout":2}"#);
        let answer = Answer::pack_task(&command, "abc123");
        assert_eq!(answer.id, 12);

        let packed: TaskCommand = serde_json::from_str(&answer.result).expect("decode task");
        assert_eq!(packed.task, "abc123");
        assert_eq!(packed.command, command);
    }
}
