//! Line-delimited JSON envelope shared by receivers and executers.
//!
//! Every request line is a [`Command`]; every request gets exactly one
//! [`Answer`] line back. Executers receive work as a [`TaskCommand`] encoded
//! into the `result` member of the answer to their `execute` call.

mod answer;
mod command;
mod errors;
mod params;

pub use self::answer::{Answer, AnswerCode, ErrorDescription, TaskCommand};
pub use self::command::Command;
pub use self::errors::ProtocolError;
pub(crate) use self::params::{RegistrationParams, ResultParams, command_timeout};

/// Version tag written on every outbound message.
pub const JSONRPC_VERSION: &str = "2.0";
