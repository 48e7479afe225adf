//! TCP listeners for receiver and executer sockets.
//!
//! Each configured [`SocketTarget`](squ_config::SocketTarget) is bound to its
//! own [`SocketListener`], which accepts connections on a background thread
//! and hands each one to a [`ConnectionHandler`] on a thread of its own.

mod errors;
mod handler;
mod listener;
mod set;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::ConnectionHandler;
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::set::ListenerSet;
#[cfg(test)]
pub(crate) use self::test_utils::{Greeting, GreetingRecorder};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
