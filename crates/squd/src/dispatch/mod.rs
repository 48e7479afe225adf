//! Per-connection command dispatch.
//!
//! Receiver sockets accept any method as work: it is queued when some
//! executer currently serves the method and refused otherwise. Executer
//! sockets understand a fixed set of control methods:
//!
//! | method         | effect                                                  |
//! | -------------- | ------------------------------------------------------- |
//! | `registration` | advertise `params.methods` for this connection          |
//! | `execute`      | take the next command and park it in the store as a task |
//! | `result`       | acknowledge `params.task`, removing it from the store   |
//! | `uid`          | debug only: return a fresh task id                      |
//! | `send`         | debug only: queue the request itself as work            |
//!
//! A request line that fails to parse is answered with code 1 and the
//! connection carries on. IO errors and oversized lines end the connection.

mod context;
mod errors;
mod executer;
mod handler;
mod receiver;
mod response;

pub use self::context::{DispatchContext, Handled};
pub use self::errors::DispatchError;
pub use self::handler::DispatchConnectionHandler;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
