//! Methods served on receiver sockets.

use tracing::{debug, warn};

use crate::protocol::{Answer, AnswerCode, Command};

use super::DISPATCH_TARGET;
use super::context::{DispatchContext, Handled};

/// Queues the command as work when some executer serves its method.
pub(crate) fn handle(context: &DispatchContext, command: Command, peer: &str) -> Handled {
    if !context.registry.exists(&command.method) {
        warn!(target: DISPATCH_TARGET, %peer, %command, "no executer for method");
        return Handled::answer(Answer::error(
            command.id,
            AnswerCode::Unsupported,
            format!("method '{}' is not served by any executer", command.method),
        ));
    }
    debug!(target: DISPATCH_TARGET, %peer, %command, "work queued");
    let answer = Answer::flag(command.id, true);
    context.queues.enqueue(command);
    Handled::answer(answer)
}
