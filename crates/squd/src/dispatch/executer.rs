//! Methods served on executer sockets.

use tracing::{debug, error, warn};

use crate::millis::saturating_millis;
use crate::protocol::{
    Answer, AnswerCode, Command, RegistrationParams, ResultParams, command_timeout,
};
use crate::state::StateUpdate;

use super::DISPATCH_TARGET;
use super::context::{DispatchContext, Handled};

const DEBUG_ONLY: &str = "supported only in debug mode";

/// Control methods understood on an executer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecuterMethod {
    Registration,
    Execute,
    Result,
    Uid,
    Send,
}

impl ExecuterMethod {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "registration" => Some(Self::Registration),
            "execute" => Some(Self::Execute),
            "result" => Some(Self::Result),
            "uid" => Some(Self::Uid),
            "send" => Some(Self::Send),
            _ => None,
        }
    }
}

/// Handles one command received from an executer.
pub(crate) fn handle(context: &DispatchContext, command: Command, peer: &str) -> Handled {
    let Some(method) = ExecuterMethod::parse(&command.method) else {
        warn!(target: DISPATCH_TARGET, %peer, %command, "unknown executer method");
        return Handled::answer(Answer::error(
            command.id,
            AnswerCode::UnknownMethod,
            format!("unknown method '{}'", command.method),
        ));
    };
    match method {
        ExecuterMethod::Registration => register(&command, peer),
        ExecuterMethod::Execute => execute(context, &command, peer),
        ExecuterMethod::Result => acknowledge(context, &command, peer),
        ExecuterMethod::Uid => uid(context, &command),
        ExecuterMethod::Send => send(context, command),
    }
}

fn register(command: &Command, peer: &str) -> Handled {
    match command.params_as::<RegistrationParams>() {
        Ok(params) => {
            debug!(
                target: DISPATCH_TARGET,
                %peer,
                methods = ?params.methods,
                "executer registration"
            );
            Handled::with_update(
                Answer::flag(command.id, true),
                StateUpdate::MethodRegistration {
                    methods: params.methods,
                },
            )
        }
        Err(problem) => {
            error!(target: DISPATCH_TARGET, %peer, error = %problem, "bad registration");
            Handled::answer(Answer::error(0, AnswerCode::Format, problem.to_string()))
        }
    }
}

fn execute(context: &DispatchContext, request: &Command, peer: &str) -> Handled {
    let Some(work) = context.queues.next() else {
        return Handled::answer(Answer::flag(request.id, false));
    };
    let task = context.ids.generate();
    let ttl = command_timeout(&work.params, context.default_timeout);
    debug!(
        target: DISPATCH_TARGET,
        %peer,
        %task,
        command = %work,
        ttl_ms = saturating_millis(ttl),
        "dispatching task"
    );
    let answer = Answer::pack_task(&work, &task);
    if !context.store.push(&task, work.clone(), ttl) {
        error!(target: DISPATCH_TARGET, %peer, %task, "command store refused task");
        // Keep the work for whoever drains the queues next.
        context.queues.redeliver(work);
        return Handled::answer(Answer::error(
            answer.id,
            AnswerCode::Internal,
            "problem with command data storage",
        ));
    }
    Handled::answer(answer)
}

fn acknowledge(context: &DispatchContext, command: &Command, peer: &str) -> Handled {
    match command.params_as::<ResultParams>() {
        Ok(params) => {
            let freed = context.store.free(&params.task);
            if !freed {
                warn!(
                    target: DISPATCH_TARGET,
                    %peer,
                    task = %params.task,
                    "result for unknown or expired task"
                );
            }
            Handled::with_update(
                Answer::flag(command.id, freed),
                StateUpdate::ResultAcknowledgement { task: params.task },
            )
        }
        Err(problem) => {
            warn!(target: DISPATCH_TARGET, %peer, error = %problem, "bad result params");
            Handled::answer(Answer::error(
                command.id,
                AnswerCode::Format,
                problem.to_string(),
            ))
        }
    }
}

fn uid(context: &DispatchContext, command: &Command) -> Handled {
    if !context.debug {
        return Handled::answer(Answer::error(command.id, AnswerCode::Access, DEBUG_ONLY));
    }
    Handled::answer(Answer::ok(command.id, context.ids.generate()))
}

fn send(context: &DispatchContext, command: Command) -> Handled {
    if !context.debug {
        return Handled::answer(Answer::error(command.id, AnswerCode::Access, DEBUG_ONLY));
    }
    let answer = Answer::ok(command.id, context.ids.generate());
    context.queues.enqueue(command);
    Handled::answer(answer)
}
