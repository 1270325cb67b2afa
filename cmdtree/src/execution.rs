//! Values that flow through the execution pipeline
//!
//! Execution services run over `(CommandExecution<S>, ExecutionOutcome)`; the
//! command handler is the default when no service terminates the chain.
//! Postprocessors then run over `(CommandPostprocessingContext<S>, ())`.

use std::sync::Arc;

use crate::command::Command;
use crate::context::CommandContext;

/// How an execution ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The handler (or a service standing in for it) ran
    Completed,
    /// A service stopped the command before it ran
    Cancelled { reason: String },
}

impl ExecutionOutcome {
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A resolved command about to run
pub struct CommandExecution<S> {
    context: CommandContext<S>,
    command: Arc<Command<S>>,
}

impl<S> CommandExecution<S> {
    pub(crate) fn new(context: CommandContext<S>, command: Arc<Command<S>>) -> Self {
        Self { context, command }
    }

    /// The resolved command
    pub fn command(&self) -> &Arc<Command<S>> {
        &self.command
    }

    /// Context with the argument bindings
    pub fn context(&self) -> &CommandContext<S> {
        &self.context
    }

    /// Mutable context, e.g. to store values for the handler
    pub fn context_mut(&mut self) -> &mut CommandContext<S> {
        &mut self.context
    }

    /// Run the command's handler
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.command.execute(&mut self.context)
    }

    pub(crate) fn finish(self, outcome: ExecutionOutcome) -> CommandPostprocessingContext<S> {
        CommandPostprocessingContext {
            context: self.context,
            command: self.command,
            outcome,
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for CommandExecution<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecution")
            .field("command", &self.command.syntax())
            .field("context", &self.context)
            .finish()
    }
}

/// A command that went through the execution pipeline
///
/// Handed to postprocessors and returned from
/// [`CommandManager::execute`](crate::CommandManager::execute).
pub struct CommandPostprocessingContext<S> {
    context: CommandContext<S>,
    command: Arc<Command<S>>,
    outcome: ExecutionOutcome,
}

impl<S> CommandPostprocessingContext<S> {
    pub fn command(&self) -> &Arc<Command<S>> {
        &self.command
    }

    pub fn context(&self) -> &CommandContext<S> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CommandContext<S> {
        &mut self.context
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    /// Consume, returning the context
    pub fn into_context(self) -> CommandContext<S> {
        self.context
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for CommandPostprocessingContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPostprocessingContext")
            .field("command", &self.command.syntax())
            .field("context", &self.context)
            .field("outcome", &self.outcome)
            .finish()
    }
}
