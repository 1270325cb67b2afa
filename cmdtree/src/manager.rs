//! Command manager
//!
//! Owns one command tree, the execution pipeline and the parser registry.
//! Registration takes a write lock on the tree; resolution and suggestions
//! take read locks, so many senders can be served at once.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cmdtree_services::{ServicePipeline, ServiceResult};

use crate::arguments::{ArgumentBuilder, CommandArgument, CommandInput, ParserParameters, ParserRegistry, SharedParser};
use crate::command::Command;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult, TreeError};
use crate::execution::{CommandExecution, CommandPostprocessingContext, ExecutionOutcome};
use crate::settings::ManagerSettings;
use crate::tree::{CommandId, CommandTree};

/// Entry point for registering and running commands for senders of type `S`
///
/// # Example
///
/// ```rust
/// use cmdtree::{Command, CommandManager, IntegerParser, ManagerSettings};
///
/// let manager = CommandManager::<String>::new(ManagerSettings::default().with_command_prefix("/"));
/// manager
///     .register(
///         Command::builder("add")
///             .required("a", IntegerParser::new())
///             .required("b", IntegerParser::new())
///             .handler(|ctx| {
///                 let sum = ctx.get::<i32>("a").copied().unwrap_or_default()
///                     + ctx.get::<i32>("b").copied().unwrap_or_default();
///                 ctx.store("sum", sum);
///                 Ok(())
///             })
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
///
/// let done = manager.execute("console".to_string(), "/add 2 3").unwrap();
/// assert_eq!(done.context().stored::<i32>("sum"), Some(&5));
/// assert_eq!(manager.suggest("console".to_string(), "/a"), vec!["add"]);
/// ```
pub struct CommandManager<S> {
    tree: RwLock<CommandTree<S>>,
    pipeline: ServicePipeline,
    parsers: RwLock<ParserRegistry<S>>,
    settings: ManagerSettings,
}

impl<S: 'static> Default for CommandManager<S> {
    fn default() -> Self {
        Self::new(ManagerSettings::default())
    }
}

impl<S> std::fmt::Debug for CommandManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("commands", &self.read_tree().len())
            .field("pipeline", &self.pipeline)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<S> CommandManager<S> {
    fn read_tree(&self) -> RwLockReadGuard<'_, CommandTree<S>> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tree(&self) -> RwLockWriteGuard<'_, CommandTree<S>> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: 'static> CommandManager<S> {
    /// Manager with the built-in parsers
    pub fn new(settings: ManagerSettings) -> Self {
        Self {
            tree: RwLock::new(CommandTree::from_settings(&settings)),
            pipeline: ServicePipeline::new(),
            parsers: RwLock::new(ParserRegistry::with_defaults()),
            settings,
        }
    }

    /// Settings in force
    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// The execution pipeline, for registering services of any shape
    pub fn pipeline(&self) -> &ServicePipeline {
        &self.pipeline
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Insert a command into the tree
    pub fn register(&self, command: Command<S>) -> Result<CommandId, TreeError> {
        self.write_tree().insert(command).inspect_err(|err| {
            tracing::warn!(error = %err, "Command rejected");
        })
    }

    /// Register a parser factory under `tag`
    pub fn register_parser<F>(&self, tag: impl Into<String>, factory: F) -> &Self
    where
        F: Fn(&ParserParameters) -> Option<SharedParser<S>> + Send + Sync + 'static,
    {
        self.parsers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(tag, factory);
        self
    }

    /// Build a parser for `tag` from the registry
    pub fn create_parser(&self, tag: &str, params: &ParserParameters) -> Option<SharedParser<S>> {
        self.parsers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .create(tag, params)
    }

    /// Argument builder whose parser comes from the registry
    pub fn argument(
        &self,
        name: impl Into<String>,
        tag: &str,
        params: &ParserParameters,
    ) -> Result<ArgumentBuilder<S>, TreeError> {
        let parser = self
            .create_parser(tag, params)
            .ok_or_else(|| TreeError::UnknownParserType(tag.to_string()))?;
        Ok(CommandArgument::builder(name).shared_parser(parser))
    }

    /// Run `service` before the handler
    ///
    /// Returning [`ServiceResult::Terminate`] stops the chain; the handler and
    /// later services do not run.
    pub fn register_execution_service<F>(&self, name: impl Into<String>, priority: i32, service: F) -> &Self
    where
        F: Fn(&mut CommandExecution<S>) -> anyhow::Result<ServiceResult<ExecutionOutcome>>
            + Send
            + Sync
            + 'static,
    {
        self.pipeline
            .register_named::<CommandExecution<S>, ExecutionOutcome, _>(name, priority, service);
        self
    }

    /// Run `service` after every successful execution
    pub fn register_postprocessor<F>(&self, name: impl Into<String>, priority: i32, service: F) -> &Self
    where
        F: Fn(&mut CommandPostprocessingContext<S>) -> anyhow::Result<ServiceResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.pipeline
            .register_named::<CommandPostprocessingContext<S>, (), _>(name, priority, service);
        self
    }

    /// Registered commands in insertion order
    pub fn commands(&self) -> Vec<Arc<Command<S>>> {
        self.read_tree().commands().cloned().collect()
    }

    /// Commands `sender` may run, with their syntax and description
    pub fn help(&self, sender: &S) -> Vec<(String, Option<String>)> {
        self.read_tree()
            .commands()
            .filter(|command| command.has_permission(sender))
            .map(|command| {
                (
                    command.syntax(),
                    command.description().map(str::to_string),
                )
            })
            .collect()
    }

    // ========================================================================
    // Input handling
    // ========================================================================

    /// Split `line` into tokens, dropping the command prefix and empty tokens
    pub fn tokenize(&self, line: &str) -> CommandInput {
        self.split(line)
            .into_iter()
            .filter(|token| !token.is_empty())
            .collect()
    }

    fn split(&self, line: &str) -> Vec<String> {
        let mut tokens: Vec<String> = line.split(' ').map(str::to_string).collect();
        if let (Some(prefix), Some(first)) = (&self.settings.command_prefix, tokens.first_mut()) {
            if let Some(stripped) = first.strip_prefix(prefix.as_str()) {
                *first = stripped.to_string();
            }
        }
        tokens
    }

    /// Resolve `line` without running anything
    pub fn resolve(&self, ctx: &mut CommandContext<S>, line: &str) -> CommandResult<Arc<Command<S>>> {
        self.read_tree().resolve(ctx, self.tokenize(line))
    }

    /// Resolve and run `line` for `sender`
    ///
    /// Execution services run first, in priority order, then the handler,
    /// then postprocessors. Failures inside any of them are reported as
    /// [`CommandError::Pipeline`].
    pub fn execute(&self, sender: S, line: &str) -> CommandResult<CommandPostprocessingContext<S>> {
        let mut ctx = CommandContext::new(sender);
        let command = self.resolve(&mut ctx, line)?;
        let syntax = command.syntax();

        let mut execution = CommandExecution::new(ctx, command);
        let outcome = self
            .pipeline
            .pump(&mut execution)
            .through::<ExecutionOutcome, _>(|execution| {
                execution.run()?;
                Ok(ExecutionOutcome::Completed)
            })
            .map_err(CommandError::from)?;

        match &outcome {
            ExecutionOutcome::Completed => tracing::debug!(command = %syntax, "Command executed"),
            ExecutionOutcome::Cancelled { reason } => {
                tracing::info!(command = %syntax, reason = %reason, "Command cancelled")
            }
        }

        let mut processed = execution.finish(outcome);
        self.pipeline
            .pump(&mut processed)
            .through::<(), _>(|_| Ok(()))?;
        Ok(processed)
    }

    /// Completions for the last token of `line`
    pub fn suggest(&self, sender: S, line: &str) -> Vec<String> {
        let tokens = self.split(line);
        let mut ctx = CommandContext::for_suggestions(sender);
        let mut suggestions = self.read_tree().suggest(&mut ctx, &tokens);
        if let Some(max) = self.settings.max_suggestions {
            suggestions.truncate(max);
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::registry::keys;
    use crate::arguments::standard::IntegerParser;

    fn manager(settings: ManagerSettings) -> CommandManager<String> {
        let manager = CommandManager::new(settings);
        manager
            .register(
                Command::builder("double")
                    .required("n", IntegerParser::new())
                    .handler(|ctx| {
                        let n = *ctx.get::<i32>("n").unwrap_or(&0);
                        ctx.store("result", n * 2);
                        Ok(())
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        manager
    }

    #[test]
    fn test_prefix_is_stripped() {
        let manager = manager(ManagerSettings::default().with_command_prefix("/"));
        assert_eq!(manager.tokenize("/double  4"), CommandInput::from(vec!["double".to_string(), "4".to_string()]));

        let done = manager.execute("console".into(), "/double 4").unwrap();
        assert_eq!(done.context().stored::<i32>("result"), Some(&8));
        assert!(done.outcome().is_completed());
    }

    #[test]
    fn test_empty_line() {
        let manager = manager(ManagerSettings::default());
        let err = manager.execute("console".into(), "   ").unwrap_err();
        assert!(matches!(err, CommandError::EmptyInput));
    }

    #[test]
    fn test_suggestion_cap() {
        let manager = manager(ManagerSettings::default().with_max_suggestions(3));
        assert_eq!(manager.suggest("console".into(), "double ").len(), 3);
        assert_eq!(manager.suggest("console".into(), "do"), vec!["double"]);
    }

    #[test]
    fn test_argument_from_registry() {
        let manager = manager(ManagerSettings::default());
        let params = ParserParameters::empty().with(keys::MAX, 10);
        let argument = manager.argument("n", "integer", &params).unwrap().build().unwrap();
        manager
            .register(
                Command::builder("small")
                    .argument(argument)
                    .handler(|_| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        assert!(manager.execute("console".into(), "small 3").is_ok());
        assert!(matches!(
            manager.execute("console".into(), "small 30").unwrap_err(),
            CommandError::ArgumentParse { .. }
        ));

        let err = manager
            .argument("n", "uuid", &ParserParameters::empty())
            .err()
            .unwrap();
        assert_eq!(err, TreeError::UnknownParserType("uuid".into()));
    }

    #[test]
    fn test_handler_error_is_wrapped() {
        let manager = manager(ManagerSettings::default());
        manager
            .register(
                Command::builder("fail")
                    .handler(|_| anyhow::bail!("disk full"))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let err = manager.execute("console".into(), "fail").unwrap_err();
        assert_eq!(err.exit_code(), 101);
        match err {
            CommandError::Pipeline(pipeline) => {
                assert_eq!(pipeline.cause().to_string(), "disk full");
            }
            other => panic!("Expected pipeline error, got {:?}", other),
        }
    }

    #[test]
    fn test_help_lists_permitted_commands() {
        let manager = manager(ManagerSettings::default());
        manager
            .register(
                Command::builder("stop")
                    .permission(crate::CommandPermission::predicate("op", |s: &String| s == "op"))
                    .description("Stop the server")
                    .handler(|_| Ok(()))
                    .build()
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(manager.help(&"guest".to_string()).len(), 1);
        let help = manager.help(&"op".to_string());
        assert_eq!(help[1], ("stop".to_string(), Some("Stop the server".to_string())));
        assert_eq!(manager.commands().len(), 2);
    }
}
