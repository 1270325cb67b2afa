//! Error types
//!
//! [`CommandError`] covers everything that can go wrong while resolving or
//! dispatching user input. [`TreeError`] covers invalid command definitions
//! and is raised when registering commands.

use cmdtree_services::PipelineError;
use thiserror::Error;

use crate::arguments::ArgumentParseError;

/// Result type for resolution and dispatch
pub type CommandResult<T> = Result<T, CommandError>;

/// Failures while resolving or dispatching a command
#[derive(Debug, Error)]
pub enum CommandError {
    /// No tokens were given
    #[error("No command was given")]
    EmptyInput,

    /// An argument value was invalid
    #[error("Invalid value for argument '{argument}': {source}")]
    ArgumentParse {
        argument: String,
        #[source]
        source: ArgumentParseError,
    },

    /// A required argument had no input and no default
    #[error("Missing required argument '{argument}'. Usage: {syntax}")]
    MissingArgument { argument: String, syntax: String },

    /// A token matched no node at its depth
    #[error("Unknown command '{token}'")]
    UnrecognizedCommand { token: String },

    /// Input remained after a complete command
    #[error("Too many arguments: {}. Usage: {syntax}", .extra.join(" "))]
    TooManyArguments { extra: Vec<String>, syntax: String },

    /// Input ended before reaching an executable command
    #[error("Incomplete command. Usage: {syntax}")]
    InvalidSyntax { syntax: String },

    /// The sender failed a permission check
    #[error("No permission to use '{path}'")]
    NoPermission { path: String },

    /// A service or the handler failed unexpectedly
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl CommandError {
    /// Exit code for this error: 1 for bad input, 101 for internal failures
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Pipeline(_) => 101,
            _ => 1,
        }
    }

    /// Whether the error was caused by what the sender typed
    pub fn is_user_error(&self) -> bool {
        !matches!(self, CommandError::Pipeline(_))
    }

    pub(crate) fn parse_error(argument: impl Into<String>, source: ArgumentParseError) -> Self {
        CommandError::ArgumentParse {
            argument: argument.into(),
            source,
        }
    }
}

/// Invalid command definitions, reported at registration time
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Argument names must be non-empty and alphanumeric
    #[error("Argument name '{0}' must be alphanumeric")]
    InvalidArgumentName(String),

    /// Literal names must be non-empty and contain no whitespace
    #[error("Literal '{0}' must be non-empty and contain no whitespace")]
    InvalidLiteral(String),

    /// A command needs at least one component
    #[error("A command needs at least one literal")]
    EmptyCommand,

    /// The first component of a command must be a literal
    #[error("Command must start with a literal, found argument '{0}'")]
    RootNotLiteral(String),

    /// A required component follows an optional argument
    #[error("Required component '{component}' follows optional argument '{optional}'")]
    RequiredAfterOptional { component: String, optional: String },

    /// No parser was set on an argument
    #[error("Argument '{0}' has no parser")]
    MissingParser(String),

    /// No handler was set on a command
    #[error("Command '{0}' has no handler")]
    MissingHandler(String),

    /// The exact same path is already registered
    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),

    /// Sibling nodes cannot be told apart under the configured policy
    #[error("Ambiguous node under '{parent}': '{existing}' conflicts with '{new}'")]
    AmbiguousPath {
        parent: String,
        existing: String,
        new: String,
    },

    /// A literal name or alias is already used by a sibling
    #[error("Literal '{name}' under '{parent}' collides with an existing name or alias")]
    LiteralCollision { parent: String, name: String },

    /// Unknown parser type tag
    #[error("No parser registered for type '{0}'")]
    UnknownParserType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = CommandError::UnrecognizedCommand {
            token: "nope".into(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.is_user_error());

        let err = CommandError::Pipeline(PipelineError::new(anyhow::anyhow!("boom")));
        assert_eq!(err.exit_code(), 101);
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_too_many_arguments_message() {
        let err = CommandError::TooManyArguments {
            extra: vec!["a".into(), "b".into()],
            syntax: "cmd <x>".into(),
        };
        assert_eq!(err.to_string(), "Too many arguments: a b. Usage: cmd <x>");
    }
}
