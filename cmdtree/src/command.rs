//! Command definitions
//!
//! A [`Command`] is an ordered list of components (literals and arguments),
//! a handler, an optional permission and an optional description. Commands
//! are built with [`CommandBuilder`], which checks the definition before it
//! ever reaches the tree.

use std::fmt;
use std::sync::Arc;

use crate::arguments::{ArgumentParser, CommandArgument};
use crate::context::CommandContext;
use crate::error::TreeError;
use crate::permission::CommandPermission;

/// Body of a command
pub type CommandHandler<S> = Arc<dyn Fn(&mut CommandContext<S>) -> anyhow::Result<()> + Send + Sync>;

/// Whether `name` can be used as a literal or alias
pub fn is_valid_literal(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

/// One position in a command's syntax
pub enum CommandComponent<S> {
    /// Fixed keyword with optional aliases
    Literal { name: String, aliases: Vec<String> },
    /// Typed argument
    Argument(CommandArgument<S>),
}

impl<S> CommandComponent<S> {
    /// Literal without aliases
    pub fn literal(name: impl Into<String>) -> Self {
        Self::Literal {
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    /// Literal name, `None` for arguments
    pub fn literal_name(&self) -> Option<&str> {
        match self {
            Self::Literal { name, .. } => Some(name),
            Self::Argument(_) => None,
        }
    }

    /// The argument, `None` for literals
    pub fn as_argument(&self) -> Option<&CommandArgument<S>> {
        match self {
            Self::Argument(argument) => Some(argument),
            Self::Literal { .. } => None,
        }
    }

    /// Literal name, or `<arg>` / `[arg]`
    pub fn syntax(&self) -> String {
        match self {
            Self::Literal { name, .. } => name.clone(),
            Self::Argument(argument) => argument.syntax(),
        }
    }

    fn is_required(&self) -> bool {
        match self {
            Self::Literal { .. } => true,
            Self::Argument(argument) => argument.is_required(),
        }
    }
}

impl<S> Clone for CommandComponent<S> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal { name, aliases } => Self::Literal {
                name: name.clone(),
                aliases: aliases.clone(),
            },
            Self::Argument(argument) => Self::Argument(argument.clone()),
        }
    }
}

impl<S> fmt::Debug for CommandComponent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { name, aliases } => f
                .debug_struct("Literal")
                .field("name", name)
                .field("aliases", aliases)
                .finish(),
            Self::Argument(argument) => f.debug_tuple("Argument").field(argument).finish(),
        }
    }
}

/// A complete, executable command
pub struct Command<S> {
    components: Vec<CommandComponent<S>>,
    handler: CommandHandler<S>,
    permission: Option<CommandPermission<S>>,
    description: Option<String>,
}

impl<S> Command<S> {
    /// Start a command rooted at the literal `name`
    pub fn builder(name: impl Into<String>) -> CommandBuilder<S> {
        CommandBuilder::new(name)
    }

    /// Components in order, root literal first
    pub fn components(&self) -> &[CommandComponent<S>] {
        &self.components
    }

    /// Arguments in order
    pub fn arguments(&self) -> impl Iterator<Item = &CommandArgument<S>> {
        self.components.iter().filter_map(CommandComponent::as_argument)
    }

    /// Name of the root literal
    pub fn name(&self) -> &str {
        self.components
            .first()
            .and_then(CommandComponent::literal_name)
            .unwrap_or_default()
    }

    /// Permission required by this command, if any
    pub fn permission(&self) -> Option<&CommandPermission<S>> {
        self.permission.as_ref()
    }

    /// Whether `sender` may run this command
    pub fn has_permission(&self, sender: &S) -> bool {
        self.permission
            .as_ref()
            .map_or(true, |permission| permission.has_permission(sender))
    }

    /// Human readable description
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Rendered syntax, e.g. `group one <x> [b]`
    pub fn syntax(&self) -> String {
        self.components
            .iter()
            .map(CommandComponent::syntax)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the handler
    pub fn execute(&self, ctx: &mut CommandContext<S>) -> anyhow::Result<()> {
        (self.handler)(ctx)
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("syntax", &self.syntax())
            .field("permission", &self.permission)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<S> fmt::Display for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.syntax())
    }
}

/// Builder for [`Command`]
///
/// Errors from individual steps are kept and reported by [`build`](Self::build).
///
/// # Example
///
/// ```rust
/// use cmdtree::{Command, IntegerParser};
///
/// let command = Command::<()>::builder("cmd")
///     .required("a", IntegerParser::new())
///     .optional_with_default("b", IntegerParser::new(), "5")
///     .handler(|_ctx| Ok(()))
///     .build()
///     .unwrap();
///
/// assert_eq!(command.syntax(), "cmd <a> [b]");
/// ```
pub struct CommandBuilder<S> {
    components: Vec<CommandComponent<S>>,
    handler: Option<CommandHandler<S>>,
    permission: Option<CommandPermission<S>>,
    description: Option<String>,
    error: Option<TreeError>,
}

impl<S> CommandBuilder<S> {
    /// Builder whose root literal is `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_components(vec![CommandComponent::literal(name)])
    }

    /// Builder over an explicit component list
    pub fn with_components(components: Vec<CommandComponent<S>>) -> Self {
        Self {
            components,
            handler: None,
            permission: None,
            description: None,
            error: None,
        }
    }

    fn fail(&mut self, error: TreeError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Append a literal
    pub fn literal(mut self, name: impl Into<String>) -> Self {
        self.components.push(CommandComponent::literal(name));
        self
    }

    /// Add an alias to the most recent literal
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        match self.components.last_mut() {
            Some(CommandComponent::Literal { aliases, .. }) => aliases.push(alias),
            _ => self.fail(TreeError::InvalidLiteral(alias)),
        }
        self
    }

    /// Append a prebuilt argument
    pub fn argument(mut self, argument: CommandArgument<S>) -> Self {
        self.components.push(CommandComponent::Argument(argument));
        self
    }

    fn push_argument(mut self, argument: Result<CommandArgument<S>, TreeError>) -> Self {
        match argument {
            Ok(argument) => self.argument(argument),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }

    /// Append a required argument
    pub fn required<P>(self, name: impl Into<String>, parser: P) -> Self
    where
        P: ArgumentParser<S> + 'static,
    {
        self.push_argument(CommandArgument::required(name, parser))
    }

    /// Append an optional argument
    pub fn optional<P>(self, name: impl Into<String>, parser: P) -> Self
    where
        P: ArgumentParser<S> + 'static,
    {
        self.push_argument(CommandArgument::optional(name, parser))
    }

    /// Append an optional argument with a default value
    pub fn optional_with_default<P>(
        self,
        name: impl Into<String>,
        parser: P,
        default_value: impl Into<String>,
    ) -> Self
    where
        P: ArgumentParser<S> + 'static,
    {
        self.push_argument(CommandArgument::optional_with_default(
            name,
            parser,
            default_value,
        ))
    }

    /// Set the handler
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut CommandContext<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Require `permission`
    pub fn permission(mut self, permission: CommandPermission<S>) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Set a description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<Command<S>, TreeError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        validate_components(&self.components)?;

        let syntax = self
            .components
            .iter()
            .map(CommandComponent::syntax)
            .collect::<Vec<_>>()
            .join(" ");
        let handler = self.handler.ok_or(TreeError::MissingHandler(syntax))?;

        Ok(Command {
            components: self.components,
            handler,
            permission: self.permission,
            description: self.description,
        })
    }
}

/// Checks literal names, the root literal and required/optional ordering
pub(crate) fn validate_components<S>(components: &[CommandComponent<S>]) -> Result<(), TreeError> {
    let first = components.first().ok_or(TreeError::EmptyCommand)?;
    if let CommandComponent::Argument(argument) = first {
        return Err(TreeError::RootNotLiteral(argument.name().to_string()));
    }

    let mut optional: Option<&str> = None;
    for component in components {
        if let CommandComponent::Literal { name, aliases } = component {
            if let Some(bad) = std::iter::once(name)
                .chain(aliases)
                .find(|literal| !is_valid_literal(literal))
            {
                return Err(TreeError::InvalidLiteral(bad.clone()));
            }
        }

        match (optional, component.is_required()) {
            (Some(optional), true) => {
                return Err(TreeError::RequiredAfterOptional {
                    component: component.syntax(),
                    optional: optional.to_string(),
                })
            }
            (None, false) => {
                optional = component.as_argument().map(CommandArgument::name);
            }
            _ => {}
        }
    }
    Ok(())
}
