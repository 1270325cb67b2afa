//! Command arguments and their parsers
//!
//! A [`CommandArgument`] is a named, typed leaf of a command. It owns a parser,
//! knows whether it is required, and may carry a default value that is fed
//! through the same parser when the sender leaves the argument out.

pub mod parser;
pub mod registry;
pub mod standard;

use std::cmp::Ordering;
use std::fmt;

pub use parser::{
    ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandInput, ErasedParser,
    NumberParseError, SharedParser,
};
pub use registry::{ParserParameters, ParserRegistry};

use crate::context::{ArgValue, CommandContext};
use crate::error::TreeError;

/// Whether `name` is a valid argument name: non-empty ASCII alphanumerics
pub fn is_valid_argument_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// A named, typed argument of a command
pub struct CommandArgument<S> {
    name: String,
    required: bool,
    default_value: String,
    parser: SharedParser<S>,
}

impl<S> CommandArgument<S> {
    /// Start building an argument
    pub fn builder(name: impl Into<String>) -> ArgumentBuilder<S> {
        ArgumentBuilder::new(name)
    }

    /// Required argument using `parser`
    pub fn required<P>(name: impl Into<String>, parser: P) -> Result<Self, TreeError>
    where
        P: ArgumentParser<S> + 'static,
    {
        Self::builder(name).parser(parser).build()
    }

    /// Optional argument without default
    pub fn optional<P>(name: impl Into<String>, parser: P) -> Result<Self, TreeError>
    where
        P: ArgumentParser<S> + 'static,
    {
        Self::builder(name).parser(parser).as_optional().build()
    }

    /// Optional argument falling back to `default_value`
    pub fn optional_with_default<P>(
        name: impl Into<String>,
        parser: P,
        default_value: impl Into<String>,
    ) -> Result<Self, TreeError>
    where
        P: ArgumentParser<S> + 'static,
    {
        Self::builder(name)
            .parser(parser)
            .as_optional_with_default(default_value)
            .build()
    }

    /// Argument name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the argument must be supplied
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Default value; empty when there is none
    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    /// True iff the argument is optional and has a non-empty default
    pub fn has_default_value(&self) -> bool {
        !self.required && !self.default_value.is_empty()
    }

    /// The argument's parser
    pub fn parser(&self) -> &SharedParser<S> {
        &self.parser
    }

    /// Name of the type the parser produces
    pub fn value_type(&self) -> &'static str {
        self.parser.value_type()
    }

    /// Parse the default value through the argument's parser
    ///
    /// The parser must use up the whole default.
    pub(crate) fn parse_default(&self, ctx: &CommandContext<S>) -> Option<Result<ArgValue, ArgumentParseError>> {
        if !self.has_default_value() {
            return None;
        }
        let mut input: CommandInput = self
            .default_value
            .split(' ')
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        let parsed = self.parser.parse_value(ctx, &mut input);
        if parsed.is_ok() && !input.is_empty() {
            return Some(Err(ArgumentParseError::invalid(
                self.default_value.clone(),
                "trailing tokens in default",
            )));
        }
        Some(parsed)
    }

    /// `<name>` for required, `[name]` for optional arguments
    pub fn syntax(&self) -> String {
        if self.required {
            format!("<{}>", self.name)
        } else {
            format!("[{}]", self.name)
        }
    }
}

impl<S> Clone for CommandArgument<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            required: self.required,
            default_value: self.default_value.clone(),
            parser: self.parser.clone(),
        }
    }
}

impl<S> PartialEq for CommandArgument<S> {
    fn eq(&self, other: &Self) -> bool {
        self.required == other.required && self.name == other.name
    }
}

impl<S> Eq for CommandArgument<S> {}

impl<S> std::hash::Hash for CommandArgument<S> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.required.hash(state);
        self.name.hash(state);
    }
}

impl<S> fmt::Debug for CommandArgument<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArgument")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("default_value", &self.default_value)
            .field("value_type", &self.value_type())
            .finish()
    }
}

impl<S> fmt::Display for CommandArgument<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandArgument{{name={}}}", self.name)
    }
}

/// Builder for [`CommandArgument`]
pub struct ArgumentBuilder<S> {
    name: String,
    required: bool,
    default_value: String,
    parser: Option<SharedParser<S>>,
}

impl<S> ArgumentBuilder<S> {
    /// Builder for a required argument without parser
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default_value: String::new(),
            parser: None,
        }
    }

    /// Mark required (the default)
    pub fn as_required(mut self) -> Self {
        self.required = true;
        self.default_value.clear();
        self
    }

    /// Mark optional without default
    pub fn as_optional(mut self) -> Self {
        self.required = false;
        self.default_value.clear();
        self
    }

    /// Mark optional with a default value
    pub fn as_optional_with_default(mut self, default_value: impl Into<String>) -> Self {
        self.required = false;
        self.default_value = default_value.into();
        self
    }

    /// Use `parser`
    pub fn parser<P>(mut self, parser: P) -> Self
    where
        P: ArgumentParser<S> + 'static,
    {
        self.parser = Some(SharedParser::new(parser));
        self
    }

    /// Use an already shared parser, e.g. one from a [`ParserRegistry`]
    pub fn shared_parser(mut self, parser: SharedParser<S>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<CommandArgument<S>, TreeError> {
        if !is_valid_argument_name(&self.name) {
            return Err(TreeError::InvalidArgumentName(self.name));
        }
        let parser = self
            .parser
            .ok_or_else(|| TreeError::MissingParser(self.name.clone()))?;
        Ok(CommandArgument {
            name: self.name,
            required: self.required,
            default_value: self.default_value,
            parser,
        })
    }
}

/// Orders literal components before arguments, literals by name
///
/// Arguments compare equal to each other so a stable sort keeps their
/// insertion order.
pub fn compare_components(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
