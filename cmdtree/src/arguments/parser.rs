//! Argument parser contract
//!
//! A parser turns tokens from the front of a [`CommandInput`] queue into a
//! typed value. It consumes tokens only when it succeeds.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::{ArgValue, CommandContext};

/// Queue of raw input tokens handed to parsers
pub type CommandInput = VecDeque<String>;

/// Outcome of a parse: the value, or a structured failure
pub type ArgumentParseResult<T> = Result<T, ArgumentParseError>;

/// Structured parse failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArgumentParseError {
    /// The queue was empty
    #[error("No input was provided")]
    NoInput,

    /// Malformed or out-of-range number
    #[error(transparent)]
    Number(#[from] NumberParseError),

    /// Token is not a recognised boolean
    #[error("Could not parse boolean from '{input}'")]
    Boolean { input: String },

    /// Parser-specific failure
    #[error("Invalid value '{input}': {reason}")]
    Invalid { input: String, reason: String },
}

impl ArgumentParseError {
    /// Create a parser-specific failure
    pub fn invalid(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// The offending token, when there was one
    pub fn input(&self) -> Option<&str> {
        match self {
            Self::Number(err) => Some(&err.input),
            Self::Boolean { input } | Self::Invalid { input, .. } => Some(input),
            Self::NoInput => None,
        }
    }
}

/// A number could not be parsed, or fell outside `[min, max]`
///
/// `has_min`/`has_max` report whether the bound differs from the type's own
/// limit, so messages can leave out bounds that carry no information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberParseError {
    /// Offending token
    pub input: String,
    /// Name of the numeric type, e.g. `byte`
    pub number_type: &'static str,
    /// Accepted minimum, formatted
    pub min: String,
    /// Accepted maximum, formatted
    pub max: String,
    /// Whether a non-default minimum was configured
    pub has_min: bool,
    /// Whether a non-default maximum was configured
    pub has_max: bool,
}

impl fmt::Display for NumberParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.has_min, self.has_max) {
            (true, true) => write!(
                f,
                "'{}' is not a valid {} in the range [{}, {}]",
                self.input, self.number_type, self.min, self.max
            ),
            (true, false) => write!(
                f,
                "'{}' is not a valid {} (must be at least {})",
                self.input, self.number_type, self.min
            ),
            (false, true) => write!(
                f,
                "'{}' is not a valid {} (must be at most {})",
                self.input, self.number_type, self.max
            ),
            (false, false) => write!(f, "'{}' is not a valid {}", self.input, self.number_type),
        }
    }
}

impl std::error::Error for NumberParseError {}

/// Extracts a typed value from the input queue
///
/// Implementations must leave `input` untouched when returning `Err`, and
/// must remove exactly the tokens forming the value when returning `Ok`.
///
/// # Example
///
/// ```rust
/// use cmdtree::{ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandContext, CommandInput};
///
/// struct Colour;
///
/// impl<S> ArgumentParser<S> for Colour {
///     type Output = String;
///
///     fn parse(&self, _ctx: &CommandContext<S>, input: &mut CommandInput) -> ArgumentParseResult<String> {
///         let token = input.front().ok_or(ArgumentParseError::NoInput)?;
///         if ["red", "green", "blue"].contains(&token.as_str()) {
///             Ok(input.pop_front().unwrap_or_default())
///         } else {
///             Err(ArgumentParseError::invalid(token.clone(), "not a colour"))
///         }
///     }
///
///     fn is_context_free(&self) -> bool {
///         true
///     }
/// }
/// ```
pub trait ArgumentParser<S>: Send + Sync {
    /// Type produced on success
    type Output: Send + Sync + 'static;

    /// Parse a value from the front of `input`
    fn parse(
        &self,
        ctx: &CommandContext<S>,
        input: &mut CommandInput,
    ) -> ArgumentParseResult<Self::Output>;

    /// Whether the outcome depends only on the tokens themselves
    fn is_context_free(&self) -> bool {
        false
    }

    /// Completions for a partial token; empty means no suggestions
    fn suggestions(&self, ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        let _ = (ctx, input);
        Vec::new()
    }
}

/// Object-safe view of an [`ArgumentParser`] with its output boxed
pub trait ErasedParser<S>: Send + Sync {
    /// Parse and box the value
    fn parse_value(&self, ctx: &CommandContext<S>, input: &mut CommandInput)
        -> ArgumentParseResult<ArgValue>;

    /// See [`ArgumentParser::is_context_free`]
    fn is_context_free(&self) -> bool;

    /// See [`ArgumentParser::suggestions`]
    fn suggestions(&self, ctx: &CommandContext<S>, input: &str) -> Vec<String>;

    /// Name of the produced type
    fn value_type(&self) -> &'static str;
}

impl<S, P> ErasedParser<S> for P
where
    P: ArgumentParser<S>,
{
    fn parse_value(
        &self,
        ctx: &CommandContext<S>,
        input: &mut CommandInput,
    ) -> ArgumentParseResult<ArgValue> {
        let before = input.clone();
        match self.parse(ctx, input) {
            Ok(value) => Ok(ArgValue::new(value)),
            Err(err) => {
                // keep the "consume only on success" contract even for sloppy parsers
                *input = before;
                Err(err)
            }
        }
    }

    fn is_context_free(&self) -> bool {
        ArgumentParser::is_context_free(self)
    }

    fn suggestions(&self, ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        ArgumentParser::suggestions(self, ctx, input)
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<P::Output>()
    }
}

/// Shared, type-erased parser handle
pub struct SharedParser<S>(Arc<dyn ErasedParser<S>>);

impl<S> SharedParser<S> {
    /// Wrap a concrete parser
    pub fn new<P>(parser: P) -> Self
    where
        P: ArgumentParser<S> + 'static,
    {
        Self(Arc::new(parser))
    }

    /// Whether both handles share one parser instance
    pub fn same_as(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl<S> Clone for SharedParser<S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<S> std::ops::Deref for SharedParser<S> {
    type Target = dyn ErasedParser<S>;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl<S> fmt::Debug for SharedParser<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedParser")
            .field(&self.0.value_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sloppy;

    impl ArgumentParser<()> for Sloppy {
        type Output = String;

        fn parse(&self, _ctx: &CommandContext<()>, input: &mut CommandInput) -> ArgumentParseResult<String> {
            let token = input.pop_front().ok_or(ArgumentParseError::NoInput)?;
            Err(ArgumentParseError::invalid(token, "always fails"))
        }
    }

    fn input(tokens: &[&str]) -> CommandInput {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_erased_parser_restores_queue_on_failure() {
        let ctx = CommandContext::new(());
        let mut queue = input(&["abc", "def"]);
        let err = Sloppy.parse_value(&ctx, &mut queue).unwrap_err();

        assert_eq!(err.input(), Some("abc"));
        assert_eq!(queue, input(&["abc", "def"]));
    }

    #[test]
    fn test_number_error_messages_skip_default_bounds() {
        let mut err = NumberParseError {
            input: "200".into(),
            number_type: "byte",
            min: "-128".into(),
            max: "127".into(),
            has_min: false,
            has_max: false,
        };
        assert_eq!(err.to_string(), "'200' is not a valid byte");

        err.has_max = true;
        assert_eq!(err.to_string(), "'200' is not a valid byte (must be at most 127)");

        err.has_min = true;
        assert_eq!(
            err.to_string(),
            "'200' is not a valid byte in the range [-128, 127]"
        );
    }

    #[test]
    fn test_shared_parser_reports_value_type() {
        let parser: SharedParser<()> = SharedParser::new(Sloppy);
        assert!(parser.value_type().ends_with("String"));
        assert!(!parser.is_context_free());
    }
}
