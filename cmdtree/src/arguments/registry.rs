//! Parser registry
//!
//! Maps type tags such as `"integer"` to factories that build a parser from
//! a set of [`ParserParameters`]. Registration layers that only know an
//! argument's declared type use this to obtain a parser.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::parser::SharedParser;
use super::standard::{BooleanParser, NumberParser, RangedNumber, StringMode, StringParser};

/// Parameter keys understood by the built-in factories
pub mod keys {
    /// Numeric lower bound
    pub const MIN: &str = "min";
    /// Numeric upper bound
    pub const MAX: &str = "max";
    /// String mode: `single`, `greedy` or `quoted`
    pub const MODE: &str = "mode";
    /// Accept yes/no/on/off for booleans
    pub const LIBERAL: &str = "liberal";
    /// Fixed completion list for strings
    pub const COMPLETIONS: &str = "completions";
}

/// Parameters passed to a parser factory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParserParameters {
    values: BTreeMap<String, Value>,
}

impl ParserParameters {
    /// No parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a parameter
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Raw parameter value
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Parameter decoded as `T`
    ///
    /// Returns `Some(Err(..))` when the key is present but does not decode.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T, serde_json::Error>> {
        self.values
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type ParserFactory<S> = Arc<dyn Fn(&ParserParameters) -> Option<SharedParser<S>> + Send + Sync>;

/// Registry of parser factories keyed by type tag
pub struct ParserRegistry<S> {
    factories: HashMap<String, ParserFactory<S>>,
}

impl<S> fmt::Debug for ParserRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.factories.keys().collect();
        tags.sort();
        f.debug_struct("ParserRegistry").field("tags", &tags).finish()
    }
}

impl<S> ParserRegistry<S> {
    /// Registry without any factories
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) the factory for `tag`
    pub fn register<F>(&mut self, tag: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ParserParameters) -> Option<SharedParser<S>> + Send + Sync + 'static,
    {
        let tag = tag.into();
        tracing::debug!(tag = %tag, "Parser factory registered");
        self.factories.insert(tag, Arc::new(factory));
        self
    }

    /// Build a parser for `tag`
    ///
    /// `None` when the tag is unknown or the parameters are unusable.
    pub fn create(&self, tag: &str, params: &ParserParameters) -> Option<SharedParser<S>> {
        let parser = self.factories.get(tag).and_then(|factory| factory(params));
        if parser.is_none() {
            tracing::debug!(tag, ?params, "No parser could be created");
        }
        parser
    }

    /// Whether a factory exists for `tag`
    pub fn has(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl<S: 'static> ParserRegistry<S> {
    /// Registry with the built-in parsers
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_number::<i8>();
        registry.register_number::<i16>();
        registry.register_number::<i32>();
        registry.register_number::<i64>();
        registry.register_number::<f32>();
        registry.register_number::<f64>();

        registry.register("boolean", |params: &ParserParameters| {
            let liberal = match params.get::<bool>(keys::LIBERAL) {
                Some(Ok(liberal)) => liberal,
                Some(Err(_)) => return None,
                None => false,
            };
            let parser = if liberal {
                BooleanParser::liberal()
            } else {
                BooleanParser::strict()
            };
            Some(SharedParser::new(parser))
        });

        registry.register("string", |params: &ParserParameters| {
            let mode = match params.get::<StringMode>(keys::MODE) {
                Some(Ok(mode)) => mode,
                Some(Err(_)) => return None,
                None => StringMode::Single,
            };
            let mut parser = StringParser::new(mode);
            match params.get::<Vec<String>>(keys::COMPLETIONS) {
                Some(Ok(completions)) => parser = parser.with_completions(completions),
                Some(Err(_)) => return None,
                None => {}
            }
            Some(SharedParser::new(parser))
        });

        registry
    }

    fn register_number<N>(&mut self)
    where
        N: RangedNumber + DeserializeOwned,
    {
        self.register(N::TYPE_NAME, |params: &ParserParameters| {
            let mut parser = NumberParser::<N>::new();
            if let Some(min) = params.get::<N>(keys::MIN) {
                parser = parser.with_min(min.ok()?);
            }
            if let Some(max) = params.get::<N>(keys::MAX) {
                parser = parser.with_max(max.ok()?);
            }
            if parser.min() > parser.max() {
                return None;
            }
            Some(SharedParser::new(parser))
        });
    }
}

impl<S: 'static> Default for ParserRegistry<S> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::parser::{ArgumentParseError, CommandInput};
    use crate::context::CommandContext;

    fn queue(tokens: &[&str]) -> CommandInput {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_defaults_are_registered() {
        let registry = ParserRegistry::<()>::with_defaults();
        assert_eq!(
            registry.tags(),
            vec!["boolean", "byte", "double", "float", "integer", "long", "short", "string"]
        );
        assert!(registry.create("uuid", &ParserParameters::empty()).is_none());
    }

    #[test]
    fn test_number_bounds_from_parameters() {
        let registry = ParserRegistry::<()>::with_defaults();
        let params = ParserParameters::empty()
            .with(keys::MIN, 1)
            .with(keys::MAX, 10);
        let parser = registry.create("integer", &params).unwrap();

        let ctx = CommandContext::new(());
        let value = parser.parse_value(&ctx, &mut queue(&["7"])).unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&7));

        match parser.parse_value(&ctx, &mut queue(&["11"])).unwrap_err() {
            ArgumentParseError::Number(err) => {
                assert_eq!(err.min, "1");
                assert_eq!(err.max, "10");
            }
            other => panic!("Expected number error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_type_bound_is_rejected() {
        let registry = ParserRegistry::<()>::with_defaults();
        let params = ParserParameters::empty().with(keys::MAX, 1000);
        assert!(registry.create("byte", &params).is_none());

        let params = ParserParameters::empty().with(keys::MIN, 5).with(keys::MAX, 1);
        assert!(registry.create("short", &params).is_none());
    }

    #[test]
    fn test_string_mode_parameter() {
        let registry = ParserRegistry::<()>::with_defaults();
        let params = ParserParameters::empty().with(keys::MODE, "greedy");
        let parser = registry.create("string", &params).unwrap();

        let ctx = CommandContext::new(());
        let value = parser.parse_value(&ctx, &mut queue(&["a", "b"])).unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("a b"));

        let params = ParserParameters::empty().with(keys::MODE, "sideways");
        assert!(registry.create("string", &params).is_none());
    }

    #[test]
    fn test_custom_factory() {
        let mut registry = ParserRegistry::<()>::empty();
        registry.register("flag", |_: &ParserParameters| {
            Some(SharedParser::new(BooleanParser::liberal()))
        });

        assert!(registry.has("flag"));
        assert!(registry.create("flag", &ParserParameters::empty()).is_some());
        assert!(!registry.has("integer"));
    }
}
