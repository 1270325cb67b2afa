//! String parser

use serde::{Deserialize, Serialize};

use crate::arguments::parser::{
    ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandInput,
};
use crate::context::CommandContext;

/// How many tokens a [`StringParser`] takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMode {
    /// Exactly one token
    #[default]
    Single,
    /// Every remaining token, joined by single spaces
    Greedy,
    /// One token, or a `"quoted run"` spanning several tokens
    Quoted,
}

/// Parses text, optionally offering a fixed list of completions
#[derive(Debug, Clone, Default)]
pub struct StringParser {
    mode: StringMode,
    completions: Vec<String>,
}

impl StringParser {
    /// Parser in the given mode
    pub fn new(mode: StringMode) -> Self {
        Self {
            mode,
            completions: Vec::new(),
        }
    }

    /// Single-token parser
    pub fn single() -> Self {
        Self::new(StringMode::Single)
    }

    /// Parser taking the rest of the input
    pub fn greedy() -> Self {
        Self::new(StringMode::Greedy)
    }

    /// Parser understanding double quotes
    pub fn quoted() -> Self {
        Self::new(StringMode::Quoted)
    }

    /// Offer these values as completions
    pub fn with_completions<I, T>(mut self, completions: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.completions = completions.into_iter().map(Into::into).collect();
        self
    }

    /// Configured mode
    pub fn mode(&self) -> StringMode {
        self.mode
    }

    fn parse_quoted(input: &mut CommandInput) -> ArgumentParseResult<String> {
        let first = input.front().ok_or(ArgumentParseError::NoInput)?;
        let Some(opened) = first.strip_prefix('"') else {
            return Ok(input.pop_front().unwrap_or_default());
        };
        if let Some(whole) = opened.strip_suffix('"') {
            let value = whole.to_string();
            input.pop_front();
            return Ok(value);
        }

        let mut parts = vec![opened.to_string()];
        let mut closed = false;
        let mut used = 1;
        for token in input.iter().skip(1) {
            used += 1;
            if let Some(last) = token.strip_suffix('"') {
                parts.push(last.to_string());
                closed = true;
                break;
            }
            parts.push(token.clone());
        }
        if !closed {
            return Err(ArgumentParseError::invalid(
                input.iter().cloned().collect::<Vec<_>>().join(" "),
                "unterminated quote",
            ));
        }
        input.drain(..used);
        Ok(parts.join(" "))
    }
}

impl<S> ArgumentParser<S> for StringParser {
    type Output = String;

    fn parse(&self, _ctx: &CommandContext<S>, input: &mut CommandInput) -> ArgumentParseResult<String> {
        if input.is_empty() {
            return Err(ArgumentParseError::NoInput);
        }
        match self.mode {
            StringMode::Single => input.pop_front().ok_or(ArgumentParseError::NoInput),
            StringMode::Greedy => Ok(input.drain(..).collect::<Vec<_>>().join(" ")),
            StringMode::Quoted => Self::parse_quoted(input),
        }
    }

    fn is_context_free(&self) -> bool {
        true
    }

    fn suggestions(&self, _ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        self.completions
            .iter()
            .filter(|candidate| candidate.starts_with(input))
            .cloned()
            .collect()
    }
}
