//! Boolean parser

use crate::arguments::parser::{
    ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandInput,
};
use crate::context::CommandContext;

const STRICT_TRUE: &[&str] = &["true"];
const STRICT_FALSE: &[&str] = &["false"];
const LIBERAL_TRUE: &[&str] = &["true", "yes", "on"];
const LIBERAL_FALSE: &[&str] = &["false", "no", "off"];

/// Parses `true`/`false`, and `yes`/`no`/`on`/`off` when liberal
///
/// Matching ignores ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanParser {
    liberal: bool,
}

impl BooleanParser {
    /// Accept only `true` and `false`
    pub fn strict() -> Self {
        Self { liberal: false }
    }

    /// Also accept `yes`/`no`/`on`/`off`
    pub fn liberal() -> Self {
        Self { liberal: true }
    }

    fn words(&self) -> (&'static [&'static str], &'static [&'static str]) {
        if self.liberal {
            (LIBERAL_TRUE, LIBERAL_FALSE)
        } else {
            (STRICT_TRUE, STRICT_FALSE)
        }
    }
}

impl<S> ArgumentParser<S> for BooleanParser {
    type Output = bool;

    fn parse(&self, _ctx: &CommandContext<S>, input: &mut CommandInput) -> ArgumentParseResult<bool> {
        let token = input.front().ok_or(ArgumentParseError::NoInput)?;
        let (yes, no) = self.words();
        let value = if yes.iter().any(|w| w.eq_ignore_ascii_case(token)) {
            true
        } else if no.iter().any(|w| w.eq_ignore_ascii_case(token)) {
            false
        } else {
            return Err(ArgumentParseError::Boolean {
                input: token.clone(),
            });
        };
        input.pop_front();
        Ok(value)
    }

    fn is_context_free(&self) -> bool {
        true
    }

    fn suggestions(&self, _ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        let (yes, no) = self.words();
        let lowered = input.to_ascii_lowercase();
        yes.iter()
            .chain(no.iter())
            .filter(|word| word.starts_with(&lowered))
            .map(|word| word.to_string())
            .collect()
    }
}
