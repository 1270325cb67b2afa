//! Range-checked numeric parsers

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::arguments::parser::{
    ArgumentParseError, ArgumentParseResult, ArgumentParser, CommandInput, NumberParseError,
};
use crate::context::CommandContext;

/// Numeric types usable with [`NumberParser`]
pub trait RangedNumber:
    Copy + PartialOrd + FromStr + fmt::Display + Send + Sync + 'static
{
    /// Name used in error messages and as registry tag
    const TYPE_NAME: &'static str;
    /// Smallest representable value
    const MIN: Self;
    /// Largest representable value
    const MAX: Self;

    /// Exact integer view, `None` for floating point types
    fn as_integer(self) -> Option<i128>;
}

macro_rules! integral_number {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl RangedNumber for $ty {
                const TYPE_NAME: &'static str = $name;
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;

                fn as_integer(self) -> Option<i128> {
                    Some(self as i128)
                }
            }
        )*
    };
}

macro_rules! float_number {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl RangedNumber for $ty {
                const TYPE_NAME: &'static str = $name;
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;

                fn as_integer(self) -> Option<i128> {
                    None
                }
            }
        )*
    };
}

integral_number!(i8 => "byte", i16 => "short", i32 => "integer", i64 => "long");
float_number!(f32 => "float", f64 => "double");

/// Parses one token as `N`, accepting only values in `[min, max]`
pub struct NumberParser<N: RangedNumber> {
    min: N,
    max: N,
}

impl<N: RangedNumber> NumberParser<N> {
    /// Parser accepting the whole range of `N`
    pub fn new() -> Self {
        Self {
            min: N::MIN,
            max: N::MAX,
        }
    }

    /// Parser accepting `[min, max]`
    pub fn range(min: N, max: N) -> Self {
        Self { min, max }
    }

    /// Set the minimum
    pub fn with_min(mut self, min: N) -> Self {
        self.min = min;
        self
    }

    /// Set the maximum
    pub fn with_max(mut self, max: N) -> Self {
        self.max = max;
        self
    }

    /// Accepted minimum
    pub fn min(&self) -> N {
        self.min
    }

    /// Accepted maximum
    pub fn max(&self) -> N {
        self.max
    }

    /// Whether the minimum differs from the type's own
    pub fn has_min(&self) -> bool {
        self.min != N::MIN
    }

    /// Whether the maximum differs from the type's own
    pub fn has_max(&self) -> bool {
        self.max != N::MAX
    }

    fn error(&self, input: &str) -> ArgumentParseError {
        ArgumentParseError::Number(NumberParseError {
            input: input.to_string(),
            number_type: N::TYPE_NAME,
            min: self.min.to_string(),
            max: self.max.to_string(),
            has_min: self.has_min(),
            has_max: self.has_max(),
        })
    }

    fn bound_suggestions(&self, input: &str) -> Vec<String> {
        let mut bounds = Vec::new();
        if self.has_min() {
            bounds.push(self.min.to_string());
        }
        if self.has_max() {
            bounds.push(self.max.to_string());
        }
        bounds.retain(|bound| bound.starts_with(input));
        bounds
    }
}

impl<N: RangedNumber> Default for NumberParser<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: RangedNumber> fmt::Debug for NumberParser<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberParser")
            .field("type", &N::TYPE_NAME)
            .field("min", &self.min.to_string())
            .field("max", &self.max.to_string())
            .finish()
    }
}

impl<S, N: RangedNumber> ArgumentParser<S> for NumberParser<N> {
    type Output = N;

    fn parse(&self, _ctx: &CommandContext<S>, input: &mut CommandInput) -> ArgumentParseResult<N> {
        let token = input.front().ok_or(ArgumentParseError::NoInput)?;
        let value = token.parse::<N>().map_err(|_| self.error(token))?;
        // written so that NaN is rejected as well
        if !(value >= self.min && value <= self.max) {
            return Err(self.error(token));
        }
        input.pop_front();
        Ok(value)
    }

    fn is_context_free(&self) -> bool {
        true
    }

    fn suggestions(&self, _ctx: &CommandContext<S>, input: &str) -> Vec<String> {
        let mut suggestions = match (self.min.as_integer(), self.max.as_integer()) {
            (Some(min), Some(max)) => integer_suggestions(min, max, input),
            _ => {
                let mut own = Vec::new();
                if let Ok(value) = input.parse::<N>() {
                    if value >= self.min && value <= self.max {
                        own.push(input.to_string());
                    }
                }
                own
            }
        };
        for bound in self.bound_suggestions(input) {
            if !suggestions.contains(&bound) {
                suggestions.push(bound);
            }
        }
        suggestions
    }
}

/// Values near the partial `input`: the number typed so far and every
/// one-digit extension of it, limited to `[min, max]` and starting with
/// `input`.
pub fn integer_suggestions(min: i128, max: i128, input: &str) -> Vec<String> {
    let negative = input.starts_with('-');
    let digits = input.strip_prefix('-').unwrap_or(input);
    if !digits.chars().all(|c| c.is_ascii_digit()) || digits.len() > 20 {
        return Vec::new();
    }
    let typed: i128 = if digits.is_empty() {
        0
    } else {
        match digits.parse() {
            Ok(value) => value,
            Err(_) => return Vec::new(),
        }
    };

    let limit = if negative { -min } else { max };
    let mut magnitudes = BTreeSet::new();
    if !digits.is_empty() {
        magnitudes.insert(typed);
    }
    for digit in 0..10 {
        let next = typed * 10 + digit;
        if next > limit {
            break;
        }
        magnitudes.insert(next);
    }

    magnitudes
        .into_iter()
        .map(|magnitude| if negative { -magnitude } else { magnitude })
        .filter(|value| *value >= min && *value <= max)
        .map(|value| value.to_string())
        .filter(|value| value.starts_with(input))
        .collect()
}

/// Parser producing `i8`
pub type ByteParser = NumberParser<i8>;
/// Parser producing `i16`
pub type ShortParser = NumberParser<i16>;
/// Parser producing `i32`
pub type IntegerParser = NumberParser<i32>;
/// Parser producing `i64`
pub type LongParser = NumberParser<i64>;
/// Parser producing `f32`
pub type FloatParser = NumberParser<f32>;
/// Parser producing `f64`
pub type DoubleParser = NumberParser<f64>;
