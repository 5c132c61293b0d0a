//! Typed Conversions
//!
//! [`FromValue`] is the typed-extraction seam used by [`Value::get`],
//! [`List::get`] and [`Map::get`]. Scalars convert leniently the way callers
//! feeding text protocols expect: strings parse into numbers and booleans,
//! non-negative integers widen to unsigned, and integers widen to floats.
//!
//! [`FromArgs`] turns an argument [`List`] into a tuple with arity and type
//! checks; [`IntoOutcome`] turns a function's return value into an
//! [`Outcome`].

use crate::error::{Error, ValueError};
use crate::list::List;
use crate::map::Map;
use crate::outcome::Outcome;
use crate::value::{Value, ValueType};
use std::fmt::Display;

/// Typed extraction from a [`Value`]
pub trait FromValue: Sized {
    /// Type reported in cast errors
    const TYPE: ValueType;

    fn from_value(value: &Value) -> Option<Self>;
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl FromValue for Value {
    const TYPE: ValueType = ValueType::Null;

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for () {
    const TYPE: ValueType = ValueType::Null;

    fn from_value(value: &Value) -> Option<Self> {
        value.is_null().then_some(())
    }
}

impl FromValue for bool {
    const TYPE: ValueType = ValueType::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => parse_bool(s),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const TYPE: ValueType = ValueType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    const TYPE: ValueType = ValueType::Int;

    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|i| i32::try_from(i).ok())
    }
}

impl FromValue for u64 {
    const TYPE: ValueType = ValueType::UInt;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::UInt(u) => Some(*u),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for u32 {
    const TYPE: ValueType = ValueType::UInt;

    fn from_value(value: &Value) -> Option<Self> {
        u64::from_value(value).and_then(|u| u32::try_from(u).ok())
    }
}

impl FromValue for usize {
    const TYPE: ValueType = ValueType::UInt;

    fn from_value(value: &Value) -> Option<Self> {
        u64::from_value(value).and_then(|u| usize::try_from(u).ok())
    }
}

impl FromValue for f64 {
    const TYPE: ValueType = ValueType::Float;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Float(x) => Some(*x),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromValue for String {
    const TYPE: ValueType = ValueType::String;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for List {
    const TYPE: ValueType = ValueType::List;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list().cloned()
    }
}

impl FromValue for Map {
    const TYPE: ValueType = ValueType::Map;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_map().cloned()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const TYPE: ValueType = T::TYPE;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Conversion of an argument list into typed parameters
pub trait FromArgs: Sized {
    fn from_args(args: &List) -> Result<Self, ValueError>;
}

/// Raw access to the argument list
impl FromArgs for List {
    fn from_args(args: &List) -> Result<Self, ValueError> {
        Ok(args.clone())
    }
}

impl FromArgs for () {
    fn from_args(args: &List) -> Result<Self, ValueError> {
        match args.size() {
            0 => Ok(()),
            given => Err(ValueError::Arity { expected: 0, given }),
        }
    }
}

macro_rules! impl_from_args {
    ($len:expr; $($index:tt => $T:ident),+) => {
        impl<$($T: FromValue),+> FromArgs for ($($T,)+) {
            fn from_args(args: &List) -> Result<Self, ValueError> {
                let given = args.size();
                if given != $len {
                    return Err(ValueError::Arity { expected: $len, given });
                }
                Ok(($(args.get::<$T>($index)?,)+))
            }
        }
    };
}

impl_from_args!(1; 0 => A);
impl_from_args!(2; 0 => A, 1 => B);
impl_from_args!(3; 0 => A, 1 => B, 2 => C);
impl_from_args!(4; 0 => A, 1 => B, 2 => C, 3 => D);
impl_from_args!(5; 0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_from_args!(6; 0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);
impl_from_args!(7; 0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G);
impl_from_args!(8; 0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F, 6 => G, 7 => H);

/// Conversion of a function's return value into an [`Outcome`]
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: Into<Value>,
    E: Display,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => Outcome::Value(value.into()),
            Err(err) => Outcome::Error(Error::new(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list;

    #[test]
    fn test_string_parsing() {
        assert_eq!(Value::from("true").get::<bool>(), Some(true));
        assert_eq!(Value::from("yes").get::<bool>(), None);
        assert_eq!(Value::from("42").get::<i64>(), Some(42));
        assert_eq!(Value::from("42x").get::<i64>(), None);
        assert_eq!(Value::from("2.5").get::<f64>(), Some(2.5));
        assert_eq!(Value::from("-1").get::<u64>(), None);
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(Value::from(5).get::<u64>(), Some(5));
        assert_eq!(Value::from(-5).get::<u64>(), None);
        assert_eq!(Value::from(5).get::<f64>(), Some(5.0));
        assert_eq!(Value::from(u64::MAX).get::<i64>(), None);
        assert_eq!(Value::from(1.5).get::<i64>(), None);
        assert_eq!(Value::from(i64::MAX).get::<i32>(), None);
    }

    #[test]
    fn test_option_extraction() {
        assert_eq!(Value::Null.get::<Option<i64>>(), Some(None));
        assert_eq!(Value::from(3).get::<Option<i64>>(), Some(Some(3)));
        assert_eq!(Value::from("x").get::<Option<i64>>(), None);
    }

    #[test]
    fn test_empty_arguments() {
        assert!(List::new().unpack::<()>().is_ok());
        let err = list![1].unpack::<()>().unwrap_err();
        assert_eq!(err.to_string(), "expected 0 arguments but 1 were given");
    }

    #[test]
    fn test_into_outcome() {
        let ok: Result<i64, String> = Ok(7);
        assert_eq!(ok.into_outcome(), Outcome::Value(Value::Int(7)));
        let err: Result<i64, &str> = Err("not enough funds");
        assert_eq!(
            err.into_outcome(),
            Outcome::Error(Error::new("not enough funds"))
        );
    }
}
