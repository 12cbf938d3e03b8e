//! Argument synthesizer for dockhand
//!
//! Turns a list of heterogeneous arguments into a flat argv, ready to hand to
//! `std::process::Command` without any shell in between.
//!
//! Items are expanded in order:
//! - `Arg::Words(list)`        each element becomes its own token
//! - `Arg::Options(set)`       each (name, value) pair becomes zero or more flags
//! - `Arg::Word(word)`         one token
//!
//! Option pairs follow the usual getopt conventions:
//! - a one-character name is a short flag `-x`, anything else is `--name`
//! - `true` emits the bare flag, `false` and absent values emit nothing
//! - short flags take their value as the next token: `-v /a:/b`
//! - long flags take it inline: `--volume=/a:/b`
//! - a list repeats the flag once per non-null element

use std::fmt;

use serde_json::Value;

/// How long option names are spelled on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagNames {
    /// Pass names through exactly as given
    #[default]
    Verbatim,
    /// Replace `_` with `-` in long names (`publish_all` -> `--publish-all`)
    Hyphenated,
}

/// Value attached to an option name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionValue {
    /// No value at all; the option is dropped
    #[default]
    Absent,
    /// Boolean switch
    Flag(bool),
    /// Any value already turned into its string form
    Scalar(String),
    /// Repeated option; `None` elements are skipped individually
    List(Vec<Option<String>>),
}

impl OptionValue {
    /// Whether this value produces no tokens regardless of the option name.
    ///
    /// A present but empty scalar is not omitted: it still yields `--name=`.
    pub fn is_omitted(&self) -> bool {
        matches!(self, OptionValue::Absent | OptionValue::Flag(false))
    }

    /// Build a list value that may contain null elements
    pub fn list_with_nulls<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
        T: fmt::Display,
    {
        OptionValue::List(
            items
                .into_iter()
                .map(|item| item.map(|v| v.to_string()))
                .collect(),
        )
    }
}

/// String form of a JSON scalar: strings unquoted, null empty, everything else as JSON text
fn json_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<&Value> for OptionValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => OptionValue::Absent,
            Value::Bool(b) => OptionValue::Flag(*b),
            Value::Array(items) => OptionValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Null | Value::Bool(false) => None,
                        other => Some(json_scalar(other)),
                    })
                    .collect(),
            ),
            other => OptionValue::Scalar(json_scalar(other)),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Scalar(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Scalar(value)
    }
}

impl From<&String> for OptionValue {
    fn from(value: &String) -> Self {
        OptionValue::Scalar(value.clone())
    }
}

macro_rules! scalar_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    OptionValue::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: fmt::Display> From<Vec<T>> for OptionValue {
    fn from(values: Vec<T>) -> Self {
        OptionValue::List(values.iter().map(|v| Some(v.to_string())).collect())
    }
}

impl<T: fmt::Display> From<&[T]> for OptionValue {
    fn from(values: &[T]) -> Self {
        OptionValue::List(values.iter().map(|v| Some(v.to_string())).collect())
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(OptionValue::Absent)
    }
}

/// Ordered set of named options.
///
/// Iteration follows insertion order. Setting a name that is already
/// present replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionSet {
    entries: Vec<(String, OptionValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`OptionSet::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for OptionSet
where
    K: Into<String>,
    V: Into<OptionValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = OptionSet::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

/// One unit of input to the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Word(String),
    Words(Vec<String>),
    Options(OptionSet),
}

impl From<&str> for Arg {
    fn from(word: &str) -> Self {
        Arg::Word(word.to_string())
    }
}

impl From<String> for Arg {
    fn from(word: String) -> Self {
        Arg::Word(word)
    }
}

impl From<&String> for Arg {
    fn from(word: &String) -> Self {
        Arg::Word(word.clone())
    }
}

impl<T: fmt::Display> From<Vec<T>> for Arg {
    fn from(words: Vec<T>) -> Self {
        Arg::Words(words.iter().map(|w| w.to_string()).collect())
    }
}

impl<T: fmt::Display> From<&[T]> for Arg {
    fn from(words: &[T]) -> Self {
        Arg::Words(words.iter().map(|w| w.to_string()).collect())
    }
}

/// JSON strings and scalars are words, arrays are word lists, objects are option sets
impl From<&Value> for Arg {
    fn from(value: &Value) -> Self {
        match value {
            Value::Array(items) => Arg::Words(items.iter().map(json_scalar).collect()),
            Value::Object(map) => Arg::Options(
                map.iter()
                    .map(|(name, value)| (name.as_str(), OptionValue::from(value)))
                    .collect(),
            ),
            other => Arg::Word(json_scalar(other)),
        }
    }
}

impl Arg {
    /// Parse a JSON array of items, e.g. `["run", {"rm": true}, "busybox"]`.
    /// Any other JSON document is a single item.
    pub fn list_from_json(value: &Value) -> Vec<Arg> {
        match value {
            Value::Array(items) => items.iter().map(Arg::from).collect(),
            other => vec![Arg::from(other)],
        }
    }
}

impl From<OptionSet> for Arg {
    fn from(options: OptionSet) -> Self {
        Arg::Options(options)
    }
}

/// Command-line parameter generator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Getopt {
    flag_names: FlagNames,
}

impl Getopt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag_names(flag_names: FlagNames) -> Self {
        Self { flag_names }
    }

    /// GNU spelling: underscores in long names become hyphens
    pub fn gnu() -> Self {
        Self::with_flag_names(FlagNames::Hyphenated)
    }

    pub fn flag_names(&self) -> FlagNames {
        self.flag_names
    }

    /// Translate a list of words, word lists and option sets into argv tokens
    pub fn parameters(&self, items: &[Arg]) -> Vec<String> {
        let mut argv = Vec::new();
        for item in items {
            match item {
                Arg::Words(words) => argv.extend(words.iter().cloned()),
                Arg::Options(options) => argv.extend(self.options(options)),
                Arg::Word(word) => argv.push(word.clone()),
            }
        }
        argv
    }

    /// Expand an option set into flags, in the set's own order
    pub fn options(&self, options: &OptionSet) -> Vec<String> {
        options
            .iter()
            .flat_map(|(name, value)| self.convert_option(name, value))
            .collect()
    }

    /// Spelling of the flag for `name`: `-x` for one character, `--name` otherwise
    pub fn flag(&self, name: &str) -> String {
        if name.chars().count() == 1 {
            return format!("-{}", name);
        }
        match self.flag_names {
            FlagNames::Verbatim => format!("--{}", name),
            FlagNames::Hyphenated => format!("--{}", name.replace('_', "-")),
        }
    }

    pub fn convert_option(&self, name: &str, value: &OptionValue) -> Vec<String> {
        if value.is_omitted() {
            return Vec::new();
        }

        let flag = self.flag(name);
        match value {
            OptionValue::Flag(_) => vec![flag],
            OptionValue::Scalar(scalar) => with_value(&flag, scalar),
            OptionValue::List(items) => items
                .iter()
                .flatten()
                .flat_map(|item| with_value(&flag, item))
                .collect(),
            OptionValue::Absent => Vec::new(),
        }
    }
}

/// Attach a value to a flag: inline for long flags, as a separate token for short ones
fn with_value(flag: &str, value: &str) -> Vec<String> {
    if flag.starts_with("--") {
        vec![format!("{}={}", flag, value)]
    } else {
        vec![flag.to_string(), value.to_string()]
    }
}

/// [`Getopt::parameters`] with names passed through verbatim
pub fn parameters(items: &[Arg]) -> Vec<String> {
    Getopt::new().parameters(items)
}

/// [`Getopt::options`] with names passed through verbatim
pub fn options(options: &OptionSet) -> Vec<String> {
    Getopt::new().options(options)
}
