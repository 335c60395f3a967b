//! Option encoding: named options to terraform argument tokens
//!
//! Option names use underscores where the CLI uses dashes (`no_color` for
//! `-no-color`); encoding restores the dashes and the leading dash. Tokens
//! are handed to process creation verbatim, never through a shell, so
//! embedded whitespace survives as a single argument.

use std::collections::BTreeMap;

/// A single option value shape.
///
/// `Unset` stands for "omit this option entirely": options are sparse, and
/// an explicit `Unset` cancels a default inherited via
/// [`OptionSet::merge_defaults`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Presence-only flag: `-name`
    Flag,
    /// Omit the option entirely
    Unset,
    /// `-name=true` / `-name=false`
    Bool(bool),
    /// `-name=value`
    Str(String),
    /// One `-name=value` token per element, in list order
    List(Vec<String>),
    /// One `-name='key=value'` token per entry, in key order
    Map(BTreeMap<String, String>),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

impl From<BTreeMap<String, String>> for OptionValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        OptionValue::Map(value)
    }
}

/// Insertion-ordered set of named options.
///
/// Setting a name twice replaces the value but keeps the original position,
/// so callers control token order through insertion order. Names are opaque:
/// no whitelist check is performed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(String, OptionValue)>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value for the same name in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Chained variant of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Layer a default set underneath this one.
    ///
    /// Names already present keep their value and position (an explicit
    /// `Unset` therefore cancels the default); missing defaults are appended
    /// in the defaults' own order.
    pub fn merge_defaults(&mut self, defaults: &OptionSet) {
        for (name, value) in &defaults.entries {
            if self.get(name).is_none() {
                self.entries.push((name.clone(), value.clone()));
            }
        }
    }

    /// Encode the set into argument tokens.
    ///
    /// Per entry: underscores in the name become dashes, one leading dash is
    /// prepended, and the value shape decides the token form. `Unset` values
    /// and empty lists emit nothing.
    pub fn encode(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        for (name, value) in &self.entries {
            let flag = name.replace('_', "-");
            match value {
                OptionValue::Unset => {}
                OptionValue::Flag => tokens.push(format!("-{flag}")),
                OptionValue::Bool(b) => tokens.push(format!("-{flag}={b}")),
                OptionValue::Str(s) => tokens.push(format!("-{flag}={s}")),
                OptionValue::List(items) => {
                    tokens.extend(items.iter().map(|item| format!("-{flag}={item}")));
                }
                OptionValue::Map(map) => {
                    tokens.extend(map.iter().map(|(k, v)| format!("-{flag}='{k}={v}'")));
                }
            }
        }
        tokens
    }
}

impl FromIterator<(String, OptionValue)> for OptionSet {
    fn from_iter<T: IntoIterator<Item = (String, OptionValue)>>(iter: T) -> Self {
        let mut set = OptionSet::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}
