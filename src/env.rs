//! Owned snapshot of environment variables.
//!
//! Provider resolution and profile substitution read from an [`Environment`]
//! instead of the process environment, so a loaded profile can be layered on
//! top without calling `std::env::set_var`.

use std::collections::HashMap;

/// A point-in-time copy of environment variables.
///
/// Empty values are indistinguishable from unset ones: [`Environment::get`]
/// returns `None` for both.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Captures the current process environment.
    ///
    /// Variables that are not valid unicode are skipped.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Builds a snapshot from literal pairs.
    #[cfg(test)]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the value of `name` if it is set and non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Overrides `name` within this snapshot only.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_read_as_unset() {
        let env = Environment::from_pairs([("A", ""), ("B", "x")]);
        assert_eq!(env.get("A"), None);
        assert_eq!(env.get("B"), Some("x"));
        assert_eq!(env.get("MISSING"), None);
    }

    #[test]
    fn set_overrides_existing_value() {
        let mut env = Environment::from_pairs([("NURO_MODEL", "gpt-4o")]);
        env.set("NURO_MODEL", "llama3");
        assert_eq!(env.get("NURO_MODEL"), Some("llama3"));
    }
}
