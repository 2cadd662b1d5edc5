//! Environment-driven configuration helpers shared by the binaries.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Read a required, non-empty variable through `lookup`.
pub fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Read an optional variable and parse it, falling back to `default` when unset.
pub fn parsed_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => v.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: v.clone(),
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

/// Process environment lookup used by the `from_env` constructors.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        let lookup = lookup_from(&[("A", "x"), ("B", "  ")]);
        assert_eq!(required(&lookup, "A").unwrap(), "x");
        assert_eq!(required(&lookup, "B"), Err(ConfigError::Missing("B")));
        assert_eq!(required(&lookup, "C"), Err(ConfigError::Missing("C")));
    }

    #[test]
    fn parsed_or_defaults_and_reports_bad_values() {
        let lookup = lookup_from(&[("PORT", "9090"), ("BAD", "nope")]);
        assert_eq!(parsed_or(&lookup, "PORT", 8080u16).unwrap(), 9090);
        assert_eq!(parsed_or(&lookup, "UNSET", 8080u16).unwrap(), 8080);
        assert!(matches!(
            parsed_or(&lookup, "BAD", 8080u16),
            Err(ConfigError::Invalid { name: "BAD", .. })
        ));
    }
}
