//! # Bridge Configuration
//!
//! Knobs of an [`ExternalDeclSource`](crate::source::ExternalDeclSource).
//!
//! ## Environment Variables
//!
//! - `SYMBRIDGE_ACTIVATION_CHAR`: first character of the identifier that turns
//!   external lookups on (default: `$`)
//! - `SYMBRIDGE_LOOKUPS_ENABLED`: start with lookups already enabled
//!   (`1`/`true`/`yes`/`on`, default: off)

use std::env;

/// Default activation character.
pub const DEFAULT_ACTIVATION_CHAR: char = '$';

/// Configuration of a bridge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig
{
    /// An identifier starting with this character enables external lookups
    /// for the rest of the bridge's lifetime.
    pub activation_char: char,
    /// Skip the activation step entirely.
    pub lookups_enabled_at_start: bool,
}

impl Default for BridgeConfig
{
    fn default() -> Self
    {
        Self {
            activation_char: DEFAULT_ACTIVATION_CHAR,
            lookups_enabled_at_start: false,
        }
    }
}

impl BridgeConfig
{
    /// Read the configuration from the process environment.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self
    {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self
    {
        let defaults = Self::default();

        let activation_char = var("SYMBRIDGE_ACTIVATION_CHAR")
            .and_then(|value| {
                let mut chars = value.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Some(ch),
                    _ => None,
                }
            })
            .unwrap_or(defaults.activation_char);

        let lookups_enabled_at_start = var("SYMBRIDGE_LOOKUPS_ENABLED")
            .and_then(|value| parse_flag(&value))
            .unwrap_or(defaults.lookups_enabled_at_start);

        Self {
            activation_char,
            lookups_enabled_at_start,
        }
    }

    #[must_use]
    pub fn with_activation_char(mut self, activation_char: char) -> Self
    {
        self.activation_char = activation_char;
        self
    }

    #[must_use]
    pub fn with_lookups_enabled(mut self, enabled: bool) -> Self
    {
        self.lookups_enabled_at_start = enabled;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool>
{
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests
{
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String>
    {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults()
    {
        let config = BridgeConfig::default();
        assert_eq!(config.activation_char, '$');
        assert!(!config.lookups_enabled_at_start);
        assert_eq!(BridgeConfig::from_vars(vars(&[])), config);
    }

    #[test]
    fn test_from_vars_reads_overrides()
    {
        let config = BridgeConfig::from_vars(vars(&[
            ("SYMBRIDGE_ACTIVATION_CHAR", "@"),
            ("SYMBRIDGE_LOOKUPS_ENABLED", "Yes"),
        ]));
        assert_eq!(config.activation_char, '@');
        assert!(config.lookups_enabled_at_start);
    }

    #[test]
    fn test_from_vars_ignores_invalid_values()
    {
        let config = BridgeConfig::from_vars(vars(&[
            ("SYMBRIDGE_ACTIVATION_CHAR", "ab"),
            ("SYMBRIDGE_LOOKUPS_ENABLED", "maybe"),
        ]));
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_builders()
    {
        let config = BridgeConfig::default()
            .with_activation_char('#')
            .with_lookups_enabled(true);
        assert_eq!(config.activation_char, '#');
        assert!(config.lookups_enabled_at_start);
    }
}
