//! Connection configuration.

use std::collections::HashMap;

/// Configuration for a remote session: the protocol to request plus
/// arbitrary named parameters.
///
/// Built once from the command line before connecting; immutable
/// afterwards. Parameter order is irrelevant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// The protocol to request (e.g. `vnc`, `rdp`).
    pub protocol: String,
    /// Protocol-specific parameters (e.g. `hostname`, `port`).
    pub parameters: HashMap<String, String>,
}

impl ConnectConfig {
    /// Create a configuration for the given protocol with no parameters.
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            parameters: HashMap::new(),
        }
    }

    /// Set a named parameter, replacing any previous value.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    /// Look up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_parameter_replaces() {
        let mut config = ConnectConfig::new("vnc");
        config.set_parameter("hostname", "a");
        config.set_parameter("hostname", "b");
        assert_eq!(config.parameter("hostname"), Some("b"));
        assert_eq!(config.parameter("missing"), None);
    }
}
