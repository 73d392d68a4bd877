//! Command-line argument parsing.
//!
//! The surface deliberately mirrors how a gateway is configured: apart
//! from a handful of recognized options, every `--name=value` pair is
//! forwarded verbatim as a protocol parameter. That rules out a
//! declarative parser, so this is a small hand-rolled pass over argv.

use std::time::Duration;

use stress_client::ConnectConfig;
use thiserror::Error;

/// Default gateway endpoint.
pub const DEFAULT_HOST: &str = "localhost";
/// Default gateway port.
pub const DEFAULT_PORT: u16 = 4822;

/// Fully parsed invocation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Gateway host to connect to.
    pub host: String,
    /// Gateway port to connect to.
    pub port: u16,
    /// Session time limit; zero means unlimited.
    pub time_limit: Duration,
    /// Whether the load generator is enabled.
    pub hammer: bool,
    /// Protocol and forwarded parameters.
    pub config: ConnectConfig,
}

/// Configuration errors, all fatal before any connection is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    /// No usable `--protocol=NAME` was given.
    #[error("required option --protocol was not specified")]
    MissingProtocol,

    /// The port in `host:port` did not parse.
    #[error("invalid port {0:?}")]
    InvalidPort(String),

    /// `--time-limit` was not a millisecond count.
    #[error("invalid time limit {0:?} (expected milliseconds)")]
    InvalidTimeLimit(String),
}

/// Parse command-line arguments (excluding the program name).
///
/// Recognized: positional `host[:port]` (last occurrence wins),
/// `--protocol=NAME` (required), `--time-limit=MS`, `--enable=hammer`.
/// Anything else of the form `--name[=value]` becomes a protocol
/// parameter; a missing value is forwarded as the empty string.
pub fn parse_args(args: &[String]) -> Result<Options, ArgsError> {
    let mut host = DEFAULT_HOST.to_string();
    let mut port = DEFAULT_PORT;
    let mut time_limit = Duration::ZERO;
    let mut hammer = false;
    let mut protocol: Option<String> = None;
    let mut parameters: Vec<(String, String)> = Vec::new();

    for arg in args {
        match split_flag(arg) {
            // Positional: host[:port].
            None => match arg.split_once(':') {
                Some((h, p)) => {
                    host = h.to_string();
                    port = p
                        .parse()
                        .map_err(|_| ArgsError::InvalidPort(p.to_string()))?;
                }
                None => host = arg.clone(),
            },
            Some(("protocol", value)) => protocol = value.map(str::to_string),
            Some(("time-limit", value)) => {
                let value = value.unwrap_or("");
                let millis: u64 = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidTimeLimit(value.to_string()))?;
                time_limit = Duration::from_millis(millis);
            }
            Some(("enable", value)) => {
                if value == Some("hammer") {
                    hammer = true;
                }
            }
            Some((name, value)) => {
                parameters.push((name.to_string(), value.unwrap_or("").to_string()));
            }
        }
    }

    let mut config = ConnectConfig::new(protocol.ok_or(ArgsError::MissingProtocol)?);
    for (name, value) in parameters {
        config.set_parameter(name, value);
    }

    Ok(Options {
        host,
        port,
        time_limit,
        hammer,
        config,
    })
}

/// Split `--name[=value]` into its parts; `None` for positional arguments.
fn split_flag(arg: &str) -> Option<(&str, Option<&str>)> {
    let body = arg.strip_prefix("--")?;
    match body.split_once('=') {
        Some((name, value)) => Some((name, Some(value))),
        None => Some((body, None)),
    }
}
