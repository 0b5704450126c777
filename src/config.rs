// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use url::Url;

/// Name of the per-exam file holding the start time and roster.
pub const DESCRIPTION_FILE: &str = "description";
/// Markdown source of the exam questions.
pub const ASSIGNMENT_FILE: &str = "assignment.md";
/// Sentinel whose presence marks an exam as finished.
pub const FINISHED_FILE: &str = "finished";
/// Format of the first line of the description file.
pub const START_TIME_FORMAT: &str = "%d. %m. %Y %H:%M";

pub const DEFAULT_EXAMS_ROOT: &str = "exams";
pub const DEFAULT_CONVERTER_PROGRAM: &str = "pandoc";
pub const DEFAULT_CONVERTER_ARGS: &str = "--self-contained";
pub const DEFAULT_MAIL_FROM: &str = "kelvin@vsb.cz";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the exam store.
    pub exams_root: PathBuf,
    pub converter_program: String,
    pub converter_args: Vec<String>,
    /// `None` waits for the converter indefinitely.
    pub converter_timeout: Option<Duration>,
    /// HTTP mail relay. Without one, notifications are only logged.
    pub mail_relay_url: Option<Url>,
    pub mail_from: String,
    /// Upper bound for one request to the mail relay.
    pub mail_timeout: Duration,
    /// Origin of absolute links unless the request `Host` is in `allowed_hosts`.
    pub public_base_url: Url,
    /// Request hosts that may appear in absolute links. Empty means none.
    pub allowed_hosts: Vec<String>,
    /// Take the link scheme from `X-Forwarded-Proto` (only behind a trusted proxy).
    pub trust_forwarded_proto: bool,
    pub bind_addr: SocketAddr,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exams_root: PathBuf::from(DEFAULT_EXAMS_ROOT),
            converter_program: DEFAULT_CONVERTER_PROGRAM.to_string(),
            converter_args: split_args(DEFAULT_CONVERTER_ARGS),
            converter_timeout: None,
            mail_relay_url: None,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            mail_timeout: Duration::from_secs(DEFAULT_MAIL_TIMEOUT_SECS),
            public_base_url: Url::parse(DEFAULT_PUBLIC_BASE_URL)
                .expect("default public base URL is valid"),
            allowed_hosts: Vec::new(),
            trust_forwarded_proto: false,
            bind_addr: DEFAULT_BIND_ADDR
                .parse()
                .expect("default bind address is valid"),
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let default = Self::default();

        let exams_root = env::var("EXAMS_ROOT")
            .map(PathBuf::from)
            .unwrap_or(default.exams_root);

        let converter_program =
            env::var("CONVERTER_PROGRAM").unwrap_or(default.converter_program);

        let converter_args = env::var("CONVERTER_ARGS")
            .map(|v| split_args(&v))
            .unwrap_or(default.converter_args);

        let converter_timeout = env::var("CONVERTER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| match v.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CONVERTER_TIMEOUT_SECS: {}", v);
                    None
                }
            });

        let mail_relay_url = env::var("MAIL_RELAY_URL")
            .ok()
            .and_then(|v| match Url::parse(&v) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring invalid MAIL_RELAY_URL {}: {}", v, e);
                    None
                }
            });

        let mail_from = env::var("MAIL_FROM").unwrap_or(default.mail_from);

        let mail_timeout = env::var("MAIL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| match v.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    tracing::warn!("Ignoring invalid MAIL_TIMEOUT_SECS: {}", v);
                    None
                }
            })
            .unwrap_or(default.mail_timeout);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .and_then(|v| match Url::parse(&v) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring invalid PUBLIC_BASE_URL {}: {}", v, e);
                    None
                }
            })
            .unwrap_or(default.public_base_url);

        let allowed_hosts = env::var("ALLOWED_HOSTS")
            .map(|v| split_hosts(&v))
            .unwrap_or(default.allowed_hosts);

        let trust_forwarded_proto = env::var("TRUST_FORWARDED_PROTO")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.trust_forwarded_proto);

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.bind_addr);

        let rust_log = env::var("RUST_LOG").unwrap_or(default.rust_log);

        Self {
            exams_root,
            converter_program,
            converter_args,
            converter_timeout,
            mail_relay_url,
            mail_from,
            mail_timeout,
            public_base_url,
            allowed_hosts,
            trust_forwarded_proto,
            bind_addr,
            rust_log,
        }
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Comma-separated host list, lowercased.
fn split_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_args() {
        assert_eq!(
            split_args("  --standalone   --embed-resources "),
            vec!["--standalone", "--embed-resources"]
        );
        assert!(split_args("").is_empty());
    }

    #[test]
    fn test_split_hosts() {
        assert_eq!(
            split_hosts("Kelvin.cs.vsb.cz, localhost:3000,,"),
            vec!["kelvin.cs.vsb.cz", "localhost:3000"]
        );
    }

    #[test]
    fn test_default_trusts_no_request_host() {
        let config = Config::default();
        assert!(config.allowed_hosts.is_empty());
        assert!(!config.trust_forwarded_proto);
    }

    #[test]
    fn test_default_converter_is_self_contained_pandoc() {
        let config = Config::default();
        assert_eq!(config.converter_program, "pandoc");
        assert_eq!(config.converter_args, vec!["--self-contained"]);
        assert!(config.converter_timeout.is_none());
    }
}
