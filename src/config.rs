use crate::error::ClientError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_SESSION_FILE: &str = ".taskboard/session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    /// Django routes end in `/`; the client appends it to every path when set.
    pub trailing_slash: bool,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            trailing_slash: false,
        }
    }

    pub fn from_env() -> Result<Self, ClientError> {
        let timeout_secs = match env::var("TASKBOARD_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ClientError::Config(format!("TASKBOARD_TIMEOUT_SECS must be a number, got {:?}", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        let trailing_slash = match env::var("TASKBOARD_TRAILING_SLASH") {
            Ok(raw) => parse_flag(&raw).ok_or_else(|| {
                ClientError::Config(format!("TASKBOARD_TRAILING_SLASH must be true or false, got {:?}", raw))
            })?,
            Err(_) => true,
        };

        Ok(Self {
            api_base_url: env::var("TASKBOARD_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            session_file: env::var("TASKBOARD_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            request_timeout: Duration::from_secs(timeout_secs),
            trailing_slash,
        })
    }

    /// Joins an API path onto the base URL.
    pub fn endpoint_url(&self, path: &str) -> String {
        let mut url = format!("{}/{}", self.api_base_url, path.trim_start_matches('/'));
        if self.trailing_slash && !url.ends_with('/') {
            url.push('/');
        }
        url
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
