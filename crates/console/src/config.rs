use std::time::Duration;

use faqdesk_core::roles::{Actor, ROLE_CURATOR};
use faqdesk_gateway::payload::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Shortest and longest accepted quiet period for debounced inputs.
pub const MIN_DEBOUNCE: Duration = Duration::from_millis(300);
pub const MAX_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Console configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local Inbox API.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Inbox API base URL (default: `http://localhost:8000/api/v1`).
    pub api_url: String,
    /// Optional bearer token sent with every request.
    pub api_token: Option<String>,
    /// Whether the FAQ (promote / convert) path exists (default: `true`).
    pub faq_enabled: bool,
    /// Whether approve / promote / attach need a citation (default: `true`).
    pub require_citations: bool,
    /// Items fetched per status bucket per page (default: `25`).
    pub page_size: u32,
    /// Quiet period for debounced search input, within 300-500ms.
    pub search_debounce: Duration,
    /// Per-request timeout; `None` when `REQUEST_TIMEOUT_SECS=0`.
    pub request_timeout: Option<Duration>,
    /// Identity the console acts as.
    pub actor: Actor,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api/v1".into(),
            api_token: None,
            faq_enabled: true,
            require_citations: true,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: Duration::from_millis(400),
            request_timeout: Some(Duration::from_secs(30)),
            actor: Actor::new("cli", ROLE_CURATOR),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                        |
    /// |------------------------|--------------------------------|
    /// | `INBOX_API_URL`        | `http://localhost:8000/api/v1` |
    /// | `INBOX_API_TOKEN`      | unset                          |
    /// | `FAQ_CREATION_ENABLED` | `true`                         |
    /// | `REQUIRE_CITATIONS`    | `true`                         |
    /// | `INBOX_PAGE_SIZE`      | `25`                           |
    /// | `SEARCH_DEBOUNCE_MS`   | `400`                          |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                           |
    /// | `INBOX_ACTOR_ID`       | `cli`                          |
    /// | `INBOX_ACTOR_EMAIL`    | unset                          |
    /// | `INBOX_ACTOR_ROLE`     | `curator`                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = get("INBOX_API_URL").unwrap_or(defaults.api_url);
        let api_token = get("INBOX_API_TOKEN");

        let faq_enabled = match get("FAQ_CREATION_ENABLED") {
            Some(v) => parse_bool("FAQ_CREATION_ENABLED", &v)?,
            None => defaults.faq_enabled,
        };
        let require_citations = match get("REQUIRE_CITATIONS") {
            Some(v) => parse_bool("REQUIRE_CITATIONS", &v)?,
            None => defaults.require_citations,
        };

        let page_size = match get("INBOX_PAGE_SIZE") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if (1..=MAX_PAGE_SIZE).contains(&n) => n,
                _ => return Err(invalid("INBOX_PAGE_SIZE", v)),
            },
            None => defaults.page_size,
        };

        let search_debounce = match get("SEARCH_DEBOUNCE_MS") {
            Some(v) => {
                let ms: u64 = v.parse().map_err(|_| invalid("SEARCH_DEBOUNCE_MS", v))?;
                Duration::from_millis(ms).clamp(MIN_DEBOUNCE, MAX_DEBOUNCE)
            }
            None => defaults.search_debounce,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v.parse().map_err(|_| invalid("REQUEST_TIMEOUT_SECS", v))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => defaults.request_timeout,
        };

        let mut actor = Actor::new(
            get("INBOX_ACTOR_ID").unwrap_or_else(|| defaults.actor.id.clone()),
            get("INBOX_ACTOR_ROLE").unwrap_or_else(|| defaults.actor.role.clone()),
        );
        if let Some(email) = get("INBOX_ACTOR_EMAIL") {
            actor = actor.with_email(email);
        }

        Ok(Self {
            api_url,
            api_token,
            faq_enabled,
            require_citations,
            page_size,
            search_debounce,
            request_timeout,
            actor,
        })
    }
}

fn invalid(var: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid { var, value }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, value.to_string())),
    }
}
