//! Configuration management for the ServiceNow client.
//!
//! This module handles loading configuration from environment variables,
//! with validation to ensure all required values are present.

use std::env;
use std::fmt;

use crate::client::DEFAULT_USER_AGENT;
use crate::error::NowError;
use crate::models::Incident;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to a ServiceNow instance.
///
/// The password is stored but never logged or exposed in error messages.
#[derive(Clone)]
pub struct Config {
    /// Base URL of the instance, always ending in `/`
    /// (e.g., `https://instance.service-now.com/`).
    pub base_url: String,

    /// User for HTTP Basic authentication.
    pub username: String,

    /// Password for HTTP Basic authentication.
    /// This value must never be logged or included in error messages.
    password: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent header value.
    pub user_agent: String,

    /// Field values applied to new incidents that leave them unset.
    pub incident_defaults: IncidentDefaults,
}

impl Config {
    /// Creates a configuration directly, validating the base URL and password.
    ///
    /// # Errors
    ///
    /// Returns `NowError::Configuration` if any value fails validation.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, NowError> {
        let base_url = Self::validate_base_url(base_url.into())?;
        let password = password.into();
        Self::validate_password(&password)?;

        Ok(Config {
            base_url,
            username: username.into(),
            password,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            incident_defaults: IncidentDefaults::default(),
        })
    }

    /// Loads configuration from environment variables.
    ///
    /// # Required Environment Variables
    ///
    /// - `SERVICENOW_BASE_URL`: The base URL of the instance
    /// - `SERVICENOW_USERNAME`: User for HTTP Basic authentication
    /// - `SERVICENOW_PASSWORD`: Password for HTTP Basic authentication
    ///
    /// # Optional Environment Variables
    ///
    /// - `SERVICENOW_TIMEOUT_SECS`: Request timeout (default 30)
    /// - `SERVICENOW_USER_AGENT`: User-Agent header value
    /// - `SERVICENOW_DEFAULT_*`: see [`IncidentDefaults::from_env`]
    ///
    /// # Errors
    ///
    /// Returns `NowError::Configuration` if any required variable is missing
    /// or if values fail validation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// dotenvy::dotenv().ok();
    /// let config = Config::from_env()?;
    /// ```
    pub fn from_env() -> Result<Self, NowError> {
        let base_url = Self::get_required_env("SERVICENOW_BASE_URL")?;
        let username = Self::get_required_env("SERVICENOW_USERNAME")?;
        let password = Self::get_required_env("SERVICENOW_PASSWORD")?;

        let mut config = Self::new(base_url, username, password)?;

        if let Some(timeout) = get_optional_env("SERVICENOW_TIMEOUT_SECS") {
            config.timeout_secs = Self::parse_timeout(&timeout)?;
        }
        if let Some(user_agent) = get_optional_env("SERVICENOW_USER_AGENT") {
            config.user_agent = user_agent;
        }
        config.incident_defaults = IncidentDefaults::from_env();

        Ok(config)
    }

    /// Returns the password. Only for building the auth transport.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    /// Gets a required environment variable, returning an error if missing or empty.
    fn get_required_env(name: &str) -> Result<String, NowError> {
        env::var(name)
            .map_err(|_| NowError::missing_env(name))
            .and_then(|value| {
                if value.trim().is_empty() {
                    Err(NowError::missing_env(name))
                } else {
                    Ok(value)
                }
            })
    }

    /// Validates the base URL and normalizes it to a single trailing slash.
    fn validate_base_url(url: String) -> Result<String, NowError> {
        let url = url.trim().trim_end_matches('/');

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(NowError::configuration(
                "SERVICENOW_BASE_URL must start with http:// or https://",
            ));
        }

        Ok(format!("{}/", url))
    }

    /// Validates the password is not a placeholder value.
    fn validate_password(password: &str) -> Result<(), NowError> {
        if password.trim().is_empty() {
            return Err(NowError::configuration("SERVICENOW_PASSWORD cannot be empty"));
        }

        let lower = password.to_lowercase();
        let placeholder_patterns = ["your_password", "placeholder", "changeme", "xxx"];

        for pattern in placeholder_patterns {
            if lower.contains(pattern) {
                return Err(NowError::configuration(
                    "SERVICENOW_PASSWORD appears to be a placeholder value",
                ));
            }
        }

        Ok(())
    }

    fn parse_timeout(value: &str) -> Result<u64, NowError> {
        match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(NowError::configuration(format!(
                "SERVICENOW_TIMEOUT_SECS must be a positive integer, got {:?}",
                value
            ))),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("incident_defaults", &self.incident_defaults)
            .finish()
    }
}

/// Gets an optional environment variable, treating blank values as unset.
fn get_optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Default field values for incidents created by this client's users.
///
/// Passed explicitly to whoever creates incidents; there is no global state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentDefaults {
    /// Caller (`caller_id`).
    pub caller_id: Option<String>,
    /// Assignment group (`assignment_group`).
    pub assignment_group: Option<String>,
    /// Category (`category`).
    pub category: Option<String>,
    /// Subcategory (`subcategory`).
    pub subcategory: Option<String>,
    /// Configuration item (`cmdb_ci`).
    pub cmdb_ci: Option<String>,
    /// Location (`location`).
    pub location: Option<String>,
    /// Impact (`impact`), e.g. "2".
    pub impact: Option<String>,
    /// Urgency (`urgency`), e.g. "2".
    pub urgency: Option<String>,
}

impl IncidentDefaults {
    /// Loads defaults from `SERVICENOW_DEFAULT_CALLER_ID`,
    /// `SERVICENOW_DEFAULT_ASSIGNMENT_GROUP`, `SERVICENOW_DEFAULT_CATEGORY`,
    /// `SERVICENOW_DEFAULT_SUBCATEGORY`, `SERVICENOW_DEFAULT_CMDB_CI`,
    /// `SERVICENOW_DEFAULT_LOCATION`, `SERVICENOW_DEFAULT_IMPACT` and
    /// `SERVICENOW_DEFAULT_URGENCY`. Unset variables leave the field empty.
    pub fn from_env() -> Self {
        Self {
            caller_id: get_optional_env("SERVICENOW_DEFAULT_CALLER_ID"),
            assignment_group: get_optional_env("SERVICENOW_DEFAULT_ASSIGNMENT_GROUP"),
            category: get_optional_env("SERVICENOW_DEFAULT_CATEGORY"),
            subcategory: get_optional_env("SERVICENOW_DEFAULT_SUBCATEGORY"),
            cmdb_ci: get_optional_env("SERVICENOW_DEFAULT_CMDB_CI"),
            location: get_optional_env("SERVICENOW_DEFAULT_LOCATION"),
            impact: get_optional_env("SERVICENOW_DEFAULT_IMPACT"),
            urgency: get_optional_env("SERVICENOW_DEFAULT_URGENCY"),
        }
    }

    /// Fills every field of `incident` that is unset with its default.
    ///
    /// Fields the incident already carries, even as empty strings, are kept.
    pub fn apply(&self, incident: &mut Incident) {
        fn fill(field: &mut Option<String>, default: &Option<String>) {
            if field.is_none() {
                field.clone_from(default);
            }
        }

        fill(&mut incident.caller_id, &self.caller_id);
        fill(&mut incident.assignment_group, &self.assignment_group);
        fill(&mut incident.category, &self.category);
        fill(&mut incident.subcategory, &self.subcategory);
        fill(&mut incident.cmdb_ci, &self.cmdb_ci);
        fill(&mut incident.location, &self.location);
        fill(&mut incident.impact, &self.impact);
        fill(&mut incident.urgency, &self.urgency);
    }
}
