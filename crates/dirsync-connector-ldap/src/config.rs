//! LDAP directory source configuration.

use std::env::VarError;
use std::time::Duration;

use dirsync_connector::{ConnectorError, ConnectorResult};
use dirsync_core::config::{optional, parse_or, required, ConfigError, EnvReader};

/// Plain LDAP port.
pub const LDAP_PORT: u16 = 389;

/// LDAPS port.
pub const LDAPS_PORT: u16 = 636;

pub const DEFAULT_GROUP_FILTER: &str = "(objectClass=groupOfNames)";
pub const DEFAULT_ID_ATTRIBUTE: &str = "entryUUID";
pub const DEFAULT_DISPLAY_NAME_ATTRIBUTE: &str = "cn";
pub const DEFAULT_MEMBER_ATTRIBUTE: &str = "member";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const MASK: &str = "***REDACTED***";

/// Where and how to reach the group directory.
#[derive(Clone)]
pub struct LdapConfig {
    pub host: String,
    pub port: u16,
    /// Connect over `ldaps://`.
    pub use_ssl: bool,
    /// Upgrade a plain connection with StartTLS.
    pub use_starttls: bool,
    /// Search root, e.g. `dc=corp,dc=internal`.
    pub base_dn: String,
    /// DN used for the simple bind.
    pub bind_dn: String,
    pub bind_password: Option<String>,
    /// RDN under `base_dn` holding the groups, e.g. `ou=groups`.
    pub group_container: Option<String>,
    /// Filter selecting group entries.
    pub group_filter: String,
    /// Attribute carrying the stable remote id.
    pub id_attribute: String,
    pub display_name_attribute: String,
    /// Attribute listing the group's members.
    pub member_attribute: String,
    /// Bound on connecting and on each request.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("url", &self.url())
            .field("use_starttls", &self.use_starttls)
            .field("bind_dn", &self.bind_dn)
            .field("bind_password", &self.bind_password.as_ref().map(|_| MASK))
            .field("group_dn", &self.group_dn())
            .field("group_filter", &self.group_filter)
            .field("id_attribute", &self.id_attribute)
            .field("display_name_attribute", &self.display_name_attribute)
            .field("member_attribute", &self.member_attribute)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LdapConfig {
    /// Plain LDAP on port 389 with the default group schema.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        bind_dn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: LDAP_PORT,
            use_ssl: false,
            use_starttls: false,
            base_dn: base_dn.into(),
            bind_dn: bind_dn.into(),
            bind_password: None,
            group_container: None,
            group_filter: DEFAULT_GROUP_FILTER.to_string(),
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            display_name_attribute: DEFAULT_DISPLAY_NAME_ATTRIBUTE.to_string(),
            member_attribute: DEFAULT_MEMBER_ATTRIBUTE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_password(self, password: impl Into<String>) -> Self {
        Self {
            bind_password: Some(password.into()),
            ..self
        }
    }

    /// Switch to LDAPS on port 636.
    #[must_use]
    pub fn with_ssl(self) -> Self {
        Self {
            use_ssl: true,
            port: LDAPS_PORT,
            ..self
        }
    }

    #[must_use]
    pub fn with_starttls(self) -> Self {
        Self {
            use_starttls: true,
            ..self
        }
    }

    #[must_use]
    pub fn with_group_container(self, container: impl Into<String>) -> Self {
        Self {
            group_container: Some(container.into()),
            ..self
        }
    }

    /// Search base for groups.
    #[must_use]
    pub fn group_dn(&self) -> String {
        self.group_container
            .as_ref()
            .map_or_else(|| self.base_dn.clone(), |rdn| format!("{rdn},{}", self.base_dn))
    }

    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> ConnectorResult<()> {
        let required = [
            ("host", &self.host),
            ("base_dn", &self.base_dn),
            ("bind_dn", &self.bind_dn),
            ("id_attribute", &self.id_attribute),
            ("display_name_attribute", &self.display_name_attribute),
            ("member_attribute", &self.member_attribute),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConnectorError::invalid_configuration(format!(
                    "{field} is required"
                )));
            }
        }

        let filter = self.group_filter.trim();
        if !(filter.starts_with('(') && filter.ends_with(')')) {
            return Err(ConnectorError::invalid_configuration(
                "group_filter must be a parenthesized LDAP filter",
            ));
        }

        if self.use_ssl && self.use_starttls {
            return Err(ConnectorError::invalid_configuration(
                "cannot use both SSL and STARTTLS",
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConnectorError::invalid_configuration(
                "timeout_secs must be at least 1",
            ));
        }

        Ok(())
    }

    /// Copy with the password masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            bind_password: self.bind_password.as_ref().map(|_| MASK.to_string()),
            ..self.clone()
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key: &str| std::env::var(key))
    }

    /// Load from a custom variable reader.
    ///
    /// # Environment Variables
    ///
    /// - `LDAP_HOST`, `LDAP_BASE_DN`, `LDAP_BIND_DN` (required)
    /// - `LDAP_PORT` (default 389, or 636 with `LDAP_USE_SSL`)
    /// - `LDAP_USE_SSL`, `LDAP_STARTTLS` (default false)
    /// - `LDAP_BIND_PASSWORD`
    /// - `LDAP_GROUP_CONTAINER`
    /// - `LDAP_GROUP_FILTER` (default `(objectClass=groupOfNames)`)
    /// - `LDAP_GROUP_ID_ATTRIBUTE` (default `entryUUID`)
    /// - `LDAP_GROUP_DISPLAY_NAME_ATTRIBUTE` (default `cn`)
    /// - `LDAP_GROUP_MEMBER_ATTRIBUTE` (default `member`)
    /// - `LDAP_TIMEOUT_SECS` (default 30)
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        Self::load(&reader)
    }

    fn load<R: EnvReader>(reader: &R) -> Result<Self, ConfigError> {
        let mut config = Self::new(
            required(reader, "LDAP_HOST")?,
            required(reader, "LDAP_BASE_DN")?,
            required(reader, "LDAP_BIND_DN")?,
        );

        config.use_ssl = parse_or(reader, "LDAP_USE_SSL", false)?;
        config.use_starttls = parse_or(reader, "LDAP_STARTTLS", false)?;
        let default_port = if config.use_ssl { LDAPS_PORT } else { LDAP_PORT };
        config.port = parse_or(reader, "LDAP_PORT", default_port)?;
        config.bind_password = optional(reader, "LDAP_BIND_PASSWORD");
        config.group_container = optional(reader, "LDAP_GROUP_CONTAINER");
        if let Some(filter) = optional(reader, "LDAP_GROUP_FILTER") {
            config.group_filter = filter;
        }
        if let Some(attr) = optional(reader, "LDAP_GROUP_ID_ATTRIBUTE") {
            config.id_attribute = attr;
        }
        if let Some(attr) = optional(reader, "LDAP_GROUP_DISPLAY_NAME_ATTRIBUTE") {
            config.display_name_attribute = attr;
        }
        if let Some(attr) = optional(reader, "LDAP_GROUP_MEMBER_ATTRIBUTE") {
            config.member_attribute = attr;
        }
        config.timeout_secs = parse_or(reader, "LDAP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        config
            .validate()
            .map_err(|e| ConfigError::InvalidValue("LDAP".to_string(), e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_reader(vars: HashMap<&str, &str>) -> impl Fn(&str) -> Result<String, VarError> {
        let owned: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| owned.get(key).cloned().ok_or(VarError::NotPresent)
    }

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LDAP_HOST", "ldap.example.com"),
            ("LDAP_BASE_DN", "dc=example,dc=com"),
            ("LDAP_BIND_DN", "cn=admin,dc=example,dc=com"),
        ])
    }

    #[test]
    fn test_from_reader_defaults() {
        let config = LdapConfig::from_reader(make_reader(base_vars())).unwrap();
        assert_eq!(config.port, 389);
        assert_eq!(config.group_filter, "(objectClass=groupOfNames)");
        assert_eq!(config.id_attribute, "entryUUID");
        assert_eq!(config.display_name_attribute, "cn");
        assert_eq!(config.member_attribute, "member");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.bind_password.is_none());
        assert_eq!(config.url(), "ldap://ldap.example.com:389");
    }

    #[test]
    fn test_from_reader_ssl_default_port() {
        let mut vars = base_vars();
        vars.insert("LDAP_USE_SSL", "true");
        let config = LdapConfig::from_reader(make_reader(vars)).unwrap();
        assert_eq!(config.port, 636);
        assert_eq!(config.url(), "ldaps://ldap.example.com:636");
    }

    #[test]
    fn test_from_reader_overrides() {
        let mut vars = base_vars();
        vars.insert("LDAP_GROUP_CONTAINER", "ou=groups");
        vars.insert("LDAP_GROUP_FILTER", "(objectClass=group)");
        vars.insert("LDAP_GROUP_ID_ATTRIBUTE", "gidNumber");
        vars.insert("LDAP_BIND_PASSWORD", "secret");
        let config = LdapConfig::from_reader(make_reader(vars)).unwrap();
        assert_eq!(config.group_dn(), "ou=groups,dc=example,dc=com");
        assert_eq!(config.group_filter, "(objectClass=group)");
        assert_eq!(config.id_attribute, "gidNumber");
        assert_eq!(config.bind_password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_from_reader_missing_host() {
        let mut vars = base_vars();
        vars.remove("LDAP_HOST");
        let err = LdapConfig::from_reader(make_reader(vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref k) if k == "LDAP_HOST"));
    }

    #[test]
    fn test_validate_rejects_ssl_and_starttls() {
        let config = LdapConfig::new("ldap.example.com", "dc=example,dc=com", "cn=admin")
            .with_ssl()
            .with_starttls();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bare_filter() {
        let mut config = LdapConfig::new("ldap.example.com", "dc=example,dc=com", "cn=admin");
        config.group_filter = "objectClass=group".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "DIRECTORY_CONFIG_INVALID");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = LdapConfig::new("ldap.example.com", "dc=example,dc=com", "cn=admin")
            .with_password("hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***REDACTED***"));
        assert_eq!(
            config.redacted().bind_password.as_deref(),
            Some("***REDACTED***")
        );
    }
}
