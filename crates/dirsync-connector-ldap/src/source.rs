//! LDAP directory source implementation
//!
//! Implements `ExternalDirectorySource` over an LDAP v3 directory.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use dirsync_connector::{
    ConnectorError, ConnectorResult, ExternalDirectorySource, ExternalGroupRecord, PageRequest,
};

use crate::config::LdapConfig;

/// LDAP result code for invalid credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP result code for a missing search base.
const RC_NO_SUCH_OBJECT: u32 = 32;

/// Group source backed by an LDAP directory.
pub struct LdapDirectorySource {
    /// Configuration.
    config: LdapConfig,

    /// Display name for this source instance.
    display_name: String,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapDirectorySource {
    /// Create a new LDAP source with the given configuration.
    pub fn new(config: LdapConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let display_name = format!("LDAP: {}", config.host);

        Ok(Self {
            config,
            display_name,
            connection: Arc::new(RwLock::new(None)),
        })
    }

    /// Cached session, or a freshly bound one.
    async fn session(&self) -> ConnectorResult<Ldap> {
        if let Some(ldap) = self.connection.read().await.as_ref() {
            return Ok(ldap.clone());
        }

        let ldap = self.bind().await?;
        *self.connection.write().await = Some(ldap.clone());
        Ok(ldap)
    }

    /// Forget the cached session so the next call binds again.
    async fn invalidate_connection(&self) {
        self.connection.write().await.take();
    }

    /// Open a connection and authenticate with the configured bind DN.
    async fn bind(&self) -> ConnectorResult<Ldap> {
        let url = self.config.url();
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.timeout())
            .set_starttls(self.config.use_starttls);

        debug!(%url, starttls = self.config.use_starttls, "Opening LDAP connection");
        let (driver, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(format!("cannot reach {url}"), e)
            })?;

        tokio::spawn(async move {
            if let Err(e) = driver.drive().await {
                warn!(error = %e, "LDAP connection closed with error");
            }
        });

        let bind_dn = self.config.bind_dn.as_str();
        let password = self.config.bind_password.as_deref().unwrap_or_default();
        let result = self
            .with_deadline(ldap.simple_bind(bind_dn, password))
            .await?
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(format!("bind as {bind_dn}"), e)
            })?;

        match result.rc {
            0 => {}
            RC_INVALID_CREDENTIALS => {
                warn!(%bind_dn, "LDAP bind rejected");
                return Err(ConnectorError::AuthenticationFailed);
            }
            rc => {
                return Err(ConnectorError::connection_failed(format!(
                    "bind as {bind_dn} returned code {rc}: {}",
                    result.text
                )));
            }
        }

        info!(host = %self.config.host, %bind_dn, "LDAP session bound");
        Ok(ldap)
    }

    /// Bound `future` by the configured request timeout.
    async fn with_deadline<F: Future>(&self, future: F) -> ConnectorResult<F::Output> {
        tokio::time::timeout(self.config.timeout(), future)
            .await
            .map_err(|_| ConnectorError::ConnectionTimeout {
                timeout_secs: self.config.timeout_secs,
            })
    }

    /// Filter for groups whose display name contains `query`.
    fn search_filter(&self, query: Option<&str>) -> String {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => format!(
                "(&{}({}=*{}*))",
                self.config.group_filter,
                self.config.display_name_attribute,
                ldap_escape(q)
            ),
            None => self.config.group_filter.clone(),
        }
    }

    /// Filter matching exactly one group by remote id.
    fn lookup_filter(&self, remote_id: &str) -> String {
        format!(
            "(&{}({}={}))",
            self.config.group_filter,
            self.config.id_attribute,
            ldap_escape(remote_id)
        )
    }

    fn attributes(&self) -> Vec<&str> {
        vec![
            self.config.id_attribute.as_str(),
            self.config.display_name_attribute.as_str(),
            self.config.member_attribute.as_str(),
        ]
    }

    /// Run a subtree search under the group container.
    async fn search_entries(&self, filter: &str) -> ConnectorResult<Vec<SearchEntry>> {
        let mut ldap = self.session().await?;
        let base = self.config.group_dn();

        debug!(filter = %filter, base_dn = %base, "Searching LDAP");

        let outcome = self
            .with_deadline(ldap.search(&base, Scope::Subtree, filter, self.attributes()))
            .await;

        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                self.invalidate_connection().await;
                return Err(ConnectorError::operation_failed_with_source(
                    "LDAP search failed",
                    e,
                ));
            }
            Err(timeout) => {
                self.invalidate_connection().await;
                return Err(timeout);
            }
        };

        match result.success() {
            Ok((entries, _)) => Ok(entries.into_iter().map(SearchEntry::construct).collect()),
            Err(LdapError::LdapResult { result }) if result.rc == RC_NO_SUCH_OBJECT => {
                warn!(base_dn = %base, "Group search base does not exist");
                Ok(Vec::new())
            }
            Err(e) => Err(ConnectorError::operation_failed_with_source(
                "LDAP search failed",
                e,
            )),
        }
    }

    /// Convert an entry into a group record.
    ///
    /// Returns `None` for entries without a textual remote id.
    fn entry_to_record(&self, entry: &SearchEntry) -> Option<ExternalGroupRecord> {
        let remote_id = first_value(entry, &self.config.id_attribute)?;
        let display_name = first_value(entry, &self.config.display_name_attribute)
            .unwrap_or_default()
            .to_string();
        let has_nested_entries = attr_values(entry, &self.config.member_attribute)
            .is_some_and(|values| !values.is_empty());

        Some(ExternalGroupRecord {
            remote_id: remote_id.to_string(),
            display_name,
            has_nested_entries,
        })
    }

    fn entries_to_records(&self, entries: &[SearchEntry]) -> Vec<ExternalGroupRecord> {
        entries
            .iter()
            .filter_map(|entry| {
                let record = self.entry_to_record(entry);
                if record.is_none() {
                    warn!(
                        dn = %entry.dn,
                        attribute = %self.config.id_attribute,
                        "Skipping group entry without a textual id"
                    );
                }
                record
            })
            .collect()
    }
}

/// Look up an attribute case-insensitively.
fn attr_values<'a>(entry: &'a SearchEntry, name: &str) -> Option<&'a Vec<String>> {
    entry
        .attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values)
}

fn first_value<'a>(entry: &'a SearchEntry, name: &str) -> Option<&'a str> {
    attr_values(entry, name)
        .and_then(|values| values.first())
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl ExternalDirectorySource for LdapDirectorySource {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Bind from scratch and read the base entry.
    #[instrument(skip(self))]
    async fn test_connection(&self) -> ConnectorResult<()> {
        self.invalidate_connection().await;
        let mut ldap = self.session().await?;
        let base_dn = self.config.base_dn.as_str();

        let probe = |e: LdapError| {
            ConnectorError::connection_failed_with_source(format!("cannot read {base_dn}"), e)
        };
        let (entries, _) = self
            .with_deadline(ldap.search(base_dn, Scope::Base, "(objectClass=*)", vec!["1.1"]))
            .await?
            .map_err(probe)?
            .success()
            .map_err(probe)?;

        if entries.is_empty() {
            return Err(ConnectorError::connection_failed(format!(
                "base DN {base_dn} is not visible to {}",
                self.config.bind_dn
            )));
        }

        info!(%base_dn, "LDAP directory reachable");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn search_groups(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> ConnectorResult<Vec<ExternalGroupRecord>> {
        let entries = self.search_entries(&self.search_filter(query)).await?;
        let mut records = self.entries_to_records(&entries);

        // Server-side substring matching follows the attribute's matching
        // rule, which is not always case-insensitive.
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let needle = q.to_lowercase();
            records.retain(|r| r.display_name.to_lowercase().contains(&needle));
        }
        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let total = records.len();
        let page_records = page.slice(records);

        debug!(
            matched = total,
            returned = page_records.len(),
            page = page.page,
            "LDAP group page served"
        );

        Ok(page_records)
    }

    #[instrument(skip(self))]
    async fn get_group(&self, remote_id: &str) -> ConnectorResult<Option<ExternalGroupRecord>> {
        let entries = self.search_entries(&self.lookup_filter(remote_id)).await?;
        let mut records = self.entries_to_records(&entries);

        if records.len() > 1 {
            return Err(ConnectorError::invalid_data(format!(
                "{} entries share {}={}",
                records.len(),
                self.config.id_attribute,
                remote_id
            )));
        }

        Ok(records.pop())
    }
}

impl std::fmt::Debug for LdapDirectorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapDirectorySource")
            .field("display_name", &self.display_name)
            .field("config", &self.config.redacted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_source() -> LdapDirectorySource {
        LdapDirectorySource::new(
            LdapConfig::new("ldap.example.com", "dc=example,dc=com", "cn=admin,dc=example,dc=com")
                .with_group_container("ou=groups"),
        )
        .unwrap()
    }

    /// Build an entry; repeat a key for multi-valued attributes.
    fn entry(pairs: &[(&str, &str)]) -> SearchEntry {
        let mut attrs: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            attrs
                .entry((*key).to_string())
                .or_default()
                .push((*value).to_string());
        }
        SearchEntry {
            dn: "cn=test,ou=groups,dc=example,dc=com".to_string(),
            attrs,
            bin_attrs: HashMap::new(),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LdapConfig::new("", "dc=example,dc=com", "cn=admin");
        assert!(LdapDirectorySource::new(config).is_err());
    }

    #[test]
    fn test_search_filter_without_query() {
        let source = test_source();
        assert_eq!(source.search_filter(None), "(objectClass=groupOfNames)");
        assert_eq!(source.search_filter(Some("  ")), "(objectClass=groupOfNames)");
    }

    #[test]
    fn test_search_filter_escapes_query() {
        let source = test_source();
        assert_eq!(
            source.search_filter(Some("eng*(x)")),
            "(&(objectClass=groupOfNames)(cn=*eng\\2a\\28x\\29*))"
        );
    }

    #[test]
    fn test_lookup_filter() {
        let source = test_source();
        assert_eq!(
            source.lookup_filter("abc-123"),
            "(&(objectClass=groupOfNames)(entryUUID=abc-123))"
        );
        assert_eq!(
            source.lookup_filter("a)(cn=*"),
            "(&(objectClass=groupOfNames)(entryUUID=a\\29\\28cn=\\2a))"
        );
    }

    #[test]
    fn test_entry_to_record() {
        let source = test_source();
        let record = source
            .entry_to_record(&entry(&[
                ("entryUUID", "ext-1"),
                ("cn", "Engineering"),
                ("member", "uid=a,dc=example,dc=com"),
            ]))
            .unwrap();
        assert_eq!(record.remote_id, "ext-1");
        assert_eq!(record.display_name, "Engineering");
        assert!(record.has_nested_entries);
    }

    #[test]
    fn test_entry_attribute_names_are_case_insensitive() {
        let source = test_source();
        let record = source
            .entry_to_record(&entry(&[("entryuuid", "ext-2"), ("CN", "Ops")]))
            .unwrap();
        assert_eq!(record.remote_id, "ext-2");
        assert_eq!(record.display_name, "Ops");
        assert!(!record.has_nested_entries);
    }

    #[test]
    fn test_entry_without_id_is_skipped() {
        let source = test_source();
        let entries = vec![
            entry(&[("cn", "No Id")]),
            entry(&[("entryUUID", "ext-3"), ("cn", "Has Id")]),
        ];
        let records = source.entries_to_records(&entries);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].remote_id, "ext-3");
    }

    #[test]
    fn test_entry_without_display_name_keeps_empty_name() {
        let source = test_source();
        let record = source
            .entry_to_record(&entry(&[("entryUUID", "ext-4")]))
            .unwrap();
        assert!(record.display_name.is_empty());
    }

    #[test]
    fn test_debug_hides_password() {
        let source = LdapDirectorySource::new(
            LdapConfig::new("ldap.example.com", "dc=example,dc=com", "cn=admin")
                .with_password("hunter2"),
        )
        .unwrap();
        let debug = format!("{source:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("LDAP: ldap.example.com"));
    }
}
