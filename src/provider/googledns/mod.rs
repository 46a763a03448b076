mod auth;
mod client;
mod types;

use std::{thread::sleep, time::Duration};

use log::{debug, info, trace};
use mockall_double::double;
use serde::Deserialize;

use self::auth::ServiceAccountKey;
#[double]
use self::client::CloudDnsClient;
use self::types::{Change, ManagedZone, ResourceRecordSet, RECORD_TYPE_TXT};

use super::{absolute_name, find_zone, Provider, ProviderError};
use crate::config::{ChallengeRecord, DEFAULT_CHALLENGE_TTL, TTL};

const CHANGE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A [`Provider`] for Google Cloud DNS, authenticated with a service account.
///
/// Record creation blocks until Cloud DNS reports the change as applied.
///
/// To create a provider, use the [`GoogleDnsProvider::from_config()`] function.
#[non_exhaustive]
pub struct GoogleDnsProvider {
    api: CloudDnsClient,
    project: String,
    ttl: TTL,
    poll_interval: Duration,
}

/// Configuration for a [`GoogleDnsProvider`].
///
/// The plugin reads a complete service account key file from stdin. Apart from the key itself,
/// only the project is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct GoogleDnsConfig {
    /// Project that owns the managed zones
    pub project_id: String,
    /// TTL for challenge records, defaults to 30 seconds
    #[serde(default)]
    pub ttl: Option<TTL>,
}

impl GoogleDnsProvider {
    /// Create a provider from the project config and the raw service account key file
    pub fn from_config(
        config: &GoogleDnsConfig,
        service_account: &[u8],
    ) -> Result<Box<dyn Provider>, ProviderError> {
        let api = ServiceAccountKey::from_json(service_account)
            .and_then(|key| CloudDnsClient::try_new(&key))
            .map_err(|e| e.context("Error creating google DNS client"))?;
        info!("Authenticated with Cloud DNS for project {}", config.project_id);

        Ok(Box::new(GoogleDnsProvider {
            api,
            project: config.project_id.to_owned(),
            ttl: config.ttl.unwrap_or(DEFAULT_CHALLENGE_TTL),
            poll_interval: CHANGE_POLL_INTERVAL,
        }))
    }

    fn zone(&self, domain: &str) -> Result<ManagedZone, ProviderError> {
        let zones = self.api.list_managed_zones(&self.project)?;
        trace!("Collected zones {:?}", zones);

        find_zone(domain, &zones, |z| z.dns_name.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::ZoneNotFound(domain.to_owned()))
    }

    // Block until Cloud DNS has applied the change
    fn wait_for_change(&self, zone: &str, mut change: Change) -> Result<Change, ProviderError> {
        while change.is_pending() {
            let id = change
                .id
                .to_owned()
                .ok_or_else(|| ProviderError::Internal("pending change without id".to_string()))?;
            debug!("Change {} in zone {} is pending", id, zone);
            sleep(self.poll_interval);
            change = self.api.get_change(&self.project, zone, &id)?;
        }
        Ok(change)
    }
}

impl Provider for GoogleDnsProvider {
    fn create_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        let zone = self.zone(&record.domain)?;
        let name = absolute_name(&record.fqdn);

        let change = Change::addition(ResourceRecordSet::txt(&name, &record.token, self.ttl));
        let change = self.api.create_change(&self.project, &zone.name, &change)?;
        let change = self.wait_for_change(&zone.name, change)?;
        debug!(
            "Created record {} in zone {} with change {:?}",
            name, zone.name, change.id
        );
        Ok(())
    }

    fn delete_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        let zone = self.zone(&record.domain)?;
        let name = absolute_name(&record.fqdn);

        let matching = self
            .api
            .list_record_sets(&self.project, &zone.name, &name, RECORD_TYPE_TXT)?
            .into_iter()
            .filter(|r| r.record_type == RECORD_TYPE_TXT && r.name.eq_ignore_ascii_case(&name))
            .collect::<Vec<_>>();
        if matching.is_empty() {
            debug!("No TXT record {} in zone {}, nothing to delete", name, zone.name);
        }

        for rrset in matching {
            let change = self
                .api
                .create_change(&self.project, &zone.name, &Change::deletion(rrset))?;
            debug!("Deleted record {} from zone {} with change {:?}", name, zone.name, change.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::{predicate::eq, Sequence};
    use totems::assert_ok;

    use super::*;

    fn zones() -> Vec<ManagedZone> {
        vec![
            ManagedZone {
                name: "example-com".to_string(),
                dns_name: "example.com.".to_string(),
            },
            ManagedZone {
                name: "other".to_string(),
                dns_name: "other.org.".to_string(),
            },
        ]
    }

    fn record() -> ChallengeRecord {
        ChallengeRecord {
            domain: "example.com".to_string(),
            fqdn: "_acme-challenge.example.com".to_string(),
            token: "abc".to_string(),
        }
    }

    fn change(id: &str, status: &str) -> Change {
        Change {
            id: Some(id.to_string()),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    fn provider(api: CloudDnsClient) -> GoogleDnsProvider {
        GoogleDnsProvider {
            api,
            project: "my-project".to_string(),
            ttl: DEFAULT_CHALLENGE_TTL,
            poll_interval: Duration::ZERO,
        }
    }

    #[test]
    fn should_parse_config_from_service_account() {
        let config: GoogleDnsConfig = serde_json::from_str(
            r#"{"type": "service_account", "project_id": "my-project", "private_key": "k"}"#,
        )
        .unwrap();
        assert_eq!(config.project_id, "my-project");
        assert_eq!(config.ttl, None);
    }

    #[test]
    fn should_create_record_and_wait_for_change() {
        let mut seq = Sequence::new();
        let mut api = CloudDnsClient::default();
        api.expect_list_managed_zones()
            .with(eq("my-project"))
            .times(1)
            .returning(|_| Ok(zones()));
        api.expect_create_change()
            .withf(|project, zone, change| {
                project == "my-project"
                    && zone == "example-com"
                    && change.additions
                        == vec![ResourceRecordSet::txt("_acme-challenge.example.com.", "abc", 30)]
                    && change.deletions.is_empty()
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(change("1", "pending")));
        api.expect_get_change()
            .with(eq("my-project"), eq("example-com"), eq("1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(change("1", "pending")));
        api.expect_get_change()
            .with(eq("my-project"), eq("example-com"), eq("1"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(change("1", "done")));

        let res = provider(api).create_txt_record(&record());

        assert_ok!(&res);
    }

    #[test]
    fn should_not_poll_finished_change() {
        let mut api = CloudDnsClient::default();
        api.expect_list_managed_zones().returning(|_| Ok(zones()));
        api.expect_create_change()
            .returning(|_, _, _| Ok(change("1", "done")));
        api.expect_get_change().never();

        let res = provider(api).create_txt_record(&record());

        assert_ok!(&res);
    }

    #[test]
    fn should_fail_without_zone() {
        let mut api = CloudDnsClient::default();
        api.expect_list_managed_zones().returning(|_| Ok(vec![]));
        api.expect_create_change().never();

        assert_eq!(
            provider(api).create_txt_record(&record()),
            Err(ProviderError::ZoneNotFound("example.com".to_string()))
        );
    }

    #[test]
    fn should_propagate_poll_errors() {
        let mut api = CloudDnsClient::default();
        api.expect_list_managed_zones().returning(|_| Ok(zones()));
        api.expect_create_change()
            .returning(|_, _, _| Ok(change("1", "pending")));
        api.expect_get_change()
            .returning(|_, _, _| Err(ProviderError::Api("googleapi: Error 500: backend".to_string())));

        assert_eq!(
            provider(api).create_txt_record(&record()),
            Err(ProviderError::Api("googleapi: Error 500: backend".to_string()))
        );
    }

    #[test]
    fn should_delete_each_matching_record_set() {
        let mut api = CloudDnsClient::default();
        api.expect_list_managed_zones().returning(|_| Ok(zones()));
        api.expect_list_record_sets()
            .with(
                eq("my-project"),
                eq("example-com"),
                eq("_acme-challenge.example.com."),
                eq("TXT"),
            )
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![
                    ResourceRecordSet::txt("_acme-challenge.example.com.", "abc", 30),
                    ResourceRecordSet::txt("other.example.com.", "abc", 30),
                ])
            });
        api.expect_create_change()
            .withf(|_, zone, change| {
                zone == "example-com"
                    && change.additions.is_empty()
                    && change.deletions
                        == vec![ResourceRecordSet::txt("_acme-challenge.example.com.", "abc", 30)]
            })
            .times(1)
            .returning(|_, _, _| Ok(change("2", "pending")));
        api.expect_get_change().never();

        let res = provider(api).delete_txt_record(&record());

        assert_ok!(&res);
    }

    #[test]
    fn should_succeed_when_nothing_to_delete() {
        let mut api = CloudDnsClient::default();
        api.expect_list_managed_zones().returning(|_| Ok(zones()));
        api.expect_list_record_sets()
            .returning(|_, _, _, _| Ok(vec![]));
        api.expect_create_change().never();

        let res = provider(api).delete_txt_record(&record());

        assert_ok!(&res);
    }
}
