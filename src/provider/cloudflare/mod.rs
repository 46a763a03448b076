mod util;
mod wrapper;

use cloudflare::framework::auth::Credentials;
use log::{debug, trace};
use mockall_double::double;
use serde::Deserialize;

#[double]
use self::wrapper::CloudflareWrapper;
use self::wrapper::{TxtRecord, Zone};

use super::{find_zone, relative_name, Provider, ProviderError};
use crate::config::{ChallengeRecord, TTL};

/// A [`Provider`] connecting to the Cloudflare API for creating and deleting challenge TXT records.
///
/// Cloudflare allows several TXT records with the same name, but this provider keeps at most one:
/// creating a record for a name that already has one replaces its content.
///
/// To create a provider, use the [`CloudflareProvider::from_config()`] function.
#[non_exhaustive]
pub struct CloudflareProvider {
    api: CloudflareWrapper,
    ttl: Option<TTL>,
}

/// Configuration object for a [`CloudflareProvider`], read from stdin.
///
/// Either `api_token` or both `email` and `key` (the global API key) must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct CloudflareConfig {
    /// Account email, used together with `key`
    #[serde(default)]
    pub email: Option<String>,
    /// Global API key of the account
    #[serde(default)]
    pub key: Option<String>,
    /// Scoped API token. Takes precedence over `email` and `key`
    #[serde(default)]
    pub api_token: Option<String>,
    /// TTL for new records. Cloudflare picks one automatically if unset
    #[serde(default)]
    pub ttl: Option<TTL>,
}

impl CloudflareConfig {
    pub fn credentials(&self) -> Result<Credentials, ProviderError> {
        match (&self.api_token, &self.email, &self.key) {
            (Some(token), _, _) => Ok(Credentials::UserAuthToken {
                token: token.to_owned(),
            }),
            (None, Some(email), Some(key)) => Ok(Credentials::UserAuthKey {
                email: email.to_owned(),
                key: key.to_owned(),
            }),
            _ => Err(ProviderError::Setup(
                "Cloudflare credentials require either 'api_token' or both 'email' and 'key'"
                    .to_string(),
            )),
        }
    }
}

impl CloudflareProvider {
    pub fn from_config(config: &CloudflareConfig) -> Result<Box<dyn Provider>, ProviderError> {
        let api = CloudflareWrapper::try_new(config)?;

        Ok(Box::new(CloudflareProvider {
            api,
            ttl: config.ttl,
        }))
    }

    // Get parent zone for domain
    fn zone(&self, domain: &str) -> Result<Zone, ProviderError> {
        let zones = self
            .api
            .list_zones()
            .map_err(|e| e.context("Fetching zone for record failed"))?;

        find_zone(domain, &zones, |z| z.name.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::ZoneNotFound(domain.to_owned()))
    }

    // Get the existing challenge record, if any
    fn existing_record(&self, zone: &Zone, name: &str) -> Result<Option<TxtRecord>, ProviderError> {
        let mut records = self
            .api
            .list_txt_records(&zone.id, name)
            .map_err(|e| e.context("Fetching record failed"))?;
        trace!("Found TXT records {:?} for {}", records, name);

        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            _ => Err(ProviderError::AmbiguousRecord(name.to_owned())),
        }
    }
}

impl Provider for CloudflareProvider {
    fn create_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        let zone = self.zone(&record.domain)?;
        let name = relative_name(&record.fqdn);

        match self.existing_record(&zone, name)? {
            Some(mut existing) => {
                existing.content = record.token.to_owned();
                self.api
                    .update_txt_record(&zone.id, &existing, self.ttl)
                    .map_err(|e| e.context("Updating record failed"))?;
                debug!("Updated record {} with id {} in zone {}", name, existing.id, zone.id);
            }
            None => {
                self.api
                    .create_txt_record(&zone.id, name, &record.token, self.ttl)
                    .map_err(|e| e.context("Creating record failed"))?;
                debug!("Created record {} in zone {}", name, zone.id);
            }
        }
        Ok(())
    }

    fn delete_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        let zone = self.zone(&record.domain)?;
        let name = relative_name(&record.fqdn);

        let existing = match self.existing_record(&zone, name)? {
            Some(r) => r,
            None => {
                debug!("No TXT record {} in zone {}, nothing to delete", name, zone.id);
                return Ok(());
            }
        };

        self.api
            .delete_record(&zone.id, &existing.id)
            .map_err(|e| e.context("Deleting record failed"))?;
        debug!(
            "Deleted record {} with id {} from zone {}",
            name, existing.id, zone.id
        );
        Ok(())
    }
}
