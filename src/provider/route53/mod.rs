mod client;
mod sigv4;
mod types;

use log::{debug, info, trace};
use mockall_double::double;
use serde::Deserialize;

#[double]
use self::client::Route53Client;
use self::sigv4::AwsCredentials;
use self::types::{ChangeAction, ChangeBatch};

use super::{absolute_name, find_zone, Provider, ProviderError};
use crate::config::{ChallengeRecord, DEFAULT_CHALLENGE_TTL, TTL};

const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// A [`Provider`] for AWS Route53.
///
/// Changes are submitted without waiting for Route53 to report them as `INSYNC`.
///
/// To create a provider, use the [`Route53Provider::from_config()`] function.
#[non_exhaustive]
pub struct Route53Provider {
    api: Route53Client,
    zone_id: Option<String>,
    ttl: TTL,
}

/// Configuration for a [`Route53Provider`], read from stdin.
///
/// Credentials left out here are taken from the environment instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct Route53Config {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// TTL for challenge records, defaults to 30 seconds
    pub ttl: Option<TTL>,
}

/// Settings for a [`Route53Provider`] that come from the process environment
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Route53ProviderConfig {
    /// Hosted zone to write records to. Looked up from the record domain if unset
    pub zone_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Route53ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53ProviderConfig")
            .field("zone_id", &self.zone_id)
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

impl Route53Config {
    /// Pick credentials from the config, falling back to the environment.
    ///
    /// A key pair is never mixed between both sources.
    pub fn credentials(&self, env: &Route53ProviderConfig) -> Result<AwsCredentials, ProviderError> {
        let from_config = (&self.access_key_id, &self.secret_access_key, &self.session_token);
        let from_env = (&env.access_key_id, &env.secret_access_key, &env.session_token);

        match (from_config, from_env) {
            ((Some(id), Some(secret), token), _) | (_, (Some(id), Some(secret), token)) => {
                Ok(AwsCredentials {
                    access_key_id: id.to_owned(),
                    secret_access_key: secret.to_owned(),
                    session_token: token.to_owned(),
                })
            }
            _ => Err(ProviderError::Setup(
                "AWS credentials require 'access_key_id' and 'secret_access_key' \
                 or AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
                    .to_string(),
            )),
        }
    }
}

impl Route53Provider {
    pub fn from_config(
        config: &Route53Config,
        env: &Route53ProviderConfig,
    ) -> Result<Box<dyn Provider>, ProviderError> {
        let credentials = config.credentials(env)?;
        info!("Using AWS access key {}", credentials.access_key_id);
        let api = Route53Client::try_new(credentials)
            .map_err(|e| e.context("Error creating Route53 client"))?;

        Ok(Box::new(Route53Provider {
            api,
            zone_id: env
                .zone_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(strip_zone_prefix),
            ttl: config.ttl.unwrap_or(DEFAULT_CHALLENGE_TTL),
        }))
    }

    // Hosted zone id without its `/hostedzone/` prefix
    fn zone_id(&self, domain: &str) -> Result<String, ProviderError> {
        if let Some(id) = &self.zone_id {
            return Ok(id.to_owned());
        }

        let zones = self
            .api
            .list_hosted_zones()
            .map_err(|e| e.context("Fetching hosted zones failed"))?;
        trace!("Collected hosted zones {:?}", zones);

        find_zone(domain, &zones, |z| z.name.as_str())
            .map(|z| strip_zone_prefix(&z.id))
            .ok_or_else(|| ProviderError::ZoneNotFound(domain.to_owned()))
    }

    fn change(&self, action: ChangeAction, record: &ChallengeRecord) -> Result<(), ProviderError> {
        let zone_id = self.zone_id(&record.domain)?;
        let name = absolute_name(&record.fqdn);

        let batch = ChangeBatch::txt(action, &name, &record.token, self.ttl);
        let info = self.api.change_resource_record_sets(&zone_id, &batch)?;
        debug!(
            "Submitted {} of record {} in zone {} as change {} ({})",
            action.as_str(),
            name,
            zone_id,
            info.id,
            info.status
        );
        Ok(())
    }
}

impl Provider for Route53Provider {
    fn create_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        self.change(ChangeAction::Create, record)
            .map_err(|e| e.context("Creating record failed"))
    }

    fn delete_txt_record(&self, record: &ChallengeRecord) -> Result<(), ProviderError> {
        self.change(ChangeAction::Delete, record)
            .map_err(|e| e.context("Deleting record failed"))
    }
}

fn strip_zone_prefix(id: &str) -> String {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id).to_owned()
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use totems::assert_ok;

    use super::types::{ChangeInfo, HostedZone};
    use super::*;

    fn record() -> ChallengeRecord {
        ChallengeRecord {
            domain: "www.example.com".to_string(),
            fqdn: "_acme-challenge.www.example.com".to_string(),
            token: "abc".to_string(),
        }
    }

    fn zones() -> Vec<HostedZone> {
        vec![
            HostedZone {
                id: "/hostedzone/ZCOM".to_string(),
                name: "example.com.".to_string(),
            },
            HostedZone {
                id: "/hostedzone/ZWWW".to_string(),
                name: "www.example.com.".to_string(),
            },
        ]
    }

    fn change_info() -> ChangeInfo {
        ChangeInfo {
            id: "/change/C1".to_string(),
            status: "PENDING".to_string(),
        }
    }

    fn provider(api: Route53Client, zone_id: Option<&str>) -> Route53Provider {
        Route53Provider {
            api,
            zone_id: zone_id.map(str::to_string),
            ttl: DEFAULT_CHALLENGE_TTL,
        }
    }

    #[test]
    fn should_prefer_config_credentials() {
        let config: Route53Config =
            serde_json::from_str(r#"{"access_key_id": "AKID", "secret_access_key": "s"}"#).unwrap();
        let env = Route53ProviderConfig {
            access_key_id: Some("ENVKEY".to_string()),
            secret_access_key: Some("envsecret".to_string()),
            session_token: Some("envtoken".to_string()),
            ..Default::default()
        };

        let creds = config.credentials(&env).unwrap();
        assert_eq!(creds.access_key_id, "AKID");
        assert_eq!(creds.session_token, None);
    }

    #[test]
    fn should_fall_back_to_env_credentials() {
        let config: Route53Config = serde_json::from_str(r#"{"access_key_id": "AKID"}"#).unwrap();
        let env = Route53ProviderConfig {
            access_key_id: Some("ENVKEY".to_string()),
            secret_access_key: Some("envsecret".to_string()),
            session_token: Some("envtoken".to_string()),
            ..Default::default()
        };

        let creds = config.credentials(&env).unwrap();
        assert_eq!(creds.access_key_id, "ENVKEY");
        assert_eq!(creds.secret_access_key, "envsecret");
        assert_eq!(creds.session_token.as_deref(), Some("envtoken"));
    }

    #[test]
    fn should_fail_without_credentials() {
        let config = Route53Config::default();
        assert!(matches!(
            config.credentials(&Route53ProviderConfig::default()),
            Err(ProviderError::Setup(_))
        ));
    }

    #[test]
    fn should_strip_zone_prefix() {
        assert_eq!(strip_zone_prefix("/hostedzone/Z123"), "Z123");
        assert_eq!(strip_zone_prefix("Z123"), "Z123");
    }

    #[test]
    fn should_create_record_in_configured_zone() {
        let mut api = Route53Client::default();
        api.expect_list_hosted_zones().never();
        api.expect_change_resource_record_sets()
            .withf(|zone_id, batch| {
                zone_id == "Z123"
                    && batch == &ChangeBatch::txt(ChangeAction::Create, "_acme-challenge.www.example.com.", "abc", 30)
            })
            .times(1)
            .returning(|_, _| Ok(change_info()));

        let res = provider(api, Some("Z123")).create_txt_record(&record());

        assert_ok!(&res);
    }

    #[test]
    fn should_look_up_most_specific_zone() {
        let mut api = Route53Client::default();
        api.expect_list_hosted_zones()
            .times(1)
            .returning(|| Ok(zones()));
        api.expect_change_resource_record_sets()
            .with(
                eq("ZWWW"),
                eq(ChangeBatch::txt(ChangeAction::Delete, "_acme-challenge.www.example.com.", "abc", 30)),
            )
            .times(1)
            .returning(|_, _| Ok(change_info()));

        let res = provider(api, None).delete_txt_record(&record());

        assert_ok!(&res);
    }

    #[test]
    fn should_fail_without_zone() {
        let mut api = Route53Client::default();
        api.expect_list_hosted_zones().returning(|| Ok(vec![]));
        api.expect_change_resource_record_sets().never();

        assert_eq!(
            provider(api, None).create_txt_record(&record()),
            Err(ProviderError::ZoneNotFound("www.example.com".to_string()))
        );
    }

    #[test]
    fn should_prefix_api_errors() {
        let mut api = Route53Client::default();
        api.expect_change_resource_record_sets().returning(|_, _| {
            Err(ProviderError::Api(
                "InvalidChangeBatch: Tried to delete resource record set but it was not found".to_string(),
            ))
        });

        let res = provider(api, Some("Z123")).delete_txt_record(&record());
        assert_eq!(
            res.unwrap_err().to_string(),
            "Deleting record failed: InvalidChangeBatch: Tried to delete resource record set but it was not found"
        );
    }
}
