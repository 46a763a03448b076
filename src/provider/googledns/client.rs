#![cfg_attr(test, allow(dead_code))]

use std::time::Duration;

use log::trace;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::{
    auth::{fetch_access_token, ServiceAccountKey},
    types::{
        Change, ErrorResponse, ManagedZone, ManagedZonesListResponse, ResourceRecordSet,
        ResourceRecordSetsListResponse,
    },
};
use crate::provider::{collect_pages, ProviderError};

const CLOUD_DNS_API: &str = "https://dns.googleapis.com/dns/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal authenticated client for the Cloud DNS v1 REST API
pub struct CloudDnsClient {
    http: Client,
    access_token: String,
}

impl CloudDnsClient {
    /// Create a client and authenticate it with the given service account
    pub fn try_new(key: &ServiceAccountKey) -> Result<CloudDnsClient, ProviderError> {
        // rustls ships its own root certificates, so the host CA bundle is not needed
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .use_rustls_tls()
            .build()
            .map_err(|e| ProviderError::Setup(e.to_string()))?;
        let access_token = fetch_access_token(&http, key)?;

        Ok(CloudDnsClient { http, access_token })
    }

    fn zone_url(project: &str, zone: &str) -> String {
        format!("{}/projects/{}/managedZones/{}", CLOUD_DNS_API, project, zone)
    }

    // Send an authenticated request and decode the response body
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let res = request.bearer_auth(&self.access_token).send()?;
        let status = res.status();
        let body = res.text()?;
        trace!("Cloud DNS responded with {}: {}", status, body);

        if !status.is_success() {
            return Err(api_error(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::Internal(e.to_string()))
    }

    pub fn list_managed_zones(&self, project: &str) -> Result<Vec<ManagedZone>, ProviderError> {
        let url = format!("{}/projects/{}/managedZones", CLOUD_DNS_API, project);

        collect_pages(|page_token| {
            let mut request = self.http.get(&url);
            if let Some(token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ManagedZonesListResponse = self.send(request)?;
            Ok(page.into_page())
        })
    }

    /// List the record sets of a zone with the given name and type
    pub fn list_record_sets(
        &self,
        project: &str,
        zone: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<ResourceRecordSet>, ProviderError> {
        let url = format!("{}/rrsets", Self::zone_url(project, zone));

        collect_pages(|page_token| {
            let mut request = self
                .http
                .get(&url)
                .query(&[("name", name), ("type", record_type)]);
            if let Some(token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ResourceRecordSetsListResponse = self.send(request)?;
            Ok(page.into_page())
        })
    }

    pub fn create_change(&self, project: &str, zone: &str, change: &Change) -> Result<Change, ProviderError> {
        let url = format!("{}/changes", Self::zone_url(project, zone));
        self.send(self.http.post(url).json(change))
    }

    pub fn get_change(&self, project: &str, zone: &str, change_id: &str) -> Result<Change, ProviderError> {
        let url = format!("{}/changes/{}", Self::zone_url(project, zone), change_id);
        self.send(self.http.get(url))
    }
}

// Render an error response the same way Google's client libraries do
fn api_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(res) => ProviderError::Api(format!(
            "googleapi: Error {}: {}",
            res.error.code, res.error.message
        )),
        Err(_) => ProviderError::Api(format!(
            "googleapi: got HTTP response code {} with body: {}",
            status.as_u16(),
            body
        )),
    }
}

#[cfg(test)]
use mockall::mock;

#[cfg(test)]
mock! {
    pub CloudDnsClient {
        pub fn try_new(key: &ServiceAccountKey) -> Result<Self, ProviderError>;
        pub fn list_managed_zones(&self, project: &str) -> Result<Vec<ManagedZone>, ProviderError>;
        pub fn list_record_sets(
            &self,
            project: &str,
            zone: &str,
            name: &str,
            record_type: &str,
        ) -> Result<Vec<ResourceRecordSet>, ProviderError>;
        pub fn create_change(&self, project: &str, zone: &str, change: &Change) -> Result<Change, ProviderError>;
        pub fn get_change(&self, project: &str, zone: &str, change_id: &str) -> Result<Change, ProviderError>;
    }
}
