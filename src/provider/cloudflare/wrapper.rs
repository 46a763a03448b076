#![cfg_attr(test, allow(dead_code))]

use cloudflare::{
    endpoints::{
        self,
        dns::{DnsContent, DnsRecord},
    },
    framework::{
        response::{ApiFailure, ApiResponse},
        Environment, HttpApiClient, HttpApiClientConfig,
    },
};
use log::trace;

use super::CloudflareConfig;
use crate::{config::TTL, provider::ProviderError};

const CLOUDFLARE_ZONE_PAGE_SIZE: u8 = 50;
const CLOUDFLARE_RECORD_PAGE_SIZE: u16 = 5000;

/// The parts of a Cloudflare zone needed to place a record in it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// An existing TXT record in a Cloudflare zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxtRecord {
    pub id: String,
    pub name: String,
    pub content: String,
}

/// Internal wrapper around the Cloudflare API. Provides some convenience features such as paged requests
pub struct CloudflareWrapper {
    client: HttpApiClient,
}

impl CloudflareWrapper {
    pub fn try_new(config: &CloudflareConfig) -> Result<CloudflareWrapper, ProviderError> {
        let client = HttpApiClient::new(
            config.credentials()?,
            HttpApiClientConfig::default(),
            Environment::Production,
        )
        .map_err(|e| ProviderError::Setup(e.to_string()))?;
        Ok(CloudflareWrapper { client })
    }

    pub fn list_zones(&self) -> Result<Vec<Zone>, ProviderError> {
        let zones = paged_request(
            CLOUDFLARE_ZONE_PAGE_SIZE.into(),
            &mut |page_counter: u32| {
                self.client.request(&endpoints::zone::ListZones {
                    params: endpoints::zone::ListZonesParams {
                        page: Some(page_counter),
                        per_page: Some(CLOUDFLARE_ZONE_PAGE_SIZE.into()),
                        ..Default::default()
                    },
                })
            },
        )?;
        trace!("Collected zones {:?}", zones.result);

        Ok(zones
            .result
            .into_iter()
            .map(|z| Zone {
                id: z.id,
                name: z.name,
            })
            .collect())
    }

    /// List all TXT records in a zone that carry the given name
    pub fn list_txt_records(&self, zone_id: &str, name: &str) -> Result<Vec<TxtRecord>, ProviderError> {
        let records = paged_request(
            CLOUDFLARE_RECORD_PAGE_SIZE.into(),
            &mut |page_counter: u32| {
                self.client.request(&endpoints::dns::ListDnsRecords {
                    zone_identifier: zone_id,
                    params: endpoints::dns::ListDnsRecordsParams {
                        name: Some(name.to_owned()),
                        page: Some(page_counter),
                        per_page: Some(CLOUDFLARE_RECORD_PAGE_SIZE.into()),
                        ..Default::default()
                    },
                })
            },
        )?;
        trace!("Collected records {:?}", records.result);

        Ok(txt_records(records.result, name))
    }

    pub fn create_txt_record(
        &self,
        zone_id: &str,
        name: &str,
        content: &str,
        ttl: Option<TTL>,
    ) -> Result<(), ProviderError> {
        self.client.request(&endpoints::dns::CreateDnsRecord {
            zone_identifier: zone_id,
            params: endpoints::dns::CreateDnsRecordParams {
                priority: None,
                ttl,
                proxied: None,
                name,
                content: DnsContent::TXT {
                    content: content.to_owned(),
                },
            },
        })?;
        Ok(())
    }

    /// Replace the content of an existing TXT record
    pub fn update_txt_record(
        &self,
        zone_id: &str,
        record: &TxtRecord,
        ttl: Option<TTL>,
    ) -> Result<(), ProviderError> {
        self.client.request(&endpoints::dns::UpdateDnsRecord {
            zone_identifier: zone_id,
            identifier: &record.id,
            params: endpoints::dns::UpdateDnsRecordParams {
                ttl,
                proxied: None,
                name: &record.name,
                content: DnsContent::TXT {
                    content: record.content.to_owned(),
                },
            },
        })?;
        Ok(())
    }

    pub fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), ProviderError> {
        self.client.request(&endpoints::dns::DeleteDnsRecord {
            zone_identifier: zone_id,
            identifier: record_id,
        })?;
        Ok(())
    }
}

// Perform a paged request by repeatedly calling the provided request fun.
// The request callback needs to accept the current page_counter.
// page_size must match the page_size in the request. The caller is responsible for ensuring that these match
fn paged_request<R>(
    page_size: usize,
    request: &mut dyn FnMut(u32) -> ApiResponse<Vec<R>>,
) -> ApiResponse<Vec<R>> {
    let mut page_counter = 1;

    // Initial failures are never good, return quickly
    let mut response = request(page_counter)?;
    let mut current_size = response.result.len();

    while current_size >= page_size {
        page_counter += 1;
        match request(page_counter) {
            Ok(r) => {
                current_size = r.result.len();
                response.result.extend(r.result);
            }
            // Cloudflare answers a page past the end with 404
            Err(ApiFailure::Error(http::StatusCode::NOT_FOUND, _)) => return Ok(response),
            Err(e) => return Err(e),
        };
    }
    Ok(response)
}

// The name filter of the API is not exact, so only keep TXT records with exactly this name
fn txt_records(records: Vec<DnsRecord>, name: &str) -> Vec<TxtRecord> {
    records
        .into_iter()
        .filter(|r| r.name.eq_ignore_ascii_case(name))
        .filter_map(|r| match r.content {
            DnsContent::TXT { content } => Some(TxtRecord {
                id: r.id,
                name: r.name,
                content,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
use mockall::mock;

#[cfg(test)]
mock! {
    pub CloudflareWrapper {
        pub fn try_new(config: &CloudflareConfig) -> Result<Self, ProviderError>;
        pub fn list_zones(&self) -> Result<Vec<Zone>, ProviderError>;
        pub fn list_txt_records(&self, zone_id: &str, name: &str) -> Result<Vec<TxtRecord>, ProviderError>;
        pub fn create_txt_record(
            &self,
            zone_id: &str,
            name: &str,
            content: &str,
            ttl: Option<TTL>,
        ) -> Result<(), ProviderError>;
        pub fn update_txt_record(
            &self,
            zone_id: &str,
            record: &TxtRecord,
            ttl: Option<TTL>,
        ) -> Result<(), ProviderError>;
        pub fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), ProviderError>;
    }
}
