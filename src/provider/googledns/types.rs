//! Request and response bodies of the Cloud DNS v1 REST API

use serde::{Deserialize, Serialize};

use crate::config::TTL;

pub const RECORD_TYPE_TXT: &str = "TXT";
const CHANGE_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedZone {
    /// User assigned zone name, used in API paths
    pub name: String,
    /// DNS name of the zone, with a trailing dot
    pub dns_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedZonesListResponse {
    #[serde(default)]
    pub managed_zones: Vec<ManagedZone>,
    pub next_page_token: Option<String>,
}

impl ManagedZonesListResponse {
    /// Split into the zones of this page and the token of the next one
    pub fn into_page(self) -> (Vec<ManagedZone>, Option<String>) {
        (self.managed_zones, self.next_page_token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<TTL>,
    #[serde(default)]
    pub rrdatas: Vec<String>,
}

impl ResourceRecordSet {
    pub fn txt(name: &str, value: &str, ttl: TTL) -> Self {
        ResourceRecordSet {
            name: name.to_owned(),
            record_type: RECORD_TYPE_TXT.to_string(),
            ttl: Some(ttl),
            rrdatas: vec![value.to_owned()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecordSetsListResponse {
    #[serde(default)]
    pub rrsets: Vec<ResourceRecordSet>,
    pub next_page_token: Option<String>,
}

impl ResourceRecordSetsListResponse {
    pub fn into_page(self) -> (Vec<ResourceRecordSet>, Option<String>) {
        (self.rrsets, self.next_page_token)
    }
}

/// An atomic set of record additions and deletions applied to a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<ResourceRecordSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<ResourceRecordSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Change {
    pub fn addition(rrset: ResourceRecordSet) -> Self {
        Change {
            additions: vec![rrset],
            ..Default::default()
        }
    }

    pub fn deletion(rrset: ResourceRecordSet) -> Self {
        Change {
            deletions: vec![rrset],
            ..Default::default()
        }
    }

    /// Whether Cloud DNS is still applying this change
    pub fn is_pending(&self) -> bool {
        self.status.as_deref() == Some(CHANGE_STATUS_PENDING)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}
