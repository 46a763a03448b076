//! XML documents of the Route53 2013-04-01 API

use serde::{Deserialize, Serialize};

use crate::config::TTL;

pub const ROUTE53_XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Delete,
}

impl ChangeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "ChangeResourceRecordSetsRequest")]
struct ChangeResourceRecordSetsRequest<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "ChangeBatch")]
    change_batch: &'a ChangeBatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeBatch {
    #[serde(rename = "Changes")]
    changes: Changes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Changes {
    #[serde(rename = "Change")]
    change: Vec<Change>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    #[serde(rename = "Action")]
    pub action: &'static str,
    #[serde(rename = "ResourceRecordSet")]
    pub resource_record_set: ResourceRecordSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecordSet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: &'static str,
    #[serde(rename = "TTL")]
    pub ttl: TTL,
    #[serde(rename = "ResourceRecords")]
    pub resource_records: ResourceRecords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecords {
    #[serde(rename = "ResourceRecord")]
    pub resource_record: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    #[serde(rename = "Value")]
    pub value: String,
}

impl ChangeBatch {
    /// A batch with a single change to one TXT record
    pub fn txt(action: ChangeAction, name: &str, token: &str, ttl: TTL) -> Self {
        ChangeBatch {
            changes: Changes {
                change: vec![Change {
                    action: action.as_str(),
                    resource_record_set: ResourceRecordSet {
                        name: name.to_owned(),
                        record_type: "TXT",
                        ttl,
                        resource_records: ResourceRecords {
                            // Route53 expects TXT values as quoted strings
                            resource_record: vec![ResourceRecord {
                                value: format!("\"{}\"", token),
                            }],
                        },
                    },
                }],
            },
        }
    }

    /// Render the ChangeResourceRecordSets request body
    pub fn to_xml(&self) -> Result<String, quick_xml::DeError> {
        let body = quick_xml::se::to_string(&ChangeResourceRecordSetsRequest {
            xmlns: ROUTE53_XMLNS,
            change_batch: self,
        })?;
        Ok(format!("{}{}", XML_DECLARATION, body))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListHostedZonesResponse {
    #[serde(default)]
    pub hosted_zones: HostedZones,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub next_marker: Option<String>,
}

impl ListHostedZonesResponse {
    /// Split into the zones of this page and the marker of the next one.
    /// `NextMarker` only counts while the listing is truncated.
    pub fn into_page(self) -> (Vec<HostedZone>, Option<String>) {
        let next = self.next_marker.filter(|_| self.is_truncated);
        (self.hosted_zones.hosted_zone, next)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HostedZones {
    #[serde(rename = "HostedZone", default)]
    pub hosted_zone: Vec<HostedZone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostedZone {
    /// Zone id, prefixed with `/hostedzone/`
    pub id: String,
    /// Zone name with a trailing dot
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeResourceRecordSetsResponse {
    pub change_info: ChangeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeInfo {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDetail {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvalidChangeBatch {
    #[serde(rename = "Messages", default)]
    pub messages: Messages,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Messages {
    #[serde(rename = "Message", default)]
    pub message: Vec<String>,
}
